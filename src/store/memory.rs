use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use chrono::NaiveDate;
use dashmap::DashMap;
use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tracing::info;

use crate::model::*;

use super::journal::Journal;
use super::{ReservationStore, StoreError};

/// Most commands the journal writer takes off the channel per wakeup.
const BATCH_LIMIT: usize = 256;

type Ack = oneshot::Sender<Result<(), StoreError>>;

enum JournalCommand {
    Append(JournalEntry, Ack),
    Control(Control),
}

/// Requests served between batches, after pending appends are synced.
enum Control {
    Rewrite {
        records: Vec<Reservation>,
        reply: oneshot::Sender<Result<usize, StoreError>>,
    },
    Appended {
        reply: oneshot::Sender<u64>,
    },
}

impl Control {
    fn run(self, journal: &mut Journal) {
        match self {
            Control::Rewrite { records, reply } => {
                let _ = reply.send(journal.rewrite(records).map_err(journal_error));
            }
            Control::Appended { reply } => {
                let _ = reply.send(journal.appended());
            }
        }
    }
}

fn journal_error(e: io::Error) -> StoreError {
    StoreError::Journal(e.to_string())
}

/// Appends written to the journal buffer and waiting on one shared sync.
#[derive(Default)]
struct PendingSync {
    acks: Vec<Ack>,
    failed: Option<StoreError>,
}

impl PendingSync {
    fn push(&mut self, journal: &mut Journal, entry: &JournalEntry, ack: Ack) {
        if self.failed.is_none() {
            if let Err(e) = journal.record(entry) {
                self.failed = Some(journal_error(e));
            }
        }
        self.acks.push(ack);
    }

    /// Sync once and answer every waiting save with the same outcome.
    fn commit(&mut self, journal: &mut Journal) {
        if self.acks.is_empty() {
            return;
        }
        let started = Instant::now();
        let synced = journal.sync().map_err(journal_error);
        let outcome = match self.failed.take() {
            Some(e) => Err(e),
            None => synced,
        };
        metrics::histogram!(crate::observability::JOURNAL_FLUSH_DURATION_SECONDS)
            .record(started.elapsed().as_secs_f64());
        metrics::histogram!(crate::observability::JOURNAL_FLUSH_BATCH_SIZE)
            .record(self.acks.len() as f64);
        for ack in self.acks.drain(..) {
            let _ = ack.send(outcome.clone());
        }
    }
}

/// Owns the journal. Each wakeup drains whatever is queued: appends share one
/// sync, and a control request first commits the appends queued ahead of it.
async fn journal_writer(mut journal: Journal, mut rx: mpsc::Receiver<JournalCommand>) {
    let mut inbox = Vec::with_capacity(BATCH_LIMIT);
    let mut pending = PendingSync::default();
    while rx.recv_many(&mut inbox, BATCH_LIMIT).await > 0 {
        for command in inbox.drain(..) {
            match command {
                JournalCommand::Append(entry, ack) => pending.push(&mut journal, &entry, ack),
                JournalCommand::Control(control) => {
                    pending.commit(&mut journal);
                    control.run(&mut journal);
                }
            }
        }
        pending.commit(&mut journal);
    }
}

/// Send one command to the journal writer and wait for its reply.
async fn ask<T>(
    tx: &mpsc::Sender<JournalCommand>,
    command: impl FnOnce(oneshot::Sender<T>) -> JournalCommand,
) -> Result<T, StoreError> {
    let (reply, rx) = oneshot::channel();
    tx.send(command(reply))
        .await
        .map_err(|_| StoreError::Journal("journal writer shut down".into()))?;
    rx.await
        .map_err(|_| StoreError::Journal("journal writer dropped the request".into()))
}

/// Reservation store held in memory, optionally backed by a journal.
pub struct InMemoryStore {
    records: DashMap<Token, Reservation>,
    /// email → tokens, in record-id order.
    by_contact: DashMap<String, Vec<Token>>,
    /// ACTIVE stays. Write-locked only to apply an already journaled save.
    occupancy: RwLock<Occupancy>,
    /// Serializes writers from their status check through the journal sync.
    writer: Mutex<()>,
    next_id: AtomicU64,
    journal: Option<mpsc::Sender<JournalCommand>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Ephemeral store: nothing survives the process.
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            by_contact: DashMap::new(),
            occupancy: RwLock::new(Occupancy::new()),
            writer: Mutex::new(()),
            next_id: AtomicU64::new(1),
            journal: None,
        }
    }

    /// Rebuild from the journal at `path`, then keep appending to it.
    /// Spawns the journal writer, so this must run inside a tokio runtime.
    pub fn open(path: &Path) -> io::Result<Self> {
        let mut store = Self::new();
        let mut occupancy = Occupancy::new();
        let mut replayed = 0u64;
        let mut max_id = 0;
        let journal = Journal::open(path, |JournalEntry::Saved(reservation)| {
            replayed += 1;
            max_id = max_id.max(reservation.id.unwrap_or(0));
            store.apply(&mut occupancy, reservation);
        })?;

        info!(
            "replayed {replayed} journal entries from {}: {} reservations, {} active",
            path.display(),
            store.records.len(),
            occupancy.len(),
        );

        let (tx, rx) = mpsc::channel(4096);
        tokio::spawn(journal_writer(journal, rx));
        store.occupancy = RwLock::new(occupancy);
        store.next_id = AtomicU64::new(max_id + 1);
        store.journal = Some(tx);
        Ok(store)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Update indexes with a saved record. Caller holds the occupancy write lock.
    fn apply(&self, occupancy: &mut Occupancy, reservation: Reservation) {
        let Some(token) = reservation.token else {
            return;
        };

        let previous = self.records.insert(token, reservation.clone());
        match previous {
            Some(prev) if prev.email != reservation.email => {
                if let Some(mut tokens) = self.by_contact.get_mut(&prev.email) {
                    tokens.retain(|t| *t != token);
                }
                self.index_contact(&reservation, token);
            }
            Some(_) => {}
            None => self.index_contact(&reservation, token),
        }

        occupancy.remove_stay(token);
        if reservation.is_active() {
            occupancy.insert_stay(Stay {
                token,
                arrival: reservation.arrival,
                departure: reservation.departure,
            });
        }
    }

    fn index_contact(&self, reservation: &Reservation, token: Token) {
        let mut tokens = self.by_contact.entry(reservation.email.clone()).or_default();
        let id = reservation.id;
        let pos = tokens.partition_point(|t| self.records.get(t).and_then(|r| r.id) < id);
        tokens.insert(pos, token);
    }

    /// Assign an id if needed, journal, then publish. Caller holds `writer`.
    ///
    /// Counts are only blocked for the in-memory apply, never for the sync.
    async fn commit(&self, mut reservation: Reservation) -> Result<Reservation, StoreError> {
        let token = reservation.token.ok_or(StoreError::MissingToken)?;
        if reservation.id.is_none() {
            let existing = self.records.get(&token).and_then(|r| r.id);
            reservation.id =
                Some(existing.unwrap_or_else(|| self.next_id.fetch_add(1, Ordering::Relaxed)));
        }

        if let Some(tx) = &self.journal {
            let entry = JournalEntry::Saved(reservation.clone());
            ask(tx, |ack| JournalCommand::Append(entry, ack)).await??;
        }

        let mut occupancy = self.occupancy.write().await;
        self.apply(&mut occupancy, reservation.clone());
        Ok(reservation)
    }

    /// Rewrite the journal with one entry per current record. No-op without a journal.
    pub async fn compact(&self) -> Result<(), StoreError> {
        let Some(tx) = &self.journal else {
            return Ok(());
        };
        let _writer = self.writer.lock().await;

        let mut records: Vec<Reservation> = self.records.iter().map(|e| e.value().clone()).collect();
        records.sort_by_key(|r| r.id);
        let count = ask(tx, |reply| {
            JournalCommand::Control(Control::Rewrite { records, reply })
        })
        .await??;
        info!("compacted journal to {count} entries");
        Ok(())
    }

    pub async fn appends_since_compact(&self) -> u64 {
        let Some(tx) = &self.journal else {
            return 0;
        };
        ask(tx, |reply| JournalCommand::Control(Control::Appended { reply }))
            .await
            .unwrap_or(0)
    }
}

#[async_trait]
impl ReservationStore for InMemoryStore {
    async fn count_overlapping(&self, day: NaiveDate) -> Result<u64, StoreError> {
        Ok(self.occupancy.read().await.count_covering(day))
    }

    async fn save(&self, reservation: Reservation) -> Result<Reservation, StoreError> {
        let _writer = self.writer.lock().await;
        self.commit(reservation).await
    }

    async fn replace_active(
        &self,
        mut reservation: Reservation,
    ) -> Result<Option<Reservation>, StoreError> {
        let token = reservation.token.ok_or(StoreError::MissingToken)?;
        let _writer = self.writer.lock().await;
        let Some(id) = self.records.get(&token).filter(|r| r.is_active()).map(|r| r.id) else {
            return Ok(None);
        };
        reservation.id = id;
        self.commit(reservation).await.map(Some)
    }

    async fn cancel(&self, token: &Token) -> Result<Option<ReservationStatus>, StoreError> {
        let _writer = self.writer.lock().await;
        let Some(mut current) = self.records.get(token).map(|r| r.value().clone()) else {
            return Ok(None);
        };
        let before = current.status;
        if before == ReservationStatus::Active {
            current.status = ReservationStatus::Cancelled;
            self.commit(current).await?;
        }
        Ok(Some(before))
    }

    async fn find_by_token(&self, token: &Token) -> Result<Option<Reservation>, StoreError> {
        Ok(self.records.get(token).map(|e| e.value().clone()))
    }

    async fn find_all_by_contact_and_status(
        &self,
        email: &str,
        status: ReservationStatus,
    ) -> Result<Vec<Reservation>, StoreError> {
        let Some(tokens) = self.by_contact.get(email).map(|e| e.value().clone()) else {
            return Ok(Vec::new());
        };
        let mut found: Vec<Reservation> = tokens
            .iter()
            .filter_map(|t| self.records.get(t).map(|e| e.value().clone()))
            .filter(|r| r.status == status)
            .collect();
        found.sort_by_key(|r| r.id);
        Ok(found)
    }
}
