use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::model::{JournalEntry, Reservation};

const LEN_BYTES: usize = 4;
const CRC_BYTES: usize = 4;

/// Frames claiming a larger payload are treated as damage, not allocated.
const MAX_PAYLOAD: usize = 1 << 20;

/// Append-only log of saved reservations.
///
/// Frame layout, little endian: `[u32 len][bincode JournalEntry][u32 crc32]`,
/// where `len` counts the payload only. Replay keeps the longest intact prefix
/// and cuts the file back to it, so later appends never land behind damage.
pub struct Journal {
    path: PathBuf,
    out: BufWriter<File>,
    appended: u64,
}

impl Journal {
    /// Feed every intact entry at `path` to `apply` in write order, then open
    /// the file for appending. A missing file is created empty.
    pub fn open(path: &Path, mut apply: impl FnMut(JournalEntry)) -> io::Result<Self> {
        let intact = match File::open(path) {
            Ok(file) => {
                let mut reader = BufReader::new(file);
                let mut intact = 0u64;
                while let Some((entry, size)) = read_frame(&mut reader)? {
                    apply(entry);
                    intact += size;
                }
                intact
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => 0,
            Err(e) => return Err(e),
        };

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let on_disk = file.metadata()?.len();
        if on_disk > intact {
            warn!(
                "discarding {} damaged trailing bytes of {}",
                on_disk - intact,
                path.display()
            );
            file.set_len(intact)?;
        }

        Ok(Self {
            path: path.to_path_buf(),
            out: BufWriter::new(file),
            appended: 0,
        })
    }

    /// Buffer one entry. Nothing is durable until [`Journal::sync`].
    pub fn record(&mut self, entry: &JournalEntry) -> io::Result<()> {
        write_frame(&mut self.out, entry)?;
        self.appended += 1;
        Ok(())
    }

    pub fn sync(&mut self) -> io::Result<()> {
        self.out.flush()?;
        self.out.get_ref().sync_data()
    }

    /// Entries recorded since the journal was opened or last rewritten.
    pub fn appended(&self) -> u64 {
        self.appended
    }

    /// Replace the whole log with one entry per record. The new log is
    /// written beside the old one and renamed over it once synced.
    pub fn rewrite(&mut self, records: Vec<Reservation>) -> io::Result<usize> {
        let scratch = self.path.with_extension("journal.tmp");
        let count = records.len();
        {
            let mut out = BufWriter::new(File::create(&scratch)?);
            for record in records {
                write_frame(&mut out, &JournalEntry::Saved(record))?;
            }
            out.flush()?;
            out.get_ref().sync_all()?;
        }
        fs::rename(&scratch, &self.path)?;

        let file = OpenOptions::new().append(true).open(&self.path)?;
        self.out = BufWriter::new(file);
        self.appended = 0;
        Ok(count)
    }
}

fn write_frame(out: &mut impl Write, entry: &JournalEntry) -> io::Result<()> {
    let payload = bincode::serialize(entry).map_err(io::Error::other)?;
    out.write_all(&(payload.len() as u32).to_le_bytes())?;
    out.write_all(&payload)?;
    out.write_all(&crc32fast::hash(&payload).to_le_bytes())
}

/// Next intact entry with its size on disk. `None` at end of file and at the
/// first short, oversized, corrupt or undecodable frame.
fn read_frame(reader: &mut impl Read) -> io::Result<Option<(JournalEntry, u64)>> {
    let mut len = [0u8; LEN_BYTES];
    if !fill(reader, &mut len)? {
        return Ok(None);
    }
    let len = u32::from_le_bytes(len) as usize;
    if len > MAX_PAYLOAD {
        return Ok(None);
    }

    let mut body = vec![0u8; len + CRC_BYTES];
    if !fill(reader, &mut body)? {
        return Ok(None);
    }
    let (payload, crc) = body.split_at(len);
    if crc != &crc32fast::hash(payload).to_le_bytes()[..] {
        return Ok(None);
    }

    let size = (LEN_BYTES + len + CRC_BYTES) as u64;
    Ok(bincode::deserialize(payload).ok().map(|entry| (entry, size)))
}

/// `read_exact` that reports a short read as `false`.
fn fill(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<bool> {
    match reader.read_exact(buf) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(false),
        Err(e) => Err(e),
    }
}
