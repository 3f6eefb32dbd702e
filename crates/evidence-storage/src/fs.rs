//! Filesystem implementation of `StorageBackend`.
//!
//! Layout under the root directory:
//!
//! ```text
//! <root>/records/<hash>.json   one serialized record per file
//! <root>/chain.txt             pointer log, one hash per line, append-only
//! ```
//!
//! Records are written to a hidden temp file (synced under
//! `SyncPolicy::EveryWrite`), then renamed into place, so a record file is
//! either complete or absent.  The
//! pointer log is only ever appended to.  A crash in the middle of an append
//! can leave a torn final line; `open` truncates it away, and readers ignore
//! any trailing line that has no newline yet.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use evidence_contracts::{EvidenceError, EvidenceResult};
use evidence_core::{chain::is_valid_hash, traits::StorageBackend};

/// Directory (under the root) holding one file per record.
pub const RECORDS_DIR: &str = "records";

/// Pointer log file name (under the root).
pub const POINTER_LOG_FILE: &str = "chain.txt";

const RECORD_EXT: &str = ".json";
const TEMP_EXT: &str = ".tmp";

/// When the pointer log and record directory are `fsync`ed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncPolicy {
    /// `fsync` every record, its directory entry, and every pointer append.
    #[default]
    EveryWrite,
    /// Flush to the OS and let the page cache decide.  Faster; a power loss
    /// may drop the most recent writes.
    OsDefault,
}

struct PointerLog {
    file: File,
    /// Length of the log up to and including the last complete entry.
    len: u64,
}

/// A `StorageBackend` rooted at a directory on the local filesystem.
pub struct FsBackend {
    root: PathBuf,
    records_dir: PathBuf,
    log_path: PathBuf,
    sync: SyncPolicy,
    pointer: Mutex<PointerLog>,
}

fn io_error(context: impl std::fmt::Display, err: io::Error) -> EvidenceError {
    EvidenceError::StorageIo {
        reason: format!("{}: {}", context, err),
    }
}

impl FsBackend {
    /// Open (or create) a store directory at `root`.
    ///
    /// Creates the layout if missing, removes temp files left by an
    /// interrupted record write, and truncates a torn final pointer entry.
    pub fn open(root: impl AsRef<Path>, sync: SyncPolicy) -> EvidenceResult<Self> {
        let root = root.as_ref().to_path_buf();
        let records_dir = root.join(RECORDS_DIR);
        let log_path = root.join(POINTER_LOG_FILE);

        fs::create_dir_all(&records_dir)
            .map_err(|e| io_error(format!("create {}", records_dir.display()), e))?;

        remove_stale_temp_files(&records_dir)?;

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| io_error(format!("open {}", log_path.display()), e))?;

        let len = repair_torn_tail(&file, &log_path)?;

        info!(root = %root.display(), ?sync, "filesystem evidence backend opened");

        Ok(Self {
            root,
            records_dir,
            log_path,
            sync,
            pointer: Mutex::new(PointerLog { file, len }),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Where the record for `hash` lives (or would live).
    ///
    /// Returns `NotFound` for strings that are not valid hashes, so callers
    /// can never build a path outside the records directory.
    pub fn record_path(&self, hash: &str) -> EvidenceResult<PathBuf> {
        if !is_valid_hash(hash) {
            return Err(EvidenceError::NotFound {
                hash: hash.to_string(),
            });
        }
        Ok(self.records_dir.join(format!("{}{}", hash, RECORD_EXT)))
    }

    fn sync_records_dir(&self) -> EvidenceResult<()> {
        if self.sync != SyncPolicy::EveryWrite {
            return Ok(());
        }
        sync_dir(&self.records_dir)
    }
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> EvidenceResult<()> {
    File::open(dir)
        .and_then(|d| d.sync_all())
        .map_err(|e| io_error(format!("sync {}", dir.display()), e))
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> EvidenceResult<()> {
    Ok(())
}

fn remove_stale_temp_files(records_dir: &Path) -> EvidenceResult<()> {
    let entries = fs::read_dir(records_dir)
        .map_err(|e| io_error(format!("list {}", records_dir.display()), e))?;

    for entry in entries {
        let entry = entry.map_err(|e| io_error(format!("list {}", records_dir.display()), e))?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with('.') && name.ends_with(TEMP_EXT) {
            debug!(file = %name, "removing temp file from interrupted record write");
            fs::remove_file(entry.path())
                .map_err(|e| io_error(format!("remove {}", entry.path().display()), e))?;
        }
    }
    Ok(())
}

/// Truncate the pointer log back to its last newline.  Returns the new
/// length.
fn repair_torn_tail(file: &File, log_path: &Path) -> EvidenceResult<u64> {
    let contents =
        fs::read(log_path).map_err(|e| io_error(format!("read {}", log_path.display()), e))?;

    if contents.last().map_or(true, |b| *b == b'\n') {
        return Ok(contents.len() as u64);
    }

    let keep = contents
        .iter()
        .rposition(|b| *b == b'\n')
        .map_or(0, |idx| idx + 1);

    file.set_len(keep as u64)
        .and_then(|()| file.sync_all())
        .map_err(|e| io_error(format!("truncate {}", log_path.display()), e))?;

    warn!(
        path = %log_path.display(),
        discarded_bytes = contents.len() - keep,
        "truncated torn entry at end of pointer log"
    );

    Ok(keep as u64)
}

impl StorageBackend for FsBackend {
    fn put_record(&self, hash: &str, bytes: &[u8]) -> EvidenceResult<()> {
        let path = self.record_path(hash).map_err(|_| EvidenceError::StorageIo {
            reason: format!("refusing to store record under invalid key '{}'", hash),
        })?;

        if path.exists() {
            return Err(EvidenceError::StorageIo {
                reason: format!("record {} already exists", hash),
            });
        }

        let tmp = self
            .records_dir
            .join(format!(".{}{}{}", hash, RECORD_EXT, TEMP_EXT));

        let written = File::create(&tmp).and_then(|mut f| {
            f.write_all(bytes)?;
            if self.sync == SyncPolicy::EveryWrite {
                f.sync_all()?;
            }
            Ok(())
        });
        if let Err(e) = written.and_then(|()| fs::rename(&tmp, &path)) {
            let _ = fs::remove_file(&tmp);
            return Err(io_error(format!("write {}", path.display()), e));
        }

        self.sync_records_dir()?;
        debug!(hash = %hash, bytes = bytes.len(), "record file written");
        Ok(())
    }

    fn get_record(&self, hash: &str) -> EvidenceResult<Vec<u8>> {
        let path = self.record_path(hash)?;
        fs::read(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => EvidenceError::NotFound {
                hash: hash.to_string(),
            },
            _ => io_error(format!("read {}", path.display()), e),
        })
    }

    fn discard_record(&self, hash: &str) -> EvidenceResult<()> {
        if self.pointer_log()?.iter().any(|h| h == hash) {
            return Err(EvidenceError::StorageIo {
                reason: format!("record {} is published and cannot be discarded", hash),
            });
        }

        let path = self.record_path(hash)?;
        match fs::remove_file(&path) {
            Ok(()) => self.sync_records_dir(),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(format!("remove {}", path.display()), e)),
        }
    }

    fn append_pointer(&self, hash: &str) -> EvidenceResult<()> {
        if !is_valid_hash(hash) {
            return Err(EvidenceError::StorageIo {
                reason: format!("refusing to append invalid pointer '{}'", hash),
            });
        }

        let mut log = self.pointer.lock().map_err(|_| EvidenceError::StorageIo {
            reason: "pointer log lock poisoned".to_string(),
        })?;

        let line = format!("{}\n", hash);
        let appended = log.file.write_all(line.as_bytes()).and_then(|()| {
            if self.sync == SyncPolicy::EveryWrite {
                log.file.sync_data()
            } else {
                Ok(())
            }
        });

        match appended {
            Ok(()) => {
                log.len += line.len() as u64;
                Ok(())
            }
            Err(e) => {
                // Cut off whatever part of the line made it to disk so the
                // next append starts on a clean line.
                let len = log.len;
                if let Err(trunc) = log.file.set_len(len) {
                    warn!(error = %trunc, "could not truncate partial pointer entry");
                }
                Err(io_error(format!("append {}", self.log_path.display()), e))
            }
        }
    }

    fn pointer_log(&self) -> EvidenceResult<Vec<String>> {
        let contents = match fs::read_to_string(&self.log_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_error(format!("read {}", self.log_path.display()), e)),
        };

        // Only lines terminated by a newline are committed.
        let committed = match contents.rfind('\n') {
            Some(idx) => &contents[..=idx],
            None => "",
        };

        let mut hashes = Vec::new();
        for line in committed.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if !is_valid_hash(line) {
                return Err(EvidenceError::ChainIntegrityViolation {
                    position: hashes.len(),
                    reason: format!("malformed pointer-log entry '{}'", line),
                });
            }
            hashes.push(line.to_string());
        }
        Ok(hashes)
    }

    fn record_hashes(&self) -> EvidenceResult<Vec<String>> {
        let entries = fs::read_dir(&self.records_dir)
            .map_err(|e| io_error(format!("list {}", self.records_dir.display()), e))?;

        let mut hashes = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| io_error(format!("list {}", self.records_dir.display()), e))?;
            let name = entry.file_name();
            let Some(stem) = name.to_str().and_then(|n| n.strip_suffix(RECORD_EXT)) else {
                continue;
            };
            if is_valid_hash(stem) {
                hashes.push(stem.to_string());
            }
        }
        Ok(hashes)
    }
}
