use super::{check_tail, AppendError, ConstraintViolation, Ledger, StoreError, StoredBlock};
use anchor_types::{Block, BlockId, GENESIS_HASH};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Ledger persisted as a single pretty-printed JSON document.
///
/// Nothing is cached: every call re-reads the file. Appends take an
/// exclusive OS lock on a sidecar `<ledger>.lock` file, re-check the tail
/// and uniqueness constraints against the file's current contents, then
/// replace the file atomically through a temporary file in the same
/// directory. The lock is shared by every handle and process opening the
/// same path. A missing file is an empty ledger.
#[derive(Debug)]
pub struct FileLedger {
    path: PathBuf,
    lock_path: PathBuf,
}

/// Exclusive writer lock; released when the file handle closes.
struct WriterLock {
    _file: File,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct LedgerDocument {
    blocks: Vec<StoredBlock>,
}

impl FileLedger {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = OsString::from(path.as_os_str());
        lock_name.push(".lock");
        Self {
            path,
            lock_path: PathBuf::from(lock_name),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    /// Block until no other handle or process holds the writer lock.
    fn lock_writer(&self) -> Result<WriterLock, StoreError> {
        fs::create_dir_all(self.dir())?;
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;
        Ok(WriterLock { _file: file })
    }

    fn read(&self) -> Result<LedgerDocument, StoreError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(LedgerDocument::default()),
            Err(err) => return Err(err.into()),
        };
        if contents.trim().is_empty() {
            return Ok(LedgerDocument::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn write(&self, document: &LedgerDocument) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        serde_json::to_writer_pretty(&mut tmp, document)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|err| StoreError::Io(err.error))?;
        Ok(())
    }
}

impl Ledger for FileLedger {
    fn tail(&self) -> Result<Option<StoredBlock>, StoreError> {
        Ok(self.read()?.blocks.pop())
    }

    fn append_if_tail_matches(
        &self,
        block: Block,
        expected_tail: &str,
    ) -> Result<BlockId, AppendError> {
        let _lock = self.lock_writer()?;

        let mut document = self.read()?;
        let current = document
            .blocks
            .last()
            .map_or(GENESIS_HASH, |tail| tail.block.block_hash.as_str());
        check_tail(current, &block, expected_tail)?;

        for existing in &document.blocks {
            if existing.block.salt == block.salt {
                return Err(ConstraintViolation::DuplicateSalt { salt: block.salt }.into());
            }
            if existing.block.block_hash == block.block_hash {
                return Err(ConstraintViolation::DuplicateHash {
                    hash: block.block_hash,
                }
                .into());
            }
        }

        let id = BlockId(document.blocks.len() as u64);
        document.blocks.push(StoredBlock { id, block });
        self.write(&document)?;
        debug!(path = %self.path.display(), %id, "block written to ledger file");
        Ok(id)
    }

    fn get_by_id(&self, id: BlockId) -> Result<Option<StoredBlock>, StoreError> {
        Ok(self
            .read()?
            .blocks
            .into_iter()
            .find(|stored| stored.id == id))
    }

    fn blocks(&self) -> Result<Vec<StoredBlock>, StoreError> {
        Ok(self.read()?.blocks)
    }
}
