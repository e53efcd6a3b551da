use super::{check_tail, AppendError, ConstraintViolation, Ledger, StoreError, StoredBlock};
use anchor_types::{Block, BlockId};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// In-process ledger guarded by a single mutex.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    blocks: Vec<StoredBlock>,
    salts: HashSet<String>,
    hashes: HashSet<String>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory ledger lock poisoned".to_string()))
    }
}

impl Ledger for MemoryLedger {
    fn tail(&self) -> Result<Option<StoredBlock>, StoreError> {
        Ok(self.lock()?.blocks.last().cloned())
    }

    fn append_if_tail_matches(
        &self,
        block: Block,
        expected_tail: &str,
    ) -> Result<BlockId, AppendError> {
        let mut inner = self.lock()?;
        let current = inner
            .blocks
            .last()
            .map_or(anchor_types::GENESIS_HASH, |tail| tail.block.block_hash.as_str());
        check_tail(current, &block, expected_tail)?;

        if inner.salts.contains(&block.salt) {
            return Err(ConstraintViolation::DuplicateSalt { salt: block.salt }.into());
        }
        if inner.hashes.contains(&block.block_hash) {
            return Err(ConstraintViolation::DuplicateHash {
                hash: block.block_hash,
            }
            .into());
        }

        let id = BlockId(inner.blocks.len() as u64);
        inner.salts.insert(block.salt.clone());
        inner.hashes.insert(block.block_hash.clone());
        inner.blocks.push(StoredBlock { id, block });
        Ok(id)
    }

    fn get_by_id(&self, id: BlockId) -> Result<Option<StoredBlock>, StoreError> {
        let inner = self.lock()?;
        Ok(usize::try_from(id.0)
            .ok()
            .and_then(|index| inner.blocks.get(index))
            .cloned())
    }

    fn blocks(&self) -> Result<Vec<StoredBlock>, StoreError> {
        Ok(self.lock()?.blocks.clone())
    }

    fn find_by_salt(&self, salt: &str) -> Result<Option<StoredBlock>, StoreError> {
        let inner = self.lock()?;
        if !inner.salts.contains(salt) {
            return Ok(None);
        }
        Ok(inner.blocks.iter().find(|s| s.block.salt == salt).cloned())
    }

    fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.blocks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_support::block_on;
    use anchor_types::GENESIS_HASH;

    #[test]
    fn test_empty_ledger_tail_is_genesis() {
        let ledger = MemoryLedger::new();
        assert_eq!(ledger.tail_hash().unwrap(), GENESIS_HASH);
        assert!(ledger.tail().unwrap().is_none());
        assert!(ledger.is_empty().unwrap());
    }

    #[test]
    fn test_append_and_lookup() {
        let ledger = MemoryLedger::new();
        let block = block_on(GENESIS_HASH, &"01".repeat(16));
        let id = ledger
            .append_if_tail_matches(block.clone(), GENESIS_HASH)
            .unwrap();
        assert_eq!(id, BlockId(0));
        assert_eq!(ledger.get_by_id(id).unwrap().unwrap().block, block);
        assert_eq!(ledger.tail_hash().unwrap(), block.block_hash);
        assert_eq!(
            ledger.find_by_salt(&block.salt).unwrap().unwrap().id,
            BlockId(0)
        );
        assert!(ledger.get_by_id(BlockId(1)).unwrap().is_none());
    }

    #[test]
    fn test_stale_expected_tail_rejected() {
        let ledger = MemoryLedger::new();
        let first = block_on(GENESIS_HASH, &"01".repeat(16));
        ledger
            .append_if_tail_matches(first.clone(), GENESIS_HASH)
            .unwrap();

        let racing = block_on(GENESIS_HASH, &"02".repeat(16));
        let err = ledger
            .append_if_tail_matches(racing, GENESIS_HASH)
            .unwrap_err();
        assert!(matches!(err, AppendError::StaleTail { current, .. } if current == first.block_hash));
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[test]
    fn test_block_not_linked_to_expected_tail_rejected() {
        let ledger = MemoryLedger::new();
        let block = block_on(&"b".repeat(64), &"01".repeat(16));
        assert!(matches!(
            ledger.append_if_tail_matches(block, GENESIS_HASH),
            Err(AppendError::StaleTail { .. })
        ));
    }

    #[test]
    fn test_duplicate_salt_rejected() {
        let ledger = MemoryLedger::new();
        let salt = "07".repeat(16);
        let first = block_on(GENESIS_HASH, &salt);
        ledger
            .append_if_tail_matches(first.clone(), GENESIS_HASH)
            .unwrap();

        let second = block_on(&first.block_hash, &salt);
        let err = ledger
            .append_if_tail_matches(second, &first.block_hash)
            .unwrap_err();
        assert!(matches!(
            err,
            AppendError::Conflict(ConstraintViolation::DuplicateSalt { .. })
        ));
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_hash_rejected() {
        let ledger = MemoryLedger::new();
        let first = block_on(GENESIS_HASH, &"08".repeat(16));
        ledger
            .append_if_tail_matches(first.clone(), GENESIS_HASH)
            .unwrap();

        let mut copy = block_on(&first.block_hash, &"09".repeat(16));
        copy.block_hash = first.block_hash.clone();
        let err = ledger
            .append_if_tail_matches(copy, &first.block_hash)
            .unwrap_err();
        assert!(matches!(
            err,
            AppendError::Conflict(ConstraintViolation::DuplicateHash { hash }) if hash == first.block_hash
        ));
        assert_eq!(ledger.len().unwrap(), 1);
    }

    #[test]
    fn test_mislinked_block_reports_its_own_link() {
        let ledger = MemoryLedger::new();
        let first = block_on(GENESIS_HASH, &"0a".repeat(16));
        ledger
            .append_if_tail_matches(first.clone(), GENESIS_HASH)
            .unwrap();

        let orphan = block_on(GENESIS_HASH, &"0b".repeat(16));
        let err = ledger
            .append_if_tail_matches(orphan, &first.block_hash)
            .unwrap_err();
        match err {
            AppendError::StaleTail { expected, current } => {
                assert_eq!(expected, GENESIS_HASH);
                assert_eq!(current, first.block_hash);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
