//! Canonical SHA3-256 digests for provenance records and ledger blocks.
//!
//! Every value is fed to the hasher length-prefixed and in schema order, so
//! the digest depends only on field contents and never on how a record was
//! assembled (JSON key order, builder order, and so on).

use anchor_types::{CandidateFields, Difficulty, ProvenanceRecord};
use sha3::{Digest, Sha3_256};

type HashState = Sha3_256;

const RECORD_DOMAIN: &str = "anchor/provenance-record/v1";
const BLOCK_DOMAIN: &str = "anchor/block/v1";

/// Digest of a provenance record as 64 lowercase hex characters.
pub fn record_digest(record: &ProvenanceRecord) -> String {
    let mut hasher = Sha3_256::new();
    feed_str(&mut hasher, RECORD_DOMAIN);
    feed_field(&mut hasher, "productName", &record.product_name);
    feed_field(&mut hasher, "sku", &record.sku);
    feed_field(&mut hasher, "batch", &record.batch);
    feed_field(
        &mut hasher,
        "manufactureDate",
        &record.manufacture_date.to_string(),
    );
    feed_str(&mut hasher, "quantity");
    feed_u64(&mut hasher, record.quantity);
    feed_field(&mut hasher, "destinationShop", &record.destination_shop);
    hex::encode(hasher.finalize())
}

/// Block hash function with the fixed fields absorbed up front.
///
/// Mining hashes the same prefix with millions of nonces; cloning the
/// absorbed state avoids re-feeding the fields on every attempt.
#[derive(Clone)]
pub struct BlockHasher {
    prefix: HashState,
}

impl BlockHasher {
    pub fn new(fields: &CandidateFields) -> Self {
        let mut prefix = Sha3_256::new();
        feed_str(&mut prefix, BLOCK_DOMAIN);
        prefix.update(fields.timestamp.to_le_bytes());
        feed_str(&mut prefix, &fields.record_digest);
        feed_str(&mut prefix, &fields.salt);
        feed_str(&mut prefix, &fields.signature);
        feed_str(&mut prefix, &fields.previous_block_hash);
        Self { prefix }
    }

    /// Raw digest for the given nonce.
    pub fn hash(&self, nonce: u64) -> [u8; 32] {
        let mut state = self.prefix.clone();
        feed_u64(&mut state, nonce);
        state.finalize().into()
    }

    pub fn hash_hex(&self, nonce: u64) -> String {
        hex::encode(self.hash(nonce))
    }
}

/// `H(timestamp, recordDigest, salt, signature, previousBlockHash, nonce)` as hex.
pub fn block_hash(fields: &CandidateFields, nonce: u64) -> String {
    BlockHasher::new(fields).hash_hex(nonce)
}

/// Count of leading zero hex characters (nibbles) in a raw digest.
pub fn leading_zero_nibbles(digest: &[u8]) -> usize {
    let mut count = 0;
    for byte in digest {
        if *byte == 0 {
            count += 2;
            continue;
        }
        if *byte < 0x10 {
            count += 1;
        }
        break;
    }
    count
}

/// Difficulty predicate on a raw digest.
pub fn meets_difficulty(digest: &[u8], difficulty: Difficulty) -> bool {
    leading_zero_nibbles(digest) >= difficulty.get()
}

/// Difficulty predicate on a hex-encoded hash.
pub fn hex_meets_difficulty(hash: &str, difficulty: Difficulty) -> bool {
    hash.len() >= difficulty.get() && hash.bytes().take(difficulty.get()).all(|b| b == b'0')
}

fn feed_field(hasher: &mut HashState, name: &str, value: &str) {
    feed_str(hasher, name);
    feed_str(hasher, value);
}

fn feed_str(hasher: &mut HashState, value: &str) {
    feed_u64(hasher, value.len() as u64);
    hasher.update(value.as_bytes());
}

fn feed_u64(hasher: &mut HashState, value: u64) {
    hasher.update(value.to_le_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use anchor_types::GENESIS_HASH;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn sample_record() -> ProvenanceRecord {
        ProvenanceRecord {
            product_name: "Widget".to_string(),
            sku: "X1".to_string(),
            batch: "B-7".to_string(),
            manufacture_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            quantity: 10,
            destination_shop: "Shop 12".to_string(),
        }
    }

    fn sample_fields() -> CandidateFields {
        CandidateFields {
            timestamp: 1_700_000_000_000,
            record_digest: record_digest(&sample_record()),
            salt: "a1".repeat(16),
            signature: "ed25519:beef".to_string(),
            previous_block_hash: GENESIS_HASH.to_string(),
        }
    }

    #[test]
    fn test_record_digest_shape() {
        let digest = record_digest(&sample_record());
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_record_digest_ignores_json_key_order() {
        let a = r#"{"productName":"Widget","sku":"X1","batch":"B-7","manufactureDate":"2024-03-01","quantity":10,"destinationShop":"Shop 12"}"#;
        let b = r#"{"destinationShop":"Shop 12","quantity":10,"manufactureDate":"2024-03-01","batch":"B-7","sku":"X1","productName":"Widget"}"#;
        let ra: ProvenanceRecord = serde_json::from_str(a).unwrap();
        let rb: ProvenanceRecord = serde_json::from_str(b).unwrap();
        assert_eq!(record_digest(&ra), record_digest(&rb));
        assert_eq!(record_digest(&ra), record_digest(&sample_record()));
    }

    #[test]
    fn test_record_digest_changes_with_content() {
        let mut other = sample_record();
        other.quantity = 11;
        assert_ne!(record_digest(&sample_record()), record_digest(&other));
    }

    #[test]
    fn test_field_boundaries_are_unambiguous() {
        let mut a = sample_record();
        a.sku = "X1B".to_string();
        a.batch = "-7".to_string();
        let b = sample_record();
        assert_ne!(record_digest(&a), record_digest(&b));
    }

    #[test]
    fn test_block_hash_matches_incremental_hasher() {
        let fields = sample_fields();
        let hasher = BlockHasher::new(&fields);
        for nonce in [0, 1, 99, u64::MAX] {
            assert_eq!(block_hash(&fields, nonce), hasher.hash_hex(nonce));
        }
    }

    #[test]
    fn test_block_hash_depends_on_every_field() {
        let base = sample_fields();
        let reference = block_hash(&base, 5);
        assert_ne!(reference, block_hash(&base, 6));

        let mut changed = base.clone();
        changed.timestamp += 1;
        assert_ne!(reference, block_hash(&changed, 5));

        let mut changed = base.clone();
        changed.salt.push('0');
        assert_ne!(reference, block_hash(&changed, 5));

        let mut changed = base.clone();
        changed.signature.push('0');
        assert_ne!(reference, block_hash(&changed, 5));

        let mut changed = base;
        changed.previous_block_hash = "f".repeat(64);
        assert_ne!(reference, block_hash(&changed, 5));
    }

    #[test]
    fn test_leading_zero_nibbles() {
        assert_eq!(leading_zero_nibbles(&[0xff, 0x00]), 0);
        assert_eq!(leading_zero_nibbles(&[0x0f, 0x00]), 1);
        assert_eq!(leading_zero_nibbles(&[0x00, 0x10]), 2);
        assert_eq!(leading_zero_nibbles(&[0x00, 0x01]), 3);
        assert_eq!(leading_zero_nibbles(&[0x00; 32]), 64);
    }

    #[test]
    fn test_hex_predicate() {
        let d3 = Difficulty::new(3).unwrap();
        assert!(hex_meets_difficulty("000abc", d3));
        assert!(!hex_meets_difficulty("00abcd", d3));
        assert!(!hex_meets_difficulty("00", d3));
        assert!(hex_meets_difficulty("f", Difficulty::new(0).unwrap()));
    }

    proptest! {
        #[test]
        fn prop_raw_and_hex_predicates_agree(bytes in proptest::array::uniform32(any::<u8>()), d in 0u32..=8) {
            let difficulty = Difficulty::new(d).unwrap();
            prop_assert_eq!(
                meets_difficulty(&bytes, difficulty),
                hex_meets_difficulty(&hex::encode(bytes), difficulty)
            );
        }
    }
}
