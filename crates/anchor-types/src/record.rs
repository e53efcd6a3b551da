//! Provenance records and input validation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Maximum length (in characters) of any free-text record field.
pub const MAX_FIELD_LEN: usize = 256;

/// Errors raised for malformed caller input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("field '{field}' must not be empty")]
    EmptyField { field: &'static str },

    #[error("field '{field}' is {len} characters long (limit: {limit})")]
    FieldTooLong {
        field: &'static str,
        len: usize,
        limit: usize,
    },

    #[error("quantity must be greater than zero")]
    ZeroQuantity,

    #[error("difficulty {requested} is out of range (maximum: {max})")]
    DifficultyOutOfRange { requested: u32, max: u32 },
}

/// A single product-provenance record.
///
/// Records carry no identity of their own; they are identified by their
/// content digest once anchored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvenanceRecord {
    pub product_name: String,
    pub sku: String,
    pub batch: String,
    /// Calendar date of manufacture (`YYYY-MM-DD` on the wire).
    pub manufacture_date: NaiveDate,
    pub quantity: u64,
    pub destination_shop: String,
}

impl ProvenanceRecord {
    /// Check that every field is usable before the record is sealed.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_text("productName", &self.product_name)?;
        check_text("sku", &self.sku)?;
        check_text("batch", &self.batch)?;
        check_text("destinationShop", &self.destination_shop)?;
        if self.quantity == 0 {
            return Err(ValidationError::ZeroQuantity);
        }
        Ok(())
    }
}

fn check_text(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField { field });
    }
    let len = value.chars().count();
    if len > MAX_FIELD_LEN {
        return Err(ValidationError::FieldTooLong {
            field,
            len,
            limit: MAX_FIELD_LEN,
        });
    }
    Ok(())
}

/// Required number of leading zero hex characters in a block hash.
///
/// Bounded by the 64 hex characters of a SHA3-256 digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u8);

impl Difficulty {
    pub const MAX: u32 = 64;

    pub fn new(value: u32) -> Result<Self, ValidationError> {
        if value > Self::MAX {
            return Err(ValidationError::DifficultyOutOfRange {
                requested: value,
                max: Self::MAX,
            });
        }
        Ok(Self(value as u8))
    }

    /// Number of leading zero nibbles required.
    pub fn get(self) -> usize {
        usize::from(self.0)
    }
}

/// Three leading zeros, a few thousand hashes per block on average.
impl Default for Difficulty {
    fn default() -> Self {
        Self(3)
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = ValidationError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Difficulty> for u32 {
    fn from(value: Difficulty) -> Self {
        u32::from(value.0)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_valid_record_passes() {
        assert!(sample_record().validate().is_ok());
    }

    #[test]
    fn test_blank_field_rejected() {
        let mut record = sample_record();
        record.sku = "   ".to_string();
        assert_eq!(
            record.validate(),
            Err(ValidationError::EmptyField { field: "sku" })
        );
    }

    #[test]
    fn test_long_field_rejected() {
        let mut record = sample_record();
        record.batch = "b".repeat(MAX_FIELD_LEN + 1);
        assert!(matches!(
            record.validate(),
            Err(ValidationError::FieldTooLong { field: "batch", .. })
        ));
    }

    #[test]
    fn test_field_at_limit_accepted() {
        let mut record = sample_record();
        record.product_name = "p".repeat(MAX_FIELD_LEN);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let mut record = sample_record();
        record.quantity = 0;
        assert_eq!(record.validate(), Err(ValidationError::ZeroQuantity));
    }

    #[test]
    fn test_record_json_uses_camel_case() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("\"productName\":\"Widget\""));
        assert!(json.contains("\"manufactureDate\":\"2024-03-01\""));
        assert!(json.contains("\"destinationShop\""));
    }

    #[test]
    fn test_record_rejects_bad_date() {
        let json = r#"{"productName":"W","sku":"X1","batch":"B","manufactureDate":"03/01/2024","quantity":1,"destinationShop":"S"}"#;
        assert!(serde_json::from_str::<ProvenanceRecord>(json).is_err());
    }

    #[test]
    fn test_difficulty_bounds() {
        assert_eq!(Difficulty::new(0).unwrap().get(), 0);
        assert_eq!(Difficulty::new(64).unwrap().get(), 64);
        assert_eq!(
            Difficulty::new(65),
            Err(ValidationError::DifficultyOutOfRange {
                requested: 65,
                max: 64
            })
        );
    }

    #[test]
    fn test_difficulty_deserializes_with_bounds() {
        let ok: Difficulty = serde_json::from_str("4").unwrap();
        assert_eq!(ok.get(), 4);
        assert!(serde_json::from_str::<Difficulty>("100").is_err());
    }
}
