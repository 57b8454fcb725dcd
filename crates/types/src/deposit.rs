use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for a deposit.
///
/// Deposits minted by the relayer use UUID v4 strings, but any non-empty string is a valid
/// identifier. A deposit keeps the same identifier for its whole lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(transparent)]
pub struct DepositId(pub String);

impl DepositId {
    /// Mints a fresh random identifier.
    pub fn new_v4() -> Self {
        DepositId(Uuid::new_v4().to_string())
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the identifier is empty (or only whitespace).
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for DepositId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for DepositId {
    fn from(s: String) -> Self {
        DepositId(s)
    }
}

impl From<&str> for DepositId {
    fn from(s: &str) -> Self {
        DepositId(s.to_string())
    }
}

/// A deposit event observed on the source chain.
///
/// Records are produced by the source-chain feed and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepositRecord {
    /// Identifier of the deposit.
    pub deposit_id: DepositId,
    /// Source-chain transaction id that locked the funds.
    pub txid: String,
    /// Height of the block containing the transaction.
    pub block_height: u64,
    /// Amount locked, in whole units of the source asset.
    pub amount: f64,
    /// Destination-chain address to credit.
    pub recipient_address: String,
}

/// Canonical data extracted from a [`DepositRecord`].
///
/// The canonical byte encoding is the compact JSON serialization of this struct, with fields
/// in declaration order. [`Witness::decode`] inverts [`Witness::encode`] exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Witness {
    /// Identifier of the deposit this witness was built from.
    pub deposit_id: DepositId,
    /// Source-chain transaction id.
    pub txid: String,
    /// Height of the block containing the transaction.
    pub block_height: u64,
    /// Amount locked.
    pub amount: f64,
    /// Identifier of the watcher that observed the deposit.
    pub watcher_id: String,
    /// When the watcher observed the deposit.
    pub observed_at: DateTime<Utc>,
}

/// Errors from encoding or decoding a canonical witness payload.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload contained no bytes.
    #[error("empty witness payload")]
    Empty,
    /// The payload is not a well-formed witness.
    #[error("malformed witness payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl Witness {
    /// Encodes the witness into its canonical byte form.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes a canonical payload back into a witness.
    pub fn decode(payload: &[u8]) -> Result<Self, CodecError> {
        if payload.is_empty() {
            return Err(CodecError::Empty);
        }
        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use crate::{CodecError, DepositId, Witness};

    fn sample_witness() -> Witness {
        Witness {
            deposit_id: DepositId::from("d1"),
            txid: "tx-abc".to_string(),
            block_height: 100,
            amount: 1.0,
            watcher_id: "w1".to_string(),
            observed_at: Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap(),
        }
    }

    #[test]
    fn test_encode_is_stable_and_decodes_back() {
        let witness = sample_witness();
        let encoded = witness.encode().unwrap();

        assert_eq!(
            String::from_utf8(encoded.clone()).unwrap(),
            r#"{"deposit_id":"d1","txid":"tx-abc","block_height":100,"amount":1.0,"watcher_id":"w1","observed_at":"2025-01-02T03:04:05Z"}"#
        );
        assert_eq!(Witness::decode(&encoded).unwrap(), witness);
        assert_eq!(Witness::decode(&encoded).unwrap().encode().unwrap(), encoded);
    }

    #[test]
    fn test_fractional_amount_survives_encoding() {
        let mut witness = sample_witness();
        witness.amount = 0.1 + 0.2;
        let decoded = Witness::decode(&witness.encode().unwrap()).unwrap();
        assert_eq!(decoded.amount.to_bits(), witness.amount.to_bits());
    }

    #[test]
    fn test_decode_rejects_empty_and_garbage() {
        assert!(matches!(Witness::decode(b""), Err(CodecError::Empty)));
        assert!(matches!(
            Witness::decode(b"{\"deposit_id\":\"d1\"}"),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn test_deposit_id_helpers() {
        assert!(DepositId::default().is_empty());
        assert!(DepositId::from("  ").is_empty());
        let minted = DepositId::new_v4();
        assert!(!minted.is_empty());
        assert_ne!(minted, DepositId::new_v4());
        assert_eq!(DepositId::from("d1").to_string(), "d1");
    }
}
