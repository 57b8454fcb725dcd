use std::{fmt, sync::Arc};

use chrono::{DateTime, Utc};
use thiserror::Error;
use zkbridge_types::{DepositRecord, Witness};

/// A deposit record that cannot be turned into a witness.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidRecord {
    /// The record has no deposit id.
    #[error("empty deposit_id")]
    EmptyDepositId,
    /// The record has no source transaction id.
    #[error("empty txid")]
    EmptyTxid,
    /// The record has no recipient.
    #[error("empty recipient_address")]
    EmptyRecipient,
    /// The amount is negative, NaN or infinite.
    #[error("invalid amount: {0}")]
    InvalidAmount(f64),
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Builds canonical witnesses from deposit records, stamped with the watcher identity.
#[derive(Clone)]
pub struct WitnessBuilder {
    watcher_id: String,
    clock: Clock,
}

impl fmt::Debug for WitnessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WitnessBuilder")
            .field("watcher_id", &self.watcher_id)
            .finish_non_exhaustive()
    }
}

impl WitnessBuilder {
    /// Creates a builder stamping `observed_at` with the system clock.
    pub fn new(watcher_id: impl Into<String>) -> Self {
        Self {
            watcher_id: watcher_id.into(),
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the clock used for `observed_at`.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Returns the watcher identity.
    pub fn watcher_id(&self) -> &str {
        &self.watcher_id
    }

    /// Builds the witness for `record`.
    pub fn build(&self, record: &DepositRecord) -> Result<Witness, InvalidRecord> {
        if record.deposit_id.is_empty() {
            return Err(InvalidRecord::EmptyDepositId);
        }
        if record.txid.trim().is_empty() {
            return Err(InvalidRecord::EmptyTxid);
        }
        if record.recipient_address.trim().is_empty() {
            return Err(InvalidRecord::EmptyRecipient);
        }
        if !record.amount.is_finite() || record.amount < 0.0 {
            return Err(InvalidRecord::InvalidAmount(record.amount));
        }

        Ok(Witness {
            deposit_id: record.deposit_id.clone(),
            txid: record.txid.clone(),
            block_height: record.block_height,
            amount: record.amount,
            watcher_id: self.watcher_id.clone(),
            observed_at: (self.clock)(),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use zkbridge_types::{DepositId, DepositRecord};

    use crate::witness::{InvalidRecord, WitnessBuilder};

    fn record() -> DepositRecord {
        DepositRecord {
            deposit_id: DepositId::from("d1"),
            txid: "tx-abc".to_string(),
            block_height: 100,
            amount: 1.0,
            recipient_address: "B62qrecipient".to_string(),
        }
    }

    #[test]
    fn test_build_copies_record_and_stamps_watcher() {
        let observed_at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        let builder = WitnessBuilder::new("w1").with_clock(move || observed_at);

        let witness = builder.build(&record()).unwrap();
        assert_eq!(witness.deposit_id, DepositId::from("d1"));
        assert_eq!(witness.txid, "tx-abc");
        assert_eq!(witness.block_height, 100);
        assert_eq!(witness.amount, 1.0);
        assert_eq!(witness.watcher_id, "w1");
        assert_eq!(witness.observed_at, observed_at);
        assert_eq!(
            String::from_utf8(witness.encode().unwrap()).unwrap(),
            r#"{"deposit_id":"d1","txid":"tx-abc","block_height":100,"amount":1.0,"watcher_id":"w1","observed_at":"2025-01-02T03:04:05Z"}"#
        );
    }

    #[test]
    fn test_build_rejects_invalid_records() {
        let builder = WitnessBuilder::new("w1");

        let mut r = record();
        r.deposit_id = DepositId::from("  ");
        assert_eq!(builder.build(&r), Err(InvalidRecord::EmptyDepositId));

        let mut r = record();
        r.txid.clear();
        assert_eq!(builder.build(&r), Err(InvalidRecord::EmptyTxid));

        let mut r = record();
        r.recipient_address.clear();
        assert_eq!(builder.build(&r), Err(InvalidRecord::EmptyRecipient));

        let mut r = record();
        r.amount = -1.0;
        assert_eq!(builder.build(&r), Err(InvalidRecord::InvalidAmount(-1.0)));

        let mut r = record();
        r.amount = f64::NAN;
        assert!(matches!(builder.build(&r), Err(InvalidRecord::InvalidAmount(_))));

        let mut r = record();
        r.amount = 0.0;
        assert!(builder.build(&r).is_ok());
    }
}
