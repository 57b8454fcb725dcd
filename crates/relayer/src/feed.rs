//! Source-chain deposit feeds.

use rand::{Rng, distr::Alphanumeric};
use serde::{Deserialize, Serialize};
use zkbridge_types::{DepositId, DepositRecord};

/// Lazy, possibly unbounded sequence of observed deposits.
///
/// A feed returning `None` has nothing to offer right now; the scheduler asks again on the
/// next tick.
pub trait DepositFeed: Send {
    /// Pulls the next deposit, if one is available.
    fn next_deposit(&mut self) -> Option<DepositRecord>;
}

impl<I> DepositFeed for I
where
    I: Iterator<Item = DepositRecord> + Send,
{
    fn next_deposit(&mut self) -> Option<DepositRecord> {
        self.next()
    }
}

/// Feed configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FeedConfig {
    /// Simulated deposits.
    Mock {
        /// Amount of every simulated deposit.
        #[serde(default = "default_mock_amount")]
        amount: f64,
        /// Prefix of simulated recipient addresses.
        #[serde(default = "default_recipient_prefix")]
        recipient_prefix: String,
    },
}

fn default_mock_amount() -> f64 {
    1.0
}

fn default_recipient_prefix() -> String {
    "B62q".to_string()
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self::Mock {
            amount: default_mock_amount(),
            recipient_prefix: default_recipient_prefix(),
        }
    }
}

impl FeedConfig {
    /// Builds the configured feed.
    pub fn build(&self) -> Box<dyn DepositFeed> {
        match self {
            Self::Mock {
                amount,
                recipient_prefix,
            } => Box::new(MockDepositFeed::new(*amount, recipient_prefix.clone())),
        }
    }
}

/// Simulates deposits: fresh UUID ids, random `tx-xxxxxx` ids, random heights and
/// recipients with a random suffix.
#[derive(Debug, Clone)]
pub struct MockDepositFeed {
    amount: f64,
    recipient_prefix: String,
}

impl MockDepositFeed {
    /// Creates a feed minting deposits of `amount` to `recipient_prefix...` addresses.
    pub fn new(amount: f64, recipient_prefix: impl Into<String>) -> Self {
        Self {
            amount,
            recipient_prefix: recipient_prefix.into(),
        }
    }
}

fn random_suffix(rng: &mut impl Rng, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

impl Iterator for MockDepositFeed {
    type Item = DepositRecord;

    fn next(&mut self) -> Option<DepositRecord> {
        let mut rng = rand::rng();
        Some(DepositRecord {
            deposit_id: DepositId::new_v4(),
            txid: format!("tx-{}", random_suffix(&mut rng, 6)),
            block_height: rng.random_range(0..1_000_000),
            amount: self.amount,
            recipient_address: format!(
                "{}{}",
                self.recipient_prefix,
                random_suffix(&mut rng, 4)
            ),
        })
    }
}
