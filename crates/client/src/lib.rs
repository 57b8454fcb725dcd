//! HTTP client for the zkbridge verifier.
//!
//! This is the relayer's Submission Client: it delivers a [`Submission`](types::Submission)
//! once per call and classifies the verifier's answer into a [`SubmitOutcome`].
//!
//! ## Example
//!
//! ```no_run
//! use zkbridge_client::{SubmitOutcome, VerifierClient};
//!
//! # async fn example(submission: zkbridge_client::types::Submission) -> Result<(), zkbridge_client::Error> {
//! let client = VerifierClient::new("http://localhost:5001")?;
//!
//! match client.submit(&submission).await? {
//!     SubmitOutcome::Admitted(admission) => println!("credited {}", admission.credited_to),
//!     SubmitOutcome::AlreadyProcessed(id) => println!("{id} was already admitted"),
//!     SubmitOutcome::Rejected { reason, detail } => println!("rejected: {reason} ({detail})"),
//! }
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

pub use client::{SubmitOutcome, VerifierClient};
pub use error::Error;
pub use zkbridge_types as types;

mod client;
mod error;
