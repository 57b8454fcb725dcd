//! Error types for the relayer.

use thiserror::Error;

use crate::{assembler::AssembleError, witness::InvalidRecord};

/// Errors relaying a single deposit.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The deposit record is unusable.
    #[error("invalid deposit record: {0}")]
    InvalidRecord(#[from] InvalidRecord),
    /// The submission could not be assembled.
    #[error(transparent)]
    Assemble(#[from] AssembleError),
    /// The verifier could not be reached or answered unexpectedly.
    #[error("submission failed: {0}")]
    Transport(#[from] zkbridge_client::Error),
}
