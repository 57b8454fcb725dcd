//! Deposit relayer for zkbridge.
//!
//! Observes deposits on the source chain and submits signed proofs of them to the verifier:
//!
//! ```text
//!   Feed        WitnessBuilder      ProofAssembler          VerifierClient      Verifier
//!    |               |                    |                        |                |
//!    |--deposit----->|                    |                        |                |
//!    |               |--witness---------->|                        |                |
//!    |               |           (sign, generate proof)            |                |
//!    |               |                    |--submission----------->|                |
//!    |               |                    |                        |--POST /submit->|
//!    |               |                    |                        |<---outcome-----|
//! ```
//!
//! [`RelayerService`] drives the pipeline on a fixed interval with bounded concurrency.

pub use crate::{
    assembler::{AssembleError, ProofAssembler, WATCHER_METADATA_KEY},
    config::Config,
    error::RelayError,
    feed::{DepositFeed, FeedConfig, MockDepositFeed},
    metrics::{init_metrics, metrics_app},
    pipeline::DepositPipeline,
    prover::{CommandGenerator, GeneratorConfig, GeneratorInput, ProofGenerator},
    service::RelayerService,
    witness::{InvalidRecord, WitnessBuilder},
};

mod assembler;
mod config;
mod error;
mod feed;
mod metrics;
mod pipeline;
mod prover;
mod service;
mod witness;
