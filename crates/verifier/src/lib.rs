//! Deposit verifier for zkbridge.
//!
//! Validates proof submissions from relayers and admits each deposit at most once.
//!
//! ## Pipeline
//!
//! Every submission runs the same ordered checks (see [`Verifier::submit`]):
//!
//! 1. Structure - deposit id and proof envelope present
//! 2. Replay - deposit not yet in the processed set
//! 3. Proof type - a verifying key is configured for the envelope's tag
//! 4. Signature - payload signed by that key and bound to the deposit id
//! 5. Recursive proof - conforms to and is accepted by the [`RecursiveVerifier`]
//! 6. Admission - atomic insert into the [`ProcessedSet`]
//!
//! ## Endpoints
//!
//! - `POST /submit` - Validate and admit a deposit
//! - `GET /deposits/{deposit_id}` - Whether a deposit has been admitted
//! - `GET /health` - Liveness
//! - `GET /metrics` - Prometheus metrics

pub use crate::{
    app::{AppState, app},
    config::{Config, StoreConfig},
    metrics::{init_metrics, set_build_info},
    recursive::{RecursiveProofError, RecursiveVerifier, ShapeVerifier, SnarkjsVerifier},
    store::{FileProcessedSet, MemoryProcessedSet, ProcessedSet, StoreError},
    verifier::{Verifier, VerifierError},
};

mod app;
mod config;
mod metrics;
mod recursive;
mod store;
mod verifier;
