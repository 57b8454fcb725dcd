//! Shared type definitions for zkbridge.
//!
//! This crate provides the data model exchanged between the relayer and the verifier
//! service of the deposit bridge.
//!
//! ## Overview
//!
//! A deposit flows through the following shapes:
//! - [`DepositRecord`] - Raw deposit event observed on the source chain
//! - [`Witness`] - Canonical data extracted from a deposit, the input to a proof
//! - [`ProofEnvelope`] - Signed (and optionally recursively proven) wrapper around a witness
//! - [`Submission`] - Envelope addressed to a destination-chain recipient, sent to the verifier
//!
//! The verifier answers each submission with a [`SubmitResponse`].
//!
//! All binary data (payloads, signatures) is serialized as base64 when transmitted over HTTP.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod deposit;
mod proof;
mod submission;

pub use deposit::{CodecError, DepositId, DepositRecord, Witness};
pub use proof::{ProofEnvelope, ProofType, RecursiveProof};
pub use submission::{
    Admission, DepositStatusResponse, RejectionReason, Submission, SubmitResponse,
};
