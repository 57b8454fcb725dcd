//! Submission validation and admission.

use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, bail};
use thiserror::Error;
use tracing::{debug, instrument};
use zkbridge_signer::{SignatureVerifier, VerifyingKey};
use zkbridge_types::{
    Admission, DepositId, ProofEnvelope, ProofType, RejectionReason, Submission, Witness,
};

use crate::{
    config::Config,
    recursive::{RecursiveProofError, RecursiveVerifier},
    store::{ProcessedSet, StoreError},
};

/// Reasons a submission is not admitted.
#[derive(Debug, Error)]
pub enum VerifierError {
    /// Missing deposit id or proof.
    #[error("malformed submission: {0}")]
    Malformed(String),
    /// The deposit was already admitted. Not a failure from the relayer's point of view.
    #[error("deposit {0} already processed")]
    AlreadyProcessed(DepositId),
    /// No verifying key is configured for the envelope's proof type.
    #[error("unsupported proof type: {0}")]
    UnsupportedProofType(ProofType),
    /// The payload or signature does not check out.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),
    /// The recursive proof is missing where required, malformed or rejected.
    #[error(transparent)]
    InvalidRecursiveProof(#[from] RecursiveProofError),
    /// The processed-set store failed; nothing was admitted.
    #[error("processed-set store error: {0}")]
    Store(#[from] StoreError),
}

impl VerifierError {
    /// Wire rejection reason, or `None` for outcomes that are not rejections.
    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            Self::Malformed(_) => Some(RejectionReason::Malformed),
            Self::UnsupportedProofType(_) => Some(RejectionReason::UnsupportedProofType),
            Self::InvalidSignature(_) => Some(RejectionReason::InvalidSignature),
            Self::InvalidRecursiveProof(_) => Some(RejectionReason::InvalidRecursiveProof),
            Self::AlreadyProcessed(_) | Self::Store(_) => None,
        }
    }
}

/// Validates submissions and admits each deposit at most once.
///
/// Checks run in a fixed order: structure, replay, proof type, signature, recursive proof,
/// then admission. The first failing check decides the outcome. Admission is an atomic
/// check-and-insert on the processed set, so of several concurrent valid submissions for the
/// same deposit exactly one is admitted and the rest see [`VerifierError::AlreadyProcessed`].
#[derive(Debug)]
pub struct Verifier {
    schemes: HashMap<ProofType, VerifyingKey>,
    recursive: RecursiveVerifier,
    require_recursive_proof: bool,
    store: Arc<dyn ProcessedSet>,
}

impl Verifier {
    /// Creates a verifier backed by `store` that accepts no proof types yet.
    pub fn new(store: Arc<dyn ProcessedSet>) -> Self {
        Self {
            schemes: HashMap::new(),
            recursive: RecursiveVerifier::default(),
            require_recursive_proof: false,
            store,
        }
    }

    /// Builds a verifier from configuration, opening the configured store.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        if config.schemes.is_empty() {
            bail!("No proof schemes configured");
        }

        let store = config.store.open().context("Failed to open processed-set store")?;
        let mut verifier = Self::new(store)
            .with_recursive_verifier(config.recursive.clone())
            .require_recursive_proof(config.require_recursive_proof);

        for scheme in &config.schemes {
            let proof_type = scheme.proof_type();
            if verifier.schemes.contains_key(&proof_type) {
                bail!("Proof scheme {proof_type} configured more than once");
            }
            let key = VerifyingKey::from_config(scheme)
                .with_context(|| format!("Invalid verifying key for {proof_type}"))?;
            verifier = verifier.with_scheme(key);
        }

        Ok(verifier)
    }

    /// Accepts envelopes tagged with `key`'s proof type, checked with `key`.
    pub fn with_scheme(mut self, key: VerifyingKey) -> Self {
        self.schemes.insert(key.proof_type(), key);
        self
    }

    /// Replaces the recursive proof verifier.
    pub fn with_recursive_verifier(mut self, recursive: RecursiveVerifier) -> Self {
        self.recursive = recursive;
        self
    }

    /// Sets whether envelopes without a recursive proof are rejected.
    pub fn require_recursive_proof(mut self, required: bool) -> Self {
        self.require_recursive_proof = required;
        self
    }

    /// Returns the accepted proof types.
    pub fn proof_types(&self) -> impl Iterator<Item = &ProofType> {
        self.schemes.keys()
    }

    /// Returns whether `deposit_id` has been admitted.
    pub fn is_processed(&self, deposit_id: &DepositId) -> Result<bool, StoreError> {
        self.store.contains(deposit_id)
    }

    /// Runs the validation pipeline and admits the deposit on success.
    #[instrument(skip_all, fields(deposit_id = %submission.deposit_id))]
    pub async fn submit(&self, submission: &Submission) -> Result<Admission, VerifierError> {
        // 1. Structure.
        let deposit_id = &submission.deposit_id;
        if deposit_id.is_empty() {
            return Err(VerifierError::Malformed("missing deposit_id".to_string()));
        }
        let Some(proof) = &submission.proof else {
            return Err(VerifierError::Malformed("missing proof".to_string()));
        };

        // 2. Replay.
        if self.store.contains(deposit_id)? {
            return Err(VerifierError::AlreadyProcessed(deposit_id.clone()));
        }

        // 3. Proof type.
        let key = self
            .schemes
            .get(&proof.proof_type)
            .ok_or_else(|| VerifierError::UnsupportedProofType(proof.proof_type.clone()))?;

        // 4. Signature and payload binding.
        check_signature(key, proof, deposit_id)?;

        // 5. Recursive proof.
        match &proof.recursive_proof {
            Some(recursive_proof) => self.recursive.verify(recursive_proof).await?,
            None if self.require_recursive_proof => return Err(RecursiveProofError::Missing.into()),
            None => {}
        }

        // 6. Admission.
        if !self.store.insert(deposit_id)? {
            debug!("Lost admission race");
            return Err(VerifierError::AlreadyProcessed(deposit_id.clone()));
        }

        Ok(Admission {
            deposit_id: deposit_id.clone(),
            credited_to: submission.recipient_address.clone(),
        })
    }
}

fn check_signature(
    key: &VerifyingKey,
    proof: &ProofEnvelope,
    deposit_id: &DepositId,
) -> Result<(), VerifierError> {
    let invalid = |detail: String| Err(VerifierError::InvalidSignature(detail));

    if proof.payload.is_empty() {
        return invalid("empty payload".to_string());
    }
    if proof.signature.len() < key.min_signature_len() {
        return invalid(format!(
            "signature is {} bytes, {} requires at least {}",
            proof.signature.len(),
            proof.proof_type,
            key.min_signature_len()
        ));
    }
    if !key.verify(&proof.payload, &proof.signature) {
        return invalid("signature does not verify".to_string());
    }

    let witness = match Witness::decode(&proof.payload) {
        Ok(witness) => witness,
        Err(e) => return invalid(format!("payload is not a witness: {e}")),
    };
    if witness.deposit_id != *deposit_id {
        return invalid(format!(
            "payload is for deposit {}, not {deposit_id}",
            witness.deposit_id
        ));
    }

    Ok(())
}
