use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;
use tracing::debug;
use zkbridge_signer::{Signer, SigningKey};
use zkbridge_types::{CodecError, ProofEnvelope, Submission, Witness};

use crate::prover::{GeneratorInput, ProofGenerator};

/// Metadata key naming the watcher that observed the deposit.
pub const WATCHER_METADATA_KEY: &str = "watcher";

/// Failure to package a witness.
#[derive(Debug, Error)]
pub enum AssembleError {
    /// The witness could not be encoded.
    #[error("failed to encode witness: {0}")]
    Codec(#[from] CodecError),
}

/// Wraps witnesses in signed proof envelopes addressed to a recipient.
#[derive(Debug)]
pub struct ProofAssembler {
    signer: SigningKey,
    prover_id: String,
    generator: ProofGenerator,
}

impl ProofAssembler {
    /// Creates an assembler signing with `signer` that attaches no recursive proofs.
    pub fn new(signer: SigningKey, prover_id: impl Into<String>) -> Self {
        Self {
            signer,
            prover_id: prover_id.into(),
            generator: ProofGenerator::Disabled,
        }
    }

    /// Sets the recursive proof generator.
    pub fn with_generator(mut self, generator: ProofGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Encodes and signs `witness`, optionally attaching a recursive proof, and addresses the
    /// result to `recipient_address`.
    ///
    /// A generator that produces nothing leaves a valid envelope without a recursive proof.
    pub async fn assemble(
        &self,
        witness: &Witness,
        recipient_address: &str,
    ) -> Result<Submission, AssembleError> {
        let payload = witness.encode()?;
        let signature = self.signer.sign(&payload);

        let input = GeneratorInput::from_payload(witness.deposit_id.clone(), &payload);
        let recursive_proof = self.generator.generate(&input).await;
        debug!(
            deposit_id = %witness.deposit_id,
            recursive_proof = recursive_proof.is_some(),
            "Assembled proof envelope"
        );

        Ok(Submission {
            deposit_id: witness.deposit_id.clone(),
            proof: Some(ProofEnvelope {
                proof_type: self.signer.proof_type(),
                payload,
                signature,
                prover_id: self.prover_id.clone(),
                created_at: Utc::now(),
                recursive_proof,
            }),
            recipient_address: recipient_address.to_string(),
            metadata: BTreeMap::from([(
                WATCHER_METADATA_KEY.to_string(),
                witness.watcher_id.clone(),
            )]),
        })
    }
}
