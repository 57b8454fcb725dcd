use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{DepositId, ProofEnvelope};

/// Request to admit a deposit on the destination chain.
///
/// `deposit_id` and `proof` default to empty when absent from the wire so that the verifier,
/// not the decoder, reports a structurally incomplete submission as malformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Submission {
    /// Identifier of the deposit being admitted.
    #[serde(default)]
    pub deposit_id: DepositId,
    /// Signed proof of the deposit.
    #[serde(default)]
    pub proof: Option<ProofEnvelope>,
    /// Destination-chain address to credit.
    #[serde(default)]
    pub recipient_address: String,
    /// Free-form service metadata (e.g. the observing watcher).
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

/// Successful admission of a deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Admission {
    /// Identifier of the admitted deposit.
    pub deposit_id: DepositId,
    /// Destination-chain address credited.
    pub credited_to: String,
}

/// Reason a submission was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    /// Missing deposit id or proof, or an undecodable body.
    Malformed,
    /// The proof type is not accepted by the verifier.
    UnsupportedProofType,
    /// The payload or signature does not verify.
    InvalidSignature,
    /// The recursive proof is missing where required, malformed or rejected.
    InvalidRecursiveProof,
}

impl RejectionReason {
    /// Returns the wire tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Malformed => "malformed",
            Self::UnsupportedProofType => "unsupported_proof_type",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidRecursiveProof => "invalid_recursive_proof",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response from the verifier's `/submit` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitResponse {
    /// The deposit was admitted by this submission.
    Admitted(Admission),
    /// The deposit had already been admitted; nothing was credited.
    AlreadyProcessed {
        /// Identifier of the deposit.
        deposit_id: DepositId,
    },
    /// The submission failed validation.
    Rejected {
        /// Identifier of the deposit, if the submission carried one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        deposit_id: Option<DepositId>,
        /// Rejection category.
        reason: RejectionReason,
        /// Human-readable detail.
        detail: String,
    },
}

/// Response from the verifier's `/deposits/{deposit_id}` endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositStatusResponse {
    /// Identifier of the deposit.
    pub deposit_id: DepositId,
    /// Whether the deposit has been admitted.
    pub processed: bool,
}
