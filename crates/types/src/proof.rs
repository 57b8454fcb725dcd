use std::{convert::Infallible, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use serde_with::{DeserializeFromStr, SerializeDisplay, base64::Base64, serde_as};

/// Tag identifying the signature scheme of a [`ProofEnvelope`].
///
/// Unknown tags are preserved in [`ProofType::Other`] so a verifier can reject them as
/// unsupported instead of failing to decode the submission.
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum ProofType {
    /// Keyed-digest stand-in for a real signature scheme.
    MockSig,
    /// ECDSA over secp256k1.
    Secp256k1,
    /// Any other tag.
    Other(String),
}

impl ProofType {
    /// Returns the wire tag.
    pub fn as_str(&self) -> &str {
        match self {
            Self::MockSig => "mock-sig",
            Self::Secp256k1 => "secp256k1",
            Self::Other(tag) => tag,
        }
    }
}

impl fmt::Display for ProofType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProofType {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "mock-sig" => Self::MockSig,
            "secp256k1" => Self::Secp256k1,
            other => Self::Other(other.to_string()),
        })
    }
}

/// Second-layer proof artifact attached to an envelope.
///
/// The artifact format is opaque: besides `public_signals` it is an open JSON object. A
/// recursive verifier declares which fields it requires and checks conformance with
/// [`RecursiveProof::missing_fields`] before looking at the contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecursiveProof {
    /// Public signals of the proven statement.
    #[serde(default)]
    pub public_signals: Vec<String>,
    /// Remaining artifact fields.
    #[serde(flatten)]
    pub artifact: Map<String, Value>,
}

impl RecursiveProof {
    /// Returns the named artifact field, treating `null` as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.artifact.get(name).filter(|value| !value.is_null())
    }

    /// Returns the required fields this artifact does not expose.
    pub fn missing_fields<'a, S: AsRef<str>>(&self, required: &'a [S]) -> Vec<&'a str> {
        required
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| self.field(name).is_none())
            .collect()
    }
}

/// Signed wrapper around a canonical witness payload.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProofEnvelope {
    /// Signature scheme used for `signature`.
    pub proof_type: ProofType,
    /// Canonical witness encoding, base64 when serialized.
    #[serde_as(as = "Base64")]
    pub payload: Vec<u8>,
    /// Signature over `payload`, base64 when serialized.
    #[serde_as(as = "Base64")]
    pub signature: Vec<u8>,
    /// Identifier of the prover that assembled the envelope.
    pub prover_id: String,
    /// When the envelope was assembled.
    pub created_at: DateTime<Utc>,
    /// Optional second-layer proof.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recursive_proof: Option<RecursiveProof>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{ProofType, RecursiveProof};

    #[test]
    fn test_proof_type_tags() {
        assert_eq!(
            serde_json::to_value(ProofType::MockSig).unwrap(),
            json!("mock-sig")
        );
        assert_eq!(
            serde_json::from_value::<ProofType>(json!("secp256k1")).unwrap(),
            ProofType::Secp256k1
        );
        assert_eq!(
            serde_json::from_value::<ProofType>(json!("groth16")).unwrap(),
            ProofType::Other("groth16".to_string())
        );
    }

    #[test]
    fn test_recursive_proof_shape() {
        let proof: RecursiveProof = serde_json::from_value(json!({
            "public_signals": ["1234"],
            "proof": {"pi_a": ["1", "2"]},
            "notes": null,
        }))
        .unwrap();

        assert_eq!(proof.public_signals, vec!["1234".to_string()]);
        assert!(proof.field("proof").is_some());
        assert!(proof.field("notes").is_none());
        assert_eq!(
            proof.missing_fields(&["proof", "notes", "proof_bytes"]),
            vec!["notes", "proof_bytes"]
        );
    }
}
