//! Verifiers for the optional second-layer proof attached to an envelope.
//!
//! Each verifier declares the artifact fields it requires. Shape conformance is checked
//! structurally before the verifier looks at the contents.

use std::{io, path::PathBuf, process::Stdio, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};
use zkbridge_types::RecursiveProof;

/// Reasons a recursive proof is not accepted.
#[derive(Debug, Error)]
pub enum RecursiveProofError {
    /// Policy requires a recursive proof and none was attached.
    #[error("recursive proof required but missing")]
    Missing,
    /// The artifact lacks fields the verifier requires.
    #[error("recursive proof missing fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),
    /// The verifier looked at the artifact and refused it.
    #[error("recursive proof rejected: {0}")]
    Rejected(String),
    /// Staging or running the external verifier failed.
    #[error("recursive proof verifier I/O error: {0}")]
    Io(#[from] io::Error),
    /// The external verifier did not finish in time.
    #[error("recursive proof verifier timed out after {0:?}")]
    Timeout(Duration),
}

/// Recursive proof verification capability.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RecursiveVerifier {
    /// Structural check only.
    Shape(ShapeVerifier),
    /// Groth16 verification through the `snarkjs` CLI.
    Snarkjs(SnarkjsVerifier),
}

impl Default for RecursiveVerifier {
    fn default() -> Self {
        Self::Shape(ShapeVerifier::default())
    }
}

impl RecursiveVerifier {
    /// Artifact fields this verifier requires.
    pub fn required_fields(&self) -> Vec<&str> {
        match self {
            Self::Shape(shape) => shape.required_fields.iter().map(String::as_str).collect(),
            Self::Snarkjs(_) => vec!["proof"],
        }
    }

    /// Accepts or rejects `proof`.
    pub async fn verify(&self, proof: &RecursiveProof) -> Result<(), RecursiveProofError> {
        let required = self.required_fields();
        let missing = proof.missing_fields(&required);
        if !missing.is_empty() {
            return Err(RecursiveProofError::MissingFields(
                missing.into_iter().map(str::to_string).collect(),
            ));
        }

        match self {
            Self::Shape(shape) => shape.verify(proof),
            Self::Snarkjs(snarkjs) => snarkjs.verify(proof).await,
        }
    }
}

/// Accepts any artifact exposing the required fields and at least one public signal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapeVerifier {
    /// Fields that must be present and non-null.
    #[serde(default = "default_required_fields")]
    pub required_fields: Vec<String>,
}

fn default_required_fields() -> Vec<String> {
    vec!["proof".to_string(), "notes".to_string()]
}

impl Default for ShapeVerifier {
    fn default() -> Self {
        Self {
            required_fields: default_required_fields(),
        }
    }
}

impl ShapeVerifier {
    fn verify(&self, proof: &RecursiveProof) -> Result<(), RecursiveProofError> {
        if proof.public_signals.is_empty() {
            return Err(RecursiveProofError::Rejected(
                "no public signals".to_string(),
            ));
        }
        Ok(())
    }
}

/// Runs `snarkjs groth16 verify <verification_key> <public.json> <proof.json>`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnarkjsVerifier {
    /// Path to the Groth16 verification key.
    pub verification_key: PathBuf,
    /// `snarkjs` executable.
    #[serde(default = "default_snarkjs_bin")]
    pub bin: PathBuf,
    /// Upper bound on a single verification.
    #[serde(default = "default_snarkjs_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_snarkjs_bin() -> PathBuf {
    PathBuf::from("snarkjs")
}

fn default_snarkjs_timeout_ms() -> u64 {
    30_000
}

impl SnarkjsVerifier {
    async fn verify(&self, proof: &RecursiveProof) -> Result<(), RecursiveProofError> {
        let Some(artifact) = proof.field("proof") else {
            return Err(RecursiveProofError::MissingFields(vec!["proof".to_string()]));
        };

        let dir = tempfile::tempdir()?;
        let proof_path = dir.path().join("proof.json");
        let public_path = dir.path().join("public.json");
        tokio::fs::write(&proof_path, serde_json::to_vec(artifact).map_err(io::Error::other)?)
            .await?;
        tokio::fs::write(
            &public_path,
            serde_json::to_vec(&proof.public_signals).map_err(io::Error::other)?,
        )
        .await?;

        let timeout = Duration::from_millis(self.timeout_ms);
        let output = Command::new(&self.bin)
            .args(["groth16", "verify"])
            .arg(&self.verification_key)
            .arg(&public_path)
            .arg(&proof_path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(timeout, output)
            .await
            .map_err(|_| RecursiveProofError::Timeout(timeout))??;

        if output.status.success() {
            debug!(bin = %self.bin.display(), "snarkjs accepted recursive proof");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let detail = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .unwrap_or("no output")
            .lines()
            .last()
            .unwrap_or_default()
            .to_string();
        warn!(status = %output.status, %detail, "snarkjs rejected recursive proof");
        Err(RecursiveProofError::Rejected(format!(
            "snarkjs exited with {}: {detail}",
            output.status
        )))
    }
}
