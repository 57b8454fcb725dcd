//! Proof generators producing the optional recursive proof for an envelope.
//!
//! Generation is best effort: a generator that fails logs a warning and yields no artifact,
//! and the envelope is submitted without a recursive proof.

use std::{io, path::PathBuf, process::Stdio, time::Duration};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::{process::Command, sync::Mutex};
use tracing::{debug, warn};
use zkbridge_types::{DepositId, RecursiveProof};

/// Input handed to a proof generator, derived from the canonical witness.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorInput {
    /// Deposit the proof is for.
    pub deposit_id: DepositId,
    /// Hex SHA-256 digest of the canonical witness payload.
    pub public_input: String,
}

impl GeneratorInput {
    /// Derives the input from a canonical witness payload.
    pub fn from_payload(deposit_id: DepositId, payload: &[u8]) -> Self {
        Self {
            deposit_id,
            public_input: hex::encode(Sha256::digest(payload)),
        }
    }
}

/// Proof generator configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorConfig {
    /// Never attach a recursive proof.
    #[default]
    Disabled,
    /// Attach a deterministic placeholder artifact.
    Mock,
    /// Run an external proving script.
    Command {
        /// Script to run, e.g. a circom + snarkjs pipeline.
        script: PathBuf,
        /// Directory the script runs in. `input.json` is staged here and the script is
        /// expected to leave `proof/proof.json` and `proof/public.json` behind.
        work_dir: PathBuf,
        /// Upper bound on a single run.
        #[serde(default = "default_command_timeout_ms")]
        timeout_ms: u64,
    },
}

fn default_command_timeout_ms() -> u64 {
    120_000
}

#[derive(Debug, Error)]
enum GeneratorError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid output: {0}")]
    Json(#[from] serde_json::Error),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("script exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },
}

/// Proof generation capability.
#[derive(Debug)]
pub enum ProofGenerator {
    /// Never produces an artifact.
    Disabled,
    /// Produces `{proof, notes, public_signals}` derived from the input digest.
    Mock,
    /// Runs an external script.
    Command(CommandGenerator),
}

impl ProofGenerator {
    /// Builds a generator from configuration.
    pub fn from_config(config: &GeneratorConfig) -> Self {
        match config {
            GeneratorConfig::Disabled => Self::Disabled,
            GeneratorConfig::Mock => Self::Mock,
            GeneratorConfig::Command {
                script,
                work_dir,
                timeout_ms,
            } => Self::Command(CommandGenerator::new(
                script.clone(),
                work_dir.clone(),
                Duration::from_millis(*timeout_ms),
            )),
        }
    }

    /// Generates a recursive proof for `input`, or `None` if none could be produced.
    pub async fn generate(&self, input: &GeneratorInput) -> Option<RecursiveProof> {
        match self {
            Self::Disabled => None,
            Self::Mock => Some(mock_proof(input)),
            Self::Command(command) => match command.run(input).await {
                Ok(proof) => Some(proof),
                Err(e) => {
                    warn!(
                        deposit_id = %input.deposit_id,
                        script = %command.script.display(),
                        error = %e,
                        "Proof generation failed, submitting without recursive proof"
                    );
                    None
                }
            },
        }
    }
}

fn mock_proof(input: &GeneratorInput) -> RecursiveProof {
    let mut artifact = Map::new();
    artifact.insert(
        "proof".to_string(),
        json!({ "protocol": "mock", "digest": input.public_input }),
    );
    artifact.insert("notes".to_string(), json!("mock recursive proof"));
    RecursiveProof {
        public_signals: vec![input.public_input.clone()],
        artifact,
    }
}

/// Runs a proving script against a staged `input.json`.
///
/// The script's work directory is shared state, so runs are serialized.
#[derive(Debug)]
pub struct CommandGenerator {
    script: PathBuf,
    work_dir: PathBuf,
    timeout: Duration,
    lock: Mutex<()>,
}

impl CommandGenerator {
    /// Creates a generator running `script` inside `work_dir`.
    pub fn new(script: PathBuf, work_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            script,
            work_dir,
            timeout,
            lock: Mutex::new(()),
        }
    }

    async fn run(&self, input: &GeneratorInput) -> Result<RecursiveProof, GeneratorError> {
        let _guard = self.lock.lock().await;

        let proof_dir = self.work_dir.join("proof");
        let proof_path = proof_dir.join("proof.json");
        let public_path = proof_dir.join("public.json");
        tokio::fs::create_dir_all(&proof_dir).await?;
        for stale in [&proof_path, &public_path] {
            match tokio::fs::remove_file(stale).await {
                Err(e) if e.kind() != io::ErrorKind::NotFound => return Err(e.into()),
                _ => {}
            }
        }
        tokio::fs::write(
            self.work_dir.join("input.json"),
            serde_json::to_vec_pretty(input)?,
        )
        .await?;

        debug!(
            deposit_id = %input.deposit_id,
            script = %self.script.display(),
            "Running proof generator"
        );
        let output = Command::new(&self.script)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(self.timeout, output)
            .await
            .map_err(|_| GeneratorError::Timeout(self.timeout))??;
        if !output.status.success() {
            return Err(GeneratorError::Failed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let proof: Value = serde_json::from_slice(&tokio::fs::read(&proof_path).await?)?;
        let public_signals: Vec<Value> = match tokio::fs::read(&public_path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        let mut artifact = Map::new();
        artifact.insert("proof".to_string(), proof);
        artifact.insert(
            "notes".to_string(),
            json!(format!("generated by {}", self.script.display())),
        );
        Ok(RecursiveProof {
            // snarkjs writes public signals as decimal strings; accept bare numbers too.
            public_signals: public_signals
                .into_iter()
                .map(|signal| match signal {
                    Value::String(s) => s,
                    other => other.to_string(),
                })
                .collect(),
            artifact,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::{os::unix::fs::PermissionsExt, path::Path, time::Duration};

    use zkbridge_types::DepositId;

    use crate::prover::{CommandGenerator, GeneratorConfig, GeneratorInput, ProofGenerator};

    fn input() -> GeneratorInput {
        GeneratorInput::from_payload(DepositId::from("d1"), b"payload")
    }

    fn script(dir: &Path, body: &str) -> std::path::PathBuf {
        let path = dir.join("generate_proof.sh");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[test]
    fn test_input_digest() {
        assert_eq!(
            input().public_input,
            "239f59ed55e737c77147cf55ad0c1b030b6d7ee748a7426952f9b852d5a935e5"
        );
    }

    #[tokio::test]
    async fn test_disabled_and_mock() {
        assert!(ProofGenerator::Disabled.generate(&input()).await.is_none());

        let proof = ProofGenerator::Mock.generate(&input()).await.unwrap();
        assert_eq!(proof.public_signals, vec![input().public_input]);
        assert!(proof.missing_fields(&["proof", "notes"]).is_empty());
    }

    #[tokio::test]
    async fn test_command_reads_staged_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let work_dir = dir.path().join("circom");
        let script = script(
            dir.path(),
            "test -f input.json || exit 3\n\
             grep -q '\"deposit_id\": \"d1\"' input.json || exit 4\n\
             echo '{\"pi_a\": [\"1\", \"2\"], \"protocol\": \"groth16\"}' > proof/proof.json\n\
             echo '[\"1234\", 5]' > proof/public.json",
        );
        let generator = ProofGenerator::from_config(&GeneratorConfig::Command {
            script,
            work_dir: work_dir.clone(),
            timeout_ms: 10_000,
        });

        let proof = generator.generate(&input()).await.unwrap();
        assert_eq!(proof.public_signals, vec!["1234".to_string(), "5".to_string()]);
        assert_eq!(proof.field("proof").unwrap()["protocol"], "groth16");
        assert!(proof.field("notes").is_some());
        assert!(work_dir.join("input.json").exists());
    }

    #[tokio::test]
    async fn test_command_failures_yield_none() {
        let dir = tempfile::tempdir().unwrap();

        let failing = ProofGenerator::Command(CommandGenerator::new(
            script(dir.path(), "echo boom >&2; exit 1"),
            dir.path().join("work"),
            Duration::from_secs(10),
        ));
        assert!(failing.generate(&input()).await.is_none());

        let silent = ProofGenerator::Command(CommandGenerator::new(
            script(dir.path(), "exit 0"),
            dir.path().join("work"),
            Duration::from_secs(10),
        ));
        assert!(silent.generate(&input()).await.is_none());

        let slow = ProofGenerator::Command(CommandGenerator::new(
            script(dir.path(), "sleep 5"),
            dir.path().join("work"),
            Duration::from_millis(100),
        ));
        assert!(slow.generate(&input()).await.is_none());
    }
}
