//! Verifier configuration and TOML/YAML parsing.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use zkbridge_signer::VerifyingKeyConfig;

use crate::{
    recursive::RecursiveVerifier,
    store::{FileProcessedSet, MemoryProcessedSet, ProcessedSet, StoreError},
};

/// Verifier configuration loaded from a TOML/YAML file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Reject envelopes that carry no recursive proof.
    #[serde(default)]
    pub require_recursive_proof: bool,
    /// Accepted proof schemes with their verifying keys.
    #[serde(default)]
    pub schemes: Vec<VerifyingKeyConfig>,
    /// Recursive proof verifier.
    #[serde(default)]
    pub recursive: RecursiveVerifier,
    /// Processed-set store.
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_port() -> u16 {
    5001
}

impl Config {
    /// Load config from file (auto-detects format from extension).
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let string = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {path:?}"))?;

        match path.extension().and_then(|s| s.to_str()) {
            Some("toml") => Self::from_toml_str(&string),
            Some("yaml" | "yml") => Self::from_yaml_str(&string),
            Some(ext) => anyhow::bail!("Unsupported config format: .{ext}"),
            None => anyhow::bail!("Config file must have an extension (e.g., .toml)"),
        }
    }

    /// Parse config from TOML string.
    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        toml_edit::de::from_str(s)
            .with_context(|| format!("Failed to deserialize TOML config:\n{s}"))
    }

    /// Parse config from YAML string.
    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(s).with_context(|| format!("Failed to deserialize YAML config:\n{s}"))
    }
}

/// Where admitted deposit ids are kept.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In memory; admissions are forgotten on restart.
    #[default]
    Memory,
    /// Append-only log file.
    File {
        /// Log path.
        path: PathBuf,
    },
}

impl StoreConfig {
    /// Opens the configured store.
    pub fn open(&self) -> Result<Arc<dyn ProcessedSet>, StoreError> {
        Ok(match self {
            Self::Memory => Arc::new(MemoryProcessedSet::new()),
            Self::File { path } => Arc::new(FileProcessedSet::open(path)?),
        })
    }
}
