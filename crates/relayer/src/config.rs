//! Relayer configuration and TOML/YAML parsing.

use std::path::Path;

use anyhow::{Context, ensure};
use serde::{Deserialize, Serialize};
use url::Url;
use zkbridge_signer::SignerConfig;

use crate::{feed::FeedConfig, prover::GeneratorConfig};

/// Relayer configuration loaded from a TOML/YAML file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the verifier service.
    pub verifier_url: Url,
    /// Interval between feed pulls.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Upper bound on concurrent submissions.
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
    /// Timeout of a single submission request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Identity stamped into every witness.
    #[serde(default = "default_relayer_id")]
    pub watcher_id: String,
    /// Identity stamped into every proof envelope.
    #[serde(default = "default_relayer_id")]
    pub prover_id: String,
    /// Signing key.
    pub signer: SignerConfig,
    /// Recursive proof generator.
    #[serde(default)]
    pub generator: GeneratorConfig,
    /// Source of deposits.
    #[serde(default)]
    pub feed: FeedConfig,
    /// Port serving `/health` and `/metrics`; disabled when absent.
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_interval_ms() -> u64 {
    5000
}

fn default_max_in_flight() -> usize {
    4
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

fn default_relayer_id() -> String {
    "relayer-1".to_string()
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
        let config: Self = toml_edit::de::from_str(s)
            .with_context(|| format!("Failed to deserialize TOML config:\n{s}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse config from YAML string.
    pub fn from_yaml_str(s: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(s)
            .with_context(|| format!("Failed to deserialize YAML config:\n{s}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the scheduler cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.interval_ms > 0, "interval_ms must be greater than 0");
        ensure!(self.max_in_flight > 0, "max_in_flight must be greater than 0");
        ensure!(
            self.request_timeout_ms > 0,
            "request_timeout_ms must be greater than 0"
        );
        Ok(())
    }
}
