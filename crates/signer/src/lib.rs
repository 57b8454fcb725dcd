//! Signing capability for zkbridge proof envelopes.
//!
//! Every [`ProofType`] tag maps to one signature scheme. The relayer signs canonical witness
//! payloads with a [`SigningKey`]; the verifier checks them with the matching [`VerifyingKey`].
//!
//! The contract shared by all schemes: for the same key pair, `verify(payload, sign(payload))`
//! always holds, and changing any byte of the payload or signature makes it fail.
//!
//! ## Schemes
//!
//! - `mock-sig` - Keyed SHA-256 digest, a stand-in for demos and tests
//! - `secp256k1` - ECDSA over secp256k1 (SHA-256 prehash)

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

use serde::{Deserialize, Serialize};
use thiserror::Error;
use zkbridge_types::ProofType;

pub use crate::{
    mock::MockSigKey,
    secp256k1::{Secp256k1SigningKey, Secp256k1VerifyingKey},
};

mod mock;
mod secp256k1;

/// Errors from loading key material.
#[derive(Debug, Error)]
pub enum SignerError {
    /// Key material is empty.
    #[error("empty key material")]
    EmptyKey,
    /// Key material is not valid hex.
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Bytes do not form a valid secret key.
    #[error("invalid secret key")]
    InvalidSecretKey,
    /// Bytes do not form a valid public key.
    #[error("invalid public key")]
    InvalidPublicKey,
}

/// Produces signatures over payloads.
pub trait Signer {
    /// Tag placed in the envelope's `proof_type`.
    fn proof_type(&self) -> ProofType;

    /// Signs `payload`.
    fn sign(&self, payload: &[u8]) -> Vec<u8>;
}

/// Checks signatures produced by the matching [`Signer`].
pub trait SignatureVerifier {
    /// Tag this verifier accepts.
    fn proof_type(&self) -> ProofType;

    /// Signatures shorter than this are rejected without running verification.
    fn min_signature_len(&self) -> usize;

    /// Returns `true` if `signature` is valid for `payload`.
    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool;
}

/// Signing key of any supported scheme.
#[derive(Clone, Debug)]
pub enum SigningKey {
    /// `mock-sig` keyed digest.
    MockSig(MockSigKey),
    /// `secp256k1` ECDSA.
    Secp256k1(Secp256k1SigningKey),
}

impl SigningKey {
    /// Loads a signing key from configuration.
    pub fn from_config(config: &SignerConfig) -> Result<Self, SignerError> {
        Ok(match config {
            SignerConfig::MockSig { key } => Self::MockSig(MockSigKey::new(key.as_bytes())?),
            SignerConfig::Secp256k1 { secret_key } => {
                Self::Secp256k1(Secp256k1SigningKey::from_hex(secret_key)?)
            }
        })
    }

    /// Returns the verifying counterpart of this key.
    pub fn verifying_key(&self) -> VerifyingKey {
        match self {
            Self::MockSig(key) => VerifyingKey::MockSig(key.clone()),
            Self::Secp256k1(key) => VerifyingKey::Secp256k1(key.verifying_key()),
        }
    }
}

impl Signer for SigningKey {
    fn proof_type(&self) -> ProofType {
        match self {
            Self::MockSig(key) => Signer::proof_type(key),
            Self::Secp256k1(key) => key.proof_type(),
        }
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        match self {
            Self::MockSig(key) => key.sign(payload),
            Self::Secp256k1(key) => key.sign(payload),
        }
    }
}

/// Verifying key of any supported scheme.
#[derive(Clone, Debug)]
pub enum VerifyingKey {
    /// `mock-sig` keyed digest (symmetric).
    MockSig(MockSigKey),
    /// `secp256k1` ECDSA public key.
    Secp256k1(Secp256k1VerifyingKey),
}

impl VerifyingKey {
    /// Loads a verifying key from configuration.
    pub fn from_config(config: &VerifyingKeyConfig) -> Result<Self, SignerError> {
        Ok(match config {
            VerifyingKeyConfig::MockSig { key } => Self::MockSig(MockSigKey::new(key.as_bytes())?),
            VerifyingKeyConfig::Secp256k1 { public_key } => {
                Self::Secp256k1(Secp256k1VerifyingKey::from_hex(public_key)?)
            }
        })
    }
}

impl SignatureVerifier for VerifyingKey {
    fn proof_type(&self) -> ProofType {
        match self {
            Self::MockSig(key) => SignatureVerifier::proof_type(key),
            Self::Secp256k1(key) => key.proof_type(),
        }
    }

    fn min_signature_len(&self) -> usize {
        match self {
            Self::MockSig(key) => key.min_signature_len(),
            Self::Secp256k1(key) => key.min_signature_len(),
        }
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        match self {
            Self::MockSig(key) => key.verify(payload, signature),
            Self::Secp256k1(key) => key.verify(payload, signature),
        }
    }
}

/// Signing key configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum SignerConfig {
    /// Shared secret for `mock-sig`.
    MockSig {
        /// Secret key string.
        key: String,
    },
    /// Hex encoded secp256k1 secret scalar.
    Secp256k1 {
        /// 32-byte secret key as hex.
        secret_key: String,
    },
}

/// Verifying key configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum VerifyingKeyConfig {
    /// Shared secret for `mock-sig`.
    MockSig {
        /// Secret key string.
        key: String,
    },
    /// Hex encoded SEC1 secp256k1 public key.
    Secp256k1 {
        /// Compressed or uncompressed SEC1 public key as hex.
        public_key: String,
    },
}

impl VerifyingKeyConfig {
    /// Tag of the scheme this key verifies.
    pub fn proof_type(&self) -> ProofType {
        match self {
            Self::MockSig { .. } => ProofType::MockSig,
            Self::Secp256k1 { .. } => ProofType::Secp256k1,
        }
    }
}
