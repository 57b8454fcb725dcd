//! `secp256k1`: ECDSA signatures, SHA-256 prehashed, in 64-byte `r || s` form.

use k256::ecdsa::{
    self, Signature,
    signature::{Signer as _, Verifier as _},
};
use zkbridge_types::ProofType;

use crate::{SignatureVerifier, Signer, SignerError};

/// Secret key of the `secp256k1` scheme.
#[derive(Clone, Debug)]
pub struct Secp256k1SigningKey(ecdsa::SigningKey);

impl Secp256k1SigningKey {
    /// Parses a 32-byte secret scalar from hex (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, SignerError> {
        Self::from_bytes(&decode_hex(s)?)
    }

    /// Creates a key from a 32-byte secret scalar.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SignerError> {
        ecdsa::SigningKey::from_slice(bytes)
            .map(Self)
            .map_err(|_| SignerError::InvalidSecretKey)
    }

    /// Returns the matching public key.
    pub fn verifying_key(&self) -> Secp256k1VerifyingKey {
        Secp256k1VerifyingKey(ecdsa::VerifyingKey::from(&self.0))
    }
}

impl Signer for Secp256k1SigningKey {
    fn proof_type(&self) -> ProofType {
        ProofType::Secp256k1
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        let signature: Signature = self.0.sign(payload);
        signature.to_bytes().to_vec()
    }
}

/// Public key of the `secp256k1` scheme.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Secp256k1VerifyingKey(ecdsa::VerifyingKey);

impl Secp256k1VerifyingKey {
    /// Parses a SEC1 encoded public key from hex (optional `0x` prefix).
    pub fn from_hex(s: &str) -> Result<Self, SignerError> {
        ecdsa::VerifyingKey::from_sec1_bytes(&decode_hex(s)?)
            .map(Self)
            .map_err(|_| SignerError::InvalidPublicKey)
    }

    /// Returns the compressed SEC1 encoding as hex.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_sec1_bytes())
    }
}

impl SignatureVerifier for Secp256k1VerifyingKey {
    fn proof_type(&self) -> ProofType {
        ProofType::Secp256k1
    }

    fn min_signature_len(&self) -> usize {
        64
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        Signature::from_slice(signature)
            .and_then(|signature| self.0.verify(payload, &signature))
            .is_ok()
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>, SignerError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(SignerError::EmptyKey);
    }
    Ok(hex::decode(s.strip_prefix("0x").unwrap_or(s))?)
}
