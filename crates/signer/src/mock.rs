//! `mock-sig`: a keyed SHA-256 digest standing in for a real signature scheme.
//!
//! Signer and verifier share the same secret, so this offers integrity between trusted
//! parties only.

use std::fmt;

use sha2::{Digest, Sha256};
use zkbridge_types::ProofType;

use crate::{SignatureVerifier, Signer, SignerError};

const DOMAIN_TAG: &[u8] = b"zkbridge/mock-sig/v1";

/// Shared secret of the `mock-sig` scheme.
#[derive(Clone)]
pub struct MockSigKey {
    secret: Vec<u8>,
}

impl MockSigKey {
    /// Creates a key from non-empty secret bytes.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, SignerError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(SignerError::EmptyKey);
        }
        Ok(Self { secret })
    }

    fn digest(&self, payload: &[u8]) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(DOMAIN_TAG);
        hasher.update((self.secret.len() as u64).to_be_bytes());
        hasher.update(&self.secret);
        hasher.update(payload);
        hasher.finalize().into()
    }
}

impl fmt::Debug for MockSigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSigKey").finish_non_exhaustive()
    }
}

impl Signer for MockSigKey {
    fn proof_type(&self) -> ProofType {
        ProofType::MockSig
    }

    fn sign(&self, payload: &[u8]) -> Vec<u8> {
        self.digest(payload).to_vec()
    }
}

impl SignatureVerifier for MockSigKey {
    fn proof_type(&self) -> ProofType {
        ProofType::MockSig
    }

    fn min_signature_len(&self) -> usize {
        32
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> bool {
        signature == self.digest(payload).as_slice()
    }
}
