//! Record signing keys
//!
//! Ed25519 has no public-key recovery, so the serialized signature carries
//! the verifying key in front of the signature bytes:
//! `hex(public_key[32] || signature[64])`. Recovering the signer means
//! checking the signature over the message and deriving the address from the
//! embedded key.

use crate::error::PublishError;
use crate::types::Hash;
use ed25519_dalek::{Signature, Signer as _, SigningKey, Verifier, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

/// Errors recovering a signer from a serialized signature
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecoveryError {
    #[error("signature is not valid hex")]
    Encoding,

    #[error("signature must be 96 bytes, got {0}")]
    Length(usize),

    #[error("embedded public key is invalid")]
    PublicKey,

    #[error("signature does not match message")]
    Mismatch,
}

/// Capability to sign record digests
pub trait Signer: Send + Sync {
    /// Sign a digest, returning the serialized signature.
    ///
    /// Fails with `PublishError::Signing` when the key refuses or cannot sign.
    fn sign(&self, digest: &Hash) -> Result<String, PublishError>;

    /// Address identifying this signer.
    fn address(&self) -> String;
}

/// Address of an Ed25519 public key: `0x` + first 20 bytes of BLAKE3(key).
pub fn address_of(key: &VerifyingKey) -> String {
    let hash = blake3::hash(key.as_bytes());
    format!("0x{}", hex::encode(&hash.as_bytes()[..20]))
}

/// Ed25519 signing key
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            key: SigningKey::from_bytes(seed),
        }
    }

    /// Parse a 64-character hex seed.
    pub fn from_seed_hex(seed_hex: &str) -> Result<Self, PublishError> {
        let mut seed = [0u8; 32];
        let seed_hex = seed_hex.trim();
        let seed_hex = seed_hex.strip_prefix("0x").unwrap_or(seed_hex);
        hex::decode_to_slice(seed_hex, &mut seed)
            .map_err(|e| PublishError::Config(format!("Invalid signing key: {}", e)))?;
        Ok(Self::from_seed(&seed))
    }

    pub fn generate() -> Self {
        Self {
            key: SigningKey::generate(&mut OsRng),
        }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }
}

impl Signer for Ed25519Signer {
    fn sign(&self, digest: &Hash) -> Result<String, PublishError> {
        let signature = self
            .key
            .try_sign(digest)
            .map_err(|e| PublishError::Signing(e.to_string()))?;
        let mut out = Vec::with_capacity(96);
        out.extend_from_slice(self.key.verifying_key().as_bytes());
        out.extend_from_slice(&signature.to_bytes());
        Ok(hex::encode(out))
    }

    fn address(&self) -> String {
        address_of(&self.key.verifying_key())
    }
}

/// Recover the signer address from a message and its serialized signature.
pub fn recover_signer(message: &[u8], signature_hex: &str) -> Result<String, RecoveryError> {
    let bytes = hex::decode(signature_hex).map_err(|_| RecoveryError::Encoding)?;
    if bytes.len() != 96 {
        return Err(RecoveryError::Length(bytes.len()));
    }
    let (key_bytes, sig_bytes) = bytes.split_at(32);

    let mut key = [0u8; 32];
    key.copy_from_slice(key_bytes);
    let verifying_key = VerifyingKey::from_bytes(&key).map_err(|_| RecoveryError::PublicKey)?;

    let mut sig = [0u8; 64];
    sig.copy_from_slice(sig_bytes);
    let signature = Signature::from_bytes(&sig);

    verifying_key
        .verify(message, &signature)
        .map_err(|_| RecoveryError::Mismatch)?;
    Ok(address_of(&verifying_key))
}
