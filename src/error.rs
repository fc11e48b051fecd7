//! Error types for the provenance publishing engine.

use crate::types::Hash;
use std::fmt;
use thiserror::Error;

/// Input errors: rejected before any network call and never retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContentError {
    #[error("Content body is empty")]
    EmptyBody,

    #[error("Content locator is empty")]
    EmptyLocator,

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Record is marked encrypted but carries no access ciphertext")]
    EncryptedWithoutCiphertext,

    #[error("Unsupported content locator: {0}")]
    UnsupportedLocator(String),
}

/// Storage-related errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Hash mismatch: expected {}, got {}", hex::encode(.expected), hex::encode(.actual))]
    HashMismatch { expected: Hash, actual: Hash },

    #[error("Invalid storage location: {0}")]
    InvalidLocation(String),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Storage I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl StorageError {
    pub(crate) fn backend(context: &str, err: impl fmt::Display) -> Self {
        StorageError::IoError(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("{}: {}", context, err),
        ))
    }
}

/// Classification of a failed collaborator call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollaboratorErrorKind {
    EmptyReturn,
    Revert,
    Panic,
    UserRejected,
    CustomContract,
    Unknown,
}

impl fmt::Display for CollaboratorErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CollaboratorErrorKind::EmptyReturn => "empty-return",
            CollaboratorErrorKind::Revert => "revert",
            CollaboratorErrorKind::Panic => "panic",
            CollaboratorErrorKind::UserRejected => "user-rejected",
            CollaboratorErrorKind::CustomContract => "custom-contract-error",
            CollaboratorErrorKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// `Error(string)` selector
const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];
/// `Panic(uint256)` selector
const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Decoded failure of a ledger, storage, or encryption call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct CollaboratorError {
    pub kind: CollaboratorErrorKind,
    pub message: String,
    pub raw_data: Vec<u8>,
}

impl CollaboratorError {
    pub fn new(kind: CollaboratorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            raw_data: Vec::new(),
        }
    }

    /// A revert carrying an ABI-encoded `Error(string)` payload.
    pub fn revert(reason: &str) -> Self {
        Self {
            kind: CollaboratorErrorKind::Revert,
            message: reason.to_string(),
            raw_data: encode_error_string(reason),
        }
    }

    /// Decode raw revert data returned by a ledger call.
    pub fn decode(raw: &[u8]) -> Self {
        let raw_data = raw.to_vec();

        if raw.is_empty() {
            return Self {
                kind: CollaboratorErrorKind::EmptyReturn,
                message: "call returned no data".to_string(),
                raw_data,
            };
        }

        if raw.len() < 4 {
            return Self {
                kind: CollaboratorErrorKind::Unknown,
                message: format!("unrecognized return data 0x{}", hex::encode(raw)),
                raw_data,
            };
        }

        let (selector, payload) = raw.split_at(4);

        if selector == ERROR_SELECTOR {
            return match decode_abi_string(payload) {
                Some(reason) => Self {
                    kind: CollaboratorErrorKind::Revert,
                    message: reason,
                    raw_data,
                },
                None => Self {
                    kind: CollaboratorErrorKind::Unknown,
                    message: "malformed Error(string) payload".to_string(),
                    raw_data,
                },
            };
        }

        if selector == PANIC_SELECTOR {
            if let Some(code) = read_word_as_u64(payload, 0) {
                return Self {
                    kind: CollaboratorErrorKind::Panic,
                    message: format!("panic 0x{:02x}: {}", code, panic_description(code)),
                    raw_data,
                };
            }
        }

        Self {
            kind: CollaboratorErrorKind::CustomContract,
            message: format!("custom error 0x{}", hex::encode(selector)),
            raw_data,
        }
    }

    /// Classify an error reported as free text (wallet / RPC layer).
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_lowercase();
        let kind = if lower.contains("user rejected")
            || lower.contains("user denied")
            || lower.contains("4001")
        {
            CollaboratorErrorKind::UserRejected
        } else {
            CollaboratorErrorKind::Unknown
        };
        Self::new(kind, message)
    }
}

/// ABI-encode `Error(string)` revert data.
pub fn encode_error_string(reason: &str) -> Vec<u8> {
    let bytes = reason.as_bytes();
    let padded = (bytes.len() + 31) / 32 * 32;
    let mut out = Vec::with_capacity(4 + 64 + padded);
    out.extend_from_slice(&ERROR_SELECTOR);
    out.extend_from_slice(&word(32));
    out.extend_from_slice(&word(bytes.len() as u64));
    out.extend_from_slice(bytes);
    out.resize(4 + 64 + padded, 0);
    out
}

fn word(value: u64) -> [u8; 32] {
    let mut w = [0u8; 32];
    w[24..].copy_from_slice(&value.to_be_bytes());
    w
}

/// Read the 32-byte word at `offset`; `None` if truncated or wider than u64.
fn read_word_as_u64(data: &[u8], offset: usize) -> Option<u64> {
    let w = data.get(offset..offset.checked_add(32)?)?;
    if w[..24].iter().any(|b| *b != 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&w[24..]);
    Some(u64::from_be_bytes(buf))
}

fn decode_abi_string(payload: &[u8]) -> Option<String> {
    let offset = usize::try_from(read_word_as_u64(payload, 0)?).ok()?;
    let len = usize::try_from(read_word_as_u64(payload, offset)?).ok()?;
    let start = offset.checked_add(32)?;
    let bytes = payload.get(start..start.checked_add(len)?)?;
    Some(String::from_utf8_lossy(bytes).into_owned())
}

fn panic_description(code: u64) -> &'static str {
    match code {
        0x00 => "generic compiler panic",
        0x01 => "assertion failed",
        0x11 => "arithmetic overflow or underflow",
        0x12 => "division or modulo by zero",
        0x21 => "invalid enum conversion",
        0x22 => "incorrectly encoded storage byte array",
        0x31 => "pop on empty array",
        0x32 => "array index out of bounds",
        0x41 => "out of memory",
        0x51 => "call to zero-initialized function",
        _ => "unknown panic code",
    }
}

/// Per-item failure surfaced by the publish orchestrator.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Invalid content: {0}")]
    Content(#[from] ContentError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Collaborator error: {0}")]
    Collaborator(#[from] CollaboratorError),

    #[error("Content fetch failed: {0}")]
    Fetch(String),

    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Network price {current} exceeds configured ceiling {ceiling}")]
    PriceCeiling { current: u64, ceiling: u64 },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for PublishError {
    fn from(err: config::ConfigError) -> Self {
        PublishError::Config(err.to_string())
    }
}
