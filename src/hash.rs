// src/hash.rs

//! Content hashing for RECORD manifests
//!
//! Wheel RECORD rows carry digests as `<algorithm>=<urlsafe-base64-nopad>`,
//! e.g. `sha256=47DEQpj8HBSa-_TImW-5JCeuQeRkm5NMpJWZG3hSuFU`. This module
//! computes and parses that representation.
//!
//! | Algorithm | Used for |
//! |-----------|----------|
//! | SHA-256   | Every row we generate (launcher scripts and executables) |
//! | SHA-384/512 | Accepted when parsing rows copied from a wheel |

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256, Sha384, Sha512};
use std::fmt;
use std::str::FromStr;

/// Hash algorithm selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum HashAlgorithm {
    /// SHA-256, the algorithm written for synthesized rows
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Get the digest length in bytes
    #[inline]
    pub const fn output_len(&self) -> usize {
        match self {
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Get the algorithm tag as written in RECORD
    #[inline]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for HashAlgorithm {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sha256" | "sha-256" => Ok(Self::Sha256),
            "sha384" | "sha-384" => Ok(Self::Sha384),
            "sha512" | "sha-512" => Ok(Self::Sha512),
            _ => Err(HashError::UnknownAlgorithm(s.to_string())),
        }
    }
}

/// Hash parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    /// Unknown hash algorithm name
    UnknownAlgorithm(String),
    /// Digest has wrong length for algorithm
    InvalidLength { expected: usize, got: usize },
    /// Digest is not valid URL-safe base64
    InvalidEncoding(String),
    /// Missing `=` between algorithm and digest
    MissingSeparator(String),
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAlgorithm(name) => write!(f, "unknown hash algorithm: {}", name),
            Self::InvalidLength { expected, got } => {
                write!(f, "invalid digest length: expected {} bytes, got {}", expected, got)
            }
            Self::InvalidEncoding(s) => write!(f, "invalid base64 in digest: {}", s),
            Self::MissingSeparator(s) => write!(f, "expected <algorithm>=<digest>, got: {}", s),
        }
    }
}

impl std::error::Error for HashError {}

/// A digest with its algorithm
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordHash {
    /// The algorithm used
    pub algorithm: HashAlgorithm,
    /// Raw digest bytes
    pub digest: Vec<u8>,
}

impl RecordHash {
    /// Parse a RECORD hash field (`sha256=...`)
    pub fn parse(s: &str) -> Result<Self, HashError> {
        let (algo, encoded) = s
            .split_once('=')
            .ok_or_else(|| HashError::MissingSeparator(s.to_string()))?;
        let algorithm: HashAlgorithm = algo.parse()?;

        // Some writers keep the padding; tolerate it
        let digest = URL_SAFE_NO_PAD
            .decode(encoded.trim_end_matches('='))
            .map_err(|_| HashError::InvalidEncoding(encoded.to_string()))?;

        if digest.len() != algorithm.output_len() {
            return Err(HashError::InvalidLength {
                expected: algorithm.output_len(),
                got: digest.len(),
            });
        }

        Ok(Self { algorithm, digest })
    }

    /// The digest as URL-safe, unpadded base64
    pub fn encoded(&self) -> String {
        URL_SAFE_NO_PAD.encode(&self.digest)
    }

    /// Format as a RECORD hash field
    pub fn to_record_field(&self) -> String {
        format!("{}={}", self.algorithm.name(), self.encoded())
    }
}

impl fmt::Display for RecordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_record_field())
    }
}

/// Incremental hasher over any supported algorithm
pub struct Hasher {
    state: HasherState,
}

enum HasherState {
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Hasher {
    /// Create a new hasher with the specified algorithm
    pub fn new(algorithm: HashAlgorithm) -> Self {
        let state = match algorithm {
            HashAlgorithm::Sha256 => HasherState::Sha256(Sha256::new()),
            HashAlgorithm::Sha384 => HasherState::Sha384(Sha384::new()),
            HashAlgorithm::Sha512 => HasherState::Sha512(Sha512::new()),
        };
        Self { state }
    }

    /// Update the hasher with more data
    pub fn update(&mut self, data: &[u8]) {
        match &mut self.state {
            HasherState::Sha256(h) => h.update(data),
            HasherState::Sha384(h) => h.update(data),
            HasherState::Sha512(h) => h.update(data),
        }
    }

    /// Finalize and return the digest
    pub fn finalize(self) -> RecordHash {
        let (algorithm, digest) = match self.state {
            HasherState::Sha256(h) => (HashAlgorithm::Sha256, h.finalize().to_vec()),
            HasherState::Sha384(h) => (HashAlgorithm::Sha384, h.finalize().to_vec()),
            HasherState::Sha512(h) => (HashAlgorithm::Sha512, h.finalize().to_vec()),
        };
        RecordHash { algorithm, digest }
    }
}

/// Compute hash of a byte slice
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> RecordHash {
    let mut hasher = Hasher::new(algorithm);
    hasher.update(data);
    hasher.finalize()
}

/// SHA-256 RECORD field for a byte slice (`sha256=...`)
#[inline]
pub fn record_sha256(data: &[u8]) -> String {
    hash_bytes(HashAlgorithm::Sha256, data).to_record_field()
}

/// Check bytes against a RECORD hash field
pub fn verify_record_field(data: &[u8], field: &str) -> Result<bool, HashError> {
    let expected = RecordHash::parse(field)?;
    Ok(hash_bytes(expected.algorithm, data) == expected)
}
