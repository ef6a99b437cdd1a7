//! Key digest functions for consistent hashing.
//!
//! Every key that enters the hash ring is first reduced to a 64-bit digest.
//! The digest family is selectable at construction time ([`HashAlgorithm`]);
//! CRC32 is the default because the ring's jump step conditions the digest
//! further, so a fast non-cryptographic function is sufficient.
//!
//! The seeded variant ([`HashFn::hash_with_seed`]) appends the big-endian
//! encoding of the seed to the input. The seed is accepted as `i64` but
//! encoded through its unsigned bit pattern; callers on both sides of a
//! serialization boundary must agree on these exact bytes for lookups to be
//! reproducible.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Digest family used to reduce keys to 64 bits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// IEEE CRC-32, zero-extended to 64 bits. The default.
    #[default]
    Crc32,
    /// MD5, truncated to the first 8 digest bytes (big-endian).
    Md5,
    /// SHA-256, truncated to the first 8 digest bytes (big-endian).
    Sha256,
}

impl HashAlgorithm {
    /// Lowercase name, as accepted by config files and the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Crc32 => "crc32",
            Self::Md5 => "md5",
            Self::Sha256 => "sha256",
        }
    }
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when parsing an unrecognized algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hash algorithm: {0:?} (expected crc32, md5 or sha256)")]
pub struct UnknownAlgorithm(String);

impl FromStr for HashAlgorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "crc32" => Ok(Self::Crc32),
            "md5" => Ok(Self::Md5),
            "sha256" => Ok(Self::Sha256),
            other => Err(UnknownAlgorithm(other.to_string())),
        }
    }
}

/// A configured digest function.
///
/// Stateless and trivially copyable; a `HashFn` may be shared freely between
/// readers. Both entry points are pure: the same input always produces the
/// same digest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HashFn {
    algorithm: HashAlgorithm,
}

impl HashFn {
    /// Create a digest function for the given algorithm.
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    /// The algorithm this function dispatches to.
    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Digest an arbitrary byte sequence to 64 bits.
    pub fn hash(&self, bytes: &[u8]) -> u64 {
        match self.algorithm {
            HashAlgorithm::Crc32 => u64::from(crc32fast::hash(bytes)),
            HashAlgorithm::Md5 => {
                let digest = md5::compute(bytes);
                truncate_be(&digest.0)
            }
            HashAlgorithm::Sha256 => truncate_be(&Sha256::digest(bytes)),
        }
    }

    /// Digest `bytes` followed by the 8-byte big-endian encoding of `seed`.
    ///
    /// The seed's unsigned bit pattern is what gets encoded: a seed of `-1`
    /// appends eight `0xFF` bytes.
    pub fn hash_with_seed(&self, bytes: &[u8], seed: i64) -> u64 {
        let mut input = Vec::with_capacity(bytes.len() + 8);
        input.extend_from_slice(bytes);
        input.extend_from_slice(&(seed as u64).to_be_bytes());
        self.hash(&input)
    }

    /// Digest a string key.
    pub fn hash_str(&self, key: &str) -> u64 {
        self.hash(key.as_bytes())
    }

    /// Digest a string key with a seed.
    pub fn hash_str_with_seed(&self, key: &str, seed: i64) -> u64 {
        self.hash_with_seed(key.as_bytes(), seed)
    }
}

impl fmt::Display for HashFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.algorithm.fmt(f)
    }
}

/// First 8 digest bytes interpreted as a big-endian `u64`.
fn truncate_be(digest: &[u8]) -> u64 {
    let bytes: [u8; 8] = digest[..8].try_into().expect("8 bytes");
    u64::from_be_bytes(bytes)
}
