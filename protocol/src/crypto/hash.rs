//! # Hashing
//!
//! Cryptographic hash functions used throughout the protocol, plus the
//! [`CredentialHash`] key type that the ledger is indexed by.
//!
//! ## Two hash functions?
//!
//! Yes, two. Each has its lane:
//!
//! - **BLAKE3**: the workhorse. Credential digests, address derivation,
//!   content-address computation. Absurdly fast, 32-byte output, built-in
//!   keyed/derive-key modes for domain separation.
//! - **SHA-256**: interop. External systems that anchor or cross-check
//!   credential hashes tend to speak SHA-256 and nothing else.
//!
//! ## Domain separation
//!
//! A credential digest and, say, a content address must never collide even
//! when the underlying bytes are identical. We use BLAKE3's `derive_key`
//! mode with a context string per domain, so `hash("x")` in one domain and
//! `hash("x")` in another produce unrelated outputs.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::DIGEST_LENGTH;

/// Compute the SHA-256 hash of the input, returning raw bytes.
pub fn sha256(data: &[u8]) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().to_vec()
}

/// Compute the SHA-256 hash as a fixed-size array.
///
/// Prefer this over [`sha256`] when you need the output in a struct field.
/// Fixed-size arrays don't allocate, and the type system remembers the
/// length for you.
pub fn sha256_array(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the BLAKE3 hash of the input.
pub fn blake3_hash(data: &[u8]) -> [u8; 32] {
    *blake3::hash(data).as_bytes()
}

/// Compute a domain-separated BLAKE3 hash.
///
/// Uses BLAKE3's `derive_key` mode, which takes a context string and
/// produces outputs that are cryptographically independent across
/// contexts. The context string should be globally unique and stable
/// forever — changing it silently changes every hash in that domain.
pub fn domain_separated_hash(context: &str, data: &[u8]) -> [u8; 32] {
    blake3::derive_key(context, data)
}

/// Error parsing a [`CredentialHash`] from its hex representation.
#[derive(Debug, Error)]
pub enum HashParseError {
    #[error("credential hash is not valid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("credential hash must be {expected} bytes, got {actual}")]
    WrongLength { expected: usize, actual: usize },
}

/// The 32-byte hash that uniquely identifies a credential on the ledger.
///
/// This is the primary key of the whole system: issuance stores a record
/// under it, revocation looks it up, verification reports on it. The
/// registry never sees credential *contents* — only this digest — so two
/// credentials with the same hash are, as far as the ledger is concerned,
/// the same credential. That is why issuance rejects duplicates outright.
///
/// Displayed and serialized as a `0x`-prefixed lowercase hex string in
/// human-readable formats, raw bytes in binary formats.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CredentialHash([u8; DIGEST_LENGTH]);

impl CredentialHash {
    /// Wrap raw digest bytes.
    pub fn from_bytes(bytes: [u8; DIGEST_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Try to build a hash from a byte slice of unknown length.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, HashParseError> {
        if slice.len() != DIGEST_LENGTH {
            return Err(HashParseError::WrongLength {
                expected: DIGEST_LENGTH,
                actual: slice.len(),
            });
        }
        let mut bytes = [0u8; DIGEST_LENGTH];
        bytes.copy_from_slice(slice);
        Ok(Self(bytes))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; DIGEST_LENGTH] {
        &self.0
    }

    /// `0x`-prefixed lowercase hex, the canonical text form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl FromStr for CredentialHash {
    type Err = HashParseError;

    /// Accepts hex with or without the `0x` prefix. Case-insensitive,
    /// because users will paste uppercase hashes no matter what the docs say.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(stripped)?;
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CredentialHash({}..)", &self.to_hex()[..12])
    }
}

impl Serialize for CredentialHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_hex())
        } else {
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for CredentialHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(serde::de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            Self::try_from_slice(&bytes).map_err(serde::de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_known_vector() {
        // SHA-256 of empty input, the most famous test vector in existence.
        let hash = sha256(b"");
        assert_eq!(
            hex::encode(&hash),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn sha256_array_matches_vec_version() {
        let data = b"attest protocol";
        assert_eq!(sha256(data), sha256_array(data).to_vec());
    }

    #[test]
    fn blake3_is_deterministic() {
        assert_eq!(blake3_hash(b"hello"), blake3_hash(b"hello"));
        assert_ne!(blake3_hash(b"hello"), blake3_hash(b"hello!"));
    }

    #[test]
    fn domain_separation_actually_separates() {
        let data = b"same bytes";
        let a = domain_separated_hash("domain a", data);
        let b = domain_separated_hash("domain b", data);
        assert_ne!(a, b);
    }

    #[test]
    fn credential_hash_hex_roundtrip() {
        let h = CredentialHash::from_bytes([7u8; 32]);
        let parsed: CredentialHash = h.to_hex().parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn credential_hash_parses_without_prefix() {
        let h = CredentialHash::from_bytes([0xab; 32]);
        let bare = hex::encode([0xab; 32]);
        let parsed: CredentialHash = bare.parse().unwrap();
        assert_eq!(h, parsed);
    }

    #[test]
    fn credential_hash_rejects_wrong_length() {
        assert!("0xdeadbeef".parse::<CredentialHash>().is_err());
        assert!(CredentialHash::try_from_slice(&[0u8; 31]).is_err());
    }

    #[test]
    fn credential_hash_rejects_bad_hex() {
        assert!("0xzz".parse::<CredentialHash>().is_err());
    }

    #[test]
    fn json_serialization_is_prefixed_hex() {
        let h = CredentialHash::from_bytes([1u8; 32]);
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.starts_with("\"0x01"));
        let back: CredentialHash = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn binary_serialization_roundtrip() {
        let h = CredentialHash::from_bytes([9u8; 32]);
        let encoded = bincode::serialize(&h).unwrap();
        let back: CredentialHash = bincode::deserialize(&encoded).unwrap();
        assert_eq!(h, back);
    }
}
