//! # ATTEST Addresses
//!
//! The on-ledger identity of every participant. An [`AttestId`] is derived
//! from an Ed25519 public key by hashing it with BLAKE3 and encoding the
//! digest as Bech32 with the `atst` human-readable prefix:
//!
//! ```text
//! address = bech32("atst", blake3(public_key))
//! ```
//!
//! Hashing rather than encoding the key directly buys two things: a fixed
//! 32-byte identity regardless of future key types, and the public key
//! stays private until its owner first signs something.
//!
//! Bech32 gives us error detection (a mistyped address fails checksum
//! rather than silently routing a credential to a stranger) and a prefix
//! that makes ATTEST addresses visually unmistakable.

use bech32::{Bech32, Hrp};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

use crate::config::ADDRESS_HRP;
use crate::crypto::{blake3_hash, AttestPublicKey, AttestSignature};

/// Errors arising from address encoding and decoding.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error("invalid bech32 encoding: {0}")]
    InvalidBech32(String),

    #[error("wrong address prefix: expected '{expected}', got '{actual}'")]
    WrongPrefix { expected: String, actual: String },

    #[error("address payload must be 32 bytes, got {0}")]
    WrongPayloadLength(usize),

    #[error("no public key attached to this identity")]
    MissingPublicKey,
}

/// A participant identity on the ATTEST ledger.
///
/// Internally this is the 32-byte BLAKE3 hash of the participant's public
/// key, optionally accompanied by the key itself. The key is only known
/// once the participant has revealed it (by registering a DID or signing
/// a transaction); addresses parsed from strings carry just the hash.
///
/// Equality and hashing consider **only** the key hash, so an identity
/// with an attached public key compares equal to the same identity parsed
/// from its address string. This is what lets `AttestId` serve as a map
/// key across the registry.
#[derive(Clone)]
pub struct AttestId {
    /// BLAKE3 hash of the Ed25519 public key. The actual identity.
    key_hash: [u8; 32],

    /// The public key, if known. Needed for signature checks, irrelevant
    /// for identity comparison.
    public_key: Option<AttestPublicKey>,
}

impl AttestId {
    /// Derive an identity from a public key.
    pub fn from_public_key(public_key: &AttestPublicKey) -> Self {
        Self {
            key_hash: blake3_hash(public_key.as_bytes()),
            public_key: Some(public_key.clone()),
        }
    }

    /// Rebuild an identity from its raw 32-byte key hash.
    ///
    /// Storage keys are the key hash, so this is how identities come back
    /// out of a mirror. Like [`AttestId::from_address`], the result
    /// carries no public key.
    pub fn from_key_hash(key_hash: [u8; 32]) -> Self {
        Self {
            key_hash,
            public_key: None,
        }
    }

    /// Parse an identity from its Bech32 address string.
    ///
    /// The resulting identity has no attached public key, which is fine
    /// for lookups and comparisons but not for signature verification.
    pub fn from_address(address: &str) -> Result<Self, AddressError> {
        let (hrp, payload) =
            bech32::decode(address).map_err(|e| AddressError::InvalidBech32(e.to_string()))?;

        if hrp.as_str() != ADDRESS_HRP {
            return Err(AddressError::WrongPrefix {
                expected: ADDRESS_HRP.to_string(),
                actual: hrp.as_str().to_string(),
            });
        }

        if payload.len() != 32 {
            return Err(AddressError::WrongPayloadLength(payload.len()));
        }

        let mut key_hash = [0u8; 32];
        key_hash.copy_from_slice(&payload);

        Ok(Self {
            key_hash,
            public_key: None,
        })
    }

    /// Render the canonical `atst1...` address string.
    pub fn to_address(&self) -> String {
        let hrp = Hrp::parse(ADDRESS_HRP).expect("ADDRESS_HRP is a valid bech32 prefix");
        bech32::encode::<Bech32>(hrp, &self.key_hash)
            .expect("32-byte payload always encodes")
    }

    /// The underlying 32-byte key hash.
    pub fn key_hash(&self) -> &[u8; 32] {
        &self.key_hash
    }

    /// The attached public key, if this identity has revealed one.
    pub fn public_key(&self) -> Option<&AttestPublicKey> {
        self.public_key.as_ref()
    }

    /// Attach a public key to an identity parsed from an address.
    ///
    /// Fails closed: the key must actually hash to this identity's key
    /// hash, otherwise anyone could claim any address by attaching their
    /// own key.
    pub fn attach_public_key(&mut self, public_key: AttestPublicKey) -> Result<(), AddressError> {
        if blake3_hash(public_key.as_bytes()) != self.key_hash {
            return Err(AddressError::MissingPublicKey);
        }
        self.public_key = Some(public_key);
        Ok(())
    }

    /// Verify that `signature` over `message` was produced by this
    /// identity's key.
    ///
    /// Errors if no public key is attached; signature checks cannot be
    /// done against a hash alone.
    pub fn verify_signature(
        &self,
        message: &[u8],
        signature: &AttestSignature,
    ) -> Result<bool, AddressError> {
        let key = self.public_key.as_ref().ok_or(AddressError::MissingPublicKey)?;
        Ok(key.verify(message, signature))
    }
}

impl PartialEq for AttestId {
    fn eq(&self, other: &Self) -> bool {
        self.key_hash == other.key_hash
    }
}

impl Eq for AttestId {}

impl Hash for AttestId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key_hash.hash(state);
    }
}

impl FromStr for AttestId {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_address(s)
    }
}

impl fmt::Display for AttestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_address())
    }
}

impl fmt::Debug for AttestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let addr = self.to_address();
        write!(f, "AttestId({}..{})", &addr[..10], &addr[addr.len() - 6..])
    }
}

impl Serialize for AttestId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_address())
        } else {
            serializer.serialize_bytes(&self.key_hash)
        }
    }
}

impl<'de> Deserialize<'de> for AttestId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            Self::from_address(&s).map_err(serde::de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            if bytes.len() != 32 {
                return Err(serde::de::Error::custom(AddressError::WrongPayloadLength(
                    bytes.len(),
                )));
            }
            let mut key_hash = [0u8; 32];
            key_hash.copy_from_slice(&bytes);
            Ok(Self {
                key_hash,
                public_key: None,
            })
        }
    }
}
