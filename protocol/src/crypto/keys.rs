//! # Key Management
//!
//! Ed25519 keypair generation and serialization for ATTEST identities.
//!
//! Every actor in the registry — the owner, each authorized issuer, each
//! credential subject — is ultimately an Ed25519 keypair. Addresses, DIDs,
//! and transaction caller identities all derive from the public half.
//!
//! ## Why Ed25519?
//!
//! - Deterministic signatures (no k-value footguns like ECDSA).
//! - 128-bit security level in 32+32 bytes. Compact and sufficient.
//! - Constant-time implementations exist and are well-audited.
//!
//! ## Security considerations
//!
//! - Private keys are zeroized on drop (thanks, ed25519-dalek).
//! - We use OS-level RNG (`OsRng`) for key generation.
//! - Key bytes are never logged. A `Debug` impl that prints secret material
//!   does not survive code review here.

use ed25519_dalek::{
    Signature as DalekSignature, Signer, SigningKey, Verifier, VerifyingKey, SECRET_KEY_LENGTH,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use thiserror::Error;

/// Errors that can occur during key operations.
///
/// These are intentionally vague about *why* something failed — leaking
/// details about key material through error messages is a classic footgun.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error("invalid secret key bytes: wrong length or not a valid scalar")]
    InvalidSecretKey,

    #[error("invalid public key bytes: not a valid Ed25519 point")]
    InvalidPublicKey,
}

/// An ATTEST identity keypair wrapping Ed25519 signing and verification keys.
///
/// The atomic unit of identity in the protocol. Issuers hold one of these
/// to sign issuance transactions; subjects hold one to control their DID.
///
/// ## Serialization
///
/// `AttestKeypair` intentionally does NOT implement `Serialize`/`Deserialize`.
/// Serializing private keys should be a deliberate, conscious act, not
/// something that happens because someone shoved a keypair into a JSON
/// response. Use `secret_key_bytes()` / `from_secret_key_bytes()` explicitly.
///
/// # Examples
///
/// ```
/// use attest_protocol::crypto::keys::AttestKeypair;
///
/// let kp = AttestKeypair::generate();
/// let msg = b"issue credential 0xabc to atst1...";
/// let sig = kp.sign(msg);
/// assert!(kp.verify(msg, &sig));
/// ```
pub struct AttestKeypair {
    /// The Ed25519 signing (private) key. 32 bytes of pure responsibility.
    signing_key: SigningKey,
}

/// The public half of an ATTEST identity, safe to share with the world.
///
/// This is what appears (hashed and Bech32-encoded) on the ledger as an
/// issuer or subject address. Losing it is inconvenient but not
/// catastrophic — it can be re-derived from the signing key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestPublicKey {
    bytes: [u8; 32],
}

/// An Ed25519 signature over a message.
///
/// 64 bytes, deterministic for a given (key, message) pair. Stored as
/// `Vec<u8>` for serde compatibility, but always exactly 64 bytes. A
/// malformed signature simply fails verification — no panics.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestSignature {
    bytes: Vec<u8>,
}

impl AttestKeypair {
    /// Generate a fresh keypair using the OS cryptographic RNG.
    ///
    /// The preferred way to create a new identity. `OsRng` pulls from
    /// `/dev/urandom` on Unix and `BCryptGenRandom` on Windows; a machine
    /// whose kernel RNG is compromised has bigger problems than registry keys.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut OsRng);
        Self { signing_key }
    }

    /// Construct a keypair deterministically from a 32-byte seed.
    ///
    /// In Ed25519 the 32-byte secret key *is* the seed. Used by tests to
    /// get stable identities, and by key-recovery flows.
    ///
    /// **Warning**: a weak seed makes a weak key. Use a proper CSPRNG or
    /// KDF to produce the seed bytes.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Reconstruct a keypair from a hex-encoded secret key.
    ///
    /// Convenience for loading keys from local key files. Don't put raw hex
    /// keys in config files in production.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_str).map_err(|_| KeyError::InvalidSecretKey)?;
        if bytes.len() != SECRET_KEY_LENGTH {
            return Err(KeyError::InvalidSecretKey);
        }
        let mut arr = [0u8; SECRET_KEY_LENGTH];
        arr.copy_from_slice(&bytes);
        Ok(Self::from_seed(&arr))
    }

    /// The public key associated with this keypair.
    pub fn public_key(&self) -> AttestPublicKey {
        AttestPublicKey {
            bytes: self.signing_key.verifying_key().to_bytes(),
        }
    }

    /// Raw public key bytes (32 bytes). Public means public: print them in
    /// logs, publish them in DID documents, no harm done.
    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Sign a message and return an [`AttestSignature`].
    ///
    /// Ed25519 signatures are deterministic — the same (key, message) pair
    /// always produces the same signature. No nonce management, no
    /// randomness needed at signing time.
    pub fn sign(&self, message: &[u8]) -> AttestSignature {
        let sig = self.signing_key.sign(message);
        AttestSignature {
            bytes: sig.to_bytes().to_vec(),
        }
    }

    /// Verify a signature against this keypair's public key.
    pub fn verify(&self, message: &[u8], signature: &AttestSignature) -> bool {
        self.public_key().verify(message, signature)
    }

    /// Export the raw 32-byte secret key material.
    ///
    /// **Handle with extreme care.** This is the only secret that stands
    /// between an attacker and full control of the associated identity —
    /// including the power to issue and revoke credentials if the identity
    /// is an authorized issuer.
    pub fn secret_key_bytes(&self) -> [u8; 32] {
        self.signing_key.to_bytes()
    }

    /// Reconstruct a keypair from raw secret key bytes.
    pub fn from_secret_key_bytes(bytes: &[u8; 32]) -> Self {
        Self::from_seed(bytes)
    }

    /// The public key as a hex string. Useful for display and logging.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key_bytes())
    }
}

impl Clone for AttestKeypair {
    /// Cloning a keypair is allowed but should make you uncomfortable.
    /// Every copy of a private key is another thing to protect.
    fn clone(&self) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(&self.signing_key.to_bytes()),
        }
    }
}

impl fmt::Debug for AttestKeypair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Never print secret key material in debug output. Not even "partially."
        write!(f, "AttestKeypair(pub={})", self.public_key().to_hex())
    }
}

impl PartialEq for AttestKeypair {
    /// Two keypairs are equal if their public keys match. Comparing secret
    /// material in a non-constant-time way is a bad habit, and for identity
    /// purposes the public key is what matters.
    fn eq(&self, other: &Self) -> bool {
        self.public_key_bytes() == other.public_key_bytes()
    }
}

impl Eq for AttestKeypair {}

// ---------------------------------------------------------------------------
// AttestPublicKey
// ---------------------------------------------------------------------------

impl AttestPublicKey {
    /// Create an `AttestPublicKey` from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self { bytes }
    }

    /// Try to create an `AttestPublicKey` from a byte slice.
    ///
    /// Validates the length and that the bytes represent a valid Ed25519
    /// point. Some 32-byte values aren't valid points on the curve, and
    /// accepting them leads to weird behavior downstream.
    pub fn try_from_slice(slice: &[u8]) -> Result<Self, KeyError> {
        if slice.len() != 32 {
            return Err(KeyError::InvalidPublicKey);
        }
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(slice);

        // Catches low-order points and other degenerate cases.
        VerifyingKey::from_bytes(&bytes).map_err(|_| KeyError::InvalidPublicKey)?;

        Ok(Self { bytes })
    }

    /// Get the raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Verify a signature against this public key.
    ///
    /// Returns `true` if the signature is valid, `false` otherwise. The
    /// vast majority of callers just want a yes/no answer and don't care
    /// about the specific failure mode.
    pub fn verify(&self, message: &[u8], signature: &AttestSignature) -> bool {
        let Ok(verifying_key) = VerifyingKey::from_bytes(&self.bytes) else {
            return false;
        };
        let sig_bytes: [u8; 64] = match signature.bytes.as_slice().try_into() {
            Ok(b) => b,
            Err(_) => return false,
        };
        verifying_key
            .verify(message, &DalekSignature::from_bytes(&sig_bytes))
            .is_ok()
    }

    /// Hex-encoded representation. 64 characters for 32 bytes.
    pub fn to_hex(&self) -> String {
        hex::encode(self.bytes)
    }

    /// Parse a hex-encoded public key string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::OddLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self { bytes: arr })
    }

    /// Base58-encoded representation, used in DID document key material.
    pub fn to_base58(&self) -> String {
        bs58::encode(self.bytes).into_string()
    }
}

impl Hash for AttestPublicKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.bytes.hash(state);
    }
}

impl fmt::Display for AttestPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AttestPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttestPublicKey({})", &self.to_hex()[..16])
    }
}

// ---------------------------------------------------------------------------
// AttestSignature
// ---------------------------------------------------------------------------

impl AttestSignature {
    /// Create a signature from its raw 64-byte representation.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// The raw signature bytes (always 64 bytes for valid Ed25519 signatures).
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Hex-encoded signature string. 128 characters for a valid sig.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }

    /// Parse a hex-encoded signature.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 64 {
            return Err(hex::FromHexError::OddLength);
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for AttestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for AttestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex_str = self.to_hex();
        if hex_str.len() >= 128 {
            write!(f, "AttestSignature({}...{})", &hex_str[..8], &hex_str[120..])
        } else {
            write!(f, "AttestSignature({})", hex_str)
        }
    }
}
