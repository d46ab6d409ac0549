//! Cryptographic primitives: Ed25519 keys and signatures, and the hash
//! functions that derive addresses, credential digests, and content
//! addresses.

pub mod hash;
pub mod keys;

pub use hash::{blake3_hash, domain_separated_hash, sha256, sha256_array, CredentialHash};
pub use keys::{AttestKeypair, AttestPublicKey, AttestSignature, KeyError};
