//! # Protocol Configuration & Constants
//!
//! Every magic number in ATTEST lives here. A literal `32` scattered through
//! the crypto modules is a bug waiting for its moment; name it here instead.
//!
//! These values define the on-wire and on-ledger formats of the registry.
//! Changing them after credentials have been issued invalidates every
//! recorded hash and address, so choose wisely before first deployment.

// ---------------------------------------------------------------------------
// Identity Formats
// ---------------------------------------------------------------------------

/// Human-readable prefix for Bech32-encoded ATTEST addresses.
/// Short enough to type, long enough to be unambiguous.
pub const ADDRESS_HRP: &str = "atst";

/// DID method name. Full identifiers have the form `did:atst:<address>`.
pub const DID_METHOD: &str = "atst";

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Protocol version string, reported by `/health` and the CLI.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Registry schema version, persisted alongside mirrored records. Bump on
/// any change to the serialized record layouts.
pub const REGISTRY_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 — the only sane choice for caller signatures in 2024+.
/// 128-bit security level, deterministic, and resistant to side-channel
/// attacks when implemented correctly (which ed25519-dalek is).
pub const SIGNING_ALGORITHM: &str = "Ed25519";

/// Signing key length in bytes. Ed25519 secret keys are 32 bytes.
pub const SIGNING_KEY_LENGTH: usize = 32;

/// Public (verifying) key length in bytes.
pub const VERIFYING_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes. If yours isn't, something
/// has gone terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

/// The hash function behind credential digests and addresses. BLAKE3 is
/// faster than SHA-256 on every platform that matters, and it's a proper
/// cryptographic hash — not a toy.
pub const PRIMARY_HASH_FUNCTION: &str = "BLAKE3";

/// Digest length in bytes. Both SHA-256 and BLAKE3 produce 32-byte digests.
pub const DIGEST_LENGTH: usize = 32;

/// Domain-separation context for credential digests. Credential hashes can
/// never collide with any other BLAKE3 use in the protocol because this
/// context is mixed into the hash IV (see `crypto::hash`).
pub const CREDENTIAL_HASH_CONTEXT: &str = "attest-protocol credential v1";

// ---------------------------------------------------------------------------
// Record Limits
// ---------------------------------------------------------------------------

/// Maximum length of a `credential_type` string. Enough for
/// "Doctor of Philosophy in Computational Astrophysics", not enough for abuse.
pub const MAX_CREDENTIAL_TYPE_LENGTH: usize = 128;

/// Maximum length of a metadata URI. Content-address URIs are ~70 chars;
/// this leaves headroom for other schemes without letting the ledger become
/// a blob store.
pub const MAX_METADATA_URI_LENGTH: usize = 512;

/// Maximum size of a stored DID document, in bytes. DID documents carry
/// keys and service endpoints, not general storage.
pub const MAX_DID_DOCUMENT_BYTES: usize = 8 * 1024;

// ---------------------------------------------------------------------------
// Network Parameters
// ---------------------------------------------------------------------------

/// Default REST API port for `attest-node`.
pub const DEFAULT_API_PORT: u16 = 8620;

/// Default metrics (Prometheus) port.
pub const DEFAULT_METRICS_PORT: u16 = 8621;
