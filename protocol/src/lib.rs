// Copyright (c) 2026 ATTEST Contributors. MIT License.

//! # ATTEST Protocol
//!
//! Core library for the ATTEST credential registry: a ledger-anchored
//! record of academic credentials that third parties can verify without
//! trusting the party presenting them.
//!
//! The registry stores no personal data. A credential on the ledger is a
//! 32-byte hash plus issuer, subject, timestamps, and an off-chain
//! metadata URI; the claims themselves live behind that URI, bound to
//! the ledger by the hash.
//!
//! ## Layers
//!
//! - [`crypto`]: Ed25519 keys, BLAKE3/SHA-256 hashing, the
//!   [`CredentialHash`](crypto::CredentialHash) ledger key.
//! - [`identity`]: Bech32 `atst1...` addresses and `did:atst` DIDs.
//! - [`registry`]: issuer authorization, the DID directory, the
//!   credential ledger, verification, and the thread-safe service
//!   combining them.
//! - [`metadata`]: claim payloads, W3C Verifiable Credential envelopes,
//!   and content-addressed document storage.
//! - [`storage`]: the sled-backed durable mirror.
//! - [`submit`]: the transaction-style write interface.
//! - [`clock`]: injected time, so expiry is testable.

pub mod clock;
pub mod config;
pub mod crypto;
pub mod identity;
pub mod metadata;
pub mod registry;
pub mod storage;
pub mod submit;
