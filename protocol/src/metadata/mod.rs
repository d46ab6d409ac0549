//! Off-chain credential content: canonical claims and their digests, the
//! W3C Verifiable Credential envelope, and content-addressed document
//! storage with binding verification.

pub mod credential;
pub mod store;

pub use credential::{CredentialClaims, CredentialSubject, VerifiableCredential};
pub use store::{fetch_json, put_json, verify_binding, ContentStore, MetadataError, MetadataStore};
