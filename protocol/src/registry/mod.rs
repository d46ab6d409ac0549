//! The credential registry: issuer authorization, the DID directory, the
//! append-only credential ledger, the verification engine, and the
//! thread-safe service that composes them.

pub mod directory;
pub mod error;
pub mod issuers;
pub mod ledger;
pub mod service;
pub mod verify;

pub use directory::{DidDirectory, DidRecord, DirectoryError};
pub use error::RegistryError;
pub use issuers::{IssuerEntry, IssuerRegistry};
pub use ledger::{CredentialLedger, CredentialRecord};
pub use service::{
    MirrorSink, RegistryConfig, RegistryEvent, RegistryService, RegistrySnapshot, RegistryStats,
};
pub use verify::{AuthorizationPolicy, CredentialStatus, VerificationReport};
