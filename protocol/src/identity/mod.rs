//! Participant identity: Bech32 ledger addresses derived from Ed25519
//! keys, and W3C DIDs under the `atst` method built on top of them.

pub mod address;
pub mod did;

pub use address::{AddressError, AttestId};
pub use did::{AttestDid, DidDocument, DidError, ServiceEndpoint, VerificationMethod};
