//! # Decentralized Identifiers
//!
//! W3C-style DIDs for the `atst` method. A DID names a participant in a
//! globally resolvable form:
//!
//! ```text
//! did:atst:atst1q8f7...
//! ```
//!
//! The method-specific identifier is the participant's Bech32 address, so
//! a DID and an address are interconvertible without any lookup. The DID
//! *document* adds the material a relying party needs to interact with the
//! subject: verification method (the Ed25519 public key in multibase form)
//! and optional service endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::config::{DID_METHOD, MAX_DID_DOCUMENT_BYTES};
use crate::crypto::AttestPublicKey;
use crate::identity::address::{AddressError, AttestId};

/// The multicodec prefix for an Ed25519 public key, per the multicodec
/// table. Prepended to key bytes before base58 encoding.
const ED25519_MULTICODEC_PREFIX: [u8; 2] = [0xed, 0x01];

/// Errors arising from DID parsing and document validation.
#[derive(Debug, Error)]
pub enum DidError {
    #[error("malformed DID: expected 'did:{DID_METHOD}:<address>', got '{0}'")]
    Malformed(String),

    #[error("unsupported DID method '{0}', this registry only resolves '{DID_METHOD}'")]
    UnsupportedMethod(String),

    #[error("invalid address in DID: {0}")]
    InvalidAddress(#[from] AddressError),

    #[error("DID document invalid: {0}")]
    InvalidDocument(String),
}

/// A DID under the `atst` method.
///
/// Thin wrapper over an [`AttestId`]; exists so function signatures can
/// say "this parameter is a DID" and parsing happens in exactly one place.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttestDid(AttestId);

impl AttestDid {
    /// Build the DID for an identity.
    pub fn for_identity(id: AttestId) -> Self {
        Self(id)
    }

    /// The identity this DID names.
    pub fn identity(&self) -> &AttestId {
        &self.0
    }

    /// Render the full `did:atst:...` string.
    pub fn as_uri(&self) -> String {
        format!("did:{}:{}", DID_METHOD, self.0.to_address())
    }
}

impl FromStr for AttestDid {
    type Err = DidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let scheme = parts.next().unwrap_or_default();
        let method = parts.next().ok_or_else(|| DidError::Malformed(s.to_string()))?;
        let address = parts.next().ok_or_else(|| DidError::Malformed(s.to_string()))?;

        if scheme != "did" {
            return Err(DidError::Malformed(s.to_string()));
        }
        if method != DID_METHOD {
            return Err(DidError::UnsupportedMethod(method.to_string()));
        }

        Ok(Self(AttestId::from_address(address)?))
    }
}

impl fmt::Display for AttestDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_uri())
    }
}

impl fmt::Debug for AttestDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AttestDid({})", self.as_uri())
    }
}

/// A verification method entry in a DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// Fragment-qualified identifier, e.g. `did:atst:atst1...#key-1`.
    pub id: String,

    /// Key suite. Always `Ed25519VerificationKey2020` for this method.
    #[serde(rename = "type")]
    pub method_type: String,

    /// The DID that controls this key.
    pub controller: String,

    /// Multibase-encoded public key: `z` + base58(multicodec prefix + key).
    pub public_key_multibase: String,
}

/// A service endpoint advertised in a DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    pub id: String,
    #[serde(rename = "type")]
    pub service_type: String,
    pub service_endpoint: String,
}

/// A W3C DID document for an `atst` DID.
///
/// The document a resolver hands back for a registered DID. Serializes to
/// the standard JSON-LD shape; the `@context` field carries the usual W3C
/// context URIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// The DID this document describes.
    pub id: String,

    pub verification_method: Vec<VerificationMethod>,

    /// References into `verification_method` (by id) for authentication.
    pub authentication: Vec<String>,

    #[serde(default)]
    pub service: Vec<ServiceEndpoint>,
}

impl DidDocument {
    /// Construct the canonical document for a DID and its public key.
    pub fn new(did: &AttestDid, public_key: &AttestPublicKey) -> Self {
        let uri = did.as_uri();
        let key_id = format!("{uri}#key-1");
        Self {
            context: vec![
                "https://www.w3.org/ns/did/v1".to_string(),
                "https://w3id.org/security/suites/ed25519-2020/v1".to_string(),
            ],
            id: uri.clone(),
            verification_method: vec![VerificationMethod {
                id: key_id.clone(),
                method_type: "Ed25519VerificationKey2020".to_string(),
                controller: uri,
                public_key_multibase: multibase_ed25519(public_key),
            }],
            authentication: vec![key_id],
            service: Vec::new(),
        }
    }

    /// Add a service endpoint, builder-style.
    pub fn with_service(mut self, service_type: &str, endpoint: &str) -> Self {
        let index = self.service.len() + 1;
        self.service.push(ServiceEndpoint {
            id: format!("{}#service-{}", self.id, index),
            service_type: service_type.to_string(),
            service_endpoint: endpoint.to_string(),
        });
        self
    }

    /// Check structural validity before the document is accepted into the
    /// directory.
    ///
    /// Checks the `id` parses as an `atst` DID, at least one verification
    /// method exists and is controlled by the document subject, and the
    /// serialized form stays under the size cap. Registration fails closed
    /// on any violation.
    pub fn validate(&self) -> Result<AttestDid, DidError> {
        let did: AttestDid = self.id.parse()?;

        if self.verification_method.is_empty() {
            return Err(DidError::InvalidDocument(
                "document has no verification methods".to_string(),
            ));
        }
        for method in &self.verification_method {
            if method.controller != self.id {
                return Err(DidError::InvalidDocument(format!(
                    "verification method '{}' is controlled by a different DID",
                    method.id
                )));
            }
        }
        for auth in &self.authentication {
            if !self.verification_method.iter().any(|m| &m.id == auth) {
                return Err(DidError::InvalidDocument(format!(
                    "authentication reference '{auth}' points at no verification method"
                )));
            }
        }

        let encoded = serde_json::to_vec(self)
            .map_err(|e| DidError::InvalidDocument(e.to_string()))?;
        if encoded.len() > MAX_DID_DOCUMENT_BYTES {
            return Err(DidError::InvalidDocument(format!(
                "document is {} bytes, limit is {}",
                encoded.len(),
                MAX_DID_DOCUMENT_BYTES
            )));
        }

        Ok(did)
    }
}

/// Encode a public key in multibase form: `z` (base58btc) over the
/// multicodec-prefixed key bytes.
fn multibase_ed25519(public_key: &AttestPublicKey) -> String {
    let mut prefixed = Vec::with_capacity(2 + 32);
    prefixed.extend_from_slice(&ED25519_MULTICODEC_PREFIX);
    prefixed.extend_from_slice(public_key.as_bytes());
    format!("z{}", bs58::encode(prefixed).into_string())
}
