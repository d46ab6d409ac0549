//! # Credential Claims and Envelopes
//!
//! What a credential actually *says*, and how that turns into the
//! 32-byte hash the ledger stores.
//!
//! [`CredentialClaims`] is the canonical claim payload an issuer commits
//! to. Its digest is a domain-separated BLAKE3 hash of the canonical
//! JSON encoding, so any party holding the full claims can recompute the
//! ledger key and check the binding offline.
//!
//! [`VerifiableCredential`] is the W3C-shaped envelope the claims travel
//! in off-chain. The registry never parses one; it exists so documents
//! stored behind `metadata_uri` are interoperable with standard VC
//! tooling.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::CREDENTIAL_HASH_CONTEXT;
use crate::crypto::{domain_separated_hash, CredentialHash};
use crate::identity::{AttestDid, AttestId};

/// The canonical claim payload for an academic credential.
///
/// Field order is fixed and the struct serializes the same way every
/// time, which makes [`digest`](Self::digest) reproducible across
/// parties. The `nonce` exists so two credentials with identical claims
/// (a student retaking the same degree, improbably) still get distinct
/// ledger keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialClaims {
    /// E.g. `"BachelorDegree"`. Mirrored into the ledger record.
    pub credential_type: String,

    pub issuer: AttestId,
    pub subject: AttestId,

    pub degree: String,
    pub major: String,
    pub institution: String,
    pub graduation_date: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub honors: Option<String>,

    /// Random per-credential salt.
    pub nonce: Uuid,
}

impl CredentialClaims {
    /// The canonical byte encoding the digest is computed over.
    pub fn canonical_bytes(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("claims contain no non-serializable types")
    }

    /// Compute the credential's ledger key.
    pub fn digest(&self) -> CredentialHash {
        CredentialHash::from_bytes(domain_separated_hash(
            CREDENTIAL_HASH_CONTEXT,
            &self.canonical_bytes(),
        ))
    }
}

/// The `credentialSubject` section of a [`VerifiableCredential`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    /// The subject's DID.
    pub id: String,

    pub degree: String,
    pub major: String,
    pub institution: String,
    pub graduation_date: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpa: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub honors: Option<String>,
}

/// A W3C Verifiable Credential envelope around a set of claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(rename = "@context")]
    pub context: Vec<String>,

    /// `urn:uuid:<v4>` identifier, distinct from the ledger hash.
    pub id: String,

    #[serde(rename = "type")]
    pub credential_types: Vec<String>,

    /// Issuer DID.
    pub issuer: String,

    pub issuance_date: DateTime<Utc>,
    pub expiration_date: DateTime<Utc>,

    pub credential_subject: CredentialSubject,

    /// Hex form of the ledger hash, for offline binding checks.
    pub credential_hash: String,
}

impl VerifiableCredential {
    /// Wrap claims into the standard envelope.
    pub fn from_claims(
        claims: &CredentialClaims,
        issuance_date: DateTime<Utc>,
        expiration_date: DateTime<Utc>,
    ) -> Self {
        Self {
            context: vec![
                "https://www.w3.org/2018/credentials/v1".to_string(),
                "https://www.w3.org/2018/credentials/examples/v1".to_string(),
            ],
            id: format!("urn:uuid:{}", Uuid::new_v4()),
            credential_types: vec![
                "VerifiableCredential".to_string(),
                claims.credential_type.clone(),
            ],
            issuer: AttestDid::for_identity(claims.issuer.clone()).as_uri(),
            issuance_date,
            expiration_date,
            credential_subject: CredentialSubject {
                id: AttestDid::for_identity(claims.subject.clone()).as_uri(),
                degree: claims.degree.clone(),
                major: claims.major.clone(),
                institution: claims.institution.clone(),
                graduation_date: claims.graduation_date.clone(),
                gpa: claims.gpa.clone(),
                honors: claims.honors.clone(),
            },
            credential_hash: claims.digest().to_hex(),
        }
    }
}
