//! # Verification Engine
//!
//! The pure read side of the registry. Verification never mutates
//! anything and never errors at the domain level: an unknown hash is a
//! legitimate question whose answer is "not valid", not a failure.
//!
//! A credential is valid exactly when it exists, is not revoked, and has
//! not expired (`expires_at` strictly after the observed time). Under
//! the default policy the issuer's *current* authorization is
//! irrelevant: a credential issued while the issuer was authorized stays
//! valid after the issuer is removed. The [`AuthorizationPolicy`] knob
//! lets stricter deployments demand a currently-authorized issuer too.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::CredentialHash;
use crate::registry::issuers::IssuerRegistry;
use crate::registry::ledger::{CredentialLedger, CredentialRecord};

/// How verification treats the issuer's authorization status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationPolicy {
    /// Authorization mattered at issuance time only. De-authorizing an
    /// issuer does not invalidate credentials it already issued.
    #[default]
    TrustAtIssuance,

    /// The issuer must also be authorized *now* for the credential to
    /// verify as valid.
    RecheckCurrent,
}

/// The fine-grained outcome of a verification, for logging and metrics.
/// The wire report collapses this to a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialStatus {
    Valid,
    Revoked,
    Expired,
    /// No record under this hash.
    Unknown,
    /// Only produced under [`AuthorizationPolicy::RecheckCurrent`].
    IssuerNotAuthorized,
}

impl CredentialStatus {
    pub fn is_valid(&self) -> bool {
        matches!(self, CredentialStatus::Valid)
    }

    /// Short label for logs and counters.
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialStatus::Valid => "valid",
            CredentialStatus::Revoked => "revoked",
            CredentialStatus::Expired => "expired",
            CredentialStatus::Unknown => "unknown",
            CredentialStatus::IssuerNotAuthorized => "issuer_not_authorized",
        }
    }
}

/// The wire-format verification response.
///
/// For an unknown hash every field takes its zero value: `isValid` is
/// false, addresses are empty strings, timestamps are 0. Relying parties
/// that only check `isValid` need no special casing, and the response
/// reveals nothing about which hashes exist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationReport {
    pub is_valid: bool,

    /// Issuer address string, or empty for an unknown hash.
    pub issuer: String,

    /// Subject address string, or empty for an unknown hash.
    pub subject: String,

    /// Unix seconds, 0 for an unknown hash.
    pub issued_at: i64,

    /// Unix seconds, 0 for an unknown hash.
    pub expires_at: i64,

    #[serde(rename = "metadataURI")]
    pub metadata_uri: String,
}

impl VerificationReport {
    fn unknown() -> Self {
        Self {
            is_valid: false,
            issuer: String::new(),
            subject: String::new(),
            issued_at: 0,
            expires_at: 0,
            metadata_uri: String::new(),
        }
    }

    fn from_record(record: &CredentialRecord, status: CredentialStatus) -> Self {
        Self {
            is_valid: status.is_valid(),
            issuer: record.issuer.to_address(),
            subject: record.subject.to_address(),
            issued_at: record.issued_at.timestamp(),
            expires_at: record.expires_at.timestamp(),
            metadata_uri: record.metadata_uri.clone(),
        }
    }
}

/// Classify a credential at time `now`.
///
/// Check order is revocation, then expiry, then (policy permitting)
/// issuer authorization, so a credential that is both revoked and
/// expired reports as revoked.
pub fn status_of(
    record: &CredentialRecord,
    issuers: &IssuerRegistry,
    policy: AuthorizationPolicy,
    now: DateTime<Utc>,
) -> CredentialStatus {
    if record.revoked {
        return CredentialStatus::Revoked;
    }
    if record.expires_at <= now {
        return CredentialStatus::Expired;
    }
    if policy == AuthorizationPolicy::RecheckCurrent && !issuers.is_issuer(&record.issuer) {
        return CredentialStatus::IssuerNotAuthorized;
    }
    CredentialStatus::Valid
}

/// Verify a credential hash against the ledger.
///
/// Total over all inputs: any 32-byte hash and any time yield a report.
pub fn verify(
    ledger: &CredentialLedger,
    issuers: &IssuerRegistry,
    hash: &CredentialHash,
    policy: AuthorizationPolicy,
    now: DateTime<Utc>,
) -> (VerificationReport, CredentialStatus) {
    match ledger.get(hash) {
        None => (VerificationReport::unknown(), CredentialStatus::Unknown),
        Some(record) => {
            let status = status_of(record, issuers, policy, now);
            (VerificationReport::from_record(record, status), status)
        }
    }
}
