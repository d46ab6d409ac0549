//! Error taxonomy for registry mutations and lookups.
//!
//! Every failed write maps to exactly one of these variants, and a failed
//! write changes nothing. Verification is deliberately *not* in this
//! taxonomy: asking about an unknown credential is a legitimate question
//! with a negative answer, not an error.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::crypto::CredentialHash;
use crate::identity::AttestId;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The caller is not permitted to perform this operation. Covers both
    /// non-owner issuer-list mutations and revocation by anyone other
    /// than the recorded issuer.
    #[error("caller {caller} is not authorized to {operation}")]
    Unauthorized { operation: &'static str, caller: AttestId },

    /// Issuance attempted by an identity that is not on the authorized
    /// issuer list.
    #[error("caller {caller} is not an authorized issuer")]
    NotAuthorizedIssuer { caller: AttestId },

    /// No credential exists under this hash. Only mutations raise this;
    /// verification of an unknown hash returns a negative report instead.
    #[error("no credential recorded under {0}")]
    CredentialNotFound(CredentialHash),

    /// No DID registered under this address.
    #[error("no DID registered for {0}")]
    DidNotFound(AttestId),

    /// A credential with this hash already exists. Hashes are the
    /// ledger's primary key; re-issuing under the same hash is rejected
    /// even by the original issuer.
    #[error("credential {0} already exists")]
    DuplicateCredential(CredentialHash),

    /// This address has already registered a DID. Registration is
    /// single-use per address.
    #[error("address {0} has already registered a DID")]
    AlreadyRegistered(AttestId),

    /// The credential was already revoked. Revocation is idempotent in
    /// effect but not in interface: double revocation is reported so
    /// callers notice replayed or conflicting requests.
    #[error("credential {0} is already revoked")]
    AlreadyRevoked(CredentialHash),

    /// The requested expiry is not in the future.
    #[error("expiry {expires_at} is not after current time {now}")]
    InvalidExpiry {
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    /// A bounded field exceeded its limit.
    #[error("{field} is {actual} bytes, limit is {max}")]
    LimitExceeded {
        field: &'static str,
        max: usize,
        actual: usize,
    },
}

impl RegistryError {
    /// Whether retrying the same operation later could succeed.
    ///
    /// Registry rejections are all deterministic verdicts on the request
    /// itself, so nothing here is retryable. Submission-layer failures
    /// (timeouts, congestion) are a different story and carry their own
    /// flag.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
