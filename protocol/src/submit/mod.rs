//! # Transaction Submission
//!
//! The write-side front door. Callers describe a mutation as a
//! [`RegistryOp`], hand it to the [`Submitter`], and get back a
//! [`SubmissionOutcome`]: either a receipt for a confirmed state change
//! or a failure with the rejection reason and a retry hint.
//!
//! Submission is where caller identity is fixed — every op names the
//! identity it executes as, and authorization is judged against that
//! identity by the registry, never against transport-level details.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::crypto::CredentialHash;
use crate::identity::{AttestId, DidDocument};
use crate::registry::{DirectoryError, RegistryService};

/// A registry mutation, described but not yet executed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum RegistryOp {
    AddIssuer {
        caller: AttestId,
        issuer: AttestId,
    },
    RemoveIssuer {
        caller: AttestId,
        issuer: AttestId,
    },
    RegisterDid {
        owner: AttestId,
        document: DidDocument,
    },
    IssueCredential {
        caller: AttestId,
        hash: CredentialHash,
        subject: AttestId,
        credential_type: String,
        expires_at: DateTime<Utc>,
        metadata_uri: String,
    },
    RevokeCredential {
        caller: AttestId,
        hash: CredentialHash,
    },
}

impl RegistryOp {
    /// Short label for receipts, logs, and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryOp::AddIssuer { .. } => "add_issuer",
            RegistryOp::RemoveIssuer { .. } => "remove_issuer",
            RegistryOp::RegisterDid { .. } => "register_did",
            RegistryOp::IssueCredential { .. } => "issue_credential",
            RegistryOp::RevokeCredential { .. } => "revoke_credential",
        }
    }
}

/// Proof that a submitted operation was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxReceipt {
    /// Submission-scoped identifier, minted per confirmed op.
    pub tx_id: Uuid,

    /// [`RegistryOp::kind`] of the confirmed op.
    pub operation: String,

    pub confirmed_at: DateTime<Utc>,
}

/// The terminal state of a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmissionOutcome {
    Confirmed(TxReceipt),
    Failed {
        reason: String,
        /// Whether resubmitting the identical op later could succeed.
        /// Registry rejections are deterministic, so this is false for
        /// all of them; it exists for transport-level implementations.
        retryable: bool,
    },
}

impl SubmissionOutcome {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, SubmissionOutcome::Confirmed(_))
    }
}

/// Executes [`RegistryOp`]s against a [`RegistryService`].
///
/// The local, in-process implementation of submission. It never returns
/// `Err` at the Rust level — every op resolves to an outcome — which
/// keeps the API shape identical to a remote submitter where rejection
/// is data, not an exception.
#[derive(Clone)]
pub struct Submitter {
    registry: RegistryService,
}

impl Submitter {
    pub fn new(registry: RegistryService) -> Self {
        Self { registry }
    }

    pub async fn submit(&self, op: RegistryOp) -> SubmissionOutcome {
        let kind = op.kind();
        let result: Result<(), String> = match op {
            RegistryOp::AddIssuer { caller, issuer } => self
                .registry
                .add_issuer(&caller, issuer)
                .map_err(|e| e.to_string()),
            RegistryOp::RemoveIssuer { caller, issuer } => self
                .registry
                .remove_issuer(&caller, &issuer)
                .map_err(|e| e.to_string()),
            RegistryOp::RegisterDid { owner, document } => self
                .registry
                .register_did(owner, document)
                .map(|_| ())
                .map_err(|e: DirectoryError| e.to_string()),
            RegistryOp::IssueCredential {
                caller,
                hash,
                subject,
                credential_type,
                expires_at,
                metadata_uri,
            } => self
                .registry
                .issue_credential(&caller, hash, subject, credential_type, expires_at, metadata_uri)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            RegistryOp::RevokeCredential { caller, hash } => self
                .registry
                .revoke_credential(&caller, &hash)
                .map(|_| ())
                .map_err(|e| e.to_string()),
        };

        match result {
            Ok(()) => SubmissionOutcome::Confirmed(TxReceipt {
                tx_id: Uuid::new_v4(),
                operation: kind.to_string(),
                // Receipt time comes from the registry's clock so it
                // agrees with whatever the op itself recorded.
                confirmed_at: self.registry.clock().now(),
            }),
            Err(reason) => SubmissionOutcome::Failed {
                reason,
                retryable: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::crypto::AttestKeypair;
    use crate::registry::RegistryConfig;
    use chrono::Duration;
    use std::sync::Arc;

    fn id(seed: u8) -> AttestId {
        let kp = AttestKeypair::from_seed(&[seed; 32]);
        AttestId::from_public_key(&kp.public_key())
    }

    fn hash(byte: u8) -> CredentialHash {
        CredentialHash::from_bytes([byte; 32])
    }

    fn submitter() -> (Submitter, Arc<ManualClock>, RegistryService) {
        let clock = Arc::new(ManualClock::at_unix(1_700_000_000));
        let registry = RegistryService::new(RegistryConfig::new(id(1)), clock.clone());
        (Submitter::new(registry.clone()), clock, registry)
    }

    #[tokio::test]
    async fn confirmed_op_yields_receipt() {
        let (submitter, _, _) = submitter();
        let outcome = submitter
            .submit(RegistryOp::AddIssuer { caller: id(1), issuer: id(2) })
            .await;
        match outcome {
            SubmissionOutcome::Confirmed(receipt) => {
                assert_eq!(receipt.operation, "add_issuer");
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejection_is_an_outcome_not_an_error() {
        let (submitter, clock, _) = submitter();
        let outcome = submitter
            .submit(RegistryOp::IssueCredential {
                caller: id(9),
                hash: hash(7),
                subject: id(3),
                credential_type: "Cert".into(),
                expires_at: clock.now() + Duration::days(1),
                metadata_uri: String::new(),
            })
            .await;
        match outcome {
            SubmissionOutcome::Failed { reason, retryable } => {
                assert!(reason.contains("not an authorized issuer"));
                assert!(!retryable);
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn full_lifecycle_through_submission() {
        let (submitter, clock, registry) = submitter();

        assert!(submitter
            .submit(RegistryOp::AddIssuer { caller: id(1), issuer: id(2) })
            .await
            .is_confirmed());
        assert!(submitter
            .submit(RegistryOp::IssueCredential {
                caller: id(2),
                hash: hash(7),
                subject: id(3),
                credential_type: "Cert".into(),
                expires_at: clock.now() + Duration::days(1),
                metadata_uri: String::new(),
            })
            .await
            .is_confirmed());
        assert!(submitter
            .submit(RegistryOp::RevokeCredential { caller: id(2), hash: hash(7) })
            .await
            .is_confirmed());

        assert!(registry.get_credential(&hash(7)).unwrap().revoked);
    }

    #[tokio::test]
    async fn receipts_are_stamped_by_the_registry_clock() {
        let (submitter, clock, _) = submitter();
        clock.advance(Duration::hours(3));

        let outcome = submitter
            .submit(RegistryOp::AddIssuer { caller: id(1), issuer: id(2) })
            .await;
        match outcome {
            SubmissionOutcome::Confirmed(receipt) => {
                assert_eq!(receipt.confirmed_at, clock.now());
            }
            other => panic!("expected confirmation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn distinct_receipts_per_submission() {
        let (submitter, _, _) = submitter();
        let a = submitter
            .submit(RegistryOp::AddIssuer { caller: id(1), issuer: id(2) })
            .await;
        let b = submitter
            .submit(RegistryOp::AddIssuer { caller: id(1), issuer: id(3) })
            .await;
        match (a, b) {
            (SubmissionOutcome::Confirmed(ra), SubmissionOutcome::Confirmed(rb)) => {
                assert_ne!(ra.tx_id, rb.tx_id);
            }
            other => panic!("expected two confirmations, got {other:?}"),
        }
    }
}
