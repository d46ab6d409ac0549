//! # Registry Service
//!
//! The concurrency and composition layer over the three core structures:
//! issuer registry, DID directory, and credential ledger. All three live
//! behind one `RwLock`, so every mutation sees and produces a consistent
//! snapshot — there is no window where a credential exists but its
//! issuer's authorization is still being decided.
//!
//! Writes take the write lock, validate, and either commit fully or
//! change nothing. Reads take the read lock and run concurrently with
//! each other; verification under load is limited by lock handoff, not
//! by other readers.
//!
//! Time enters exactly once per operation, from the injected [`Clock`],
//! and is threaded down into the pure structures. Committed mutations are
//! echoed to any attached [`MirrorSink`]s after the fact; sinks observe
//! the ledger, they never participate in deciding a write.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::clock::Clock;
use crate::config::{MAX_CREDENTIAL_TYPE_LENGTH, MAX_METADATA_URI_LENGTH};
use crate::crypto::CredentialHash;
use crate::identity::{AttestId, DidDocument};
use crate::registry::directory::{DidDirectory, DidRecord, DirectoryError};
use crate::registry::error::RegistryError;
use crate::registry::issuers::{IssuerEntry, IssuerRegistry};
use crate::registry::ledger::{CredentialLedger, CredentialRecord};
use crate::registry::verify::{self, AuthorizationPolicy, CredentialStatus, VerificationReport};

/// A committed state change, emitted to mirror sinks post-commit.
///
/// Events carry full records rather than deltas so a sink can be rebuilt
/// from the event stream alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RegistryEvent {
    IssuerAdded {
        issuer: AttestId,
        entry: IssuerEntry,
    },
    IssuerRemoved {
        issuer: AttestId,
        entry: IssuerEntry,
    },
    DidRegistered {
        record: DidRecord,
    },
    CredentialIssued {
        record: CredentialRecord,
    },
    CredentialRevoked {
        record: CredentialRecord,
    },
}

impl RegistryEvent {
    /// Short label for logs and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            RegistryEvent::IssuerAdded { .. } => "issuer_added",
            RegistryEvent::IssuerRemoved { .. } => "issuer_removed",
            RegistryEvent::DidRegistered { .. } => "did_registered",
            RegistryEvent::CredentialIssued { .. } => "credential_issued",
            RegistryEvent::CredentialRevoked { .. } => "credential_revoked",
        }
    }
}

/// Receives committed registry events, e.g. to mirror them into sled.
///
/// Sinks run after the in-memory commit and outside the write lock's
/// critical decisions: a sink cannot veto a write, and a sink failure
/// must be absorbed internally (log it, count it) rather than panicking.
pub trait MirrorSink: Send + Sync {
    fn apply(&self, event: &RegistryEvent);
}

/// Construction-time parameters for a [`RegistryService`].
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// The identity allowed to manage the issuer list.
    pub owner: AttestId,

    /// How verification treats issuer de-authorization.
    pub authorization_policy: AuthorizationPolicy,
}

impl RegistryConfig {
    pub fn new(owner: AttestId) -> Self {
        Self {
            owner,
            authorization_policy: AuthorizationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: AuthorizationPolicy) -> Self {
        self.authorization_policy = policy;
        self
    }
}

/// The combined mutable state, guarded as one unit.
struct RegistryState {
    issuers: IssuerRegistry,
    directory: DidDirectory,
    ledger: CredentialLedger,
}

/// The full registry contents as read back from a mirror.
///
/// A restarted node feeds one of these to [`RegistryService::restore`] so
/// the ledger resumes where it left off instead of starting blank. The
/// snapshot is trusted as previously committed state; none of the
/// issuance-time checks re-run on it.
#[derive(Debug, Clone, Default)]
pub struct RegistrySnapshot {
    pub credentials: Vec<CredentialRecord>,
    pub dids: Vec<DidRecord>,
    pub issuers: Vec<(AttestId, IssuerEntry)>,
    /// Per-subject hash lists in original issuance order.
    pub subject_index: Vec<(AttestId, Vec<CredentialHash>)>,
}

impl RegistrySnapshot {
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty() && self.dids.is_empty() && self.issuers.is_empty()
    }
}

/// Point-in-time counters for gauges and status endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub credentials: usize,
    pub revoked_credentials: usize,
    pub registered_dids: usize,
    pub authorized_issuers: usize,
}

/// Thread-safe registry handle. Cheap to clone, shared via `Arc` inside.
#[derive(Clone)]
pub struct RegistryService {
    state: Arc<RwLock<RegistryState>>,
    clock: Arc<dyn Clock>,
    policy: AuthorizationPolicy,
    sinks: Arc<Vec<Box<dyn MirrorSink>>>,
}

impl RegistryService {
    pub fn new(config: RegistryConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_sinks(config, clock, Vec::new())
    }

    pub fn with_sinks(
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
        sinks: Vec<Box<dyn MirrorSink>>,
    ) -> Self {
        info!(
            owner = %config.owner,
            policy = ?config.authorization_policy,
            "registry service starting"
        );
        Self::build(config, clock, sinks, RegistrySnapshot::default())
    }

    /// Start from previously committed state instead of an empty registry.
    ///
    /// This is the restart path: the node reads its sled mirror back into a
    /// [`RegistrySnapshot`] and seeds the in-memory structures from it
    /// before accepting any writes, so anchored credentials keep verifying
    /// and their hashes stay taken across process restarts.
    pub fn restore(
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
        sinks: Vec<Box<dyn MirrorSink>>,
        snapshot: RegistrySnapshot,
    ) -> Self {
        info!(
            owner = %config.owner,
            policy = ?config.authorization_policy,
            credentials = snapshot.credentials.len(),
            dids = snapshot.dids.len(),
            issuers = snapshot.issuers.len(),
            "registry service resuming from mirrored state"
        );
        Self::build(config, clock, sinks, snapshot)
    }

    fn build(
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
        sinks: Vec<Box<dyn MirrorSink>>,
        snapshot: RegistrySnapshot,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(RegistryState {
                issuers: IssuerRegistry::from_entries(config.owner, snapshot.issuers),
                directory: DidDirectory::from_records(snapshot.dids),
                ledger: CredentialLedger::from_records(snapshot.credentials, snapshot.subject_index),
            })),
            clock,
            policy: config.authorization_policy,
            sinks: Arc::new(sinks),
        }
    }

    /// Handle to the service's time source.
    ///
    /// Callers that stamp artifacts alongside registry records, like
    /// transaction receipts or credential envelopes, draw time from here so
    /// their timestamps agree with the ledger's.
    pub fn clock(&self) -> Arc<dyn Clock> {
        self.clock.clone()
    }

    fn emit(&self, event: RegistryEvent) {
        debug!(kind = event.kind(), "registry event committed");
        for sink in self.sinks.iter() {
            sink.apply(&event);
        }
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // -----------------------------------------------------------------------
    // Issuer authorization
    // -----------------------------------------------------------------------

    /// Authorize `issuer`. Owner only; idempotent.
    pub fn add_issuer(&self, caller: &AttestId, issuer: AttestId) -> Result<(), RegistryError> {
        let now = self.now();
        let event = {
            let mut state = self.state.write();
            let changed = state.issuers.add_issuer(caller, issuer.clone(), now)?;
            changed.then(|| RegistryEvent::IssuerAdded {
                entry: state.issuers.entry(&issuer).cloned()
                    .unwrap_or(IssuerEntry { authorized: true, granted_at: now, revoked_at: None }),
                issuer,
            })
        };
        if let Some(event) = event {
            self.emit(event);
        }
        Ok(())
    }

    /// De-authorize `issuer`. Owner only; idempotent.
    pub fn remove_issuer(&self, caller: &AttestId, issuer: &AttestId) -> Result<(), RegistryError> {
        let now = self.now();
        let event = {
            let mut state = self.state.write();
            let changed = state.issuers.remove_issuer(caller, issuer, now)?;
            changed
                .then(|| state.issuers.entry(issuer).cloned())
                .flatten()
                .map(|entry| RegistryEvent::IssuerRemoved {
                    issuer: issuer.clone(),
                    entry,
                })
        };
        if let Some(event) = event {
            self.emit(event);
        }
        Ok(())
    }

    pub fn is_issuer(&self, id: &AttestId) -> bool {
        self.state.read().issuers.is_issuer(id)
    }

    pub fn owner(&self) -> AttestId {
        self.state.read().issuers.owner().clone()
    }

    // -----------------------------------------------------------------------
    // DID directory
    // -----------------------------------------------------------------------

    /// Register a DID document for `owner`. Single-use per address.
    pub fn register_did(
        &self,
        owner: AttestId,
        document: DidDocument,
    ) -> Result<DidRecord, DirectoryError> {
        let now = self.now();
        let record = {
            let mut state = self.state.write();
            state.directory.register(owner.clone(), document, now)?;
            state
                .directory
                .get(&owner)
                .cloned()
                .expect("record present immediately after successful registration")
        };
        info!(owner = %record.owner, "DID registered");
        self.emit(RegistryEvent::DidRegistered {
            record: record.clone(),
        });
        Ok(record)
    }

    pub fn did_record(&self, owner: &AttestId) -> Option<DidRecord> {
        self.state.read().directory.get(owner).cloned()
    }

    // -----------------------------------------------------------------------
    // Credential ledger
    // -----------------------------------------------------------------------

    /// Issue a credential.
    ///
    /// The caller must be a currently authorized issuer; the hash must be
    /// new; the expiry must be in the future; bounded fields must be
    /// within their limits. Any violation leaves the registry untouched.
    pub fn issue_credential(
        &self,
        caller: &AttestId,
        hash: CredentialHash,
        subject: AttestId,
        credential_type: String,
        expires_at: DateTime<Utc>,
        metadata_uri: String,
    ) -> Result<CredentialRecord, RegistryError> {
        if credential_type.len() > MAX_CREDENTIAL_TYPE_LENGTH {
            return Err(RegistryError::LimitExceeded {
                field: "credential_type",
                max: MAX_CREDENTIAL_TYPE_LENGTH,
                actual: credential_type.len(),
            });
        }
        if metadata_uri.len() > MAX_METADATA_URI_LENGTH {
            return Err(RegistryError::LimitExceeded {
                field: "metadata_uri",
                max: MAX_METADATA_URI_LENGTH,
                actual: metadata_uri.len(),
            });
        }

        let now = self.now();
        let record = {
            let mut state = self.state.write();
            if !state.issuers.is_issuer(caller) {
                return Err(RegistryError::NotAuthorizedIssuer {
                    caller: caller.clone(),
                });
            }
            state
                .ledger
                .issue(
                    caller.clone(),
                    hash,
                    subject,
                    credential_type,
                    expires_at,
                    metadata_uri,
                    now,
                )?
                .clone()
        };
        info!(hash = %record.hash, issuer = %record.issuer, subject = %record.subject, "credential issued");
        self.emit(RegistryEvent::CredentialIssued {
            record: record.clone(),
        });
        Ok(record)
    }

    /// Revoke a credential. Recorded issuer only.
    pub fn revoke_credential(
        &self,
        caller: &AttestId,
        hash: &CredentialHash,
    ) -> Result<CredentialRecord, RegistryError> {
        let now = self.now();
        let record = {
            let mut state = self.state.write();
            state.ledger.revoke(caller, hash, now)?.clone()
        };
        info!(hash = %record.hash, issuer = %record.issuer, "credential revoked");
        self.emit(RegistryEvent::CredentialRevoked {
            record: record.clone(),
        });
        Ok(record)
    }

    pub fn get_credential(&self, hash: &CredentialHash) -> Option<CredentialRecord> {
        self.state.read().ledger.get(hash).cloned()
    }

    /// Hashes issued to `subject`, in issuance order. Empty for unknown
    /// subjects.
    pub fn credentials_by_subject(&self, subject: &AttestId) -> Vec<CredentialHash> {
        self.state.read().ledger.credentials_by_subject(subject).to_vec()
    }

    // -----------------------------------------------------------------------
    // Verification
    // -----------------------------------------------------------------------

    /// Verify a credential hash at the current time. Read-only; many
    /// verifications proceed concurrently.
    pub fn verify_credential(
        &self,
        hash: &CredentialHash,
    ) -> (VerificationReport, CredentialStatus) {
        let now = self.now();
        let state = self.state.read();
        verify::verify(&state.ledger, &state.issuers, hash, self.policy, now)
    }

    pub fn stats(&self) -> RegistryStats {
        let state = self.state.read();
        RegistryStats {
            credentials: state.ledger.len(),
            revoked_credentials: state.ledger.revoked_count(),
            registered_dids: state.directory.len(),
            authorized_issuers: state.issuers.authorized_count(),
        }
    }
}
