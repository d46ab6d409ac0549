//! # Issuer Authorization Registry
//!
//! The owner-gated allow-list of identities permitted to issue
//! credentials. One owner, fixed at construction; the owner alone may add
//! or remove issuers. Authorization changes are prospective only — they
//! gate *future* issuance and never touch credentials already on the
//! ledger.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::identity::AttestId;
use crate::registry::error::RegistryError;

/// Bookkeeping for one issuer's authorization history.
///
/// De-authorized issuers keep their entry (with `authorized = false`) so
/// the record of when they were granted and stripped survives. An issuer
/// re-added later gets a fresh `granted_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuerEntry {
    pub authorized: bool,
    pub granted_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Owner-gated issuer allow-list.
#[derive(Debug, Clone)]
pub struct IssuerRegistry {
    owner: AttestId,
    issuers: HashMap<AttestId, IssuerEntry>,
}

impl IssuerRegistry {
    /// Create a registry with the given owner. The owner is set once and
    /// never changes; ownership transfer is deliberately unsupported.
    pub fn new(owner: AttestId) -> Self {
        Self {
            owner,
            issuers: HashMap::new(),
        }
    }

    /// Rebuild a registry from persisted entries, as when a node reloads
    /// its mirror at startup. Entries are previously committed state and
    /// bypass the owner check.
    pub fn from_entries(
        owner: AttestId,
        entries: impl IntoIterator<Item = (AttestId, IssuerEntry)>,
    ) -> Self {
        Self {
            owner,
            issuers: entries.into_iter().collect(),
        }
    }

    pub fn owner(&self) -> &AttestId {
        &self.owner
    }

    fn require_owner(&self, caller: &AttestId, operation: &'static str) -> Result<(), RegistryError> {
        if caller != &self.owner {
            return Err(RegistryError::Unauthorized {
                operation,
                caller: caller.clone(),
            });
        }
        Ok(())
    }

    /// Authorize an issuer. Owner only.
    ///
    /// Idempotent: adding an already-authorized issuer succeeds and
    /// changes nothing, not even `granted_at`. Returns whether the call
    /// actually changed state, so callers can skip emitting events for
    /// no-ops.
    pub fn add_issuer(
        &mut self,
        caller: &AttestId,
        issuer: AttestId,
        now: DateTime<Utc>,
    ) -> Result<bool, RegistryError> {
        self.require_owner(caller, "add issuer")?;

        match self.issuers.get_mut(&issuer) {
            Some(entry) if entry.authorized => Ok(false),
            Some(entry) => {
                entry.authorized = true;
                entry.granted_at = now;
                entry.revoked_at = None;
                Ok(true)
            }
            None => {
                self.issuers.insert(
                    issuer,
                    IssuerEntry {
                        authorized: true,
                        granted_at: now,
                        revoked_at: None,
                    },
                );
                Ok(true)
            }
        }
    }

    /// De-authorize an issuer. Owner only, idempotent like `add_issuer`.
    ///
    /// Removing an unknown issuer is a successful no-op rather than an
    /// error; the post-condition ("this identity cannot issue") already
    /// holds.
    pub fn remove_issuer(
        &mut self,
        caller: &AttestId,
        issuer: &AttestId,
        now: DateTime<Utc>,
    ) -> Result<bool, RegistryError> {
        self.require_owner(caller, "remove issuer")?;

        match self.issuers.get_mut(issuer) {
            Some(entry) if entry.authorized => {
                entry.authorized = false;
                entry.revoked_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Whether this identity is currently authorized to issue.
    pub fn is_issuer(&self, id: &AttestId) -> bool {
        self.issuers.get(id).map(|e| e.authorized).unwrap_or(false)
    }

    /// The authorization entry for an identity, if one was ever created.
    pub fn entry(&self, id: &AttestId) -> Option<&IssuerEntry> {
        self.issuers.get(id)
    }

    /// Count of currently authorized issuers.
    pub fn authorized_count(&self) -> usize {
        self.issuers.values().filter(|e| e.authorized).count()
    }
}
