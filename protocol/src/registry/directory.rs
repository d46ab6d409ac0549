//! # DID Directory
//!
//! Maps ledger addresses to their registered DID documents. Registration
//! is strictly single-use: once an address has claimed its DID, no
//! update, replacement, or deletion path exists. The first registration
//! is the permanent one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::identity::{AttestId, DidDocument, DidError};
use crate::registry::error::RegistryError;

/// A registered DID and its document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DidRecord {
    /// The address that owns this DID.
    pub owner: AttestId,

    /// The document as registered. Never mutated afterward.
    pub document: DidDocument,

    pub created_at: DateTime<Utc>,

    /// Registered DIDs are always active; the field exists so the record
    /// shape doesn't break if deactivation is ever introduced.
    pub active: bool,
}

/// The single-use address-to-DID mapping.
#[derive(Debug, Clone, Default)]
pub struct DidDirectory {
    records: HashMap<AttestId, DidRecord>,
}

impl DidDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a directory from persisted records. The records were
    /// validated when first registered, so none of that re-runs here.
    pub fn from_records(records: impl IntoIterator<Item = DidRecord>) -> Self {
        Self {
            records: records
                .into_iter()
                .map(|record| (record.owner.clone(), record))
                .collect(),
        }
    }

    /// Register a DID document for `owner`.
    ///
    /// The document must validate structurally and its subject must be
    /// the owner's own DID; you cannot register a document describing
    /// someone else. A second registration for the same address fails
    /// with [`RegistryError::AlreadyRegistered`] regardless of content —
    /// even re-submitting the identical document.
    pub fn register(
        &mut self,
        owner: AttestId,
        document: DidDocument,
        now: DateTime<Utc>,
    ) -> Result<(), DirectoryError> {
        if self.records.contains_key(&owner) {
            return Err(RegistryError::AlreadyRegistered(owner).into());
        }

        let did = document.validate()?;
        if did.identity() != &owner {
            return Err(DidError::InvalidDocument(format!(
                "document subject {} does not match registering address {}",
                did,
                owner.to_address()
            ))
            .into());
        }

        self.records.insert(
            owner.clone(),
            DidRecord {
                owner,
                document,
                created_at: now,
                active: true,
            },
        );
        Ok(())
    }

    /// Look up the record for an address.
    pub fn get(&self, owner: &AttestId) -> Option<&DidRecord> {
        self.records.get(owner)
    }

    /// Like [`get`](Self::get), but an absent record is an error. For
    /// call sites where the DID is required to exist.
    pub fn require(&self, owner: &AttestId) -> Result<&DidRecord, RegistryError> {
        self.records
            .get(owner)
            .ok_or_else(|| RegistryError::DidNotFound(owner.clone()))
    }

    pub fn is_registered(&self, owner: &AttestId) -> bool {
        self.records.contains_key(owner)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Registration can fail either as a registry rule violation or as a
/// document problem; both surface here.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Document(#[from] DidError),
}
