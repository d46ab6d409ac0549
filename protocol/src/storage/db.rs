//! # Registry Database
//!
//! A sled-backed mirror of registry state. The in-memory
//! [`RegistryService`](crate::registry::RegistryService) remains the
//! source of truth for every decision; this database is a durable copy
//! maintained by consuming [`RegistryEvent`]s. At startup a node reads
//! the whole mirror back with [`RegistryDb::snapshot`] and seeds the
//! service from it, so the ledger resumes instead of starting blank.
//!
//! ## Layout
//!
//! Four trees, each keyed by 32 raw bytes, values bincode-encoded:
//!
//! | tree            | key                | value                  |
//! |-----------------|--------------------|------------------------|
//! | `credentials`   | credential hash    | [`CredentialRecord`]   |
//! | `dids`          | owner key hash     | [`DidRecord`]          |
//! | `issuers`       | issuer key hash    | [`IssuerEntry`]        |
//! | `subject_index` | subject key hash   | `Vec<CredentialHash>`  |

use serde::{de::DeserializeOwned, Serialize};
use sled::{Db, Tree};
use std::path::Path;
use thiserror::Error;
use tracing::{error, info};

use crate::config::REGISTRY_SCHEMA_VERSION;
use crate::crypto::CredentialHash;
use crate::identity::AttestId;
use crate::registry::{
    CredentialRecord, DidRecord, IssuerEntry, MirrorSink, RegistryEvent, RegistrySnapshot,
};

const TREE_CREDENTIALS: &str = "credentials";
const TREE_DIDS: &str = "dids";
const TREE_ISSUERS: &str = "issuers";
const TREE_SUBJECT_INDEX: &str = "subject_index";
const SCHEMA_VERSION_KEY: &[u8] = b"schema_version";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sled(#[from] sled::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("database was written by schema version {found}, this build expects {expected}")]
    SchemaMismatch { found: u32, expected: u32 },

    #[error("tree key has length {0}, expected 32")]
    MalformedKey(usize),
}

/// Durable mirror of the registry, one sled database with four trees.
pub struct RegistryDb {
    db: Db,
    credentials: Tree,
    dids: Tree,
    issuers: Tree,
    subject_index: Tree,
}

impl RegistryDb {
    /// Open (or create) the database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref())?;
        info!(path = %path.as_ref().display(), "registry database opened");
        Self::from_sled(db)
    }

    /// Open a throwaway in-memory database. Used by tests and `--dev`
    /// runs; nothing survives the process.
    pub fn open_temporary() -> Result<Self, StorageError> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_sled(db)
    }

    fn from_sled(db: Db) -> Result<Self, StorageError> {
        match db.get(SCHEMA_VERSION_KEY)? {
            Some(bytes) => {
                let found: u32 = bincode::deserialize(&bytes)?;
                if found != REGISTRY_SCHEMA_VERSION {
                    return Err(StorageError::SchemaMismatch {
                        found,
                        expected: REGISTRY_SCHEMA_VERSION,
                    });
                }
            }
            None => {
                db.insert(SCHEMA_VERSION_KEY, bincode::serialize(&REGISTRY_SCHEMA_VERSION)?)?;
            }
        }
        Ok(Self {
            credentials: db.open_tree(TREE_CREDENTIALS)?,
            dids: db.open_tree(TREE_DIDS)?,
            issuers: db.open_tree(TREE_ISSUERS)?,
            subject_index: db.open_tree(TREE_SUBJECT_INDEX)?,
            db,
        })
    }

    fn put<T: Serialize>(tree: &Tree, key: &[u8; 32], value: &T) -> Result<(), StorageError> {
        tree.insert(key, bincode::serialize(value)?)?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(tree: &Tree, key: &[u8; 32]) -> Result<Option<T>, StorageError> {
        match tree.get(key)? {
            Some(bytes) => Ok(Some(bincode::deserialize(&bytes)?)),
            None => Ok(None),
        }
    }

    fn key_hash(bytes: &[u8]) -> Result<[u8; 32], StorageError> {
        bytes
            .try_into()
            .map_err(|_| StorageError::MalformedKey(bytes.len()))
    }

    /// Apply one committed event. Errors bubble up here; the
    /// [`MirrorSink`] impl wraps this and logs instead.
    pub fn apply_event(&self, event: &RegistryEvent) -> Result<(), StorageError> {
        match event {
            RegistryEvent::IssuerAdded { issuer, entry }
            | RegistryEvent::IssuerRemoved { issuer, entry } => {
                Self::put(&self.issuers, issuer.key_hash(), entry)
            }
            RegistryEvent::DidRegistered { record } => {
                Self::put(&self.dids, record.owner.key_hash(), record)
            }
            RegistryEvent::CredentialIssued { record } => {
                Self::put(&self.credentials, record.hash.as_bytes(), record)?;
                let mut hashes: Vec<CredentialHash> = Self::get(
                    &self.subject_index,
                    record.subject.key_hash(),
                )?
                .unwrap_or_default();
                // Duplicate hashes cannot reach a sink, but an event
                // replay after partial recovery can.
                if !hashes.contains(&record.hash) {
                    hashes.push(record.hash);
                }
                Self::put(&self.subject_index, record.subject.key_hash(), &hashes)
            }
            RegistryEvent::CredentialRevoked { record } => {
                Self::put(&self.credentials, record.hash.as_bytes(), record)
            }
        }
    }

    pub fn credential(&self, hash: &CredentialHash) -> Result<Option<CredentialRecord>, StorageError> {
        Self::get(&self.credentials, hash.as_bytes())
    }

    pub fn did(&self, owner: &AttestId) -> Result<Option<DidRecord>, StorageError> {
        Self::get(&self.dids, owner.key_hash())
    }

    pub fn issuer_entry(&self, issuer: &AttestId) -> Result<Option<IssuerEntry>, StorageError> {
        Self::get(&self.issuers, issuer.key_hash())
    }

    pub fn credentials_by_subject(
        &self,
        subject: &AttestId,
    ) -> Result<Vec<CredentialHash>, StorageError> {
        Ok(Self::get(&self.subject_index, subject.key_hash())?.unwrap_or_default())
    }

    /// All stored credential records, for restart reload.
    pub fn all_credentials(&self) -> Result<Vec<CredentialRecord>, StorageError> {
        self.credentials
            .iter()
            .map(|item| {
                let (_, bytes) = item?;
                Ok(bincode::deserialize(&bytes)?)
            })
            .collect()
    }

    /// All stored DID records.
    pub fn all_dids(&self) -> Result<Vec<DidRecord>, StorageError> {
        self.dids
            .iter()
            .map(|item| {
                let (_, bytes) = item?;
                Ok(bincode::deserialize(&bytes)?)
            })
            .collect()
    }

    /// All stored issuer entries, with identities rebuilt from the tree
    /// keys.
    pub fn all_issuers(&self) -> Result<Vec<(AttestId, IssuerEntry)>, StorageError> {
        self.issuers
            .iter()
            .map(|item| {
                let (key, bytes) = item?;
                let issuer = AttestId::from_key_hash(Self::key_hash(&key)?);
                Ok((issuer, bincode::deserialize(&bytes)?))
            })
            .collect()
    }

    /// Read the whole mirror back into a snapshot.
    ///
    /// This is what a restarting node feeds to
    /// [`RegistryService::restore`](crate::registry::RegistryService::restore)
    /// before it starts accepting writes.
    pub fn snapshot(&self) -> Result<RegistrySnapshot, StorageError> {
        let mut subject_index = Vec::new();
        for item in self.subject_index.iter() {
            let (key, bytes) = item?;
            let subject = AttestId::from_key_hash(Self::key_hash(&key)?);
            subject_index.push((subject, bincode::deserialize(&bytes)?));
        }
        Ok(RegistrySnapshot {
            credentials: self.all_credentials()?,
            dids: self.all_dids()?,
            issuers: self.all_issuers()?,
            subject_index,
        })
    }

    /// Flush sled's write buffer to disk.
    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

impl MirrorSink for RegistryDb {
    fn apply(&self, event: &RegistryEvent) {
        if let Err(e) = self.apply_event(event) {
            // The in-memory registry has already committed; a mirror
            // failure is an operational problem, not a rejection.
            error!(kind = event.kind(), error = %e, "failed to mirror registry event");
        }
    }
}
