//! # Credential Ledger
//!
//! The append-only record of issued credentials, keyed by their 32-byte
//! hash. Records are written once at issuance; the sole permitted
//! mutation afterward is flipping the revocation flag, by the recorded
//! issuer, exactly once. Deletion does not exist.
//!
//! The ledger also maintains a subject index so "everything issued to
//! this address" is a map lookup, not a scan. Hashes in the index are in
//! issuance order and never leave it — revoked credentials stay listed,
//! their status is the verifier's problem.
//!
//! Authorization (is the caller allowed to issue at all?) is the issuer
//! registry's concern and is enforced a layer up, in
//! [`RegistryService`](crate::registry::service::RegistryService). The
//! ledger enforces the invariants of its own records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::crypto::CredentialHash;
use crate::identity::AttestId;
use crate::registry::error::RegistryError;

/// One credential as recorded on the ledger.
///
/// The ledger stores no claim content. Everything about the subject's
/// degree, grades, or honors lives off-chain behind `metadata_uri`; the
/// hash is the binding between the two.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialRecord {
    pub hash: CredentialHash,
    pub issuer: AttestId,
    pub subject: AttestId,

    /// Free-form type label, e.g. `"BachelorDegree"`. Bounded length,
    /// otherwise uninterpreted.
    pub credential_type: String,

    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,

    /// URI of the off-chain credential document. May be empty when the
    /// issuer chose not to bind metadata.
    pub metadata_uri: String,

    pub revoked: bool,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Append-only credential store with a subject index.
#[derive(Debug, Clone, Default)]
pub struct CredentialLedger {
    records: HashMap<CredentialHash, CredentialRecord>,
    subject_index: HashMap<AttestId, Vec<CredentialHash>>,
}

impl CredentialLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from persisted records and a persisted subject
    /// index, keeping the original issuance order per subject.
    ///
    /// This is the restart path, so the issuance-time guards do not apply:
    /// a record whose expiry has since passed is loaded as-is and reports
    /// expired on verification, exactly as it would have without the
    /// restart. Index entries whose hash has no record are dropped.
    pub fn from_records(
        records: impl IntoIterator<Item = CredentialRecord>,
        subject_index: impl IntoIterator<Item = (AttestId, Vec<CredentialHash>)>,
    ) -> Self {
        let records: HashMap<CredentialHash, CredentialRecord> =
            records.into_iter().map(|record| (record.hash, record)).collect();
        let subject_index = subject_index
            .into_iter()
            .map(|(subject, hashes)| {
                let hashes = hashes
                    .into_iter()
                    .filter(|hash| records.contains_key(hash))
                    .collect();
                (subject, hashes)
            })
            .collect();
        Self {
            records,
            subject_index,
        }
    }

    /// Record a new credential.
    ///
    /// Fails closed on a duplicate hash or a non-future expiry; on
    /// failure neither the record map nor the subject index changes.
    /// `issued_at` is always `now` as observed here, never
    /// caller-supplied.
    #[allow(clippy::too_many_arguments)]
    pub fn issue(
        &mut self,
        issuer: AttestId,
        hash: CredentialHash,
        subject: AttestId,
        credential_type: String,
        expires_at: DateTime<Utc>,
        metadata_uri: String,
        now: DateTime<Utc>,
    ) -> Result<&CredentialRecord, RegistryError> {
        if self.records.contains_key(&hash) {
            return Err(RegistryError::DuplicateCredential(hash));
        }
        if expires_at <= now {
            return Err(RegistryError::InvalidExpiry { expires_at, now });
        }

        let record = CredentialRecord {
            hash,
            issuer,
            subject: subject.clone(),
            credential_type,
            issued_at: now,
            expires_at,
            metadata_uri,
            revoked: false,
            revoked_at: None,
        };

        self.subject_index.entry(subject).or_default().push(hash);
        Ok(self.records.entry(hash).or_insert(record))
    }

    /// Revoke a credential.
    ///
    /// Only the identity recorded as the credential's issuer may revoke
    /// it. The registry owner gets no special power here, and neither
    /// does a currently-authorized issuer who didn't issue this
    /// particular credential.
    pub fn revoke(
        &mut self,
        caller: &AttestId,
        hash: &CredentialHash,
        now: DateTime<Utc>,
    ) -> Result<&CredentialRecord, RegistryError> {
        let record = self
            .records
            .get_mut(hash)
            .ok_or(RegistryError::CredentialNotFound(*hash))?;

        if &record.issuer != caller {
            return Err(RegistryError::Unauthorized {
                operation: "revoke credential",
                caller: caller.clone(),
            });
        }
        if record.revoked {
            return Err(RegistryError::AlreadyRevoked(*hash));
        }

        record.revoked = true;
        record.revoked_at = Some(now);
        Ok(record)
    }

    pub fn get(&self, hash: &CredentialHash) -> Option<&CredentialRecord> {
        self.records.get(hash)
    }

    pub fn contains(&self, hash: &CredentialHash) -> bool {
        self.records.contains_key(hash)
    }

    /// All credential hashes issued to `subject`, in issuance order.
    /// Includes revoked and expired entries; an unknown subject yields
    /// an empty slice.
    pub fn credentials_by_subject(&self, subject: &AttestId) -> &[CredentialHash] {
        self.subject_index
            .get(subject)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Count of revoked credentials, for gauges.
    pub fn revoked_count(&self) -> usize {
        self.records.values().filter(|r| r.revoked).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::AttestKeypair;
    use chrono::Duration;

    fn id(seed: u8) -> AttestId {
        let kp = AttestKeypair::from_seed(&[seed; 32]);
        AttestId::from_public_key(&kp.public_key())
    }

    fn hash(byte: u8) -> CredentialHash {
        CredentialHash::from_bytes([byte; 32])
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn issue_simple(ledger: &mut CredentialLedger, issuer: &AttestId, h: CredentialHash) {
        ledger
            .issue(
                issuer.clone(),
                h,
                id(50),
                "BachelorDegree".into(),
                t0() + Duration::days(365),
                "cas://abc".into(),
                t0(),
            )
            .unwrap();
    }

    #[test]
    fn issue_records_all_fields() {
        let mut ledger = CredentialLedger::new();
        let issuer = id(1);
        let subject = id(2);
        let record = ledger
            .issue(
                issuer.clone(),
                hash(7),
                subject.clone(),
                "MasterDegree".into(),
                t0() + Duration::days(30),
                "cas://meta".into(),
                t0(),
            )
            .unwrap()
            .clone();

        assert_eq!(record.issuer, issuer);
        assert_eq!(record.subject, subject);
        assert_eq!(record.issued_at, t0());
        assert!(!record.revoked);
        assert_eq!(record.revoked_at, None);
        assert_eq!(ledger.credentials_by_subject(&subject), &[hash(7)]);
    }

    #[test]
    fn duplicate_hash_rejected_even_for_same_issuer() {
        let mut ledger = CredentialLedger::new();
        let issuer = id(1);
        issue_simple(&mut ledger, &issuer, hash(7));

        let err = ledger
            .issue(
                issuer,
                hash(7),
                id(3),
                "Other".into(),
                t0() + Duration::days(1),
                String::new(),
                t0(),
            )
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateCredential(_)));
        assert_eq!(ledger.len(), 1);
        // Failed issuance must not touch the subject index either.
        assert!(ledger.credentials_by_subject(&id(3)).is_empty());
    }

    #[test]
    fn expiry_must_be_strictly_future() {
        let mut ledger = CredentialLedger::new();
        let err = ledger
            .issue(id(1), hash(7), id(2), "X".into(), t0(), String::new(), t0())
            .unwrap_err();
        assert!(matches!(err, RegistryError::InvalidExpiry { .. }));
        assert!(ledger.is_empty());

        // One second ahead is enough.
        assert!(ledger
            .issue(
                id(1),
                hash(7),
                id(2),
                "X".into(),
                t0() + Duration::seconds(1),
                String::new(),
                t0()
            )
            .is_ok());
    }

    #[test]
    fn revoke_by_issuer() {
        let mut ledger = CredentialLedger::new();
        let issuer = id(1);
        issue_simple(&mut ledger, &issuer, hash(7));

        let later = t0() + Duration::hours(2);
        let record = ledger.revoke(&issuer, &hash(7), later).unwrap();
        assert!(record.revoked);
        assert_eq!(record.revoked_at, Some(later));
    }

    #[test]
    fn revoke_by_other_identity_rejected() {
        let mut ledger = CredentialLedger::new();
        let issuer = id(1);
        issue_simple(&mut ledger, &issuer, hash(7));

        let err = ledger.revoke(&id(9), &hash(7), t0()).unwrap_err();
        assert!(matches!(err, RegistryError::Unauthorized { .. }));
        assert!(!ledger.get(&hash(7)).unwrap().revoked);
    }

    #[test]
    fn revoke_unknown_hash_rejected() {
        let mut ledger = CredentialLedger::new();
        let err = ledger.revoke(&id(1), &hash(7), t0()).unwrap_err();
        assert!(matches!(err, RegistryError::CredentialNotFound(_)));
    }

    #[test]
    fn double_revoke_rejected() {
        let mut ledger = CredentialLedger::new();
        let issuer = id(1);
        issue_simple(&mut ledger, &issuer, hash(7));
        ledger.revoke(&issuer, &hash(7), t0()).unwrap();

        let first_revoked_at = ledger.get(&hash(7)).unwrap().revoked_at;
        let err = ledger
            .revoke(&issuer, &hash(7), t0() + Duration::hours(1))
            .unwrap_err();
        assert!(matches!(err, RegistryError::AlreadyRevoked(_)));
        assert_eq!(ledger.get(&hash(7)).unwrap().revoked_at, first_revoked_at);
    }

    #[test]
    fn subject_index_preserves_issuance_order_and_revoked_entries() {
        let mut ledger = CredentialLedger::new();
        let issuer = id(1);
        let subject = id(2);
        for byte in [10u8, 11, 12] {
            ledger
                .issue(
                    issuer.clone(),
                    hash(byte),
                    subject.clone(),
                    "Cert".into(),
                    t0() + Duration::days(1),
                    String::new(),
                    t0(),
                )
                .unwrap();
        }
        ledger.revoke(&issuer, &hash(11), t0()).unwrap();

        assert_eq!(
            ledger.credentials_by_subject(&subject),
            &[hash(10), hash(11), hash(12)]
        );
    }

    #[test]
    fn unknown_subject_yields_empty() {
        let ledger = CredentialLedger::new();
        assert!(ledger.credentials_by_subject(&id(42)).is_empty());
    }

    #[test]
    fn revoked_count() {
        let mut ledger = CredentialLedger::new();
        let issuer = id(1);
        issue_simple(&mut ledger, &issuer, hash(1));
        issue_simple(&mut ledger, &issuer, hash(2));
        ledger.revoke(&issuer, &hash(1), t0()).unwrap();
        assert_eq!(ledger.revoked_count(), 1);
        assert_eq!(ledger.len(), 2);
    }
}
