//! # Off-chain Metadata Store
//!
//! Content-addressed storage for credential documents. The ledger stores
//! a URI, the store holds the bytes, and the address *is* the BLAKE3
//! hash of those bytes:
//!
//! ```text
//! cas://<64 hex chars of blake3(content)>
//! ```
//!
//! Because the address commits to the content, a reader can always
//! detect a swapped or corrupted document. [`verify_binding`] does
//! exactly that check.
//!
//! [`MetadataStore`] is the seam; [`ContentStore`] is the in-memory
//! implementation used by the node. A deployment backed by IPFS or an
//! object store implements the same trait.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::crypto::blake3_hash;

/// URI scheme for content-addressed documents.
const CAS_SCHEME: &str = "cas://";

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("no document stored at {0}")]
    NotFound(String),

    #[error("URI '{0}' is not a cas:// content address")]
    MalformedUri(String),

    #[error("content at {uri} does not match its address")]
    BindingMismatch { uri: String },

    #[error("document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Content-addressed document storage.
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Store raw bytes, returning their `cas://` address.
    async fn put(&self, content: Vec<u8>) -> Result<String, MetadataError>;

    /// Fetch the bytes behind an address, re-checking the content hash.
    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, MetadataError>;
}

/// Serialize a document to canonical JSON and store it.
pub async fn put_json<T: Serialize + Sync>(
    store: &dyn MetadataStore,
    document: &T,
) -> Result<String, MetadataError> {
    let bytes = serde_json::to_vec(document)?;
    store.put(bytes).await
}

/// Fetch and deserialize a JSON document.
pub async fn fetch_json<T: DeserializeOwned>(
    store: &dyn MetadataStore,
    uri: &str,
) -> Result<T, MetadataError> {
    let bytes = store.fetch(uri).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Check that `content` is the document a `cas://` URI commits to.
///
/// Pure; needs no store access. This is the offline half of the
/// metadata binding: anyone holding the document and the URI from a
/// verification report can run it.
pub fn verify_binding(uri: &str, content: &[u8]) -> Result<(), MetadataError> {
    let expected = parse_cas_uri(uri)?;
    if blake3_hash(content) != expected {
        return Err(MetadataError::BindingMismatch { uri: uri.to_string() });
    }
    Ok(())
}

fn cas_uri_for(content: &[u8]) -> String {
    format!("{CAS_SCHEME}{}", hex::encode(blake3_hash(content)))
}

fn parse_cas_uri(uri: &str) -> Result<[u8; 32], MetadataError> {
    let hex_part = uri
        .strip_prefix(CAS_SCHEME)
        .ok_or_else(|| MetadataError::MalformedUri(uri.to_string()))?;
    let bytes = hex::decode(hex_part).map_err(|_| MetadataError::MalformedUri(uri.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| MetadataError::MalformedUri(uri.to_string()))
}

/// In-memory content-addressed store.
///
/// Put is idempotent by construction: storing the same bytes twice
/// yields the same address and one entry.
#[derive(Clone, Default)]
pub struct ContentStore {
    documents: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.documents.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.read().is_empty()
    }
}

#[async_trait]
impl MetadataStore for ContentStore {
    async fn put(&self, content: Vec<u8>) -> Result<String, MetadataError> {
        let uri = cas_uri_for(&content);
        debug!(uri = %uri, bytes = content.len(), "storing metadata document");
        self.documents.write().insert(uri.clone(), content);
        Ok(uri)
    }

    async fn fetch(&self, uri: &str) -> Result<Vec<u8>, MetadataError> {
        let content = self
            .documents
            .read()
            .get(uri)
            .cloned()
            .ok_or_else(|| MetadataError::NotFound(uri.to_string()))?;
        // Trust nothing, not even our own map.
        verify_binding(uri, &content)?;
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_fetch_roundtrip() {
        let store = ContentStore::new();
        let uri = store.put(b"credential document".to_vec()).await.unwrap();
        assert!(uri.starts_with("cas://"));
        assert_eq!(uri.len(), CAS_SCHEME.len() + 64);

        let content = store.fetch(&uri).await.unwrap();
        assert_eq!(content, b"credential document");
    }

    #[tokio::test]
    async fn put_is_idempotent() {
        let store = ContentStore::new();
        let a = store.put(b"same".to_vec()).await.unwrap();
        let b = store.put(b"same".to_vec()).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn missing_uri_is_not_found() {
        let store = ContentStore::new();
        let uri = cas_uri_for(b"never stored");
        assert!(matches!(
            store.fetch(&uri).await,
            Err(MetadataError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn json_helpers_roundtrip() {
        #[derive(serde::Serialize, serde::Deserialize, PartialEq, Debug)]
        struct Doc {
            name: String,
            value: u32,
        }

        let store = ContentStore::new();
        let doc = Doc { name: "degree".into(), value: 7 };
        let uri = put_json(&store, &doc).await.unwrap();
        let back: Doc = fetch_json(&store, &uri).await.unwrap();
        assert_eq!(doc, back);
    }

    #[test]
    fn binding_check_accepts_matching_content() {
        let content = b"bound document";
        let uri = cas_uri_for(content);
        assert!(verify_binding(&uri, content).is_ok());
    }

    #[test]
    fn binding_check_rejects_tampered_content() {
        let uri = cas_uri_for(b"original");
        assert!(matches!(
            verify_binding(&uri, b"tampered"),
            Err(MetadataError::BindingMismatch { .. })
        ));
    }

    #[test]
    fn malformed_uris_rejected() {
        assert!(matches!(
            verify_binding("https://example.org/doc", b"x"),
            Err(MetadataError::MalformedUri(_))
        ));
        assert!(matches!(
            verify_binding("cas://nothex", b"x"),
            Err(MetadataError::MalformedUri(_))
        ));
        assert!(matches!(
            verify_binding("cas://abcd", b"x"),
            Err(MetadataError::MalformedUri(_))
        ));
    }
}
