//! In-process certificate store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::SparkResult;
use crate::types::{CertificateId, CertificateRecord};

use super::CertificateStore;

/// Certificate store held in memory. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryCertificateStore {
    inner: Arc<RwLock<HashMap<CertificateId, Vec<u8>>>>,
}

impl MemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `records`.
    pub fn with_records(records: impl IntoIterator<Item = CertificateRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.id, r.pem)).collect();
        Self {
            inner: Arc::new(RwLock::new(map)),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    pub async fn contains(&self, id: &CertificateId) -> bool {
        self.inner.read().await.contains_key(id)
    }
}

#[async_trait]
impl CertificateStore for MemoryCertificateStore {
    async fn get(&self, id: &CertificateId) -> SparkResult<Option<CertificateRecord>> {
        let map = self.inner.read().await;
        Ok(map
            .get(id)
            .map(|pem| CertificateRecord::new(id.clone(), pem.clone())))
    }

    async fn put(&self, id: &CertificateId, record: &CertificateRecord) -> SparkResult<()> {
        let mut map = self.inner.write().await;
        map.insert(id.clone(), record.pem.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_shared_between_clones() {
        let store = MemoryCertificateStore::new();
        let other = store.clone();
        let id = CertificateId::parse("m1").unwrap();

        store
            .put(&id, &CertificateRecord::new(id.clone(), b"pem".to_vec()))
            .await
            .unwrap();

        assert!(other.contains(&id).await);
        assert_eq!(other.get(&id).await.unwrap().unwrap().pem, b"pem");
        assert_eq!(other.len().await, 1);
    }

    #[tokio::test]
    async fn test_memory_store_with_records() {
        let id = CertificateId::parse("seed").unwrap();
        let store =
            MemoryCertificateStore::with_records([CertificateRecord::new(id.clone(), b"x".to_vec())]);
        assert!(store.get(&id).await.unwrap().is_some());
        assert!(!store.is_empty().await);
    }
}
