//! Directory-backed certificate store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::error::{SparkError, SparkResult};
use crate::types::{CertificateId, CertificateRecord};

use super::{object_key, CertificateStore, DEFAULT_NAMESPACE};

/// Certificate store rooted at a directory, one `.pem` file per identifier.
#[derive(Debug, Clone)]
pub struct FsCertificateStore {
    root: PathBuf,
    namespace: String,
}

impl FsCertificateStore {
    /// Create a store at the default location.
    ///
    /// Default: `<user cache dir>/spark-verify`
    pub fn new() -> SparkResult<Self> {
        Ok(Self::with_dir(default_store_dir()?))
    }

    /// Create a store rooted at `root`.
    pub fn with_dir(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Use a different key namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Filesystem path of a certificate object.
    pub fn path_for(&self, id: &CertificateId) -> PathBuf {
        self.root.join(object_key(&self.namespace, id))
    }
}

#[async_trait]
impl CertificateStore for FsCertificateStore {
    async fn get(&self, id: &CertificateId) -> SparkResult<Option<CertificateRecord>> {
        let path = self.path_for(id);

        match fs::read(&path).await {
            Ok(pem) => {
                debug!(certificate_id = %id, path = %path.display(), "certificate store hit");
                Ok(Some(CertificateRecord::new(id.clone(), pem)))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(certificate_id = %id, "certificate not in store");
                Ok(None)
            }
            Err(e) => Err(SparkError::Store {
                message: format!("failed to read {}: {}", path.display(), e),
            }),
        }
    }

    async fn put(&self, id: &CertificateId, record: &CertificateRecord) -> SparkResult<()> {
        let path = self.path_for(id);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SparkError::Store {
                    message: format!("failed to create store directory: {}", e),
                })?;
        }

        write_atomic(&path, &record.pem).await?;

        debug!(certificate_id = %id, path = %path.display(), "stored certificate");
        Ok(())
    }
}

fn default_store_dir() -> SparkResult<PathBuf> {
    let base = dirs::cache_dir()
        .or_else(dirs::home_dir)
        .ok_or_else(|| SparkError::Config {
            message: "could not determine certificate store directory".to_string(),
        })?;

    Ok(base.join("spark-verify"))
}

/// Write through a uniquely named temp file and rename over the target.
///
/// Concurrent writers each use their own temp file, so a reader never sees a
/// partially written certificate.
async fn write_atomic(path: &Path, content: &[u8]) -> SparkResult<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    fs::write(&temp_path, content)
        .await
        .map_err(|e| SparkError::Store {
            message: format!("failed to write temp file: {}", e),
        })?;

    if let Err(e) = fs::rename(&temp_path, path).await {
        let _ = fs::remove_file(&temp_path).await;
        return Err(SparkError::Store {
            message: format!("failed to rename temp file: {}", e),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_store() -> (FsCertificateStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let store = FsCertificateStore::with_dir(temp_dir.path().join("certs"));
        (store, temp_dir)
    }

    fn id(raw: &str) -> CertificateId {
        CertificateId::parse(raw).unwrap()
    }

    #[tokio::test]
    async fn test_store_roundtrip() {
        let (store, _temp_dir) = create_test_store();
        let record = CertificateRecord::new(id("00001"), b"-----BEGIN CERTIFICATE-----".to_vec());

        store.put(&id("00001"), &record).await.unwrap();
        let loaded = store.get(&id("00001")).await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_store_layout() {
        let (store, _temp_dir) = create_test_store();
        let record = CertificateRecord::new(id("00002"), b"pem".to_vec());
        store.put(&id("00002"), &record).await.unwrap();

        let expected = store.root().join("PublicKeys").join("00002.pem");
        assert!(expected.exists());
        assert_eq!(store.path_for(&id("00002")), expected);
    }

    #[tokio::test]
    async fn test_store_miss() {
        let (store, _temp_dir) = create_test_store();
        assert!(store.get(&id("missing")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_overwrite() {
        let (store, _temp_dir) = create_test_store();
        store
            .put(&id("c"), &CertificateRecord::new(id("c"), b"old".to_vec()))
            .await
            .unwrap();
        store
            .put(&id("c"), &CertificateRecord::new(id("c"), b"new".to_vec()))
            .await
            .unwrap();

        let loaded = store.get(&id("c")).await.unwrap().unwrap();
        assert_eq!(loaded.pem, b"new");
    }

    #[tokio::test]
    async fn test_store_no_temp_files_left() {
        let (store, _temp_dir) = create_test_store();
        store
            .put(&id("c"), &CertificateRecord::new(id("c"), b"pem".to_vec()))
            .await
            .unwrap();

        let dir = store.root().join("PublicKeys");
        let names: Vec<String> = std::fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["c.pem".to_string()]);
    }

    #[tokio::test]
    async fn test_store_concurrent_identical_writes() {
        let (store, _temp_dir) = create_test_store();
        let record = CertificateRecord::new(id("dup"), vec![b'x'; 4096]);

        let mut tasks = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let record = record.clone();
            tasks.push(tokio::spawn(async move {
                store.put(&record.id, &record).await
            }));
        }
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let loaded = store.get(&id("dup")).await.unwrap().unwrap();
        assert_eq!(loaded, record);
    }

    #[tokio::test]
    async fn test_store_read_failure_is_error() {
        let (store, _temp_dir) = create_test_store();
        // A directory where the certificate file should be makes the read fail
        // with something other than NotFound.
        std::fs::create_dir_all(store.path_for(&id("blocked"))).unwrap();

        let err = store.get(&id("blocked")).await.unwrap_err();
        assert!(matches!(err, SparkError::Store { .. }));
    }

    #[tokio::test]
    async fn test_custom_namespace() {
        let temp_dir = TempDir::new().unwrap();
        let store = FsCertificateStore::with_dir(temp_dir.path()).with_namespace("vault/certs");
        store
            .put(&id("n"), &CertificateRecord::new(id("n"), b"pem".to_vec()))
            .await
            .unwrap();
        assert!(temp_dir.path().join("vault/certs/n.pem").exists());
    }
}
