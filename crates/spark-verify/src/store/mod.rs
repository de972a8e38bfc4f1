//! Durable certificate cache.
//!
//! # Layout
//!
//! ```text
//! {root}/{namespace}/{certificate_id}.pem
//! ```
//!
//! `get` distinguishes absence (`Ok(None)`) from a failed lookup (`Err`).
//! Writes of the same identifier are idempotent: the platform never changes a
//! certificate behind an identifier, so concurrent writers store identical
//! bytes and no in-process locking is needed.

use async_trait::async_trait;

use crate::error::SparkResult;
use crate::types::{CertificateId, CertificateRecord};

mod fs;
mod memory;

pub use fs::FsCertificateStore;
pub use memory::MemoryCertificateStore;

/// Default namespace under which certificates are stored.
pub const DEFAULT_NAMESPACE: &str = "PublicKeys";

/// Key-value store of PEM certificates keyed by identifier.
#[async_trait]
pub trait CertificateStore: Send + Sync {
    /// Read a certificate. `Ok(None)` means not stored.
    async fn get(&self, id: &CertificateId) -> SparkResult<Option<CertificateRecord>>;

    /// Store a certificate, overwriting any previous bytes.
    async fn put(&self, id: &CertificateId, record: &CertificateRecord) -> SparkResult<()>;
}

#[async_trait]
impl<T: CertificateStore + ?Sized> CertificateStore for std::sync::Arc<T> {
    async fn get(&self, id: &CertificateId) -> SparkResult<Option<CertificateRecord>> {
        (**self).get(id).await
    }

    async fn put(&self, id: &CertificateId, record: &CertificateRecord) -> SparkResult<()> {
        (**self).put(id, record).await
    }
}

/// Object key of a certificate: `{namespace}/{id}.pem`.
pub fn object_key(namespace: &str, id: &CertificateId) -> String {
    format!("{}/{}.pem", namespace.trim_matches('/'), id)
}
