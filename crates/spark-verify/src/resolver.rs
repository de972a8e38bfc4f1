//! Certificate resolution.
//!
//! Resolves a certificate identifier to a public key with the following
//! priority:
//! 1. Store (durable cache)
//! 2. Vault (remote fetch, written back to the store)
//!
//! A failed store read is treated like a miss. A failed write-back is logged
//! and otherwise ignored: the key was obtained, so the current request can
//! still be verified.

use std::fmt;

use tracing::{debug, info, warn};

use crate::client::CertificateFetcher;
use crate::store::CertificateStore;
use crate::types::{CertificateId, CertificateRecord, RejectReason};
use crate::verify::{public_key_from_pem, PublicKey};

/// Where a certificate was resolved from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveSource {
    /// Read from the store.
    Store,

    /// Fetched from Vault.
    Fetched,
}

impl fmt::Display for ResolveSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store => f.write_str("store"),
            Self::Fetched => f.write_str("vault"),
        }
    }
}

/// A certificate together with its parsed key.
#[derive(Debug, Clone)]
pub struct ResolvedCertificate {
    pub record: CertificateRecord,
    pub key: PublicKey,
    pub source: ResolveSource,
}

/// Read-through certificate resolver.
#[derive(Debug, Clone)]
pub struct CertificateResolver<S, F> {
    store: S,
    fetcher: F,
}

impl<S, F> CertificateResolver<S, F>
where
    S: CertificateStore,
    F: CertificateFetcher,
{
    pub fn new(store: S, fetcher: F) -> Self {
        Self { store, fetcher }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Resolve `id` to the public key of its certificate.
    pub async fn resolve(&self, id: &CertificateId) -> Result<PublicKey, RejectReason> {
        self.resolve_certificate(id).await.map(|resolved| resolved.key)
    }

    /// Resolve `id`, returning the certificate bytes and where they came from.
    pub async fn resolve_certificate(
        &self,
        id: &CertificateId,
    ) -> Result<ResolvedCertificate, RejectReason> {
        if let Some(record) = self.lookup_store(id).await {
            let key = public_key_from_pem(&record.pem).map_err(|e| {
                warn!(certificate_id = %id, error = %e, "stored certificate is malformed");
                RejectReason::MalformedCertificate
            })?;
            debug!(certificate_id = %id, fingerprint = %key.fingerprint(), "certificate store hit");
            return Ok(ResolvedCertificate {
                record,
                key,
                source: ResolveSource::Store,
            });
        }

        let record = match self.fetcher.fetch(id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    certificate_id = %id,
                    error = %e,
                    kind = e.kind(),
                    auth_failure = e.is_auth_failure(),
                    "certificate unavailable"
                );
                return Err(RejectReason::CertificateUnavailable);
            }
        };

        // Parse before caching so a bad body is never persisted.
        let key = public_key_from_pem(&record.pem).map_err(|e| {
            warn!(certificate_id = %id, error = %e, "fetched certificate is malformed");
            RejectReason::MalformedCertificate
        })?;

        if let Err(e) = self.store.put(id, &record).await {
            warn!(certificate_id = %id, error = %e, "failed to store certificate");
        }

        info!(certificate_id = %id, fingerprint = %key.fingerprint(), "resolved certificate from vault");

        Ok(ResolvedCertificate {
            record,
            key,
            source: ResolveSource::Fetched,
        })
    }

    async fn lookup_store(&self, id: &CertificateId) -> Option<CertificateRecord> {
        match self.store.get(id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(certificate_id = %id, error = %e, "certificate store lookup failed, fetching");
                None
            }
        }
    }
}
