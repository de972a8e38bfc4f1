//! Vault client for signing certificates.
//!
//! A fetch is two requests: a form-encoded `POST /api/{version}/auth` that
//! yields a session id, then `GET /api/{version}/services/certificate/{id}`
//! carrying that session id in `Authorization`. A fresh session is opened for
//! every fetch.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::redirect::Policy;
use tracing::{info, warn};

use crate::config::VerifierConfig;
use crate::error::{SparkError, SparkResult};
use crate::types::{CertificateId, CertificateRecord};

mod helpers;
mod http;

use helpers::parse_base_url;
use http::HttpBackend;

/// User agent for Vault requests.
const USER_AGENT_VALUE: &str = concat!("spark-verify/", env!("CARGO_PKG_VERSION"));

/// Source of certificates that are not yet stored locally.
#[async_trait]
pub trait CertificateFetcher: Send + Sync {
    /// Retrieve the PEM certificate registered under `id`.
    async fn fetch(&self, id: &CertificateId) -> SparkResult<CertificateRecord>;
}

#[async_trait]
impl<T: CertificateFetcher + ?Sized> CertificateFetcher for std::sync::Arc<T> {
    async fn fetch(&self, id: &CertificateId) -> SparkResult<CertificateRecord> {
        (**self).fetch(id).await
    }
}

/// Integration user credentials.
#[derive(Clone)]
pub struct Credentials {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Fetches certificates from the Vault REST API.
#[derive(Debug, Clone)]
pub struct VaultCertificateFetcher {
    backend: HttpBackend,
    credentials: Credentials,
}

impl VaultCertificateFetcher {
    /// Build a fetcher from a validated configuration.
    pub fn new(config: &VerifierConfig) -> SparkResult<Self> {
        config.validate()?;
        Self::with_credentials(
            config.require_host()?,
            &config.api_version,
            config.credentials()?,
            Duration::from_secs(config.timeout_secs),
        )
    }

    /// Build a fetcher for an explicit host and credentials.
    pub fn with_credentials(
        host: &str,
        api_version: &str,
        credentials: Credentials,
        timeout: Duration,
    ) -> SparkResult<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .redirect(Policy::none())
            .build()
            .map_err(|e| SparkError::Network {
                message: format!("failed to create HTTP client: {}", e),
            })?;

        let backend = HttpBackend {
            client,
            base_url: parse_base_url(host)?,
            api_version: api_version.trim().to_string(),
        };

        Ok(Self {
            backend,
            credentials,
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        self.backend.base_url.as_str()
    }
}

#[async_trait]
impl CertificateFetcher for VaultCertificateFetcher {
    async fn fetch(&self, id: &CertificateId) -> SparkResult<CertificateRecord> {
        info!(certificate_id = %id, host = %self.backend.base_url, "fetching signing certificate");

        let session_id = match self.backend.authenticate(&self.credentials).await {
            Ok(session_id) => session_id,
            Err(e) => {
                warn!(certificate_id = %id, error = %e, "vault authentication failed");
                return Err(e);
            }
        };

        let pem = self.backend.retrieve_certificate(&session_id, id).await?;
        info!(certificate_id = %id, bytes = pem.len(), "signing certificate retrieved");

        Ok(CertificateRecord::new(id.clone(), pem))
    }
}
