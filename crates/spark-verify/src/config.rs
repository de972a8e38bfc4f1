//! Verifier configuration.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::client::Credentials;
use crate::error::{SparkError, SparkResult};
use crate::store::{FsCertificateStore, DEFAULT_NAMESPACE};

/// Default Vault REST API version.
pub const DEFAULT_API_VERSION: &str = "v21.1";

/// Configuration for the certificate store and the Vault client.
#[derive(Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Vault host, with or without scheme (`https://` assumed).
    #[serde(default)]
    pub host: Option<String>,

    /// Integration user name.
    #[serde(default)]
    pub username: Option<String>,

    /// Integration user password.
    #[serde(default, skip_serializing)]
    pub password: Option<String>,

    /// REST API version segment, e.g. `v21.1`.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Root directory of the certificate store.
    #[serde(default)]
    pub cert_dir: Option<PathBuf>,

    /// Key namespace inside the store.
    #[serde(default = "default_namespace")]
    pub namespace: String,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            host: None,
            username: None,
            password: None,
            api_version: default_api_version(),
            timeout_secs: default_timeout(),
            cert_dir: None,
            namespace: default_namespace(),
        }
    }
}

impl fmt::Debug for VerifierConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerifierConfig")
            .field("host", &self.host)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .field("cert_dir", &self.cert_dir)
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl VerifierConfig {
    /// Create config from environment variables.
    ///
    /// | Variable | Description |
    /// |----------|-------------|
    /// | `VAULT_HOSTNAME` | Vault host |
    /// | `VAULT_USER` | Integration user |
    /// | `VAULT_PASSWORD` | Integration password |
    /// | `VAULT_API_VERSION` | API version (default `v21.1`) |
    /// | `SPARK_VERIFY_TIMEOUT` | Request timeout in seconds (default 30) |
    /// | `SPARK_VERIFY_CERT_DIR` | Certificate store root |
    /// | `SPARK_VERIFY_CERT_NAMESPACE` | Store namespace (default `PublicKeys`) |
    pub fn from_env() -> Self {
        Self {
            host: non_empty_env("VAULT_HOSTNAME"),
            username: non_empty_env("VAULT_USER"),
            password: non_empty_env("VAULT_PASSWORD"),
            api_version: non_empty_env("VAULT_API_VERSION").unwrap_or_else(default_api_version),
            timeout_secs: non_empty_env("SPARK_VERIFY_TIMEOUT")
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(default_timeout),
            cert_dir: non_empty_env("SPARK_VERIFY_CERT_DIR").map(PathBuf::from),
            namespace: non_empty_env("SPARK_VERIFY_CERT_NAMESPACE")
                .unwrap_or_else(default_namespace),
        }
    }

    /// Set the Vault host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Set the integration credentials.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// Set the API version.
    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Set the certificate store root.
    pub fn with_cert_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cert_dir = Some(dir.into());
        self
    }

    /// Set the store namespace.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Vault host, or a configuration error when unset.
    pub fn require_host(&self) -> SparkResult<&str> {
        self.host.as_deref().ok_or_else(|| SparkError::Config {
            message: "VAULT_HOSTNAME is not set".to_string(),
        })
    }

    /// Integration credentials, or a configuration error when incomplete.
    pub fn credentials(&self) -> SparkResult<Credentials> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Ok(Credentials::new(username, password)),
            (None, _) => Err(SparkError::Config {
                message: "VAULT_USER is not set".to_string(),
            }),
            (_, None) => Err(SparkError::Config {
                message: "VAULT_PASSWORD is not set".to_string(),
            }),
        }
    }

    /// Check that everything needed for remote fetches is present.
    pub fn validate(&self) -> SparkResult<()> {
        self.require_host()?;
        self.credentials()?;
        if self.api_version.trim().is_empty() {
            return Err(SparkError::Config {
                message: "API version must not be empty".to_string(),
            });
        }
        if self.timeout_secs == 0 {
            return Err(SparkError::Config {
                message: "timeout must be at least one second".to_string(),
            });
        }
        Ok(())
    }

    /// Build the directory-backed certificate store this config describes.
    pub fn store(&self) -> SparkResult<FsCertificateStore> {
        let store = match &self.cert_dir {
            Some(dir) => FsCertificateStore::with_dir(dir),
            None => FsCertificateStore::new()?,
        };
        Ok(store.with_namespace(self.namespace.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: &[&str] = &[
        "VAULT_HOSTNAME",
        "VAULT_USER",
        "VAULT_PASSWORD",
        "VAULT_API_VERSION",
        "SPARK_VERIFY_TIMEOUT",
        "SPARK_VERIFY_CERT_DIR",
        "SPARK_VERIFY_CERT_NAMESPACE",
    ];

    fn clear_env() {
        for var in VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let config = VerifierConfig::from_env();
        assert!(config.host.is_none());
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.namespace, "PublicKeys");
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_from_env_values() {
        clear_env();
        std::env::set_var("VAULT_HOSTNAME", "myvault.veevavault.com");
        std::env::set_var("VAULT_USER", "integration@example.com");
        std::env::set_var("VAULT_PASSWORD", "secret");
        std::env::set_var("SPARK_VERIFY_TIMEOUT", "5");
        std::env::set_var("SPARK_VERIFY_CERT_DIR", "/tmp/certs");
        let config = VerifierConfig::from_env();
        clear_env();

        assert_eq!(config.host.as_deref(), Some("myvault.veevavault.com"));
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.cert_dir, Some(PathBuf::from("/tmp/certs")));
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_env_empty_is_unset() {
        clear_env();
        std::env::set_var("VAULT_HOSTNAME", "");
        std::env::set_var("SPARK_VERIFY_TIMEOUT", "not-a-number");
        let config = VerifierConfig::from_env();
        clear_env();

        assert!(config.host.is_none());
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = VerifierConfig::default().with_credentials("user", "hunter2");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_credentials_required() {
        let config = VerifierConfig::default().with_host("vault.example.com");
        assert!(matches!(
            config.credentials(),
            Err(SparkError::Config { .. })
        ));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_store_uses_namespace() {
        let config = VerifierConfig::default()
            .with_cert_dir("/tmp/spark-store")
            .with_namespace("Certs");
        let store = config.store().unwrap();
        assert_eq!(store.namespace(), "Certs");
        assert_eq!(store.root(), std::path::Path::new("/tmp/spark-store"));
    }
}
