//! Error types for the authentication core.
//!
//! [`SparkError`] is the internal error raised by stores, the Vault client and
//! certificate parsing. It never reaches the caller of
//! [`ValidationPipeline::validate`](crate::ValidationPipeline::validate), which
//! only reports a coarse [`RejectReason`](crate::RejectReason).

/// Internal errors raised by the certificate subsystem.
#[derive(Debug, thiserror::Error)]
pub enum SparkError {
    /// Certificate not present (store miss or remote 404).
    #[error("certificate not found: {id}")]
    NotFound { id: String },

    /// Certificate identifier cannot be used as a lookup key.
    #[error("invalid certificate id {id:?}: {reason}")]
    InvalidCertificateId { id: String, reason: String },

    /// Durable store read/write failed for a reason other than absence.
    #[error("store error: {message}")]
    Store { message: String },

    /// Authentication against the platform failed.
    #[error("authentication failed: {message}")]
    AuthFailed { message: String },

    /// Certificate retrieval failed after a successful authentication.
    #[error("certificate fetch failed: {message}")]
    FetchFailed { message: String },

    /// Transport-level failure.
    #[error("network error: {message}")]
    Network { message: String },

    /// Response from the platform could not be interpreted.
    #[error("invalid response: {message}")]
    InvalidResponse { message: String },

    /// Certificate bytes are not a usable RSA X.509 certificate.
    #[error("malformed certificate: {message}")]
    MalformedCertificate { message: String },

    /// Downstream hand-off of a verified body failed.
    #[error("delivery error: {message}")]
    Delivery { message: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl SparkError {
    /// Whether the error came from the authentication step of a fetch.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::AuthFailed { .. })
    }

    /// Stable category used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidCertificateId { .. } => "invalid_certificate_id",
            Self::Store { .. } => "store",
            Self::AuthFailed { .. } => "auth_failed",
            Self::FetchFailed { .. } => "fetch_failed",
            Self::Network { .. } => "network",
            Self::InvalidResponse { .. } => "invalid_response",
            Self::MalformedCertificate { .. } => "malformed_certificate",
            Self::Delivery { .. } => "delivery",
            Self::Config { .. } => "config",
        }
    }
}

impl From<reqwest::Error> for SparkError {
    fn from(err: reqwest::Error) -> Self {
        Self::Network {
            message: err.to_string(),
        }
    }
}

/// Result type for certificate subsystem operations.
pub type SparkResult<T> = Result<T, SparkError>;
