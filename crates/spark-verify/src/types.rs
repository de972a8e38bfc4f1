//! Data model shared by the pipeline stages.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{SparkError, SparkResult};

/// Identifier of one of the sender's signing certificates.
///
/// Used both as the store key and as the remote lookup key, so it is
/// validated once at construction: non-empty after trimming, no path
/// separators, no `..`, no control characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CertificateId(String);

impl CertificateId {
    /// Parse an identifier taken from a request header.
    pub fn parse(raw: &str) -> SparkResult<Self> {
        let id = raw.trim();

        let invalid = |reason: &str| SparkError::InvalidCertificateId {
            id: raw.to_string(),
            reason: reason.to_string(),
        };

        if id.is_empty() {
            return Err(invalid("empty"));
        }
        if id.contains('/') || id.contains('\\') {
            return Err(invalid("contains a path separator"));
        }
        if id.contains("..") {
            return Err(invalid("contains '..'"));
        }
        if id.chars().any(char::is_control) {
            return Err(invalid("contains control characters"));
        }

        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CertificateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// PEM-encoded certificate bytes, never mutated after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    /// Identifier the record was stored or fetched under.
    pub id: CertificateId,

    /// Raw PEM text as stored or as returned by the platform.
    pub pem: Vec<u8>,
}

impl CertificateRecord {
    pub fn new(id: CertificateId, pem: impl Into<Vec<u8>>) -> Self {
        Self {
            id,
            pem: pem.into(),
        }
    }
}

/// Why a notification was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// No certificate identifier header under any casing.
    MissingCertificateId,

    /// Identifier present but unusable as a lookup key.
    InvalidCertificateId,

    /// Neither the store nor the platform produced the certificate.
    CertificateUnavailable,

    /// Stored or fetched certificate bytes are not an RSA X.509 certificate.
    MalformedCertificate,

    /// Signature does not match the canonical string.
    SignatureMismatch,
}

/// Coarse response category for a rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    /// The request itself is at fault (4xx).
    ClientError,
    /// Certificate resolution failed on our side (5xx).
    ServerError,
}

impl RejectReason {
    /// Stable snake_case code used in logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingCertificateId => "missing_certificate_id",
            Self::InvalidCertificateId => "invalid_certificate_id",
            Self::CertificateUnavailable => "certificate_unavailable",
            Self::MalformedCertificate => "malformed_certificate",
            Self::SignatureMismatch => "signature_mismatch",
        }
    }

    pub fn status_class(&self) -> StatusClass {
        match self {
            Self::CertificateUnavailable | Self::MalformedCertificate => StatusClass::ServerError,
            Self::MissingCertificateId | Self::InvalidCertificateId | Self::SignatureMismatch => {
                StatusClass::ClientError
            }
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Terminal outcome of validating one notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Verified,
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Self::Verified => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }
}

/// A captured inbound notification.
///
/// Deserializes from `{"headers": {...}, "body": "...", "url": "..."}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Request headers as received (any casing).
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Raw request body.
    #[serde(default)]
    pub body: String,

    /// Full URL the request was received on, including query string.
    #[serde(default)]
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_certificate_id_trims() {
        let id = CertificateId::parse("  00001 ").unwrap();
        assert_eq!(id.as_str(), "00001");
    }

    #[test]
    fn test_certificate_id_rejects_empty() {
        assert!(CertificateId::parse("").is_err());
        assert!(CertificateId::parse("   ").is_err());
    }

    #[test]
    fn test_certificate_id_rejects_traversal() {
        for raw in ["../secret", "a/b", "a\\b", "..", "cert\n1"] {
            let err = CertificateId::parse(raw).unwrap_err();
            assert!(
                matches!(err, SparkError::InvalidCertificateId { .. }),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_reject_reason_status_class() {
        assert_eq!(
            RejectReason::CertificateUnavailable.status_class(),
            StatusClass::ServerError
        );
        assert_eq!(
            RejectReason::SignatureMismatch.status_class(),
            StatusClass::ClientError
        );
        assert_eq!(
            RejectReason::MissingCertificateId.status_class(),
            StatusClass::ClientError
        );
        assert_eq!(
            RejectReason::MalformedCertificate.status_class(),
            StatusClass::ServerError
        );
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: NotificationRequest =
            serde_json::from_str(r#"{"headers": {"A": "b"}}"#).unwrap();
        assert_eq!(request.headers.get("A").map(String::as_str), Some("b"));
        assert!(request.body.is_empty());
        assert!(request.url.is_empty());
    }
}
