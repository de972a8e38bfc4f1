//! Notification validation pipeline.
//!
//! ```text
//! ExtractIdentifier -> ResolveCertificate -> BuildCanonical -> VerifySignature
//! ```
//!
//! Each stage can end the request with a [`Verdict::Rejected`]; resolution
//! failures short-circuit before any canonicalization or verification work.
//! The pipeline keeps no state between requests.

use std::fmt;

use tracing::{debug, info, warn};

use crate::canonicalize::{canonicalize, SignedHeaders};
use crate::client::{CertificateFetcher, VaultCertificateFetcher};
use crate::config::VerifierConfig;
use crate::error::SparkResult;
use crate::resolver::CertificateResolver;
use crate::store::{CertificateStore, FsCertificateStore};
use crate::types::{CertificateId, NotificationRequest, RejectReason, Verdict};
use crate::verify::verify_signature;

/// Pipeline stage, used in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ExtractIdentifier,
    ResolveCertificate,
    BuildCanonical,
    VerifySignature,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ExtractIdentifier => "extract_identifier",
            Self::ResolveCertificate => "resolve_certificate",
            Self::BuildCanonical => "build_canonical",
            Self::VerifySignature => "verify_signature",
        };
        f.write_str(name)
    }
}

/// Everything the verifier needs from one request.
#[derive(Debug, Clone, Copy)]
pub struct SignedRequestContext<'a> {
    pub headers: &'a SignedHeaders,
    pub body: &'a [u8],
    /// URL taken from the signed URL header, if any.
    pub url: Option<&'a str>,
    pub signature: Option<&'a str>,
}

impl<'a> SignedRequestContext<'a> {
    pub fn new(headers: &'a SignedHeaders, body: &'a [u8]) -> Self {
        Self {
            headers,
            body,
            url: headers.signature_url(),
            signature: headers.signature(),
        }
    }
}

/// Validates inbound notifications against the sender's certificates.
#[derive(Debug, Clone)]
pub struct ValidationPipeline<S, F> {
    resolver: CertificateResolver<S, F>,
}

impl ValidationPipeline<FsCertificateStore, VaultCertificateFetcher> {
    /// Build the production pipeline: directory store plus Vault fetcher.
    pub fn from_config(config: &VerifierConfig) -> SparkResult<Self> {
        let store = config.store()?;
        let fetcher = VaultCertificateFetcher::new(config)?;
        Ok(Self::new(store, fetcher))
    }
}

impl<S, F> ValidationPipeline<S, F>
where
    S: CertificateStore,
    F: CertificateFetcher,
{
    pub fn new(store: S, fetcher: F) -> Self {
        Self {
            resolver: CertificateResolver::new(store, fetcher),
        }
    }

    pub fn resolver(&self) -> &CertificateResolver<S, F> {
        &self.resolver
    }

    /// Validate a notification.
    ///
    /// `received_url` is the URL the request arrived on. The signed URL comes
    /// from the `X-VaultAPISignature-URL` header; a difference is only logged.
    pub async fn validate(
        &self,
        headers: &SignedHeaders,
        body: &[u8],
        received_url: &str,
    ) -> Verdict {
        let context = SignedRequestContext::new(headers, body);
        let verdict = self.run(&context, received_url).await;

        match verdict {
            Verdict::Verified => {
                info!(certificate_id = ?headers.certificate_id(), "notification verified");
            }
            Verdict::Rejected(reason) => {
                warn!(
                    certificate_id = ?headers.certificate_id(),
                    reason = %reason,
                    "notification rejected"
                );
            }
        }

        verdict
    }

    /// Validate a captured request.
    pub async fn validate_request(&self, request: &NotificationRequest) -> Verdict {
        let headers = SignedHeaders::from(&request.headers);
        self.validate(&headers, request.body.as_bytes(), &request.url)
            .await
    }

    async fn run(&self, context: &SignedRequestContext<'_>, received_url: &str) -> Verdict {
        let id = match Self::extract_identifier(context) {
            Ok(id) => id,
            Err(reason) => return Verdict::Rejected(reason),
        };

        debug!(stage = %Stage::ResolveCertificate, certificate_id = %id, "pipeline stage");
        let key = match self.resolver.resolve(&id).await {
            Ok(key) => key,
            Err(reason) => return Verdict::Rejected(reason),
        };

        debug!(stage = %Stage::BuildCanonical, certificate_id = %id, "pipeline stage");
        if let Some(signed_url) = context.url {
            if !received_url.is_empty() && signed_url != received_url {
                warn!(
                    certificate_id = %id,
                    signed_url,
                    received_url,
                    "signed URL differs from received URL"
                );
            }
        }
        let canonical = canonicalize(context.headers, context.body, context.url);
        debug!(certificate_id = %id, canonical_len = canonical.len(), "canonical string built");

        debug!(stage = %Stage::VerifySignature, certificate_id = %id, "pipeline stage");
        let Some(signature) = context.signature else {
            debug!(certificate_id = %id, "no signature header");
            return Verdict::Rejected(RejectReason::SignatureMismatch);
        };

        if verify_signature(&canonical, signature, &key) {
            Verdict::Verified
        } else {
            Verdict::Rejected(RejectReason::SignatureMismatch)
        }
    }

    fn extract_identifier(context: &SignedRequestContext<'_>) -> Result<CertificateId, RejectReason> {
        debug!(stage = %Stage::ExtractIdentifier, headers = context.headers.len(), "pipeline stage");
        let raw = context
            .headers
            .certificate_id()
            .ok_or(RejectReason::MissingCertificateId)?;

        CertificateId::parse(raw).map_err(|e| {
            debug!(error = %e, "unusable certificate id");
            RejectReason::InvalidCertificateId
        })
    }
}
