//! Authentication of signed Vault Spark notifications.
//!
//! This crate decides whether an inbound notification really came from the
//! Vault that claims to have sent it:
//!
//! - Canonical string-to-verify built from the signed headers, body and URL
//! - Read-through certificate cache (local store, then Vault REST API)
//! - RSA PKCS#1 v1.5 / SHA-256 signature verification
//! - Hand-off of verified bodies to a downstream [`Delivery`]
//!
//! # Quick Start
//!
//! ```no_run
//! use spark_verify::{NotificationRequest, ValidationPipeline, VerifierConfig};
//!
//! # async fn example(request: NotificationRequest) -> anyhow::Result<()> {
//! let pipeline = ValidationPipeline::from_config(&VerifierConfig::from_env())?;
//!
//! let verdict = pipeline.validate_request(&request).await;
//! if verdict.is_verified() {
//!     println!("accepted");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `VAULT_HOSTNAME` | Vault host (scheme defaults to `https`) |
//! | `VAULT_USER` | Integration user for certificate fetches |
//! | `VAULT_PASSWORD` | Integration user password |
//! | `VAULT_API_VERSION` | REST API version (default: `v21.1`) |
//! | `SPARK_VERIFY_TIMEOUT` | Request timeout in seconds (default: 30) |
//! | `SPARK_VERIFY_CERT_DIR` | Certificate store root (default: user cache dir) |
//! | `SPARK_VERIFY_CERT_NAMESPACE` | Store namespace (default: `PublicKeys`) |

pub mod canonicalize;
pub mod client;
pub mod config;
pub mod delivery;
pub mod error;
pub mod pipeline;
pub mod resolver;
pub mod store;
pub mod types;
pub mod verify;

// Re-export main types
pub use canonicalize::{
    canonicalize, canonicalize_request, is_signature_header, CanonicalString, SignedHeaders,
    CERTIFICATE_ID_HEADER, SIGNATURE_HEADER, SIGNATURE_HEADER_PREFIX, SIGNATURE_URL_HEADER,
};
pub use client::{CertificateFetcher, Credentials, VaultCertificateFetcher};
pub use config::{VerifierConfig, DEFAULT_API_VERSION};
pub use delivery::{
    handle_notification, respond, Delivery, MemoryDelivery, NotificationResponse, SpoolDelivery,
};
pub use error::{SparkError, SparkResult};
pub use pipeline::{SignedRequestContext, Stage, ValidationPipeline};
pub use resolver::{CertificateResolver, ResolveSource, ResolvedCertificate};
pub use store::{
    object_key, CertificateStore, FsCertificateStore, MemoryCertificateStore, DEFAULT_NAMESPACE,
};
pub use types::{
    CertificateId, CertificateRecord, NotificationRequest, RejectReason, StatusClass, Verdict,
};
pub use verify::{decode_signature, public_key_from_pem, verify_signature, PublicKey};
