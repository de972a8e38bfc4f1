//! Certificate parsing and detached signature verification.
//!
//! Signatures are RSASSA-PKCS1-v1_5 with SHA-256 over the canonical string,
//! transmitted as base64 that may be wrapped across lines.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::canonicalize::CanonicalString;
use crate::error::{SparkError, SparkResult};

/// OID of `rsaEncryption` in a SubjectPublicKeyInfo.
const RSA_ENCRYPTION_OID: &str = "1.2.840.113549.1.1.1";

/// Lenient standard-alphabet decoder: padding optional.
const PERMISSIVE_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// RSA public key extracted from a signing certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    key: RsaPublicKey,
    fingerprint: String,
}

impl PublicKey {
    /// Wrap a bare RSA key (no certificate).
    pub fn from_rsa(key: RsaPublicKey) -> Self {
        Self {
            key,
            fingerprint: String::new(),
        }
    }

    /// Lowercase hex SHA-256 of the certificate DER, empty for bare keys.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn rsa(&self) -> &RsaPublicKey {
        &self.key
    }
}

/// Parse a PEM certificate and extract its RSA public key.
///
/// Only the first certificate of a bundle is used. Anything that is not an
/// X.509 certificate carrying an RSA key is reported as
/// [`SparkError::MalformedCertificate`].
pub fn public_key_from_pem(pem_bytes: &[u8]) -> SparkResult<PublicKey> {
    let malformed = |message: String| SparkError::MalformedCertificate { message };

    let (_, pem) = x509_parser::pem::parse_x509_pem(pem_bytes)
        .map_err(|e| malformed(format!("invalid PEM: {}", e)))?;

    if pem.label != "CERTIFICATE" {
        return Err(malformed(format!("unexpected PEM label {:?}", pem.label)));
    }

    let cert = pem
        .parse_x509()
        .map_err(|e| malformed(format!("invalid X.509 certificate: {}", e)))?;

    let spki = &cert.tbs_certificate.subject_pki;
    let algorithm = spki.algorithm.algorithm.to_id_string();
    if algorithm != RSA_ENCRYPTION_OID {
        return Err(malformed(format!(
            "unsupported public key algorithm {}",
            algorithm
        )));
    }

    let key = RsaPublicKey::from_public_key_der(spki.raw)
        .map_err(|e| malformed(format!("invalid RSA public key: {}", e)))?;

    let fingerprint = hex::encode(Sha256::digest(&pem.contents));
    debug!(fingerprint = %fingerprint, "parsed signing certificate");

    Ok(PublicKey { key, fingerprint })
}

/// Decode a wire signature value, ignoring embedded whitespace and line breaks.
pub fn decode_signature(value: &str) -> SparkResult<Vec<u8>> {
    let compact: String = value.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err(SparkError::InvalidResponse {
            message: "empty signature".to_string(),
        });
    }

    PERMISSIVE_BASE64
        .decode(compact.as_bytes())
        .map_err(|e| SparkError::InvalidResponse {
            message: format!("invalid base64 signature: {}", e),
        })
}

/// Verify `signature` over `canonical` with `key`.
///
/// Returns `false` for every failure: bad encoding, wrong length, wrong key,
/// or a signature that does not match.
pub fn verify_signature(canonical: &CanonicalString, signature: &str, key: &PublicKey) -> bool {
    let raw = match decode_signature(signature) {
        Ok(raw) => raw,
        Err(e) => {
            debug!(error = %e, "signature decode failed");
            return false;
        }
    };

    let signature = match Signature::try_from(raw.as_slice()) {
        Ok(signature) => signature,
        Err(e) => {
            debug!(error = %e, "signature bytes rejected");
            return false;
        }
    };

    let verifying_key = VerifyingKey::<Sha256>::new(key.key.clone());
    verifying_key.verify(canonical.as_bytes(), &signature).is_ok()
}
