//! Shared fixtures: one RSA key, its self-signed certificate, signing helpers
//! and counting test doubles.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::{EncodePrivateKey, LineEnding};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;
use spark_verify::{
    canonicalize, CertificateFetcher, CertificateId, CertificateRecord, CertificateStore,
    MemoryCertificateStore, NotificationRequest, SignedHeaders, SparkError, SparkResult,
};

pub const CERT_ID: &str = "00001";
pub const HOOK_URL: &str = "https://example.com/hook";
pub const BODY: &str = r#"{"event":"x"}"#;

pub fn private_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| {
        let mut rng = rsa::rand_core::OsRng;
        RsaPrivateKey::new(&mut rng, 2048).expect("key generation failed")
    })
}

/// Self-signed certificate for [`private_key`].
pub fn certificate_pem() -> &'static str {
    static PEM: OnceLock<String> = OnceLock::new();
    PEM.get_or_init(|| self_signed_pem(private_key(), "vault.example.com"))
}

/// Certificate for a freshly generated key, to provoke mismatches.
pub fn other_certificate_pem() -> String {
    let mut rng = rsa::rand_core::OsRng;
    let other = RsaPrivateKey::new(&mut rng, 2048).unwrap();
    self_signed_pem(&other, "other.example.com")
}

fn self_signed_pem(key: &RsaPrivateKey, subject: &str) -> String {
    let key_pem = key
        .to_pkcs8_pem(LineEnding::LF)
        .expect("pkcs8 export failed");
    let key_pair = rcgen::KeyPair::from_pem(&key_pem).expect("rcgen key import failed");
    rcgen::CertificateParams::new(vec![subject.to_string()])
        .expect("certificate params")
        .self_signed(&key_pair)
        .expect("self-signing failed")
        .pem()
}

pub fn sign(message: &[u8]) -> String {
    let signing_key = SigningKey::<Sha256>::new(private_key().clone());
    BASE64.encode(signing_key.sign(message).to_vec())
}

/// Signature-namespace headers for a notification, without the signature.
pub fn unsigned_headers(cert_id: &str) -> Vec<(String, String)> {
    vec![
        (
            "X-VaultAPISignature-CertificateId".to_string(),
            cert_id.to_string(),
        ),
        ("X-VaultAPISignature-URL".to_string(), HOOK_URL.to_string()),
        (
            "X-VaultAPISignature-Timestamp".to_string(),
            "2024-05-01T10:00:00Z".to_string(),
        ),
    ]
}

/// A correctly signed request for `body`.
pub fn signed_request(cert_id: &str, body: &str) -> NotificationRequest {
    let mut headers: HashMap<String, String> = unsigned_headers(cert_id).into_iter().collect();
    let signed: SignedHeaders = headers.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    let canonical = canonicalize(&signed, body.as_bytes(), Some(HOOK_URL));

    headers.insert("X-VaultAPI-SignatureV2".to_string(), sign(canonical.as_bytes()));
    headers.insert("Content-Type".to_string(), "application/json".to_string());

    NotificationRequest {
        headers,
        body: body.to_string(),
        url: HOOK_URL.to_string(),
    }
}

pub fn id(raw: &str) -> CertificateId {
    CertificateId::parse(raw).unwrap()
}

pub async fn store_with_certificate(cert_id: &str, pem: &str) -> MemoryCertificateStore {
    let store = MemoryCertificateStore::new();
    let record = CertificateRecord::new(id(cert_id), pem);
    store.put(&record.id, &record).await.unwrap();
    store
}

/// Store that counts calls and can be told to fail.
#[derive(Default)]
pub struct CountingStore {
    pub inner: MemoryCertificateStore,
    pub gets: AtomicUsize,
    pub puts: AtomicUsize,
    pub fail_get: bool,
    pub fail_put: bool,
}

impl CountingStore {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateStore for CountingStore {
    async fn get(&self, id: &CertificateId) -> SparkResult<Option<CertificateRecord>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_get {
            return Err(SparkError::Store {
                message: "store offline".to_string(),
            });
        }
        self.inner.get(id).await
    }

    async fn put(&self, id: &CertificateId, record: &CertificateRecord) -> SparkResult<()> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_put {
            return Err(SparkError::Store {
                message: "store read-only".to_string(),
            });
        }
        self.inner.put(id, record).await
    }
}

/// Fetcher that serves one fixed PEM (or an error) and counts calls.
pub struct CountingFetcher {
    pub pem: Option<String>,
    pub auth_failure: bool,
    pub calls: AtomicUsize,
}

impl CountingFetcher {
    pub fn serving(pem: impl Into<String>) -> Self {
        Self {
            pem: Some(pem.into()),
            auth_failure: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(auth_failure: bool) -> Self {
        Self {
            pem: None,
            auth_failure,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CertificateFetcher for CountingFetcher {
    async fn fetch(&self, id: &CertificateId) -> SparkResult<CertificateRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.pem {
            Some(pem) => Ok(CertificateRecord::new(id.clone(), pem.as_str())),
            None if self.auth_failure => Err(SparkError::AuthFailed {
                message: "HTTP 401".to_string(),
            }),
            None => Err(SparkError::FetchFailed {
                message: "HTTP 404".to_string(),
            }),
        }
    }
}
