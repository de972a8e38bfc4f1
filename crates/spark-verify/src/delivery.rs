//! Hand-off of verified notifications.
//!
//! [`handle_notification`] is the request-level glue: validate, forward the
//! verified body to a [`Delivery`], and answer with a status that reveals only
//! the coarse outcome.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{error, info};

use crate::client::CertificateFetcher;
use crate::error::{SparkError, SparkResult};
use crate::pipeline::ValidationPipeline;
use crate::store::CertificateStore;
use crate::types::{NotificationRequest, StatusClass, Verdict};

/// Downstream consumer of verified notification bodies.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, body: &[u8]) -> SparkResult<()>;
}

#[async_trait]
impl<T: Delivery + ?Sized> Delivery for Arc<T> {
    async fn deliver(&self, body: &[u8]) -> SparkResult<()> {
        (**self).deliver(body).await
    }
}

/// Writes each body to `{dir}/{uuid}.json`.
///
/// Files appear atomically (temp file + rename), so a consumer polling the
/// directory never sees a partial message.
#[derive(Debug, Clone)]
pub struct SpoolDelivery {
    dir: PathBuf,
}

impl SpoolDelivery {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Delivery for SpoolDelivery {
    async fn deliver(&self, body: &[u8]) -> SparkResult<()> {
        let failed = |message: String| SparkError::Delivery { message };

        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| failed(format!("failed to create spool directory: {}", e)))?;

        let message_id = uuid::Uuid::new_v4();
        let path = self.dir.join(format!("{}.json", message_id));
        let temp_path = self.dir.join(format!(".{}.json.tmp", message_id));

        fs::write(&temp_path, body)
            .await
            .map_err(|e| failed(format!("failed to write spool file: {}", e)))?;

        if let Err(e) = fs::rename(&temp_path, &path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(failed(format!("failed to publish spool file: {}", e)));
        }

        info!(path = %path.display(), bytes = body.len(), "notification spooled");
        Ok(())
    }
}

/// Keeps delivered bodies in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryDelivery {
    messages: Arc<Mutex<Vec<Vec<u8>>>>,
    fail: bool,
}

impl MemoryDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// A delivery that refuses every message.
    pub fn failing() -> Self {
        Self {
            messages: Arc::default(),
            fail: true,
        }
    }

    pub async fn messages(&self) -> Vec<Vec<u8>> {
        self.messages.lock().await.clone()
    }
}

#[async_trait]
impl Delivery for MemoryDelivery {
    async fn deliver(&self, body: &[u8]) -> SparkResult<()> {
        if self.fail {
            return Err(SparkError::Delivery {
                message: "delivery refused".to_string(),
            });
        }
        self.messages.lock().await.push(body.to_vec());
        Ok(())
    }
}

/// Response to send back to the notification sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NotificationResponse {
    pub status: u16,
    pub body: &'static str,
}

impl NotificationResponse {
    pub const SUCCESS: Self = Self {
        status: 200,
        body: "SUCCESS",
    };
    pub const FORBIDDEN: Self = Self {
        status: 403,
        body: "FORBIDDEN",
    };
    pub const FAILURE: Self = Self {
        status: 500,
        body: "FAILURE",
    };

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Validate `request` and forward its body when verified.
pub async fn handle_notification<S, F, D>(
    pipeline: &ValidationPipeline<S, F>,
    delivery: &D,
    request: &NotificationRequest,
) -> NotificationResponse
where
    S: CertificateStore,
    F: CertificateFetcher,
    D: Delivery + ?Sized,
{
    let verdict = pipeline.validate_request(request).await;
    respond(verdict, delivery, request.body.as_bytes()).await
}

/// Turn a verdict into a response, forwarding `body` when verified.
pub async fn respond<D>(verdict: Verdict, delivery: &D, body: &[u8]) -> NotificationResponse
where
    D: Delivery + ?Sized,
{
    match verdict {
        Verdict::Verified => match delivery.deliver(body).await {
            Ok(()) => NotificationResponse::SUCCESS,
            Err(e) => {
                error!(error = %e, "failed to forward verified notification");
                NotificationResponse::FAILURE
            }
        },
        Verdict::Rejected(reason) => match reason.status_class() {
            StatusClass::ClientError => NotificationResponse::FORBIDDEN,
            StatusClass::ServerError => NotificationResponse::FAILURE,
        },
    }
}
