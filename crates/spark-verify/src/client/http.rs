//! HTTP layer: the only place that interprets status codes.
//!
//! Authentication-step failures of any kind become
//! [`SparkError::AuthFailed`]; retrieval-step failures become
//! [`SparkError::FetchFailed`]. No retries happen here.

use reqwest::header::{ACCEPT, AUTHORIZATION};
use tracing::debug;
use url::Url;

use crate::error::{SparkError, SparkResult};
use crate::types::CertificateId;

use super::helpers::{auth_url, certificate_url, check_certificate_body, parse_session_id};
use super::Credentials;

/// Upper bound on a certificate response body.
pub(crate) const MAX_CERTIFICATE_BYTES: usize = 64 * 1024;

/// Upper bound on an authentication response body.
const MAX_AUTH_RESPONSE_BYTES: usize = 64 * 1024;

/// HTTP backend (holds reqwest client, base URL and API version).
#[derive(Debug, Clone)]
pub(crate) struct HttpBackend {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: Url,
    pub(crate) api_version: String,
}

impl HttpBackend {
    /// POST form credentials and return the session id.
    pub(crate) async fn authenticate(&self, credentials: &Credentials) -> SparkResult<String> {
        let url = auth_url(&self.base_url, &self.api_version);
        debug!(url = %url, username = %credentials.username, "authenticating");

        let auth_failed = |message: String| SparkError::AuthFailed { message };

        let response = self
            .client
            .post(url)
            .header(ACCEPT, "application/json")
            .form(&[
                ("username", credentials.username.as_str()),
                ("password", credentials.password.as_str()),
            ])
            .send()
            .await
            .map_err(|e| auth_failed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(auth_failed(format!("HTTP {}", status.as_u16())));
        }

        let body = read_limited(response, MAX_AUTH_RESPONSE_BYTES)
            .await
            .map_err(auth_failed)?;

        parse_session_id(&body)
    }

    /// GET the PEM certificate for `id` using an authenticated session.
    pub(crate) async fn retrieve_certificate(
        &self,
        session_id: &str,
        id: &CertificateId,
    ) -> SparkResult<String> {
        let url = certificate_url(&self.base_url, &self.api_version, id);
        debug!(url = %url, "retrieving signing certificate");

        let fetch_failed = |message: String| SparkError::FetchFailed { message };

        let response = self
            .client
            .get(url)
            .header(AUTHORIZATION, session_id)
            .send()
            .await
            .map_err(|e| fetch_failed(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_failed(format!("HTTP {}", status.as_u16())));
        }

        let body = read_limited(response, MAX_CERTIFICATE_BYTES)
            .await
            .map_err(fetch_failed)?;

        if body.trim().is_empty() {
            return Err(fetch_failed("empty certificate body".to_string()));
        }
        check_certificate_body(&body)?;

        Ok(body)
    }
}

/// Read a response body, refusing anything larger than `limit` bytes.
///
/// The body is read chunk by chunk, so a response without `Content-Length`
/// is cut off as soon as it passes the limit.
async fn read_limited(mut response: reqwest::Response, limit: usize) -> Result<String, String> {
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(format!("response too large: {} bytes", len));
        }
    }

    let mut body = LimitedBody::new(limit);
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| format!("failed to read response body: {}", e))?
    {
        body.push(&chunk)?;
    }

    body.into_string()
}

/// Body accumulator with a hard size limit.
#[derive(Debug)]
struct LimitedBody {
    buf: Vec<u8>,
    limit: usize,
}

impl LimitedBody {
    fn new(limit: usize) -> Self {
        Self {
            buf: Vec::new(),
            limit,
        }
    }

    fn push(&mut self, chunk: &[u8]) -> Result<(), String> {
        let total = self.buf.len() + chunk.len();
        if total > self.limit {
            return Err(format!("response too large: more than {} bytes", self.limit));
        }
        self.buf.extend_from_slice(chunk);
        Ok(())
    }

    fn into_string(self) -> Result<String, String> {
        String::from_utf8(self.buf).map_err(|_| "response body is not UTF-8".to_string())
    }
}
