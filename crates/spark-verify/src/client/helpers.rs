//! Pure helpers: endpoint URLs and response-body interpretation (no HTTP).

use serde::Deserialize;
use url::Url;

use crate::error::{SparkError, SparkResult};
use crate::types::CertificateId;

/// Value of `responseStatus` on success.
const RESPONSE_STATUS_SUCCESS: &str = "SUCCESS";

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(rename = "responseStatus", default)]
    response_status: Option<String>,

    #[serde(rename = "sessionId", default)]
    session_id: Option<String>,

    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    kind: Option<String>,
}

impl ApiResponse {
    fn error_summary(&self) -> String {
        let kinds: Vec<&str> = self
            .errors
            .iter()
            .filter_map(|e| e.kind.as_deref())
            .collect();
        if kinds.is_empty() {
            "no error detail".to_string()
        } else {
            kinds.join(", ")
        }
    }
}

/// Parse and validate a base URL, defaulting the scheme to https.
pub(crate) fn parse_base_url(host: &str) -> SparkResult<Url> {
    let host = host.trim();
    let candidate = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    };

    let url = Url::parse(&candidate).map_err(|e| SparkError::Config {
        message: format!("invalid Vault host {:?}: {}", host, e),
    })?;

    // A bare "https:" would otherwise parse as a host named after the scheme.
    let host_is_scheme = url
        .host_str()
        .is_some_and(|h| h.eq_ignore_ascii_case("http") || h.eq_ignore_ascii_case("https"));

    if url.cannot_be_a_base() || url.host_str().is_none() || host_is_scheme {
        return Err(SparkError::Config {
            message: format!("invalid Vault host {:?}", host),
        });
    }

    Ok(url)
}

fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// `{base}/api/{version}/auth`
pub(crate) fn auth_url(base: &Url, api_version: &str) -> Url {
    endpoint(base, &["api", api_version, "auth"])
}

/// `{base}/api/{version}/services/certificate/{id}`, with the id percent-encoded.
pub(crate) fn certificate_url(base: &Url, api_version: &str, id: &CertificateId) -> Url {
    endpoint(
        base,
        &["api", api_version, "services", "certificate", id.as_str()],
    )
}

/// Extract the session id from an authentication response body.
///
/// The platform answers some failures with a 2xx status and
/// `"responseStatus": "FAILURE"`; those are authentication failures too.
pub(crate) fn parse_session_id(body: &str) -> SparkResult<String> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| SparkError::AuthFailed {
            message: format!("unparseable authentication response: {}", e),
        })?;

    if let Some(status) = response.response_status.as_deref() {
        if status != RESPONSE_STATUS_SUCCESS {
            return Err(SparkError::AuthFailed {
                message: format!(
                    "authentication status {} ({})",
                    status,
                    response.error_summary()
                ),
            });
        }
    }

    match response.session_id {
        Some(session_id) if !session_id.trim().is_empty() => Ok(session_id),
        _ => Err(SparkError::AuthFailed {
            message: "authentication response has no sessionId".to_string(),
        }),
    }
}

/// Reject a 2xx certificate body that is actually a JSON failure envelope.
pub(crate) fn check_certificate_body(body: &str) -> SparkResult<()> {
    if !body.trim_start().starts_with('{') {
        return Ok(());
    }

    let message = match serde_json::from_str::<ApiResponse>(body) {
        Ok(response) => format!(
            "certificate endpoint returned status {} ({})",
            response.response_status.as_deref().unwrap_or("unknown"),
            response.error_summary()
        ),
        Err(_) => "certificate endpoint returned JSON instead of PEM".to_string(),
    };
    Err(SparkError::FetchFailed { message })
}
