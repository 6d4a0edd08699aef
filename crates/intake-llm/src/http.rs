//! Shared HTTP plumbing for vendor clients

use intake_domain::VendorError;
use std::time::Duration;

/// Default timeout for vendor requests (60 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Build a reqwest client with the given request timeout
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client, VendorError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| VendorError::Transport(format!("failed to build HTTP client: {}", e)))
}

/// Map a send or body-read failure to a vendor error
pub(crate) fn map_request_error(e: reqwest::Error, timeout_secs: u64) -> VendorError {
    if e.is_timeout() {
        VendorError::Timeout(timeout_secs)
    } else {
        VendorError::Transport(e.to_string())
    }
}

/// Turn any non-2xx response into [`VendorError::Status`] carrying the body text
pub(crate) async fn ensure_success(
    response: reqwest::Response,
) -> Result<reqwest::Response, VendorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| String::new());
    Err(VendorError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Strip a trailing slash so paths can be appended with `format!`
pub(crate) fn normalize_base_url(url: impl Into<String>) -> String {
    url.into().trim_end_matches('/').to_string()
}
