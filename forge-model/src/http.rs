use crate::retry::{
    RetryConfig, execute_with_retry, is_retryable_provider_error, is_retryable_status_code,
};
use forge_core::{ForgeError, Result};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Whole-request deadline, streamed bodies included.
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

pub(crate) fn http_client(vendor: &str, timeout_secs: u64) -> Result<Client> {
    let timeout = Duration::from_secs(timeout_secs.max(1));
    Client::builder()
        .timeout(timeout)
        .connect_timeout(CONNECT_TIMEOUT.min(timeout))
        .build()
        .map_err(|e| ForgeError::Config(format!("failed to create {vendor} HTTP client: {e}")))
}

/// Transport failures; timeouts and refused connections are worth another attempt.
pub(crate) fn transport_error(vendor: &str, action: &str, e: reqwest::Error) -> ForgeError {
    if e.is_timeout() {
        ForgeError::Provider(format!("{vendor} API {action} timed out (retryable): {e}"))
    } else if e.is_connect() {
        ForgeError::Provider(format!("{vendor} API {action} failed (retryable): {e}"))
    } else {
        ForgeError::Provider(format!("{vendor} API {action} failed (non-retryable): {e}"))
    }
}

/// Send a request, retrying transient failures per `retry_config`.
///
/// `build` is invoked once per attempt. Only request setup is retried: once a successful
/// response is returned, reading its body is the caller's concern.
pub(crate) async fn send<F>(
    retry_config: &RetryConfig,
    vendor: &'static str,
    build: F,
) -> Result<reqwest::Response>
where
    F: Fn() -> RequestBuilder,
{
    execute_with_retry(retry_config, is_retryable_provider_error, || {
        let request = build();
        async move {
            let response =
                request.send().await.map_err(|e| transport_error(vendor, "request", e))?;
            check_status(vendor, response).await
        }
    })
    .await
}

async fn check_status(vendor: &str, response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let retryability =
        if is_retryable_status_code(status.as_u16()) { "retryable" } else { "non-retryable" };
    Err(ForgeError::Provider(format!("{vendor} API error ({status}, {retryability}): {body}")))
}

pub(crate) async fn read_json<T: DeserializeOwned>(
    vendor: &str,
    response: reqwest::Response,
) -> Result<T> {
    let body = response.text().await.map_err(|e| transport_error(vendor, "response read", e))?;
    serde_json::from_str(&body)
        .map_err(|e| ForgeError::Provider(format!("{vendor} returned an unexpected body: {e}")))
}

/// Base URLs are accepted with or without a trailing slash.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
