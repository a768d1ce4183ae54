use std::time::Duration;

use reqwest::{Response, Url};
use serde::de::DeserializeOwned;

use rotasync_ports::error::PortError;

/// Shared client for every outbound call. The timeout bounds each request.
pub fn client(timeout: Duration) -> Result<reqwest::Client, PortError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| PortError::Connection(e.to_string()))
}

/// Appends percent-encoded path segments to a base URL.
pub(crate) fn endpoint(base: &str, segments: &[&str]) -> Result<Url, PortError> {
    let mut url =
        Url::parse(base).map_err(|e| PortError::Connection(format!("invalid url {base}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| PortError::Connection(format!("invalid base url {base}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

pub(crate) fn connection(e: reqwest::Error) -> PortError {
    PortError::Connection(e.to_string())
}

pub(crate) async fn expect_success(response: Response) -> Result<Response, PortError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::warn!(status = %status, body = %body, "upstream request failed");
    Err(PortError::Upstream {
        status: status.as_u16(),
        body,
    })
}

pub(crate) async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, PortError> {
    response
        .json::<T>()
        .await
        .map_err(|e| PortError::Decode(e.to_string()))
}
