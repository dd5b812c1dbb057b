//! Mapping of HTTP failures onto the domain error messages.

use reqwest::{Response, StatusCode};
use serde::Deserialize;
use std::time::Duration;

/// Error body shapes returned by GoTrue and PostgREST.
///
/// PostgREST answers `{"message", "code", "details", "hint"}`; GoTrue uses
/// either `{"msg", "error_code"}` or the OAuth style
/// `{"error", "error_description"}` depending on version.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

/// Describe a transport failure (the request never produced a response).
pub(crate) fn transport_message(error: &reqwest::Error, timeout: Duration) -> String {
    if error.is_timeout() {
        format!("request timed out after {timeout:?}")
    } else if error.is_connect() {
        format!("connection failed: {error}")
    } else {
        format!("request failed: {error}")
    }
}

/// Read a non-success response and extract the backend's message.
///
/// Falls back to the raw body, then to the status line.
pub(crate) async fn response_message(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, message_from_body(status, &body))
}

fn message_from_body(status: StatusCode, body: &str) -> String {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    parsed
        .message
        .or(parsed.msg)
        .or(parsed.error_description)
        .or(parsed.error)
        .filter(|message| !message.trim().is_empty())
        .or_else(|| Some(body.trim().to_string()).filter(|text| !text.is_empty()))
        .unwrap_or_else(|| format!("unexpected status {status}"))
}
