//! Typed error classification
//!
//! Maps a completed HTTP exchange onto the closed error taxonomy:
//!
//! | Status | Result |
//! |--------|--------|
//! | 200 | body, decompressed when gzip encoded |
//! | 429 | `RemoteRateLimited`, with `Retry-After` seconds when given |
//! | other | `RequestFailure` from the fault body's first `Error`, or the raw body |

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tallyline_domain::{FaultEnvelope, RealmId, RequestFailure, Result, TallyError};

use crate::http::decode_content;

/// Resolve a response into its body or a typed failure.
///
/// # Errors
/// `RemoteRateLimited` for 429, `RequestFailure` for any other status but
/// 200, `Decode` for a corrupt gzip body on success.
pub fn classify_response(
    realm: &RealmId,
    status: StatusCode,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Vec<u8>> {
    if status == StatusCode::OK {
        return decode_content(headers, body);
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(TallyError::RemoteRateLimited {
            realm: realm.clone(),
            retry_after_secs: retry_after_secs(headers),
        });
    }

    let body = decode_content(headers, body).unwrap_or_else(|_| body.to_vec());
    Err(request_failure(status, &body).into())
}

/// Describe a non-success response.
///
/// A structured fault body contributes its first `Error` entry; anything
/// else is carried verbatim as the message.
pub fn request_failure(status: StatusCode, body: &[u8]) -> RequestFailure {
    match serde_json::from_slice::<FaultEnvelope>(body) {
        Ok(envelope) if envelope.fault.first().is_some() => {
            envelope.fault.to_request_failure(status.as_u16())
        }
        _ => {
            let raw = String::from_utf8_lossy(body).trim().to_string();
            let message = if raw.is_empty() {
                status.canonical_reason().unwrap_or("unknown status").to_string()
            } else {
                raw
            };
            RequestFailure { status: status.as_u16(), message, ..RequestFailure::default() }
        }
    }
}

/// Decode a success body. An empty body decodes as JSON `null`.
///
/// # Errors
/// Returns `TallyError::Decode` when the body does not match `R`.
pub fn decode_json<R: DeserializeOwned>(body: &[u8]) -> Result<R> {
    let decoded = if body.iter().all(u8::is_ascii_whitespace) {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_slice(body)
    };
    decoded.map_err(|e| TallyError::Decode(format!("unexpected response body: {e}")))
}

/// Delay-seconds form only; HTTP dates are ignored.
fn retry_after_secs(headers: &HeaderMap) -> Option<u64> {
    headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}
