//! Content-encoding handling for response bodies

use std::io::Read;

use flate2::read::GzDecoder;
use reqwest::header::{HeaderMap, CONTENT_ENCODING};
use tallyline_domain::TallyError;

use crate::errors::InfraError;

/// Whether the response declares a gzip content encoding.
pub fn is_gzip(headers: &HeaderMap) -> bool {
    headers
        .get_all(CONTENT_ENCODING)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .any(|coding| coding.trim().eq_ignore_ascii_case("gzip"))
}

/// The body as sent by the service, decompressed when it is gzip encoded.
///
/// # Errors
/// Returns `TallyError::Decode` when a gzip body is corrupt.
pub fn decode_content(headers: &HeaderMap, body: &[u8]) -> Result<Vec<u8>, TallyError> {
    if !is_gzip(headers) || body.is_empty() {
        return Ok(body.to_vec());
    }

    let mut decoded = Vec::with_capacity(body.len().saturating_mul(4));
    GzDecoder::new(body).read_to_end(&mut decoded).map_err(InfraError::from)?;
    Ok(decoded)
}
