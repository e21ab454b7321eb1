//! Chunked batch execution
//!
//! The batch endpoint accepts at most thirty items per call. Larger lists are
//! split and sent one chunk after another; responses are concatenated in
//! input order.

use std::collections::HashMap;

use tallyline_domain::constants::BATCH_CHUNK_SIZE;
use tallyline_domain::{BatchItemRequest, BatchItemResponse, BatchRequestBody, BatchResponseBody, Result};
use tracing::{debug, instrument, warn};

use super::client::ApiClient;
use super::request::{ApiRequest, RequestContext};

#[derive(Debug, Clone, Copy)]
pub struct BatchService<'a> {
    client: &'a ApiClient,
}

impl<'a> BatchService<'a> {
    pub const fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    /// Run `items`, one batch call per chunk of thirty.
    ///
    /// An empty list makes no call. The first failing chunk aborts the rest;
    /// responses already received are dropped.
    ///
    /// # Errors
    /// Whatever [`ApiClient::dispatch_batch`] reports for a chunk.
    #[instrument(skip(self, ctx, items), fields(realm = %ctx.realm, items = items.len()))]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        items: &[BatchItemRequest],
    ) -> Result<Vec<BatchItemResponse>> {
        let mut responses = Vec::with_capacity(items.len());

        for (index, chunk) in items.chunks(BATCH_CHUNK_SIZE).enumerate() {
            let request = ApiRequest::post("batch").with_json(&BatchRequestBody { items: chunk })?;
            let body: BatchResponseBody = self.client.dispatch_batch(&request, ctx).await?;

            if body.items.len() != chunk.len() {
                warn!(chunk = index, sent = chunk.len(), received = body.items.len(), "batch response size mismatch");
            }
            debug!(chunk = index, items = chunk.len(), "batch chunk completed");
            responses.extend(in_request_order(chunk, body.items));
        }

        Ok(responses)
    }
}

/// Order responses like the chunk's requests, matching on `bId`.
///
/// Responses with an id that was not requested keep their relative order at
/// the end.
fn in_request_order(
    chunk: &[BatchItemRequest],
    mut responses: Vec<BatchItemResponse>,
) -> Vec<BatchItemResponse> {
    let mut positions = HashMap::with_capacity(chunk.len());
    for (position, item) in chunk.iter().enumerate() {
        positions.entry(item.b_id.as_str()).or_insert(position);
    }
    responses.sort_by_key(|response| {
        positions.get(response.b_id.as_str()).copied().unwrap_or(usize::MAX)
    });
    responses
}
