//! Request body buffering for echo mode.

use axum::body::{Body, Bytes};

use crate::content::ContentError;

/// Drain `body` into memory. Bodies larger than `limit` bytes are rejected
/// and whatever was read so far is dropped.
pub async fn buffer_request_body(body: Body, limit: usize) -> Result<Bytes, ContentError> {
    axum::body::to_bytes(body, limit)
        .await
        .map_err(ContentError::Body)
}
