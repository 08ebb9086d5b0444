//! Request/response data structures for the gateway API.
//!
//! All entities here are transient: owned by the handling request and
//! discarded on completion.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Body of `POST /signed-url`: an upload intent.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SignedUrlRequest {
    /// Logical path the upload will live under (e.g. "images/avatars")
    pub path: String,
    /// File extension of the upload (case-insensitive)
    pub extension: String,
}

/// A freshly issued upload grant.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SignedUrlResponse {
    /// Time-limited PUT URL the client uploads to directly
    pub url: String,
    /// Object key the upload will be stored under
    pub key: String,
}
