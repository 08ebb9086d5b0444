//! Upload-intent handler: validate, generate a key, issue a signed PUT URL.

use crate::AppState;
use crate::api::models::{SignedUrlRequest, SignedUrlResponse};
use crate::errors::Result;
use crate::keys::{self, ObjectKey};
use crate::validation;
use axum::{
    Json,
    extract::{OriginalUri, State},
};

#[utoipa::path(
    post,
    path = "/signed-url",
    tag = "uploads",
    summary = "Issue a signed upload URL",
    description = "Validates the upload intent, generates a unique object key and returns a \
                   time-limited PUT URL. The client performs the upload directly against the \
                   returned URL; the gateway never sees the bytes.",
    request_body = SignedUrlRequest,
    responses(
        (status = 200, description = "Upload grant issued", body = SignedUrlResponse),
        (status = 400, description = "Request violates upload policy", body = crate::errors::ProblemDetails),
        (status = 500, description = "Storage backend failure", body = crate::errors::ProblemDetails)
    )
)]
pub async fn issue_signed_url(
    State(state): State<AppState>,
    OriginalUri(uri): OriginalUri,
    Json(body): Json<SignedUrlRequest>,
) -> Result<Json<SignedUrlResponse>> {
    // Fail fast: no backend call is attempted for an invalid request
    let upload = validation::normalize(&body.path, &body.extension)
        .map_err(|params| state.problems.invalid(params, uri.path()))?;

    let key = ObjectKey::new(&upload.path, keys::generate(), upload.extension);

    let url = state
        .store
        .presign_put(&key, upload.extension.content_type(), state.config.signed_urls.expiry_secs)
        .await
        .map_err(|e| state.problems.respond(e, uri.path()))?;

    tracing::info!(key = %key, "Issued signed upload URL");

    Ok(Json(SignedUrlResponse {
        url,
        key: key.to_string(),
    }))
}
