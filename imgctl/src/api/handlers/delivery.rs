//! Image delivery handler: key validation, dimension limits, rendition fetch
//! and cache metadata.

use crate::AppState;
use crate::caching;
use crate::errors::Result;
use crate::transform::Dimensions;
use crate::validation::{self, InvalidParam, ViolationCode};
use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use std::collections::HashMap;

/// Parse `width`/`height` strictly.
///
/// Non-numeric values are an explicit validation failure rather than being
/// coerced and silently slipping past the dimension limit.
fn parse_dimensions(
    query: &HashMap<String, String>,
    max_dimension: u32,
) -> std::result::Result<Dimensions, Vec<InvalidParam>> {
    let mut violations = Vec::new();
    let mut parsed = Dimensions::default();

    for (name, slot) in [("width", &mut parsed.width), ("height", &mut parsed.height)] {
        let Some(raw) = query.get(name) else { continue };

        match raw.parse::<u32>() {
            Ok(value) if value <= max_dimension => *slot = Some(value),
            Ok(value) => violations.push(InvalidParam::new(
                name,
                ViolationCode::DimensionExceeded,
                format!("{name} must be at most {max_dimension} pixels, got {value}"),
            )),
            Err(_) => violations.push(InvalidParam::new(
                name,
                ViolationCode::DimensionNotNumeric,
                format!("{name} must be a non-negative integer, got '{raw}'"),
            )),
        }
    }

    if violations.is_empty() { Ok(parsed) } else { Err(violations) }
}

#[utoipa::path(
    get,
    path = "/images/{key}",
    tag = "delivery",
    summary = "Deliver an image",
    description = "Serves the stored object, resized on the fly when a transform backend is \
                   configured. Responses carry a deterministic ETag and a long-lived immutable \
                   Cache-Control directive.",
    params(
        ("key" = String, Path, description = "Object key, including the logical path"),
        ("width" = Option<u32>, Query, description = "Rendition width in pixels (max 3000 by default)"),
        ("height" = Option<u32>, Query, description = "Rendition height in pixels (max 3000 by default)")
    ),
    responses(
        (status = 200, description = "Image bytes with cache headers"),
        (status = 304, description = "Client cache is still valid"),
        (status = 400, description = "Malformed key or oversized dimensions", body = crate::errors::ProblemDetails),
        (status = 404, description = "Object not stored", body = crate::errors::ProblemDetails),
        (status = 500, description = "Backend failure", body = crate::errors::ProblemDetails)
    )
)]
pub async fn deliver_image(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<HashMap<String, String>>,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
) -> Result<Response> {
    let mut violations = validation::validate_key(&key).err().unwrap_or_default();

    let dimensions = match parse_dimensions(&query, state.config.delivery.max_dimension) {
        Ok(dimensions) => dimensions,
        Err(mut dimension_violations) => {
            violations.append(&mut dimension_violations);
            Dimensions::default()
        }
    };

    if !violations.is_empty() {
        return Err(state.problems.invalid(violations, uri.path()));
    }

    let etag = caching::etag(uri.path(), dimensions);
    let cache_control = caching::cache_control(state.config.delivery.cache_max_age_secs);

    // Revalidation short-circuits before any backend call
    if headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|candidates| candidates.split(',').any(|c| c.trim() == etag))
    {
        return Ok((
            StatusCode::NOT_MODIFIED,
            [(header::ETAG, etag), (header::CACHE_CONTROL, cache_control)],
        )
            .into_response());
    }

    let object = match &state.transform {
        Some(transform) => transform.fetch(&key, dimensions).await,
        None => state.store.get_object(&key).await,
    }
    .map_err(|e| state.problems.respond(e, uri.path()))?;

    let content_type = object.content_type.unwrap_or_else(|| {
        mime_guess::from_path(&key)
            .first_raw()
            .unwrap_or("application/octet-stream")
            .to_string()
    });

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, content_type),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, cache_control),
        ],
        object.bytes,
    )
        .into_response())
}
