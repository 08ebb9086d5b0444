//! Gateway error taxonomy and the uniform problem-detail responder.
//!
//! Every handler failure is rendered by [`ErrorResponder`] as an RFC 7807
//! `application/problem+json` body, including 404s, so clients see one error
//! shape everywhere. Upstream failures are logged with their full chain but
//! surfaced only as a generic detail string.

use crate::validation::InvalidParam;
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error as ThisError;
use url::Url;
use utoipa::ToSchema;

#[derive(ThisError, Debug)]
pub enum Error {
    /// One or more request parameters violate policy
    #[error("Invalid request parameters")]
    Validation { params: Vec<InvalidParam> },

    /// Requested object does not exist in the store
    #[error("Object '{key}' not found")]
    NotFound { key: String },

    /// Storage or transform backend failure. Never shown to the caller.
    #[error("Failed to {operation}")]
    Upstream {
        operation: &'static str,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// RFC 7807 problem-detail body.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    /// URI identifying the failure category
    pub r#type: String,
    /// Short human-readable summary, fixed per category
    pub title: String,
    /// Explanation specific to this occurrence
    pub detail: String,
    /// Request path that produced the problem
    pub instance: String,
    /// Itemized rule violations, present for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invalid_params: Option<Vec<InvalidParam>>,
}

/// A fully rendered problem response, ready to convert into an HTTP reply.
#[derive(Debug)]
pub struct Problem {
    status: StatusCode,
    body: ProblemDetails,
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        let headers = response.headers_mut();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/problem+json"),
        );
        headers.insert(header::CONTENT_LANGUAGE, HeaderValue::from_static("en"));
        response
    }
}

/// Renders every handler failure as a problem-detail response.
///
/// Owns the base URL from which `type` URIs are built. Constructed once at
/// startup and shared read-only through `AppState`.
#[derive(Debug, Clone)]
pub struct ErrorResponder {
    problem_base: Url,
}

impl ErrorResponder {
    pub fn new(cdn_url: &Url) -> Self {
        Self {
            problem_base: cdn_url.clone(),
        }
    }

    fn type_uri(&self, segment: &str) -> String {
        let base = self.problem_base.as_str().trim_end_matches('/');
        format!("{base}/problem/{segment}")
    }

    /// Render an error for the request at `instance`, logging per severity.
    pub fn respond(&self, error: Error, instance: &str) -> Problem {
        match &error {
            Error::Upstream { .. } => {
                tracing::error!(instance, "Upstream failure: {}", error_chain(&error));
            }
            Error::NotFound { key } => {
                tracing::debug!(instance, key, "Object not found");
            }
            Error::Validation { params } => {
                tracing::debug!(instance, violations = params.len(), "Validation failure");
            }
        }

        let status = error.status_code();
        let body = match error {
            Error::Validation { params } => ProblemDetails {
                r#type: self.type_uri("invalid"),
                title: "Bad Request".to_string(),
                detail: params
                    .iter()
                    .map(|p| p.reason.as_str())
                    .collect::<Vec<_>>()
                    .join("; "),
                instance: instance.to_string(),
                invalid_params: Some(params),
            },
            Error::NotFound { key } => ProblemDetails {
                r#type: self.type_uri("not-found"),
                title: "Not Found".to_string(),
                detail: format!("No object is stored under '{key}'"),
                instance: instance.to_string(),
                invalid_params: None,
            },
            Error::Upstream { operation, .. } => ProblemDetails {
                r#type: self.type_uri("internal-error"),
                title: "Internal Server Error".to_string(),
                detail: format!("Failed to {operation}"),
                instance: instance.to_string(),
                invalid_params: None,
            },
        };

        Problem { status, body }
    }

    /// Shorthand for validation failures coming out of the validator.
    pub fn invalid(&self, params: Vec<InvalidParam>, instance: &str) -> Problem {
        self.respond(Error::Validation { params }, instance)
    }
}

fn error_chain(error: &Error) -> String {
    use std::fmt::Write;
    let mut rendered = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let _ = write!(rendered, ": {cause}");
        source = cause.source();
    }
    rendered
}

/// Type alias for fallible handler results
pub type Result<T> = std::result::Result<T, Problem>;
