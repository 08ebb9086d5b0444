//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for the two gateway operations
//! - **[`models`]**: Request/response data structures
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`;
//! the generated document is served at `/docs` when the server is running.

pub mod handlers;
pub mod models;
