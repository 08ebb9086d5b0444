//! HTTP request handlers for the gateway endpoints.
//!
//! - [`signed_url`]: upload-intent validation and signed PUT URL issuance
//! - [`delivery`]: cached, dimension-bounded image delivery
//!
//! Handlers validate at the boundary before any backend call is attempted,
//! and route every failure through [`crate::errors::ErrorResponder`] so all
//! error responses share the problem-detail shape.

pub mod delivery;
pub mod signed_url;
