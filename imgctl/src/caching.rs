//! HTTP cache metadata for delivered images.
//!
//! Renditions never change once produced, so responses carry a long-lived
//! immutable Cache-Control directive and a deterministic ETag. The ETag is a
//! SHA-256 of a canonicalized request form: the request path plus the
//! recognized dimension parameters in a fixed order. Reordered query strings
//! for the same rendition therefore hash identically.

use crate::transform::Dimensions;
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// Compute the quoted ETag for a delivery request.
pub fn etag(path: &str, dimensions: Dimensions) -> String {
    let mut canonical = path.to_string();
    let mut separator = '?';
    if let Some(width) = dimensions.width {
        let _ = write!(canonical, "{separator}width={width}");
        separator = '&';
    }
    if let Some(height) = dimensions.height {
        let _ = write!(canonical, "{separator}height={height}");
    }

    let digest = Sha256::digest(canonical.as_bytes());
    let mut hex = String::with_capacity(2 + digest.len() * 2);
    hex.push('"');
    for byte in digest {
        let _ = write!(hex, "{byte:02x}");
    }
    hex.push('"');
    hex
}

/// Cache-Control value for successfully delivered images.
pub fn cache_control(max_age_secs: u64) -> String {
    format!("public, max-age={max_age_secs}, immutable")
}
