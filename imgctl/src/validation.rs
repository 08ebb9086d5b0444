//! Upload request validation and normalization.
//!
//! Validation is a pure function from a raw `(path, extension)` pair to
//! either a normalized [`UploadRequest`] or the complete list of violated
//! rules. Every violation is reported, not just the first, so clients can
//! fix a request in one round trip.

use serde::Serialize;
use utoipa::ToSchema;

/// The fixed allow-list of upload extensions and their declared content types.
///
/// Extensions are case-normalized to lowercase before comparison, so `"PNG"`
/// and `"Png"` both resolve to [`ImageExtension::Png`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ImageExtension {
    Jpeg,
    Jpg,
    Png,
    Gif,
    Webp,
    Avif,
    Svg,
}

impl ImageExtension {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "jpeg" => Some(Self::Jpeg),
            "jpg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::Webp),
            "avif" => Some(Self::Avif),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
            Self::Avif => "avif",
            Self::Svg => "svg",
        }
    }

    /// Content type the presigned upload is bound to
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Jpeg | Self::Jpg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
            Self::Avif => "image/avif",
            Self::Svg => "image/svg+xml",
        }
    }
}

impl std::fmt::Display for ImageExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A normalized, policy-conforming upload request.
///
/// `path` has leading/trailing slashes trimmed; the extension is typed.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub path: String,
    pub extension: ImageExtension,
}

/// Machine-readable violation codes for the `invalidParams` problem field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ViolationCode {
    PathCharacters,
    PathTraversal,
    ExtensionUnknown,
    KeyMalformed,
    DimensionNotNumeric,
    DimensionExceeded,
}

/// One entry of the `invalidParams` list in a problem-detail body.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InvalidParam {
    /// Name of the offending request parameter
    pub name: &'static str,
    /// Stable violation code
    pub code: ViolationCode,
    /// Human-readable explanation
    pub reason: String,
}

impl InvalidParam {
    pub fn new(name: &'static str, code: ViolationCode, reason: impl Into<String>) -> Self {
        Self {
            name,
            code,
            reason: reason.into(),
        }
    }
}

fn is_allowed_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '/'
}

/// Validate and normalize a raw upload request.
///
/// Trims leading/trailing slashes from `path` and lowercases `extension`.
/// Returns every violated rule on failure. No side effects.
pub fn normalize(path: &str, extension: &str) -> Result<UploadRequest, Vec<InvalidParam>> {
    let mut violations = Vec::new();

    let path = path.trim_matches('/');

    if path.is_empty() || !path.chars().all(is_allowed_path_char) {
        violations.push(InvalidParam::new(
            "path",
            ViolationCode::PathCharacters,
            "Path may only contain letters, digits, '_', '-' and '/'",
        ));
    }

    if path.contains("..") {
        violations.push(InvalidParam::new(
            "path",
            ViolationCode::PathTraversal,
            "Path traversal patterns are not allowed",
        ));
    }

    let extension = match ImageExtension::parse(extension) {
        Some(ext) => Some(ext),
        None => {
            violations.push(InvalidParam::new(
                "extension",
                ViolationCode::ExtensionUnknown,
                format!("Extension '{extension}' is not an allowed image extension"),
            ));
            None
        }
    };

    match (violations.is_empty(), extension) {
        (true, Some(extension)) => Ok(UploadRequest {
            path: path.to_string(),
            extension,
        }),
        _ => Err(violations),
    }
}

/// Validate a delivery object key extracted from the request path.
///
/// The router has already stripped the route prefix; what remains must be a
/// non-empty relative key without traversal sequences.
pub fn validate_key(key: &str) -> Result<(), Vec<InvalidParam>> {
    let mut violations = Vec::new();

    if key.is_empty() {
        violations.push(InvalidParam::new(
            "key",
            ViolationCode::KeyMalformed,
            "Object key is empty",
        ));
    } else if key.starts_with('/') {
        violations.push(InvalidParam::new(
            "key",
            ViolationCode::KeyMalformed,
            "Object key must not begin with '/'",
        ));
    }

    if key.contains("..") {
        violations.push(InvalidParam::new(
            "key",
            ViolationCode::PathTraversal,
            "Path traversal patterns are not allowed",
        ));
    }

    if violations.is_empty() { Ok(()) } else { Err(violations) }
}
