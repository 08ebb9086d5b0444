//! Object key generation.
//!
//! Keys are `{path}/{uuid}.{extension}` with a freshly generated v4 UUID.
//! Uniqueness is probabilistic but treated as certain; no existence check is
//! made against the store before issuing an upload URL for the key.

use crate::validation::ImageExtension;
use uuid::Uuid;

/// Generate a collision-resistant key component.
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// A fully addressed object within the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectKey {
    path: String,
    id: Uuid,
    extension: ImageExtension,
}

impl ObjectKey {
    pub fn new(path: &str, id: Uuid, extension: ImageExtension) -> Self {
        Self {
            path: path.to_string(),
            id,
            extension,
        }
    }
}

impl std::fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}.{}", self.path, self.id, self.extension)
    }
}
