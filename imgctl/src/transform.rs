//! On-the-fly image transform backend client.
//!
//! When a transform backend is configured, delivery requests are satisfied by
//! asking it for a rendition of the stored object at the requested
//! dimensions. Output format is fixed to a web-optimized encoding and
//! metadata is stripped; the transcoding itself is entirely the backend's
//! concern.

use crate::errors::Error;
use crate::storage::StoredObject;
use url::Url;

/// Requested rendition dimensions, already validated against the limit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Dimensions {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// Shared, read-only client for the transform backend.
#[derive(Debug, Clone)]
pub struct TransformClient {
    http: reqwest::Client,
    base_url: Url,
}

impl TransformClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn rendition_url(&self, key: &str, dimensions: Dimensions) -> Result<Url, Error> {
        let mut url = self.base_url.join(key).map_err(|e| Error::Upstream {
            operation: "fetch image rendition",
            source: anyhow::Error::new(e).context("malformed rendition URL"),
        })?;

        {
            let mut query = url.query_pairs_mut();
            if let Some(width) = dimensions.width {
                query.append_pair("width", &width.to_string());
            }
            if let Some(height) = dimensions.height {
                query.append_pair("height", &height.to_string());
            }
            query.append_pair("format", "webp");
            query.append_pair("metadata", "none");
        }

        Ok(url)
    }

    /// Fetch a rendition of `key` at the given dimensions.
    pub async fn fetch(&self, key: &str, dimensions: Dimensions) -> Result<StoredObject, Error> {
        let url = self.rendition_url(key, dimensions)?;

        let response = self.http.get(url).send().await.map_err(|e| Error::Upstream {
            operation: "fetch image rendition",
            source: anyhow::Error::new(e),
        })?;

        match response.status() {
            status if status.is_success() => {}
            reqwest::StatusCode::NOT_FOUND => {
                return Err(Error::NotFound { key: key.to_string() });
            }
            status => {
                return Err(Error::Upstream {
                    operation: "fetch image rendition",
                    source: anyhow::anyhow!("transform backend returned {status}"),
                });
            }
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await.map_err(|e| Error::Upstream {
            operation: "fetch image rendition",
            source: anyhow::Error::new(e),
        })?;

        Ok(StoredObject { bytes, content_type })
    }
}
