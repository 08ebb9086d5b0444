//! S3-compatible object store client.
//!
//! Wraps `aws-sdk-s3` for the two operations the gateway needs: presigning
//! write URLs for uploads and fetching raw objects for delivery. The client
//! (credentials + connection pool) is expensive to construct, so exactly one
//! [`ObjectStore`] is built in `Application::new` and shared read-only across
//! all requests.

use crate::config::StorageConfig;
use crate::errors::Error;
use crate::keys::ObjectKey;
use aws_sdk_s3::{
    Client as S3Client,
    config::{BehaviorVersion, Region},
    error::SdkError,
    operation::get_object::GetObjectError,
    presigning::PresigningConfig,
};
use bytes::Bytes;
use std::time::Duration;

/// A raw object fetched from the store.
#[derive(Debug)]
pub struct StoredObject {
    pub bytes: Bytes,
    /// Content type recorded in the object's metadata, if any
    pub content_type: Option<String>,
}

/// Shared, read-only handle to the object store.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    client: S3Client,
    bucket: String,
}

impl ObjectStore {
    /// Build the store client from configuration.
    ///
    /// Credentials are static; the endpoint may be AWS S3, Cloudflare R2,
    /// MinIO or any other S3-compatible store.
    pub fn new(config: &StorageConfig) -> Self {
        let credentials = aws_credential_types::Credentials::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            None,
            None,
            "imgctl-config",
        );

        let s3_config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .endpoint_url(config.endpoint.as_str())
            .credentials_provider(credentials)
            .force_path_style(config.force_path_style)
            .build();

        Self {
            client: S3Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
        }
    }

    /// Issue a time-limited PUT URL for `key`, bound to `content_type`.
    ///
    /// Presigning is a local signing operation; no request reaches the store
    /// until the caller performs the upload.
    pub async fn presign_put(
        &self,
        key: &ObjectKey,
        content_type: &str,
        expiry_secs: u64,
    ) -> Result<String, Error> {
        let presigning = PresigningConfig::expires_in(Duration::from_secs(expiry_secs)).map_err(|e| {
            Error::Upstream {
                operation: "issue signed URL",
                source: anyhow::Error::new(e).context("invalid presigning expiry"),
            }
        })?;

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.to_string())
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| Error::Upstream {
                operation: "issue signed URL",
                source: anyhow::Error::new(e),
            })?;

        Ok(presigned.uri().to_string())
    }

    /// Fetch a raw object. A missing key maps to [`Error::NotFound`].
    pub async fn get_object(&self, key: &str) -> Result<StoredObject, Error> {
        let output = match self.client.get_object().bucket(&self.bucket).key(key).send().await {
            Ok(output) => output,
            Err(SdkError::ServiceError(service_err))
                if matches!(service_err.err(), GetObjectError::NoSuchKey(_))
                    || service_err.raw().status().as_u16() == 404 =>
            {
                return Err(Error::NotFound { key: key.to_string() });
            }
            Err(e) => {
                return Err(Error::Upstream {
                    operation: "fetch object from store",
                    source: anyhow::Error::new(e),
                });
            }
        };

        let content_type = output.content_type().map(str::to_string);
        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| Error::Upstream {
                operation: "fetch object from store",
                source: anyhow::Error::new(e),
            })?
            .into_bytes();

        Ok(StoredObject { bytes, content_type })
    }
}
