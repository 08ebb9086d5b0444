//! Configuration loading and validation.
//!
//! Configuration is layered with [figment]: a YAML file provides the base,
//! and environment variables prefixed with `IMGCTL_` override individual
//! values. Nested fields use `__` as the separator.
//!
//! ```bash
//! # Override the bind port
//! IMGCTL_PORT=8080
//!
//! # Override nested values
//! IMGCTL_STORAGE__BUCKET="my-bucket"
//! IMGCTL_STORAGE__SECRET_ACCESS_KEY="..."
//! IMGCTL_DELIVERY__TRANSFORM_URL="https://transform.example.com"
//! ```
//!
//! All configuration is validated once at startup; an invalid configuration
//! is fatal and the process refuses to serve traffic.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "IMGCTL_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded from YAML and environment variables. All fields have defaults
/// apart from the storage credentials, which must be supplied.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Public base URL of this gateway (e.g., "https://cdn.example.com").
    /// Used to build the `type` URIs in problem-detail error bodies.
    pub cdn_url: Url,
    /// CORS policy applied to all routes
    pub cors: CorsConfig,
    /// S3-compatible object store connection
    pub storage: StorageConfig,
    /// Signed upload URL issuance
    pub signed_urls: SignedUrlConfig,
    /// Image delivery behavior
    pub delivery: DeliveryConfig,
}

/// CORS policy: a single allowed origin, GET and POST only.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// The one origin allowed to call the gateway from a browser
    pub allowed_origin: Url,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: Url::parse("http://localhost:3000").expect("valid default origin"),
        }
    }
}

/// Connection settings for the S3-compatible object store.
///
/// Works against AWS S3, Cloudflare R2, MinIO and anything else speaking the
/// S3 API. Credentials are static; rotation is a deployment concern.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorageConfig {
    /// Endpoint URL of the store (e.g., "https://<account>.r2.cloudflarestorage.com")
    pub endpoint: Url,
    /// Region name. Non-AWS stores often accept any value here.
    pub region: String,
    /// Bucket holding the images
    pub bucket: String,
    /// Access key id for the store
    pub access_key_id: String,
    /// Secret access key for the store
    pub secret_access_key: String,
    /// Address the bucket as a path segment rather than a subdomain.
    /// Required by MinIO and most local S3 emulators.
    pub force_path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse("http://localhost:9000").expect("valid default endpoint"),
            region: "auto".to_string(),
            bucket: "images".to_string(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            force_path_style: false,
        }
    }
}

/// Signed upload URL settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SignedUrlConfig {
    /// Seconds until an issued upload URL expires
    pub expiry_secs: u64,
}

impl Default for SignedUrlConfig {
    fn default() -> Self {
        Self { expiry_secs: 3600 }
    }
}

/// Image delivery settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeliveryConfig {
    /// Optional base URL of the on-the-fly image transform backend.
    /// When unset, objects are served raw from the store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform_url: Option<Url>,
    /// Largest accepted width/height in pixels
    pub max_dimension: u32,
    /// `max-age` seconds for the Cache-Control header on delivered images
    pub cache_max_age_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            transform_url: None,
            max_dimension: 3000,
            cache_max_age_secs: 315_360_000, // 10 years; renditions are immutable
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8787,
            cdn_url: Url::parse("http://localhost:8787").expect("valid default cdn_url"),
            cors: CorsConfig::default(),
            storage: StorageConfig::default(),
            signed_urls: SignedUrlConfig::default(),
            delivery: DeliveryConfig::default(),
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(figment::Error::from)?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values
            .merge(Env::prefixed("IMGCTL_").split("__"))
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), String> {
        if self.storage.bucket.is_empty() {
            return Err("Config validation: storage.bucket cannot be empty".to_string());
        }

        if self.storage.access_key_id.is_empty() || self.storage.secret_access_key.is_empty() {
            return Err(
                "Config validation: storage credentials are not configured. \
                 Set IMGCTL_STORAGE__ACCESS_KEY_ID and IMGCTL_STORAGE__SECRET_ACCESS_KEY \
                 or add them to the config file."
                    .to_string(),
            );
        }

        if self.signed_urls.expiry_secs == 0 {
            return Err("Config validation: signed_urls.expiry_secs must be positive".to_string());
        }

        // S3 presigning caps expiry at 7 days
        if self.signed_urls.expiry_secs > 604_800 {
            return Err(
                "Config validation: signed_urls.expiry_secs cannot exceed 604800 (7 days)".to_string(),
            );
        }

        if self.delivery.max_dimension == 0 {
            return Err("Config validation: delivery.max_dimension must be positive".to_string());
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
