//! Supabase Storage client for company logo uploads.
//!
//! Objects are written with the service key and served back through the
//! bucket's public URL.

use anyhow::{Context, Result};
use axum::body::Bytes;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, instrument};
use uuid::Uuid;

use crate::error::ApiError;

/// Content types accepted for company logos, with the extension used in the object key.
const LOGO_TYPES: &[(&str, &str)] = &[
    ("image/png", "png"),
    ("image/jpeg", "jpg"),
    ("image/webp", "webp"),
    ("image/gif", "gif"),
    ("image/svg+xml", "svg"),
];

/// File extension for an accepted logo content type.
pub fn logo_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    LOGO_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

/// Object key for a new logo: `<company_id>/<random>.<ext>`
pub fn logo_object_path(company_id: Uuid, extension: &str) -> String {
    format!("{}/{}.{}", company_id, Uuid::new_v4(), extension)
}

/// Client for the Supabase Storage REST API.
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
    secret_key: String,
    bucket: String,
}

/// Error body returned by Supabase Storage.
#[derive(Debug, Deserialize)]
struct StorageErrorResponse {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl StorageClient {
    pub fn new(base_url: &str, secret_key: &str, bucket: &str, timeout_seconds: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = base_url, bucket = bucket, "Storage client initialized");

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            bucket: bucket.to_string(),
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Public URL for an object in the bucket.
    pub fn public_url(&self, path: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    /// Upload an object and return its public URL.
    #[instrument(skip(self, data), fields(bucket = %self.bucket, size = data.len()))]
    pub async fn upload(&self, path: &str, content_type: &str, data: Bytes) -> Result<String, ApiError> {
        let url = self.object_url(path);
        debug!(url = %url, "Storage upload request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.secret_key)
            .header("apikey", &self.secret_key)
            .header("Content-Type", content_type)
            .header("x-upsert", "true")
            .body(data)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "Storage request failed");
                ApiError::Internal(anyhow::anyhow!("Storage service unavailable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<StorageErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.message.or(body.error))
                .unwrap_or_else(|| format!("Storage error: {}", status));

            error!(status = %status, message = %message, "Storage upload rejected");
            return Err(ApiError::Internal(anyhow::anyhow!(message)));
        }

        Ok(self.public_url(path))
    }
}
