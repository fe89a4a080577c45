//! services/api/src/adapters/object_store.rs
//!
//! This module contains the object storage adapter. It implements the
//! `ObjectStorageService` port from the `core` crate against an S3-style
//! HTTP endpoint: `PUT/GET {endpoint}/{bucket}/{key}` with a bearer
//! token. The provider itself is a black box; only the key convention
//! (`docs/{user_id}/{filename}`) is ours.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use uuid::Uuid;

use veridoc_core::ports::{ObjectStorageService, PortError, PortResult};

/// Builds the canonical object key for a user's uploaded document.
pub fn object_key(user_id: Uuid, filename: &str) -> String {
    format!("docs/{user_id}/{filename}")
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `ObjectStorageService` port over HTTP.
#[derive(Clone)]
pub struct HttpObjectStore {
    http: reqwest::Client,
    endpoint: String,
    bucket: String,
    token: String,
}

impl HttpObjectStore {
    /// Creates a new `HttpObjectStore`. The client carries a fixed
    /// request timeout so a stalled provider cannot hang a request
    /// forever.
    pub fn new(endpoint: &str, bucket: &str, token: &str) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            token: token.to_string(),
        })
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

//=========================================================================================
// `ObjectStorageService` Trait Implementation
//=========================================================================================

#[async_trait]
impl ObjectStorageService for HttpObjectStore {
    /// Stores an object and returns its URL.
    async fn put_object(
        &self,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> PortResult<String> {
        let url = self.object_url(key);
        let response = self
            .http
            .put(&url)
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| PortError::Infrastructure(format!("object upload failed: {e}")))?;

        if !response.status().is_success() {
            return Err(PortError::Infrastructure(format!(
                "object upload failed with status {}",
                response.status()
            )));
        }
        Ok(url)
    }

    /// Fetches an object's bytes by key.
    async fn get_object(&self, key: &str) -> PortResult<Vec<u8>> {
        let url = self.object_url(key);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| PortError::Infrastructure(format!("object download failed: {e}")))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(PortError::NotFound(format!("object {key} not found")));
        }
        if !response.status().is_success() {
            return Err(PortError::Infrastructure(format!(
                "object download failed with status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PortError::Infrastructure(format!("object body read failed: {e}")))?;
        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_follows_user_scoped_convention() {
        let user = Uuid::nil();
        assert_eq!(
            object_key(user, "invoice.pdf"),
            format!("docs/{user}/invoice.pdf")
        );
    }
}
