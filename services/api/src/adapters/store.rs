//! services/api/src/adapters/store.rs
//!
//! This module contains the adapter for the hosted document store. It
//! implements the `DocumentStore` port from the `core` crate against a
//! plain REST mapping of the key-path interface: documents live at
//! `{base}/{path}`, collections accept POSTs, and merge writes use
//! PATCH.

use async_trait::async_trait;
use serde::Deserialize;
use study_spark_core::ports::{DocumentStore, StoreError, StoreResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A document-store adapter speaking the key-path REST convention.
#[derive(Clone)]
pub struct RestDocumentStore {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct AppendResponse {
    id: String,
}

impl RestDocumentStore {
    /// Creates a new `RestDocumentStore`.
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn check_status(response: reqwest::Response) -> StoreResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for RestDocumentStore {
    async fn get(&self, path: &str) -> StoreResult<Option<serde_json::Value>> {
        let response = self
            .http
            .get(self.url_for(path))
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = Self::check_status(response).await?;
        let document = response
            .json::<serde_json::Value>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(Some(document))
    }

    async fn set(&self, path: &str, value: serde_json::Value, merge: bool) -> StoreResult<()> {
        let url = self.url_for(path);
        let request = if merge {
            self.http.patch(format!("{}?merge=true", url))
        } else {
            self.http.put(url)
        };

        let response = request
            .json(&value)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Self::check_status(response).await?;
        Ok(())
    }

    async fn append(
        &self,
        collection_path: &str,
        value: serde_json::Value,
    ) -> StoreResult<String> {
        let response = self
            .http
            .post(self.url_for(collection_path))
            .json(&value)
            .send()
            .await
            .map_err(|e| StoreError::Transport(e.to_string()))?;

        let response = Self::check_status(response).await?;
        let body = response
            .json::<AppendResponse>()
            .await
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(body.id)
    }
}
