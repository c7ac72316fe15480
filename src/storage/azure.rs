//! REST client for Azure Blob Storage.

use super::{BlobStore, ConnectionString, StorageError};
use crate::config::{StorageSettings, UpstreamSettings};
use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};

const API_VERSION: &str = "2021-08-06";

/// Lightweight HTTP client for blob downloads and block-blob uploads.
pub struct AzureBlobClient {
    client: Client,
    connection: ConnectionString,
}

impl AzureBlobClient {
    /// Construct a client from the configured connection string.
    pub fn new(
        settings: &StorageSettings,
        upstream: &UpstreamSettings,
    ) -> Result<Self, StorageError> {
        let connection = ConnectionString::parse(&settings.connection_string)?;
        let client = Client::builder()
            .user_agent("docscribe/storage")
            .timeout(upstream.timeout)
            .build()?;
        tracing::debug!(endpoint = %connection.blob_endpoint, "Initialized blob storage client");
        Ok(Self { client, connection })
    }

    fn blob_url(&self, container: &str, key: &str) -> Result<Url, StorageError> {
        if container.is_empty() || key.is_empty() {
            return Err(StorageError::InvalidAddress(
                "container and blob name must be non-empty".into(),
            ));
        }
        let mut url = Url::parse(&self.connection.blob_endpoint)
            .map_err(|error| StorageError::InvalidAddress(error.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| StorageError::InvalidAddress("endpoint cannot be a base URL".into()))?
            .pop_if_empty()
            .push(container)
            .extend(key.split('/'));
        url.set_query(Some(&self.connection.sas_token));
        Ok(url)
    }

    fn request(
        &self,
        method: Method,
        container: &str,
        key: &str,
    ) -> Result<RequestBuilder, StorageError> {
        let url = self.blob_url(container, key)?;
        Ok(self
            .client
            .request(method, url)
            .header("x-ms-version", API_VERSION))
    }
}

#[async_trait]
impl BlobStore for AzureBlobClient {
    async fn fetch(&self, container: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let response = self.request(Method::GET, container, key)?.send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                tracing::debug!(container, blob = key, "Blob not found");
                Ok(None)
            }
            status if status.is_success() => {
                let bytes = response.bytes().await?;
                tracing::debug!(container, blob = key, size = bytes.len(), "Blob downloaded");
                Ok(Some(bytes.to_vec()))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StorageError::UnexpectedStatus { status, body })
            }
        }
    }

    async fn store(
        &self,
        container: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let size = data.len();
        let response = self
            .request(Method::PUT, container, key)?
            .header("x-ms-blob-type", "BlockBlob")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(container, blob = key, size, "Blob uploaded");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StorageError::UnexpectedStatus { status, body };
            tracing::error!(container, blob = key, error = %error, "Blob upload failed");
            Err(error)
        }
    }
}
