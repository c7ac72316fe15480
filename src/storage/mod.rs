//! Blob storage collaborator.
//!
//! Documents are read from and generated audio is written to an Azure Blob Storage account over
//! its REST API, authorized by the shared access signature carried in the connection string.

pub mod azure;
pub mod connection;

pub use azure::AzureBlobClient;
pub use connection::ConnectionString;

use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned while talking to blob storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Connection string was malformed or lacked a usable credential.
    #[error("Invalid storage connection string: {0}")]
    InvalidConnectionString(String),
    /// Container or blob name could not be turned into a request URL.
    #[error("Invalid blob address: {0}")]
    InvalidAddress(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Storage responded with an unexpected status code.
    #[error("Unexpected storage response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the storage service.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Fetch-by-key and store-by-key access to named containers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Download a blob; `Ok(None)` when no blob exists under `key`.
    async fn fetch(&self, container: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Upload `data` under `key`, replacing any existing blob.
    async fn store(
        &self,
        container: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError>;
}
