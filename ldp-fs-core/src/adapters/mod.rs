use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures::TryStreamExt;
use thiserror::Error;
use tracing::warn;

use crate::client::{ByteStream, ClientError};
use crate::metadata::Metadata;

pub mod ldp;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("Client error: {0}")]
    Client(#[from] ClientError),
    #[error("Missing header: {0}")]
    MissingHeader(String),
    #[error("Invalid header {0}: {1}")]
    InvalidHeader(String, String),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Graph node not found: {0}")]
    GraphNodeMissing(String),
    #[error("Malformed graph: {0}")]
    MalformedGraph(String),
    #[error("Resource outside of base URI: {0}")]
    ForeignResource(String),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// Options attached to a single write.
#[derive(Debug, Clone, Default)]
pub struct WriteConfig {
    /// SHA-1 checksum of the payload, forwarded as a `Digest` header.
    pub checksum: Option<String>,
}

impl WriteConfig {
    pub fn with_checksum(checksum: impl Into<String>) -> Self {
        Self {
            checksum: Some(checksum.into()),
        }
    }
}

/// Result of a fully drained read.
#[derive(Debug, Clone)]
pub struct ReadResult {
    pub metadata: Metadata,
    pub contents: Bytes,
}

/// Result of a streamed read. `stream` is only present for files.
pub struct StreamResult {
    pub metadata: Metadata,
    pub stream: Option<ByteStream>,
}

impl std::fmt::Debug for StreamResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamResult")
            .field("metadata", &self.metadata)
            .field("stream", &self.stream.as_ref().map(|_| "<stream>"))
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Private,
}

/// Drain a byte stream into a single contiguous buffer.
pub async fn collect_stream(stream: ByteStream) -> Result<Bytes, ClientError> {
    let buffer = stream
        .try_fold(BytesMut::new(), |mut buffer, chunk| async move {
            buffer.extend_from_slice(&chunk);
            Ok::<_, ClientError>(buffer)
        })
        .await?;
    Ok(buffer.freeze())
}

/// A hierarchical file store.
///
/// Ordinary "not found" or "rejected" outcomes are reported as `Ok(false)` or
/// `Ok(None)`. `Err` is reserved for transport failures and remote data the
/// adapter cannot interpret.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Whether a resource exists at `path`.
    async fn has(&self, path: &str) -> Result<bool, AdapterError>;

    /// Read a resource and its contents in one go.
    async fn read(&self, path: &str) -> Result<Option<ReadResult>, AdapterError>;

    /// Read a resource, leaving the body as an open stream.
    async fn read_stream(&self, path: &str) -> Result<Option<StreamResult>, AdapterError>;

    /// List the resources under `directory`, optionally descending into children.
    async fn list_contents(
        &self,
        directory: &str,
        recursive: bool,
    ) -> Result<Vec<Metadata>, AdapterError>;

    async fn get_metadata(&self, path: &str) -> Result<Option<Metadata>, AdapterError>;

    async fn get_size(&self, path: &str) -> Result<Option<u64>, AdapterError> {
        Ok(self.get_metadata(path).await?.and_then(|meta| meta.size))
    }

    async fn get_mimetype(&self, path: &str) -> Result<Option<String>, AdapterError> {
        Ok(self.get_metadata(path).await?.and_then(|meta| meta.mimetype))
    }

    async fn get_timestamp(&self, path: &str) -> Result<Option<i64>, AdapterError> {
        Ok(self.get_metadata(path).await?.map(|meta| meta.timestamp))
    }

    /// Create or replace the resource at `path`. Returns its metadata after the write.
    async fn write(
        &self,
        path: &str,
        contents: Bytes,
        config: &WriteConfig,
    ) -> Result<Option<Metadata>, AdapterError>;

    async fn write_stream(
        &self,
        path: &str,
        stream: ByteStream,
        config: &WriteConfig,
    ) -> Result<Option<Metadata>, AdapterError> {
        let contents = collect_stream(stream).await?;
        self.write(path, contents, config).await
    }

    async fn update(
        &self,
        path: &str,
        contents: Bytes,
        config: &WriteConfig,
    ) -> Result<Option<Metadata>, AdapterError> {
        self.write(path, contents, config).await
    }

    async fn update_stream(
        &self,
        path: &str,
        stream: ByteStream,
        config: &WriteConfig,
    ) -> Result<Option<Metadata>, AdapterError> {
        self.write_stream(path, stream, config).await
    }

    async fn delete(&self, path: &str) -> Result<bool, AdapterError>;

    async fn delete_dir(&self, dirname: &str) -> Result<bool, AdapterError> {
        self.delete(dirname).await
    }

    async fn create_dir(&self, dirname: &str) -> Result<Option<Metadata>, AdapterError>;

    /// Copy by streaming a read of `path` into a write of `new_path`.
    ///
    /// Only files carry a stream, so copying a directory reports `false`.
    async fn copy(&self, path: &str, new_path: &str) -> Result<bool, AdapterError> {
        let Some(source) = self.read_stream(path).await? else {
            return Ok(false);
        };
        let Some(stream) = source.stream else {
            return Ok(false);
        };
        let written = self
            .write_stream(new_path, stream, &WriteConfig::default())
            .await?;
        Ok(written.is_some())
    }

    /// Copy then delete. Not atomic: if the delete fails both copies remain.
    async fn rename(&self, path: &str, new_path: &str) -> Result<bool, AdapterError> {
        if !self.copy(path, new_path).await? {
            return Ok(false);
        }
        let deleted = self.delete(path).await?;
        if !deleted {
            warn!(
                path = %path,
                new_path = %new_path,
                "Copied resource but failed to remove the source"
            );
        }
        Ok(deleted)
    }

    fn get_visibility(&self, _path: &str) -> Result<Visibility, AdapterError> {
        Err(AdapterError::Unsupported("visibility".to_string()))
    }

    fn set_visibility(&self, _path: &str, _visibility: Visibility) -> Result<(), AdapterError> {
        Err(AdapterError::Unsupported("visibility".to_string()))
    }
}
