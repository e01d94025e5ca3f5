use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use tracing::debug;

use crate::adapters::{AdapterError, ReadResult, StorageAdapter, StreamResult, WriteConfig};
use crate::client::ResourceClient;
use crate::graph::{contained_resources, JSON_LD};
use crate::metadata::Metadata;
use crate::mime::{ExtensionGuesser, MimeGuesser};
use crate::tombstone::{self, DeleteOutcome};

const DIGEST: HeaderName = HeaderName::from_static("digest");

/// A [`StorageAdapter`] backed by a Linked Data Platform repository.
///
/// Binary resources (LDP NonRDFSources) appear as files and every other
/// resource as a directory. Nothing is cached: each call answers from fresh
/// HTTP round trips, issued one after another.
pub struct LdpAdapter {
    client: Arc<dyn ResourceClient>,
    mime: Arc<dyn MimeGuesser>,
}

impl LdpAdapter {
    pub fn new(client: Arc<dyn ResourceClient>, mime: Arc<dyn MimeGuesser>) -> Self {
        Self { client, mime }
    }

    /// An adapter that guesses content types from file extensions.
    pub fn with_client(client: Arc<dyn ResourceClient>) -> Self {
        Self::new(client, Arc::new(ExtensionGuesser))
    }

    /// Delete `path`, reporting whether a tombstone was left behind.
    pub async fn delete_resource(&self, path: &str) -> Result<DeleteOutcome, AdapterError> {
        tombstone::delete_resource(self.client.as_ref(), path).await
    }

    /// Path of a repository URI relative to the base URI.
    fn relative_path(&self, uri: &str) -> Result<String, AdapterError> {
        uri.strip_prefix(self.client.base_uri())
            .map(str::to_string)
            .ok_or_else(|| AdapterError::ForeignResource(uri.to_string()))
    }

    async fn save(
        &self,
        path: &str,
        contents: Bytes,
        headers: HeaderMap,
    ) -> Result<Option<Metadata>, AdapterError> {
        let response = self.client.save_resource(path, contents, headers).await?;
        debug!(path = %path, status = %response.status, "Saved resource");
        match response.status {
            // The write response carries no metadata, so ask again.
            StatusCode::CREATED | StatusCode::NO_CONTENT => self.get_metadata(path).await,
            _ => Ok(None),
        }
    }

    fn list_directory<'a>(
        &'a self,
        directory: &'a str,
        recursive: bool,
    ) -> BoxFuture<'a, Result<Vec<Metadata>, AdapterError>> {
        async move {
            let directory = directory.trim_matches(|c: char| c == '/' || c.is_whitespace());

            match self.get_metadata(directory).await? {
                Some(meta) if meta.is_dir() => {}
                _ => return Ok(Vec::new()),
            }

            let mut headers = HeaderMap::new();
            headers.insert(ACCEPT, HeaderValue::from_static(JSON_LD));
            let response = self.client.get_resource(directory, headers).await?;
            if response.status != StatusCode::OK {
                debug!(path = %directory, status = %response.status, "Listing unavailable");
                return Ok(Vec::new());
            }
            let document = response.bytes().await?;

            let node_id = format!("{}{}", self.client.base_uri(), directory);
            let children = contained_resources(&document, &node_id)?
                .iter()
                .map(|uri| self.relative_path(uri))
                .collect::<Result<Vec<_>, _>>()?;

            // Descendants of later children come first, followed by the
            // direct children themselves. Nothing is deduplicated.
            let mut listing = Vec::new();
            if recursive {
                for child in &children {
                    let mut descendants = self.list_directory(child, true).await?;
                    descendants.append(&mut listing);
                    listing = descendants;
                }
            }
            for child in &children {
                if let Some(meta) = self.get_metadata(child).await? {
                    listing.push(meta);
                }
            }
            Ok(listing)
        }
        .boxed()
    }
}

#[async_trait]
impl StorageAdapter for LdpAdapter {
    async fn has(&self, path: &str) -> Result<bool, AdapterError> {
        let response = self.client.head_resource(path).await?;
        Ok(response.status == StatusCode::OK)
    }

    async fn read(&self, path: &str) -> Result<Option<ReadResult>, AdapterError> {
        let response = self.client.get_resource(path, HeaderMap::new()).await?;
        if response.status != StatusCode::OK {
            debug!(path = %path, status = %response.status, "Read failed");
            return Ok(None);
        }
        let metadata = Metadata::from_headers(path, &response.headers)?;
        let contents = response.bytes().await?;
        Ok(Some(ReadResult { metadata, contents }))
    }

    async fn read_stream(&self, path: &str) -> Result<Option<StreamResult>, AdapterError> {
        let response = self.client.get_resource(path, HeaderMap::new()).await?;
        if response.status != StatusCode::OK {
            debug!(path = %path, status = %response.status, "Read failed");
            return Ok(None);
        }
        let metadata = Metadata::from_headers(path, &response.headers)?;
        let stream = metadata.is_file().then_some(response.body);
        Ok(Some(StreamResult { metadata, stream }))
    }

    async fn list_contents(
        &self,
        directory: &str,
        recursive: bool,
    ) -> Result<Vec<Metadata>, AdapterError> {
        self.list_directory(directory, recursive).await
    }

    async fn get_metadata(&self, path: &str) -> Result<Option<Metadata>, AdapterError> {
        let response = self.client.head_resource(path).await?;
        if response.status != StatusCode::OK {
            debug!(path = %path, status = %response.status, "No metadata");
            return Ok(None);
        }
        Metadata::from_headers(path, &response.headers).map(Some)
    }

    async fn write(
        &self,
        path: &str,
        contents: Bytes,
        config: &WriteConfig,
    ) -> Result<Option<Metadata>, AdapterError> {
        let mut headers = HeaderMap::new();
        let mimetype = self.mime.guess(path);
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&mimetype)
                .map_err(|e| AdapterError::InvalidHeader(CONTENT_TYPE.to_string(), e.to_string()))?,
        );
        if let Some(checksum) = &config.checksum {
            headers.insert(
                DIGEST,
                HeaderValue::from_str(&format!("sha1={checksum}"))
                    .map_err(|e| AdapterError::InvalidHeader(DIGEST.to_string(), e.to_string()))?,
            );
        }
        self.save(path, contents, headers).await
    }

    async fn delete(&self, path: &str) -> Result<bool, AdapterError> {
        Ok(self.delete_resource(path).await?.is_success())
    }

    async fn create_dir(&self, dirname: &str) -> Result<Option<Metadata>, AdapterError> {
        self.save(dirname, Bytes::new(), HeaderMap::new()).await
    }
}
