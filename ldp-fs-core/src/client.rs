use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::{StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use tracing::debug;
use url::Url;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Response body as a stream of chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Invalid header: {0}")]
    InvalidHeader(String),
}

/// Status and headers of a response whose body is not needed.
#[derive(Debug, Clone)]
pub struct ResourceResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

/// A response with its body left unread.
pub struct BodyResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: ByteStream,
}

impl BodyResponse {
    /// Drain the body.
    pub async fn bytes(self) -> Result<Bytes, ClientError> {
        crate::adapters::collect_stream(self.body).await
    }
}

/// Raw access to the resources of an LDP repository.
///
/// `path` is relative to [`ResourceClient::base_uri`]. Implementations must
/// also accept absolute URLs, which the repository hands out in `Link`
/// headers.
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Base URI every relative path is resolved against. Always ends in `/`.
    fn base_uri(&self) -> &str;

    async fn head_resource(&self, path: &str) -> Result<ResourceResponse, ClientError>;

    async fn get_resource(
        &self,
        path: &str,
        headers: HeaderMap,
    ) -> Result<BodyResponse, ClientError>;

    async fn save_resource(
        &self,
        path: &str,
        body: Bytes,
        headers: HeaderMap,
    ) -> Result<ResourceResponse, ClientError>;

    async fn delete_resource(&self, path: &str) -> Result<ResourceResponse, ClientError>;
}

/// Connection settings for [`HttpResourceClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_uri: String,
    pub bearer_token: Option<String>,
    pub connect_timeout: Duration,
    pub timeout: Duration,
}

impl ClientConfig {
    pub fn new(base_uri: impl Into<String>) -> Self {
        Self {
            base_uri: base_uri.into(),
            bearer_token: None,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// A [`ResourceClient`] speaking HTTP through reqwest. Resources are saved with PUT.
pub struct HttpResourceClient {
    client: reqwest::Client,
    base_uri: String,
    authorization: Option<HeaderValue>,
}

impl HttpResourceClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut base_uri = config.base_uri.trim().to_string();
        if !base_uri.ends_with('/') {
            base_uri.push('/');
        }
        Url::parse(&base_uri).map_err(|e| ClientError::InvalidUrl(format!("{base_uri}: {e}")))?;

        let authorization = config
            .bearer_token
            .map(|token| {
                HeaderValue::from_str(&format!("Bearer {token}"))
                    .map_err(|e| ClientError::InvalidHeader(format!("Authorization: {e}")))
            })
            .transpose()?;

        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            base_uri,
            authorization,
        })
    }

    /// Resolve `path` against the base URI. Absolute URLs pass through untouched.
    pub fn resolve(&self, path: &str) -> Result<Url, ClientError> {
        let target = if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}{}", self.base_uri, path.trim_start_matches('/'))
        };
        Url::parse(&target).map_err(|e| ClientError::InvalidUrl(format!("{target}: {e}")))
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        headers: HeaderMap,
        body: Option<Bytes>,
    ) -> Result<reqwest::Response, ClientError> {
        let url = self.resolve(path)?;
        debug!(method = %method, url = %url, "Sending request");

        let mut request = self.client.request(method, url).headers(headers);
        if let Some(authorization) = &self.authorization {
            request = request.header(AUTHORIZATION, authorization.clone());
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        debug!(status = %response.status(), "Received response");
        Ok(response)
    }

    fn into_resource_response(response: reqwest::Response) -> ResourceResponse {
        ResourceResponse {
            status: response.status(),
            headers: response.headers().clone(),
        }
    }
}

#[async_trait]
impl ResourceClient for HttpResourceClient {
    fn base_uri(&self) -> &str {
        &self.base_uri
    }

    async fn head_resource(&self, path: &str) -> Result<ResourceResponse, ClientError> {
        let response = self.send(Method::HEAD, path, HeaderMap::new(), None).await?;
        Ok(Self::into_resource_response(response))
    }

    async fn get_resource(
        &self,
        path: &str,
        headers: HeaderMap,
    ) -> Result<BodyResponse, ClientError> {
        let response = self.send(Method::GET, path, headers, None).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes_stream().map_err(ClientError::from).boxed();
        Ok(BodyResponse {
            status,
            headers,
            body,
        })
    }

    async fn save_resource(
        &self,
        path: &str,
        body: Bytes,
        headers: HeaderMap,
    ) -> Result<ResourceResponse, ClientError> {
        let response = self.send(Method::PUT, path, headers, Some(body)).await?;
        Ok(Self::into_resource_response(response))
    }

    async fn delete_resource(&self, path: &str) -> Result<ResourceResponse, ClientError> {
        let response = self
            .send(Method::DELETE, path, HeaderMap::new(), None)
            .await?;
        Ok(Self::into_resource_response(response))
    }
}
