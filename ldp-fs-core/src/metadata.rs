use chrono::DateTime;
use reqwest::header::{HeaderMap, HeaderName, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED};
use serde::{Deserialize, Serialize};

use crate::adapters::AdapterError;
use crate::link::links_from_headers;

/// Type marker the repository attaches to binary resources.
pub const NON_RDF_SOURCE: &str = "http://www.w3.org/ns/ldp#NonRDFSource";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    File,
    #[serde(rename = "dir")]
    Directory,
}

/// What the repository reports about a resource. Rebuilt from response
/// headers on every call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: ResourceKind,
    /// Seconds since the Unix epoch, from `Last-Modified`.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mimetype: Option<String>,
}

impl Metadata {
    /// Build a metadata record from the headers of a HEAD or GET response.
    ///
    /// Resources typed as [`NON_RDF_SOURCE`] are files and must carry
    /// `Content-Length` and `Content-Type`. Everything else is a directory.
    pub fn from_headers(path: &str, headers: &HeaderMap) -> Result<Self, AdapterError> {
        let timestamp = parse_http_date(header_str(headers, &LAST_MODIFIED)?)?;

        let kind = if links_from_headers(headers)
            .iter()
            .any(|link| link.has_rel("type") && link.target == NON_RDF_SOURCE)
        {
            ResourceKind::File
        } else {
            ResourceKind::Directory
        };

        let (size, mimetype) = match kind {
            ResourceKind::File => {
                let length = header_str(headers, &CONTENT_LENGTH)?;
                let size = length.trim().parse::<u64>().map_err(|e| {
                    AdapterError::InvalidHeader(CONTENT_LENGTH.to_string(), format!("{length}: {e}"))
                })?;
                let mimetype = header_str(headers, &CONTENT_TYPE)?.to_string();
                (Some(size), Some(mimetype))
            }
            ResourceKind::Directory => (None, None),
        };

        Ok(Self {
            path: path.to_string(),
            kind,
            timestamp,
            size,
            mimetype,
        })
    }

    pub fn is_file(&self) -> bool {
        self.kind == ResourceKind::File
    }

    pub fn is_dir(&self) -> bool {
        self.kind == ResourceKind::Directory
    }
}

/// Parse an RFC 1123 date (`Sun, 06 Nov 1994 08:49:37 GMT`) into epoch seconds.
pub fn parse_http_date(value: &str) -> Result<i64, AdapterError> {
    DateTime::parse_from_rfc2822(value.trim())
        .map(|date| date.timestamp())
        .map_err(|e| AdapterError::InvalidTimestamp(format!("{value}: {e}")))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Result<&'a str, AdapterError> {
    let value = headers
        .get(name)
        .ok_or_else(|| AdapterError::MissingHeader(name.to_string()))?;
    value
        .to_str()
        .map_err(|e| AdapterError::InvalidHeader(name.to_string(), e.to_string()))
}
