//! In-memory LDP repository used by the unit tests.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{stream, StreamExt};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, CONTENT_LENGTH, CONTENT_TYPE, LAST_MODIFIED, LINK,
};
use reqwest::StatusCode;

use crate::client::{BodyResponse, ByteStream, ClientError, ResourceClient, ResourceResponse};
use crate::graph::{JSON_LD, LDP_CONTAINS};
use crate::metadata::NON_RDF_SOURCE;

pub(crate) const BASE_URI: &str = "http://localhost:8080/rest/";
pub(crate) const MODIFIED: &str = "Wed, 21 Oct 2015 07:28:00 GMT";
pub(crate) const MODIFIED_EPOCH: i64 = 1445412480;

const TOMBSTONE_SUFFIX: &str = "/fcr:tombstone";

#[derive(Clone)]
enum Entry {
    File { content_type: String, body: Bytes },
    Container,
}

#[derive(Default)]
struct State {
    entries: BTreeMap<String, Entry>,
    tombstones: BTreeSet<String>,
    delete_overrides: HashMap<String, StatusCode>,
    save_overrides: HashMap<String, StatusCode>,
    listing_overrides: HashMap<String, Bytes>,
    requests: Vec<String>,
}

pub(crate) struct FakeRepository {
    state: Mutex<State>,
    leave_tombstones: bool,
    tombstone_links: bool,
    tombstone_delete_status: StatusCode,
}

impl FakeRepository {
    pub fn new() -> Self {
        let mut state = State::default();
        state.entries.insert(String::new(), Entry::Container);
        Self {
            state: Mutex::new(state),
            leave_tombstones: false,
            tombstone_links: true,
            tombstone_delete_status: StatusCode::NO_CONTENT,
        }
    }

    /// Deleted resources turn into tombstones.
    pub fn with_tombstones(mut self) -> Self {
        self.leave_tombstones = true;
        self
    }

    /// Tombstones answer 410 without advertising themselves.
    pub fn without_tombstone_links(mut self) -> Self {
        self.tombstone_links = false;
        self
    }

    pub fn with_tombstone_delete_status(mut self, status: StatusCode) -> Self {
        self.tombstone_delete_status = status;
        self
    }

    pub fn put_file(&self, path: &str, content_type: &str, body: impl Into<Bytes>) {
        self.insert(
            path,
            Entry::File {
                content_type: content_type.to_string(),
                body: body.into(),
            },
        );
    }

    pub fn put_dir(&self, path: &str) {
        self.insert(path, Entry::Container);
    }

    pub fn exists(&self, path: &str) -> bool {
        self.state.lock().unwrap().entries.contains_key(&key(path))
    }

    pub fn is_tombstone(&self, path: &str) -> bool {
        self.state.lock().unwrap().tombstones.contains(&key(path))
    }

    pub fn body(&self, path: &str) -> Option<Bytes> {
        match self.state.lock().unwrap().entries.get(&key(path)) {
            Some(Entry::File { body, .. }) => Some(body.clone()),
            _ => None,
        }
    }

    pub fn fail_delete(&self, path: &str, status: StatusCode) {
        self.state
            .lock()
            .unwrap()
            .delete_overrides
            .insert(key(path), status);
    }

    pub fn fail_save(&self, path: &str, status: StatusCode) {
        self.state
            .lock()
            .unwrap()
            .save_overrides
            .insert(key(path), status);
    }

    /// Serve `body` instead of the generated JSON-LD listing for `path`.
    pub fn set_listing(&self, path: &str, body: impl Into<Bytes>) {
        self.state
            .lock()
            .unwrap()
            .listing_overrides
            .insert(key(path), body.into());
    }

    pub fn requests(&self) -> Vec<String> {
        self.state.lock().unwrap().requests.clone()
    }

    fn insert(&self, path: &str, entry: Entry) {
        let mut state = self.state.lock().unwrap();
        let key = key(path);
        let mut parent = parent(&key);
        while let Some(dir) = parent {
            state
                .entries
                .entry(dir.to_string())
                .or_insert(Entry::Container);
            parent = self::parent(dir);
        }
        state.tombstones.remove(&key);
        state.entries.insert(key, entry);
    }

    fn log(&self, method: &str, path: &str) {
        self.state
            .lock()
            .unwrap()
            .requests
            .push(format!("{method} {path}"));
    }

    fn entry_headers(entry: &Entry) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(LAST_MODIFIED, HeaderValue::from_static(MODIFIED));
        headers.append(
            LINK,
            HeaderValue::from_static(r#"<http://www.w3.org/ns/ldp#Resource>; rel="type""#),
        );
        match entry {
            Entry::File { content_type, body } => {
                headers.append(
                    LINK,
                    HeaderValue::from_str(&format!(r#"<{NON_RDF_SOURCE}>; rel="type""#)).unwrap(),
                );
                headers.insert(CONTENT_LENGTH, HeaderValue::from(body.len()));
                headers.insert(CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
            }
            Entry::Container => {
                headers.append(
                    LINK,
                    HeaderValue::from_static(
                        r#"<http://www.w3.org/ns/ldp#BasicContainer>; rel="type""#,
                    ),
                );
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("text/turtle"));
            }
        }
        headers
    }

    fn gone_headers(&self, key: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if self.tombstone_links {
            let link = format!(r#"<{BASE_URI}{key}{TOMBSTONE_SUFFIX}>; rel="hasTombstone""#);
            headers.insert(LINK, HeaderValue::from_str(&link).unwrap());
        }
        headers
    }

    fn listing(state: &State, key: &str) -> Bytes {
        if let Some(body) = state.listing_overrides.get(key) {
            return body.clone();
        }
        let members: Vec<_> = state
            .entries
            .keys()
            .filter(|candidate| !candidate.is_empty() && parent(candidate) == Some(key))
            .map(|child| serde_json::json!({ "@id": format!("{BASE_URI}{child}") }))
            .collect();
        let mut node = serde_json::json!({
            "@id": format!("{BASE_URI}{key}"),
            "@type": ["http://www.w3.org/ns/ldp#BasicContainer"],
        });
        if !members.is_empty() {
            node[LDP_CONTAINS] = serde_json::Value::Array(members);
        }
        let document = serde_json::json!([
            { "@id": format!("{BASE_URI}{key}/fcr:acl") },
            node,
        ]);
        Bytes::from(document.to_string())
    }
}

fn key(path: &str) -> String {
    path.strip_prefix(BASE_URI)
        .unwrap_or(path)
        .trim_matches('/')
        .to_string()
}

fn parent(key: &str) -> Option<&str> {
    if key.is_empty() {
        return None;
    }
    Some(key.rsplit_once('/').map(|(dir, _)| dir).unwrap_or(""))
}

fn body_stream(body: Bytes) -> ByteStream {
    // Several small chunks so readers have to drain the stream.
    let chunks: Vec<Result<Bytes, ClientError>> = body
        .chunks(4)
        .map(|chunk| Ok(Bytes::copy_from_slice(chunk)))
        .collect();
    stream::iter(chunks).boxed()
}

fn response(status: StatusCode, headers: HeaderMap) -> ResourceResponse {
    ResourceResponse { status, headers }
}

#[async_trait]
impl ResourceClient for FakeRepository {
    fn base_uri(&self) -> &str {
        BASE_URI
    }

    async fn head_resource(&self, path: &str) -> Result<ResourceResponse, ClientError> {
        self.log("HEAD", path);
        let key = key(path);
        let state = self.state.lock().unwrap();
        if state.tombstones.contains(&key) {
            return Ok(response(StatusCode::GONE, self.gone_headers(&key)));
        }
        Ok(match state.entries.get(&key) {
            Some(entry) => response(StatusCode::OK, Self::entry_headers(entry)),
            None => response(StatusCode::NOT_FOUND, HeaderMap::new()),
        })
    }

    async fn get_resource(
        &self,
        path: &str,
        headers: HeaderMap,
    ) -> Result<BodyResponse, ClientError> {
        self.log("GET", path);
        let key = key(path);
        let state = self.state.lock().unwrap();
        if state.tombstones.contains(&key) {
            return Ok(BodyResponse {
                status: StatusCode::GONE,
                headers: self.gone_headers(&key),
                body: body_stream(Bytes::new()),
            });
        }
        let Some(entry) = state.entries.get(&key) else {
            return Ok(BodyResponse {
                status: StatusCode::NOT_FOUND,
                headers: HeaderMap::new(),
                body: body_stream(Bytes::new()),
            });
        };
        let mut response_headers = Self::entry_headers(entry);
        let body = match entry {
            Entry::File { body, .. } => body.clone(),
            Entry::Container => {
                let wants_json_ld = headers
                    .get(ACCEPT)
                    .and_then(|value| value.to_str().ok())
                    .is_some_and(|value| value.contains(JSON_LD));
                if wants_json_ld {
                    response_headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_LD));
                    Self::listing(&state, &key)
                } else {
                    Bytes::from_static(b"<> a <http://www.w3.org/ns/ldp#BasicContainer> .")
                }
            }
        };
        Ok(BodyResponse {
            status: StatusCode::OK,
            headers: response_headers,
            body: body_stream(body),
        })
    }

    async fn save_resource(
        &self,
        path: &str,
        body: Bytes,
        headers: HeaderMap,
    ) -> Result<ResourceResponse, ClientError> {
        self.log("PUT", path);
        let key = key(path);
        let existed = {
            let state = self.state.lock().unwrap();
            if let Some(status) = state.save_overrides.get(&key) {
                return Ok(response(*status, HeaderMap::new()));
            }
            if state.tombstones.contains(&key) {
                return Ok(response(StatusCode::GONE, self.gone_headers(&key)));
            }
            state.entries.contains_key(&key)
        };

        let entry = match headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
            Some(content_type) => Entry::File {
                content_type: content_type.to_string(),
                body,
            },
            None => Entry::Container,
        };
        self.insert(&key, entry);

        let status = if existed {
            StatusCode::NO_CONTENT
        } else {
            StatusCode::CREATED
        };
        Ok(response(status, HeaderMap::new()))
    }

    async fn delete_resource(&self, path: &str) -> Result<ResourceResponse, ClientError> {
        self.log("DELETE", path);
        let key = key(path);
        let mut state = self.state.lock().unwrap();

        if let Some(deleted) = key.strip_suffix(TOMBSTONE_SUFFIX) {
            if !state.tombstones.contains(deleted) {
                return Ok(response(StatusCode::NOT_FOUND, HeaderMap::new()));
            }
            if self.tombstone_delete_status == StatusCode::NO_CONTENT {
                state.tombstones.remove(deleted);
            }
            return Ok(response(self.tombstone_delete_status, HeaderMap::new()));
        }

        if let Some(status) = state.delete_overrides.get(&key) {
            return Ok(response(*status, HeaderMap::new()));
        }
        if state.tombstones.contains(&key) {
            return Ok(response(StatusCode::GONE, self.gone_headers(&key)));
        }
        if !state.entries.contains_key(&key) {
            return Ok(response(StatusCode::NOT_FOUND, HeaderMap::new()));
        }

        let prefix = format!("{key}/");
        state
            .entries
            .retain(|candidate, _| candidate != &key && !candidate.starts_with(&prefix));
        if self.leave_tombstones {
            state.tombstones.insert(key);
        }
        Ok(response(StatusCode::NO_CONTENT, HeaderMap::new()))
    }
}
