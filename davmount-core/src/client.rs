use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use thiserror::Error;
use tracing::debug;
use url::Url;

#[derive(Debug, Error)]
pub enum DavError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),
    #[error("url cannot carry path segments: {0}")]
    CannotBeABase(String),
    #[error("invalid http method: {0}")]
    InvalidMethod(&'static str),
    #[error("server returned {status}")]
    Http {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DavErrorClass {
    Auth,
    NameTaken,
    Missing,
    InsufficientStorage,
    Transient,
    Permanent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

#[derive(Clone)]
pub struct DavClient {
    http: Client,
    credentials: Option<Credentials>,
}

impl DavClient {
    pub fn new() -> Result<Self, DavError> {
        Self::with_options(None, None)
    }

    pub fn with_options(
        credentials: Option<Credentials>,
        timeout: Option<Duration>,
    ) -> Result<Self, DavError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            credentials,
        })
    }

    pub async fn copy(&self, from: &Url, to: &Url, overwrite: bool) -> Result<(), DavError> {
        let response = self
            .request(dav_method(b"COPY", "COPY")?, from)
            .header("Destination", to.as_str())
            .header("Overwrite", overwrite_flag(overwrite))
            .header("Depth", "infinity")
            .send()
            .await?;
        Self::check_status(response).await
    }

    pub async fn move_to(&self, from: &Url, to: &Url, overwrite: bool) -> Result<(), DavError> {
        let response = self
            .request(dav_method(b"MOVE", "MOVE")?, from)
            .header("Destination", to.as_str())
            .header("Overwrite", overwrite_flag(overwrite))
            .send()
            .await?;
        Self::check_status(response).await
    }

    pub async fn delete(&self, url: &Url) -> Result<(), DavError> {
        let response = self.request(Method::DELETE, url).send().await?;
        Self::check_status(response).await
    }

    pub async fn mkcol(&self, url: &Url) -> Result<(), DavError> {
        let response = self
            .request(dav_method(b"MKCOL", "MKCOL")?, url)
            .send()
            .await?;
        Self::check_status(response).await
    }

    /// Creates an empty resource, failing with 412 when the name is taken.
    pub async fn put_empty(&self, url: &Url, content_type: Option<&str>) -> Result<(), DavError> {
        let mut request = self
            .request(Method::PUT, url)
            .header("If-None-Match", "*")
            .body(Vec::<u8>::new());
        if let Some(content_type) = content_type {
            request = request.header("Content-Type", content_type);
        }
        let response = request.send().await?;
        Self::check_status(response).await
    }

    fn request(&self, method: Method, url: &Url) -> RequestBuilder {
        debug!(%method, %url, "dav request");
        let request = self.http.request(method, url.clone());
        match &self.credentials {
            Some(credentials) => {
                request.basic_auth(&credentials.username, credentials.password.as_deref())
            }
            None => request,
        }
    }

    async fn check_status(response: reqwest::Response) -> Result<(), DavError> {
        let status = response.status();
        // 207 on COPY/MOVE/DELETE reports failed members.
        if status.is_success() && status != StatusCode::MULTI_STATUS {
            return Ok(());
        }
        let headers = response.headers().clone();
        let body = response.text().await.unwrap_or_default();
        Err(DavError::Http {
            status,
            headers,
            body,
        })
    }
}

impl DavError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            DavError::Http { status, .. } => Some(*status),
            DavError::Request(err) => err.status(),
            _ => None,
        }
    }

    pub fn classification(&self) -> Option<DavErrorClass> {
        match self {
            DavError::Http { status, .. } => Some(classify_dav_status(*status)),
            DavError::Request(err) if err.is_timeout() || err.is_connect() => {
                Some(DavErrorClass::Transient)
            }
            _ => None,
        }
    }

    /// The server refused because the destination member already exists.
    pub fn is_name_conflict(&self) -> bool {
        self.classification() == Some(DavErrorClass::NameTaken)
    }
}

fn classify_dav_status(status: StatusCode) -> DavErrorClass {
    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
        DavErrorClass::Auth
    } else if status == StatusCode::PRECONDITION_FAILED {
        DavErrorClass::NameTaken
    } else if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
        DavErrorClass::Missing
    } else if status == StatusCode::INSUFFICIENT_STORAGE {
        DavErrorClass::InsufficientStorage
    } else if status.is_server_error()
        || matches!(
            status,
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS | StatusCode::LOCKED
        )
    {
        DavErrorClass::Transient
    } else {
        DavErrorClass::Permanent
    }
}

fn dav_method(bytes: &[u8], name: &'static str) -> Result<Method, DavError> {
    Method::from_bytes(bytes).map_err(|_| DavError::InvalidMethod(name))
}

fn overwrite_flag(overwrite: bool) -> &'static str {
    if overwrite { "T" } else { "F" }
}

pub fn collection_url(url: &Url) -> Result<Url, DavError> {
    let mut out = url.clone();
    if !out.path().ends_with('/') {
        out.path_segments_mut()
            .map_err(|_| DavError::CannotBeABase(url.to_string()))?
            .push("");
    }
    Ok(out)
}

/// Joins a single percent-encoded member onto a collection URL. Collections
/// keep a trailing slash.
pub fn member_url(collection: &Url, member: &str, is_collection: bool) -> Result<Url, DavError> {
    let mut out = collection.clone();
    {
        let mut segments = out
            .path_segments_mut()
            .map_err(|_| DavError::CannotBeABase(collection.to_string()))?;
        segments.pop_if_empty().push(member);
        if is_collection {
            segments.push("");
        }
    }
    Ok(out)
}
