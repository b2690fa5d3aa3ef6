use std::fmt;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use reqwest::{Client, Response, StatusCode};

const USER_AGENT: &str = "gator";
pub(crate) const MAX_FEED_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug)]
pub enum FetchError {
    Timeout,
    Http(reqwest::Error),
    Status(StatusCode),
    TooLarge(usize),
    Parse(String),
}

impl FetchError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() { FetchError::Timeout } else { FetchError::Http(err) }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Timeout => write!(f, "request timed out"),
            FetchError::Http(err) => write!(f, "http error: {err}"),
            FetchError::Status(status) => write!(f, "unexpected status {status}"),
            FetchError::TooLarge(n) => write!(f, "feed body too large ({n} bytes)"),
            FetchError::Parse(msg) => write!(f, "malformed feed: {msg}"),
        }
    }
}

impl std::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FetchError::Http(err) => Some(err),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(FetchError::from_reqwest)?;
        Ok(Self { client })
    }

    pub async fn fetch_rss(&self, url: &str) -> Result<Bytes, FetchError> {
        let resp = self.client.get(url).send().await.map_err(FetchError::from_reqwest)?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }
        read_limited(resp, MAX_FEED_BYTES).await
    }
}

/// Reads the body chunk by chunk, giving up as soon as it would exceed `limit`.
async fn read_limited(mut resp: Response, limit: usize) -> Result<Bytes, FetchError> {
    if let Some(len) = resp.content_length() {
        if len > limit as u64 {
            return Err(FetchError::TooLarge(len as usize));
        }
    }

    let mut body = BytesMut::new();
    while let Some(chunk) = resp.chunk().await.map_err(FetchError::from_reqwest)? {
        let total = body.len().saturating_add(chunk.len());
        if total > limit {
            return Err(FetchError::TooLarge(total));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}
