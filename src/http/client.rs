use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use tracing::debug;

use crate::error::TransportError;

use super::method::HttpMethod;

/// A fully resolved request, ready to go over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

/// What the transport handed back, before any normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Transport capability used by the executor.
///
/// Implementations return every HTTP status as a response; only failures to
/// obtain a response at all are errors.
#[async_trait]
pub trait HttpClient: Debug + Send + Sync {
    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, TransportError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(None)
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Result<Self, TransportError> {
        let mut builder =
            reqwest::Client::builder().redirect(reqwest::redirect::Policy::limited(10));
        if let Some(timeout) = timeout.filter(|timeout| !timeout.is_zero()) {
            builder = builder.timeout(timeout);
        }

        let client = builder
            .build()
            .map_err(|err| TransportError::Failed(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, TransportError> {
        let headers = build_headers(&request.headers)?;
        debug!(method = %request.method, url = %request.url, "sending request");

        let mut req_builder = self
            .client
            .request(request.method.into(), &request.url)
            .headers(headers);
        if let Some(body) = request.body {
            req_builder = req_builder.body(body);
        }

        let response = req_builder.send().await.map_err(map_reqwest_error)?;

        let status = response.status().as_u16();
        let headers = format_headers(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|err| TransportError::Failed(format!("Failed to read response: {err}")))?;

        Ok(TransportResponse {
            status,
            headers,
            body: bytes.to_vec(),
        })
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::TimedOut(err.to_string())
    } else {
        TransportError::Failed(err.to_string())
    }
}

pub fn build_headers(input: &BTreeMap<String, String>) -> Result<HeaderMap, TransportError> {
    let mut headers = HeaderMap::new();

    for (key, value) in input {
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let header_name =
            HeaderName::from_bytes(key.as_bytes()).map_err(|err| TransportError::InvalidHeader {
                name: key.to_string(),
                reason: err.to_string(),
            })?;
        let header_value =
            HeaderValue::from_str(value.trim()).map_err(|err| TransportError::InvalidHeader {
                name: key.to_string(),
                reason: err.to_string(),
            })?;
        headers.insert(header_name, header_value);
    }

    Ok(headers)
}

// Values that are not visible ASCII are kept lossily rather than dropped.
fn format_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let value = match value.to_str() {
                Ok(value) => value.to_string(),
                Err(_) => String::from_utf8_lossy(value.as_bytes()).into_owned(),
            };
            (name.to_string(), value)
        })
        .collect()
}
