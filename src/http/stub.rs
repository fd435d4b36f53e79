//! In-process [`HttpClient`] for unit tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::TransportError;

use super::client::{HttpClient, OutgoingRequest, TransportResponse};

#[derive(Debug)]
pub struct StubClient {
    outcome: Result<TransportResponse, TransportError>,
    delay: Option<Duration>,
    requests: Mutex<Vec<OutgoingRequest>>,
}

impl StubClient {
    pub fn ok(status: u16, body: Value) -> Self {
        Self {
            outcome: Ok(TransportResponse {
                status,
                headers: Vec::new(),
                body: body.to_string().into_bytes(),
            }),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: TransportError) -> Self {
        Self {
            outcome: Err(err),
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let Ok(response) = &mut self.outcome {
            response.headers.push((name.to_string(), value.to_string()));
        }
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<OutgoingRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpClient for StubClient {
    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.outcome.clone()
    }
}

/// Routes by URL substring; the first matching route wins.
#[derive(Debug, Default)]
pub struct RoutedStub {
    routes: Vec<(String, StubClient)>,
}

impl RoutedStub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, fragment: &str, stub: StubClient) -> Self {
        self.routes.push((fragment.to_string(), stub));
        self
    }
}

#[async_trait]
impl HttpClient for RoutedStub {
    async fn send(&self, request: OutgoingRequest) -> Result<TransportResponse, TransportError> {
        match self
            .routes
            .iter()
            .find(|(fragment, _)| request.url.contains(fragment.as_str()))
        {
            Some((_, stub)) => stub.send(request).await,
            None => Err(TransportError::Failed(format!("no route for {}", request.url))),
        }
    }
}
