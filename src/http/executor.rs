use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::time::Instant;
use tracing::debug;

use crate::environment::unresolved_variable;
use crate::error::ExecutionError;

use super::client::{HttpClient, OutgoingRequest};
use super::request::RequestDescriptor;
use super::response::ResponseCapture;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Turns request descriptors into response captures through an injected
/// [`HttpClient`].
#[derive(Debug, Clone)]
pub struct HttpExecutor {
    client: Arc<dyn HttpClient>,
    default_headers: BTreeMap<String, String>,
}

impl HttpExecutor {
    pub fn new(client: Arc<dyn HttpClient>) -> Self {
        Self {
            client,
            default_headers: BTreeMap::new(),
        }
    }

    /// Headers sent with every request unless the descriptor sets the same
    /// name.
    pub fn with_default_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.default_headers = headers;
        self
    }

    pub async fn execute(
        &self,
        request: &RequestDescriptor,
    ) -> Result<ResponseCapture, ExecutionError> {
        let url = resolve_url(request)?;
        let outgoing = OutgoingRequest {
            method: request.method(),
            url: url.clone(),
            headers: self.merged_headers(request),
            body: request.body().map(|body| body.to_string().into_bytes()),
        };

        let started = Instant::now();
        let response = self.client.send(outgoing).await?;
        let elapsed = started.elapsed().as_millis() as u64;

        debug!(
            method = %request.method(),
            url = %url,
            status = response.status,
            duration_ms = elapsed,
            "response received"
        );

        if request.fail_on_non_success() && !(200..300).contains(&response.status) {
            let reason = reqwest::StatusCode::from_u16(response.status)
                .ok()
                .and_then(|status| status.canonical_reason())
                .unwrap_or("Unknown");
            return Err(ExecutionError::Http {
                status: Some(response.status),
                message: format!("{reason} from {} {url}", request.method()),
            });
        }

        let body = ResponseCapture::decode_body(&response.body);
        Ok(ResponseCapture::new(
            response.status,
            response.headers,
            body,
            elapsed,
        ))
    }

    fn merged_headers(&self, request: &RequestDescriptor) -> BTreeMap<String, String> {
        let mut headers = self.default_headers.clone();

        if let Some(overrides) = request.headers() {
            for (name, value) in overrides {
                headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
                headers.insert(name.clone(), value.clone());
            }
        }

        let has_content_type = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("content-type"));
        if request.body().is_some() && !has_content_type {
            headers.insert("content-type".to_string(), JSON_CONTENT_TYPE.to_string());
        }

        headers
    }
}

/// Final URL: path parameters substituted, query string appended.
pub fn resolve_url(request: &RequestDescriptor) -> Result<String, ExecutionError> {
    let bound_values = request
        .path_params()
        .values()
        .chain(request.query_params().iter().map(|(_, value)| value));
    for value in bound_values {
        if let Some(variable) = unresolved_variable(value) {
            return Err(ExecutionError::UnresolvedVariable {
                variable: variable.to_string(),
                value: value.clone(),
            });
        }
    }

    let resolved = substitute_path_params(request.url_template(), request.path_params())?;
    let mut url = reqwest::Url::parse(&resolved).map_err(|err| ExecutionError::InvalidUrl {
        url: resolved.clone(),
        reason: err.to_string(),
    })?;

    if !request.query_params().is_empty() {
        let mut query_pairs = url.query_pairs_mut();
        for (key, value) in request.query_params() {
            query_pairs.append_pair(key, value);
        }
    }

    Ok(url.into())
}

/// Replace `{name}` placeholders with values from `params`.
pub fn substitute_path_params(
    template: &str,
    params: &BTreeMap<String, String>,
) -> Result<String, ExecutionError> {
    let mut resolved = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        resolved.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        let close = after_open
            .find('}')
            .ok_or_else(|| ExecutionError::MalformedTemplate {
                template: template.to_string(),
                reason: "unterminated `{`".to_string(),
            })?;

        let key = after_open[..close].trim();
        if key.is_empty() || key.contains('{') {
            return Err(ExecutionError::MalformedTemplate {
                template: template.to_string(),
                reason: format!("invalid placeholder `{{{}}}`", &after_open[..close]),
            });
        }

        let value = params.get(key).ok_or_else(|| ExecutionError::Template {
            template: template.to_string(),
            key: key.to_string(),
        })?;
        resolved.push_str(value);
        rest = &after_open[close + 1..];
    }

    resolved.push_str(rest);
    Ok(resolved)
}
