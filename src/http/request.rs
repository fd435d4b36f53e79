use std::collections::BTreeMap;

use serde_json::Value;

use super::method::HttpMethod;

/// Immutable description of one HTTP call.
///
/// Built through [`RequestDescriptor::builder`]; the fields are read-only
/// afterwards so evaluation can never alter what was sent.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: HttpMethod,
    url_template: String,
    path_params: BTreeMap<String, String>,
    query_params: Vec<(String, String)>,
    body: Option<Value>,
    headers: Option<BTreeMap<String, String>>,
    fail_on_non_success: bool,
}

impl RequestDescriptor {
    pub fn builder(method: HttpMethod, url_template: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            inner: RequestDescriptor {
                method,
                url_template: url_template.into(),
                path_params: BTreeMap::new(),
                query_params: Vec::new(),
                body: None,
                headers: None,
                fail_on_non_success: true,
            },
        }
    }

    pub fn get(url_template: impl Into<String>) -> RequestBuilder {
        Self::builder(HttpMethod::Get, url_template)
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url_template(&self) -> &str {
        &self.url_template
    }

    pub fn path_params(&self) -> &BTreeMap<String, String> {
        &self.path_params
    }

    pub fn query_params(&self) -> &[(String, String)] {
        &self.query_params
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> Option<&BTreeMap<String, String>> {
        self.headers.as_ref()
    }

    pub fn fail_on_non_success(&self) -> bool {
        self.fail_on_non_success
    }
}

#[derive(Debug, Clone)]
pub struct RequestBuilder {
    inner: RequestDescriptor,
}

impl RequestBuilder {
    pub fn path_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.path_params.insert(key.into(), value.into());
        self
    }

    /// Query pairs are appended in the order they are added.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner.query_params.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inner
            .headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.inner.body = Some(body);
        self
    }

    pub fn fail_on_non_success(mut self, fail: bool) -> Self {
        self.inner.fail_on_non_success = fail;
        self
    }

    pub fn build(self) -> RequestDescriptor {
        self.inner
    }
}
