use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

/// Normalized snapshot of one executed request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseCapture {
    status: u16,
    headers: BTreeMap<String, String>,
    body: Value,
    duration_ms: u64,
}

impl ResponseCapture {
    /// Header names are lower-cased; repeated headers are joined with `, `.
    pub fn new<I, K, V>(status: u16, headers: I, body: Value, duration_ms: u64) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut normalized: BTreeMap<String, String> = BTreeMap::new();
        for (name, value) in headers {
            let name = name.as_ref().to_ascii_lowercase();
            let value = value.into();
            normalized
                .entry(name)
                .and_modify(|existing| {
                    existing.push_str(", ");
                    existing.push_str(&value);
                })
                .or_insert(value);
        }

        Self {
            status,
            headers: normalized,
            body,
            duration_ms,
        }
    }

    /// Decode a raw payload: empty is `null`, valid JSON is parsed, anything
    /// else is kept as a JSON string.
    pub fn decode_body(bytes: &[u8]) -> Value {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Value::Null;
        }
        serde_json::from_slice(bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(bytes).into_owned()))
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Same status, headers and timing with another body.
    pub(crate) fn with_body(&self, body: Value) -> Self {
        Self {
            status: self.status,
            headers: self.headers.clone(),
            body,
            duration_ms: self.duration_ms,
        }
    }
}
