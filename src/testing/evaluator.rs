use serde_json::Value;

use crate::http::response::ResponseCapture;

use super::path;
use super::{AssertionResult, AssertionSpec, ValueType};

/// Evaluate every assertion against `response`, in order.
///
/// Never stops at the first failure: the output has one entry per input
/// assertion.
pub fn evaluate(
    scenario: &str,
    response: &ResponseCapture,
    assertions: &[AssertionSpec],
) -> Vec<AssertionResult> {
    assertions
        .iter()
        .map(|spec| match check(spec, response) {
            Ok(()) => AssertionResult::pass(scenario, spec.to_string()),
            Err(detail) => AssertionResult::fail(scenario, spec.to_string(), detail),
        })
        .collect()
}

/// Check a single assertion, returning the failure detail on mismatch.
pub fn check(spec: &AssertionSpec, response: &ResponseCapture) -> Result<(), String> {
    match spec {
        AssertionSpec::StatusEquals { status } => {
            if response.status() == *status {
                Ok(())
            } else {
                Err(format!("expected status {status}, got {}", response.status()))
            }
        }
        AssertionSpec::HasProperty { path, value_type } => {
            let value = require(response.body(), path)?;
            match value_type {
                Some(expected) if ValueType::of(value) != *expected => Err(format!(
                    "expected {} to be {expected}, got {}",
                    path::display(path),
                    ValueType::of(value)
                )),
                _ => Ok(()),
            }
        }
        AssertionSpec::PropertyEquals { path, value } => {
            let actual = require(response.body(), path)?;
            if json_eq(actual, value) {
                Ok(())
            } else {
                Err(format!(
                    "expected {} to equal {value}, got {actual}",
                    path::display(path)
                ))
            }
        }
        AssertionSpec::BodyIncludes { subset } => body_includes(response.body(), subset),
        AssertionSpec::HeaderContains { name, substring } => match response.header(name) {
            Some(value) if value.contains(substring.as_str()) => Ok(()),
            Some(value) => Err(format!(
                "expected header `{name}` to contain `{substring}`, got `{value}`"
            )),
            None => Err(format!("missing header `{name}`")),
        },
        AssertionSpec::DurationBelow { ms } => {
            if response.duration_ms() < *ms {
                Ok(())
            } else {
                Err(format!(
                    "expected duration below {ms}ms, took {}ms",
                    response.duration_ms()
                ))
            }
        }
        AssertionSpec::ArrayLengthGreaterThan { path, length } => {
            let items = require_array(response.body(), path)?;
            if items.len() > *length {
                Ok(())
            } else {
                Err(format!(
                    "expected {} length greater than {length}, got {}",
                    path::display(path),
                    items.len()
                ))
            }
        }
        AssertionSpec::AllItemsSatisfy { path, assertion } => {
            let items = require_array(response.body(), path)?;
            for (index, item) in items.iter().enumerate() {
                let item_response = response.with_body(item.clone());
                check(assertion, &item_response)
                    .map_err(|detail| format!("item {index}: {detail}"))?;
            }
            Ok(())
        }
    }
}

fn require<'a>(body: &'a Value, path: &str) -> Result<&'a Value, String> {
    path::resolve(body, path)
        .map_err(|reason| format!("invalid path `{path}`: {reason}"))?
        .ok_or_else(|| format!("missing path {path}"))
}

fn require_array<'a>(body: &'a Value, path: &str) -> Result<&'a Vec<Value>, String> {
    let value = require(body, path)?;
    value.as_array().ok_or_else(|| {
        format!(
            "expected {} to be an array, got {}",
            path::display(path),
            ValueType::of(value)
        )
    })
}

// Object bodies: every subset key must be present and deep-equal.
// Array bodies: some element must deep-equal the subset.
fn body_includes(body: &Value, subset: &Value) -> Result<(), String> {
    match (body, subset) {
        (Value::Array(items), _) => {
            if items.iter().any(|item| json_eq(item, subset)) {
                Ok(())
            } else {
                Err(format!("no element of the body equals {subset}"))
            }
        }
        (Value::Object(actual), Value::Object(expected)) => {
            let mismatches: Vec<String> = expected
                .iter()
                .filter_map(|(key, value)| match actual.get(key) {
                    None => Some(format!("missing key `{key}`")),
                    Some(found) if !json_eq(found, value) => {
                        Some(format!("expected `{key}` to equal {value}, got {found}"))
                    }
                    Some(_) => None,
                })
                .collect();
            if mismatches.is_empty() {
                Ok(())
            } else {
                Err(mismatches.join("; "))
            }
        }
        (Value::Object(_), _) => Err(format!(
            "expected subset to be an object, got {}",
            ValueType::of(subset)
        )),
        _ => Err(format!(
            "expected body to be an object or array, got {}",
            ValueType::of(body)
        )),
    }
}

/// Structural equality where numbers compare by value (`1 == 1.0`).
pub fn json_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                a == b
            } else if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                a == b
            } else {
                a.as_f64() == b.as_f64()
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(a, b)| json_eq(a, b))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a
                    .iter()
                    .all(|(key, value)| b.get(key).is_some_and(|other| json_eq(value, other)))
        }
        _ => left == right,
    }
}
