//! # Environment & Variables
//!
//! Suite-level variables, named environments (dev / staging / prod) and
//! command-line overrides, resolved into one flat map and applied through
//! `{{variable}}` interpolation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SuiteError;

/// An environment is a named set of variables (e.g. dev, staging, prod).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Environment {
    pub name: String,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// Holds every variable source and resolves them.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentManager {
    pub suite_variables: BTreeMap<String, String>,
    pub environments: Vec<Environment>,
    pub active_environment: Option<String>,
    pub overrides: BTreeMap<String, String>,
}

impl EnvironmentManager {
    /// Resolve all variables into a flat map, respecting precedence:
    /// suite < active environment < overrides.
    pub fn resolve(&self) -> Result<BTreeMap<String, String>, SuiteError> {
        let mut resolved = self.suite_variables.clone();

        if let Some(active_name) = &self.active_environment {
            let env = self
                .environments
                .iter()
                .find(|env| &env.name == active_name)
                .ok_or_else(|| SuiteError::UnknownEnvironment(active_name.clone()))?;
            resolved.extend(env.variables.clone());
        }

        resolved.extend(self.overrides.clone());
        resolved.retain(|key, _| !key.trim().is_empty());
        Ok(resolved)
    }
}

/// Interpolate `{{variable}}` placeholders in the given text. Unknown
/// placeholders are left as written.
pub fn interpolate(text: &str, variables: &BTreeMap<String, String>) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find("{{") {
        result.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];
        let Some(close) = after_open.find("}}") else {
            rest = &rest[open..];
            break;
        };

        let key = after_open[..close].trim();
        match variables.get(key) {
            Some(value) => result.push_str(value),
            None => result.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after_open[close + 2..];
    }

    result.push_str(rest);
    result
}

/// Name of the first `{{var}}` reference still present in `text`.
pub fn unresolved_variable(text: &str) -> Option<&str> {
    let open = text.find("{{")?;
    let after_open = &text[open + 2..];
    let close = after_open.find("}}")?;
    Some(after_open[..close].trim())
}

/// Interpolate every string leaf of a JSON value.
pub fn interpolate_value(value: &Value, variables: &BTreeMap<String, String>) -> Value {
    match value {
        Value::String(text) => Value::String(interpolate(text, variables)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| interpolate_value(item, variables))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), interpolate_value(item, variables)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Parse a `KEY=VALUE` override.
pub fn parse_override(raw: &str) -> Result<(String, String), SuiteError> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| SuiteError::InvalidVariable(raw.to_string()))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(SuiteError::InvalidVariable(raw.to_string()));
    }
    Ok((key.to_string(), value.to_string()))
}
