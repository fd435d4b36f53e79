//! # Suite Documents
//!
//! A suite is a JSON document of named groups, each holding scenarios
//! (a request plus its assertions). Loading resolves variables, applies the
//! selected environment and turns every entry into an immutable
//! [`Scenario`].

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RunOptions;
use crate::environment::{EnvironmentManager, Environment, interpolate, interpolate_value};
use crate::error::SuiteError;
use crate::http::method::HttpMethod;
use crate::http::request::RequestDescriptor;
use crate::testing::{AssertionSpec, Scenario};

/// Separator between group and scenario in display names.
pub const NAME_SEPARATOR: &str = " > ";

/// Request as written in a suite document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestDef {
    #[serde(default)]
    pub method: HttpMethod,
    pub url: String,
    #[serde(default)]
    pub path_params: BTreeMap<String, String>,
    /// Query pairs in declaration order.
    #[serde(default, with = "ordered_pairs")]
    pub query: Vec<(String, String)>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default = "default_fail_on_status_code")]
    pub fail_on_status_code: bool,
}

fn default_fail_on_status_code() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScenarioDef {
    pub name: String,
    pub request: RequestDef,
    #[serde(default)]
    pub assertions: Vec<AssertionSpec>,
}

/// A named block of scenarios.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Group {
    pub name: String,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDef>,
}

/// Root of a suite document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SuiteDocument {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub environments: Vec<Environment>,
    #[serde(default)]
    pub settings: RunOptions,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioDef>,
}

/// A JSON object of string values kept as ordered pairs.
mod ordered_pairs {
    use std::fmt;

    use serde::de::{MapAccess, Visitor};
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        pairs: &[(String, String)],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(pairs.iter().map(|(key, value)| (key, value)))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Vec<(String, String)>, D::Error> {
        struct PairsVisitor;

        impl<'de> Visitor<'de> for PairsVisitor {
            type Value = Vec<(String, String)>;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an object of string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(pair) = map.next_entry::<String, String>()? {
                    pairs.push(pair);
                }
                Ok(pairs)
            }
        }

        deserializer.deserialize_map(PairsVisitor)
    }
}

/// How a document should be resolved into a runnable suite.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub environment: Option<String>,
    pub overrides: BTreeMap<String, String>,
}

/// A resolved, runnable suite.
#[derive(Debug, Clone, PartialEq)]
pub struct Suite {
    pub name: String,
    pub options: RunOptions,
    pub scenarios: Vec<Scenario>,
}

impl SuiteDocument {
    pub fn from_json(raw: &str) -> Result<Self, SuiteError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Top-level scenarios first, then groups in document order.
    pub fn resolve(self, options: &ResolveOptions) -> Result<Suite, SuiteError> {
        let manager = EnvironmentManager {
            suite_variables: self.variables,
            environments: self.environments,
            active_environment: options.environment.clone(),
            overrides: options.overrides.clone(),
        };
        let variables = manager.resolve()?;

        let mut named: Vec<(String, ScenarioDef)> = self
            .scenarios
            .into_iter()
            .map(|def| (def.name.trim().to_string(), def))
            .collect();
        for group in self.groups {
            let group_name = group.name.trim();
            if group_name.is_empty() {
                return Err(SuiteError::Invalid("group name cannot be empty".to_string()));
            }
            for def in group.scenarios {
                let display = format!("{group_name}{NAME_SEPARATOR}{}", def.name.trim());
                named.push((display, def));
            }
        }

        if named.is_empty() {
            return Err(SuiteError::Invalid("suite has no scenarios".to_string()));
        }

        let mut seen = HashSet::new();
        let mut scenarios = Vec::with_capacity(named.len());
        for (display, def) in named {
            if def.name.trim().is_empty() {
                return Err(SuiteError::Invalid(format!(
                    "scenario name cannot be empty (url `{}`)",
                    def.request.url
                )));
            }
            if !seen.insert(display.clone()) {
                return Err(SuiteError::Invalid(format!(
                    "duplicate scenario `{display}`"
                )));
            }

            let request = build_request(&def.request, &variables);
            scenarios.push(Scenario::new(display, request, def.assertions));
        }

        Ok(Suite {
            name: self.name,
            options: self.settings,
            scenarios,
        })
    }
}

fn build_request(def: &RequestDef, variables: &BTreeMap<String, String>) -> RequestDescriptor {
    let mut builder =
        RequestDescriptor::builder(def.method, interpolate(&def.url, variables))
            .fail_on_non_success(def.fail_on_status_code);

    for (key, value) in &def.path_params {
        builder = builder.path_param(key.clone(), interpolate(value, variables));
    }
    for (key, value) in &def.query {
        builder = builder.query(key.clone(), interpolate(value, variables));
    }
    for (name, value) in &def.headers {
        builder = builder.header(name.clone(), interpolate(value, variables));
    }
    if let Some(body) = &def.body {
        builder = builder.json(interpolate_value(body, variables));
    }

    builder.build()
}
