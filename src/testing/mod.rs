//! # Testing & Assertions
//!
//! Declarative assertions over HTTP responses, the evaluator that applies
//! them, and the scenario runner that executes a suite and aggregates
//! results.

pub mod evaluator;
pub mod path;
pub mod runner;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ErrorKind, ExecutionError};
use crate::http::request::RequestDescriptor;

pub use evaluator::evaluate;
pub use runner::ScenarioRunner;

/// Runtime type of a JSON value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ValueType {
    pub fn of(value: &Value) -> Self {
        match value {
            Value::String(_) => ValueType::String,
            Value::Number(_) => ValueType::Number,
            Value::Bool(_) => ValueType::Boolean,
            Value::Array(_) => ValueType::Array,
            Value::Object(_) => ValueType::Object,
            Value::Null => ValueType::Null,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ValueType::String => "string",
            ValueType::Number => "number",
            ValueType::Boolean => "boolean",
            ValueType::Array => "array",
            ValueType::Object => "object",
            ValueType::Null => "null",
        };
        write!(f, "{label}")
    }
}

/// A single declarative check against a response.
///
/// Paths use dotted segments with optional bracket indices (`user.id`,
/// `items[0].title`); the empty path is the whole body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssertionSpec {
    StatusEquals {
        status: u16,
    },
    HasProperty {
        path: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value_type: Option<ValueType>,
    },
    PropertyEquals {
        path: String,
        value: Value,
    },
    BodyIncludes {
        subset: Value,
    },
    HeaderContains {
        name: String,
        substring: String,
    },
    DurationBelow {
        ms: u64,
    },
    ArrayLengthGreaterThan {
        #[serde(default)]
        path: String,
        length: usize,
    },
    AllItemsSatisfy {
        #[serde(default)]
        path: String,
        assertion: Box<AssertionSpec>,
    },
}

impl Display for AssertionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssertionSpec::StatusEquals { status } => write!(f, "status equals {status}"),
            AssertionSpec::HasProperty {
                path,
                value_type: Some(value_type),
            } => write!(f, "has property `{path}` of type {value_type}"),
            AssertionSpec::HasProperty { path, .. } => write!(f, "has property `{path}`"),
            AssertionSpec::PropertyEquals { path, value } => {
                write!(f, "property `{path}` equals {value}")
            }
            AssertionSpec::BodyIncludes { subset } => write!(f, "body includes {subset}"),
            AssertionSpec::HeaderContains { name, substring } => {
                write!(f, "header `{name}` contains `{substring}`")
            }
            AssertionSpec::DurationBelow { ms } => write!(f, "duration below {ms}ms"),
            AssertionSpec::ArrayLengthGreaterThan { path, length } => {
                write!(f, "{} length greater than {length}", path::display(path))
            }
            AssertionSpec::AllItemsSatisfy { path, assertion } => {
                write!(f, "all items of {} satisfy: {assertion}", path::display(path))
            }
        }
    }
}

/// A named request plus the assertions its response must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    name: String,
    request: RequestDescriptor,
    assertions: Vec<AssertionSpec>,
}

impl Scenario {
    pub fn new(
        name: impl Into<String>,
        request: RequestDescriptor,
        assertions: Vec<AssertionSpec>,
    ) -> Self {
        Self {
            name: name.into(),
            request,
            assertions,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn request(&self) -> &RequestDescriptor {
        &self.request
    }

    pub fn assertions(&self) -> &[AssertionSpec] {
        &self.assertions
    }
}

/// What an [`AssertionResult`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultKind {
    /// Outcome of one declared assertion.
    Assertion,
    /// The request never produced a response; stands in for the whole scenario.
    ExecutionFailed(ErrorKind),
    /// The suite deadline passed before the scenario started.
    Skipped,
}

/// Result of evaluating an assertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssertionResult {
    pub scenario: String,
    pub description: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
    pub kind: ResultKind,
}

impl AssertionResult {
    pub fn pass(scenario: &str, description: String) -> Self {
        Self {
            scenario: scenario.to_string(),
            description,
            passed: true,
            failure_detail: None,
            kind: ResultKind::Assertion,
        }
    }

    pub fn fail(scenario: &str, description: String, detail: String) -> Self {
        Self {
            scenario: scenario.to_string(),
            description,
            passed: false,
            failure_detail: Some(detail),
            kind: ResultKind::Assertion,
        }
    }

    pub fn execution_failed(scenario: &str, err: &ExecutionError) -> Self {
        Self {
            scenario: scenario.to_string(),
            description: "request executes".to_string(),
            passed: false,
            failure_detail: Some(err.to_string()),
            kind: ResultKind::ExecutionFailed(err.kind()),
        }
    }

    pub fn skipped(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            description: "scenario runs".to_string(),
            passed: false,
            failure_detail: Some("skipped: suite deadline exceeded".to_string()),
            kind: ResultKind::Skipped,
        }
    }
}

/// Aggregated counts for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub scenarios: usize,
    pub failed_scenarios: usize,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub duration_ms: u64,
}

/// Ordered results of one suite run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SuiteResult {
    pub results: Vec<AssertionResult>,
    pub duration_ms: u64,
    /// Scenario name and the end offset of its results, in run order.
    #[serde(skip)]
    scenarios: Vec<(String, usize)>,
}

impl SuiteResult {
    /// Build from per-scenario results given in run order.
    pub fn from_scenarios<I>(runs: I, duration_ms: u64) -> Self
    where
        I: IntoIterator<Item = (String, Vec<AssertionResult>)>,
    {
        let mut results = Vec::new();
        let mut scenarios = Vec::new();
        for (name, scenario_results) in runs {
            results.extend(scenario_results);
            scenarios.push((name, results.len()));
        }

        Self {
            results,
            duration_ms,
            scenarios,
        }
    }

    pub fn passed(&self) -> bool {
        self.results.iter().all(|result| result.passed)
    }

    /// Results grouped by scenario, in run order. Scenarios sharing a name
    /// stay separate.
    pub fn by_scenario(&self) -> Vec<(&str, &[AssertionResult])> {
        let mut start = 0;
        self.scenarios
            .iter()
            .map(|(name, end)| {
                let group = (name.as_str(), &self.results[start..*end]);
                start = *end;
                group
            })
            .collect()
    }

    pub fn summary(&self) -> RunSummary {
        let scenarios = self.by_scenario();
        let skipped = self
            .results
            .iter()
            .filter(|result| result.kind == ResultKind::Skipped)
            .count();
        let passed = self.results.iter().filter(|result| result.passed).count();

        RunSummary {
            scenarios: scenarios.len(),
            failed_scenarios: scenarios
                .iter()
                .filter(|(_, results)| results.iter().any(|result| !result.passed))
                .count(),
            total: self.results.len(),
            passed,
            failed: self.results.len() - passed - skipped,
            skipped,
            duration_ms: self.duration_ms,
        }
    }
}
