//! # Reporting
//!
//! Sinks that receive a finished [`SuiteResult`]: a human-readable text
//! report and a machine-readable JSON document for CI.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use serde::Serialize;

use crate::error::ReportError;
use crate::testing::{AssertionResult, ResultKind, RunSummary, SuiteResult};

/// Receives the aggregated result of a run.
pub trait ReportSink {
    fn publish(&self, result: &SuiteResult) -> Result<(), ReportError>;
}

/// Plain-text report, one line per scenario plus failure details.
#[derive(Debug)]
pub struct TextReporter<W: Write> {
    out: Mutex<W>,
    title: Option<String>,
}

impl<W: Write> TextReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write> ReportSink for TextReporter<W> {
    fn publish(&self, result: &SuiteResult) -> Result<(), ReportError> {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(title) = &self.title {
            writeln!(out, "{title}")?;
        }

        for (scenario, results) in result.by_scenario() {
            writeln!(out, "  {} {scenario}", scenario_label(results))?;
            for failed in results.iter().filter(|result| !result.passed) {
                let detail = failed.failure_detail.as_deref().unwrap_or("failed");
                writeln!(out, "      - {}: {detail}", failed.description)?;
            }
        }

        writeln!(out)?;
        writeln!(out, "{}", summary_line(&result.summary()))?;
        out.flush()?;
        Ok(())
    }
}

fn scenario_label(results: &[AssertionResult]) -> &'static str {
    if results.iter().any(|result| result.kind == ResultKind::Skipped) {
        "SKIP"
    } else if results.iter().all(|result| result.passed) {
        "PASS"
    } else {
        "FAIL"
    }
}

pub fn summary_line(summary: &RunSummary) -> String {
    format!(
        "{} scenarios ({} failed), {} assertions: {} passed, {} failed, {} skipped ({} ms)",
        summary.scenarios,
        summary.failed_scenarios,
        summary.total,
        summary.passed,
        summary.failed,
        summary.skipped,
        summary.duration_ms
    )
}

#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    suite: Option<&'a str>,
    passed: bool,
    summary: RunSummary,
    results: &'a [AssertionResult],
}

/// Pretty-printed JSON document with summary and every result.
#[derive(Debug)]
pub struct JsonReporter<W: Write> {
    out: Mutex<W>,
    title: Option<String>,
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            title: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write> ReportSink for JsonReporter<W> {
    fn publish(&self, result: &SuiteResult) -> Result<(), ReportError> {
        let report = JsonReport {
            suite: self.title.as_deref(),
            passed: result.passed(),
            summary: result.summary(),
            results: &result.results,
        };

        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        serde_json::to_writer_pretty(&mut *out, &report)?;
        writeln!(out)?;
        out.flush()?;
        Ok(())
    }
}
