use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{RunMode, RunOptions};
use crate::error::{ExecutionError, ReportError};
use crate::http::client::HttpClient;
use crate::http::executor::HttpExecutor;
use crate::http::response::ResponseCapture;
use crate::report::ReportSink;

use super::evaluator::evaluate;
use super::{AssertionResult, Scenario, SuiteResult};

/// Terminal state of one scenario.
#[derive(Debug)]
enum ScenarioOutcome {
    Completed(ResponseCapture),
    ExecutionFailed(ExecutionError),
    Skipped,
}

/// Executes scenarios and aggregates their results in input order.
#[derive(Debug, Clone)]
pub struct ScenarioRunner {
    executor: HttpExecutor,
    options: RunOptions,
}

impl ScenarioRunner {
    pub fn new(client: Arc<dyn HttpClient>, options: RunOptions) -> Self {
        let executor = HttpExecutor::new(client).with_default_headers(options.headers.clone());
        Self { executor, options }
    }

    /// Run every scenario. Never fails: execution problems become failed
    /// results of the owning scenario.
    pub async fn run(&self, scenarios: &[Scenario]) -> SuiteResult {
        let started = Instant::now();
        let deadline = self.options.deadline().map(|deadline| started + deadline);
        info!(
            scenarios = scenarios.len(),
            mode = ?self.options.mode,
            deadline_ms = ?self.options.deadline_ms,
            "starting suite run"
        );

        let per_scenario: Vec<Vec<AssertionResult>> = match self.options.mode {
            RunMode::Serial => {
                let mut collected = Vec::with_capacity(scenarios.len());
                for scenario in scenarios {
                    collected.push(self.run_scenario(scenario, deadline).await);
                }
                collected
            }
            RunMode::Parallel => {
                stream::iter(scenarios)
                    .map(|scenario| self.run_scenario(scenario, deadline))
                    .buffered(self.options.concurrency())
                    .collect()
                    .await
            }
        };

        let result = SuiteResult::from_scenarios(
            scenarios
                .iter()
                .map(|scenario| scenario.name().to_string())
                .zip(per_scenario),
            started.elapsed().as_millis() as u64,
        );

        let summary = result.summary();
        info!(
            passed = summary.passed,
            failed = summary.failed,
            skipped = summary.skipped,
            duration_ms = summary.duration_ms,
            "suite run finished"
        );
        result
    }

    /// Run, then hand the complete result to `sink`.
    pub async fn run_and_report(
        &self,
        scenarios: &[Scenario],
        sink: &dyn ReportSink,
    ) -> Result<SuiteResult, ReportError> {
        let result = self.run(scenarios).await;
        sink.publish(&result)?;
        Ok(result)
    }

    async fn run_scenario(
        &self,
        scenario: &Scenario,
        deadline: Option<Instant>,
    ) -> Vec<AssertionResult> {
        match self.execute(scenario, deadline).await {
            ScenarioOutcome::Completed(response) => {
                evaluate(scenario.name(), &response, scenario.assertions())
            }
            ScenarioOutcome::ExecutionFailed(err) => {
                vec![AssertionResult::execution_failed(scenario.name(), &err)]
            }
            ScenarioOutcome::Skipped => vec![AssertionResult::skipped(scenario.name())],
        }
    }

    async fn execute(&self, scenario: &Scenario, deadline: Option<Instant>) -> ScenarioOutcome {
        debug!(scenario = %scenario.name(), "pending");
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            warn!(scenario = %scenario.name(), "suite deadline exceeded, skipping");
            return ScenarioOutcome::Skipped;
        }

        debug!(scenario = %scenario.name(), "executing");
        let request = scenario.request();
        let outcome = match deadline {
            Some(deadline) => {
                match tokio::time::timeout_at(deadline, self.executor.execute(request)).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(ExecutionError::Timeout(
                        "suite deadline exceeded".to_string(),
                    )),
                }
            }
            None => self.executor.execute(request).await,
        };

        match outcome {
            Ok(response) => {
                debug!(scenario = %scenario.name(), status = response.status(), "completed");
                ScenarioOutcome::Completed(response)
            }
            Err(err) => {
                warn!(scenario = %scenario.name(), error = %err, "execution failed");
                ScenarioOutcome::ExecutionFailed(err)
            }
        }
    }
}
