use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::time::Instant;
use tracing::Instrument;

use crate::error::{CoreError, Result};
use crate::metadata::CommandMetadata;
use crate::mutation::build_mutation;
use crate::obs;
use crate::variables::VariableSets;

use super::battery::{generate_battery, Scenario};
use super::session::TestSession;

/// Result of one scenario.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioOutcome {
    pub name: String,
    pub kind: String,
    pub passed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

/// Result of one command's suite.
#[derive(Debug, Clone, Serialize)]
pub struct SuiteReport {
    pub command_name: String,
    pub metadata_digest: String,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub outcomes: Vec<ScenarioOutcome>,
}

impl SuiteReport {
    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.passed_count()
    }

    pub fn success(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn failures(&self) -> impl Iterator<Item = &ScenarioOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }
}

/// Runs a command's full battery against one session.
#[derive(Debug, Clone)]
pub struct SuiteRunner {
    session: TestSession,
}

impl SuiteRunner {
    pub fn new(session: TestSession) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &TestSession {
        &self.session
    }

    /// Synthesize variables, build the mutation, generate the battery and
    /// run every scenario concurrently.
    pub async fn run(&self, metadata: &CommandMetadata) -> Result<SuiteReport> {
        let span = obs::suite_span(&metadata.command_name);
        async {
            let started_at = Utc::now();
            let started = Instant::now();

            let sets = VariableSets::synthesize(&metadata.parameters)?;
            let mutation = build_mutation(&metadata.command_name, &metadata.parameters)?;
            let battery = generate_battery(metadata, &mutation, &sets);
            obs::emit_suite_started(&metadata.command_name, battery.len());

            let outcomes = self.run_battery(&battery).await;

            let report = SuiteReport {
                command_name: metadata.command_name.clone(),
                metadata_digest: metadata.source_digest.clone(),
                started_at,
                duration_ms: started.elapsed().as_millis() as u64,
                outcomes,
            };
            obs::emit_suite_finished(
                &report.command_name,
                report.passed_count(),
                report.failed_count(),
                report.duration_ms,
            );
            Ok::<_, CoreError>(report)
        }
        .instrument(span)
        .await
    }

    /// Run scenarios concurrently; outcomes keep the battery's order.
    pub async fn run_battery(&self, battery: &[Scenario]) -> Vec<ScenarioOutcome> {
        join_all(battery.iter().map(|scenario| self.run_one(scenario))).await
    }

    async fn run_one(&self, scenario: &Scenario) -> ScenarioOutcome {
        let started = Instant::now();
        let result = scenario.run(&self.session).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let outcome = ScenarioOutcome {
            name: scenario.name.clone(),
            kind: scenario.kind.label().to_string(),
            passed: result.is_ok(),
            error: result.err().map(|e| e.to_string()),
            duration_ms,
        };
        obs::emit_scenario_finished(&outcome.name, outcome.passed, duration_ms);
        if let Some(error) = &outcome.error {
            obs::emit_scenario_failed(&outcome.name, error);
        }
        outcome
    }
}
