//! Structured events for suite runs.
//!
//! - `suite_span`: span tagging everything logged during one command's suite
//! - `emit_*`: one function per lifecycle event, all at `info!` except failures
//!
//! Filter with `SNACKCHECK_LOG` (falls back to `RUST_LOG`); pass `--json` to the
//! CLI for newline-delimited JSON.

use tracing::{info, warn};

/// Span for one command's suite run.
pub fn suite_span(command: &str) -> tracing::Span {
    tracing::info_span!("snackcheck.suite", command = %command)
}

/// Emit event: suite started with the number of generated scenarios.
///
/// ```ignore
/// emit_suite_started("OrderSnack", 9);
/// // logs: event=suite.started command=OrderSnack scenarios=9
/// ```
pub fn emit_suite_started(command: &str, scenarios: usize) {
    info!(event = "suite.started", command = %command, scenarios = scenarios);
}

pub fn emit_suite_finished(command: &str, passed: usize, failed: usize, duration_ms: u64) {
    info!(
        event = "suite.finished",
        command = %command,
        passed = passed,
        failed = failed,
        duration_ms = duration_ms,
        success = failed == 0,
    );
}

pub fn emit_scenario_finished(scenario: &str, passed: bool, duration_ms: u64) {
    info!(event = "scenario.finished", scenario = %scenario, passed = passed, duration_ms = duration_ms);
}

/// Emit event: scenario failed (warning level).
pub fn emit_scenario_failed(scenario: &str, error: &str) {
    warn!(event = "scenario.failed", scenario = %scenario, error = %error);
}

/// Emit event: a work or event scenario's mutation failed; its effects are
/// still checked.
pub fn emit_mutation_error(scenario: &str, error: &dyn std::fmt::Display) {
    warn!(event = "scenario.mutation_error", scenario = %scenario, error = %error);
}
