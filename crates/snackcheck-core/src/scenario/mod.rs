//! Test Scenario Generator
//!
//! Turns command metadata into a battery of black-box scenarios and runs
//! them against the Application Under Test.
//!
//! - [`generate_battery`]: the ordered scenario list for one command
//! - [`Scenario::run`]: submit, then assert the outcome or poll for effects
//! - [`SuiteRunner`]: synthesize, build, generate and run concurrently

mod battery;
mod runner;
mod session;

use snackcheck_client::ClientError;
use snackcheck_store::StoreError;

use crate::poll::PollTimeout;

pub use battery::{generate_battery, generate_battery_with, Scenario, ScenarioKind};
pub use runner::{ScenarioOutcome, SuiteReport, SuiteRunner};
pub use session::{Actor, TestSession, DEFAULT_CORRELATION_FIELD};

/// Why a scenario did not pass.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioFailure {
    #[error("mutation was accepted but should have been rejected")]
    UnexpectedAcceptance,

    #[error("mutation was rejected: {message}")]
    UnexpectedRejection { message: String },

    #[error("expectation not met: {detail}")]
    ExpectationNotMet { detail: String },

    #[error("gave up waiting for the event store: {0}")]
    Timeout(#[from] PollTimeout),

    /// Transport or token failure; not an assertion outcome.
    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}
