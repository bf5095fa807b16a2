//! snackcheck-core: convention-mined command tests
//!
//! Mines a command's authorization, parameters, declared work and registered
//! events from its source annotations (or a TOML declaration), then generates
//! and runs a battery of black-box GraphQL scenarios against the application.
//!
//! ## Layer 2 - Test generation
//!
//! Focus: deterministic builders around an asynchronous, eventually
//! consistent system under test.
//!
//! ## Key Components
//!
//! - `annotations`: line lexer and literal parser for `@tag` comments
//! - `declaration`: TOML command declarations
//! - `variables`: all / required-only / empty / invalid-type input sets
//! - `mutation`: GraphQL mutation documents
//! - `readmodel`: read-model list queries and projection checks
//! - `poll`: eventual-consistency poller
//! - `scenario`: battery generation, `TestSession` and `SuiteRunner`

pub mod annotations;
pub mod config;
pub mod declaration;
pub mod error;
pub mod fillers;
pub mod metadata;
pub mod mutation;
pub mod obs;
pub mod poll;
pub mod readmodel;
pub mod scenario;
pub mod source;
pub mod telemetry;
pub mod variables;

pub use annotations::{
    parse_command_source, parse_command_source_with, parse_parameters, parse_registered_events,
    parse_roles, parse_work_items,
};
pub use config::{LogConfig, SuiteConfig, DEFAULT_COMMANDS_DIR, LOG_ENV, LOG_JSON_ENV};
pub use declaration::{load_declaration, parse_declaration, CommandDeclaration};
pub use error::{CoreError, Result};
pub use fillers::{FillerSource, RandomFiller};
pub use metadata::{
    compute_source_digest, CommandMetadata, Expectation, ParamType, ParameterSpec,
    RegisteredEventSpec, RoleSpec, WorkItem,
};
pub use mutation::{build_mutation, MutationDocument};
pub use poll::{try_wait_for_it, wait_for_it, PollConfig, PollError, PollTimeout};
pub use readmodel::{
    build_filter, build_read_model_query, evaluate_read_model_projection, is_json_string,
    query_variables, FieldCheck, ProjectionCheck, QueryDocument,
};
pub use scenario::{
    generate_battery, generate_battery_with, Actor, Scenario, ScenarioFailure, ScenarioKind,
    ScenarioOutcome, SuiteReport, SuiteRunner, TestSession,
};
pub use source::{
    command_declaration_path, command_source_path, load_command_metadata, load_command_source,
    pascal_to_kebab_case, pascal_to_title_case,
};
pub use telemetry::{init_logging, init_tracing};
pub use variables::{VariableSet, VariableSets};
