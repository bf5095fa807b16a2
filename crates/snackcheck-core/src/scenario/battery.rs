use serde::Serialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use snackcheck_client::ClientError;
use snackcheck_store::{EventRecord, PrimaryKey, RecordKind};

use crate::fillers::{FillerSource, RandomFiller};
use crate::metadata::{CommandMetadata, RegisteredEventSpec, RoleSpec, WorkItem};
use crate::mutation::MutationDocument;
use crate::obs;
use crate::poll::{try_wait_for_it, PollError, PollTimeout};
use crate::variables::{VariableSet, VariableSets};

use super::session::{Actor, TestSession};
use super::ScenarioFailure;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScenarioKind {
    RejectUnauthenticated,
    AcceptRole { role: String },
    AcceptAllParameters,
    RejectMissingRequired,
    AcceptRequiredOnly,
    RejectEmptyValues,
    RejectInvalidTypes,
    WorkDone { item: WorkItem },
    EventRegistered { event: RegisteredEventSpec },
}

impl ScenarioKind {
    pub fn label(&self) -> &'static str {
        match self {
            ScenarioKind::RejectUnauthenticated => "reject_unauthenticated",
            ScenarioKind::AcceptRole { .. } => "accept_role",
            ScenarioKind::AcceptAllParameters => "accept_all_parameters",
            ScenarioKind::RejectMissingRequired => "reject_missing_required",
            ScenarioKind::AcceptRequiredOnly => "accept_required_only",
            ScenarioKind::RejectEmptyValues => "reject_empty_values",
            ScenarioKind::RejectInvalidTypes => "reject_invalid_types",
            ScenarioKind::WorkDone { .. } => "work_done",
            ScenarioKind::EventRegistered { .. } => "event_registered",
        }
    }

    pub fn expects_rejection(&self) -> bool {
        matches!(
            self,
            ScenarioKind::RejectUnauthenticated
                | ScenarioKind::RejectMissingRequired
                | ScenarioKind::RejectEmptyValues
                | ScenarioKind::RejectInvalidTypes
        )
    }
}

/// One black-box test case for a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scenario {
    pub name: String,
    pub kind: ScenarioKind,
    pub actor: Actor,
    /// Submitted as-is for accept/reject scenarios; for work and event
    /// scenarios the correlation id is added at run time.
    pub variables: VariableSet,
    pub mutation: MutationDocument,
}

/// Generate the battery with random actor e-mails.
pub fn generate_battery(
    metadata: &CommandMetadata,
    mutation: &MutationDocument,
    sets: &VariableSets,
) -> Vec<Scenario> {
    generate_battery_with(metadata, mutation, sets, &mut RandomFiller::new())
}

/// Scenarios in order: authorization, all parameters, required-only,
/// empty values, invalid types, declared work, registered events.
pub fn generate_battery_with(
    metadata: &CommandMetadata,
    mutation: &MutationDocument,
    sets: &VariableSets,
    filler: &mut dyn FillerSource,
) -> Vec<Scenario> {
    let mut battery = Vec::new();
    let mut push = |name: String, kind: ScenarioKind, actor: &Actor, variables: VariableSet| {
        battery.push(Scenario {
            name,
            kind,
            actor: actor.clone(),
            variables,
            mutation: mutation.clone(),
        });
    };

    let main_actor = match &metadata.roles {
        RoleSpec::All => Actor::Anonymous,
        RoleSpec::Roles(roles) => {
            let email = filler.email();
            push(
                "should not allow an unauthenticated request".to_string(),
                ScenarioKind::RejectUnauthenticated,
                &Actor::Anonymous,
                sets.required_only.clone(),
            );
            for role in roles {
                push(
                    format!("should allow the '{role}' role to make the request"),
                    ScenarioKind::AcceptRole { role: role.clone() },
                    &Actor::Role {
                        role: role.clone(),
                        email: filler.email(),
                    },
                    sets.all.clone(),
                );
            }
            match roles.first() {
                Some(role) => Actor::Role {
                    role: role.clone(),
                    email,
                },
                None => Actor::Anonymous,
            }
        }
    };

    let names: Vec<&str> = metadata.parameters.iter().map(|p| p.name.as_str()).collect();
    push(
        if names.is_empty() {
            "should accept a request without inputs".to_string()
        } else {
            format!("should accept the parameters: {}", names.join(", "))
        },
        ScenarioKind::AcceptAllParameters,
        &main_actor,
        sets.all.clone(),
    );

    if metadata.has_required_parameters() {
        push(
            "should reject a request missing required inputs".to_string(),
            ScenarioKind::RejectMissingRequired,
            &main_actor,
            VariableSet::new(),
        );
        push(
            "should succeed when submitting only required inputs".to_string(),
            ScenarioKind::AcceptRequiredOnly,
            &main_actor,
            sets.required_only.clone(),
        );
    }

    if !metadata.parameters.is_empty() {
        push(
            "should reject empty input values".to_string(),
            ScenarioKind::RejectEmptyValues,
            &main_actor,
            sets.empty.clone(),
        );
        push(
            "should reject inputs of an invalid type".to_string(),
            ScenarioKind::RejectInvalidTypes,
            &main_actor,
            sets.invalid_type.clone(),
        );
    }

    for item in &metadata.work_items {
        push(
            format!("should do the work to: {}", item.description),
            ScenarioKind::WorkDone { item: item.clone() },
            &main_actor,
            item.test_inputs.clone(),
        );
    }

    for event in &metadata.registered_events {
        push(
            format!("should register the event: {}", event.event_name),
            ScenarioKind::EventRegistered {
                event: event.clone(),
            },
            &main_actor,
            event.triggering_input.clone(),
        );
    }

    battery
}

impl Scenario {
    pub async fn run(&self, session: &TestSession) -> Result<(), ScenarioFailure> {
        match &self.kind {
            ScenarioKind::WorkDone { item } => self.run_work(item, session).await,
            ScenarioKind::EventRegistered { event } => self.run_event(event, session).await,
            kind if kind.expects_rejection() => self.expect_rejection(session).await,
            _ => self.expect_acceptance(session).await,
        }
    }

    async fn submit(
        &self,
        session: &TestSession,
        variables: &VariableSet,
    ) -> Result<Value, ClientError> {
        let client = session.client_for(&self.actor)?;
        client.mutate(self.mutation.text(), variables).await
    }

    async fn expect_rejection(&self, session: &TestSession) -> Result<(), ScenarioFailure> {
        match self.submit(session, &self.variables).await {
            Ok(_) => Err(ScenarioFailure::UnexpectedAcceptance),
            Err(e) if e.is_rejection() => {
                debug!(scenario = %self.name, error = %e, "Rejected as expected");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn expect_acceptance(&self, session: &TestSession) -> Result<(), ScenarioFailure> {
        match self.submit(session, &self.variables).await {
            Ok(_) => Ok(()),
            Err(ClientError::Rejected { message }) => {
                Err(ScenarioFailure::UnexpectedRejection { message })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Submit the inputs tagged with a fresh correlation id; a failed
    /// mutation is logged and the effects are still checked.
    async fn submit_correlated(&self, session: &TestSession) -> String {
        let id = Uuid::new_v4().to_string();
        let mut variables = self.variables.clone();
        variables.insert(
            session.correlation_field().to_string(),
            Value::String(id.clone()),
        );
        if let Err(e) = self.submit(session, &variables).await {
            obs::emit_mutation_error(&self.name, &e);
        }
        id
    }

    async fn run_work(&self, item: &WorkItem, session: &TestSession) -> Result<(), ScenarioFailure> {
        let id = self.submit_correlated(session).await;
        let key = PrimaryKey::new(&item.evaluated_entity, &id, RecordKind::Snapshot);
        let (records, timeout) = poll_records(session, &key).await?;

        item.evaluate(&records).map_err(|detail| match timeout {
            Some(timeout) => ScenarioFailure::Timeout(timeout),
            None => ScenarioFailure::ExpectationNotMet { detail },
        })
    }

    async fn run_event(
        &self,
        event: &RegisteredEventSpec,
        session: &TestSession,
    ) -> Result<(), ScenarioFailure> {
        let id = self.submit_correlated(session).await;
        let key = PrimaryKey::new(&event.evaluated_entity, &id, RecordKind::Event);
        let (records, timeout) = poll_records(session, &key).await?;

        if !records.is_empty() {
            return Ok(());
        }
        Err(match timeout {
            Some(timeout) => ScenarioFailure::Timeout(timeout),
            None => ScenarioFailure::ExpectationNotMet {
                detail: format!("no {} event for {key}", event.event_name),
            },
        })
    }
}

/// Poll until records appear. On timeout the store is read once more so
/// absence expectations can still be evaluated.
async fn poll_records(
    session: &TestSession,
    key: &PrimaryKey,
) -> Result<(Vec<EventRecord>, Option<PollTimeout>), ScenarioFailure> {
    let key = key.to_string();
    let outcome = try_wait_for_it(
        || {
            let store = session.store().clone();
            let key = key.clone();
            async move { store.events(&key).await }
        },
        |records: &Vec<EventRecord>| !records.is_empty(),
        session.poll_config(),
    )
    .await;

    match outcome {
        Ok(records) => Ok((records, None)),
        Err(PollError::Timeout(timeout)) => {
            debug!(key = %key, attempts = timeout.attempts, "No records before timeout");
            let records = session.store().events(&key).await?;
            Ok((records, Some(timeout)))
        }
        Err(PollError::Probe(e)) => Err(ScenarioFailure::Store(e)),
    }
}
