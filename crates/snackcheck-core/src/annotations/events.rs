use tracing::debug;

use crate::error::{CoreError, Result};
use crate::fillers::{FillerSource, RandomFiller};
use crate::metadata::RegisteredEventSpec;

use super::lexer::{tokenize, EventTag, Token};
use super::{parse_entity, parse_inputs};

struct Pending {
    name: String,
    inputs: Option<(usize, String)>,
    entity: Option<(usize, String)>,
}

/// Read the annotated event constructors inside `register.events(...)` calls.
/// Input placeholders are expanded with random values.
pub fn parse_registered_events(source: &str) -> Result<Vec<RegisteredEventSpec>> {
    events_from_tokens(&tokenize(source)?, &mut RandomFiller::new())
}

pub(crate) fn events_from_tokens(
    tokens: &[Token],
    filler: &mut dyn FillerSource,
) -> Result<Vec<RegisteredEventSpec>> {
    let mut pending: Vec<Pending> = Vec::new();
    // index of the constructor whose annotations may still follow
    let mut annotating: Option<usize> = None;
    let mut last_constructor_line = 0;

    for token in tokens {
        match token {
            Token::Constructor { line, name } => {
                // the first constructor on a line owns the annotations below it
                if annotating.is_none() || *line != last_constructor_line {
                    pending.push(Pending {
                        name: name.clone(),
                        inputs: None,
                        entity: None,
                    });
                    annotating = Some(pending.len() - 1);
                }
                last_constructor_line = *line;
            }
            Token::Event { line, tag, value } => {
                let target = annotating.and_then(|idx| pending.get_mut(idx)).ok_or_else(|| {
                    CoreError::parse(
                        *line,
                        format!(
                            "{} is not directly below an event constructor in register.events(...)",
                            tag.name()
                        ),
                    )
                })?;
                let slot = match tag {
                    EventTag::RequiredInputs => &mut target.inputs,
                    EventTag::EvaluatedEntity => &mut target.entity,
                };
                if slot.is_some() {
                    return Err(CoreError::parse(
                        *line,
                        format!("duplicate {} for {}", tag.name(), target.name),
                    ));
                }
                *slot = Some((*line, value.clone()));
            }
            Token::RegisterOpen { .. } => annotating = None,
            Token::RegisterClose { .. } | Token::Work { .. } => {}
            Token::Code { .. } | Token::Authorize { .. } | Token::ReadonlyField { .. } => {
                annotating = None
            }
        }
    }

    let mut events = Vec::new();
    for event in pending {
        match (event.inputs, event.entity) {
            (None, None) => {
                debug!(event = %event.name, "Skipping unannotated event constructor");
            }
            (Some(_), None) => {
                return Err(CoreError::MissingAnnotation {
                    subject: event.name,
                    tag: EventTag::EvaluatedEntity.name().to_string(),
                })
            }
            (None, Some(_)) => {
                return Err(CoreError::MissingAnnotation {
                    subject: event.name,
                    tag: EventTag::RequiredInputs.name().to_string(),
                })
            }
            (Some((inputs_line, inputs)), Some((entity_line, entity))) => {
                events.push(RegisteredEventSpec {
                    triggering_input: parse_inputs(inputs_line, &inputs, filler)?,
                    evaluated_entity: parse_entity(entity_line, &entity)?,
                    event_name: event.name,
                });
            }
        }
    }
    Ok(events)
}
