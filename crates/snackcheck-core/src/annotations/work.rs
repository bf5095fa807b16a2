use std::collections::BTreeMap;

use serde_json::Value;

use crate::error::{CoreError, Result};
use crate::fillers::{FillerSource, RandomFiller};
use crate::metadata::{Expectation, WorkItem};

use super::lexer::{tokenize, Token, WorkTag};
use super::literal::{parse_lenient, Literal};
use super::{parse_entity, parse_inputs};

type Tagged = Option<(usize, String)>;

#[derive(Default)]
struct WorkGroup {
    description: Tagged,
    inputs: Tagged,
    entity: Tagged,
    should_have: Tagged,
    should_not_have: Tagged,
}

impl WorkGroup {
    fn slot(&mut self, tag: WorkTag) -> &mut Tagged {
        match tag {
            WorkTag::Description => &mut self.description,
            WorkTag::Inputs => &mut self.inputs,
            WorkTag::Entity => &mut self.entity,
            WorkTag::ShouldHave => &mut self.should_have,
            WorkTag::ShouldNotHave => &mut self.should_not_have,
        }
    }
}

enum Outcome {
    Flag(bool),
    Values(Vec<Value>),
}

/// Read the `@workNN` annotation groups of a command source, ordered by
/// ordinal. Input placeholders are expanded with random values.
pub fn parse_work_items(source: &str) -> Result<Vec<WorkItem>> {
    work_items_from_tokens(&tokenize(source)?, &mut RandomFiller::new())
}

pub(crate) fn work_items_from_tokens(
    tokens: &[Token],
    filler: &mut dyn FillerSource,
) -> Result<Vec<WorkItem>> {
    let mut groups: BTreeMap<u8, WorkGroup> = BTreeMap::new();

    for token in tokens {
        let Token::Work {
            line,
            ordinal,
            tag,
            value,
        } = token
        else {
            continue;
        };
        let slot = groups.entry(*ordinal).or_default().slot(*tag);
        if slot.is_some() {
            return Err(CoreError::parse(
                *line,
                format!("duplicate @work{ordinal:02}{} tag", tag.suffix()),
            ));
        }
        *slot = Some((*line, value.clone()));
    }

    let mut items = Vec::with_capacity(groups.len());
    for (ordinal, group) in groups {
        items.push(build_item(ordinal, group, filler)?);
    }
    Ok(items)
}

fn build_item(ordinal: u8, group: WorkGroup, filler: &mut dyn FillerSource) -> Result<WorkItem> {
    let label = format!("work{ordinal:02}");
    let missing = |tag: WorkTag| CoreError::MissingAnnotation {
        subject: label.clone(),
        tag: format!("@{label}{}", tag.suffix()),
    };

    let (_, description) = group
        .description
        .filter(|(_, text)| !text.is_empty())
        .ok_or_else(|| missing(WorkTag::Description))?;
    let (inputs_line, inputs) = group.inputs.ok_or_else(|| missing(WorkTag::Inputs))?;
    let (entity_line, entity) = group.entity.ok_or_else(|| missing(WorkTag::Entity))?;
    if group.should_have.is_none() && group.should_not_have.is_none() {
        return Err(missing(WorkTag::ShouldHave));
    }

    let mut item = WorkItem {
        ordinal,
        description,
        test_inputs: parse_inputs(inputs_line, &inputs, filler)?,
        evaluated_entity: parse_entity(entity_line, &entity)?,
        should_have: None,
        should_not_have: None,
    };

    if let Some((line, raw)) = group.should_have {
        place(&mut item, line, parse_outcome(line, &raw)?, true)?;
    }
    if let Some((line, raw)) = group.should_not_have {
        place(&mut item, line, parse_outcome(line, &raw)?, false)?;
    }
    Ok(item)
}

fn parse_outcome(line: usize, raw: &str) -> Result<Outcome> {
    let invalid = || CoreError::parse(line, format!("invalid expected outcome '{raw}'"));
    let literal = parse_lenient(raw).map_err(|_| invalid())?;

    match literal {
        Literal::Bool(flag) => Ok(Outcome::Flag(flag)),
        scalar if scalar.is_scalar() => Ok(Outcome::Values(vec![scalar
            .to_value()
            .ok_or_else(invalid)?])),
        Literal::List(items) if !items.is_empty() && items.iter().all(Literal::is_scalar) => {
            let values = items
                .iter()
                .map(Literal::to_value)
                .collect::<Option<Vec<_>>>()
                .ok_or_else(invalid)?;
            Ok(Outcome::Values(values))
        }
        _ => Err(invalid()),
    }
}

/// `false` on one side means `Exists` on the other.
fn place(item: &mut WorkItem, line: usize, outcome: Outcome, should_have: bool) -> Result<()> {
    let label = item.label();
    let (positive, expectation) = match outcome {
        Outcome::Flag(flag) => (flag == should_have, Expectation::Exists),
        Outcome::Values(values) => (should_have, Expectation::Values(values)),
    };
    let slot = if positive {
        &mut item.should_have
    } else {
        &mut item.should_not_have
    };

    if let Some(existing) = slot.as_ref() {
        if *existing != expectation {
            return Err(CoreError::parse(
                line,
                format!("conflicting expectations for {label}"),
            ));
        }
    }
    *slot = Some(expectation);
    Ok(())
}
