//! Rebuild form state from a persisted record

use crate::record::{PersistedRecord, PersistedValue, ValueSet};
use crate::schema::{HydrateRule, Locale, SectionId, StepSchema, ValueType};
use crate::state::{DateRange, FieldKey, FormState, FormValue};
use std::collections::HashMap;
use tracing::debug;

const RANGE_SEPARATOR: &str = " - ";

/// Hydrate form state for every step of `record` whose schema is loaded.
///
/// Repeated occurrences of a section within a step become instances 0, 1, ...
/// Sections and attributes missing from the schema are skipped, so every
/// resulting key references a loaded attribute.
pub fn hydrate<'a>(
    schemas: impl IntoIterator<Item = &'a StepSchema>,
    record: &PersistedRecord,
) -> FormState {
    let schemas: HashMap<_, _> = schemas
        .into_iter()
        .map(|schema| (schema.step_id, schema))
        .collect();
    let mut form = FormState::new();

    for step in &record.steps {
        let Some(schema) = schemas.get(&step.id) else {
            debug!("Skipping persisted step {} without loaded schema", step.id);
            continue;
        };
        let mut occurrences: HashMap<SectionId, u32> = HashMap::new();

        for persisted in &step.sections {
            let Some(section) = schema.section(persisted.id) else {
                debug!("Skipping unknown section {} in step {}", persisted.id, step.id);
                continue;
            };
            let seen = occurrences.entry(section.id).or_insert(0);
            let instance = *seen;
            *seen += 1;
            if instance > 0 {
                if !section.repeatable {
                    debug!("Ignoring repeated occurrence of fixed section {}", section.id);
                    continue;
                }
                form.ensure_instances(section.id, instance);
            }

            for attribute in &persisted.attributes {
                let Some(definition) = section.attribute(attribute.attribute_id) else {
                    debug!(
                        "Skipping attribute {} not in section {}",
                        attribute.attribute_id, section.id
                    );
                    continue;
                };
                if let Some(value) = extract_value(definition.value_type, &attribute.values) {
                    form.set_value(FieldKey::new(definition.id, instance), value);
                }
            }
        }
    }

    form
}

/// Extract one form value from an attribute's persisted values, following
/// the value type's hydration rule. Blank results yield `None`.
pub fn extract_value(value_type: ValueType, values: &[PersistedValue]) -> Option<FormValue> {
    let first = values.first()?;
    let value = match value_type.spec().hydrate {
        HydrateRule::Scalar => FormValue::Text(display_or_scalar(first)?),
        HydrateRule::List => FormValue::List(values.iter().filter_map(display_or_scalar).collect()),
        HydrateRule::DateRange => parse_range(display_or_scalar(first)?),
        HydrateRule::DateTime => FormValue::Text(
            az_set(first)
                .and_then(|set| set.date_time_value.clone())
                .or_else(|| first.display_text().map(str::to_string))?,
        ),
        HydrateRule::Checkbox => FormValue::Bool(
            az_set(first)
                .and_then(|set| set.bool_value)
                .or_else(|| first.display.as_deref().map(|d| d == "true"))?,
        ),
        HydrateRule::Numeric => FormValue::Number(numeric(first)?),
    };
    (!value.is_blank()).then_some(value)
}

fn az_set(value: &PersistedValue) -> Option<&ValueSet> {
    value.set_for(Locale::Az)
}

fn display_or_scalar(value: &PersistedValue) -> Option<String> {
    value
        .display_text()
        .map(str::to_string)
        .or_else(|| az_set(value).and_then(ValueSet::scalar))
}

fn parse_range(raw: String) -> FormValue {
    match raw.split_once(RANGE_SEPARATOR) {
        Some((start, end)) => FormValue::Range(DateRange::new(start.trim(), end.trim())),
        None => FormValue::Text(raw),
    }
}

fn numeric(value: &PersistedValue) -> Option<f64> {
    if let Some(n) = az_set(value).and_then(|set| set.decimal_value) {
        return Some(n);
    }
    display_or_scalar(value).and_then(|text| text.trim().parse().ok())
}
