//! Serialize form state into the create/update payload

use crate::record::{AttributeEntry, RecordPayload, SectionEntry};
use crate::schema::{Attribute, RecordId, StepSchema};
use crate::state::{FieldKey, FormState, FormValue};

/// One entry per (section, instance) pair, in step, section, instance order
pub fn section_entries<'a>(
    schemas: impl IntoIterator<Item = &'a StepSchema>,
    form: &FormState,
) -> Vec<SectionEntry> {
    let mut entries = Vec::new();
    for schema in schemas {
        for section in &schema.sections {
            for instance in form.instances().indices(section.id) {
                entries.push(SectionEntry {
                    section_id: section.id,
                    attributes: section
                        .attributes
                        .iter()
                        .map(|attribute| {
                            let value = form.value(FieldKey::new(attribute.id, instance));
                            attribute_entry(attribute, value)
                        })
                        .collect(),
                });
            }
        }
    }
    entries
}

/// Entry for one attribute instance. Unset attributes yield an entry with
/// both lists empty rather than no entry at all.
pub fn attribute_entry(attribute: &Attribute, value: Option<&FormValue>) -> AttributeEntry {
    let wire = value
        .map(|value| {
            attribute
                .value_type
                .to_wire_entries(value, &attribute.options)
        })
        .unwrap_or_default();
    AttributeEntry {
        attribute_id: attribute.id,
        attribute_value_ids: wire.attribute_value_ids,
        input_value: wire.literal_entries,
    }
}

pub fn create_payload<'a>(
    schemas: impl IntoIterator<Item = &'a StepSchema>,
    form: &FormState,
) -> RecordPayload {
    RecordPayload {
        id: None,
        section_dtos: section_entries(schemas, form),
    }
}

pub fn update_payload<'a>(
    record_id: RecordId,
    schemas: impl IntoIterator<Item = &'a StepSchema>,
    form: &FormState,
) -> RecordPayload {
    RecordPayload {
        id: Some(record_id),
        section_dtos: section_entries(schemas, form),
    }
}
