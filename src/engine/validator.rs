//! Required-field validation across section instances

use crate::schema::{Section, StepSchema};
use crate::state::{FieldKey, FormState};
use std::collections::BTreeSet;
use std::fmt;

/// Keys of required fields that are empty; valid iff none
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    invalid: BTreeSet<FieldKey>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }

    pub fn invalid_keys(&self) -> &BTreeSet<FieldKey> {
        &self.invalid
    }

    pub fn contains(&self, key: FieldKey) -> bool {
        self.invalid.contains(&key)
    }

    pub fn len(&self) -> usize {
        self.invalid.len()
    }

    pub fn is_empty(&self) -> bool {
        self.invalid.is_empty()
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.invalid.iter().map(FieldKey::to_string).collect();
        write!(f, "{}", keys.join(", "))
    }
}

/// Validate the sections of a single step
pub fn validate_step(schema: &StepSchema, form: &FormState) -> ValidationReport {
    validate_steps(std::iter::once(schema), form)
}

/// Validate every given step; used at final submission
pub fn validate_steps<'a>(
    schemas: impl IntoIterator<Item = &'a StepSchema>,
    form: &FormState,
) -> ValidationReport {
    let mut invalid = BTreeSet::new();
    for schema in schemas {
        for section in &schema.sections {
            collect_section(section, form, &mut invalid);
        }
    }
    ValidationReport { invalid }
}

fn collect_section(section: &Section, form: &FormState, invalid: &mut BTreeSet<FieldKey>) {
    for instance in form.instances().indices(section.id) {
        for attribute in section.attributes.iter().filter(|a| a.required) {
            let key = FieldKey::new(attribute.id, instance);
            if attribute.value_type.is_empty(form.value(key)) {
                invalid.insert(key);
            }
        }
    }
}
