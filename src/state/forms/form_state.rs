//! Form state: field values per section instance plus the failing keys

use super::field::{FieldKey, FormValue};
use super::instances::SectionInstances;
use crate::schema::{AttributeId, Section, SectionId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// In-memory state of one record being authored
///
/// Values live in a two-level map, attribute id first and instance index
/// second, so pruning a removed instance never has to parse keys.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    values: HashMap<AttributeId, BTreeMap<u32, FormValue>>,
    instances: SectionInstances,
    errors: BTreeSet<FieldKey>,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, key: FieldKey) -> Option<&FormValue> {
        self.values
            .get(&key.attribute_id)
            .and_then(|by_instance| by_instance.get(&key.instance))
    }

    /// Store a value; the field stops being flagged as invalid
    pub fn set_value(&mut self, key: FieldKey, value: FormValue) {
        self.values
            .entry(key.attribute_id)
            .or_default()
            .insert(key.instance, value);
        self.errors.remove(&key);
    }

    pub fn clear_value(&mut self, key: FieldKey) -> Option<FormValue> {
        let by_instance = self.values.get_mut(&key.attribute_id)?;
        let removed = by_instance.remove(&key.instance);
        if by_instance.is_empty() {
            self.values.remove(&key.attribute_id);
        }
        removed
    }

    /// All stored values, in key order
    pub fn entries(&self) -> Vec<(FieldKey, &FormValue)> {
        let mut entries: Vec<_> = self
            .values
            .iter()
            .flat_map(|(attribute_id, by_instance)| {
                by_instance
                    .iter()
                    .map(|(instance, value)| (FieldKey::new(*attribute_id, *instance), value))
            })
            .collect();
        entries.sort_by_key(|(key, _)| *key);
        entries
    }

    pub fn len(&self) -> usize {
        self.values.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn instances(&self) -> &SectionInstances {
        &self.instances
    }

    pub fn extra_instances(&self, section_id: SectionId) -> u32 {
        self.instances.extra(section_id)
    }

    /// Append an instance of the section, returning its index
    pub fn add_instance(&mut self, section_id: SectionId) -> u32 {
        self.instances.add(section_id)
    }

    /// Remove the section's last instance and every value stored for it.
    /// Returns the removed index, or `None` when only instance 0 exists.
    pub fn remove_instance(&mut self, section: &Section) -> Option<u32> {
        let removed = self.instances.remove(section.id)?;
        for attribute in &section.attributes {
            self.clear_value(FieldKey::new(attribute.id, removed));
        }
        self.errors.retain(|key| {
            key.instance != removed || section.attribute(key.attribute_id).is_none()
        });
        Some(removed)
    }

    pub(crate) fn ensure_instances(&mut self, section_id: SectionId, extra: u32) {
        self.instances.ensure(section_id, extra);
    }

    pub fn errors(&self) -> &BTreeSet<FieldKey> {
        &self.errors
    }

    pub fn has_error(&self, key: FieldKey) -> bool {
        self.errors.contains(&key)
    }

    pub fn set_errors(&mut self, errors: BTreeSet<FieldKey>) {
        self.errors = errors;
    }

    /// Drop error keys of the section's attributes, across all instances
    pub fn clear_section_errors(&mut self, section: &Section) {
        self.errors.retain(|key| section.attribute(key.attribute_id).is_none());
    }

    /// Discard everything, as after a successful submission
    pub fn reset(&mut self) {
        self.values.clear();
        self.instances.clear();
        self.errors.clear();
    }
}
