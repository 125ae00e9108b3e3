//! Extra instance counters of repeatable sections

use crate::schema::SectionId;
use std::collections::HashMap;
use std::ops::RangeInclusive;

/// How many instances beyond the canonical instance 0 each section has
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionInstances {
    extra: HashMap<SectionId, u32>,
}

impl SectionInstances {
    pub fn extra(&self, section_id: SectionId) -> u32 {
        self.extra.get(&section_id).copied().unwrap_or(0)
    }

    /// Total instances, always at least one
    pub fn count(&self, section_id: SectionId) -> u32 {
        self.extra(section_id) + 1
    }

    /// Instance indices currently present for the section
    pub fn indices(&self, section_id: SectionId) -> RangeInclusive<u32> {
        0..=self.extra(section_id)
    }

    pub fn contains(&self, section_id: SectionId, instance: u32) -> bool {
        instance <= self.extra(section_id)
    }

    /// Append an instance, returning its index
    pub fn add(&mut self, section_id: SectionId) -> u32 {
        let counter = self.extra.entry(section_id).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Drop the last instance, returning the removed index. Instance 0 is
    /// never removed.
    pub fn remove(&mut self, section_id: SectionId) -> Option<u32> {
        let counter = self.extra.get_mut(&section_id)?;
        if *counter == 0 {
            return None;
        }
        let removed = *counter;
        *counter -= 1;
        if *counter == 0 {
            self.extra.remove(&section_id);
        }
        Some(removed)
    }

    /// Ensure the section has at least `extra` additional instances
    pub fn ensure(&mut self, section_id: SectionId, extra: u32) {
        if extra > self.extra(section_id) {
            self.extra.insert(section_id, extra);
        }
    }

    pub fn clear(&mut self) {
        self.extra.clear();
    }
}
