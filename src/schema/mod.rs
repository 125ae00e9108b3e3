//! Runtime schema model
//!
//! Records are not hard-coded forms: each record kind is described by an
//! ordered list of steps, each step by a [`StepSchema`] of sections and
//! attributes fetched at runtime. The types here are the read-only,
//! in-memory form of that schema.

mod value_type;
mod wire;

pub use value_type::{HydrateRule, Shape, ValueType, ValueTypeSpec, WireEntries};
pub use wire::{
    AttributeSetDto, LanguageValueDto, OptionDto, SchemaAttributeDto, SchemaSectionDto,
    StepDto, StepSchemaDto,
};
pub(crate) use wire::language_values;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub type StepId = i64;
pub type SectionId = i64;
pub type AttributeId = i64;
pub type OptionId = i64;
pub type RecordId = i64;

/// Errors raised while converting a fetched schema into the model
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("attribute {attribute_id} has unknown value type code {code}")]
    UnknownValueType { attribute_id: AttributeId, code: u8 },
}

/// The fixed locale set every literal is written in
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Az,
    En,
    Ru,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::Az, Locale::En, Locale::Ru];

    pub fn code(self) -> &'static str {
        match self {
            Self::Az => "az",
            Self::En => "en",
            Self::Ru => "ru",
        }
    }

    /// Parse a wire language tag ("az", "EN", ...)
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|locale| locale.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl std::str::FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| format!("unknown locale '{s}' (expected az, en or ru)"))
    }
}

/// One literal expressed per locale
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalizedText {
    values: BTreeMap<Locale, String>,
}

impl LocalizedText {
    pub fn new() -> Self {
        Self::default()
    }

    /// The same text in every locale
    pub fn uniform(text: &str) -> Self {
        Self {
            values: Locale::ALL
                .into_iter()
                .map(|locale| (locale, text.to_string()))
                .collect(),
        }
    }

    pub fn insert(&mut self, locale: Locale, text: impl Into<String>) {
        self.values.insert(locale, text.into());
    }

    pub fn get(&self, locale: Locale) -> Option<&str> {
        self.values.get(&locale).map(String::as_str)
    }

    /// Text for `locale`, falling back to az, then to any locale
    pub fn resolve(&self, locale: Locale) -> &str {
        self.get(locale)
            .or_else(|| self.get(Locale::Az))
            .or_else(|| self.values.values().next().map(String::as_str))
            .unwrap_or("")
    }

    /// Exact, case-sensitive match against any locale
    pub fn contains(&self, text: &str) -> bool {
        self.values.values().any(|value| value == text)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Locale, &str)> {
        self.values
            .iter()
            .map(|(locale, value)| (*locale, value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A step of the record wizard
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: StepId,
    pub titles: LocalizedText,
    pub is_active: bool,
}

/// A pre-existing selectable value of a select/multiselect attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeOption {
    pub id: OptionId,
    pub text: LocalizedText,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub id: AttributeId,
    pub value_type: ValueType,
    pub required: bool,
    pub labels: Vec<String>,
    pub options: Vec<AttributeOption>,
}

impl Attribute {
    /// Only single and multi select attributes offer an option list
    pub fn selectable(&self) -> bool {
        self.value_type.spec().selectable
    }

    /// First option carrying `literal` in any locale
    pub fn find_option(&self, literal: &str) -> Option<&AttributeOption> {
        self.options.iter().find(|option| option.text.contains(literal))
    }

    pub fn label(&self) -> &str {
        self.labels.first().map(String::as_str).unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub title: String,
    /// Whether additional instances may be added (wire `isChangeable`)
    pub repeatable: bool,
    pub attributes: Vec<Attribute>,
}

impl Section {
    pub fn attribute(&self, attribute_id: AttributeId) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.id == attribute_id)
    }
}

/// Sections and attributes of one step
#[derive(Debug, Clone, PartialEq)]
pub struct StepSchema {
    pub step_id: StepId,
    pub sections: Vec<Section>,
}

impl StepSchema {
    pub fn section(&self, section_id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == section_id)
    }

    /// Locate an attribute together with its owning section
    pub fn attribute(&self, attribute_id: AttributeId) -> Option<(&Section, &Attribute)> {
        self.sections.iter().find_map(|section| {
            section
                .attribute(attribute_id)
                .map(|attribute| (section, attribute))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locale_from_code_is_case_insensitive() {
        assert_eq!(Locale::from_code("AZ"), Some(Locale::Az));
        assert_eq!(Locale::from_code(" ru "), Some(Locale::Ru));
        assert_eq!(Locale::from_code("de"), None);
    }

    #[test]
    fn test_uniform_text_covers_every_locale() {
        let text = LocalizedText::uniform("Baku");
        for locale in Locale::ALL {
            assert_eq!(text.get(locale), Some("Baku"));
        }
    }

    #[test]
    fn test_resolve_falls_back_to_az() {
        let mut text = LocalizedText::new();
        text.insert(Locale::Az, "Bakı");
        assert_eq!(text.resolve(Locale::En), "Bakı");
        assert_eq!(LocalizedText::new().resolve(Locale::En), "");
    }

    #[test]
    fn test_contains_is_exact() {
        let mut text = LocalizedText::new();
        text.insert(Locale::Az, "Bakı");
        text.insert(Locale::En, "Baku");
        assert!(text.contains("Baku"));
        assert!(!text.contains("baku"));
        assert!(!text.contains("Baku "));
    }

    #[test]
    fn test_step_schema_locates_attribute_and_section() {
        let schema = crate::test_support::two_section_schema();
        let (section, attribute) = schema.attribute(20).unwrap();
        assert_eq!(section.id, 2);
        assert!(attribute.selectable());
        assert!(schema.attribute(999).is_none());
    }
}
