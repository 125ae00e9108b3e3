//! Record read shape returned by the record service in edit mode

use crate::schema::{AttributeId, Locale, RecordId, SectionId, StepId};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub steps: Vec<PersistedStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedStep {
    pub id: StepId,
    #[serde(default)]
    pub sections: Vec<PersistedSection>,
}

/// One section instance; a repeated section appears once per instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSection {
    pub id: SectionId,
    #[serde(default)]
    pub attributes: Vec<PersistedAttribute>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAttribute {
    pub attribute_id: AttributeId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<u8>,
    #[serde(default)]
    pub values: Vec<PersistedValue>,
}

/// A stored value: a display string, an untagged set, or per-language sets
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub set: Option<ValueSet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sets: Vec<LocalizedValueSet>,
}

impl PersistedValue {
    /// The set for `locale`, else the untagged set, else the first set
    pub fn set_for(&self, locale: Locale) -> Option<&ValueSet> {
        self.sets
            .iter()
            .find(|set| Locale::from_code(&set.language) == Some(locale))
            .map(|set| &set.value)
            .or(self.set.as_ref())
            .or_else(|| self.sets.first().map(|set| &set.value))
    }

    /// Non-empty display text
    pub fn display_text(&self) -> Option<&str> {
        self.display.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// Typed value columns; exactly one is expected to be non-null
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub string_value: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_decimal",
        skip_serializing_if = "Option::is_none"
    )]
    pub decimal_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bool_value: Option<bool>,
}

impl ValueSet {
    /// First non-null column rendered as text
    pub fn scalar(&self) -> Option<String> {
        self.string_value
            .clone()
            .or_else(|| self.decimal_value.map(|n| n.to_string()))
            .or_else(|| self.date_time_value.clone())
            .or_else(|| self.bool_value.map(|b| b.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalizedValueSet {
    pub language: String,
    #[serde(flatten)]
    pub value: ValueSet,
}

/// Decimal columns arrive either as JSON numbers or as numeric strings
fn deserialize_decimal<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Decimal {
        Number(f64),
        Text(String),
    }

    match Option::<Decimal>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Decimal::Number(n)) => Ok(Some(n)),
        Some(Decimal::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(Decimal::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
