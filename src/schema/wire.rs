//! Wire shapes of the schema service and their conversion into the model

use super::{
    Attribute, AttributeId, AttributeOption, LocalizedText, Locale, OptionId, SchemaError,
    Section, SectionId, Step, StepId, StepSchema, ValueType,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// `{value, name}` pair where `name` is the language tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageValueDto {
    pub value: String,
    pub name: String,
}

/// Step list entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDto {
    pub id: StepId,
    #[serde(default)]
    pub titles: Vec<LanguageValueDto>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Response of the per-step schema read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepSchemaDto {
    #[serde(default)]
    pub sections: Vec<SchemaSectionDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaSectionDto {
    pub section_id: SectionId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_changeable: bool,
    #[serde(default)]
    pub attributes: Vec<SchemaAttributeDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaAttributeDto {
    pub attribute_id: AttributeId,
    pub value_type: u8,
    #[serde(default)]
    pub is_important: bool,
    #[serde(default)]
    pub attribute_sets: Vec<AttributeSetDto>,
    #[serde(default)]
    pub values: Vec<OptionDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeSetDto {
    pub name: String,
}

/// A selectable option with one literal per language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDto {
    #[serde(alias = "attributeValueId")]
    pub id: OptionId,
    #[serde(default)]
    pub languages: Vec<LanguageValueDto>,
}

pub(crate) fn localized(values: &[LanguageValueDto]) -> LocalizedText {
    let mut text = LocalizedText::new();
    for entry in values {
        match Locale::from_code(&entry.name) {
            Some(locale) => text.insert(locale, entry.value.clone()),
            None => warn!("Ignoring value in unsupported language '{}'", entry.name),
        }
    }
    text
}

pub(crate) fn language_values(text: &LocalizedText) -> Vec<LanguageValueDto> {
    text.iter()
        .map(|(locale, value)| LanguageValueDto {
            value: value.to_string(),
            name: locale.code().to_string(),
        })
        .collect()
}

impl From<StepDto> for Step {
    fn from(dto: StepDto) -> Self {
        Step {
            id: dto.id,
            titles: localized(&dto.titles),
            is_active: dto.is_active,
        }
    }
}

impl StepSchemaDto {
    /// Convert into the model, rejecting unknown value-type codes
    pub fn into_schema(self, step_id: StepId) -> Result<StepSchema, SchemaError> {
        let sections = self
            .sections
            .into_iter()
            .map(SchemaSectionDto::into_section)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StepSchema { step_id, sections })
    }
}

impl SchemaSectionDto {
    fn into_section(self) -> Result<Section, SchemaError> {
        let attributes = self
            .attributes
            .into_iter()
            .map(SchemaAttributeDto::into_attribute)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Section {
            id: self.section_id,
            title: self.title,
            repeatable: self.is_changeable,
            attributes,
        })
    }
}

impl SchemaAttributeDto {
    fn into_attribute(self) -> Result<Attribute, SchemaError> {
        let value_type =
            ValueType::from_code(self.value_type).ok_or(SchemaError::UnknownValueType {
                attribute_id: self.attribute_id,
                code: self.value_type,
            })?;
        let options = if value_type.spec().selectable {
            self.values
                .iter()
                .map(|option| AttributeOption {
                    id: option.id,
                    text: localized(&option.languages),
                })
                .collect()
        } else {
            Vec::new()
        };
        Ok(Attribute {
            id: self.attribute_id,
            value_type,
            required: self.is_important,
            labels: self.attribute_sets.into_iter().map(|set| set.name).collect(),
            options,
        })
    }
}
