//! Create/update payload written to the record service

use crate::schema::{AttributeId, Locale, OptionId, RecordId, SectionId};
use serde::{Deserialize, Serialize};

/// Flat list of section entries, one per (section, instance) pair.
/// Instance identity is implied by the order in which entries repeat.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    pub section_dtos: Vec<SectionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionEntry {
    pub section_id: SectionId,
    pub attributes: Vec<AttributeEntry>,
}

/// Unset attributes still get an entry with both lists empty; the store
/// decides what to clear by the presence of entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeEntry {
    pub attribute_id: AttributeId,
    pub attribute_value_ids: Vec<OptionId>,
    pub input_value: Vec<LiteralEntry>,
}

impl AttributeEntry {
    pub fn is_empty(&self) -> bool {
        self.attribute_value_ids.is_empty() && self.input_value.is_empty()
    }
}

/// A free-text value in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiteralEntry {
    pub value: String,
    pub language: Locale,
}

impl LiteralEntry {
    /// The same text once per locale; literals are never partially localized
    pub fn replicate(text: &str) -> Vec<LiteralEntry> {
        Locale::ALL
            .into_iter()
            .map(|language| LiteralEntry {
                value: text.to_string(),
                language,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_create_payload_omits_id() {
        let payload = RecordPayload {
            id: None,
            section_dtos: vec![SectionEntry {
                section_id: 1,
                attributes: vec![AttributeEntry {
                    attribute_id: 10,
                    attribute_value_ids: vec![],
                    input_value: LiteralEntry::replicate("Ali"),
                }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "sectionDtos": [{
                    "sectionId": 1,
                    "attributes": [{
                        "attributeId": 10,
                        "attributeValueIds": [],
                        "inputValue": [
                            {"value": "Ali", "language": "az"},
                            {"value": "Ali", "language": "en"},
                            {"value": "Ali", "language": "ru"}
                        ]
                    }]
                }]
            })
        );
    }

    #[test]
    fn test_update_payload_carries_id() {
        let payload = RecordPayload {
            id: Some(42),
            section_dtos: vec![],
        };
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"id": 42, "sectionDtos": []})
        );
    }

    #[test]
    fn test_replicate_covers_all_locales_once() {
        let entries = LiteralEntry::replicate("Ganja");
        assert_eq!(entries.len(), 3);
        let languages: Vec<_> = entries.iter().map(|e| e.language).collect();
        assert_eq!(languages, vec![Locale::Az, Locale::En, Locale::Ru]);
    }
}
