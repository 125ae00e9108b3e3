//! Schema and record fixtures shared by unit tests

use crate::schema::{
    Attribute, AttributeOption, LocalizedText, Locale, Section, Step, StepSchema, ValueType,
};
use serde_json::json;
use std::path::Path;

pub(crate) fn attribute(id: i64, value_type: ValueType, required: bool) -> Attribute {
    Attribute {
        id,
        value_type,
        required,
        labels: vec![format!("Attribute {id}")],
        options: Vec::new(),
    }
}

pub(crate) fn baku_option() -> AttributeOption {
    let mut text = LocalizedText::new();
    text.insert(Locale::Az, "Bakı");
    text.insert(Locale::En, "Baku");
    text.insert(Locale::Ru, "Баку");
    AttributeOption { id: 501, text }
}

/// Step 1: a plain section with required string 10, and a repeatable
/// section with required select 20 offering "Baku" as option 501.
pub(crate) fn two_section_schema() -> StepSchema {
    let mut city = attribute(20, ValueType::Select, true);
    city.options.push(baku_option());
    StepSchema {
        step_id: 1,
        sections: vec![
            Section {
                id: 1,
                title: "Personal".to_string(),
                repeatable: false,
                attributes: vec![attribute(10, ValueType::String, true)],
            },
            Section {
                id: 2,
                title: "Education".to_string(),
                repeatable: true,
                attributes: vec![city],
            },
        ],
    }
}

/// Step 2: one optional attribute of every remaining value type
pub(crate) fn details_schema() -> StepSchema {
    let mut languages = attribute(36, ValueType::MultiSelect, false);
    languages.options.push(baku_option());
    StepSchema {
        step_id: 2,
        sections: vec![Section {
            id: 3,
            title: "Details".to_string(),
            repeatable: false,
            attributes: vec![
                attribute(32, ValueType::Number, false),
                attribute(33, ValueType::Radio, false),
                attribute(34, ValueType::Textarea, false),
                languages,
                attribute(37, ValueType::Date, false),
                attribute(38, ValueType::DateRange, false),
                attribute(39, ValueType::Checkbox, true),
                attribute(40, ValueType::Range, false),
                attribute(41, ValueType::Color, false),
                attribute(42, ValueType::Phone, false),
                attribute(43, ValueType::DateTime, false),
                attribute(44, ValueType::Email, false),
                attribute(45, ValueType::Price, false),
            ],
        }],
    }
}

pub(crate) fn step(id: i64, is_active: bool) -> Step {
    Step {
        id,
        titles: LocalizedText::uniform(&format!("Step {id}")),
        is_active,
    }
}

fn schema_json(schema: &StepSchema) -> serde_json::Value {
    let sections: Vec<_> = schema
        .sections
        .iter()
        .map(|section| {
            let attributes: Vec<_> = section
                .attributes
                .iter()
                .map(|attribute| {
                    let options: Vec<_> = attribute
                        .options
                        .iter()
                        .map(|option| {
                            let languages: Vec<_> = option
                                .text
                                .iter()
                                .map(|(locale, value)| {
                                    json!({"value": value, "name": locale.code()})
                                })
                                .collect();
                            json!({"id": option.id, "languages": languages})
                        })
                        .collect();
                    let sets: Vec<_> = attribute
                        .labels
                        .iter()
                        .map(|name| json!({"name": name}))
                        .collect();
                    json!({
                        "attributeId": attribute.id,
                        "valueType": attribute.value_type.code(),
                        "isImportant": attribute.required,
                        "attributeSets": sets,
                        "values": options,
                    })
                })
                .collect();
            json!({
                "sectionId": section.id,
                "title": section.title,
                "isChangeable": section.repeatable,
                "attributes": attributes,
            })
        })
        .collect();
    json!({ "sections": sections })
}

/// Write a candidate store: steps 1 and 2 active with schemas, step 3 inactive
pub(crate) fn seed_store(root: &Path) {
    let kind_dir = root.join("candidates");
    std::fs::create_dir_all(kind_dir.join("schemas")).unwrap();
    let steps = json!([
        {
            "id": 1,
            "titles": [
                {"value": "Şəxsi məlumat", "name": "az"},
                {"value": "Personal", "name": "en"}
            ],
            "isActive": true
        },
        {"id": 2, "titles": [{"value": "Details", "name": "en"}], "isActive": true},
        {"id": 3, "titles": [{"value": "Archive", "name": "en"}], "isActive": false}
    ]);
    std::fs::write(kind_dir.join("steps.json"), steps.to_string()).unwrap();
    for schema in [two_section_schema(), details_schema()] {
        std::fs::write(
            kind_dir.join("schemas").join(format!("{}.json", schema.step_id)),
            schema_json(&schema).to_string(),
        )
        .unwrap();
    }
}
