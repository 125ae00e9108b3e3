//! Value-type registry
//!
//! Every attribute carries one of fifteen value-type codes. The registry maps
//! each code to the shape of its in-memory value, its emptiness predicate, its
//! serialization rule and the rule used to read it back from a persisted
//! record. Validator, hydrator and serializer only ever consult this table.

use super::{AttributeOption, OptionId};
use crate::record::LiteralEntry;
use crate::state::{parse_instant, FormValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The fifteen attribute value types, by wire code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ValueType {
    String = 1,
    Number = 2,
    Radio = 3,
    Textarea = 4,
    Select = 5,
    MultiSelect = 6,
    Date = 7,
    DateRange = 8,
    Checkbox = 9,
    Range = 10,
    Color = 11,
    Phone = 12,
    DateTime = 13,
    Email = 14,
    Price = 15,
}

/// In-memory shape of a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    Array,
    Range,
    Boolean,
}

/// How a persisted value is turned back into a form value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrateRule {
    /// First value's display text, else its az scalar
    Scalar,
    /// Every value's display text (or az scalar), collected
    List,
    /// `"<start> - <end>"` split into a range
    DateRange,
    /// `dateTimeValue` verbatim
    DateTime,
    /// `boolValue`, else `display == "true"`
    Checkbox,
    /// `decimalValue` coerced to a number
    Numeric,
}

/// Option ids and literal entries produced for one attribute instance
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WireEntries {
    pub attribute_value_ids: Vec<OptionId>,
    pub literal_entries: Vec<LiteralEntry>,
}

impl WireEntries {
    fn push_literal(&mut self, text: &str) {
        self.literal_entries.extend(LiteralEntry::replicate(text));
    }
}

/// Registry entry for one value type
pub struct ValueTypeSpec {
    pub value_type: ValueType,
    pub name: &'static str,
    pub shape: Shape,
    pub selectable: bool,
    pub hydrate: HydrateRule,
    pub is_empty: fn(Option<&FormValue>) -> bool,
    pub to_wire: fn(&FormValue, &[AttributeOption]) -> WireEntries,
}

impl fmt::Debug for ValueTypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueTypeSpec")
            .field("value_type", &self.value_type)
            .field("name", &self.name)
            .field("shape", &self.shape)
            .field("selectable", &self.selectable)
            .finish()
    }
}

const fn entry(
    value_type: ValueType,
    name: &'static str,
    shape: Shape,
    hydrate: HydrateRule,
    is_empty: fn(Option<&FormValue>) -> bool,
    to_wire: fn(&FormValue, &[AttributeOption]) -> WireEntries,
) -> ValueTypeSpec {
    ValueTypeSpec {
        value_type,
        name,
        shape,
        selectable: false,
        hydrate,
        is_empty,
        to_wire,
    }
}

const fn selectable(spec: ValueTypeSpec) -> ValueTypeSpec {
    ValueTypeSpec {
        selectable: true,
        ..spec
    }
}

// Indexed by `code - 1`.
#[rustfmt::skip]
static REGISTRY: [ValueTypeSpec; 15] = [
    entry(ValueType::String, "string", Shape::Scalar, HydrateRule::Scalar, blank_text, literal_entries),
    entry(ValueType::Number, "number", Shape::Scalar, HydrateRule::Numeric, blank_number, literal_entries),
    entry(ValueType::Radio, "radio", Shape::Scalar, HydrateRule::Scalar, blank_text, literal_entries),
    entry(ValueType::Textarea, "textarea", Shape::Scalar, HydrateRule::Scalar, blank_text, literal_entries),
    selectable(entry(ValueType::Select, "select", Shape::Scalar, HydrateRule::Scalar, blank_text, option_entries)),
    selectable(entry(ValueType::MultiSelect, "multiselect", Shape::Array, HydrateRule::List, blank_list, option_entries)),
    entry(ValueType::Date, "date", Shape::Scalar, HydrateRule::DateTime, blank_instant, literal_entries),
    entry(ValueType::DateRange, "date-range", Shape::Range, HydrateRule::DateRange, blank_range, literal_entries),
    entry(ValueType::Checkbox, "checkbox", Shape::Boolean, HydrateRule::Checkbox, unchecked, checkbox_entries),
    entry(ValueType::Range, "range", Shape::Scalar, HydrateRule::Numeric, blank_number, literal_entries),
    entry(ValueType::Color, "color", Shape::Scalar, HydrateRule::Scalar, blank_text, literal_entries),
    entry(ValueType::Phone, "phone", Shape::Scalar, HydrateRule::Scalar, blank_text, literal_entries),
    entry(ValueType::DateTime, "datetime", Shape::Scalar, HydrateRule::DateTime, blank_instant, literal_entries),
    entry(ValueType::Email, "email", Shape::Scalar, HydrateRule::Scalar, blank_text, literal_entries),
    entry(ValueType::Price, "price", Shape::Scalar, HydrateRule::Numeric, blank_number, literal_entries),
];

impl ValueType {
    pub const ALL: [ValueType; 15] = [
        Self::String,
        Self::Number,
        Self::Radio,
        Self::Textarea,
        Self::Select,
        Self::MultiSelect,
        Self::Date,
        Self::DateRange,
        Self::Checkbox,
        Self::Range,
        Self::Color,
        Self::Phone,
        Self::DateTime,
        Self::Email,
        Self::Price,
    ];

    pub fn from_code(code: u8) -> Option<Self> {
        REGISTRY
            .get(usize::from(code).checked_sub(1)?)
            .map(|spec| spec.value_type)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn spec(self) -> &'static ValueTypeSpec {
        &REGISTRY[usize::from(self.code()) - 1]
    }

    pub fn shape(self) -> Shape {
        self.spec().shape
    }

    pub fn is_empty(self, value: Option<&FormValue>) -> bool {
        (self.spec().is_empty)(value)
    }

    pub fn to_wire_entries(self, value: &FormValue, options: &[AttributeOption]) -> WireEntries {
        (self.spec().to_wire)(value, options)
    }
}

impl TryFrom<u8> for ValueType {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Self::from_code(code).ok_or_else(|| format!("unknown value type code {code}"))
    }
}

impl From<ValueType> for u8 {
    fn from(value_type: ValueType) -> Self {
        value_type.code()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.spec().name)
    }
}

fn blank_text(value: Option<&FormValue>) -> bool {
    match value {
        None => true,
        Some(FormValue::Text(text)) => text.trim().is_empty(),
        Some(_) => false,
    }
}

// Numeric zero is a value; only an unset field or an empty input is blank.
fn blank_number(value: Option<&FormValue>) -> bool {
    match value {
        None => true,
        Some(FormValue::Text(text)) => text.is_empty(),
        Some(_) => false,
    }
}

fn blank_list(value: Option<&FormValue>) -> bool {
    !matches!(value, Some(FormValue::List(items)) if !items.is_empty())
}

fn blank_range(value: Option<&FormValue>) -> bool {
    match value {
        Some(FormValue::Range(range)) => !range.is_complete(),
        _ => true,
    }
}

fn unchecked(value: Option<&FormValue>) -> bool {
    !matches!(value, Some(FormValue::Bool(true)))
}

fn blank_instant(value: Option<&FormValue>) -> bool {
    match value {
        Some(FormValue::Text(text)) => parse_instant(text).is_none(),
        _ => true,
    }
}

fn literal_entries(value: &FormValue, _options: &[AttributeOption]) -> WireEntries {
    let mut entries = WireEntries::default();
    for literal in value.literals() {
        entries.push_literal(&literal);
    }
    entries
}

fn checkbox_entries(value: &FormValue, _options: &[AttributeOption]) -> WireEntries {
    let mut entries = WireEntries::default();
    if matches!(value, FormValue::Bool(true)) {
        entries.push_literal("true");
    }
    entries
}

/// Resolve each literal against the option list; unmatched text is sent as a
/// new literal so the next load can resolve it to a real option.
fn option_entries(value: &FormValue, options: &[AttributeOption]) -> WireEntries {
    let mut entries = WireEntries::default();
    for literal in value.literals() {
        match options.iter().find(|option| option.text.contains(&literal)) {
            Some(option) => entries.attribute_value_ids.push(option.id),
            None => entries.push_literal(&literal),
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{LocalizedText, Locale};
    use crate::state::DateRange;
    use pretty_assertions::assert_eq;

    fn baku() -> AttributeOption {
        let mut text = LocalizedText::new();
        text.insert(Locale::Az, "Bakı");
        text.insert(Locale::En, "Baku");
        text.insert(Locale::Ru, "Баку");
        AttributeOption { id: 501, text }
    }

    /// A value every type must treat as filled in
    fn filled(value_type: ValueType) -> FormValue {
        match value_type {
            ValueType::Number | ValueType::Range | ValueType::Price => FormValue::Number(0.0),
            ValueType::MultiSelect => FormValue::List(vec!["Baku".to_string()]),
            ValueType::Date => FormValue::text("2024-03-01"),
            ValueType::DateTime => FormValue::text("2024-03-01T09:30:00Z"),
            ValueType::DateRange => FormValue::Range(DateRange::new("2020-01-01", "2021-01-01")),
            ValueType::Checkbox => FormValue::Bool(true),
            _ => FormValue::text("Ali"),
        }
    }

    mod registry {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_codes_round_trip_through_registry() {
            for (index, value_type) in ValueType::ALL.into_iter().enumerate() {
                assert_eq!(usize::from(value_type.code()), index + 1);
                assert_eq!(ValueType::from_code(value_type.code()), Some(value_type));
                assert_eq!(value_type.spec().value_type, value_type);
            }
        }

        #[test]
        fn test_unknown_codes_are_rejected() {
            assert_eq!(ValueType::from_code(0), None);
            assert_eq!(ValueType::from_code(16), None);
            assert!(ValueType::try_from(42).is_err());
        }

        #[test]
        fn test_only_select_types_are_selectable() {
            let selectable: Vec<_> = ValueType::ALL
                .into_iter()
                .filter(|t| t.spec().selectable)
                .collect();
            assert_eq!(selectable, vec![ValueType::Select, ValueType::MultiSelect]);
        }

        #[test]
        fn test_shapes() {
            assert_eq!(ValueType::MultiSelect.shape(), Shape::Array);
            assert_eq!(ValueType::DateRange.shape(), Shape::Range);
            assert_eq!(ValueType::Checkbox.shape(), Shape::Boolean);
            assert_eq!(ValueType::Email.shape(), Shape::Scalar);
        }

        #[test]
        fn test_serde_uses_numeric_code() {
            let json = serde_json::to_string(&ValueType::DateRange).unwrap();
            assert_eq!(json, "8");
            let parsed: ValueType = serde_json::from_str("6").unwrap();
            assert_eq!(parsed, ValueType::MultiSelect);
            assert!(serde_json::from_str::<ValueType>("99").is_err());
        }
    }

    mod emptiness {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_unset_is_empty_for_every_type() {
            for value_type in ValueType::ALL {
                assert!(value_type.is_empty(None), "{value_type} should be empty when unset");
            }
        }

        #[test]
        fn test_filled_value_is_not_empty_for_every_type() {
            for value_type in ValueType::ALL {
                let value = filled(value_type);
                assert!(
                    !value_type.is_empty(Some(&value)),
                    "{value_type} should accept {value:?}"
                );
            }
        }

        #[test]
        fn test_whitespace_text_is_empty_for_text_types() {
            let blank = FormValue::text("   ");
            for value_type in [
                ValueType::String,
                ValueType::Email,
                ValueType::Select,
                ValueType::Phone,
            ] {
                assert!(value_type.is_empty(Some(&blank)));
            }
        }

        #[test]
        fn test_numeric_zero_is_not_empty() {
            assert!(!ValueType::Price.is_empty(Some(&FormValue::Number(0.0))));
            assert!(ValueType::Price.is_empty(Some(&FormValue::text(""))));
        }

        #[test]
        fn test_multiselect_requires_non_empty_list() {
            assert!(ValueType::MultiSelect.is_empty(Some(&FormValue::List(vec![]))));
            assert!(ValueType::MultiSelect.is_empty(Some(&FormValue::text("Baku"))));
        }

        #[test]
        fn test_date_range_requires_both_ends() {
            let open = FormValue::Range(DateRange {
                start: Some("2020-01-01".to_string()),
                end: None,
            });
            assert!(ValueType::DateRange.is_empty(Some(&open)));
            assert!(ValueType::DateRange.is_empty(Some(&FormValue::text("2020 - 2021"))));
        }

        #[test]
        fn test_checkbox_must_be_checked() {
            assert!(ValueType::Checkbox.is_empty(Some(&FormValue::Bool(false))));
            assert!(ValueType::Checkbox.is_empty(Some(&FormValue::text("true"))));
            assert!(!ValueType::Checkbox.is_empty(Some(&FormValue::Bool(true))));
        }

        #[test]
        fn test_unparseable_date_is_empty() {
            assert!(ValueType::Date.is_empty(Some(&FormValue::text("not a date"))));
            assert!(ValueType::DateTime.is_empty(Some(&FormValue::text("2024-13-45"))));
        }

        #[test]
        fn test_hydrated_date_spellings_count_as_filled() {
            for text in ["2024-03-01 09:30", "03/01/2024", "Fri, 01 Mar 2024 09:30:00 GMT"] {
                assert!(!ValueType::Date.is_empty(Some(&FormValue::text(text))), "{text}");
                assert!(!ValueType::DateTime.is_empty(Some(&FormValue::text(text))), "{text}");
            }
        }
    }

    mod wire_entries {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_select_resolves_existing_option() {
            let entries = ValueType::Select.to_wire_entries(&FormValue::text("Baku"), &[baku()]);
            assert_eq!(entries.attribute_value_ids, vec![501]);
            assert!(entries.literal_entries.is_empty());
        }

        #[test]
        fn test_select_match_is_case_sensitive() {
            let entries = ValueType::Select.to_wire_entries(&FormValue::text("baku"), &[baku()]);
            assert!(entries.attribute_value_ids.is_empty());
            assert_eq!(entries.literal_entries.len(), 3);
        }

        #[test]
        fn test_multiselect_mixes_ids_and_literals() {
            let value = FormValue::List(vec!["Баку".to_string(), "Ganja".to_string()]);
            let entries = ValueType::MultiSelect.to_wire_entries(&value, &[baku()]);
            assert_eq!(entries.attribute_value_ids, vec![501]);
            assert_eq!(entries.literal_entries, LiteralEntry::replicate("Ganja"));
        }

        #[test]
        fn test_literals_are_replicated_identically() {
            let entries = ValueType::String.to_wire_entries(&FormValue::text("Ali"), &[]);
            let languages: Vec<_> = entries.literal_entries.iter().map(|e| e.language).collect();
            assert_eq!(languages, Locale::ALL.to_vec());
            assert!(entries.literal_entries.iter().all(|e| e.value == "Ali"));
        }

        #[test]
        fn test_non_selectable_types_never_emit_ids() {
            let entries = ValueType::String.to_wire_entries(&FormValue::text("Baku"), &[baku()]);
            assert!(entries.attribute_value_ids.is_empty());
            assert_eq!(entries.literal_entries.len(), 3);
        }

        #[test]
        fn test_checkbox_only_emits_when_checked() {
            let checked = ValueType::Checkbox.to_wire_entries(&FormValue::Bool(true), &[]);
            assert_eq!(checked.literal_entries, LiteralEntry::replicate("true"));
            let unchecked = ValueType::Checkbox.to_wire_entries(&FormValue::Bool(false), &[]);
            assert_eq!(unchecked, WireEntries::default());
        }

        #[test]
        fn test_numbers_and_ranges_are_written_as_text() {
            let price = ValueType::Price.to_wire_entries(&FormValue::Number(1500.0), &[]);
            assert_eq!(price.literal_entries[0].value, "1500");
            let range = FormValue::Range(DateRange::new("2020-01-01", "2021-06-30"));
            let entries = ValueType::DateRange.to_wire_entries(&range, &[]);
            assert_eq!(entries.literal_entries[0].value, "2020-01-01 - 2021-06-30");
        }
    }
}
