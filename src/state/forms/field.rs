//! Form field value objects

use crate::schema::AttributeId;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use std::fmt;

/// Composite key of one field: an attribute within one section instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldKey {
    pub attribute_id: AttributeId,
    pub instance: u32,
}

impl FieldKey {
    pub fn new(attribute_id: AttributeId, instance: u32) -> Self {
        Self {
            attribute_id,
            instance,
        }
    }

    /// Key of the canonical instance 0
    pub fn base(attribute_id: AttributeId) -> Self {
        Self::new(attribute_id, 0)
    }
}

/// Instance 0 renders as the bare attribute id, others as `<id>_<n>`
impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.instance == 0 {
            write!(f, "{}", self.attribute_id)
        } else {
            write!(f, "{}_{}", self.attribute_id, self.instance)
        }
    }
}

/// A `{start, end}` pair of a date-range attribute
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateRange {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl DateRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// Both ends present and non-empty
    pub fn is_complete(&self) -> bool {
        let present = |side: &Option<String>| side.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.start) && present(&self.end)
    }
}

/// Type-safe field values
#[derive(Debug, Clone, PartialEq)]
pub enum FormValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
    Range(DateRange),
    Bool(bool),
}

impl FormValue {
    pub fn text(value: impl Into<String>) -> Self {
        FormValue::Text(value.into())
    }

    /// Whether the value carries nothing worth storing
    pub fn is_blank(&self) -> bool {
        match self {
            FormValue::Text(s) => s.trim().is_empty(),
            FormValue::Number(n) => !n.is_finite(),
            FormValue::List(items) => items.iter().all(|item| item.trim().is_empty()),
            FormValue::Range(range) => range.start.is_none() && range.end.is_none(),
            FormValue::Bool(_) => false,
        }
    }

    /// Literal strings this value submits, before option resolution
    pub fn literals(&self) -> Vec<String> {
        match self {
            FormValue::Text(s) if s.trim().is_empty() => Vec::new(),
            FormValue::Text(s) => vec![s.clone()],
            FormValue::Number(n) if n.is_finite() => vec![n.to_string()],
            FormValue::Number(_) => Vec::new(),
            FormValue::List(items) => items
                .iter()
                .filter(|item| !item.trim().is_empty())
                .cloned()
                .collect(),
            FormValue::Range(range) => match (&range.start, &range.end) {
                (Some(start), Some(end)) if range.is_complete() => {
                    vec![format!("{start} - {end}")]
                }
                _ => Vec::new(),
            },
            FormValue::Bool(true) => vec!["true".to_string()],
            FormValue::Bool(false) => Vec::new(),
        }
    }
}

/// Parse the date and date-time spellings the record service and the date
/// pickers produce. `None` means the text is not a valid instant.
pub fn parse_instant(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(dt) =
        DateTime::parse_from_rfc3339(text).or_else(|_| DateTime::parse_from_rfc2822(text))
    {
        return Some(dt.naive_utc());
    }
    const OFFSET_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"];
    if let Some(dt) = OFFSET_FORMATS
        .iter()
        .find_map(|fmt| DateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt.naive_utc());
    }
    const DATE_TIME_FORMATS: [&str; 8] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%d.%m.%Y %H:%M:%S",
        "%d.%m.%Y %H:%M",
        "%m/%d/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M",
    ];
    if let Some(dt) = DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
    {
        return Some(dt);
    }
    ["%Y-%m-%d", "%d.%m.%Y", "%m/%d/%Y", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
