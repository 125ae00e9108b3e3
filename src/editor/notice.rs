//! User-facing notices raised by the editor

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A message for the user; the editor's equivalent of an error queue entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    RequiredFieldsMissing { count: usize },
    SchemaUnavailable,
    RecordDeleted,
    RecordLoadFailed,
    SubmitFailed,
    /// Created, but the response carried no record id
    CreatedWithoutId,
    OptionUpdateFailed,
}

impl Notice {
    pub fn severity(&self) -> Severity {
        match self {
            Self::RequiredFieldsMissing { .. } | Self::CreatedWithoutId => Severity::Warning,
            _ => Severity::Error,
        }
    }

    /// Whether the editor cannot continue until the cause is fixed
    pub fn is_blocking(&self) -> bool {
        matches!(
            self,
            Self::SchemaUnavailable | Self::RecordDeleted | Self::RecordLoadFailed
        )
    }

    pub fn message(&self) -> String {
        match self {
            Self::RequiredFieldsMissing { count: 1 } => {
                "A required field is missing".to_string()
            }
            Self::RequiredFieldsMissing { count } => {
                format!("{count} required fields are missing")
            }
            Self::SchemaUnavailable => "The form could not be loaded".to_string(),
            Self::RecordDeleted => "This record has been deleted".to_string(),
            Self::RecordLoadFailed => "Failed to load the record".to_string(),
            Self::SubmitFailed => "Failed to save the record".to_string(),
            Self::CreatedWithoutId => {
                "Record saved, but it could not be opened for the next step".to_string()
            }
            Self::OptionUpdateFailed => "Failed to update the option list".to_string(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}
