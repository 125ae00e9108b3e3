//! Record kinds and the record wire shapes

mod payload;
mod persisted;

pub use payload::{AttributeEntry, LiteralEntry, RecordPayload, SectionEntry};
pub use persisted::{
    LocalizedValueSet, PersistedAttribute, PersistedRecord, PersistedSection, PersistedStep,
    PersistedValue, ValueSet,
};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two record kinds authored through the same engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordKind {
    Candidate,
    Vacancy,
}

impl RecordKind {
    /// Path segment used by the record service
    pub fn slug(self) -> &'static str {
        match self {
            Self::Candidate => "candidates",
            Self::Vacancy => "vacancies",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Candidate => "Candidate",
            Self::Vacancy => "Vacancy",
        }
    }

    /// Whether a newly created record continues to the photo/video capture step
    pub fn has_capture_step(self) -> bool {
        matches!(self, Self::Candidate)
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for RecordKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "candidate" | "candidates" => Ok(Self::Candidate),
            "vacancy" | "vacancies" => Ok(Self::Vacancy),
            other => Err(format!(
                "unknown record kind '{other}' (expected candidate or vacancy)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parses_singular_and_plural() {
        assert_eq!("candidate".parse::<RecordKind>(), Ok(RecordKind::Candidate));
        assert_eq!("Vacancies".parse::<RecordKind>(), Ok(RecordKind::Vacancy));
        assert!("employee".parse::<RecordKind>().is_err());
    }

    #[test]
    fn test_only_candidates_have_capture_step() {
        assert!(RecordKind::Candidate.has_capture_step());
        assert!(!RecordKind::Vacancy.has_capture_step());
    }
}
