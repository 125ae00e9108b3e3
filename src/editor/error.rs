//! Editor error types

use crate::engine::ValidationReport;
use crate::record::RecordKind;
use crate::schema::{AttributeId, RecordId, SectionId, StepId};
use crate::service::ServiceError;
use crate::state::FieldKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no active steps configured for {0}")]
    NoActiveSteps(RecordKind),
    #[error("step list unavailable: {0}")]
    StepsUnavailable(#[source] ServiceError),
    #[error("schema unavailable for step {step_id}: {source}")]
    SchemaUnavailable {
        step_id: StepId,
        #[source]
        source: ServiceError,
    },
    #[error("record {0} was deleted")]
    RecordDeleted(RecordId),
    #[error("failed to load record {record_id}: {source}")]
    RecordLoad {
        record_id: RecordId,
        #[source]
        source: ServiceError,
    },
    #[error("required fields missing: {0}")]
    Validation(ValidationReport),
    #[error("submission failed: {0}")]
    Submission(#[source] ServiceError),
    #[error("option update failed: {0}")]
    OptionUpdate(#[source] ServiceError),
    #[error("attribute {0} is not part of the loaded schema")]
    UnknownAttribute(AttributeId),
    #[error("section {0} is not part of the loaded schema")]
    UnknownSection(SectionId),
    #[error("section {0} cannot be repeated")]
    NotRepeatable(SectionId),
    #[error("field {0} refers to a section instance that does not exist")]
    InstanceOutOfRange(FieldKey),
    #[error("editor session was cancelled")]
    Cancelled,
    #[error("background load failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
