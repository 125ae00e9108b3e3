//! Errors surfaced by record service implementations

use crate::schema::{AttributeId, OptionId, RecordId, SchemaError, StepId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("record {0} not found")]
    RecordNotFound(RecordId),
    #[error("step {0} not found")]
    StepNotFound(StepId),
    #[error("attribute {0} not found")]
    AttributeNotFound(AttributeId),
    #[error("option {option_id} not found on attribute {attribute_id}")]
    OptionNotFound {
        attribute_id: AttributeId,
        option_id: OptionId,
    },
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ServiceError {
    /// The requested record no longer exists
    pub fn is_record_missing(&self) -> bool {
        matches!(self, Self::RecordNotFound(_))
    }
}
