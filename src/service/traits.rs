//! Trait abstraction for the record service to enable mocking in tests

use super::ServiceError;
use crate::record::{PersistedRecord, RecordKind, RecordPayload};
use crate::schema::{AttributeId, LocalizedText, OptionId, RecordId, Step, StepId, StepSchema};
use async_trait::async_trait;

/// Transport for schemas and records.
///
/// Methods take `&self` so the editor can issue fetches concurrently.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordService: Send + Sync {
    /// Ordered steps of a record kind, including inactive ones
    async fn list_steps(&self, kind: RecordKind) -> Result<Vec<Step>, ServiceError>;

    /// Sections and attributes of one step
    async fn fetch_step_schema(
        &self,
        kind: RecordKind,
        step_id: StepId,
    ) -> Result<StepSchema, ServiceError>;

    /// Persisted record for edit mode
    async fn fetch_record(
        &self,
        kind: RecordKind,
        record_id: RecordId,
    ) -> Result<PersistedRecord, ServiceError>;

    /// Create a record. The new id may be missing from the response.
    async fn create_record(
        &self,
        kind: RecordKind,
        payload: &RecordPayload,
    ) -> Result<Option<RecordId>, ServiceError>;

    /// Update the record named by `payload.id`
    async fn update_record(
        &self,
        kind: RecordKind,
        payload: &RecordPayload,
    ) -> Result<(), ServiceError>;

    /// Add a selectable option to an attribute, returning its id
    async fn add_option(
        &self,
        kind: RecordKind,
        attribute_id: AttributeId,
        text: &LocalizedText,
    ) -> Result<OptionId, ServiceError>;

    /// Remove a selectable option from an attribute
    async fn remove_option(
        &self,
        kind: RecordKind,
        attribute_id: AttributeId,
        option_id: OptionId,
    ) -> Result<(), ServiceError>;
}
