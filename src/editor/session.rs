//! Editor session state and operations

use super::{EditorError, Notice};
use crate::engine::{self, ValidationReport};
use crate::record::{PersistedRecord, RecordKind, RecordPayload};
use crate::schema::{
    Attribute, AttributeId, LocalizedText, OptionId, RecordId, Section, SectionId, Step, StepId,
    StepSchema,
};
use crate::service::{RecordService, ServiceError};
use crate::state::{FieldKey, FormState, FormValue};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Whether the session authors a new record or edits an existing one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Edit(RecordId),
}

/// Where the caller should go after a successful submission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Follow-up photo/video capture for the new record
    Capture(RecordId),
    /// The generic record list
    List,
}

/// Result of the edit-mode fan-out, tagged with the session that issued it
#[derive(Debug)]
pub struct LoadedRecord {
    session: Uuid,
    record_id: RecordId,
    steps: Vec<Step>,
    schemas: Vec<StepSchema>,
    record: PersistedRecord,
}

/// One record being authored through its steps
pub struct RecordEditor<S: RecordService + 'static> {
    service: Arc<S>,
    kind: RecordKind,
    mode: EditorMode,
    /// Regenerated on every open and cancel; loads from older sessions are dropped
    session: Uuid,
    /// Active steps only, in order
    steps: Vec<Step>,
    current: usize,
    schemas: HashMap<StepId, StepSchema>,
    form: FormState,
    notices: Vec<Notice>,
    pending: Option<AbortHandle>,
}

impl<S: RecordService + 'static> RecordEditor<S> {
    pub fn new(service: Arc<S>, kind: RecordKind) -> Self {
        Self {
            service,
            kind,
            mode: EditorMode::Create,
            session: Uuid::new_v4(),
            steps: Vec::new(),
            current: 0,
            schemas: HashMap::new(),
            form: FormState::new(),
            notices: Vec::new(),
            pending: None,
        }
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn session(&self) -> Uuid {
        self.session
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.current)
    }

    pub fn current_schema(&self) -> Option<&StepSchema> {
        self.current_step()
            .and_then(|step| self.schemas.get(&step.id))
    }

    pub fn schema(&self, step_id: StepId) -> Option<&StepSchema> {
        self.schemas.get(&step_id)
    }

    pub fn is_last_step(&self) -> bool {
        self.current + 1 >= self.steps.len()
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Drain queued notices for display
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn start_session(&mut self, mode: EditorMode) {
        self.cancel_pending();
        self.session = Uuid::new_v4();
        self.mode = mode;
        self.steps.clear();
        self.schemas.clear();
        self.current = 0;
        self.form.reset();
    }

    /// Start authoring a new record with an empty form
    pub async fn start_create(&mut self) -> Result<(), EditorError> {
        self.start_session(EditorMode::Create);
        let steps = match self.service.list_steps(self.kind).await {
            Ok(steps) => steps,
            Err(source) => {
                let err = EditorError::StepsUnavailable(source);
                self.report_load_failure(&err);
                return Err(err);
            }
        };
        self.steps = active_steps(steps);
        let Some(first) = self.steps.first().map(|step| step.id) else {
            let err = EditorError::NoActiveSteps(self.kind);
            self.report_load_failure(&err);
            return Err(err);
        };
        self.ensure_schema(first).await?;
        info!("Started new {} with {} steps", self.kind, self.steps.len());
        Ok(())
    }

    /// Issue the edit-mode fan-out in the background.
    ///
    /// The returned load must be handed to [`apply_loaded`](Self::apply_loaded);
    /// it is discarded there if the session moved on in the meantime.
    pub fn begin_edit(
        &mut self,
        record_id: RecordId,
    ) -> JoinHandle<Result<LoadedRecord, EditorError>> {
        self.start_session(EditorMode::Edit(record_id));
        let service = Arc::clone(&self.service);
        let kind = self.kind;
        let session = self.session;
        let handle = tokio::spawn(load_for_edit(service, kind, session, record_id));
        self.pending = Some(handle.abort_handle());
        handle
    }

    /// Hydrate the form from a finished load. Returns false when the load
    /// belongs to an older session or another record.
    pub fn apply_loaded(&mut self, loaded: LoadedRecord) -> bool {
        if loaded.session != self.session || self.mode != EditorMode::Edit(loaded.record_id) {
            debug!(
                "Discarding stale load of record {} from session {}",
                loaded.record_id, loaded.session
            );
            return false;
        }
        self.pending = None;
        self.form = engine::hydrate(&loaded.schemas, &loaded.record);
        self.steps = loaded.steps;
        self.schemas = loaded
            .schemas
            .into_iter()
            .map(|schema| (schema.step_id, schema))
            .collect();
        self.current = 0;
        info!(
            "Opened {} {} with {} values",
            self.kind,
            loaded.record_id,
            self.form.len()
        );
        true
    }

    /// Load a record for editing and hydrate the form
    pub async fn open_for_edit(&mut self, record_id: RecordId) -> Result<(), EditorError> {
        let loaded = match self.begin_edit(record_id).await {
            Ok(Ok(loaded)) => loaded,
            Ok(Err(err)) => {
                self.report_load_failure(&err);
                return Err(err);
            }
            Err(join) if join.is_cancelled() => return Err(EditorError::Cancelled),
            Err(join) => {
                let err = EditorError::Join(join);
                self.report_load_failure(&err);
                return Err(err);
            }
        };
        if self.apply_loaded(loaded) {
            Ok(())
        } else {
            Err(EditorError::Cancelled)
        }
    }

    /// Log a failed load and queue the matching notice
    pub fn report_load_failure(&mut self, err: &EditorError) {
        error!("Failed to load {} form: {err}", self.kind);
        let notice = match err {
            EditorError::RecordDeleted(_) => Notice::RecordDeleted,
            EditorError::RecordLoad { .. } | EditorError::Join(_) => Notice::RecordLoadFailed,
            _ => Notice::SchemaUnavailable,
        };
        self.push_notice(notice);
    }

    /// Abort outstanding fetches; their results will not be applied
    pub fn cancel(&mut self) {
        self.cancel_pending();
        self.session = Uuid::new_v4();
        debug!("Editor session cancelled");
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    async fn ensure_schema(&mut self, step_id: StepId) -> Result<(), EditorError> {
        if self.schemas.contains_key(&step_id) {
            return Ok(());
        }
        self.refresh_step(step_id).await
    }

    /// Re-fetch one step's schema, leaving other steps untouched
    async fn refresh_step(&mut self, step_id: StepId) -> Result<(), EditorError> {
        match self.service.fetch_step_schema(self.kind, step_id).await {
            Ok(schema) => {
                self.schemas.insert(step_id, schema);
                Ok(())
            }
            Err(source) => {
                let err = EditorError::SchemaUnavailable { step_id, source };
                self.report_load_failure(&err);
                Err(err)
            }
        }
    }

    pub fn validate_current_step(&mut self) -> bool {
        let report = match self.current_schema() {
            Some(schema) => engine::validate_step(schema, &self.form),
            None => ValidationReport::default(),
        };
        self.check(report).is_ok()
    }

    pub fn validate_all_steps(&mut self) -> bool {
        let report = engine::validate_steps(active_schemas(&self.steps, &self.schemas), &self.form);
        self.check(report).is_ok()
    }

    /// Record the report's keys as field errors; raise one notice if any
    fn check(&mut self, report: ValidationReport) -> Result<(), ValidationReport> {
        self.form.set_errors(report.invalid_keys().clone());
        if report.is_valid() {
            Ok(())
        } else {
            debug!("Validation failed for {report}");
            self.push_notice(Notice::RequiredFieldsMissing {
                count: report.len(),
            });
            Err(report)
        }
    }

    /// Advance to the next active step if the current one validates.
    /// Returns whether the editor moved.
    pub async fn next_step(&mut self) -> Result<bool, EditorError> {
        if !self.validate_current_step() || self.is_last_step() {
            return Ok(false);
        }
        let next = self.steps[self.current + 1].id;
        self.ensure_schema(next).await?;
        self.current += 1;
        Ok(true)
    }

    /// Step back without validating. Errors flagged on the step left are
    /// dropped; those on other steps stay.
    pub fn prev_step(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        let left = self.steps[self.current].id;
        self.current -= 1;
        if let Some(schema) = self.schemas.get(&left) {
            for section in &schema.sections {
                self.form.clear_section_errors(section);
            }
        }
        true
    }

    pub fn value(&self, key: FieldKey) -> Option<&FormValue> {
        self.form.value(key)
    }

    /// Set a field of a loaded attribute in an existing section instance
    pub fn set_value(&mut self, key: FieldKey, value: FormValue) -> Result<(), EditorError> {
        let section_id = locate(&self.steps, &self.schemas, key.attribute_id)?.0.id;
        if !self.form.instances().contains(section_id, key.instance) {
            return Err(EditorError::InstanceOutOfRange(key));
        }
        self.form.set_value(key, value);
        Ok(())
    }

    pub fn clear_value(&mut self, key: FieldKey) -> Option<FormValue> {
        self.form.clear_value(key)
    }

    /// Append an instance of a repeatable section
    pub fn add_section_instance(&mut self, section_id: SectionId) -> Result<u32, EditorError> {
        let section = find_section(&self.steps, &self.schemas, section_id)?;
        if !section.repeatable {
            return Err(EditorError::NotRepeatable(section_id));
        }
        Ok(self.form.add_instance(section_id))
    }

    /// Remove the last instance of a section and its values
    pub fn remove_section_instance(
        &mut self,
        section_id: SectionId,
    ) -> Result<Option<u32>, EditorError> {
        let section = find_section(&self.steps, &self.schemas, section_id)?;
        Ok(self.form.remove_instance(section))
    }

    /// Add `literal` as a new option of a select attribute, in every locale
    pub async fn add_option(
        &mut self,
        attribute_id: AttributeId,
        literal: &str,
    ) -> Result<OptionId, EditorError> {
        let step_id = owning_step(&self.steps, &self.schemas, attribute_id)?;
        let text = LocalizedText::uniform(literal.trim());
        let option_id = match self.service.add_option(self.kind, attribute_id, &text).await {
            Ok(option_id) => option_id,
            Err(source) => return Err(self.option_failed(source)),
        };
        self.refresh_step(step_id).await?;
        Ok(option_id)
    }

    pub async fn remove_option(
        &mut self,
        attribute_id: AttributeId,
        option_id: OptionId,
    ) -> Result<(), EditorError> {
        let step_id = owning_step(&self.steps, &self.schemas, attribute_id)?;
        if let Err(source) = self
            .service
            .remove_option(self.kind, attribute_id, option_id)
            .await
        {
            return Err(self.option_failed(source));
        }
        self.refresh_step(step_id).await
    }

    fn option_failed(&mut self, source: ServiceError) -> EditorError {
        warn!("Option update failed: {source}");
        self.push_notice(Notice::OptionUpdateFailed);
        EditorError::OptionUpdate(source)
    }

    /// The payload a submission would send right now
    pub fn payload(&self) -> RecordPayload {
        let schemas = active_schemas(&self.steps, &self.schemas);
        match self.mode {
            EditorMode::Create => engine::create_payload(schemas, &self.form),
            EditorMode::Edit(record_id) => engine::update_payload(record_id, schemas, &self.form),
        }
    }

    /// Validate every active step and persist the record.
    ///
    /// Schemas of steps not visited yet are fetched first, so their required
    /// fields are checked too. On a validation failure the editor moves to
    /// the first step holding an invalid field. On any failure the form is
    /// kept so the user can retry; on success it is discarded.
    pub async fn submit(&mut self) -> Result<Route, EditorError> {
        self.load_remaining_steps().await?;
        let report = engine::validate_steps(active_schemas(&self.steps, &self.schemas), &self.form);
        if let Err(report) = self.check(report) {
            self.focus_first_invalid(&report);
            return Err(EditorError::Validation(report));
        }
        let payload = self.payload();

        let route = match self.mode {
            EditorMode::Create => {
                let created = self
                    .service
                    .create_record(self.kind, &payload)
                    .await
                    .map_err(|source| self.submit_failed(source))?;
                match created {
                    Some(record_id) if self.kind.has_capture_step() => {
                        info!("Created {} {}", self.kind, record_id);
                        Route::Capture(record_id)
                    }
                    Some(record_id) => {
                        info!("Created {} {}", self.kind, record_id);
                        Route::List
                    }
                    None => {
                        warn!("Created {} but the response carried no id", self.kind);
                        self.push_notice(Notice::CreatedWithoutId);
                        Route::List
                    }
                }
            }
            EditorMode::Edit(record_id) => {
                self.service
                    .update_record(self.kind, &payload)
                    .await
                    .map_err(|source| self.submit_failed(source))?;
                info!("Updated {} {}", self.kind, record_id);
                Route::List
            }
        };

        self.form.reset();
        Ok(route)
    }

    async fn load_remaining_steps(&mut self) -> Result<(), EditorError> {
        let missing: Vec<StepId> = self
            .steps
            .iter()
            .map(|step| step.id)
            .filter(|step_id| !self.schemas.contains_key(step_id))
            .collect();
        for step_id in missing {
            self.ensure_schema(step_id).await?;
        }
        Ok(())
    }

    fn focus_first_invalid(&mut self, report: &ValidationReport) {
        let first = self.steps.iter().position(|step| {
            self.schemas.get(&step.id).is_some_and(|schema| {
                report
                    .invalid_keys()
                    .iter()
                    .any(|key| schema.attribute(key.attribute_id).is_some())
            })
        });
        if let Some(index) = first {
            self.current = index;
        }
    }

    fn submit_failed(&mut self, source: ServiceError) -> EditorError {
        error!("Failed to submit {}: {source}", self.kind);
        self.push_notice(Notice::SubmitFailed);
        EditorError::Submission(source)
    }
}

impl<S: RecordService + 'static> Drop for RecordEditor<S> {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}

fn active_steps(steps: Vec<Step>) -> Vec<Step> {
    steps.into_iter().filter(|step| step.is_active).collect()
}

fn active_schemas<'a>(
    steps: &'a [Step],
    schemas: &'a HashMap<StepId, StepSchema>,
) -> impl Iterator<Item = &'a StepSchema> + 'a {
    steps.iter().filter_map(move |step| schemas.get(&step.id))
}

fn locate<'a>(
    steps: &'a [Step],
    schemas: &'a HashMap<StepId, StepSchema>,
    attribute_id: AttributeId,
) -> Result<(&'a Section, &'a Attribute), EditorError> {
    active_schemas(steps, schemas)
        .find_map(|schema| schema.attribute(attribute_id))
        .ok_or(EditorError::UnknownAttribute(attribute_id))
}

fn find_section<'a>(
    steps: &'a [Step],
    schemas: &'a HashMap<StepId, StepSchema>,
    section_id: SectionId,
) -> Result<&'a Section, EditorError> {
    active_schemas(steps, schemas)
        .find_map(|schema| schema.section(section_id))
        .ok_or(EditorError::UnknownSection(section_id))
}

fn owning_step(
    steps: &[Step],
    schemas: &HashMap<StepId, StepSchema>,
    attribute_id: AttributeId,
) -> Result<StepId, EditorError> {
    active_schemas(steps, schemas)
        .find(|schema| schema.attribute(attribute_id).is_some())
        .map(|schema| schema.step_id)
        .ok_or(EditorError::UnknownAttribute(attribute_id))
}

fn record_error(record_id: RecordId, source: ServiceError) -> EditorError {
    if source.is_record_missing() {
        EditorError::RecordDeleted(record_id)
    } else {
        EditorError::RecordLoad { record_id, source }
    }
}

/// Fetch the record and every active step's schema concurrently, joining
/// all of them before anything is hydrated.
async fn load_for_edit<S: RecordService + 'static>(
    service: Arc<S>,
    kind: RecordKind,
    session: Uuid,
    record_id: RecordId,
) -> Result<LoadedRecord, EditorError> {
    let record = async {
        service
            .fetch_record(kind, record_id)
            .await
            .map_err(|source| record_error(record_id, source))
    };
    let schemas = async {
        let steps = active_steps(
            service
                .list_steps(kind)
                .await
                .map_err(EditorError::StepsUnavailable)?,
        );
        if steps.is_empty() {
            return Err(EditorError::NoActiveSteps(kind));
        }

        let mut fetches = JoinSet::new();
        for step in &steps {
            let service = Arc::clone(&service);
            let step_id = step.id;
            fetches.spawn(async move {
                service
                    .fetch_step_schema(kind, step_id)
                    .await
                    .map_err(|source| EditorError::SchemaUnavailable { step_id, source })
            });
        }

        let mut fetched = HashMap::new();
        while let Some(joined) = fetches.join_next().await {
            let schema = joined??;
            fetched.insert(schema.step_id, schema);
        }
        let ordered: Vec<StepSchema> = steps
            .iter()
            .filter_map(|step| fetched.remove(&step.id))
            .collect();
        Ok::<_, EditorError>((steps, ordered))
    };

    let (record, (steps, schemas)) = tokio::try_join!(record, schemas)?;
    debug!(
        "Loaded record {} with {} step schemas",
        record_id,
        schemas.len()
    );
    Ok(LoadedRecord {
        session,
        record_id,
        steps,
        schemas,
        record,
    })
}
