//! Record service backed by a directory of JSON documents
//!
//! Layout under the root, per record kind:
//!
//! ```text
//! <root>/<kind>/steps.json              step list
//! <root>/<kind>/schemas/<step>.json     schema read of one step
//! <root>/<kind>/records/<id>.json       persisted record
//! ```
//!
//! Written payloads are stored in the record read shape, so a record created
//! here hydrates back into the editor.

use super::{RecordService, ServiceError};
use crate::record::{
    AttributeEntry, LocalizedValueSet, PersistedAttribute, PersistedRecord, PersistedSection,
    PersistedStep, PersistedValue, RecordKind, RecordPayload, ValueSet,
};
use crate::schema::{
    language_values, AttributeId, HydrateRule, LocalizedText, Locale, OptionDto, OptionId,
    RecordId, Section, Step, StepDto, StepId, StepSchema, StepSchemaDto, ValueType,
};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, info};

pub struct FileRecordService {
    root: PathBuf,
    /// Serializes writers so id allocation and read-modify-write stay atomic
    write_lock: Mutex<()>,
}

impl FileRecordService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn kind_dir(&self, kind: RecordKind) -> PathBuf {
        self.root.join(kind.slug())
    }

    fn steps_path(&self, kind: RecordKind) -> PathBuf {
        self.kind_dir(kind).join("steps.json")
    }

    fn schema_path(&self, kind: RecordKind, step_id: StepId) -> PathBuf {
        self.kind_dir(kind)
            .join("schemas")
            .join(format!("{step_id}.json"))
    }

    fn records_dir(&self, kind: RecordKind) -> PathBuf {
        self.kind_dir(kind).join("records")
    }

    fn record_path(&self, kind: RecordKind, record_id: RecordId) -> PathBuf {
        self.records_dir(kind).join(format!("{record_id}.json"))
    }

    async fn step_dtos(&self, kind: RecordKind) -> Result<Vec<StepDto>, ServiceError> {
        Ok(read_json(&self.steps_path(kind)).await?.unwrap_or_default())
    }

    async fn schema_dto(
        &self,
        kind: RecordKind,
        step_id: StepId,
    ) -> Result<StepSchemaDto, ServiceError> {
        read_json(&self.schema_path(kind, step_id))
            .await?
            .ok_or(ServiceError::StepNotFound(step_id))
    }

    /// Every step's schema document, in step order; steps without one are skipped
    async fn schema_dtos(
        &self,
        kind: RecordKind,
    ) -> Result<Vec<(StepId, StepSchemaDto)>, ServiceError> {
        let mut dtos = Vec::new();
        for step in self.step_dtos(kind).await? {
            if let Some(dto) = read_json(&self.schema_path(kind, step.id)).await? {
                dtos.push((step.id, dto));
            }
        }
        Ok(dtos)
    }

    async fn schemas(&self, kind: RecordKind) -> Result<Vec<StepSchema>, ServiceError> {
        self.schema_dtos(kind)
            .await?
            .into_iter()
            .map(|(step_id, dto)| dto.into_schema(step_id).map_err(ServiceError::from))
            .collect()
    }

    async fn next_record_id(&self, kind: RecordKind) -> Result<RecordId, ServiceError> {
        let mut entries = match fs::read_dir(self.records_dir(kind)).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(1),
            Err(e) => return Err(e.into()),
        };
        let mut highest = 0;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let id = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<RecordId>().ok());
            if let Some(id) = id {
                highest = highest.max(id);
            }
        }
        Ok(highest + 1)
    }
}

#[async_trait]
impl RecordService for FileRecordService {
    async fn list_steps(&self, kind: RecordKind) -> Result<Vec<Step>, ServiceError> {
        let steps = self.step_dtos(kind).await?;
        debug!("Loaded {} steps for {}", steps.len(), kind.slug());
        Ok(steps.into_iter().map(Step::from).collect())
    }

    async fn fetch_step_schema(
        &self,
        kind: RecordKind,
        step_id: StepId,
    ) -> Result<StepSchema, ServiceError> {
        Ok(self.schema_dto(kind, step_id).await?.into_schema(step_id)?)
    }

    async fn fetch_record(
        &self,
        kind: RecordKind,
        record_id: RecordId,
    ) -> Result<PersistedRecord, ServiceError> {
        let mut record: PersistedRecord = read_json(&self.record_path(kind, record_id))
            .await?
            .ok_or(ServiceError::RecordNotFound(record_id))?;
        record.id = Some(record_id);
        Ok(record)
    }

    async fn create_record(
        &self,
        kind: RecordKind,
        payload: &RecordPayload,
    ) -> Result<Option<RecordId>, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let schemas = self.schemas(kind).await?;
        let record_id = self.next_record_id(kind).await?;
        let record = to_persisted(record_id, &schemas, payload)?;
        write_json(&self.record_path(kind, record_id), &record).await?;
        info!("Created {} record {}", kind.slug(), record_id);
        Ok(Some(record_id))
    }

    async fn update_record(
        &self,
        kind: RecordKind,
        payload: &RecordPayload,
    ) -> Result<(), ServiceError> {
        let record_id = payload
            .id
            .ok_or_else(|| ServiceError::Rejected("update payload without record id".into()))?;
        let _guard = self.write_lock.lock().await;
        let path = self.record_path(kind, record_id);
        if !fs::try_exists(&path).await? {
            return Err(ServiceError::RecordNotFound(record_id));
        }
        let schemas = self.schemas(kind).await?;
        let record = to_persisted(record_id, &schemas, payload)?;
        write_json(&path, &record).await?;
        info!("Updated {} record {}", kind.slug(), record_id);
        Ok(())
    }

    async fn add_option(
        &self,
        kind: RecordKind,
        attribute_id: AttributeId,
        text: &LocalizedText,
    ) -> Result<OptionId, ServiceError> {
        let _guard = self.write_lock.lock().await;
        let mut dtos = self.schema_dtos(kind).await?;
        let next_id = dtos
            .iter()
            .flat_map(|(_, dto)| &dto.sections)
            .flat_map(|section| &section.attributes)
            .flat_map(|attribute| &attribute.values)
            .map(|option| option.id)
            .max()
            .unwrap_or(0)
            + 1;

        let (step_id, dto) = dtos
            .iter_mut()
            .find(|(_, dto)| {
                dto.sections
                    .iter()
                    .any(|s| s.attributes.iter().any(|a| a.attribute_id == attribute_id))
            })
            .ok_or(ServiceError::AttributeNotFound(attribute_id))?;
        let attribute = dto
            .sections
            .iter_mut()
            .flat_map(|section| section.attributes.iter_mut())
            .find(|a| a.attribute_id == attribute_id)
            .ok_or(ServiceError::AttributeNotFound(attribute_id))?;
        let selectable = ValueType::from_code(attribute.value_type)
            .is_some_and(|value_type| value_type.spec().selectable);
        if !selectable {
            return Err(ServiceError::Rejected(format!(
                "attribute {attribute_id} does not offer options"
            )));
        }

        attribute.values.push(OptionDto {
            id: next_id,
            languages: language_values(text),
        });
        write_json(&self.schema_path(kind, *step_id), &*dto).await?;
        info!("Added option {} to attribute {}", next_id, attribute_id);
        Ok(next_id)
    }

    async fn remove_option(
        &self,
        kind: RecordKind,
        attribute_id: AttributeId,
        option_id: OptionId,
    ) -> Result<(), ServiceError> {
        let _guard = self.write_lock.lock().await;
        for (step_id, mut dto) in self.schema_dtos(kind).await? {
            let Some(attribute) = dto
                .sections
                .iter_mut()
                .flat_map(|section| section.attributes.iter_mut())
                .find(|a| a.attribute_id == attribute_id)
            else {
                continue;
            };
            let before = attribute.values.len();
            attribute.values.retain(|option| option.id != option_id);
            if attribute.values.len() == before {
                return Err(ServiceError::OptionNotFound {
                    attribute_id,
                    option_id,
                });
            }
            write_json(&self.schema_path(kind, step_id), &dto).await?;
            info!("Removed option {} from attribute {}", option_id, attribute_id);
            return Ok(());
        }
        Err(ServiceError::AttributeNotFound(attribute_id))
    }
}

/// Read a JSON document; `None` when the file does not exist
async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, ServiceError> {
    match fs::read_to_string(path).await {
        Ok(content) => Ok(Some(serde_json::from_str(&content)?)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ServiceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).await?;
    Ok(())
}

/// Convert a write payload into the record read shape. Section entries are
/// grouped under the step whose schema owns the section; repeated entries
/// stay in order, which is how instances are told apart.
fn to_persisted(
    record_id: RecordId,
    schemas: &[StepSchema],
    payload: &RecordPayload,
) -> Result<PersistedRecord, ServiceError> {
    let mut steps: Vec<PersistedStep> = schemas
        .iter()
        .map(|schema| PersistedStep {
            id: schema.step_id,
            sections: Vec::new(),
        })
        .collect();

    for entry in &payload.section_dtos {
        let (position, section) = schemas
            .iter()
            .enumerate()
            .find_map(|(position, schema)| {
                schema.section(entry.section_id).map(|s| (position, s))
            })
            .ok_or_else(|| {
                ServiceError::Rejected(format!("unknown section {}", entry.section_id))
            })?;
        let attributes = entry
            .attributes
            .iter()
            .map(|attribute| persist_attribute(section, attribute))
            .collect::<Result<Vec<_>, _>>()?;
        steps[position].sections.push(PersistedSection {
            id: section.id,
            attributes,
        });
    }

    steps.retain(|step| !step.sections.is_empty());
    Ok(PersistedRecord {
        id: Some(record_id),
        steps,
    })
}

fn persist_attribute(
    section: &Section,
    entry: &AttributeEntry,
) -> Result<PersistedAttribute, ServiceError> {
    let attribute = section
        .attribute(entry.attribute_id)
        .ok_or(ServiceError::AttributeNotFound(entry.attribute_id))?;
    let value_type = attribute.value_type;
    let mut values = Vec::new();

    for option_id in &entry.attribute_value_ids {
        let option = attribute
            .options
            .iter()
            .find(|option| option.id == *option_id)
            .ok_or(ServiceError::OptionNotFound {
                attribute_id: attribute.id,
                option_id: *option_id,
            })?;
        values.push(PersistedValue {
            display: Some(option.text.resolve(Locale::Az).to_string()),
            set: None,
            sets: option
                .text
                .iter()
                .map(|(locale, text)| localized_set(value_type, locale, text))
                .collect(),
        });
    }

    // The n-th literal of each language belongs to the n-th value.
    let literal_count = entry
        .input_value
        .iter()
        .filter(|literal| literal.language == Locale::Az)
        .count();
    for index in 0..literal_count {
        let sets = Locale::ALL
            .into_iter()
            .filter_map(|locale| {
                entry
                    .input_value
                    .iter()
                    .filter(|literal| literal.language == locale)
                    .nth(index)
                    .map(|literal| localized_set(value_type, locale, &literal.value))
            })
            .collect();
        values.push(PersistedValue {
            display: None,
            set: None,
            sets,
        });
    }

    Ok(PersistedAttribute {
        attribute_id: attribute.id,
        value_type: Some(value_type.code()),
        values,
    })
}

fn localized_set(value_type: ValueType, locale: Locale, text: &str) -> LocalizedValueSet {
    let mut value = ValueSet::default();
    match value_type.spec().hydrate {
        HydrateRule::Numeric => match text.trim().parse::<f64>() {
            Ok(n) => value.decimal_value = Some(n),
            Err(_) => value.string_value = Some(text.to_string()),
        },
        HydrateRule::DateTime => value.date_time_value = Some(text.to_string()),
        HydrateRule::Checkbox => value.bool_value = Some(text == "true"),
        HydrateRule::Scalar | HydrateRule::List | HydrateRule::DateRange => {
            value.string_value = Some(text.to_string())
        }
    }
    LocalizedValueSet {
        language: locale.code().to_string(),
        value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{create_payload, hydrate, update_payload};
    use crate::state::{FieldKey, FormState, FormValue};
    use crate::test_support::seed_store;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn store() -> (TempDir, FileRecordService) {
        let dir = TempDir::new().unwrap();
        seed_store(dir.path());
        let service = FileRecordService::new(dir.path());
        (dir, service)
    }

    #[tokio::test]
    async fn test_list_steps_reads_step_file() {
        let (_dir, service) = store();
        let steps = service.list_steps(RecordKind::Candidate).await.unwrap();
        let ids: Vec<_> = steps.iter().map(|s| (s.id, s.is_active)).collect();
        assert_eq!(ids, vec![(1, true), (2, true), (3, false)]);
    }

    #[tokio::test]
    async fn test_missing_step_list_is_empty() {
        let (_dir, service) = store();
        assert!(service.list_steps(RecordKind::Vacancy).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_schema_and_missing_step() {
        let (_dir, service) = store();
        let schema = service
            .fetch_step_schema(RecordKind::Candidate, 1)
            .await
            .unwrap();
        assert_eq!(schema, crate::test_support::two_section_schema());

        let err = service
            .fetch_step_schema(RecordKind::Candidate, 9)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::StepNotFound(9)));
    }

    #[tokio::test]
    async fn test_missing_record_is_reported_as_not_found() {
        let (_dir, service) = store();
        let err = service
            .fetch_record(RecordKind::Candidate, 404)
            .await
            .unwrap_err();
        assert!(err.is_record_missing());
    }

    #[tokio::test]
    async fn test_created_record_hydrates_back() {
        let (_dir, service) = store();
        let schema = service
            .fetch_step_schema(RecordKind::Candidate, 1)
            .await
            .unwrap();
        let mut form = FormState::new();
        form.set_value(FieldKey::base(10), FormValue::text("Ali"));
        form.set_value(FieldKey::base(20), FormValue::text("Baku"));
        form.add_instance(2);
        form.set_value(FieldKey::new(20, 1), FormValue::text("Quba"));

        let id = service
            .create_record(RecordKind::Candidate, &create_payload([&schema], &form))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(id, 1);

        let record = service.fetch_record(RecordKind::Candidate, id).await.unwrap();
        let restored = hydrate([&schema], &record);
        assert_eq!(restored.value(FieldKey::base(10)), Some(&FormValue::text("Ali")));
        assert_eq!(restored.value(FieldKey::base(20)), Some(&FormValue::text("Bakı")));
        assert_eq!(restored.value(FieldKey::new(20, 1)), Some(&FormValue::text("Quba")));
        assert_eq!(restored.extra_instances(2), 1);
    }

    #[tokio::test]
    async fn test_record_ids_increase() {
        let (_dir, service) = store();
        let payload = RecordPayload::default();
        let first = service
            .create_record(RecordKind::Candidate, &payload)
            .await
            .unwrap();
        let second = service
            .create_record(RecordKind::Candidate, &payload)
            .await
            .unwrap();
        assert_eq!((first, second), (Some(1), Some(2)));
    }

    #[tokio::test]
    async fn test_update_requires_existing_record() {
        let (_dir, service) = store();
        let schema = service
            .fetch_step_schema(RecordKind::Candidate, 1)
            .await
            .unwrap();
        let payload = update_payload(12, [&schema], &FormState::new());
        let err = service
            .update_record(RecordKind::Candidate, &payload)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::RecordNotFound(12)));

        let err = service
            .update_record(RecordKind::Candidate, &RecordPayload::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_add_and_remove_option() {
        let (_dir, service) = store();
        let id = service
            .add_option(RecordKind::Candidate, 20, &LocalizedText::uniform("Ganja"))
            .await
            .unwrap();
        assert_eq!(id, 502);

        let schema = service
            .fetch_step_schema(RecordKind::Candidate, 1)
            .await
            .unwrap();
        let (_, city) = schema.attribute(20).unwrap();
        assert_eq!(city.find_option("Ganja").map(|o| o.id), Some(502));

        service
            .remove_option(RecordKind::Candidate, 20, 502)
            .await
            .unwrap();
        let err = service
            .remove_option(RecordKind::Candidate, 20, 502)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::OptionNotFound { .. }));
    }

    #[tokio::test]
    async fn test_add_option_rejects_free_text_attribute() {
        let (_dir, service) = store();
        let err = service
            .add_option(RecordKind::Candidate, 10, &LocalizedText::uniform("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected(_)));
        let err = service
            .add_option(RecordKind::Candidate, 999, &LocalizedText::uniform("x"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::AttributeNotFound(999)));
    }

    #[test]
    fn test_literal_entries_are_typed_per_value_type() {
        assert_eq!(
            localized_set(ValueType::Price, Locale::En, "12.5").value.decimal_value,
            Some(12.5)
        );
        assert_eq!(
            localized_set(ValueType::Checkbox, Locale::Az, "true").value.bool_value,
            Some(true)
        );
        assert_eq!(
            localized_set(ValueType::Date, Locale::Ru, "2024-01-01")
                .value
                .date_time_value
                .as_deref(),
            Some("2024-01-01")
        );
    }
}
