//! Schema-driven form engine
//!
//! Pure functions over [`StepSchema`](crate::schema::StepSchema) and
//! [`FormState`](crate::state::FormState): validation of required fields,
//! hydration from a persisted record and serialization into the write
//! payload.

mod hydrator;
mod serializer;
mod validator;

pub use hydrator::{extract_value, hydrate};
pub use serializer::{attribute_entry, create_payload, section_entries, update_payload};
pub use validator::{validate_step, validate_steps, ValidationReport};
