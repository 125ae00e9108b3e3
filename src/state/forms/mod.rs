//! Form domain layer
//!
//! Field values keyed by attribute and section instance, the instance
//! counters of repeatable sections, and the set of fields failing validation.

mod field;
mod form_state;
mod instances;

pub use field::{parse_instant, DateRange, FieldKey, FormValue};
pub use form_state::FormState;
pub use instances::SectionInstances;
