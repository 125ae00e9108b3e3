//! Record editor session
//!
//! Drives one record through its steps: loads schemas (and, in edit mode,
//! the persisted record) from a [`RecordService`](crate::service::RecordService),
//! gates step transitions on validation, runs the option picker cycle and
//! submits the serialized payload.

mod error;
mod notice;
mod session;

pub use error::EditorError;
pub use notice::{Notice, Severity};
pub use session::{EditorMode, LoadedRecord, RecordEditor, Route};
