//! Record service: schema and record transport behind a trait

mod error;
mod file;
mod traits;

pub use error::ServiceError;
pub use file::FileRecordService;
pub use traits::RecordService;

#[cfg(test)]
pub use traits::MockRecordService;
