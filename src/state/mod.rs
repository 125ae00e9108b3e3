//! Editor state module

mod forms;

pub use forms::*;
