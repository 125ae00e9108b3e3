//! HR forms - schema-driven multi-step record editor
//!
//! Renders candidate and vacancy records as ordered steps of sections and
//! attributes fetched at runtime, validates required fields per section
//! instance, and serializes the form into the multi-locale record payload.

pub mod config;
pub mod editor;
pub mod engine;
pub mod record;
pub mod schema;
pub mod service;
pub mod state;

#[cfg(test)]
mod test_support;
