//! rigsheet-core - Core library for Rigsheet
//!
//! This crate contains the shared report model, the merge engine that
//! reconciles local and server report state, the local edit tracker, the
//! client-side snapshot persistence, and the collaboration protocol client
//! used by all Rigsheet interfaces.

pub mod db;
pub mod error;
pub mod merge;
pub mod models;
pub mod protocol;
pub mod spellcheck;
pub mod store;
pub mod sync;

pub use error::{Error, Result};
pub use merge::MergeOutcome;
pub use models::{AdditionalPart, Category, InspectionFields, Photo, ReportData};
pub use store::LocalReport;
