//! Data models for Rigsheet

mod category;
mod photo;
mod report;

pub use category::{is_valid_category, AdditionalPart, Category, VALID_CATEGORIES};
pub use photo::{Photo, SubPhoto};
pub use report::{InspectionFields, ReportData};
