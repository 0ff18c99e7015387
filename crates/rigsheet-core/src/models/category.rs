//! Photo category and additional-part models

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::photo::Photo;

/// Category identifiers accepted by the current schema.
///
/// Changing this set requires bumping `db::SNAPSHOT_VERSION`; the snapshot
/// load path drops categories whose identifier is no longer listed here.
pub const VALID_CATEGORIES: [&str; 7] = [
    "engine",
    "hydraulic",
    "electrical",
    "structure",
    "undercarriage",
    "attachments",
    "cab_interior",
];

/// Check whether a category identifier belongs to the current valid set
#[must_use]
pub fn is_valid_category(id: &str) -> bool {
    VALID_CATEGORIES.contains(&id)
}

/// A named group of photo entries with its own additional-part collection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Category {
    /// Identifier drawn from [`VALID_CATEGORIES`]
    pub id: String,
    /// Ordered photo entries owned by this category
    pub photos: Vec<Photo>,
    /// Additional parts recorded under this category
    pub additional_parts: Vec<AdditionalPart>,
}

impl Category {
    /// Create an empty category with the given identifier
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

/// A spare/replacement part recorded independently of photo entries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditionalPart {
    /// Unique identifier
    pub id: String,
    /// Part number
    pub part_number: String,
    /// Human-readable part name
    pub part_name: String,
    /// Quantity as entered on the form
    pub quantity: String,
    /// Free-text notes
    pub notes: String,
}

impl AdditionalPart {
    /// Create an empty part entry with a fresh identifier
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_categories_are_valid() {
        for id in VALID_CATEGORIES {
            assert!(is_valid_category(id));
        }
    }

    #[test]
    fn unknown_category_is_rejected() {
        assert!(!is_valid_category("paintwork"));
        assert!(!is_valid_category(""));
    }
}
