//! Photo evidence model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One photographic evidence entry on a report.
///
/// The identifier is minted once and stays stable across merges; every other
/// field is merged independently with its own priority rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Photo {
    /// Unique identifier, stable across merges
    pub id: String,
    /// Free-text description of what the photo shows
    pub description: String,
    /// Part number of the pictured component
    pub part_number: String,
    /// Serial number of the pictured component
    pub serial_number: String,
    /// Human-readable part name
    pub part_name: String,
    /// Quantity as entered on the form
    pub quantity: String,
    /// Criticality rating as entered on the form
    pub criticality: String,
    /// Primary image payload (data URL or object key)
    pub image: String,
    /// Edited/annotated image payload
    pub edited_image: String,
    /// Embedded detail shots attached to this entry
    pub sub_photos: Vec<SubPhoto>,
    /// Whether extra parts were recorded for this entry
    pub has_additional_parts: bool,
}

impl Photo {
    /// Create an empty photo entry with a fresh identifier
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            ..Self::default()
        }
    }

    /// Create a photo entry carrying an image payload
    #[must_use]
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            ..Self::new()
        }
    }
}

/// Embedded detail shot inside a [`Photo`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubPhoto {
    /// Unique identifier
    pub id: String,
    /// Image payload
    pub image: String,
    /// Optional caption
    pub caption: String,
}

impl SubPhoto {
    /// Create a sub-photo carrying an image payload
    #[must_use]
    pub fn with_image(image: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7().to_string(),
            image: image.into(),
            caption: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_ids_are_unique() {
        assert_ne!(Photo::new().id, Photo::new().id);
    }

    #[test]
    fn partial_payload_deserializes_with_defaults() {
        let photo: Photo = serde_json::from_str(r#"{"id":"p-1","image":"img"}"#).unwrap();
        assert_eq!(photo.id, "p-1");
        assert_eq!(photo.image, "img");
        assert!(photo.description.is_empty());
        assert!(photo.sub_photos.is_empty());
        assert!(!photo.has_additional_parts);
    }
}
