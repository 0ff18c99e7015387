//! Report aggregate model

use serde::{Deserialize, Serialize};

use super::category::Category;
use super::photo::Photo;

/// Number of named inspection fields
pub const INSPECTION_FIELD_COUNT: usize = 11;

/// Named identification fields of one inspection report.
///
/// Every field defaults to the empty string; emptiness is what the merge
/// engine keys its priority rules on, so `""` and "absent" are equivalent.
/// The three `*_photo` fields hold embedded reference image payloads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InspectionFields {
    pub tag: String,
    pub model: String,
    pub serial_number: String,
    pub customer: String,
    pub inspection_date: String,
    pub report_date: String,
    pub inspector: String,
    pub hour_meter: String,
    pub front_photo: String,
    pub nameplate_photo: String,
    pub hour_meter_photo: String,
}

impl InspectionFields {
    /// Every named field paired with its wire name, in declaration order.
    ///
    /// This is the explicit per-field merge table: adding a field here forces
    /// a deliberate decision about its merge policy.
    #[must_use]
    pub fn named_fields(&self) -> [(&'static str, &String); INSPECTION_FIELD_COUNT] {
        [
            ("tag", &self.tag),
            ("model", &self.model),
            ("serialNumber", &self.serial_number),
            ("customer", &self.customer),
            ("inspectionDate", &self.inspection_date),
            ("reportDate", &self.report_date),
            ("inspector", &self.inspector),
            ("hourMeter", &self.hour_meter),
            ("frontPhoto", &self.front_photo),
            ("nameplatePhoto", &self.nameplate_photo),
            ("hourMeterPhoto", &self.hour_meter_photo),
        ]
    }

    /// Mutable variant of [`Self::named_fields`], same order
    #[must_use]
    pub fn named_fields_mut(&mut self) -> [(&'static str, &mut String); INSPECTION_FIELD_COUNT] {
        [
            ("tag", &mut self.tag),
            ("model", &mut self.model),
            ("serialNumber", &mut self.serial_number),
            ("customer", &mut self.customer),
            ("inspectionDate", &mut self.inspection_date),
            ("reportDate", &mut self.report_date),
            ("inspector", &mut self.inspector),
            ("hourMeter", &mut self.hour_meter),
            ("frontPhoto", &mut self.front_photo),
            ("nameplatePhoto", &mut self.nameplate_photo),
            ("hourMeterPhoto", &mut self.hour_meter_photo),
        ]
    }

    /// Look up a field by its wire name
    #[must_use]
    pub fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        self.named_fields_mut()
            .into_iter()
            .find_map(|(field_name, value)| (field_name == name).then_some(value))
    }
}

/// The complete in-memory state of one inspection report.
///
/// `photos` is the flat variant; `categories` is the category-aware variant.
/// A report uses one or the other, but both deserialize from partial payloads
/// so that merge inputs missing either collection simply leave it empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportData {
    /// Named identification fields
    pub inspection: InspectionFields,
    /// Flat ordered photo sequence
    pub photos: Vec<Photo>,
    /// Category-grouped photo sequences
    pub categories: Vec<Category>,
    /// Free-text conclusion narrative
    pub conclusion: String,
}

impl ReportData {
    /// True when nothing has been filled in
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
