//! Local report state controller and edit tracker.
//!
//! A [`LocalReport`] owns the single mutable copy of the report aggregate on a
//! client. Every local mutation stamps the last-edit time; operations that
//! accept server data (`load`, the merge paths, remote field events) never do,
//! which is the asymmetry the timestamp-authoritative merge depends on.
//! Persistence hangs off the controller as a subscriber notified on every
//! accepted transition rather than being baked into the mutation path.

use serde_json::Value;

use crate::merge::{self, MergeOutcome};
use crate::models::{is_valid_category, AdditionalPart, Category, Photo, ReportData};

/// Subscriber notified after every accepted state transition
pub trait SnapshotSink {
    /// Called with the new state and the current last-local-edit time
    fn snapshot_accepted(&self, data: &ReportData, last_local_edit: i64);
}

/// Owner of a client's local report state
pub struct LocalReport {
    data: ReportData,
    last_local_edit: i64,
    clock: fn() -> i64,
    sinks: Vec<Box<dyn SnapshotSink>>,
}

fn wall_clock_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl Default for LocalReport {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalReport {
    /// Create an empty, never-edited report
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(wall_clock_millis)
    }

    /// Create a report whose edit stamps come from the given clock
    #[must_use]
    pub fn with_clock(clock: fn() -> i64) -> Self {
        Self {
            data: ReportData::default(),
            last_local_edit: 0,
            clock,
            sinks: Vec::new(),
        }
    }

    /// Register a subscriber for accepted transitions
    pub fn subscribe(&mut self, sink: Box<dyn SnapshotSink>) {
        self.sinks.push(sink);
    }

    /// Current report state
    #[must_use]
    pub const fn data(&self) -> &ReportData {
        &self.data
    }

    /// Wall-clock time of the most recent local mutation, 0 if never edited
    #[must_use]
    pub const fn last_local_edit(&self) -> i64 {
        self.last_local_edit
    }

    /// Set a named inspection field. Unknown field names are skipped.
    pub fn set_field(&mut self, name: &str, value: impl Into<String>) -> bool {
        let value = value.into();
        let Some(slot) = self.data.inspection.field_mut(name) else {
            return false;
        };
        if *slot == value {
            return false;
        }
        *slot = value;
        self.local_edit();
        true
    }

    /// Replace the conclusion narrative
    pub fn set_conclusion(&mut self, conclusion: impl Into<String>) -> bool {
        let conclusion = conclusion.into();
        if self.data.conclusion == conclusion {
            return false;
        }
        self.data.conclusion = conclusion;
        self.local_edit();
        true
    }

    /// Append a photo to the flat sequence
    pub fn add_photo(&mut self, photo: Photo) {
        self.data.photos.push(photo);
        self.local_edit();
    }

    /// Mutate the photo with the given id, anywhere it lives
    pub fn update_photo(&mut self, id: &str, apply: impl FnOnce(&mut Photo)) -> bool {
        let found = self
            .data
            .photos
            .iter_mut()
            .chain(
                self.data
                    .categories
                    .iter_mut()
                    .flat_map(|category| category.photos.iter_mut()),
            )
            .find(|photo| photo.id == id);
        match found {
            Some(photo) => {
                apply(photo);
                self.local_edit();
                true
            }
            None => false,
        }
    }

    /// Remove the photo with the given id from the flat sequence
    pub fn remove_photo(&mut self, id: &str) -> bool {
        let before = self.data.photos.len();
        self.data.photos.retain(|photo| photo.id != id);
        if self.data.photos.len() == before {
            return false;
        }
        self.local_edit();
        true
    }

    /// Add an empty category. Identifiers outside the valid set are skipped,
    /// as are duplicates.
    pub fn add_category(&mut self, id: &str) -> bool {
        if !is_valid_category(id) || self.data.categories.iter().any(|c| c.id == id) {
            return false;
        }
        self.data.categories.push(Category::new(id));
        self.local_edit();
        true
    }

    /// Mutate the category with the given id
    pub fn update_category(&mut self, id: &str, apply: impl FnOnce(&mut Category)) -> bool {
        match self
            .data
            .categories
            .iter_mut()
            .find(|category| category.id == id)
        {
            Some(category) => {
                apply(category);
                self.local_edit();
                true
            }
            None => false,
        }
    }

    /// Record an additional part under a category
    pub fn add_additional_part(&mut self, category_id: &str, part: AdditionalPart) -> bool {
        self.update_category(category_id, |category| {
            category.additional_parts.push(part);
        })
    }

    /// Remove an additional part by id, anywhere it lives
    pub fn remove_additional_part(&mut self, part_id: &str) -> bool {
        let mut removed = false;
        for category in &mut self.data.categories {
            let before = category.additional_parts.len();
            category.additional_parts.retain(|part| part.id != part_id);
            removed |= category.additional_parts.len() != before;
        }
        if removed {
            self.local_edit();
        }
        removed
    }

    /// Bulk-replace the whole aggregate with locally authored data
    pub fn replace(&mut self, data: ReportData) {
        self.data = data;
        self.local_edit();
    }

    /// Restore persisted state. Does not count as a local edit; the persisted
    /// edit time is restored alongside the data.
    pub fn load(&mut self, data: ReportData, last_local_edit: i64) {
        self.data = data;
        self.last_local_edit = last_local_edit;
    }

    /// Merge server data with timestamp authority. Never advances the local
    /// edit time.
    pub fn accept_server(&mut self, incoming: &ReportData, server_timestamp: i64) -> MergeOutcome {
        let outcome = merge::merge_with_authority(
            &mut self.data,
            incoming,
            self.last_local_edit,
            server_timestamp,
        );
        if outcome.changed() {
            self.notify();
        }
        outcome
    }

    /// Merge server data unconditionally (field priority). Used once a local
    /// push has already been issued and the server carries the latest truth.
    pub fn accept_pushed(&mut self, incoming: &ReportData) -> bool {
        let changed = merge::merge_field_priority(&mut self.data, incoming);
        if changed {
            self.notify();
        }
        changed
    }

    /// Apply a field-scoped update event received from another participant.
    ///
    /// Paths are `conclusion` or `inspection.<wireName>`. Unknown paths and
    /// non-string values are skipped, never errors. Does not count as a local
    /// edit.
    pub fn apply_remote_field(&mut self, path: &str, value: &Value) -> bool {
        let Some(text) = value.as_str() else {
            return false;
        };
        let changed = if path == "conclusion" {
            if self.data.conclusion == text {
                false
            } else {
                self.data.conclusion = text.to_string();
                true
            }
        } else if let Some(name) = path.strip_prefix("inspection.") {
            match self.data.inspection.field_mut(name) {
                Some(slot) if *slot != text => {
                    *slot = text.to_string();
                    true
                }
                _ => false,
            }
        } else {
            false
        };
        if changed {
            self.notify();
        }
        changed
    }

    /// Reset the aggregate to defaults and the edit time to 0
    pub fn clear_all(&mut self) {
        self.data = ReportData::default();
        self.last_local_edit = 0;
        self.notify();
    }

    fn local_edit(&mut self) {
        self.last_local_edit = (self.clock)();
        self.notify();
    }

    fn notify(&self) {
        for sink in &self.sinks {
            sink.snapshot_accepted(&self.data, self.last_local_edit);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::models::InspectionFields;

    fn fixed_clock() -> i64 {
        1_000
    }

    fn report() -> LocalReport {
        LocalReport::with_clock(fixed_clock)
    }

    #[test]
    fn mutations_stamp_the_edit_time() {
        let mut local = report();
        assert_eq!(local.last_local_edit(), 0);

        assert!(local.set_field("tag", "T-1"));
        assert_eq!(local.last_local_edit(), 1_000);
        assert_eq!(local.data().inspection.tag, "T-1");
    }

    #[test]
    fn noop_mutations_do_not_stamp() {
        let mut local = LocalReport::with_clock(|| 2_000);
        local.load(
            ReportData {
                inspection: InspectionFields {
                    tag: "T-1".to_string(),
                    ..InspectionFields::default()
                },
                ..ReportData::default()
            },
            500,
        );

        assert!(!local.set_field("tag", "T-1"));
        assert_eq!(local.last_local_edit(), 500);
    }

    #[test]
    fn unknown_field_is_skipped() {
        let mut local = report();
        assert!(!local.set_field("notAField", "x"));
        assert_eq!(local.last_local_edit(), 0);
    }

    #[test]
    fn load_restores_without_stamping() {
        let mut local = report();
        local.load(ReportData::default(), 42);
        assert_eq!(local.last_local_edit(), 42);
    }

    #[test]
    fn accept_server_never_advances_edit_time() {
        let mut local = report();
        local.set_field("tag", "T-1");

        let mut incoming = ReportData::default();
        incoming.conclusion = "from server".to_string();
        let outcome = local.accept_server(&incoming, 5_000);

        assert!(outcome.changed());
        assert_eq!(local.data().conclusion, "from server");
        assert_eq!(local.last_local_edit(), 1_000);
    }

    #[test]
    fn accept_server_reports_noop_when_local_newer() {
        let mut local = report();
        local.set_field("tag", "T-1");

        let mut incoming = ReportData::default();
        incoming.inspection.tag = "server".to_string();
        let outcome = local.accept_server(&incoming, 500);

        assert_eq!(outcome, MergeOutcome::LocalNewer);
        assert_eq!(local.data().inspection.tag, "T-1");
    }

    #[test]
    fn remote_field_event_applies_without_stamping() {
        let mut local = report();
        assert!(local.apply_remote_field("inspection.tag", &json!("T-9")));
        assert_eq!(local.data().inspection.tag, "T-9");
        assert_eq!(local.last_local_edit(), 0);

        assert!(local.apply_remote_field("conclusion", &json!("done")));
        assert_eq!(local.data().conclusion, "done");

        assert!(!local.apply_remote_field("photos.0.description", &json!("x")));
        assert!(!local.apply_remote_field("inspection.tag", &json!(7)));
    }

    #[test]
    fn clear_all_resets_state_and_edit_time() {
        let mut local = report();
        local.set_field("tag", "T-1");
        local.add_photo(Photo::new());

        local.clear_all();
        assert!(local.data().is_empty());
        assert_eq!(local.last_local_edit(), 0);
    }

    #[test]
    fn invalid_category_is_not_added() {
        let mut local = report();
        assert!(!local.add_category("paintwork"));
        assert!(local.add_category("engine"));
        assert!(!local.add_category("engine"));
    }

    #[test]
    fn photo_updates_reach_category_photos() {
        let mut local = report();
        local.add_category("engine");
        let photo = Photo::with_image("block.jpg");
        let photo_id = photo.id.clone();
        local.update_category("engine", |category| category.photos.push(photo));

        assert!(local.update_photo(&photo_id, |photo| {
            photo.description = "engine block".to_string();
        }));
        assert_eq!(
            local.data().categories[0].photos[0].description,
            "engine block"
        );
    }

    struct CountingSink(Rc<Cell<usize>>);

    impl SnapshotSink for CountingSink {
        fn snapshot_accepted(&self, _data: &ReportData, _last_local_edit: i64) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn subscriber_sees_every_accepted_transition() {
        let notified = Rc::new(Cell::new(0));
        let mut local = report();
        local.subscribe(Box::new(CountingSink(Rc::clone(&notified))));

        local.set_field("tag", "T-1");
        local.set_field("tag", "T-1"); // no change, no notification
        local.set_conclusion("done");

        assert_eq!(notified.get(), 2);
    }
}
