//! Merge engine - reconciles a local and a server report aggregate.
//!
//! Two strategies exist. The unconditional field-priority merge trusts any
//! non-empty incoming value; it is used after a local push has already been
//! issued and the server carries the latest truth. The timestamp-authoritative
//! merge first compares the last local edit time against the server's
//! timestamp and refuses to touch local state that is strictly newer, which is
//! what makes it safe to keep editing while a push is in flight.
//!
//! Photo sequences merge positionally: index i on one side is paired with
//! index i on the other. Both sides must enumerate photos in the same stable
//! order (category then slot); reordering or filtering one side independently
//! silently mismatches entries.

use crate::models::{Category, Photo, ReportData};

/// Result of a timestamp-authoritative merge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Local state was strictly newer; nothing was touched. Local is expected
    /// to be the side that pushes next.
    LocalNewer,
    /// The merge ran; `changed` reports whether any field actually changed
    Merged { changed: bool },
}

impl MergeOutcome {
    /// Whether the merge modified local state
    #[must_use]
    pub const fn changed(self) -> bool {
        matches!(self, Self::Merged { changed: true })
    }
}

/// Unconditional field-priority merge of `incoming` into `local`.
///
/// Every non-empty incoming inspection field replaces the local value; empty
/// incoming values never erase populated local fields. Returns whether any
/// field actually changed so callers can skip redundant downstream writes.
pub fn merge_field_priority(local: &mut ReportData, incoming: &ReportData) -> bool {
    let mut changed = false;

    for ((_, local_value), (_, incoming_value)) in local
        .inspection
        .named_fields_mut()
        .into_iter()
        .zip(incoming.inspection.named_fields())
    {
        changed |= adopt_nonempty(local_value, incoming_value);
    }

    changed |= adopt_nonempty(&mut local.conclusion, &incoming.conclusion);
    changed |= merge_photo_sequence(&mut local.photos, &incoming.photos);
    if !incoming.categories.is_empty() {
        changed |= merge_categories(&mut local.categories, &incoming.categories);
    }

    changed
}

/// Timestamp-authoritative merge of `incoming` into `local`.
///
/// `last_local_edit` is the wall-clock time of the most recent local mutation
/// (0 = never edited locally); `server_timestamp` is the server's last-updated
/// time. When local is strictly newer the merge is a no-op and the caller
/// keeps its state untouched. Otherwise each inspection field adopts the
/// incoming value only when the local value is empty or the server is strictly
/// newer; a populated local field with a non-newer server is never
/// overwritten.
pub fn merge_with_authority(
    local: &mut ReportData,
    incoming: &ReportData,
    last_local_edit: i64,
    server_timestamp: i64,
) -> MergeOutcome {
    if last_local_edit > server_timestamp && last_local_edit > 0 {
        return MergeOutcome::LocalNewer;
    }

    let server_newer = server_timestamp > last_local_edit;
    let mut changed = false;

    for ((_, local_value), (_, incoming_value)) in local
        .inspection
        .named_fields_mut()
        .into_iter()
        .zip(incoming.inspection.named_fields())
    {
        if local_value.is_empty() || server_newer {
            changed |= adopt_nonempty(local_value, incoming_value);
        }
    }

    if local.conclusion.is_empty() || server_newer {
        changed |= adopt_nonempty(&mut local.conclusion, &incoming.conclusion);
    }

    changed |= merge_photo_sequence(&mut local.photos, &incoming.photos);
    if !incoming.categories.is_empty() {
        changed |= merge_categories(&mut local.categories, &incoming.categories);
    }

    MergeOutcome::Merged { changed }
}

/// Positional merge of two photo sequences, shared by both strategies.
///
/// Local photo at index i pairs with incoming photo at index i; entries
/// present on only one side pass through unchanged.
pub fn merge_photo_sequence(local: &mut Vec<Photo>, incoming: &[Photo]) -> bool {
    let mut changed = false;

    for (slot, incoming_photo) in incoming.iter().enumerate() {
        if let Some(local_photo) = local.get_mut(slot) {
            changed |= merge_photo(local_photo, incoming_photo);
        } else {
            local.push(incoming_photo.clone());
            changed = true;
        }
    }

    changed
}

/// Field-by-field photo merge where incoming wins whenever its value is
/// non-empty. The identifier is adopted, never regenerated; the sub-photo
/// sequence is treated atomically; the additional-parts flag is ORed.
fn merge_photo(local: &mut Photo, incoming: &Photo) -> bool {
    let mut changed = adopt_nonempty(&mut local.id, &incoming.id);
    changed |= adopt_nonempty(&mut local.description, &incoming.description);
    changed |= adopt_nonempty(&mut local.part_number, &incoming.part_number);
    changed |= adopt_nonempty(&mut local.serial_number, &incoming.serial_number);
    changed |= adopt_nonempty(&mut local.part_name, &incoming.part_name);
    changed |= adopt_nonempty(&mut local.quantity, &incoming.quantity);
    changed |= adopt_nonempty(&mut local.criticality, &incoming.criticality);
    changed |= adopt_nonempty(&mut local.image, &incoming.image);
    changed |= adopt_nonempty(&mut local.edited_image, &incoming.edited_image);

    if !incoming.sub_photos.is_empty() && local.sub_photos != incoming.sub_photos {
        local.sub_photos = incoming.sub_photos.clone();
        changed = true;
    }

    if incoming.has_additional_parts && !local.has_additional_parts {
        local.has_additional_parts = true;
        changed = true;
    }

    changed
}

/// Merge category sequences, driven by the incoming (server) list.
///
/// Categories present only locally are dropped: callers must include every
/// live category in each push, or a merge against that push loses them.
fn merge_categories(local: &mut Vec<Category>, incoming: &[Category]) -> bool {
    let mut changed = false;
    let mut merged = Vec::with_capacity(incoming.len());

    for incoming_category in incoming {
        match local
            .iter()
            .find(|category| category.id == incoming_category.id)
        {
            None => {
                merged.push(incoming_category.clone());
                changed = true;
            }
            Some(existing) => {
                let mut category = existing.clone();
                changed |=
                    merge_photo_sequence(&mut category.photos, &incoming_category.photos);
                if !incoming_category.additional_parts.is_empty()
                    && category.additional_parts != incoming_category.additional_parts
                {
                    category.additional_parts = incoming_category.additional_parts.clone();
                    changed = true;
                }
                merged.push(category);
            }
        }
    }

    if local.len() != merged.len()
        || local
            .iter()
            .zip(&merged)
            .any(|(before, after)| before.id != after.id)
    {
        changed = true;
    }

    *local = merged;
    changed
}

/// Replace `local` with `incoming` when incoming is non-empty and different
fn adopt_nonempty(local: &mut String, incoming: &str) -> bool {
    if incoming.is_empty() || local == incoming {
        return false;
    }
    incoming.clone_into(local);
    true
}
