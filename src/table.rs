use crate::availability::{DateAvailability, TourView};
use crate::status::{classify_timeslot, TimeslotClass};
use crate::timeslots::sort_timeslots;
use std::collections::HashSet;

const GUID_PREFIX_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct DateRow<'a> {
    pub availability: &'a DateAvailability,
    pub panel_id: String,
    pub timeslot_count: usize,
    pub expanded: bool,
    pub timeslots: Vec<TimeslotCell>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimeslotCell {
    /// `N/A` when the backend sent no hour.
    pub hour: String,
    pub class: TimeslotClass,
    pub capacity_remaining: u32,
    pub capacity_original: u32,
    pub occupancy_percent: f64,
}

/// Builds one row per date, each with its sorted timeslot panel.
pub fn build_rows<'a>(tour: &'a TourView, open_panels: &HashSet<String>) -> Vec<DateRow<'a>> {
    tour.dates
        .iter()
        .map(|availability| {
            let timeslots = tour.timeslots_for(&availability.date);
            let panel_id = panel_id(&tour.guid, &availability.date);
            DateRow {
                availability,
                timeslot_count: timeslots.len(),
                expanded: open_panels.contains(&panel_id),
                panel_id,
                timeslots: sort_timeslots(timeslots)
                    .into_iter()
                    .map(|slot| TimeslotCell {
                        class: classify_timeslot(slot.capacity_remaining, slot.occupancy_percent),
                        hour: slot.hour.unwrap_or_else(|| "N/A".to_string()),
                        capacity_remaining: slot.capacity_remaining,
                        capacity_original: slot.capacity_original,
                        occupancy_percent: slot.occupancy_percent,
                    })
                    .collect(),
            }
        })
        .collect()
}

/// Identifier of a date's timeslot panel: sanitized guid prefix plus
/// sanitized date, e.g. `a9a4b0f8_2026_11_25`.
pub fn panel_id(guid: &str, date: &str) -> String {
    let prefix: String = guid.chars().take(GUID_PREFIX_LEN).collect();
    format!("{}_{}", sanitize_id(&prefix), sanitize_id(date))
}

/// Replaces every character outside `[A-Za-z0-9]` with `_`.
pub fn sanitize_id(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
