use crate::availability::Timeslot;

pub const DEFAULT_HOUR: &str = "00:00";

/// Returns the timeslots ordered by `HH:MM` hour, leaving `timeslots` untouched.
///
/// Zero-padded 24-hour strings compare lexicographically in chronological
/// order. A missing hour sorts as midnight; equal hours keep their input order.
pub fn sort_timeslots(timeslots: &[Timeslot]) -> Vec<Timeslot> {
    let mut sorted = timeslots.to_vec();
    sorted.sort_by(|a, b| sort_key(a).cmp(sort_key(b)));
    sorted
}

fn sort_key(slot: &Timeslot) -> &str {
    slot.hour.as_deref().unwrap_or(DEFAULT_HOUR)
}
