use serde::Serialize;

/// Occupancy above this marks a date as low availability and a timeslot as partial.
pub const LOW_AVAILABILITY_THRESHOLD: f64 = 70.0;
/// Occupancy above this marks a date as moderately booked.
pub const MODERATE_THRESHOLD: f64 = 30.0;

/// Four-level status of a whole date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Available,
    Moderate,
    LowAvailability,
    SoldOut,
}

impl StatusLevel {
    pub fn label(self) -> &'static str {
        match self {
            Self::Available => "High availability",
            Self::Moderate => "Moderate availability",
            Self::LowAvailability => "Low availability",
            Self::SoldOut => "Sold out",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Moderate => "moderate",
            Self::LowAvailability => "low",
            Self::SoldOut => "sold-out",
        }
    }

    /// Maps the backend's `nivel` code onto a level.
    pub fn from_backend_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_lowercase().as_str() {
            "alta" | "available" => Some(Self::Available),
            "media" | "moderate" => Some(Self::Moderate),
            "baja" | "low" => Some(Self::LowAvailability),
            "agotado" | "sold_out" | "sold-out" => Some(Self::SoldOut),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub status_level: StatusLevel,
    pub status_label: &'static str,
    /// Rounded to one decimal.
    pub occupancy_percent: f64,
}

/// Classifies a date from its remaining and total spots.
///
/// Sold out wins over every percentage threshold. A date with zero total
/// capacity is sold out when nothing is available; `classify(n, 0)` with
/// `n > 0` cannot come from a consistent backend and reports `Available`
/// with zero occupancy.
pub fn classify(spots_available: u32, spots_total: u32) -> Classification {
    let status_level = if spots_available == 0 {
        StatusLevel::SoldOut
    } else if exceeds(spots_available, spots_total, LOW_AVAILABILITY_THRESHOLD) {
        StatusLevel::LowAvailability
    } else if exceeds(spots_available, spots_total, MODERATE_THRESHOLD) {
        StatusLevel::Moderate
    } else {
        StatusLevel::Available
    };

    Classification {
        status_level,
        status_label: status_level.label(),
        occupancy_percent: occupancy_percent(spots_available, spots_total),
    }
}

// Compares `used / total * 100 > threshold` without float division so that
// exact boundaries such as 30/100 do not drift over the threshold.
fn exceeds(remaining: u32, total: u32, threshold: f64) -> bool {
    if total == 0 {
        return false;
    }
    let used = f64::from(total.saturating_sub(remaining)) * 100.0;
    used > threshold * f64::from(total)
}

/// Occupancy as a percentage in `[0, 100]`, rounded to one decimal.
pub fn occupancy_percent(remaining: u32, original: u32) -> f64 {
    round_one_decimal(raw_occupancy(remaining, original))
}

fn raw_occupancy(remaining: u32, original: u32) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let used = f64::from(original.saturating_sub(remaining));
    (used * 100.0 / f64::from(original)).clamp(0.0, 100.0)
}

pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Three-level display class of a single timeslot. Deliberately separate from
/// [`StatusLevel`]: there is no moderate tier here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeslotClass {
    SoldOut,
    Partial,
    Available,
}

impl TimeslotClass {
    pub fn css_class(self) -> &'static str {
        match self {
            Self::SoldOut => "sold-out",
            Self::Partial => "partial",
            Self::Available => "available",
        }
    }
}

pub fn classify_timeslot(capacity_remaining: u32, occupancy_percent: f64) -> TimeslotClass {
    if capacity_remaining == 0 {
        TimeslotClass::SoldOut
    } else if occupancy_percent > LOW_AVAILABILITY_THRESHOLD {
        TimeslotClass::Partial
    } else {
        TimeslotClass::Available
    }
}
