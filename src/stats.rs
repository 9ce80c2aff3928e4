use crate::models::{LeadTime, Statistics};

/// Lead-time entries shown per tour.
pub const LEAD_TIME_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct HourlyDemandRow {
    pub hour: String,
    pub percent_sold_out: f64,
    pub sold_out_count: u32,
    pub total_count: u32,
    pub average_occupancy: f64,
    /// Width of the demand bar in percent.
    pub bar_width: f64,
}

/// Hour buckets in the order the backend ranked them.
pub fn hourly_demand_rows(stats: &Statistics) -> Vec<HourlyDemandRow> {
    stats
        .por_hora
        .iter()
        .map(|bucket| HourlyDemandRow {
            hour: bucket.hora.clone(),
            percent_sold_out: bucket.porcentaje_agotado,
            sold_out_count: bucket.timeslots_agotados,
            total_count: bucket.total_timeslots,
            average_occupancy: bucket.ocupacion_promedio,
            bar_width: bar_width(bucket.porcentaje_agotado),
        })
        .collect()
}

/// The first [`LEAD_TIME_LIMIT`] exhaustion entries, as supplied.
pub fn lead_time_rows(stats: &Statistics) -> &[LeadTime] {
    let end = stats.dias_agotamiento.len().min(LEAD_TIME_LIMIT);
    &stats.dias_agotamiento[..end]
}

fn bar_width(percent: f64) -> f64 {
    if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        0.0
    }
}
