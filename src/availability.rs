//! Single internal representation of availability, built from either the
//! cached or the live backend shape so that rendering has one code path.

use crate::models::{
    CachedAvailability, CachedDate, LiveDate, LiveTour, QueryResult, Statistics, TimeslotRecord,
};
use crate::status::{classify, occupancy_percent, StatusLevel};
use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

const WEEKDAY_LABELS: [&str; 7] = ["Lun", "Mar", "Mié", "Jue", "Vie", "Sáb", "Dom"];

/// Where the current results came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Cache,
    Live,
}

impl DataSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Cache => "cached data",
            Self::Live => "live query",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DateAvailability {
    pub date: String,
    pub day_of_week: String,
    pub spots_available: u32,
    pub spots_total: u32,
    pub occupancy_percent: f64,
    pub status_level: StatusLevel,
    pub status_label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Timeslot {
    pub hour: Option<String>,
    pub capacity_remaining: u32,
    pub capacity_original: u32,
    pub occupancy_percent: f64,
}

#[derive(Debug, Clone)]
pub struct TourView {
    pub key: String,
    pub name: String,
    pub guid: String,
    pub total_dates: u32,
    pub total_spots: u64,
    pub dates: Vec<DateAvailability>,
    pub timeslots_by_date: BTreeMap<String, Vec<Timeslot>>,
    pub statistics: Statistics,
}

impl TourView {
    pub fn timeslots_for(&self, date: &str) -> &[Timeslot] {
        self.timeslots_by_date
            .get(date)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct AvailabilitySnapshot {
    pub tours: Vec<TourView>,
    pub months: Vec<String>,
    pub timestamp: String,
    pub source: DataSource,
}

impl AvailabilitySnapshot {
    pub fn is_empty(&self) -> bool {
        self.tours.is_empty()
    }
}

/// Adapts a live query response, whose dates arrive already classified.
pub fn from_live_shape(result: QueryResult) -> AvailabilitySnapshot {
    let tours = result
        .resultados
        .into_iter()
        .map(|(key, tour)| live_tour(key, tour))
        .collect();

    AvailabilitySnapshot {
        tours,
        months: result.months,
        timestamp: result.timestamp,
        source: DataSource::Live,
    }
}

/// Adapts the cached payload, classifying every date from its raw counts.
pub fn from_cached_shape(cached: CachedAvailability) -> AvailabilitySnapshot {
    let mut months = Vec::new();
    let tours = cached
        .resultados
        .into_iter()
        .map(|(key, tour)| {
            let dates: Vec<DateAvailability> = tour.fechas.iter().map(cached_date).collect();
            for date in &dates {
                if let Some(month) = date.date.get(..7) {
                    if !months.iter().any(|m: &String| m == month) {
                        months.push(month.to_string());
                    }
                }
            }
            TourView {
                key,
                name: tour.nombre,
                guid: tour.guid,
                total_dates: u32::try_from(dates.len()).unwrap_or(u32::MAX),
                total_spots: dates.iter().map(|d| u64::from(d.spots_available)).sum(),
                dates,
                timeslots_by_date: convert_timeslots(tour.timeslots_por_fecha),
                statistics: tour.estadisticas,
            }
        })
        .collect();
    months.sort();

    AvailabilitySnapshot {
        tours,
        months,
        timestamp: cached.timestamp,
        source: DataSource::Cache,
    }
}

fn live_tour(key: String, tour: LiveTour) -> TourView {
    let dates: Vec<DateAvailability> = tour.fechas.iter().map(live_date).collect();
    TourView {
        key,
        name: tour.nombre,
        guid: tour.guid,
        total_dates: tour.total_fechas,
        total_spots: u64::from(tour.total_plazas),
        dates,
        timeslots_by_date: convert_timeslots(tour.timeslots_por_fecha),
        statistics: tour.estadisticas,
    }
}

fn live_date(date: &LiveDate) -> DateAvailability {
    let computed = classify(date.plazas_disponibles, date.plazas_totales);
    let status_level = date
        .nivel
        .as_deref()
        .and_then(StatusLevel::from_backend_code)
        .unwrap_or(computed.status_level);
    let status_label = date
        .estado
        .clone()
        .filter(|label| !label.trim().is_empty())
        .unwrap_or_else(|| status_level.label().to_string());
    let day_of_week = if date.dia_semana.is_empty() {
        weekday_label(&date.fecha)
    } else {
        date.dia_semana.clone()
    };

    DateAvailability {
        date: date.fecha.clone(),
        day_of_week,
        spots_available: date.plazas_disponibles,
        spots_total: date.plazas_totales,
        occupancy_percent: date
            .porcentaje_ocupado
            .map_or(computed.occupancy_percent, |p| p.clamp(0.0, 100.0)),
        status_level,
        status_label,
    }
}

fn cached_date(date: &CachedDate) -> DateAvailability {
    let computed = classify(date.plazas_disponibles, date.plazas_totales);
    DateAvailability {
        date: date.fecha.clone(),
        day_of_week: weekday_label(&date.fecha),
        spots_available: date.plazas_disponibles,
        spots_total: date.plazas_totales,
        occupancy_percent: computed.occupancy_percent,
        status_level: computed.status_level,
        status_label: computed.status_label.to_string(),
    }
}

fn convert_timeslots(
    by_date: BTreeMap<String, Vec<TimeslotRecord>>,
) -> BTreeMap<String, Vec<Timeslot>> {
    by_date
        .into_iter()
        .map(|(date, records)| (date, records.iter().map(timeslot).collect()))
        .collect()
}

fn timeslot(record: &TimeslotRecord) -> Timeslot {
    Timeslot {
        hour: record.hora.clone().filter(|h| !h.trim().is_empty()),
        capacity_remaining: record.capacidad,
        capacity_original: record.capacidad_original,
        occupancy_percent: record.porcentaje_ocupado.map_or_else(
            || occupancy_percent(record.capacidad, record.capacidad_original),
            |p| p.clamp(0.0, 100.0),
        ),
    }
}

/// Short weekday label for a `YYYY-MM-DD` date, empty when the date does not parse.
pub fn weekday_label(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| WEEKDAY_LABELS[d.weekday().num_days_from_monday() as usize].to_string())
        .unwrap_or_default()
}
