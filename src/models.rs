use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// A browser cookie in the structured form the backend accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: String,
}

#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub cookies: &'a str,
    pub tours: &'a [&'a str],
    pub meses: u32,
}

#[derive(Debug, Serialize)]
pub struct SaveCookiesRequest<'a> {
    pub cookies: &'a str,
}

/// Body of the export and history endpoints; forwards the raw `resultados` map.
#[derive(Debug, Serialize)]
pub struct ResultsRequest<'a> {
    pub resultados: &'a serde_json::Value,
}

/// Envelope shared by the endpoints that answer with a `success` flag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Acknowledgement {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CookieFileResponse {
    #[serde(default)]
    pub success: bool,
    /// Either pre-serialized JSON text or a cookie array.
    #[serde(default)]
    pub cookies: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoredCookiesResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub cookies: Option<serde_json::Value>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the live query endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub resultados: BTreeMap<String, LiveTour>,
    #[serde(default, rename = "meses_consultados", alias = "mesesConsultados")]
    pub months: Vec<String>,
    #[serde(default)]
    pub timestamp: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveTour {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_fechas: u32,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_plazas: u32,
    #[serde(default)]
    pub fechas: Vec<LiveDate>,
    #[serde(default)]
    pub timeslots_por_fecha: BTreeMap<String, Vec<TimeslotRecord>>,
    #[serde(default)]
    pub estadisticas: Statistics,
}

/// A date row with status and occupancy already computed by the backend.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveDate {
    pub fecha: String,
    #[serde(default)]
    pub dia_semana: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub plazas_disponibles: u32,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub plazas_totales: u32,
    #[serde(default)]
    pub porcentaje_ocupado: Option<f64>,
    #[serde(default)]
    pub estado: Option<String>,
    #[serde(default)]
    pub nivel: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeslotRecord {
    #[serde(default)]
    pub hora: Option<String>,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub capacidad: u32,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub capacidad_original: u32,
    #[serde(default)]
    pub porcentaje_ocupado: Option<f64>,
}

/// Response of the cached availability endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CachedAvailability {
    #[serde(default)]
    pub resultados: BTreeMap<String, CachedTour>,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CachedTour {
    #[serde(default)]
    pub nombre: String,
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub fechas: Vec<CachedDate>,
    #[serde(default)]
    pub timeslots_por_fecha: BTreeMap<String, Vec<TimeslotRecord>>,
    #[serde(default)]
    pub estadisticas: Statistics,
}

/// A date row carrying only raw spot counts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CachedDate {
    pub fecha: String,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub plazas_disponibles: u32,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub plazas_totales: u32,
}

/// Aggregates computed upstream; rendered as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(default)]
    pub por_hora: Vec<HourlyDemand>,
    #[serde(default)]
    pub dias_agotamiento: Vec<LeadTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlyDemand {
    #[serde(default)]
    pub hora: String,
    #[serde(default)]
    pub porcentaje_agotado: f64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub timeslots_agotados: u32,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_timeslots: u32,
    #[serde(default)]
    pub ocupacion_promedio: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeadTime {
    #[serde(default)]
    pub fecha: String,
    #[serde(default)]
    pub dias_adelantados: i64,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub timeslots_agotados: u32,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_timeslots: u32,
    #[serde(default)]
    pub porcentaje_agotado: f64,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: Option<String>,
}

// Null, negative and fractional counts collapse to a non-negative integer.
fn count_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Number>::deserialize(deserializer)?;
    Ok(value
        .and_then(|number| {
            number
                .as_u64()
                .or_else(|| number.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
        })
        .map(|n| u32::try_from(n).unwrap_or(u32::MAX))
        .unwrap_or(0))
}
