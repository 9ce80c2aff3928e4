use crate::availability::{AvailabilitySnapshot, DataSource};
use crate::table::panel_id;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Loading,
    Results,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
    pub raised_at: Instant,
}

/// Controls that are disabled while their own request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Control {
    Query,
    Export,
    Refresh,
    History,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultsTab {
    #[default]
    Dates,
    Stats,
}

impl ResultsTab {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "dates" => Some(Self::Dates),
            "stats" => Some(Self::Stats),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dates => "dates",
            Self::Stats => "stats",
        }
    }
}

/// Everything the dashboard page shows. Results are replaced wholesale on
/// every load; nothing here is persisted.
#[derive(Debug)]
pub struct DashboardSession {
    pub phase: Phase,
    pub cookies_text: String,
    pub snapshot: Option<AvailabilitySnapshot>,
    /// The backend's `resultados` map exactly as received.
    pub raw_results: Option<serde_json::Value>,
    banner: Option<Banner>,
    busy: BTreeSet<Control>,
    open_panels: HashSet<String>,
    active_tabs: HashMap<String, ResultsTab>,
}

impl Default for DashboardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardSession {
    pub fn new() -> Self {
        Self {
            phase: Phase::Idle,
            cookies_text: String::new(),
            snapshot: None,
            raw_results: None,
            banner: None,
            busy: BTreeSet::new(),
            open_panels: HashSet::new(),
            active_tabs: HashMap::new(),
        }
    }

    pub fn source(&self) -> Option<DataSource> {
        self.snapshot.as_ref().map(|snapshot| snapshot.source)
    }

    pub fn begin_loading(&mut self) {
        self.phase = Phase::Loading;
    }

    pub fn finish_with_results(
        &mut self,
        snapshot: AvailabilitySnapshot,
        raw_results: serde_json::Value,
        message: impl Into<String>,
    ) {
        self.snapshot = Some(snapshot);
        self.raw_results = Some(raw_results);
        self.open_panels.clear();
        self.active_tabs.clear();
        self.phase = Phase::Results;
        self.show_banner(BannerKind::Success, message);
    }

    /// Previous results stay in memory so they can still be exported.
    pub fn finish_with_error(&mut self, message: impl Into<String>) {
        self.phase = Phase::Error;
        self.show_banner(BannerKind::Error, message);
    }

    /// Replaces whatever banner is showing.
    pub fn show_banner(&mut self, kind: BannerKind, message: impl Into<String>) {
        self.banner = Some(Banner {
            kind,
            message: message.into(),
            raised_at: Instant::now(),
        });
    }

    pub fn visible_banner(&self, now: Instant, ttl: Duration) -> Option<&Banner> {
        self.banner
            .as_ref()
            .filter(|banner| now.saturating_duration_since(banner.raised_at) < ttl)
    }

    /// Marks `control` busy; false if it already was.
    pub fn try_acquire(&mut self, control: Control) -> bool {
        self.busy.insert(control)
    }

    pub fn release(&mut self, control: Control) {
        self.busy.remove(&control);
    }

    pub fn is_busy(&self, control: Control) -> bool {
        self.busy.contains(&control)
    }

    pub fn busy_controls(&self) -> Vec<Control> {
        self.busy.iter().copied().collect()
    }

    /// Flips one timeslot panel and returns whether it is now open. Ids that
    /// name no date in the current results are ignored.
    pub fn toggle_panel(&mut self, panel_id: &str) -> bool {
        if self.open_panels.remove(panel_id) {
            false
        } else if self.has_panel(panel_id) {
            self.open_panels.insert(panel_id.to_string());
            true
        } else {
            false
        }
    }

    fn has_panel(&self, id: &str) -> bool {
        self.snapshot.as_ref().is_some_and(|snapshot| {
            snapshot.tours.iter().any(|tour| {
                tour.dates
                    .iter()
                    .any(|date| panel_id(&tour.guid, &date.date) == id)
            })
        })
    }

    pub fn is_panel_open(&self, panel_id: &str) -> bool {
        self.open_panels.contains(panel_id)
    }

    pub fn open_panels(&self) -> &HashSet<String> {
        &self.open_panels
    }

    pub fn select_tab(&mut self, tour_id: &str, tab: ResultsTab) {
        self.active_tabs.insert(tour_id.to_string(), tab);
    }

    pub fn active_tab(&self, tour_id: &str) -> ResultsTab {
        self.active_tabs.get(tour_id).copied().unwrap_or_default()
    }

    pub fn summary(&self, now: Instant, banner_ttl: Duration) -> SessionSummary {
        SessionSummary {
            phase: self.phase,
            source: self.source(),
            tours: self.snapshot.as_ref().map_or(0, |s| s.tours.len()),
            timestamp: self.snapshot.as_ref().map(|s| s.timestamp.clone()),
            banner: self.visible_banner(now, banner_ttl).map(|banner| BannerSummary {
                kind: banner.kind,
                message: banner.message.clone(),
            }),
            busy: self.busy_controls(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    pub phase: Phase,
    pub source: Option<DataSource>,
    pub tours: usize,
    pub timestamp: Option<String>,
    pub banner: Option<BannerSummary>,
    pub busy: Vec<Control>,
}

#[derive(Debug, Serialize)]
pub struct BannerSummary {
    pub kind: BannerKind,
    pub message: String,
}
