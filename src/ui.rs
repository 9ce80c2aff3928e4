use crate::availability::{AvailabilitySnapshot, TourView};
use crate::session::{BannerKind, Control, DashboardSession, Phase, ResultsTab};
use crate::stats::{hourly_demand_rows, lead_time_rows};
use crate::table::{build_rows, sanitize_id, DateRow};
use chrono::{DateTime, Local};
use std::fmt::Write as _;
use std::time::{Duration, Instant};

pub fn render_index(session: &DashboardSession, now: Instant, banner_ttl: Duration) -> String {
    let loading = session.phase == Phase::Loading;
    // Reload while something is pending so the page picks up the outcome.
    let auto_refresh = if loading || session.is_busy(Control::Refresh) {
        r#"<meta http-equiv="refresh" content="5" />"#
    } else {
        ""
    };

    INDEX_HTML
        .replace("{{AUTO_REFRESH}}", auto_refresh)
        .replace("{{BANNER}}", &render_banner(session, now, banner_ttl))
        .replace("{{QUERY_DISABLED}}", disabled(session.is_busy(Control::Query)))
        .replace("{{REFRESH_DISABLED}}", disabled(session.is_busy(Control::Refresh)))
        .replace(
            "{{EXPORT_DISABLED}}",
            disabled(session.raw_results.is_none() || session.is_busy(Control::Export)),
        )
        .replace("{{LOADING}}", if loading { "loading active" } else { "loading" })
        .replace("{{RESULTS}}", &render_results(session))
        .replace("{{COOKIES}}", &escape_html(&session.cookies_text))
}

fn disabled(flag: bool) -> &'static str {
    if flag { "disabled" } else { "" }
}

fn render_banner(session: &DashboardSession, now: Instant, ttl: Duration) -> String {
    match session.visible_banner(now, ttl) {
        None => String::new(),
        Some(banner) => {
            let class = match banner.kind {
                BannerKind::Success => "alert alert-success",
                BannerKind::Error => "alert alert-error",
            };
            let remaining = ttl.saturating_sub(now.saturating_duration_since(banner.raised_at));
            format!(
                r#"<div class="{class}" role="status" data-dismiss-ms="{}">{}</div>"#,
                remaining.as_millis(),
                escape_html(&banner.message)
            )
        }
    }
}

fn render_results(session: &DashboardSession) -> String {
    let Some(snapshot) = session.snapshot.as_ref() else {
        return String::new();
    };
    if session.phase != Phase::Results {
        return String::new();
    }

    let mut html = String::new();
    html.push_str(&render_summary(snapshot));
    for tour in &snapshot.tours {
        html.push_str(&render_tour(tour, session));
    }
    let _ = write!(
        html,
        r#"<p class="timestamp">Last query: {} · source: {}</p>"#,
        escape_html(&display_timestamp(&snapshot.timestamp)),
        snapshot.source.label()
    );
    html
}

fn render_summary(snapshot: &AvailabilitySnapshot) -> String {
    format!(
        r#"<section class="panel">
        <div class="stat"><span class="label">Tours queried</span><span class="value">{}</span></div>
        <div class="stat"><span class="label">Months queried</span><span class="value">{}</span></div>
      </section>"#,
        snapshot.tours.len(),
        snapshot.months.len()
    )
}

fn render_tour(tour: &TourView, session: &DashboardSession) -> String {
    let tour_id = sanitize_id(&tour.key);
    let tab = session.active_tab(&tour_id);
    let tab_button = |target: ResultsTab, label: &str| {
        let class = if tab == target { "tab active" } else { "tab" };
        format!(
            r#"<form method="post" action="/tabs/{tour_id}/{}"><button class="{class}" type="submit">{label}</button></form>"#,
            target.as_str()
        )
    };

    let body = match tab {
        ResultsTab::Dates => render_date_table(&build_rows(tour, session.open_panels())),
        ResultsTab::Stats => render_statistics(tour),
    };

    format!(
        r#"<section class="tour-section" id="{tour_id}">
        <div class="tour-header">
          <h2>{name}</h2>
          <p class="subtitle"><strong>{dates}</strong> dates available · <strong>{spots}</strong> total spots</p>
        </div>
        <div class="tabs">{dates_tab}{stats_tab}</div>
        <div class="tab-content" id="{tour_id}_{tab_name}">{body}</div>
      </section>"#,
        name = escape_html(&tour.name),
        dates = format_count(u64::from(tour.total_dates)),
        spots = format_count(tour.total_spots),
        dates_tab = tab_button(ResultsTab::Dates, "By date"),
        stats_tab = tab_button(ResultsTab::Stats, "Statistics"),
        tab_name = tab.as_str(),
    )
}

fn render_date_table(rows: &[DateRow<'_>]) -> String {
    let mut html = String::from(
        r#"<div class="table-container"><table>
        <thead><tr><th>Date</th><th>Day</th><th>Available spots</th><th>% Booked</th><th>Status</th><th>Timeslots</th></tr></thead>
        <tbody>"#,
    );

    for row in rows {
        let date = row.availability;
        let _ = write!(
            html,
            r#"<tr class="expandable-row">
            <td>{}</td><td>{}</td>
            <td><strong>{}</strong> / {}</td>
            <td>{}%</td>
            <td><span class="badge badge-{}">{}</span></td>
            <td><form method="post" action="/panels/{}/toggle"><button class="expand" type="submit">{} {} timeslots</button></form></td>
          </tr>
          <tr><td colspan="6" class="{}" id="timeslots_{}">{}</td></tr>"#,
            escape_html(&date.date),
            escape_html(&date.day_of_week),
            format_count(u64::from(date.spots_available)),
            format_count(u64::from(date.spots_total)),
            format_percent(date.occupancy_percent),
            date.status_level.css_class(),
            escape_html(&date.status_label),
            row.panel_id,
            if row.expanded { "&#9652;" } else { "&#9662;" },
            row.timeslot_count,
            if row.expanded { "timeslots-detail active" } else { "timeslots-detail" },
            row.panel_id,
            render_timeslot_grid(row),
        );
    }

    html.push_str("</tbody></table></div>");
    html
}

fn render_timeslot_grid(row: &DateRow<'_>) -> String {
    if row.timeslots.is_empty() {
        return r#"<p class="hint">No detailed timeslots available</p>"#.to_string();
    }

    let mut html = String::from(r#"<div class="timeslots-grid">"#);
    for slot in &row.timeslots {
        let _ = write!(
            html,
            r#"<div class="timeslot-card {}"><div class="timeslot-hour">{}</div><div class="timeslot-spots">{} / {}</div><div class="timeslot-spots">{}%</div></div>"#,
            slot.class.css_class(),
            escape_html(&slot.hour),
            slot.capacity_remaining,
            slot.capacity_original,
            format_percent(slot.occupancy_percent),
        );
    }
    html.push_str("</div>");
    html
}

fn render_statistics(tour: &TourView) -> String {
    let mut hourly = String::new();
    for row in hourly_demand_rows(&tour.statistics) {
        let _ = write!(
            hourly,
            r#"<div class="stats-row"><span class="stats-label">{}</span><span class="stats-value">{}% sold out</span></div>
            <div class="progress-bar"><div class="progress-fill" style="width: {}%"></div></div>
            <p class="stats-detail">{} of {} days · average occupancy {}%</p>"#,
            escape_html(&row.hour),
            format_percent(row.percent_sold_out),
            format_percent(row.bar_width),
            row.sold_out_count,
            row.total_count,
            format_percent(row.average_occupancy),
        );
    }

    let mut lead_times = String::new();
    for entry in lead_time_rows(&tour.statistics) {
        let _ = write!(
            lead_times,
            r#"<div class="stats-row"><span class="stats-label">{}</span><span class="stats-value">{} days</span></div>
            <p class="stats-detail">{} of {} timeslots sold out ({}%)</p>"#,
            escape_html(&entry.fecha),
            entry.dias_adelantados,
            entry.timeslots_agotados,
            entry.total_timeslots,
            format_percent(entry.porcentaje_agotado),
        );
    }

    format!(
        r#"<div class="stats-grid">
        <div class="stats-card"><h3>Most demanded hours</h3><p class="hint">Hours that sell out most often (% of days sold out)</p>{hourly}</div>
        <div class="stats-card"><h3>Days in advance</h3><p class="hint">Future dates that already have sold-out timeslots</p>{lead_times}</div>
      </div>"#
    )
}

pub fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Thousands-separated integer, e.g. `12,500`.
pub fn format_count(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// One decimal, dropped when it is zero.
pub fn format_percent(value: f64) -> String {
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{rounded:.0}")
    } else {
        format!("{rounded:.1}")
    }
}

/// RFC 3339 timestamps are shown in local time; anything else verbatim.
pub fn display_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1.0" />
  {{AUTO_REFRESH}}
  <title>Colosseum Availability</title>
  <style>
    :root {
      --bg: #f4efe6;
      --ink: #2b2a28;
      --muted: #6f6a65;
      --accent: #b5542f;
      --accent-2: #2f4858;
      --card: rgba(255, 255, 255, 0.9);
      --ok: #2d7a4b;
      --warn: #c98a1b;
      --bad: #c63b2b;
    }

    * { box-sizing: border-box; }

    body {
      margin: 0;
      background: var(--bg);
      color: var(--ink);
      font-family: "Trebuchet MS", sans-serif;
      padding: 28px 16px 48px;
    }

    .app {
      max-width: 1100px;
      margin: 0 auto;
      background: var(--card);
      border-radius: 24px;
      padding: 32px;
      display: grid;
      gap: 24px;
    }

    h1 { margin: 0; font-family: Georgia, serif; }
    .subtitle, .hint { margin: 0; color: var(--muted); }
    textarea { width: 100%; min-height: 160px; font-family: monospace; font-size: 0.85rem; }

    .actions { display: flex; flex-wrap: wrap; gap: 10px; }
    .actions form { margin: 0; }

    button {
      border: none;
      border-radius: 999px;
      padding: 10px 18px;
      font-weight: 600;
      cursor: pointer;
      background: var(--accent-2);
      color: white;
    }
    button.primary { background: var(--accent); }
    button[disabled] { opacity: 0.45; cursor: not-allowed; }

    .alert { padding: 12px 16px; border-radius: 12px; }
    .alert-success { background: #e3f3e8; color: var(--ok); }
    .alert-error { background: #fbe4e1; color: var(--bad); }

    .loading { display: none; color: var(--muted); }
    .loading.active { display: block; }

    .panel { display: grid; grid-template-columns: repeat(auto-fit, minmax(180px, 1fr)); gap: 16px; }
    .stat { background: white; border-radius: 16px; padding: 16px; display: grid; gap: 6px; }
    .stat .label { font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.1em; color: var(--muted); }
    .stat .value { font-size: 1.6rem; font-weight: 600; color: var(--accent-2); }

    .tour-section { background: white; border-radius: 18px; padding: 20px; display: grid; gap: 14px; }
    .tour-header h2 { margin: 0 0 4px; }
    .tabs { display: flex; gap: 6px; }
    .tabs form { margin: 0; }
    .tab { background: transparent; color: var(--muted); }
    .tab.active { background: var(--accent-2); color: white; }

    table { width: 100%; border-collapse: collapse; font-size: 0.92rem; }
    th, td { padding: 8px 10px; text-align: left; border-bottom: 1px solid #eee; }
    button.expand { background: transparent; color: var(--accent-2); padding: 4px 8px; }

    .badge { padding: 3px 10px; border-radius: 999px; font-size: 0.8rem; }
    .badge-available { background: #e3f3e8; color: var(--ok); }
    .badge-moderate { background: #fff3d6; color: var(--warn); }
    .badge-low { background: #ffe6cc; color: #b35c00; }
    .badge-sold-out { background: #fbe4e1; color: var(--bad); }

    .timeslots-detail { display: none; background: #faf8f4; }
    .timeslots-detail.active { display: table-cell; }
    .timeslots-grid { display: grid; grid-template-columns: repeat(auto-fill, minmax(110px, 1fr)); gap: 8px; }
    .timeslot-card { border-radius: 10px; padding: 8px; text-align: center; border: 1px solid #ddd; }
    .timeslot-card.available { border-color: var(--ok); }
    .timeslot-card.partial { border-color: var(--warn); }
    .timeslot-card.sold-out { border-color: var(--bad); color: var(--bad); }
    .timeslot-hour { font-weight: 600; }

    .stats-grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(280px, 1fr)); gap: 16px; }
    .stats-card { border: 1px solid #eee; border-radius: 14px; padding: 16px; }
    .stats-row { display: flex; justify-content: space-between; margin-top: 10px; }
    .stats-detail { margin: 4px 0 0; color: var(--muted); font-size: 0.85rem; }
    .progress-bar { height: 6px; background: #eee; border-radius: 3px; }
    .progress-fill { height: 6px; background: var(--accent); border-radius: 3px; }
    .timestamp { color: var(--muted); font-size: 0.85rem; }
  </style>
</head>
<body>
  <main class="app">
    <header>
      <h1>Colosseum Availability</h1>
      <p class="subtitle">Ticket availability per date and timeslot for the next six months.</p>
    </header>

    {{BANNER}}

    <section>
      <form id="cookies-form" method="post" action="/query">
        <textarea name="cookies" placeholder="Paste the cookies copied from the browser developer tools">{{COOKIES}}</textarea>
        <div class="actions">
          <button class="primary" type="submit" {{QUERY_DISABLED}}>Check availability</button>
          <button type="submit" formaction="/cookies/convert">Convert format</button>
          <button type="submit" formaction="/cookies/save">Save cookies</button>
        </div>
      </form>
    </section>

    <section class="actions">
      <form method="post" action="/cookies/load"><button type="submit">Load cookies from file</button></form>
      <form method="post" action="/refresh"><button type="submit" {{REFRESH_DISABLED}}>Refresh data</button></form>
      <form method="post" action="/reload"><button type="submit">Reload cached data</button></form>
      <form method="post" action="/export"><button type="submit" {{EXPORT_DISABLED}}>Export to Excel</button></form>
      <form method="post" action="/history/save"><button type="submit" {{EXPORT_DISABLED}}>Save history</button></form>
      <form method="get" action="/history/download"><button type="submit">Download history</button></form>
    </section>

    <p class="{{LOADING}}">Checking availability...</p>

    {{RESULTS}}
  </main>

  <script>
    document.querySelectorAll('[data-dismiss-ms]').forEach((el) => {
      setTimeout(() => el.remove(), Number(el.dataset.dismissMs));
    });
  </script>
</body>
</html>
"#;
