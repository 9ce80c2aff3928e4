use crate::errors::CookieError;
use crate::models::Cookie;
use regex::Regex;
use std::sync::LazyLock;

static FIELD_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t+|\s{2,}").expect("static cookie separator regex"));

const SECURE_NAMES: [&str; 2] = ["octofence-waap-id", "octofence-waap-sessid"];

/// Outcome of normalizing pasted cookie text.
#[derive(Debug, Clone, PartialEq)]
pub enum CookieConversion {
    /// The text already parses as JSON and is kept verbatim.
    AlreadyStructured,
    Converted { cookies: Vec<Cookie>, json: String },
}

/// Normalizes cookie text copied from the browser's developer tools.
///
/// JSON input is left alone. Anything else is read as a table, one cookie
/// per line with `name`, `value` and `domain` in the first three columns, and
/// filtered to the cookies the ticketing site relies on.
pub fn normalize_cookie_text(text: &str) -> Result<CookieConversion, CookieError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CookieError::Empty);
    }

    if is_structured(text) {
        return Ok(CookieConversion::AlreadyStructured);
    }

    let cookies = parse_cookie_table(text);
    if cookies.is_empty() {
        return Err(CookieError::NoMatchingCookies);
    }

    let json = serde_json::to_string_pretty(&cookies)?;
    Ok(CookieConversion::Converted { cookies, json })
}

pub fn is_structured(text: &str) -> bool {
    serde_json::from_str::<serde_json::Value>(text.trim()).is_ok()
}

pub fn parse_cookie_table(text: &str) -> Vec<Cookie> {
    text.lines().filter_map(parse_cookie_line).collect()
}

fn parse_cookie_line(line: &str) -> Option<Cookie> {
    // Header rows copied along with the table.
    if line.trim().is_empty() || line.contains("Name") || line.contains("Domain") {
        return None;
    }

    let mut fields = FIELD_SEPARATOR.split(line);
    let name = fields.next()?.trim();
    let value = fields.next()?.trim();
    let domain = fields.next()?.trim();

    if name.is_empty() || value.is_empty() || !is_relevant(name, domain) {
        return None;
    }

    Some(Cookie {
        name: name.to_string(),
        value: value.to_string(),
        domain: domain.to_string(),
        path: "/".to_string(),
        secure: SECURE_NAMES.iter().any(|secure| name.contains(secure)),
        http_only: SECURE_NAMES.contains(&name) || name == "qtrans_front_language",
        same_site: "Lax".to_string(),
    })
}

fn is_relevant(name: &str, domain: &str) -> bool {
    domain.contains("colosseo")
        || name.contains("octofence")
        || name.contains("_ga")
        || name == "PHPSESSID"
        || name == "qtrans_front_language"
        || name.contains("cookielawinfo")
}

/// Turns a stored-cookie payload into the text shown in the cookie box.
///
/// The backend sends either pre-serialized JSON text or a cookie array.
pub fn cookie_payload_text(payload: &serde_json::Value) -> Result<String, serde_json::Error> {
    match payload {
        serde_json::Value::String(text) => Ok(text.clone()),
        other => serde_json::to_string_pretty(other),
    }
}
