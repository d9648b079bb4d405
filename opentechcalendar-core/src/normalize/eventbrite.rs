//! Eventbrite organisation pages.
//!
//! Eventbrite embeds its event list as schema.org JSON-LD. We read the first
//! `ItemList` block on the page and import its online and mixed-attendance
//! events. The page exposes no end time, so start and end are the same
//! instant.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{NormalizedBatch, localize, start_of_day};
use crate::error::{ImportError, ImportResult};
use crate::event::{Attendance, Event, is_safe_id};
use crate::group::Group;

const JSON_LD_SELECTOR: &str = r#"script[type="application/ld+json"]"#;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsonLdEvent {
    name: Option<String>,
    description: Option<String>,
    url: Option<String>,
    start_date: Option<String>,
}

/// schema.org `eventAttendanceMode` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AttendanceMode {
    Online,
    Mixed,
    Offline,
}

impl AttendanceMode {
    /// Matches on the schema.org term so both http and https IRIs work.
    fn parse(value: &str) -> Option<Self> {
        match value.rsplit('/').next()? {
            "OnlineEventAttendanceMode" => Some(AttendanceMode::Online),
            "MixedEventAttendanceMode" => Some(AttendanceMode::Mixed),
            "OfflineEventAttendanceMode" => Some(AttendanceMode::Offline),
            _ => None,
        }
    }
}

pub fn normalize(payload: &str, group: &Group) -> ImportResult<NormalizedBatch> {
    let entries = item_list_elements(payload)?;

    let mut batch = NormalizedBatch::default();

    for entry in entries {
        let Some(item) = entry
            .get("item")
            .filter(|_| json_type(&entry) == Some("ListItem"))
            .filter(|item| json_type(item) == Some("Event"))
        else {
            batch.skipped += 1;
            continue;
        };

        let mode = item
            .get("eventAttendanceMode")
            .and_then(Value::as_str)
            .and_then(AttendanceMode::parse);
        let mode = match mode {
            Some(mode @ (AttendanceMode::Online | AttendanceMode::Mixed)) => mode,
            _ => {
                debug!(
                    group = %group.id,
                    name = ?item.get("name"),
                    "Skipping event that is not online"
                );
                batch.skipped += 1;
                continue;
            }
        };

        let event = JsonLdEvent::deserialize(item)
            .map_err(|e| ImportError::Format(format!("Unreadable Eventbrite event: {e}")))
            .and_then(|item| normalize_item(item, mode, group));
        batch.events.push(event);
    }

    Ok(batch)
}

fn json_type(value: &Value) -> Option<&str> {
    value.get("@type").and_then(Value::as_str)
}

/// Find the first JSON-LD block with an `itemListElement` array and return its entries.
fn item_list_elements(html: &str) -> ImportResult<Vec<Value>> {
    let selector = Selector::parse(JSON_LD_SELECTOR)
        .map_err(|e| ImportError::Format(format!("Bad selector: {e:?}")))?;
    let document = Html::parse_document(html);

    for script in document.select(&selector) {
        let text: String = script.text().collect();
        let mut data: Value = match serde_json::from_str(&text) {
            Ok(data) => data,
            Err(e) => {
                warn!(error = %e, "Ignoring JSON-LD block that is not valid JSON");
                continue;
            }
        };

        if let Some(Value::Array(entries)) = data.get_mut("itemListElement").map(Value::take) {
            return Ok(entries);
        }
    }

    Err(ImportError::Format(
        "No JSON-LD block with an itemListElement list found".into(),
    ))
}

fn normalize_item(item: JsonLdEvent, mode: AttendanceMode, group: &Group) -> ImportResult<Event> {
    let url = item
        .url
        .ok_or_else(|| ImportError::Format("Eventbrite event without url".into()))?;
    let id = id_from_url(&url)
        .ok_or_else(|| ImportError::Format(format!("Can't derive an id from '{url}'")))?;
    let title = item
        .name
        .ok_or_else(|| ImportError::Format(format!("Eventbrite event {id} has no name")))?;
    let start_date = item
        .start_date
        .ok_or_else(|| ImportError::Format(format!("Eventbrite event {id} has no startDate")))?;

    let start_at = parse_iso8601(&start_date, group)?;

    let mut event = Event::new(
        group,
        id,
        title,
        item.description.unwrap_or_default(),
        start_at,
        start_at,
    );
    event.url = url;
    event.in_person = match mode {
        AttendanceMode::Online => Attendance::No,
        _ => Attendance::Yes,
    };

    Ok(event)
}

/// The last path segment of an event URL, ignoring query, fragment and trailing slash.
fn id_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let id = path.trim_end_matches('/').rsplit('/').next()?;
    is_safe_id(id).then(|| id.to_string())
}

/// Offset timestamps are used as-is; anything without an offset is local to
/// the group, whose timezone is only needed in that case.
fn parse_iso8601(value: &str, group: &Group) -> ImportResult<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }

    let tz = group.tz()?;
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return localize(tz, naive);
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return start_of_day(tz, date);
    }

    Err(ImportError::Format(format!(
        "startDate '{value}' is not an ISO-8601 date or timestamp"
    )))
}
