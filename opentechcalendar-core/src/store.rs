//! The markdown event store.
//!
//! Each event lives at `<data_directory>/event/<group_id>/<event_id>.md`: a
//! YAML front matter block followed by the description as the body.

use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::constants::EVENT_DIR;
use crate::error::{ImportError, ImportResult};
use crate::event::{Attendance, CommunityParticipation, Event, is_safe_id};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%:z";

/// Keys whose plain values YAML 1.1 readers load as booleans or timestamps.
const TOP_LEVEL_QUOTED: [&str; 3] = ["end_at", "in_person", "start_at"];
const PARTICIPATION_KEY: &str = "community_participation:";

/// Front matter keys, declared alphabetically so output is stable.
#[derive(Serialize)]
struct FrontMatter<'a> {
    cancelled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    code_of_conduct_url: Option<&'a str>,
    community_participation: &'a CommunityParticipation,
    #[serde(skip_serializing_if = "Option::is_none")]
    country: Option<&'a str>,
    end_at: String,
    group: &'a str,
    imported: bool,
    in_person: Attendance,
    #[serde(skip_serializing_if = "Option::is_none")]
    place: Option<&'a str>,
    start_at: String,
    timezone: &'a str,
    title: &'a str,
    url: &'a str,
}

impl<'a> From<&'a Event> for FrontMatter<'a> {
    fn from(event: &'a Event) -> Self {
        FrontMatter {
            cancelled: event.cancelled,
            code_of_conduct_url: event.code_of_conduct_url.as_deref(),
            community_participation: &event.community_participation,
            country: event.country.as_deref(),
            end_at: format_timestamp(&event.end_at),
            group: &event.group_id,
            imported: event.imported,
            in_person: event.in_person,
            place: event.place.as_deref(),
            start_at: format_timestamp(&event.start_at),
            timezone: &event.timezone_name,
            title: &event.title,
            url: &event.url,
        }
    }
}

fn format_timestamp(dt: &DateTime<FixedOffset>) -> String {
    dt.format(TIMESTAMP_FORMAT).to_string()
}

/// Render the full file contents for an event.
pub fn render_event(event: &Event) -> ImportResult<String> {
    let front_matter = serde_yaml::to_string(&FrontMatter::from(event))
        .map_err(|e| ImportError::Serialization(e.to_string()))?;

    Ok(format!(
        "---\n{}---\n\n\n{}\n",
        quote_ambiguous_scalars(&front_matter),
        event.description
    ))
}

/// Single-quote timestamps and yes/no values the way the existing event files
/// have them, so they stay strings for every YAML reader.
///
/// Only touches our own keys: top-level ones at column 0 and the attendance
/// values nested under `community_participation`. Block scalar lines of a
/// multi-line title are indented and never match.
fn quote_ambiguous_scalars(yaml: &str) -> String {
    let mut out = String::with_capacity(yaml.len() + 16);
    let mut in_participation = false;

    for line in yaml.lines() {
        let quoted = match line.strip_prefix("  ") {
            Some(entry) if in_participation => quote_value(entry).map(|e| format!("  {e}")),
            Some(_) => None,
            None => {
                in_participation = line == PARTICIPATION_KEY;
                line.split_once(": ")
                    .filter(|(key, _)| TOP_LEVEL_QUOTED.contains(key))
                    .and_then(|_| quote_value(line))
            }
        };

        out.push_str(quoted.as_deref().unwrap_or(line));
        out.push('\n');
    }

    out
}

fn quote_value(entry: &str) -> Option<String> {
    let (key, value) = entry.split_once(": ")?;
    if value.starts_with(['\'', '"']) {
        return None;
    }
    Some(format!("{key}: '{value}'"))
}

#[derive(Clone, Debug)]
pub struct EventStore {
    data_directory: PathBuf,
}

impl EventStore {
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        EventStore {
            data_directory: data_directory.into(),
        }
    }

    pub fn data_directory(&self) -> &Path {
        &self.data_directory
    }

    pub fn group_dir(&self, group_id: &str) -> PathBuf {
        self.data_directory.join(EVENT_DIR).join(group_id)
    }

    pub fn event_path(&self, event: &Event) -> PathBuf {
        self.group_dir(&event.group_id).join(format!("{}.md", event.id))
    }

    /// Write an event, replacing any earlier import of the same event.
    pub fn write(&self, event: &Event) -> ImportResult<PathBuf> {
        if !is_safe_id(&event.group_id) || !is_safe_id(&event.id) {
            return Err(ImportError::Format(format!(
                "Refusing to write event '{}' of group '{}'",
                event.id, event.group_id
            )));
        }

        let dir = self.group_dir(&event.group_id);
        std::fs::create_dir_all(&dir).map_err(|source| ImportError::Write {
            path: dir.clone(),
            source,
        })?;

        let path = self.event_path(event);
        let content = render_event(event)?;
        std::fs::write(&path, content).map_err(|source| ImportError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(path)
    }
}
