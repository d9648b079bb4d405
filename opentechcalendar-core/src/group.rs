//! Group records as stored in the configuration database.

use std::fmt;

use chrono_tz::Tz;

use crate::constants::DEFAULT_TIMEZONE;
use crate::error::{ImportError, ImportResult};

/// Which source adapter a group is imported with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportType {
    Ical,
    EventbriteOrganisation,
    /// A value we don't know how to import. Such groups are skipped.
    Unsupported(String),
}

impl ImportType {
    /// Parse the raw `field_import_type` column. Empty or NULL means "not imported".
    pub fn from_field(value: Option<&str>) -> Option<Self> {
        match value.map(str::trim) {
            None | Some("") => None,
            Some("ical") => Some(ImportType::Ical),
            Some("eventbrite-organisation") => Some(ImportType::EventbriteOrganisation),
            Some(other) => Some(ImportType::Unsupported(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ImportType::Ical => "ical",
            ImportType::EventbriteOrganisation => "eventbrite-organisation",
            ImportType::Unsupported(other) => other,
        }
    }
}

impl fmt::Display for ImportType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A group-wide policy such as "are this group's events in person?".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Policy {
    All,
    None,
    /// Mixed, or simply not filled in.
    #[default]
    Unspecified,
}

impl Policy {
    pub fn from_field(value: Option<&str>) -> Self {
        match value {
            Some("all") => Policy::All,
            Some("none") => Policy::None,
            _ => Policy::Unspecified,
        }
    }
}

/// A configured organiser whose events we import.
#[derive(Debug, Clone, Default)]
pub struct Group {
    pub id: String,
    pub import_type: Option<ImportType>,
    pub import_url: String,
    /// The group's own web page, used when a source event has no URL.
    pub url: Option<String>,
    /// IANA timezone name as stored. Use [`Group::timezone_name`] for the effective value.
    pub timezone: Option<String>,
    pub place: Option<String>,
    pub country: Option<String>,
    pub code_of_conduct_url: Option<String>,
    pub in_person: Policy,
    pub community_participation_at_event: Policy,
    pub community_participation_at_event_audience_text: Policy,
    pub community_participation_at_event_audience_audio: Policy,
}

impl Group {
    /// Timezone name, falling back to UTC when unset.
    pub fn timezone_name(&self) -> &str {
        match self.timezone.as_deref().map(str::trim) {
            Some(tz) if !tz.is_empty() => tz,
            _ => DEFAULT_TIMEZONE,
        }
    }

    pub fn tz(&self) -> ImportResult<Tz> {
        let name = self.timezone_name();
        name.parse::<Tz>().map_err(|_| {
            ImportError::Config(format!("Unknown timezone '{}' for group '{}'", name, self.id))
        })
    }
}
