//! The canonical event record.
//!
//! Both source adapters produce these, the filter inspects them and the
//! event store writes them out. Nothing source-specific lives here.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::group::{Group, Policy};

/// Tri-state answer used for in-person and community participation fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
    Yes,
    No,
    #[default]
    Unknown,
}

impl From<Policy> for Attendance {
    fn from(policy: Policy) -> Self {
        match policy {
            Policy::All => Attendance::Yes,
            Policy::None => Attendance::No,
            Policy::Unspecified => Attendance::Unknown,
        }
    }
}

/// How attendees can take part in the event beyond watching.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CommunityParticipation {
    pub at_event: Attendance,
    pub at_event_audience_audio: Attendance,
    pub at_event_audience_text: Attendance,
}

/// A normalized event, ready to be filtered and written.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    /// Stable identifier derived from the source; also the file name.
    pub id: String,
    pub title: String,
    pub group_id: String,
    pub timezone_name: String,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    pub url: String,
    pub cancelled: bool,
    /// Always true for events created by this tool.
    pub imported: bool,
    pub in_person: Attendance,
    pub community_participation: CommunityParticipation,
    pub country: Option<String>,
    pub place: Option<String>,
    pub code_of_conduct_url: Option<String>,
    /// Stored as the document body rather than in front matter.
    pub description: String,
}

impl Event {
    /// Build an event with every group-derived field already applied.
    ///
    /// Source adapters set `url`, `cancelled` and any overrides afterwards.
    pub fn new(
        group: &Group,
        id: String,
        title: String,
        description: String,
        start_at: DateTime<FixedOffset>,
        end_at: DateTime<FixedOffset>,
    ) -> Self {
        let mut event = Event {
            id,
            title,
            group_id: group.id.clone(),
            timezone_name: group.timezone_name().to_string(),
            start_at,
            end_at,
            url: String::new(),
            cancelled: false,
            imported: true,
            in_person: Attendance::Unknown,
            community_participation: CommunityParticipation::default(),
            country: None,
            place: None,
            code_of_conduct_url: None,
            description,
        };
        event.apply_group_fields(group);
        event
    }

    /// Copy location details and participation policies from the group.
    pub fn apply_group_fields(&mut self, group: &Group) {
        self.country = non_empty(group.country.as_deref());
        self.place = non_empty(group.place.as_deref());
        self.code_of_conduct_url = non_empty(group.code_of_conduct_url.as_deref());

        self.in_person = group.in_person.into();
        self.community_participation = CommunityParticipation {
            at_event: group.community_participation_at_event.into(),
            at_event_audience_audio: group.community_participation_at_event_audience_audio.into(),
            at_event_audience_text: group.community_participation_at_event_audience_text.into(),
        };
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}

/// Validate a source-derived id before it is used as a file name.
pub(crate) fn is_safe_id(id: &str) -> bool {
    !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\'])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2099, 1, 1, hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_group_policies_map_to_attendance() {
        let group = Group {
            id: "rustaceans".to_string(),
            country: Some("GB".to_string()),
            place: Some(String::new()),
            in_person: Policy::All,
            community_participation_at_event: Policy::None,
            community_participation_at_event_audience_text: Policy::Unspecified,
            community_participation_at_event_audience_audio: Policy::All,
            ..Default::default()
        };

        let event = Event::new(&group, "1".into(), "T".into(), "D".into(), at(10), at(11));

        assert_eq!(event.group_id, "rustaceans");
        assert_eq!(event.timezone_name, "UTC");
        assert_eq!(event.country.as_deref(), Some("GB"));
        assert_eq!(event.place, None, "empty group fields are not copied");
        assert_eq!(event.in_person, Attendance::Yes);
        assert_eq!(event.community_participation.at_event, Attendance::No);
        assert_eq!(event.community_participation.at_event_audience_text, Attendance::Unknown);
        assert_eq!(event.community_participation.at_event_audience_audio, Attendance::Yes);
        assert!(event.imported);
        assert!(!event.cancelled);
    }

    #[test]
    fn test_safe_ids() {
        assert!(is_safe_id("abc-123"));
        assert!(!is_safe_id(""));
        assert!(!is_safe_id(".."));
        assert!(!is_safe_id("a/b"));
        assert!(!is_safe_id("a\\b"));
    }
}
