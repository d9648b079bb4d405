//! Per-group rules deciding which normalized events get written.

use chrono::{DateTime, FixedOffset, Utc};

/// Why an event was or wasn't imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accept,
    /// The event ended before now.
    Past,
    /// Matched this exclude keyword.
    Excluded(String),
    /// The group has include keywords and none of them matched.
    NotIncluded,
}

impl Decision {
    pub fn is_accept(&self) -> bool {
        matches!(self, Decision::Accept)
    }
}

/// A group's include/exclude keywords.
///
/// Matching is a case-sensitive substring test against the title and the
/// description. Excludes are checked first, so an event matching both lists
/// is rejected.
#[derive(Debug, Clone, Default)]
pub struct KeywordRules {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl KeywordRules {
    pub fn new(include: Vec<String>, exclude: Vec<String>) -> Self {
        KeywordRules { include, exclude }
    }

    pub fn decide(
        &self,
        title: &str,
        description: &str,
        end_at: DateTime<FixedOffset>,
        now: DateTime<Utc>,
    ) -> Decision {
        if end_at < now {
            return Decision::Past;
        }

        let mentions = |keyword: &String| {
            title.contains(keyword.as_str()) || description.contains(keyword.as_str())
        };

        if let Some(keyword) = self.exclude.iter().find(|k| mentions(*k)) {
            return Decision::Excluded(keyword.clone());
        }

        if self.include.is_empty() || self.include.iter().any(mentions) {
            Decision::Accept
        } else {
            Decision::NotIncluded
        }
    }

    pub fn should_import(
        &self,
        title: &str,
        description: &str,
        end_at: DateTime<FixedOffset>,
        now: DateTime<Utc>,
    ) -> bool {
        self.decide(title, description, end_at, now).is_accept()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2030, 5, 1, 12, 0, 0).unwrap()
    }

    fn future() -> DateTime<FixedOffset> {
        (now() + Duration::days(7)).fixed_offset()
    }

    fn rules(include: &[&str], exclude: &[&str]) -> KeywordRules {
        KeywordRules::new(
            include.iter().map(|s| s.to_string()).collect(),
            exclude.iter().map(|s| s.to_string()).collect(),
        )
    }

    #[test]
    fn test_past_events_rejected_regardless_of_keywords() {
        let rules = rules(&["meetup"], &[]);
        let ended = (now() - Duration::seconds(1)).fixed_offset();

        assert_eq!(rules.decide("meetup", "meetup", ended, now()), Decision::Past);
        assert_eq!(KeywordRules::default().decide("x", "y", ended, now()), Decision::Past);
    }

    #[test]
    fn test_event_ending_now_is_not_past() {
        let rules = KeywordRules::default();

        assert!(rules.should_import("t", "d", now().fixed_offset(), now()));
    }

    #[test]
    fn test_exclude_takes_precedence_over_include() {
        let rules = rules(&["meetup"], &["Cancelled"]);

        assert_eq!(
            rules.decide("Cancelled meetup", "", future(), now()),
            Decision::Excluded("Cancelled".to_string())
        );
    }

    #[test]
    fn test_exclude_is_case_sensitive() {
        let rules = rules(&["meetup"], &["cancelled"]);

        assert!(rules.should_import("Cancelled meetup", "", future(), now()));
    }

    #[test]
    fn test_exclude_matches_description() {
        let rules = rules(&[], &["sponsored"]);

        assert!(!rules.should_import("Talk night", "A sponsored session", future(), now()));
    }

    #[test]
    fn test_include_requires_a_match() {
        let rules = rules(&["Rust", "WebAssembly"], &[]);

        assert!(rules.should_import("Intro to WebAssembly", "", future(), now()));
        assert!(rules.should_import("Talks", "All about Rust", future(), now()));
        assert_eq!(rules.decide("Python night", "", future(), now()), Decision::NotIncluded);
    }

    #[test]
    fn test_empty_include_accepts() {
        let rules = rules(&[], &["private"]);

        assert_eq!(rules.decide("Anything", "at all", future(), now()), Decision::Accept);
    }
}
