//! Source adapters that turn fetched documents into canonical events.
//!
//! A group's `import_type` picks the adapter. Each adapter returns one result
//! per source event, in document order, so a single malformed event can be
//! reported without losing the rest of the document.

pub mod eventbrite;
pub mod ical;

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use chrono_tz::Tz;

use crate::error::{ImportError, ImportResult};
use crate::event::Event;
use crate::group::{Group, ImportType};

/// Output of normalizing one source document.
#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub events: Vec<ImportResult<Event>>,
    /// Source entries deliberately ignored (e.g. onsite-only Eventbrite events).
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalizer {
    Ical,
    EventbriteOrganisation,
}

impl Normalizer {
    /// The adapter for an import type, or `None` if we can't import it.
    pub fn for_import_type(import_type: &ImportType) -> Option<Self> {
        match import_type {
            ImportType::Ical => Some(Normalizer::Ical),
            ImportType::EventbriteOrganisation => Some(Normalizer::EventbriteOrganisation),
            ImportType::Unsupported(_) => None,
        }
    }

    pub fn normalize(&self, payload: &str, group: &Group) -> ImportResult<NormalizedBatch> {
        match self {
            Normalizer::Ical => ical::normalize(payload, group),
            Normalizer::EventbriteOrganisation => eventbrite::normalize(payload, group),
        }
    }
}

/// Interpret a wall-clock time in `tz`.
///
/// Ambiguous times (clocks going back) resolve to the earlier instant.
/// Times skipped by a DST change don't exist and are rejected.
pub(crate) fn localize(tz: Tz, naive: NaiveDateTime) -> ImportResult<DateTime<FixedOffset>> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt.fixed_offset()),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.fixed_offset()),
        LocalResult::None => Err(ImportError::Format(format!(
            "{} does not exist in timezone {}",
            naive,
            tz.name()
        ))),
    }
}

pub(crate) fn start_of_day(tz: Tz, date: NaiveDate) -> ImportResult<DateTime<FixedOffset>> {
    localize(tz, date.and_time(NaiveTime::MIN))
}

pub(crate) fn end_of_day(tz: Tz, date: NaiveDate) -> ImportResult<DateTime<FixedOffset>> {
    let end = NaiveTime::from_hms_opt(23, 59, 59)
        .ok_or_else(|| ImportError::Format("invalid end of day".into()))?;
    localize(tz, date.and_time(end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_dates_expand_in_group_timezone() {
        let tz: Tz = "Europe/London".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 6, 1).unwrap();

        assert_eq!(start_of_day(tz, date).unwrap().to_rfc3339(), "2030-06-01T00:00:00+01:00");
        assert_eq!(end_of_day(tz, date).unwrap().to_rfc3339(), "2030-06-01T23:59:59+01:00");
    }

    #[test]
    fn test_localize_rejects_dst_gap() {
        let tz: Tz = "Europe/London".parse().unwrap();
        let gap = NaiveDate::from_ymd_opt(2030, 3, 31)
            .unwrap()
            .and_hms_opt(1, 30, 0)
            .unwrap();

        assert!(matches!(localize(tz, gap), Err(ImportError::Format(_))));
    }

    #[test]
    fn test_unsupported_import_type_has_no_normalizer() {
        assert_eq!(Normalizer::for_import_type(&ImportType::Ical), Some(Normalizer::Ical));
        assert_eq!(
            Normalizer::for_import_type(&ImportType::Unsupported("meetup".into())),
            None
        );
    }
}
