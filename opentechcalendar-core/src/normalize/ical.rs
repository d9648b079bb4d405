//! iCalendar feeds, parsed with the icalendar crate's parser.

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use icalendar::{
    CalendarDateTime, DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};
use tracing::warn;

use super::{NormalizedBatch, end_of_day, localize, start_of_day};
use crate::error::{ImportError, ImportResult};
use crate::event::{Event, is_safe_id};
use crate::group::Group;

#[derive(Debug, Clone, Copy)]
enum Boundary {
    Start,
    End,
}

/// Normalize every VEVENT in the document, in order.
pub fn normalize(payload: &str, group: &Group) -> ImportResult<NormalizedBatch> {
    let tz = group.tz()?;
    let unfolded = unfold(payload);
    let calendar = read_calendar(&unfolded)
        .map_err(|e| ImportError::Format(format!("Could not parse calendar: {e}")))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let events = vevents
        .into_iter()
        .map(|vevent| normalize_vevent(vevent, group, tz))
        .collect();

    Ok(NormalizedBatch { events, skipped: 0 })
}

/// VEVENTs may sit at the top level or inside a VCALENDAR.
fn collect_vevents<'a>(components: &'a [Component<'a>], out: &mut Vec<&'a Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else {
            collect_vevents(&component.components, out);
        }
    }
}

fn normalize_vevent(vevent: &Component, group: &Group, tz: Tz) -> ImportResult<Event> {
    let uid = vevent
        .find_prop("UID")
        .map(|p| p.val.as_ref().trim())
        .ok_or_else(|| ImportError::Format("VEVENT without UID".into()))?;
    let id = uid.split('@').next().unwrap_or_default().to_string();
    if !is_safe_id(&id) {
        return Err(ImportError::Format(format!("Unusable UID '{uid}'")));
    }

    let start_prop = vevent
        .find_prop("DTSTART")
        .ok_or_else(|| ImportError::Format(format!("Event {id} has no DTSTART")))?;
    // Without DTEND the event ends on its start value.
    let end_prop = vevent.find_prop("DTEND").unwrap_or(start_prop);

    let start_at = resolve_time(start_prop, Boundary::Start, tz)
        .map_err(|e| ImportError::Format(format!("Start of event {id}: {e}")))?;
    let end_at = resolve_time(end_prop, Boundary::End, tz)
        .map_err(|e| ImportError::Format(format!("End of event {id}: {e}")))?;

    let title = text_prop(vevent, "SUMMARY");
    let description = text_prop(vevent, "DESCRIPTION");

    let mut event = Event::new(group, id, title, description, start_at, end_at);

    event.url = vevent
        .find_prop("URL")
        .map(|p| p.val.as_ref().trim().to_string())
        .filter(|url| !url.is_empty())
        .or_else(|| group.url.clone())
        .unwrap_or_default();
    event.cancelled = vevent
        .find_prop("STATUS")
        .is_some_and(|p| p.val.as_ref().trim() == "CANCELLED");

    Ok(event)
}

/// Timed values are kept as given; bare dates become the start or end of that day.
fn resolve_time(
    prop: &Property,
    boundary: Boundary,
    tz: Tz,
) -> Result<DateTime<FixedOffset>, String> {
    let value = DatePerhapsTime::try_from(prop)
        .map_err(|_| format!("'{}' is neither a date nor a date-time", prop.val.as_ref()))?;

    let resolved = match value {
        DatePerhapsTime::Date(date) => match boundary {
            Boundary::Start => start_of_day(tz, date),
            Boundary::End => end_of_day(tz, date),
        },
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            CalendarDateTime::Utc(dt) => Ok(dt.fixed_offset()),
            CalendarDateTime::Floating(naive) => localize(tz, naive),
            CalendarDateTime::WithTimezone { date_time, tzid } => {
                let zone = tzid.trim_matches('"').parse::<Tz>().unwrap_or_else(|_| {
                    warn!(
                        tzid = %tzid,
                        fallback = %tz.name(),
                        "Unknown TZID, using group timezone"
                    );
                    tz
                });
                localize(zone, date_time)
            }
        },
    };

    resolved.map_err(|e| e.to_string())
}

fn text_prop(vevent: &Component, name: &str) -> String {
    vevent
        .find_prop(name)
        .map(|p| unescape_text(p.val.as_ref()))
        .unwrap_or_default()
}

/// Undo RFC 5545 TEXT escaping.
fn unescape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Attendance;
    use crate::group::Policy;

    fn group(timezone: &str) -> Group {
        Group {
            id: "rust-london".to_string(),
            url: Some("https://example.org/rust-london".to_string()),
            timezone: Some(timezone.to_string()),
            ..Default::default()
        }
    }

    fn calendar(body: &str) -> String {
        format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\n{body}END:VCALENDAR\r\n")
    }

    fn only_event(batch: NormalizedBatch) -> Event {
        assert_eq!(batch.events.len(), 1);
        batch.events.into_iter().next().unwrap().expect("event should normalize")
    }

    #[test]
    fn test_bare_dates_span_whole_days_in_group_timezone() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
UID:abc123@example.org\r\n\
SUMMARY:Summer hack day\r\n\
DTSTART;VALUE=DATE:20300601\r\n\
DTEND;VALUE=DATE:20300602\r\n\
END:VEVENT\r\n",
        );

        let event = only_event(normalize(&ics, &group("Europe/London")).unwrap());

        assert_eq!(event.id, "abc123");
        assert_eq!(event.timezone_name, "Europe/London");
        assert_eq!(event.start_at.to_rfc3339(), "2030-06-01T00:00:00+01:00");
        assert_eq!(event.end_at.to_rfc3339(), "2030-06-02T23:59:59+01:00");
    }

    #[test]
    fn test_timed_values_are_kept() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
UID:timed@example.org\r\n\
SUMMARY:Evening talk\r\n\
DTSTART:20300115T180000Z\r\n\
DTEND;TZID=Europe/Berlin:20300115T210000\r\n\
END:VEVENT\r\n",
        );

        let event = only_event(normalize(&ics, &group("")).unwrap());

        assert_eq!(event.timezone_name, "UTC");
        assert_eq!(event.start_at.to_rfc3339(), "2030-01-15T18:00:00+00:00");
        assert_eq!(event.end_at.to_rfc3339(), "2030-01-15T21:00:00+01:00");
    }

    #[test]
    fn test_fields_and_fallback_url() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
UID:fields@example.org\r\n\
SUMMARY:Rust\\, Tea and Biscuits\r\n\
DESCRIPTION:First line\\nSecond line\r\n\
STATUS:CANCELLED\r\n\
DTSTART:20300115T180000Z\r\n\
DTEND:20300115T200000Z\r\n\
END:VEVENT\r\n",
        );
        let mut grp = group("UTC");
        grp.in_person = Policy::All;

        let event = only_event(normalize(&ics, &grp).unwrap());

        assert_eq!(event.title, "Rust, Tea and Biscuits");
        assert_eq!(event.description, "First line\nSecond line");
        assert_eq!(event.url, "https://example.org/rust-london");
        assert!(event.cancelled);
        assert_eq!(event.in_person, Attendance::Yes);
    }

    #[test]
    fn test_event_url_preferred_over_group_url() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
UID:withurl\r\n\
SUMMARY:Meetup\r\n\
URL:https://example.org/events/42\r\n\
DTSTART:20300115T180000Z\r\n\
DTEND:20300115T200000Z\r\n\
END:VEVENT\r\n",
        );

        let event = only_event(normalize(&ics, &group("UTC")).unwrap());

        assert_eq!(event.id, "withurl");
        assert_eq!(event.url, "https://example.org/events/42");
        assert!(!event.cancelled);
    }

    #[test]
    fn test_malformed_event_does_not_hide_others() {
        let ics = calendar(
            "BEGIN:VEVENT\r\n\
UID:broken@example.org\r\n\
SUMMARY:No start\r\n\
END:VEVENT\r\n\
BEGIN:VEVENT\r\n\
UID:fine@example.org\r\n\
SUMMARY:Has start\r\n\
DTSTART:20300115T180000Z\r\n\
END:VEVENT\r\n",
        );

        let batch = normalize(&ics, &group("UTC")).unwrap();

        assert_eq!(batch.events.len(), 2);
        assert!(matches!(batch.events[0], Err(ImportError::Format(_))));
        let fine = batch.events[1].as_ref().unwrap();
        assert_eq!(fine.id, "fine");
        assert_eq!(fine.end_at, fine.start_at, "missing DTEND falls back to DTSTART");
    }

    #[test]
    fn test_unescape_text() {
        assert_eq!(unescape_text("a\\;b\\,c\\\\d\\Ne"), "a;b,c\\d\ne");
    }
}
