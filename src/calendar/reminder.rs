// src/calendar/reminder.rs

use chrono::{Duration, Local, NaiveDateTime, Timelike};
use icalendar::{Component, Event, EventLike, Property};
use uuid::Uuid;

use super::{CalendarError, TOOL_DOMAIN};

/// Mid-priority on the 1..9 scale of RFC 5545.
pub const PRIORITY: u32 = 5;
pub const LOCATION: &str = "Online";
pub const ORGANIZER_ROLE: &str = "CHAIR";

const ICAL_FLOATING_FORMAT: &str = "%Y%m%dT%H%M%S";

/// A single all-at-once reminder: start, end and stamp are the same instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEvent {
    pub summary: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub stamp: NaiveDateTime,
    pub uid: String,
    pub priority: u32,
    pub organizer: String,
    pub location: String,
}

impl ReminderEvent {
    /// Reminder `days` from now in local wall-clock time. Zero and negative
    /// offsets are allowed.
    pub fn new(days: i64, summary: &str, organizer: &str) -> Result<Self, CalendarError> {
        let when = event_time(Local::now().naive_local(), days)?;
        Ok(Self::at(when, summary, organizer))
    }

    /// Reminder at a fixed instant, with a fresh uid.
    pub fn at(when: NaiveDateTime, summary: &str, organizer: &str) -> Self {
        ReminderEvent {
            summary: summary.to_string(),
            start: when,
            end: when,
            stamp: when,
            uid: new_uid(),
            priority: PRIORITY,
            organizer: organizer.to_string(),
            location: LOCATION.to_string(),
        }
    }

    /// Converts into an `icalendar` VEVENT. Times are written as floating
    /// local times, matching how they were computed.
    pub fn to_event(&self) -> Event {
        let organizer = Property::new("ORGANIZER", &format!("MAILTO:{}", self.organizer))
            .add_parameter("CN", &self.organizer)
            .add_parameter("ROLE", ORGANIZER_ROLE)
            .done();

        Event::new()
            .summary(&self.summary)
            .uid(&self.uid)
            .priority(self.priority)
            .location(&self.location)
            .add_property("DTSTART", &format_floating(self.start))
            .add_property("DTEND", &format_floating(self.end))
            .add_property("DTSTAMP", &format_floating(self.stamp))
            .append_property(organizer)
            .done()
    }
}

/// `now + days * 86400s`, truncated to whole seconds.
pub fn event_time(now: NaiveDateTime, days: i64) -> Result<NaiveDateTime, CalendarError> {
    let now = now.with_nanosecond(0).unwrap_or(now);
    Duration::try_days(days)
        .and_then(|offset| now.checked_add_signed(offset))
        .ok_or(CalendarError::OutOfRange(days))
}

fn new_uid() -> String {
    format!("{}@{}", Uuid::new_v4(), TOOL_DOMAIN)
}

fn format_floating(when: NaiveDateTime) -> String {
    when.format(ICAL_FLOATING_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 2, 20)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn event_time_adds_whole_days() {
        let t = event_time(noon(), 14).unwrap();
        assert_eq!(t, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap().and_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn event_time_allows_zero_and_negative() {
        assert_eq!(event_time(noon(), 0).unwrap(), noon());
        assert_eq!(event_time(noon(), -1).unwrap(), noon() - Duration::days(1));
    }

    #[test]
    fn event_time_drops_subsecond_part() {
        let t = noon().with_nanosecond(123_456_789).unwrap();
        assert_eq!(event_time(t, 1).unwrap().nanosecond(), 0);
    }

    #[test]
    fn pathological_offsets_are_errors() {
        assert!(matches!(
            event_time(noon(), i64::MAX),
            Err(CalendarError::OutOfRange(i64::MAX))
        ));
    }

    #[test]
    fn start_end_and_stamp_coincide() {
        let ev = ReminderEvent::new(3, "x", "fred@example.com").unwrap();
        assert_eq!(ev.start, ev.end);
        assert_eq!(ev.end, ev.stamp);
    }

    #[test]
    fn fixed_fields() {
        let ev = ReminderEvent::at(noon(), "WGLC ends", "Fred <fred@example.com>");
        assert_eq!(ev.summary, "WGLC ends");
        assert_eq!(ev.priority, 5);
        assert_eq!(ev.location, "Online");
        assert_eq!(ev.organizer, "Fred <fred@example.com>");
        assert!(ev.uid.ends_with("@kumari.net"));
    }

    #[test]
    fn uids_are_fresh_per_event() {
        let a = ReminderEvent::at(noon(), "x", "f@example.com");
        let b = ReminderEvent::at(noon(), "x", "f@example.com");
        assert_ne!(a.uid, b.uid);
    }

    #[test]
    fn vevent_carries_all_fields() {
        let ev = ReminderEvent::at(noon(), "WGLC ends", "fred@example.com");
        let event = ev.to_event();
        assert_eq!(event.get_summary(), Some("WGLC ends"));
        assert_eq!(event.get_uid(), Some(ev.uid.as_str()));
        assert_eq!(event.property_value("DTSTART"), Some("20240220T120000"));
        assert_eq!(event.property_value("DTEND"), Some("20240220T120000"));
        assert_eq!(event.property_value("DTSTAMP"), Some("20240220T120000"));
        assert_eq!(event.property_value("LOCATION"), Some("Online"));
        assert_eq!(event.property_value("PRIORITY"), Some("5"));
        assert_eq!(
            event.property_value("ORGANIZER"),
            Some("MAILTO:fred@example.com")
        );
    }
}
