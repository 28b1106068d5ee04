// src/calendar/mod.rs
pub mod reminder;

use icalendar::{Calendar, Property};
use log::{debug, info};
use std::fmt;
use std::fs;
use std::path::Path;
use thiserror::Error;

pub use reminder::ReminderEvent;

/// Domain used as the uid suffix and in the product id.
pub const TOOL_DOMAIN: &str = "kumari.net";
pub const PRODUCT_ID: &str = "-/IETF Calendar Reminder//kumari.net//";
pub const ICAL_VERSION: &str = "2.0";

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Reminder offset of {0} days is out of range")]
    OutOfRange(i64),

    #[error("Failed to write iCal file '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// A VCALENDAR holding exactly one reminder event.
///
/// Serialized once on construction: `icalendar` orders property parameters
/// by hash, so every consumer (mail attachment, `--ics` file) shares one text.
#[derive(Debug, Clone)]
pub struct CalendarDocument {
    event: ReminderEvent,
    text: String,
}

impl CalendarDocument {
    /// Builds the document for one reminder `days` from now.
    pub fn create_events(days: i64, message: &str, from: &str) -> Result<Self, CalendarError> {
        let event = ReminderEvent::new(days, message, from)?;
        info!(
            "Created reminder '{}' for {} ({} days), uid {}",
            event.summary, event.start, days, event.uid
        );
        Ok(Self::from_event(event))
    }

    pub fn from_event(event: ReminderEvent) -> Self {
        let text = to_calendar(&event).to_string();
        CalendarDocument { event, text }
    }

    pub fn event(&self) -> &ReminderEvent {
        &self.event
    }

    /// RFC 5545 text, CRLF line endings.
    pub fn to_ical(&self) -> &str {
        &self.text
    }

    pub fn write_to(&self, path: &Path) -> Result<(), CalendarError> {
        debug!("Writing iCal document to {}", path.display());
        fs::write(path, &self.text).map_err(|source| CalendarError::Write {
            path: path.display().to_string(),
            source,
        })
    }
}

impl fmt::Display for CalendarDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn to_calendar(event: &ReminderEvent) -> Calendar {
    let mut calendar = Calendar::empty();
    calendar
        .append_property(Property::new("PRODID", PRODUCT_ID))
        .append_property(Property::new("VERSION", ICAL_VERSION))
        .push(event.to_event());
    calendar
}
