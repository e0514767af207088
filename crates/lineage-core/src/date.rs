//! Calendar dates of life events.
//!
//! Genealogy files store a reserved "sentinel" date for events that were
//! never recorded: an early date for births and marriages and a late date
//! for deaths. In memory the distinction is explicit through
//! [`EventDate::Unknown`], so a sentinel is never mistaken for a real date
//! when sorting or computing ages. Sentinels only exist at the file
//! boundary, see [`EventDate::parse`] and [`EventDate::to_file_string`].

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Formats accepted when reading a date, tried in order.
///
/// ISO is what the writer produces. The other two are the long textual form
/// (`Mon Jan 1 1900`) and the GEDCOM form (`1 JAN 1900`) found in older and
/// imported files.
const READ_FORMATS: [&str; 3] = ["%Y-%m-%d", "%a %b %d %Y", "%d %b %Y"];

const WRITE_FORMAT: &str = "%Y-%m-%d";

/// Failure to read a date string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized date `{0}`")]
pub struct DateError(pub String);

/// Which life event a date belongs to, selecting its sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Sentinel {
    Birth,
    Death,
    Marriage,
}

impl Sentinel {
    /// The reserved "not recorded" date for this kind of event.
    pub fn date(self) -> NaiveDate {
        let (year, month, day) = match self {
            Sentinel::Birth | Sentinel::Marriage => (1900, 1, 1),
            Sentinel::Death => (7999, 12, 31),
        };
        NaiveDate::from_ymd_opt(year, month, day).expect("sentinel dates are valid")
    }
}

/// A date that is either known or was never recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum EventDate {
    Known(NaiveDate),
    #[default]
    Unknown,
}

impl EventDate {
    /// Reads a date from its file representation.
    ///
    /// A value equal to the event's sentinel reads as [`EventDate::Unknown`].
    ///
    /// # Errors
    ///
    /// Returns [`DateError`] if the text matches none of the accepted formats.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use lineage_core::date::{EventDate, Sentinel};
    ///
    /// let known = EventDate::parse("1 JAN 1950", Sentinel::Birth).unwrap();
    /// assert_eq!(known, EventDate::Known(NaiveDate::from_ymd_opt(1950, 1, 1).unwrap()));
    ///
    /// let unknown = EventDate::parse("7999-12-31", Sentinel::Death).unwrap();
    /// assert_eq!(unknown, EventDate::Unknown);
    /// ```
    pub fn parse(text: &str, sentinel: Sentinel) -> Result<Self, DateError> {
        let text = text.trim();
        let date = READ_FORMATS
            .iter()
            .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
            .ok_or_else(|| DateError(text.to_string()))?;
        if date == sentinel.date() {
            Ok(EventDate::Unknown)
        } else {
            Ok(EventDate::Known(date))
        }
    }

    /// Writes the date the way it is stored in files, substituting the
    /// sentinel for an unknown date.
    pub fn to_file_string(self, sentinel: Sentinel) -> String {
        let date = match self {
            EventDate::Known(date) => date,
            EventDate::Unknown => sentinel.date(),
        };
        date.format(WRITE_FORMAT).to_string()
    }

    pub fn is_known(self) -> bool {
        matches!(self, EventDate::Known(_))
    }

    /// Returns the real date, if one was recorded.
    pub fn known(self) -> Option<NaiveDate> {
        match self {
            EventDate::Known(date) => Some(date),
            EventDate::Unknown => None,
        }
    }
}

impl From<NaiveDate> for EventDate {
    fn from(date: NaiveDate) -> Self {
        EventDate::Known(date)
    }
}

impl fmt::Display for EventDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventDate::Known(date) => write!(f, "{}", date.format(WRITE_FORMAT)),
            EventDate::Unknown => write!(f, "unknown"),
        }
    }
}
