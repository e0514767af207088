//! Read-only reports over a document.

use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;

use lineage_core::{date::EventDate, identifier::Id};

use crate::document::Document;

/// Column titles of [`persons`], in [`PersonRow::cells`] order.
pub const PERSON_COLUMNS: [&str; 9] = [
    "First name",
    "Last name",
    "Name",
    "Date of birth",
    "Place of birth",
    "Country of birth",
    "Date of death",
    "Place of death",
    "Gender",
];

/// One person as a table row. Unknown dates and genders are blank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PersonRow {
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    pub display_name: String,
    pub date_of_birth: String,
    pub place_of_birth: String,
    pub country_of_birth: String,
    pub date_of_death: String,
    pub place_of_death: String,
    pub gender: String,
}

impl PersonRow {
    pub fn cells(&self) -> [&str; 9] {
        [
            &self.first_name,
            &self.last_name,
            &self.display_name,
            &self.date_of_birth,
            &self.place_of_birth,
            &self.country_of_birth,
            &self.date_of_death,
            &self.place_of_death,
            &self.gender,
        ]
    }
}

/// Every person in document order.
pub fn persons(document: &Document) -> Vec<PersonRow> {
    let blank_unknown = |date: EventDate| match date {
        EventDate::Known(_) => date.to_string(),
        EventDate::Unknown => String::new(),
    };
    document
        .persons()
        .map(|person| {
            let details = person.details();
            PersonRow {
                id: person.id(),
                first_name: details.first_name.clone(),
                last_name: details.last_name.clone(),
                display_name: details.display_name.clone(),
                date_of_birth: blank_unknown(details.date_of_birth),
                place_of_birth: details.place_of_birth.clone(),
                country_of_birth: details.country_of_birth.clone(),
                date_of_death: blank_unknown(details.date_of_death),
                place_of_death: details.place_of_death.clone(),
                gender: details.gender.file_code().unwrap_or_default().to_string(),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EventKind {
    Birth,
    Death,
    Marriage,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Birth => write!(f, "born"),
            EventKind::Death => write!(f, "died"),
            EventKind::Marriage => write!(f, "married"),
        }
    }
}

/// A dated event in the family history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimelineEvent {
    pub date: NaiveDate,
    pub kind: EventKind,
    /// The person for births and deaths, the marriage for marriages.
    pub subject: Id,
    /// Display names of the people involved.
    pub names: Vec<String>,
    pub place: String,
}

impl fmt::Display for TimelineEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {} {}", self.date, self.names.join(" & "), self.kind)?;
        if !self.place.is_empty() {
            write!(f, " in {}", self.place)?;
        }
        Ok(())
    }
}

/// Births, deaths and marriages with a recorded date, oldest first.
///
/// Events on the same day keep document order: persons' births and deaths
/// before marriages.
pub fn timeline(document: &Document) -> Vec<TimelineEvent> {
    let mut events = Vec::new();
    for person in document.persons() {
        let details = person.details();
        let dated = [
            (EventKind::Birth, details.date_of_birth, &details.place_of_birth),
            (EventKind::Death, details.date_of_death, &details.place_of_death),
        ];
        for (kind, date, place) in dated {
            if let Some(date) = date.known() {
                events.push(TimelineEvent {
                    date,
                    kind,
                    subject: person.id(),
                    names: vec![details.display_name.clone()],
                    place: place.clone(),
                });
            }
        }
    }

    for marriage in document.marriages() {
        let Some(date) = marriage.details().date.known() else {
            continue;
        };
        let names = [marriage.left(), marriage.right()]
            .into_iter()
            .filter_map(|id| document.person(id).ok())
            .map(|person| person.details().display_name.clone())
            .collect();
        events.push(TimelineEvent {
            date,
            kind: EventKind::Marriage,
            subject: marriage.id(),
            names,
            place: marriage.details().place.clone(),
        });
    }

    events.sort_by_key(|event| event.date);
    events
}
