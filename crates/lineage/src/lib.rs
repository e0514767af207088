//! Lineage - genealogy diagrams with a reversible editing history.
//!
//! A [`Document`] holds persons, parent → child relationships and
//! marriages positioned on a canvas. Every edit goes through the document,
//! which keeps spouses side by side, re-routes arrows, and records the edit
//! on an undo/redo history. Documents are stored as XML files.
//!
//! # Examples
//!
//! ```rust,no_run
//! use lineage::{Document, MarryMode, config::AppConfig, geometry::Point};
//!
//! let mut doc = Document::new(AppConfig::default()).expect("valid config");
//!
//! let ada = doc.create_person(Point::new(300.0, 100.0)).unwrap();
//! let william = doc.create_person(Point::new(0.0, 100.0)).unwrap();
//! doc.rename_person(ada, "Ada Lovelace").unwrap();
//!
//! // William is further left, so he becomes the left spouse.
//! let outcome = doc.marry(ada, william, MarryMode::Interactive).unwrap();
//! assert!(outcome.swapped);
//!
//! doc.save("family.xml").expect("Failed to save");
//! assert!(doc.is_clean());
//! ```

pub mod config;
pub mod diagnostic;
pub mod document;
pub mod error;
pub mod history;
pub mod model;
pub mod mutator;
pub mod proposal;
pub mod report;
pub mod store;

mod constraint;
mod file;
mod layout;

pub use lineage_core::{color, date, geometry, identifier, text};

pub use document::{Document, Loaded, MoveGesture};
pub use error::{DocumentError, LineageError};
pub use mutator::{MarriageOutcome, MarryMode};
