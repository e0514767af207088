//! Core value types shared by the Lineage crates.
//!
//! Identifiers, geometry, colors, calendar dates with "not recorded"
//! sentinels, and label text measurement.

pub mod color;
pub mod date;
pub mod geometry;
pub mod identifier;
pub mod text;
