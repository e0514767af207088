//! Label text measurement.
//!
//! Person boxes grow to fit their display name, so the document needs the
//! rendered size of a label. This module provides the [`TextMeasure`] trait
//! and two implementations:
//!
//! - [`FontMeasure`] - shapes text with real font metrics through cosmic-text
//! - [`FixedAdvanceMeasure`] - a deterministic per-character advance, for
//!   headless use and tests
//!
//! # Quick Start
//!
//! ```
//! # use lineage_core::text::{FixedAdvanceMeasure, TextMeasure};
//! let measure = FixedAdvanceMeasure::new(8.0, 16.0);
//! let size = measure.measure("Ada Lovelace");
//! assert_eq!(size.width(), 96.0);
//! assert_eq!(size.height(), 16.0);
//! ```

use std::{
    fmt,
    sync::{Arc, Mutex, OnceLock},
};

use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping};
use log::info;

use crate::geometry::Size;

/// Computes the rendered size of a single label.
pub trait TextMeasure: fmt::Debug + Send + Sync {
    /// Size of `text` when rendered; empty text has zero size.
    fn measure(&self, text: &str) -> Size;
}

/// Measures text with a font through cosmic-text shaping.
#[derive(Debug, Clone)]
pub struct FontMeasure {
    family: String,
    size: u16,
}

impl FontMeasure {
    /// # Arguments
    ///
    /// * `family` - Font family name, such as `"sans-serif"`
    /// * `size` - Font size in points
    pub fn new(family: impl Into<String>, size: u16) -> Self {
        Self {
            family: family.into(),
            size,
        }
    }
}

impl TextMeasure for FontMeasure {
    fn measure(&self, text: &str) -> Size {
        TEXT_MANAGER
            .get_or_init(TextManager::new)
            .calculate_text_size(text, &self.family, self.size)
    }
}

/// Measures text as if every character had the same advance.
///
/// Each line is `chars × advance` wide and `line_height` tall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAdvanceMeasure {
    advance: f32,
    line_height: f32,
}

impl FixedAdvanceMeasure {
    pub fn new(advance: f32, line_height: f32) -> Self {
        Self {
            advance,
            line_height,
        }
    }
}

impl TextMeasure for FixedAdvanceMeasure {
    fn measure(&self, text: &str) -> Size {
        if text.is_empty() {
            return Size::default();
        }
        let lines: Vec<&str> = text.lines().collect();
        let widest = lines
            .iter()
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0);
        Size::new(
            widest as f32 * self.advance,
            lines.len().max(1) as f32 * self.line_height,
        )
    }
}

/// TextManager handles text measurement and font operations
/// It maintains a reusable FontSystem instance to avoid expensive recreation
struct TextManager {
    font_system: Arc<Mutex<FontSystem>>,
}

impl TextManager {
    fn new() -> Self {
        info!("Initializing FontSystem");
        Self {
            font_system: Arc::new(Mutex::new(FontSystem::new())),
        }
    }

    /// Calculate the size of text in pixels using cosmic-text.
    ///
    /// Falls back to an average-advance estimate when shaping yields no layout runs.
    fn calculate_text_size(&self, text: &str, family: &str, font_size: u16) -> Size {
        if text.is_empty() {
            return Size::default();
        }

        let mut font_system = self.font_system.lock().expect("failed to lock FontSystem");

        // Points to pixels at standard DPI
        let font_size_px = font_size as f32 * 1.33;
        let line_height = font_size_px * 1.15;
        let metrics = Metrics::new(font_size_px, line_height);

        let mut buffer = Buffer::new(&mut font_system, metrics);
        let mut buffer = buffer.borrow_with(&mut font_system);

        let family = match family {
            "sans-serif" => Family::SansSerif,
            "serif" => Family::Serif,
            "monospace" => Family::Monospace,
            name => Family::Name(name),
        };
        let attrs = Attrs::new().family(family);

        buffer.set_size(None, None);
        buffer.set_text(text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(true);

        let mut max_width: f32 = 0.0;
        let mut total_height: f32 = 0.0;

        let layout_runs: Vec<_> = buffer.layout_runs().collect();
        if !layout_runs.is_empty() {
            for last in layout_runs.iter().map(|run| run.glyphs.last()) {
                if let Some(last) = last {
                    max_width = max_width.max(last.x + last.w);
                }
                total_height += metrics.line_height;
            }
        } else {
            max_width = text.chars().count() as f32 * (font_size_px * 0.55);
            total_height = metrics.line_height;
        }

        Size::new(max_width, total_height)
    }
}

static TEXT_MANAGER: OnceLock<TextManager> = OnceLock::new();

#[cfg(test)]
mod tests {
    use float_cmp::assert_approx_eq;

    use super::*;

    #[test]
    fn test_fixed_advance_single_line() {
        let measure = FixedAdvanceMeasure::new(10.0, 20.0);
        let size = measure.measure("New Person");
        assert_approx_eq!(f32, size.width(), 100.0);
        assert_approx_eq!(f32, size.height(), 20.0);
    }

    #[test]
    fn test_fixed_advance_multiline_uses_widest_line() {
        let measure = FixedAdvanceMeasure::new(10.0, 20.0);
        let size = measure.measure("Jo\nJonathan");
        assert_approx_eq!(f32, size.width(), 80.0);
        assert_approx_eq!(f32, size.height(), 40.0);
    }

    #[test]
    fn test_fixed_advance_counts_chars_not_bytes() {
        let measure = FixedAdvanceMeasure::new(10.0, 20.0);
        assert_approx_eq!(f32, measure.measure("Zoë").width(), 30.0);
    }

    #[test]
    fn test_empty_text_has_zero_size() {
        assert!(FixedAdvanceMeasure::new(10.0, 20.0).measure("").is_zero());
        assert!(FontMeasure::new("sans-serif", 12).measure("").is_zero());
    }

    #[test]
    fn test_font_measure_has_line_height() {
        let size = FontMeasure::new("sans-serif", 12).measure("Ada");
        assert!(size.height() > 0.0);
        assert!(size.width() >= 0.0);
    }
}
