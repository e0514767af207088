//! Configuration types for genealogy documents.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so a
//! configuration file only needs to name the values it changes.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining every section.
//! - [`GeometryConfig`] - Box sizes, label margins, anchor and arrowhead sizes.
//! - [`StyleConfig`] - Default colors, line width and label font.
//! - [`CanvasConfig`] - Size of a new document's canvas.
//! - [`LayoutConfig`] - Spacing used by auto layout.
//!
//! # Example
//!
//! ```
//! # use lineage::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.geometry().default_size().width(), 200.0);
//! assert!(config.style().fill_color().is_ok());
//! ```

use serde::Deserialize;

use lineage_core::{
    color::Color,
    geometry::{Insets, Size},
    text::FontMeasure,
};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    geometry: GeometryConfig,

    #[serde(default)]
    style: StyleConfig,

    #[serde(default)]
    canvas: CanvasConfig,

    #[serde(default)]
    layout: LayoutConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(
        geometry: GeometryConfig,
        style: StyleConfig,
        canvas: CanvasConfig,
        layout: LayoutConfig,
    ) -> Self {
        Self {
            geometry,
            style,
            canvas,
            layout,
        }
    }

    /// Replaces the geometry section.
    pub fn with_geometry(mut self, geometry: GeometryConfig) -> Self {
        self.geometry = geometry;
        self
    }

    pub fn geometry(&self) -> &GeometryConfig {
        &self.geometry
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }
}

/// Sizes that drive the position constraints.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeometryConfig {
    /// Minimum box width.
    default_width: f32,
    /// Minimum box height.
    default_height: f32,
    /// Horizontal space between a label and the box border.
    margin: f32,
    /// Vertical space between a label and the box border.
    vertical_margin: f32,
    anchor_diameter: f32,
    arrow_size: f32,
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            default_width: 200.0,
            default_height: 50.0,
            margin: 16.0,
            vertical_margin: 8.0,
            anchor_diameter: 32.0,
            arrow_size: 20.0,
        }
    }
}

impl GeometryConfig {
    /// Sets the minimum box size.
    pub fn with_default_size(mut self, size: Size) -> Self {
        self.default_width = size.width();
        self.default_height = size.height();
        self
    }

    /// Sets the label margins.
    pub fn with_margins(mut self, horizontal: f32, vertical: f32) -> Self {
        self.margin = horizontal;
        self.vertical_margin = vertical;
        self
    }

    pub fn default_size(&self) -> Size {
        Size::new(self.default_width, self.default_height)
    }

    /// Padding between a label and its box border.
    pub fn label_padding(&self) -> Insets {
        Insets::symmetric(self.vertical_margin, self.margin)
    }

    pub fn anchor_diameter(&self) -> f32 {
        self.anchor_diameter
    }

    pub fn arrow_size(&self) -> f32 {
        self.arrow_size
    }
}

/// Default styling for new persons and relationships.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    fill_color: String,
    text_color: String,
    border_color: String,
    line_color: String,
    line_width: f32,
    font_family: String,
    font_size: u16,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            fill_color: "white".to_string(),
            text_color: "black".to_string(),
            border_color: "black".to_string(),
            line_color: "black".to_string(),
            line_width: 2.0,
            font_family: "sans-serif".to_string(),
            font_size: 12,
        }
    }
}

impl StyleConfig {
    /// Sets the default fill color string; it is validated when a document
    /// is created.
    pub fn with_fill_color(mut self, color: impl Into<String>) -> Self {
        self.fill_color = color.into();
        self
    }

    /// Returns the parsed default fill [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color.
    pub fn fill_color(&self) -> Result<Color, String> {
        parse_color("fill_color", &self.fill_color)
    }

    /// Returns the parsed default text [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color.
    pub fn text_color(&self) -> Result<Color, String> {
        parse_color("text_color", &self.text_color)
    }

    /// Returns the parsed default border [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color.
    pub fn border_color(&self) -> Result<Color, String> {
        parse_color("border_color", &self.border_color)
    }

    /// Returns the parsed default relationship line [`Color`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured string is not a valid color.
    pub fn line_color(&self) -> Result<Color, String> {
        parse_color("line_color", &self.line_color)
    }

    pub fn line_width(&self) -> f32 {
        self.line_width
    }

    /// Builds a [`FontMeasure`] for the configured label font.
    pub fn font_measure(&self) -> FontMeasure {
        FontMeasure::new(self.font_family.clone(), self.font_size)
    }
}

fn parse_color(field: &str, value: &str) -> Result<Color, String> {
    Color::new(value).map_err(|err| format!("Invalid {field} in config: {err}"))
}

/// Size of the canvas given to new documents.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CanvasConfig {
    width: f32,
    height: f32,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: 5000.0,
            height: 5000.0,
        }
    }
}

impl CanvasConfig {
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

/// Grid spacing for auto layout.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    start_x: f32,
    start_y: f32,
    horizontal_spacing: f32,
    vertical_spacing: f32,
    /// Extra space between generations.
    row_gap: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_x: 128.0,
            start_y: 64.0,
            horizontal_spacing: 16.0,
            vertical_spacing: 16.0,
            row_gap: 256.0,
        }
    }
}

impl LayoutConfig {
    pub fn start_x(&self) -> f32 {
        self.start_x
    }

    pub fn start_y(&self) -> f32 {
        self.start_y
    }

    pub fn horizontal_spacing(&self) -> f32 {
        self.horizontal_spacing
    }

    pub fn vertical_spacing(&self) -> f32 {
        self.vertical_spacing
    }

    pub fn row_gap(&self) -> f32 {
        self.row_gap
    }
}
