//! Color handling for genealogy diagrams
//!
//! This module provides the [`Color`] type which wraps the `DynamicColor` type
//! from the color crate. Person boxes carry fill, text and border colors and
//! relationship arrows carry a line color.

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use color::{DynamicColor, Srgb};
use serde::{Serialize, Serializer};

/// Wrapper around the `DynamicColor` type from the color crate
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Color {
    color: DynamicColor,
}

impl Eq for Color {}

impl Hash for Color {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl Color {
    /// Create a new `Color` from a CSS color string such as `"#ff0000"`,
    /// `"rgb(255, 0, 0)"` or `"red"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use lineage_core::color::Color;
    ///
    /// let red = Color::new("#ff0000").unwrap();
    /// let white = Color::new("white").unwrap();
    /// assert_eq!(white.to_hex(), "#ffffff");
    /// ```
    pub fn new(color_str: &str) -> Result<Self, String> {
        match DynamicColor::from_str(color_str) {
            Ok(color) => Ok(Self { color }),
            Err(err) => Err(format!("invalid color `{color_str}`: {err}")),
        }
    }

    /// Returns the color as a `#rrggbb` string, the form stored in
    /// genealogy files.
    pub fn to_hex(self) -> String {
        let rgba = self.color.to_alpha_color::<Srgb>().to_rgba8();
        format!("#{:02x}{:02x}{:02x}", rgba.r, rgba.g, rgba.b)
    }

    /// Returns the alpha (transparency) component of this color.
    pub fn alpha(&self) -> f32 {
        self.color.components[3]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::new("black").expect("'black' is a valid CSS color")
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.color)
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_new() {
        assert!(Color::new("#ff0000").is_ok());
        assert!(Color::new("not-a-color").is_err());
    }

    #[test]
    fn test_color_default() {
        let color = Color::default();
        assert_eq!(color.to_string(), "black");
        assert_eq!(color.to_hex(), "#000000");
    }

    #[test]
    fn test_to_hex_named_and_functional() {
        assert_eq!(Color::new("white").unwrap().to_hex(), "#ffffff");
        assert_eq!(Color::new("rgb(255, 128, 0)").unwrap().to_hex(), "#ff8000");
        assert_eq!(Color::new("#1a2b3c").unwrap().to_hex(), "#1a2b3c");
    }

    #[test]
    fn test_hex_round_trip() {
        let original = Color::new("cornflowerblue").unwrap();
        let reparsed = Color::new(&original.to_hex()).unwrap();
        assert_eq!(original.to_hex(), reparsed.to_hex());
    }

    #[test]
    fn test_color_alpha() {
        let color = Color::new("rgba(0, 0, 0, 0.5)").unwrap();
        assert!((color.alpha() - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_color_eq_hash() {
        use std::collections::HashSet;

        let color1 = Color::new("red").unwrap();
        let color2 = Color::new("red").unwrap();
        let color3 = Color::new("blue").unwrap();

        assert_eq!(color1, color2);
        assert_ne!(color1, color3);

        let mut set = HashSet::new();
        set.insert(color1);
        assert!(set.contains(&color2));
        assert!(!set.contains(&color3));
    }
}
