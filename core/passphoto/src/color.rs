use std::fmt;
use std::str::FromStr;

use image::{Rgb, Rgba};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An opaque RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
}

impl Color {
    /// Opaque white, the fallback for unparseable colours.
    pub const WHITE: Color = Color::new(255, 255, 255);

    /// Build a colour from its channels.
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// The colour as an opaque RGBA pixel.
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }

    /// The colour as an RGB pixel.
    pub fn to_rgb(self) -> Rgb<u8> {
        Rgb([self.r, self.g, self.b])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Error from strict hex parsing via [`FromStr`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected #RRGGBB")]
pub struct InvalidHexColor;

impl FromStr for Color {
    type Err = InvalidHexColor;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(InvalidHexColor);
        }
        let channel =
            |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| InvalidHexColor);
        Ok(Color::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// Parse `#RRGGBB` (case-insensitive, `#` optional).
///
/// Never fails: anything unparseable yields [`Color::WHITE`].
pub fn parse_hex_color(s: &str) -> Color {
    s.trim().parse().unwrap_or(Color::WHITE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_hash() {
        assert_eq!(parse_hex_color("#00FF00"), Color::new(0, 255, 0));
    }

    #[test]
    fn parses_without_hash_and_lowercase() {
        assert_eq!(parse_hex_color("00ff00"), Color::new(0, 255, 0));
        assert_eq!(parse_hex_color("#fffafa"), Color::new(255, 250, 250));
    }

    #[test]
    fn invalid_input_defaults_to_white() {
        assert_eq!(parse_hex_color("not-a-color"), Color::WHITE);
        assert_eq!(parse_hex_color(""), Color::WHITE);
        assert_eq!(parse_hex_color("#FFF"), Color::WHITE);
        assert_eq!(parse_hex_color("#GGHHII"), Color::WHITE);
        assert_eq!(parse_hex_color("##00FF00"), Color::WHITE);
        assert_eq!(parse_hex_color("#00FF00AA"), Color::WHITE);
    }

    #[test]
    fn multibyte_input_does_not_panic() {
        assert_eq!(parse_hex_color("ééé"), Color::WHITE);
    }

    #[test]
    fn strict_parse_reports_errors() {
        assert!("red".parse::<Color>().is_err());
        assert_eq!("#2F4F4F".parse::<Color>(), Ok(Color::new(0x2F, 0x4F, 0x4F)));
    }

    #[test]
    fn strict_parse_error_message() {
        let err = "#12345".parse::<Color>().unwrap_err();
        assert_eq!(err, InvalidHexColor);
        assert_eq!(err.to_string(), "expected #RRGGBB");
        let boxed: Box<dyn std::error::Error> = Box::new(err);
        assert_eq!(boxed.to_string(), "expected #RRGGBB");
    }

    #[test]
    fn display_round_trips_through_parse() {
        let c = Color::new(0x12, 0xAB, 0xEF);
        assert_eq!(c.to_string(), "#12ABEF");
        assert_eq!(parse_hex_color(&c.to_string()), c);
    }
}
