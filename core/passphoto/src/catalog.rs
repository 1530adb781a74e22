//! Built-in reference tables: ID photo sizes, printable paper layouts and
//! background colours commonly accepted by passport offices.
//!
//! Callers are free to ignore these and pass their own [`PhysicalSize`]s.

use serde::Serialize;

use crate::color::Color;
use crate::units::PhysicalSize;

/// A named ID photo size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSizeEntry {
    /// Stable identifier, e.g. `"us-passport"`.
    pub id: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Issuing country or `"Standard"`.
    pub country: &'static str,
    /// Physical print size.
    pub size: PhysicalSize,
}

/// A named paper layout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaperLayoutEntry {
    /// Stable identifier, e.g. `"a4"`.
    pub id: &'static str,
    /// Display name, also used in export filenames.
    pub name: &'static str,
    /// Sheet size, in the orientation it is rendered.
    pub size: PhysicalSize,
}

/// A named background colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackgroundEntry {
    /// Display name.
    pub name: &'static str,
    /// The colour.
    pub color: Color,
}

/// Photo sizes offered by default.
pub const PHOTO_SIZES: &[PhotoSizeEntry] = &[
    PhotoSizeEntry {
        id: "india-passport",
        name: "India Passport",
        country: "India",
        size: PhysicalSize::cm(3.5, 4.5),
    },
    PhotoSizeEntry {
        id: "uk-passport",
        name: "UK Passport",
        country: "UK",
        size: PhysicalSize::cm(3.5, 4.5),
    },
    PhotoSizeEntry {
        id: "us-passport",
        name: "US Passport",
        country: "USA",
        size: PhysicalSize::inch(2.0, 2.0),
    },
    PhotoSizeEntry {
        id: "visa-photo",
        name: "Visa Photo",
        country: "Standard",
        size: PhysicalSize::inch(2.0, 2.0),
    },
    PhotoSizeEntry {
        id: "pan-card",
        name: "PAN Card",
        country: "India",
        size: PhysicalSize::cm(2.5, 2.5),
    },
];

/// Paper layouts offered by default.
pub const PAPER_LAYOUTS: &[PaperLayoutEntry] = &[
    PaperLayoutEntry {
        id: "3r",
        name: "3R (L)",
        size: PhysicalSize::inch(3.5, 5.0),
    },
    PaperLayoutEntry {
        id: "4r",
        name: "4R",
        size: PhysicalSize::inch(6.0, 4.0),
    },
    PaperLayoutEntry {
        id: "5r",
        name: "5R (2L)",
        size: PhysicalSize::inch(7.0, 5.0),
    },
    PaperLayoutEntry {
        id: "a5",
        name: "A5",
        size: PhysicalSize::cm(21.0, 14.85),
    },
    PaperLayoutEntry {
        id: "a4",
        name: "A4",
        size: PhysicalSize::cm(29.7, 21.0),
    },
    PaperLayoutEntry {
        id: "letter",
        name: "Letter",
        size: PhysicalSize::inch(8.5, 11.0),
    },
];

/// Background colours offered by default. White first.
pub const BACKGROUND_COLORS: &[BackgroundEntry] = &[
    BackgroundEntry {
        name: "White",
        color: Color::new(0xFF, 0xFF, 0xFF),
    },
    BackgroundEntry {
        name: "Snow",
        color: Color::new(0xFF, 0xFA, 0xFA),
    },
    BackgroundEntry {
        name: "WhiteSmoke",
        color: Color::new(0xF5, 0xF5, 0xF5),
    },
    BackgroundEntry {
        name: "Ivory",
        color: Color::new(0xFF, 0xFF, 0xF0),
    },
    BackgroundEntry {
        name: "Gainsboro",
        color: Color::new(0xDC, 0xDC, 0xDC),
    },
    BackgroundEntry {
        name: "LightGray",
        color: Color::new(0xD3, 0xD3, 0xD3),
    },
    BackgroundEntry {
        name: "Silver",
        color: Color::new(0xC0, 0xC0, 0xC0),
    },
    BackgroundEntry {
        name: "LightBlue",
        color: Color::new(0xAD, 0xD8, 0xE6),
    },
    BackgroundEntry {
        name: "PowderBlue",
        color: Color::new(0xB0, 0xE0, 0xE6),
    },
    BackgroundEntry {
        name: "SkyBlue",
        color: Color::new(0x87, 0xCE, 0xEB),
    },
    BackgroundEntry {
        name: "DodgerBlue",
        color: Color::new(0x1E, 0x90, 0xFF),
    },
    BackgroundEntry {
        name: "RoyalBlue",
        color: Color::new(0x41, 0x69, 0xE1),
    },
    BackgroundEntry {
        name: "Red",
        color: Color::new(0xFF, 0x00, 0x00),
    },
];

/// Look up a photo size by id.
pub fn photo_size(id: &str) -> Option<&'static PhotoSizeEntry> {
    PHOTO_SIZES.iter().find(|entry| entry.id == id)
}

/// Look up a paper layout by id.
pub fn paper_layout(id: &str) -> Option<&'static PaperLayoutEntry> {
    PAPER_LAYOUTS.iter().find(|entry| entry.id == id)
}
