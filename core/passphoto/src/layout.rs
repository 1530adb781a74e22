//! Multi-copy sheet layout.
//!
//! One routine serves both the on-screen preview and the print export; the
//! only parameter that differs between them is the pixel density.

use image::imageops::FilterType;
use image::{Rgba, RgbaImage};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use log::{debug, warn};

use crate::canvas::{check_surface, new_canvas};
use crate::color::Color;
use crate::crop::CropRegion;
use crate::encode::{encode, OutputFormat, DEFAULT_JPEG_QUALITY};
use crate::error::PassportError;
use crate::units::{cm_to_pixels, PhysicalSize, PREVIEW_DPI, PRINT_DPI};

/// Space between neighbouring photos, in centimetres.
pub const GAP_CM: f64 = 0.3;

/// Stroke colour of the 1px separator drawn around every placed photo.
pub const BORDER_COLOR: Color = Color::new(0xcc, 0xcc, 0xcc);

/// Grid of photo cells on a sheet, in pixels at one DPI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    /// Sheet width.
    pub sheet_width: u32,
    /// Sheet height.
    pub sheet_height: u32,
    /// Cells per row.
    pub cols: u32,
    /// Rows of cells.
    pub rows: u32,
    /// Cell width.
    pub cell_width: u32,
    /// Cell height.
    pub cell_height: u32,
    /// Gap between neighbouring cells.
    pub gap: u32,
    /// Left edge of the first column.
    pub origin_x: u32,
    /// Top edge of the first row.
    pub origin_y: u32,
}

/// One placed photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    /// Zero-based row.
    pub row: u32,
    /// Zero-based column.
    pub col: u32,
    /// Left edge on the sheet.
    pub x: u32,
    /// Top edge on the sheet.
    pub y: u32,
}

fn fit_count(extent: u32, cell: u32, gap: u32) -> u32 {
    if cell == 0 {
        return 0;
    }
    let fit = (extent as u64 + gap as u64) / (cell as u64 + gap as u64);
    // At most `extent` cells of one pixel fit, so this never saturates.
    u32::try_from(fit).unwrap_or(u32::MAX)
}

fn grid_extent(count: u32, cell: u32, gap: u32) -> u64 {
    match count as u64 {
        0 => 0,
        n => n * cell as u64 + (n - 1) * gap as u64,
    }
}

impl SheetLayout {
    /// Lay out photos of `photo` size on a sheet of `paper` size at `dpi`.
    ///
    /// The gap counts between cells only, and the whole grid is centred on
    /// the sheet. A photo larger than the paper yields a layout with no cells.
    /// A sheet that cannot be allocated at `dpi` is a
    /// [`PassportError::Canvas`] error.
    pub fn compute(
        photo: &PhysicalSize,
        paper: &PhysicalSize,
        dpi: u32,
    ) -> Result<Self, PassportError> {
        if dpi == 0 {
            return Err(PassportError::InvalidDpi(dpi));
        }
        photo.validate()?;
        paper.validate()?;

        let (sheet_width, sheet_height) = paper.to_pixels(dpi);
        check_surface(sheet_width, sheet_height)?;
        let (cell_width, cell_height) = photo.to_pixels(dpi);
        let gap = cm_to_pixels(GAP_CM, dpi);

        let mut cols = fit_count(sheet_width, cell_width, gap);
        let mut rows = fit_count(sheet_height, cell_height, gap);
        if cols == 0 || rows == 0 {
            cols = 0;
            rows = 0;
        }

        // The grid never exceeds the sheet, so the origins fit in u32.
        let origin_x = ((sheet_width as u64 - grid_extent(cols, cell_width, gap)) / 2) as u32;
        let origin_y = ((sheet_height as u64 - grid_extent(rows, cell_height, gap)) / 2) as u32;

        Ok(Self {
            sheet_width,
            sheet_height,
            cols,
            rows,
            cell_width,
            cell_height,
            gap,
            origin_x,
            origin_y,
        })
    }

    /// Most photos the sheet holds.
    pub fn capacity(&self) -> u32 {
        self.cols.saturating_mul(self.rows)
    }

    /// Number of photos actually placed when `requested` are asked for.
    pub fn placed_count(&self, requested: u32) -> u32 {
        requested.min(self.capacity())
    }

    /// The first `count` cells in row-major order, capped at capacity.
    pub fn cells(&self, count: u32) -> impl Iterator<Item = Cell> + '_ {
        let cols = self.cols.max(1);
        (0..self.placed_count(count)).map(move |i| {
            let (row, col) = (i / cols, i % cols);
            Cell {
                row,
                col,
                x: self.origin_x + col * (self.cell_width + self.gap),
                y: self.origin_y + row * (self.cell_height + self.gap),
            }
        })
    }
}

/// Source rectangle of a `source_width` × `source_height` image that matches
/// the `cell_width` × `cell_height` aspect ratio, centred on the image.
pub fn center_crop_region(
    source_width: u32,
    source_height: u32,
    cell_width: u32,
    cell_height: u32,
) -> CropRegion {
    let (sw, sh) = (source_width as f64, source_height as f64);
    let cell_aspect = cell_width as f64 / cell_height as f64;

    if sw / sh > cell_aspect {
        let width = ((sh * cell_aspect).round() as u32).clamp(1, source_width);
        CropRegion {
            x: (source_width - width) / 2,
            y: 0,
            width,
            height: source_height,
        }
    } else {
        let height = ((sw / cell_aspect).round() as u32).clamp(1, source_height);
        CropRegion {
            x: 0,
            y: (source_height - height) / 2,
            width: source_width,
            height,
        }
    }
}

/// Render `copies` of `photo` onto a white sheet of `paper` size at `dpi`.
///
/// Each photo is centre-cropped to the cell's aspect ratio, scaled into the
/// cell and outlined with a 1px [`BORDER_COLOR`] stroke. Requests beyond the
/// sheet's capacity are truncated; zero copies give a blank sheet.
pub fn render_sheet(
    photo: &RgbaImage,
    photo_size: &PhysicalSize,
    paper: &PhysicalSize,
    copies: u32,
    dpi: u32,
) -> Result<RgbaImage, PassportError> {
    let layout = SheetLayout::compute(photo_size, paper, dpi)?;
    let placed = layout.placed_count(copies);
    if placed < copies {
        warn!(
            "{copies} copies requested but the sheet holds {}; placing {placed}",
            layout.capacity()
        );
    }
    debug!(
        "sheet {}x{} @ {dpi} dpi: {}x{} grid of {}x{} cells, gap {}",
        layout.sheet_width,
        layout.sheet_height,
        layout.cols,
        layout.rows,
        layout.cell_width,
        layout.cell_height,
        layout.gap
    );

    let mut sheet = new_canvas(layout.sheet_width, layout.sheet_height, Color::WHITE.to_rgba())?;
    if placed == 0 {
        return Ok(sheet);
    }
    if photo.width() == 0 || photo.height() == 0 {
        return Err(PassportError::ZeroDimensions);
    }

    let region = center_crop_region(
        photo.width(),
        photo.height(),
        layout.cell_width,
        layout.cell_height,
    );
    let source = image::imageops::crop_imm(photo, region.x, region.y, region.width, region.height)
        .to_image();
    let tile = image::imageops::resize(
        &source,
        layout.cell_width,
        layout.cell_height,
        FilterType::Lanczos3,
    );

    let border: Rgba<u8> = BORDER_COLOR.to_rgba();
    for cell in layout.cells(placed) {
        image::imageops::overlay(&mut sheet, &tile, cell.x as i64, cell.y as i64);
        let outline = Rect::at(cell.x as i32, cell.y as i32)
            .of_size(layout.cell_width, layout.cell_height);
        draw_hollow_rect_mut(&mut sheet, outline, border);
    }
    Ok(sheet)
}

/// Everything needed to render and export one sheet.
///
/// Defaults to one copy at [`PRINT_DPI`] as PNG.
#[derive(Debug, Clone)]
pub struct SheetSpec {
    photo_size: PhysicalSize,
    paper: PhysicalSize,
    copies: u32,
    dpi: u32,
    format: OutputFormat,
    quality: f32,
}

/// An encoded sheet.
#[derive(Debug, Clone)]
pub struct RenderedSheet {
    /// Encoded image bytes.
    pub data: Vec<u8>,
    /// Format of `data`.
    pub format: OutputFormat,
    /// Sheet width in pixels.
    pub width: u32,
    /// Sheet height in pixels.
    pub height: u32,
    /// Photos actually placed.
    pub placed: u32,
}

impl SheetSpec {
    /// A sheet of `photo_size` photos on `paper`.
    pub fn new(photo_size: PhysicalSize, paper: PhysicalSize) -> Self {
        Self {
            photo_size,
            paper,
            copies: 1,
            dpi: PRINT_DPI,
            format: OutputFormat::Png,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }

    /// Number of copies to place (default: 1).
    pub fn copies(mut self, copies: u32) -> Self {
        self.copies = copies;
        self
    }

    /// Pixel density (default: [`PRINT_DPI`]).
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi;
        self
    }

    /// Screen preview density, [`PREVIEW_DPI`].
    pub fn preview(self) -> Self {
        self.dpi(PREVIEW_DPI)
    }

    /// Print density, [`PRINT_DPI`].
    pub fn print(self) -> Self {
        self.dpi(PRINT_DPI)
    }

    /// Export format (default: PNG).
    pub fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// JPEG quality from 0.0 to 1.0 (default: 0.95). Ignored for PNG.
    pub fn quality(mut self, quality: f32) -> Self {
        self.quality = quality;
        self
    }

    /// Grid these settings produce.
    pub fn layout(&self) -> Result<SheetLayout, PassportError> {
        SheetLayout::compute(&self.photo_size, &self.paper, self.dpi)
    }

    /// Render the sheet without encoding it.
    pub fn render(&self, photo: &RgbaImage) -> Result<RgbaImage, PassportError> {
        render_sheet(photo, &self.photo_size, &self.paper, self.copies, self.dpi)
    }

    /// Render and encode the sheet.
    pub fn export(&self, photo: &RgbaImage) -> Result<RenderedSheet, PassportError> {
        if !(0.0..=1.0).contains(&self.quality) {
            return Err(PassportError::InvalidQuality(self.quality));
        }
        let placed = self.layout()?.placed_count(self.copies);
        let sheet = self.render(photo)?;
        let data = encode(&sheet, self.format, self.quality)?;
        Ok(RenderedSheet {
            data,
            format: self.format,
            width: sheet.width(),
            height: sheet.height(),
            placed,
        })
    }
}
