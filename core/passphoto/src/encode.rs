use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ImageEncoder, ImageFormat, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::PassportError;

/// JPEG quality used when none is given.
pub const DEFAULT_JPEG_QUALITY: f32 = 0.95;

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Lossless PNG, preferred for print.
    #[default]
    Png,

    /// JPEG, flattened onto white.
    Jpeg,
}

impl OutputFormat {
    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
            OutputFormat::Jpeg => "jpg",
        }
    }

    /// MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Png => "image/png",
            OutputFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Detect the input image format from the raw bytes.
pub(crate) fn detect_format(input: &[u8]) -> Result<ImageFormat, PassportError> {
    image::guess_format(input).map_err(|e| PassportError::ImageDecode(e.to_string()))
}

/// Decode user-supplied bytes (JPEG, PNG or WebP) into an RGBA raster.
pub fn decode_image(input: &[u8]) -> Result<RgbaImage, PassportError> {
    let format = detect_format(input)?;
    let decoded = image::load_from_memory_with_format(input, format)
        .map_err(|e| PassportError::ImageDecode(e.to_string()))?;
    if decoded.width() == 0 || decoded.height() == 0 {
        return Err(PassportError::ZeroDimensions);
    }
    Ok(decoded.to_rgba8())
}

/// Composite `image` onto a solid `background`, dropping alpha.
pub(crate) fn flatten_alpha(image: &RgbaImage, background: Color) -> RgbImage {
    let bg = [background.r, background.g, background.b];
    let mut rgb = RgbImage::new(image.width(), image.height());

    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as f32 / 255.0;
        let mix =
            |c: u8, under: u8| (c as f32 * alpha + under as f32 * (1.0 - alpha)).round() as u8;
        rgb.put_pixel(x, y, image::Rgb([mix(r, bg[0]), mix(g, bg[1]), mix(b, bg[2])]));
    }

    rgb
}

/// Encode `image` as `format`. `quality` (0.0 to 1.0) only affects JPEG.
pub fn encode(
    image: &RgbaImage,
    format: OutputFormat,
    quality: f32,
) -> Result<Vec<u8>, PassportError> {
    if !(0.0..=1.0).contains(&quality) {
        return Err(PassportError::InvalidQuality(quality));
    }
    let mut buffer = Vec::new();

    match format {
        OutputFormat::Png => {
            PngEncoder::new(&mut buffer)
                .write_image(
                    image.as_raw(),
                    image.width(),
                    image.height(),
                    image::ExtendedColorType::Rgba8,
                )
                .map_err(|e| PassportError::Encode(e.to_string()))?;
        }
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel.
            let rgb = flatten_alpha(image, Color::WHITE);
            let quality_percent = ((quality * 100.0).round() as u8).max(1);
            JpegEncoder::new_with_quality(&mut buffer, quality_percent)
                .write_image(
                    rgb.as_raw(),
                    rgb.width(),
                    rgb.height(),
                    image::ExtendedColorType::Rgb8,
                )
                .map_err(|e| PassportError::Encode(e.to_string()))?;
        }
    }

    Ok(buffer)
}

/// Wrap encoded bytes in a `data:` URL.
pub fn to_data_url(data: &[u8], format: OutputFormat) -> String {
    format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(data))
}

/// Download name for a sheet, e.g. `passport-photos-A4-8pcs.png`.
pub fn export_filename(paper_name: &str, copies: u32, format: OutputFormat) -> String {
    format!("passport-photos-{paper_name}-{copies}pcs.{}", format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn make_test_rgba(width: u32, height: u32) -> RgbaImage {
        let mut img = RgbaImage::new(width, height);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            *pixel = Rgba([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                128,
                255,
            ]);
        }
        img
    }

    #[test]
    fn png_round_trips_losslessly() {
        let img = make_test_rgba(32, 24);
        let data = encode(&img, OutputFormat::Png, DEFAULT_JPEG_QUALITY).unwrap();
        assert_eq!(&data[1..4], b"PNG");
        let decoded = decode_image(&data).unwrap();
        assert_eq!(decoded, img);
    }

    #[test]
    fn encode_jpeg_produces_valid_output() {
        let img = make_test_rgba(48, 64);
        let data = encode(&img, OutputFormat::Jpeg, 0.95).unwrap();
        // JPEG magic bytes
        assert_eq!(data[0], 0xFF);
        assert_eq!(data[1], 0xD8);
        assert_eq!(decode_image(&data).unwrap().dimensions(), (48, 64));
    }

    #[test]
    fn lower_quality_jpeg_is_smaller() {
        let img = make_test_rgba(64, 64);
        let high = encode(&img, OutputFormat::Jpeg, 0.95).unwrap();
        let low = encode(&img, OutputFormat::Jpeg, 0.2).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn quality_out_of_range_is_rejected() {
        let img = make_test_rgba(4, 4);
        assert!(matches!(
            encode(&img, OutputFormat::Jpeg, 1.5),
            Err(PassportError::InvalidQuality(_))
        ));
        assert!(encode(&img, OutputFormat::Png, -0.1).is_err());
    }

    #[test]
    fn flatten_alpha_composites_over_background() {
        let mut rgba = RgbaImage::new(3, 1);
        rgba.put_pixel(0, 0, Rgba([255, 0, 0, 0]));
        rgba.put_pixel(1, 0, Rgba([100, 150, 200, 255]));
        rgba.put_pixel(2, 0, Rgba([255, 0, 0, 128]));
        let rgb = flatten_alpha(&rgba, Color::WHITE);
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [100, 150, 200]);
        let half = rgb.get_pixel(2, 0).0;
        assert_eq!(half[0], 255);
        assert!((half[1] as i16 - 127).abs() <= 1);

        let blue = flatten_alpha(&rgba, Color::new(0, 0, 255));
        assert_eq!(blue.get_pixel(0, 0).0, [0, 0, 255]);
    }

    #[test]
    fn garbage_input_is_a_decode_error() {
        assert!(matches!(
            decode_image(b"not an image"),
            Err(PassportError::ImageDecode(_))
        ));
        // PNG signature followed by nothing useful.
        assert!(matches!(
            decode_image(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0]),
            Err(PassportError::ImageDecode(_))
        ));
    }

    #[test]
    fn data_url_has_mime_prefix() {
        let url = to_data_url(&[1, 2, 3], OutputFormat::Png);
        assert_eq!(url, "data:image/png;base64,AQID");
        assert!(to_data_url(&[], OutputFormat::Jpeg).starts_with("data:image/jpeg;base64,"));
    }

    #[test]
    fn export_filename_encodes_paper_and_count() {
        assert_eq!(
            export_filename("A4", 8, OutputFormat::Png),
            "passport-photos-A4-8pcs.png"
        );
        assert_eq!(
            export_filename("4R", 6, OutputFormat::Jpeg),
            "passport-photos-4R-6pcs.jpg"
        );
    }
}
