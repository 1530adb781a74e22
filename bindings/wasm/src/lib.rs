use image::RgbaImage;
use passphoto::{
    catalog, FaceBounds, FaceDetector, FaceLocator, MaskKind, OutputFormat, PassportError,
    PhysicalSize, PrecomputedSegmentation, SheetSpec,
};
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

/// A face box found by the browser's own detector.
#[derive(Deserialize, Clone, Copy)]
pub struct FaceBoxOption {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Options for `cropToPassport`. All fields are optional.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CropOptions {
    pub aspect_ratio: Option<f64>,
    pub face_box: Option<FaceBoxOption>,
}

/// Options for `replaceBackground`. All fields are optional.
#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BackgroundOptions {
    pub color: Option<String>,
    pub mask_kind: Option<String>,
}

/// A size given either as a catalog id or as an explicit physical size.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum SizeOption {
    Id(String),
    Size(PhysicalSize),
}

/// Options for `renderSheet`.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetOptions {
    pub photo_size: SizeOption,
    pub paper_size: SizeOption,
    #[serde(default)]
    pub copies: Option<u32>,
    #[serde(default)]
    pub dpi: Option<u32>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub quality: Option<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Catalog {
    photo_sizes: &'static [catalog::PhotoSizeEntry],
    paper_layouts: &'static [catalog::PaperLayoutEntry],
    background_colors: &'static [catalog::BackgroundEntry],
}

/// Hands a box detected in JS to the face locator.
struct SuppliedFace(FaceBoxOption);

impl FaceDetector for SuppliedFace {
    fn detect(&self, _: &[u8], _: u32, _: u32) -> Result<Vec<FaceBounds>, PassportError> {
        let FaceBoxOption {
            x,
            y,
            width,
            height,
        } = self.0;
        Ok(vec![FaceBounds {
            x,
            y,
            width,
            height,
            confidence: 1.0,
        }])
    }
}

/// Create a JS `Error` with a `code` property.
fn make_error(code: &str, message: &str) -> JsValue {
    let err = js_sys::Error::new(message);
    let _ = js_sys::Reflect::set(&err, &"code".into(), &JsValue::from_str(code));
    JsValue::from(err)
}

/// Convert a `PassportError` into a JS `Error` with a machine-readable `code` property.
fn to_js_error(e: PassportError) -> JsValue {
    let code = match &e {
        PassportError::ImageDecode(_) => "DECODE_ERROR",
        PassportError::ZeroDimensions => "ZERO_DIMENSIONS",
        PassportError::Segmentation(_) => "SEGMENTATION_ERROR",
        PassportError::FaceNotDetected => "FACE_NOT_DETECTED",
        PassportError::Detector(_) => "DETECTOR_ERROR",
        PassportError::Canvas(_) => "CANVAS_ERROR",
        PassportError::Encode(_) => "ENCODE_ERROR",
        PassportError::InvalidAspectRatio(_) => "INVALID_ASPECT_RATIO",
        PassportError::InvalidDpi(_) => "INVALID_DPI",
        PassportError::InvalidPhysicalSize => "INVALID_PHYSICAL_SIZE",
        PassportError::InvalidQuality(_) => "INVALID_QUALITY",
        PassportError::MaskMismatch { .. } => "MASK_MISMATCH",
    };
    make_error(code, &e.to_string())
}

fn parse_options<T: for<'de> Deserialize<'de> + Default>(options: JsValue) -> Result<T, JsValue> {
    if options.is_undefined() || options.is_null() {
        Ok(T::default())
    } else {
        serde_wasm_bindgen::from_value(options)
            .map_err(|e| make_error("INVALID_OPTIONS", &format!("invalid options: {e}")))
    }
}

fn string_to_format(format: &str) -> Result<OutputFormat, JsValue> {
    match format {
        "png" => Ok(OutputFormat::Png),
        "jpeg" | "jpg" => Ok(OutputFormat::Jpeg),
        _ => Err(make_error(
            "INVALID_OPTIONS",
            &format!("unknown format: {format}"),
        )),
    }
}

fn string_to_mask_kind(kind: &str) -> Result<MaskKind, JsValue> {
    match kind {
        "foreground" => Ok(MaskKind::Foreground),
        "background" => Ok(MaskKind::Background),
        _ => Err(make_error(
            "INVALID_OPTIONS",
            &format!("unknown mask kind: {kind}"),
        )),
    }
}

/// Resolve a size option against the catalog. Returns the size and, for
/// catalog entries, the display name.
fn resolve_size(
    option: SizeOption,
    lookup: impl Fn(&str) -> Option<(PhysicalSize, &'static str)>,
) -> Result<(PhysicalSize, Option<&'static str>), JsValue> {
    match option {
        SizeOption::Size(size) => Ok((size, None)),
        SizeOption::Id(id) => lookup(&id)
            .map(|(size, name)| (size, Some(name)))
            .ok_or_else(|| make_error("INVALID_OPTIONS", &format!("unknown size id: {id}"))),
    }
}

/// Build a plain JS object describing an encoded image.
fn build_image_object(
    data: &[u8],
    format: OutputFormat,
    width: u32,
    height: u32,
) -> Result<js_sys::Object, JsValue> {
    let obj = js_sys::Object::new();
    let bytes = js_sys::Uint8Array::from(data);
    js_sys::Reflect::set(&obj, &"data".into(), &bytes)?;
    js_sys::Reflect::set(
        &obj,
        &"format".into(),
        &JsValue::from_str(format.extension()),
    )?;
    js_sys::Reflect::set(&obj, &"width".into(), &JsValue::from(width))?;
    js_sys::Reflect::set(&obj, &"height".into(), &JsValue::from(height))?;
    Ok(obj)
}

fn encode_png(image: &RgbaImage) -> Result<JsValue, JsValue> {
    let data = passphoto::encode(image, OutputFormat::Png, 1.0).map_err(to_js_error)?;
    build_image_object(&data, OutputFormat::Png, image.width(), image.height()).map(JsValue::from)
}

/// Parse `#RRGGBB` into `{ r, g, b }`. Never throws; invalid input is white.
#[wasm_bindgen(js_name = "parseHexColor")]
pub fn parse_hex_color(input: &str) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&passphoto::parse_hex_color(input))
        .map_err(|e| make_error("INTERNAL", &e.to_string()))
}

/// Built-in photo sizes, paper layouts and background colours.
#[wasm_bindgen(js_name = "catalog")]
pub fn catalog_tables() -> Result<JsValue, JsValue> {
    let tables = Catalog {
        photo_sizes: catalog::PHOTO_SIZES,
        paper_layouts: catalog::PAPER_LAYOUTS,
        background_colors: catalog::BACKGROUND_COLORS,
    };
    serde_wasm_bindgen::to_value(&tables).map_err(|e| make_error("INTERNAL", &e.to_string()))
}

/// Size `{ width, height }` at which a segmentation mask must be supplied
/// to `replaceBackground` for an image of the given size.
#[wasm_bindgen(js_name = "workingDimensions")]
pub fn working_dimensions(width: u32, height: u32) -> Result<JsValue, JsValue> {
    let (w, h) = passphoto::working_dimensions(width, height);
    let obj = js_sys::Object::new();
    js_sys::Reflect::set(&obj, &"width".into(), &JsValue::from(w))?;
    js_sys::Reflect::set(&obj, &"height".into(), &JsValue::from(h))?;
    Ok(JsValue::from(obj))
}

/// Crop a portrait around its face to a passport aspect ratio.
///
/// @param input - Raw image bytes (JPEG, PNG, or WebP)
/// @param options - Optional object with fields: aspectRatio, faceBox
///   (`{ x, y, width, height }` from the browser's FaceDetector; when absent
///   the heuristic box is used)
#[wasm_bindgen(js_name = "cropToPassport")]
pub fn crop_to_passport(input: Vec<u8>, options: JsValue) -> Result<JsValue, JsValue> {
    let opts: CropOptions = parse_options(options)?;
    let image = passphoto::decode_image(&input).map_err(to_js_error)?;

    let detector = opts
        .face_box
        .map(|face| Box::new(SuppliedFace(face)) as Box<dyn FaceDetector>);
    let locator = FaceLocator::from_capability(detector);
    let aspect_ratio = opts.aspect_ratio.unwrap_or(passphoto::DEFAULT_ASPECT_RATIO);

    let cropped =
        passphoto::crop_to_passport(&image, &locator, aspect_ratio).map_err(to_js_error)?;
    encode_png(&cropped)
}

/// Composite a portrait onto a solid background using a mask computed in JS.
///
/// @param input - Raw image bytes (JPEG, PNG, or WebP)
/// @param mask - One confidence per pixel at `workingDimensions` of the image
/// @param options - Optional object with fields: color (`#RRGGBB`, default
///   white), maskKind (`"foreground"` or `"background"`, default foreground)
#[wasm_bindgen(js_name = "replaceBackground")]
pub fn replace_background(
    input: Vec<u8>,
    mask: Vec<f32>,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    let opts: BackgroundOptions = parse_options(options)?;
    let color = passphoto::parse_hex_color(opts.color.as_deref().unwrap_or("#FFFFFF"));
    let kind = match opts.mask_kind.as_deref() {
        Some(kind) => string_to_mask_kind(kind)?,
        None => MaskKind::Foreground,
    };

    let image = passphoto::decode_image(&input).map_err(to_js_error)?;
    let (w, h) = passphoto::working_dimensions(image.width(), image.height());
    let model = PrecomputedSegmentation::new(w, h, mask, kind);

    let cutout = passphoto::segment(&image, &model).map_err(to_js_error)?;
    let composed = passphoto::composite_cutout(&cutout, color).map_err(to_js_error)?;
    encode_png(&composed)
}

/// Lay copies of a photo out on a paper sheet and encode the result.
///
/// @param input - Raw image bytes of the (already cropped) photo
/// @param options - Object with fields: photoSize, paperSize (catalog id or
///   `{ width, height, unit }`), copies (default: sheet capacity), dpi
///   (default 300; use 96 for previews), format (`"png"` or `"jpeg"`),
///   quality (JPEG only, default 0.95)
#[wasm_bindgen(js_name = "renderSheet")]
pub fn render_sheet(input: Vec<u8>, options: JsValue) -> Result<JsValue, JsValue> {
    let opts: SheetOptions = serde_wasm_bindgen::from_value(options)
        .map_err(|e| make_error("INVALID_OPTIONS", &format!("invalid options: {e}")))?;

    let (photo_size, _) = resolve_size(opts.photo_size, |id| {
        catalog::photo_size(id).map(|entry| (entry.size, entry.name))
    })?;
    let (paper_size, paper_name) = resolve_size(opts.paper_size, |id| {
        catalog::paper_layout(id).map(|entry| (entry.size, entry.name))
    })?;

    let mut spec = SheetSpec::new(photo_size, paper_size);
    if let Some(dpi) = opts.dpi {
        spec = spec.dpi(dpi);
    }
    if let Some(ref fmt) = opts.format {
        spec = spec.format(string_to_format(fmt)?);
    }
    if let Some(q) = opts.quality {
        spec = spec.quality(q);
    }
    let copies = match opts.copies {
        Some(n) => n,
        None => spec.layout().map_err(to_js_error)?.capacity(),
    };
    let spec = spec.copies(copies);

    let photo = passphoto::decode_image(&input).map_err(to_js_error)?;
    let sheet = spec.export(&photo).map_err(to_js_error)?;

    let obj = build_image_object(&sheet.data, sheet.format, sheet.width, sheet.height)?;
    js_sys::Reflect::set(&obj, &"placed".into(), &JsValue::from(sheet.placed))?;
    let filename =
        passphoto::export_filename(paper_name.unwrap_or("custom"), sheet.placed, sheet.format);
    js_sys::Reflect::set(&obj, &"filename".into(), &JsValue::from_str(&filename))?;
    Ok(JsValue::from(obj))
}

/// Wrap encoded bytes in a `data:` URL for `<img src>`.
#[wasm_bindgen(js_name = "toDataUrl")]
pub fn to_data_url(data: Vec<u8>, format: &str) -> Result<String, JsValue> {
    Ok(passphoto::to_data_url(&data, string_to_format(format)?))
}
