//! Final stage of the pipeline: extract the selected sub-rectangle from the
//! composited raster (or downscale the whole frame when nothing is
//! selected), encode it as a JPEG and wrap it in a data URI for the caller.

use crate::config::ExportConfig;
use crate::geometry::CropRect;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::RgbaImage;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Nothing to encode: {0}x{1} raster")]
    EmptyRaster(u32, u32),
    #[error("JPEG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Malformed data URI")]
    MalformedDataUri,
    #[error("Invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// The confirmed output, owned by the caller. The pipeline keeps nothing.
#[derive(Debug, Clone)]
pub struct EncodedPhoto {
    pub data_uri: String,
    pub width: u32,
    pub height: u32,
}

const DATA_URI_PREFIX: &str = "data:image/jpeg;base64,";

/// Run the export path appropriate for the selection state: a valid
/// selection crops the composite, anything else ships the whole frame
/// downscaled. The tiny-rectangle threshold is applied here too, so a
/// sub-10px drag behaves exactly like no selection.
pub fn export(
    composite: &RgbaImage,
    selection: Option<CropRect>,
    config: &ExportConfig,
) -> Result<EncodedPhoto, ExportError> {
    match selection {
        Some(rect) if rect.is_selection() => {
            let cropped = extract_crop(composite, rect, config.max_output_width);
            encode_jpeg_data_uri(&cropped, config.jpeg_quality_crop)
        }
        _ => {
            let shrunk = shrink_full(composite, config.max_output_width);
            encode_jpeg_data_uri(&shrunk, config.jpeg_quality_full)
        }
    }
}

/// Copy `rect` out of the composite, downscaling proportionally when the
/// selection is wider than `max_width`.
pub fn extract_crop(composite: &RgbaImage, rect: CropRect, max_width: u32) -> RgbaImage {
    let (comp_w, comp_h) = composite.dimensions();
    if comp_w == 0 || comp_h == 0 {
        return composite.clone();
    }
    let rect = rect.clamp_to(comp_w as f32, comp_h as f32);

    let x = (rect.x.round() as u32).min(comp_w - 1);
    let y = (rect.y.round() as u32).min(comp_h - 1);
    let w = (rect.width.round() as u32).clamp(1, comp_w.saturating_sub(x).max(1));
    let h = (rect.height.round() as u32).clamp(1, comp_h.saturating_sub(y).max(1));

    let cropped = image::imageops::crop_imm(composite, x, y, w, h).to_image();

    if w > max_width && max_width > 0 {
        let scale = max_width as f32 / w as f32;
        let out_h = ((h as f32 * scale).round() as u32).max(1);
        image::imageops::resize(&cropped, max_width, out_h, FilterType::Triangle)
    } else {
        cropped
    }
}

/// No-selection path: the whole composite, letterboxing included, scaled
/// down to at most `max_width` wide.
pub fn shrink_full(composite: &RgbaImage, max_width: u32) -> RgbaImage {
    let (w, h) = composite.dimensions();
    if w == 0 || h == 0 || max_width == 0 || w <= max_width {
        return composite.clone();
    }

    let scale = max_width as f32 / w as f32;
    let out_h = ((h as f32 * scale).round() as u32).max(1);
    image::imageops::resize(composite, max_width, out_h, FilterType::Triangle)
}

/// JPEG-encode a raster and wrap it as a base64 data URI.
pub fn encode_jpeg_data_uri(raster: &RgbaImage, quality: u8) -> Result<EncodedPhoto, ExportError> {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyRaster(width, height));
    }

    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgba8(raster.clone()).to_rgb8();

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&rgb)?;

    Ok(EncodedPhoto {
        data_uri: format!("{DATA_URI_PREFIX}{}", BASE64.encode(&bytes)),
        width,
        height,
    })
}

/// Decode a data URI produced by [`encode_jpeg_data_uri`] back into pixels.
/// Used by embedders that want to display the confirmed photo.
pub fn decode_data_uri(data_uri: &str) -> Result<RgbaImage, ExportError> {
    let payload = data_uri
        .strip_prefix(DATA_URI_PREFIX)
        .ok_or(ExportError::MalformedDataUri)?;
    let bytes = BASE64.decode(payload)?;
    Ok(image::load_from_memory(&bytes)?.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;
    use proptest::prelude::*;

    fn gradient(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
        })
    }

    fn default_config() -> ExportConfig {
        ExportConfig::default()
    }

    #[test]
    fn oversized_crop_scales_to_max_width() {
        // 1500x900 selection with an 800px cap comes out 800x480
        let composite = gradient(1600, 1000);
        let rect = CropRect::new(50.0, 50.0, 1500.0, 900.0);

        let out = extract_crop(&composite, rect, 800);
        assert_eq!(out.dimensions(), (800, 480));
    }

    #[test]
    fn small_crop_keeps_its_own_size() {
        let composite = gradient(1000, 800);
        let rect = CropRect::new(100.0, 200.0, 300.0, 150.0);

        let out = extract_crop(&composite, rect, 800);
        assert_eq!(out.dimensions(), (300, 150));
        // Top-left pixel comes from (100, 200)
        assert_eq!(out.get_pixel(0, 0), composite.get_pixel(100, 200));
    }

    #[test]
    fn crop_is_clamped_to_the_composite() {
        let composite = gradient(400, 300);
        let rect = CropRect::new(350.0, 250.0, 500.0, 500.0);

        let out = extract_crop(&composite, rect, 800);
        assert_eq!(out.dimensions(), (50, 50));
    }

    #[test]
    fn tiny_selection_takes_the_full_frame_path() {
        let composite = gradient(1200, 900);
        let tiny = CropRect::new(10.0, 10.0, 10.0, 200.0);

        let out = export(&composite, Some(tiny), &default_config()).unwrap();
        let none = export(&composite, None, &default_config()).unwrap();
        assert_eq!((out.width, out.height), (none.width, none.height));
        assert_eq!(out.width, 800);
    }

    #[test]
    fn full_frame_narrower_than_cap_is_untouched() {
        let composite = gradient(640, 480);
        let out = shrink_full(&composite, 800);
        assert_eq!(out.dimensions(), (640, 480));
    }

    #[test]
    fn full_frame_keeps_container_aspect() {
        // The letterboxed composite is what ships, so the output aspect is
        // the container's, not the raw source's
        let composite = gradient(1200, 900);
        let out = shrink_full(&composite, 800);
        assert_eq!(out.dimensions(), (800, 600));
    }

    #[test]
    fn encode_produces_a_jpeg_data_uri() {
        let raster = gradient(64, 48);
        let photo = encode_jpeg_data_uri(&raster, 90).unwrap();
        assert!(photo.data_uri.starts_with("data:image/jpeg;base64,"));
        assert_eq!((photo.width, photo.height), (64, 48));
    }

    #[test]
    fn encode_rejects_empty_raster() {
        let raster = RgbaImage::new(0, 0);
        let err = encode_jpeg_data_uri(&raster, 90).unwrap_err();
        assert!(matches!(err, ExportError::EmptyRaster(0, 0)));
    }

    #[test]
    fn data_uri_round_trips_to_pixels() {
        let raster = gradient(64, 48);
        let photo = encode_jpeg_data_uri(&raster, 95).unwrap();
        let decoded = decode_data_uri(&photo.data_uri).unwrap();
        assert_eq!(decoded.dimensions(), (64, 48));
    }

    #[test]
    fn decode_rejects_foreign_strings() {
        assert!(matches!(
            decode_data_uri("data:image/png;base64,AAAA"),
            Err(ExportError::MalformedDataUri)
        ));
        assert!(decode_data_uri("data:image/jpeg;base64,!!!").is_err());
    }

    proptest! {
        #[test]
        fn crop_output_never_exceeds_the_cap(
            x in 0.0f32..1000.0,
            y in 0.0f32..700.0,
            w in 11.0f32..1600.0,
            h in 11.0f32..1200.0,
        ) {
            let composite = gradient(1024, 768);
            let out = extract_crop(&composite, CropRect::new(x, y, w, h), 800);
            prop_assert!(out.width() <= 800);
            prop_assert!(out.width() >= 1 && out.height() >= 1);
        }
    }
}
