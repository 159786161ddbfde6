//! Offscreen replica of the on-screen preview. The crop rectangle is drawn
//! in container coordinates, so the export pipeline re-renders exactly what
//! the user saw (contain-fit letterboxing included) into a container-sized
//! raster, and crops that.

use crate::camera::CapturedFrame;
use crate::geometry::contain_fit;
use crate::transform::TransformState;
use image::{Rgba, RgbaImage};

const LETTERBOX: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Render `frame` under `transform` into a `container_w` x `container_h`
/// raster, matching the preview's transform order:
/// `translate(center) -> scale(+-zoom) -> rotate -> translate(pan)`.
pub fn compose(
    frame: &CapturedFrame,
    transform: &TransformState,
    container_w: u32,
    container_h: u32,
) -> RgbaImage {
    let mut out = RgbaImage::from_pixel(container_w, container_h, LETTERBOX);

    let fit = contain_fit(
        frame.width as f32,
        frame.height as f32,
        container_w as f32,
        container_h as f32,
    );
    if fit.width <= 0.0 || fit.height <= 0.0 {
        return out;
    }

    let center_x = container_w as f32 / 2.0;
    let center_y = container_h as f32 / 2.0;
    let scale_x = transform.scale_x();
    let scale_y = transform.scale_y();
    if scale_x.abs() < f32::EPSILON || scale_y.abs() < f32::EPSILON {
        return out;
    }

    let theta = transform.rotation_radians();
    let (sin_t, cos_t) = theta.sin_cos();
    let (pan_x, pan_y) = transform.pan();

    let src = frame.rgba.as_ref();
    let src_w = frame.width as f32;
    let src_h = frame.height as f32;

    // Forward: q = center + S * R * (p + pan), with p in image-centered
    // display coordinates spanning the contain-fit size. Walk the output and
    // invert: p = R(-theta) * S^-1 * (q - center) - pan.
    for y in 0..container_h {
        for x in 0..container_w {
            let qx = (x as f32 + 0.5 - center_x) / scale_x;
            let qy = (y as f32 + 0.5 - center_y) / scale_y;

            let px = cos_t * qx + sin_t * qy - pan_x;
            let py = -sin_t * qx + cos_t * qy - pan_y;

            let u = (px + fit.width / 2.0) / fit.width;
            let v = (py + fit.height / 2.0) / fit.height;
            if !(0.0..1.0).contains(&u) || !(0.0..1.0).contains(&v) {
                continue;
            }

            let pixel = sample_bilinear(src, u * src_w - 0.5, v * src_h - 0.5);
            out.put_pixel(x, y, pixel);
        }
    }

    out
}

/// Bilinear sample with edge clamping. `x`/`y` are in source pixel-center
/// coordinates.
fn sample_bilinear(src: &RgbaImage, x: f32, y: f32) -> Rgba<u8> {
    let (w, h) = src.dimensions();
    let max_x = (w - 1) as f32;
    let max_y = (h - 1) as f32;

    let x = x.clamp(0.0, max_x);
    let y = y.clamp(0.0, max_y);

    let x0 = x.floor();
    let y0 = y.floor();
    let fx = x - x0;
    let fy = y - y0;

    let x0 = x0 as u32;
    let y0 = y0 as u32;
    let x1 = (x0 + 1).min(w - 1);
    let y1 = (y0 + 1).min(h - 1);

    let p00 = src.get_pixel(x0, y0);
    let p10 = src.get_pixel(x1, y0);
    let p01 = src.get_pixel(x0, y1);
    let p11 = src.get_pixel(x1, y1);

    let mut blended = [0u8; 4];
    for c in 0..4 {
        let top = p00[c] as f32 * (1.0 - fx) + p10[c] as f32 * fx;
        let bottom = p01[c] as f32 * (1.0 - fx) + p11[c] as f32 * fx;
        blended[c] = (top * (1.0 - fy) + bottom * fy).round() as u8;
    }
    Rgba(blended)
}
