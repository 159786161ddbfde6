//! Coordinate math shared between the live preview and the offscreen
//! compositor: "contain" placement of a source inside a container, and the
//! crop rectangle the user drags over the displayed image.
//!
//! All crop coordinates are in container space (the on-screen display box),
//! not source pixel space. The extractor crops the composited raster, which
//! is container-sized, so the same numbers apply on both sides.

/// Selections narrower or shorter than this count as "no selection".
pub const MIN_CROP_PX: f32 = 10.0;

/// Placement of a source image inside a container under
/// `object-fit: contain` semantics: largest size that fits entirely,
/// aspect preserved, centered on the short axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainFit {
    pub width: f32,
    pub height: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

pub fn contain_fit(source_w: f32, source_h: f32, container_w: f32, container_h: f32) -> ContainFit {
    if source_w <= 0.0 || source_h <= 0.0 || container_w <= 0.0 || container_h <= 0.0 {
        return ContainFit {
            width: 0.0,
            height: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
        };
    }

    let source_aspect = source_w / source_h;
    let container_aspect = container_w / container_h;

    let (width, height) = if source_aspect > container_aspect {
        // Source is wider than the container: pin width, letterbox top/bottom
        (container_w, container_w / source_aspect)
    } else {
        // Source is taller (or equal): pin height, letterbox left/right
        (container_h * source_aspect, container_h)
    };

    ContainFit {
        width,
        height,
        offset_x: (container_w - width) / 2.0,
        offset_y: (container_h - height) / 2.0,
    }
}

/// Axis-aligned crop rectangle in container coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounding box of a drag gesture, clamped to the container.
    /// `anchor` is where the pointer went down, `cursor` where it is now.
    pub fn from_drag(
        anchor: (f32, f32),
        cursor: (f32, f32),
        container_w: f32,
        container_h: f32,
    ) -> Self {
        let x0 = anchor.0.min(cursor.0);
        let y0 = anchor.1.min(cursor.1);
        let x1 = anchor.0.max(cursor.0);
        let y1 = anchor.1.max(cursor.1);

        Self {
            x: x0,
            y: y0,
            width: x1 - x0,
            height: y1 - y0,
        }
        .clamp_to(container_w, container_h)
    }

    /// Clamp the rectangle so it lies fully inside `[0, container_w] x [0, container_h]`.
    pub fn clamp_to(&self, container_w: f32, container_h: f32) -> Self {
        let x = self.x.clamp(0.0, container_w.max(0.0));
        let y = self.y.clamp(0.0, container_h.max(0.0));
        let width = self.width.max(0.0).min(container_w - x);
        let height = self.height.max(0.0).min(container_h - y);

        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether this rectangle counts as a real selection. Tiny rectangles
    /// (accidental clicks) are ignored everywhere they are consumed.
    pub fn is_selection(&self) -> bool {
        self.width > MIN_CROP_PX && self.height > MIN_CROP_PX
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn contain_fit_wide_source_in_tall_container() {
        // 16:9 source in a 4:3 container pins the width
        let fit = contain_fit(1920.0, 1080.0, 400.0, 300.0);
        assert_eq!(fit.width, 400.0);
        assert!((fit.height - 225.0).abs() < 1e-3);
        assert_eq!(fit.offset_x, 0.0);
        assert!((fit.offset_y - 37.5).abs() < 1e-3);
    }

    #[test]
    fn contain_fit_tall_source_in_wide_container() {
        let fit = contain_fit(300.0, 600.0, 800.0, 400.0);
        assert_eq!(fit.height, 400.0);
        assert!((fit.width - 200.0).abs() < 1e-3);
        assert!((fit.offset_x - 300.0).abs() < 1e-3);
        assert_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn contain_fit_matching_aspect_fills_container() {
        let fit = contain_fit(100.0, 100.0, 250.0, 250.0);
        assert_eq!(fit.width, 250.0);
        assert_eq!(fit.height, 250.0);
        assert_eq!(fit.offset_x, 0.0);
        assert_eq!(fit.offset_y, 0.0);
    }

    #[test]
    fn contain_fit_degenerate_inputs_are_empty() {
        let fit = contain_fit(0.0, 100.0, 400.0, 300.0);
        assert_eq!(fit.width, 0.0);
        assert_eq!(fit.height, 0.0);
    }

    #[test]
    fn drag_rect_is_order_independent() {
        let a = CropRect::from_drag((10.0, 20.0), (110.0, 80.0), 400.0, 300.0);
        let b = CropRect::from_drag((110.0, 80.0), (10.0, 20.0), 400.0, 300.0);
        assert_eq!(a, b);
        assert_eq!(a.x, 10.0);
        assert_eq!(a.width, 100.0);
        assert_eq!(a.height, 60.0);
    }

    #[test]
    fn tiny_rect_is_not_a_selection() {
        assert!(!CropRect::new(0.0, 0.0, 10.0, 50.0).is_selection());
        assert!(!CropRect::new(0.0, 0.0, 50.0, 10.0).is_selection());
        assert!(CropRect::new(0.0, 0.0, 11.0, 11.0).is_selection());
    }

    proptest! {
        #[test]
        fn fit_never_exceeds_container(
            sw in 1.0f32..8192.0,
            sh in 1.0f32..8192.0,
            cw in 1.0f32..4096.0,
            ch in 1.0f32..4096.0,
        ) {
            let fit = contain_fit(sw, sh, cw, ch);
            prop_assert!(fit.width <= cw + 1e-3);
            prop_assert!(fit.height <= ch + 1e-3);
            // Exact on at least one axis
            prop_assert!((fit.width - cw).abs() < 1e-3 || (fit.height - ch).abs() < 1e-3);
            // Aspect preserved
            let src_aspect = sw / sh;
            let fit_aspect = fit.width / fit.height;
            prop_assert!((src_aspect - fit_aspect).abs() / src_aspect < 1e-3);
        }

        #[test]
        fn drag_rect_stays_inside_container(
            ax in -500.0f32..1000.0,
            ay in -500.0f32..1000.0,
            bx in -500.0f32..1000.0,
            by in -500.0f32..1000.0,
        ) {
            let rect = CropRect::from_drag((ax, ay), (bx, by), 400.0, 300.0);
            prop_assert!(rect.x >= 0.0);
            prop_assert!(rect.y >= 0.0);
            prop_assert!(rect.x + rect.width <= 400.0 + 1e-3);
            prop_assert!(rect.y + rect.height <= 300.0 + 1e-3);
        }
    }
}
