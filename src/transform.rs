//! User-adjustable view transform for a captured still: zoom, 90-degree
//! rotation steps, mirror flips and pan. All clamping lives here so the
//! dialog and the viewer cannot disagree about the allowed ranges.

/// Where the transform is being driven from. The editor allows zooming out
/// below 1x to see the whole letterboxed frame; the full-screen viewer only
/// magnifies and snaps back to rest at 1x.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomMode {
    Editor,
    Viewer,
}

impl ZoomMode {
    fn zoom_range(self) -> (f32, f32) {
        match self {
            ZoomMode::Editor => (0.5, 3.0),
            ZoomMode::Viewer => (1.0, 5.0),
        }
    }
}

/// Pan offsets are slider-driven in the editor and limited to this many
/// pixels either way. Viewer panning accumulates drag deltas unconstrained.
pub const EDITOR_PAN_LIMIT: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformState {
    mode: ZoomMode,
    zoom: f32,
    rotation_degrees: i32,
    flip_h: bool,
    flip_v: bool,
    pan_x: f32,
    pan_y: f32,
    // Transform origin as a fraction of the container, recomputed from the
    // gesture position on every viewer zoom change.
    origin_x: f32,
    origin_y: f32,
}

impl TransformState {
    pub fn new(mode: ZoomMode) -> Self {
        Self {
            mode,
            zoom: 1.0,
            rotation_degrees: 0,
            flip_h: false,
            flip_v: false,
            pan_x: 0.0,
            pan_y: 0.0,
            origin_x: 0.5,
            origin_y: 0.5,
        }
    }

    /// Back to the untouched state: 1x, no rotation, no flips, centered.
    pub fn reset(&mut self) {
        *self = Self::new(self.mode);
    }

    // === Zoom ===

    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    /// Set the zoom factor, clamped to the mode's range. In viewer mode,
    /// arriving at (or below) 1x also resets pan and origin so the image
    /// comes to rest centered.
    pub fn set_zoom(&mut self, zoom: f32) {
        let (min, max) = self.mode.zoom_range();
        self.zoom = zoom.clamp(min, max);

        if self.mode == ZoomMode::Viewer && self.zoom <= 1.0 {
            self.pan_x = 0.0;
            self.pan_y = 0.0;
            self.origin_x = 0.5;
            self.origin_y = 0.5;
        }
    }

    /// Incremental zoom (wheel notches).
    pub fn zoom_by(&mut self, delta: f32) {
        self.set_zoom(self.zoom + delta);
    }

    /// Multiplicative zoom (pinch gestures).
    pub fn multiply_zoom(&mut self, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.set_zoom(self.zoom * factor);
        }
    }

    /// Double-click/tap: toggle between rest and the configured magnified
    /// level, anchored at the gesture position.
    pub fn double_click_zoom(
        &mut self,
        point: (f32, f32),
        container: (f32, f32),
        level: f32,
    ) {
        if self.zoom > 1.0 {
            self.set_zoom(1.0);
        } else {
            self.set_origin_from_point(point, container);
            self.set_zoom(level);
        }
    }

    // === Rotation ===

    pub fn rotation_degrees(&self) -> i32 {
        self.rotation_degrees
    }

    pub fn rotation_radians(&self) -> f32 {
        (self.rotation_degrees as f32).to_radians()
    }

    pub fn rotate_left(&mut self) {
        self.apply_rotation(-90);
    }

    pub fn rotate_right(&mut self) {
        self.apply_rotation(90);
    }

    fn apply_rotation(&mut self, degrees: i32) {
        // Signed modulo keeps the stored value in (-360, 360)
        self.rotation_degrees = (self.rotation_degrees + degrees) % 360;
    }

    // === Flips ===

    pub fn flip_h(&self) -> bool {
        self.flip_h
    }

    pub fn flip_v(&self) -> bool {
        self.flip_v
    }

    pub fn toggle_flip_h(&mut self) {
        self.flip_h = !self.flip_h;
    }

    pub fn toggle_flip_v(&mut self) {
        self.flip_v = !self.flip_v;
    }

    /// Render-time horizontal scale: the flip inverts the sign of the axis.
    pub fn scale_x(&self) -> f32 {
        if self.flip_h {
            -self.zoom
        } else {
            self.zoom
        }
    }

    pub fn scale_y(&self) -> f32 {
        if self.flip_v {
            -self.zoom
        } else {
            self.zoom
        }
    }

    // === Pan ===

    pub fn pan(&self) -> (f32, f32) {
        (self.pan_x, self.pan_y)
    }

    /// Absolute pan (editor sliders), clamped to the editor limit.
    pub fn pan_to(&mut self, x: f32, y: f32) {
        self.pan_x = x.clamp(-EDITOR_PAN_LIMIT, EDITOR_PAN_LIMIT);
        self.pan_y = y.clamp(-EDITOR_PAN_LIMIT, EDITOR_PAN_LIMIT);
    }

    /// Relative pan (viewer drags), unconstrained.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    // === Origin ===

    /// Transform origin as container fractions in `[0, 1]`.
    pub fn origin(&self) -> (f32, f32) {
        (self.origin_x, self.origin_y)
    }

    pub fn set_origin_from_point(&mut self, point: (f32, f32), container: (f32, f32)) {
        if container.0 > 0.0 && container.1 > 0.0 {
            self.origin_x = (point.0 / container.0).clamp(0.0, 1.0);
            self.origin_y = (point.1 / container.1).clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rotation_steps_normalize_with_sign() {
        let mut t = TransformState::new(ZoomMode::Editor);
        for _ in 0..5 {
            t.rotate_right();
        }
        assert_eq!(t.rotation_degrees(), 90); // 450 % 360

        t.reset();
        for _ in 0..3 {
            t.rotate_left();
        }
        assert_eq!(t.rotation_degrees(), -270);
        t.rotate_left();
        assert_eq!(t.rotation_degrees(), 0); // -360 wraps to 0
    }

    #[test]
    fn flips_invert_scale_sign() {
        let mut t = TransformState::new(ZoomMode::Editor);
        t.set_zoom(2.0);
        assert_eq!(t.scale_x(), 2.0);
        t.toggle_flip_h();
        assert_eq!(t.scale_x(), -2.0);
        assert_eq!(t.scale_y(), 2.0);
        t.toggle_flip_v();
        assert_eq!(t.scale_y(), -2.0);
        t.toggle_flip_h();
        assert_eq!(t.scale_x(), 2.0);
    }

    #[test]
    fn viewer_zoom_at_rest_recenters() {
        let mut t = TransformState::new(ZoomMode::Viewer);
        t.set_origin_from_point((100.0, 50.0), (400.0, 200.0));
        t.set_zoom(3.0);
        t.pan_by(40.0, -25.0);

        t.zoom_by(-10.0); // way past the floor
        assert_eq!(t.zoom(), 1.0);
        assert_eq!(t.pan(), (0.0, 0.0));
        assert_eq!(t.origin(), (0.5, 0.5));
    }

    #[test]
    fn double_click_toggles_between_rest_and_level() {
        let mut t = TransformState::new(ZoomMode::Viewer);
        t.double_click_zoom((300.0, 150.0), (400.0, 200.0), 2.5);
        assert_eq!(t.zoom(), 2.5);
        assert_eq!(t.origin(), (0.75, 0.75));

        t.double_click_zoom((10.0, 10.0), (400.0, 200.0), 2.5);
        assert_eq!(t.zoom(), 1.0);
        assert_eq!(t.origin(), (0.5, 0.5));
    }

    #[test]
    fn editor_pan_is_clamped_viewer_pan_is_not() {
        let mut editor = TransformState::new(ZoomMode::Editor);
        editor.pan_to(500.0, -500.0);
        assert_eq!(editor.pan(), (100.0, -100.0));

        let mut viewer = TransformState::new(ZoomMode::Viewer);
        viewer.set_zoom(2.0);
        viewer.pan_by(500.0, -500.0);
        viewer.pan_by(500.0, -500.0);
        assert_eq!(viewer.pan(), (1000.0, -1000.0));
    }

    proptest! {
        #[test]
        fn editor_zoom_always_in_range(deltas in proptest::collection::vec(-10.0f32..10.0, 0..40)) {
            let mut t = TransformState::new(ZoomMode::Editor);
            for d in deltas {
                t.zoom_by(d);
                prop_assert!(t.zoom() >= 0.5 && t.zoom() <= 3.0);
            }
        }

        #[test]
        fn viewer_zoom_always_in_range(factors in proptest::collection::vec(0.01f32..100.0, 0..40)) {
            let mut t = TransformState::new(ZoomMode::Viewer);
            for f in factors {
                t.multiply_zoom(f);
                prop_assert!(t.zoom() >= 1.0 && t.zoom() <= 5.0);
            }
        }

        #[test]
        fn rotation_matches_net_turns(turns in proptest::collection::vec(proptest::bool::ANY, 0..50)) {
            let mut t = TransformState::new(ZoomMode::Editor);
            let mut net: i64 = 0;
            for right in turns {
                if right {
                    t.rotate_right();
                    net += 90;
                } else {
                    t.rotate_left();
                    net -= 90;
                }
            }
            let stored = t.rotation_degrees() as i64;
            prop_assert!(stored > -360 && stored < 360);
            prop_assert_eq!(stored.rem_euclid(360), net.rem_euclid(360));
        }
    }
}
