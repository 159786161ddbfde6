//! Full-screen viewer for the confirmed photo. Magnify-only gestures:
//! wheel and pinch zoom clamped to [1, 5], free drag panning, and a
//! double-click toggle between rest and the configured magnified level,
//! always anchored at the gesture position.

use crate::config::EditorConfig;
use crate::geometry::contain_fit;
use crate::transform::{TransformState, ZoomMode};
use eframe::egui::{
    self, Color32, ColorImage, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2,
};
use image::RgbaImage;

pub struct Viewer {
    raster: RgbaImage,
    texture: Option<TextureHandle>,
    transform: TransformState,
}

impl Viewer {
    pub fn new(raster: RgbaImage) -> Self {
        Self {
            raster,
            texture: None,
            transform: TransformState::new(ZoomMode::Viewer),
        }
    }

    /// Render the viewer window. Returns false once it has been closed.
    pub fn show(&mut self, ctx: &egui::Context, editor: &EditorConfig) -> bool {
        let mut open = true;
        let screen = ctx.screen_rect();

        egui::Window::new("Photo")
            .open(&mut open)
            .collapsible(false)
            .default_size(screen.size() * 0.9)
            .show(ctx, |ui| {
                self.ensure_texture(ui.ctx());

                let available = ui.available_size().max(Vec2::new(160.0, 120.0));
                let (rect, response) = ui.allocate_exact_size(available, Sense::click_and_drag());
                let container = (rect.width(), rect.height());
                let local = |pos: Pos2| (pos.x - rect.min.x, pos.y - rect.min.y);

                // Wheel zoom, anchored at the hover point
                let scroll = ui.input(|i| i.raw_scroll_delta.y);
                if response.hovered() && scroll != 0.0 {
                    if let Some(point) = response.hover_pos().map(local) {
                        self.transform.set_origin_from_point(point, container);
                    }
                    let step = if scroll > 0.0 {
                        editor.wheel_zoom_step
                    } else {
                        -editor.wheel_zoom_step
                    };
                    self.transform.zoom_by(step);
                }

                // Pinch zoom: egui reports a per-frame multiplicative factor,
                // whose running product is the gesture ratio
                let pinch = ui.input(|i| i.zoom_delta());
                if response.hovered() && (pinch - 1.0).abs() > f32::EPSILON {
                    if let Some(point) = response.hover_pos().map(local) {
                        self.transform.set_origin_from_point(point, container);
                    }
                    self.transform.multiply_zoom(pinch);
                }

                if response.dragged() {
                    let delta = response.drag_delta();
                    self.transform.pan_by(delta.x, delta.y);
                }

                if response.double_clicked() {
                    if let Some(point) = response.interact_pointer_pos().map(local) {
                        self.transform
                            .double_click_zoom(point, container, editor.double_tap_zoom);
                    }
                }

                self.paint(ui, rect);
            });

        open
    }

    fn ensure_texture(&mut self, ctx: &egui::Context) {
        if self.texture.is_some() {
            return;
        }
        let (w, h) = self.raster.dimensions();
        let color = ColorImage::from_rgba_unmultiplied([w as usize, h as usize], self.raster.as_raw());
        self.texture = Some(ctx.load_texture("viewer-photo", color, TextureOptions::LINEAR));
    }

    fn paint(&self, ui: &egui::Ui, rect: Rect) {
        let Some(texture) = &self.texture else { return };

        let (w, h) = self.raster.dimensions();
        let fit = contain_fit(w as f32, h as f32, rect.width(), rect.height());
        let base = Rect::from_min_size(
            rect.min + Vec2::new(fit.offset_x, fit.offset_y),
            Vec2::new(fit.width, fit.height),
        );

        // Scale about the gesture origin, then pan
        let zoom = self.transform.zoom();
        let (origin_x, origin_y) = self.transform.origin();
        let origin = rect.min + Vec2::new(origin_x * rect.width(), origin_y * rect.height());
        let (pan_x, pan_y) = self.transform.pan();

        let scaled_min = origin + (base.min - origin) * zoom + Vec2::new(pan_x, pan_y);
        let scaled = Rect::from_min_size(scaled_min, base.size() * zoom);

        let painter = ui.painter().with_clip_rect(rect);
        painter.rect_filled(rect, 0.0, Color32::BLACK);
        painter.image(
            texture.id(),
            scaled,
            Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
            Color32::WHITE,
        );
    }
}
