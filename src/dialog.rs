//! The capture dialog: live camera preview, still review with
//! zoom/rotate/flip/pan controls and a drag-to-crop overlay, and the final
//! confirm step that runs the compositor and export pipeline.
//!
//! The review preview is the compositor's own output uploaded as a texture,
//! so what the user sees is byte-for-byte what the extractor will crop.

use crate::camera::{CameraManager, CapturedFrame};
use crate::compositor;
use crate::config::Config;
use crate::export::{self, EncodedPhoto};
use crate::geometry::CropRect;
use crate::transform::{TransformState, ZoomMode, EDITOR_PAN_LIMIT};
use eframe::egui::{
    self, Color32, ColorImage, Pos2, Rect, Sense, Stroke, StrokeKind, TextureHandle,
    TextureOptions, Vec2,
};
use image::RgbaImage;

/// What the embedding screen asks for when it opens the dialog.
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub title: String,
    pub description: String,
    /// Target width/height ratio of the editing container, e.g. 1.0 for a
    /// square avatar. `None` uses the default 4:3 container.
    pub aspect_ratio: Option<f32>,
}

impl Default for CaptureRequest {
    fn default() -> Self {
        Self {
            title: "Capture photo".to_string(),
            description: String::new(),
            aspect_ratio: None,
        }
    }
}

/// Emitted at most once per dialog; the embedder owns the photo afterwards.
pub enum CaptureEvent {
    Confirmed(EncodedPhoto),
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Live,
    Review,
}

const PREVIEW_WIDTH: f32 = 480.0;
const SELECTION_STROKE: Stroke = Stroke {
    width: 2.0,
    color: Color32::GREEN,
};

pub struct CaptureDialog {
    request: CaptureRequest,
    camera: CameraManager,
    selected_device: u32,
    camera_error: Option<String>,
    stage: Stage,
    still: Option<CapturedFrame>,
    still_revision: u64,
    transform: TransformState,
    crop_mode: bool,
    drag_anchor: Option<Pos2>,
    selection: Option<CropRect>,
    status: Option<String>,
    wants_file: bool,
    live_texture: Option<TextureHandle>,
    composite: Option<RgbaImage>,
    composite_texture: Option<TextureHandle>,
    composite_key: Option<(TransformState, (u32, u32), u64)>,
}

impl CaptureDialog {
    pub fn new(request: CaptureRequest, config: &Config) -> Self {
        let mut camera = CameraManager::new();
        let camera_error = match camera.start(0, &config.capture) {
            Ok(()) => None,
            Err(e) => {
                // No camera is not fatal: the dialog offers file loading
                log::warn!("Camera unavailable: {e}");
                Some(format!("{e} — load a photo from a file instead"))
            }
        };

        Self {
            request,
            camera,
            selected_device: 0,
            camera_error,
            stage: Stage::Live,
            still: None,
            still_revision: 0,
            transform: TransformState::new(ZoomMode::Editor),
            crop_mode: false,
            drag_anchor: None,
            selection: None,
            status: None,
            wants_file: false,
            live_texture: None,
            composite: None,
            composite_texture: None,
            composite_key: None,
        }
    }

    /// True once when the user asked to load a photo from a file. The
    /// embedder runs the async picker and calls [`set_still`] with the
    /// result.
    ///
    /// [`set_still`]: CaptureDialog::set_still
    pub fn take_file_request(&mut self) -> bool {
        std::mem::take(&mut self.wants_file)
    }

    /// Replace the source wholesale and enter review with a fresh transform.
    pub fn set_still(&mut self, frame: CapturedFrame) {
        self.still = Some(frame);
        self.still_revision += 1;
        self.transform.reset();
        self.selection = None;
        self.drag_anchor = None;
        self.stage = Stage::Review;
    }

    pub fn set_status(&mut self, message: String) {
        self.status = Some(message);
    }

    /// Render the dialog. Returns the terminal event when the user confirms,
    /// cancels, or closes the window; the camera stream is stopped either
    /// way.
    pub fn show(&mut self, ctx: &egui::Context, config: &Config) -> Option<CaptureEvent> {
        let mut open = true;
        let mut event = None;
        let title = self.request.title.clone();

        egui::Window::new(title)
            .open(&mut open)
            .resizable(false)
            .collapsible(false)
            .show(ctx, |ui| {
                if !self.request.description.is_empty() {
                    ui.label(self.request.description.as_str());
                    ui.separator();
                }

                event = match self.stage {
                    Stage::Live => self.live_ui(ui, config),
                    Stage::Review => self.review_ui(ui, config),
                };

                if let Some(status) = &self.status {
                    ui.separator();
                    ui.colored_label(Color32::LIGHT_RED, status.as_str());
                }
            });

        if !open && event.is_none() {
            event = Some(CaptureEvent::Cancelled);
        }
        if event.is_some() {
            self.camera.stop();
        }
        event
    }

    fn live_ui(&mut self, ui: &mut egui::Ui, config: &Config) -> Option<CaptureEvent> {
        let mut event = None;

        if let Some(err) = &self.camera_error {
            ui.colored_label(Color32::LIGHT_RED, err.as_str());
        }

        self.device_selector(ui, config);

        if self.camera.is_active() {
            match self.camera.grab_still() {
                Ok(frame) => self.paint_live_frame(ui, &frame),
                Err(e) => log::debug!("Frame not ready: {e}"),
            }
            // Keep the preview moving
            ui.ctx().request_repaint();
        }

        ui.add_space(8.0);
        ui.horizontal(|ui| {
            let can_shoot = self.camera.is_active();
            if ui
                .add_enabled(can_shoot, egui::Button::new("📷 Take photo"))
                .clicked()
            {
                match self.camera.grab_still() {
                    Ok(frame) => self.set_still(frame),
                    Err(e) => self.status = Some(e.to_string()),
                }
            }
            if ui.button("Load from file…").clicked() {
                self.wants_file = true;
            }
            if ui.button("Cancel").clicked() {
                event = Some(CaptureEvent::Cancelled);
            }
        });

        event
    }

    fn device_selector(&mut self, ui: &mut egui::Ui, config: &Config) {
        let devices: Vec<(u32, String)> = self
            .camera
            .devices()
            .iter()
            .map(|d| (d.index, d.label.clone()))
            .collect();
        if devices.is_empty() {
            return;
        }

        let current = devices
            .iter()
            .find(|(index, _)| *index == self.selected_device)
            .map(|(_, label)| label.clone())
            .unwrap_or_else(|| format!("Camera {}", self.selected_device));

        let mut switched = None;
        egui::ComboBox::from_label("Camera")
            .selected_text(current)
            .show_ui(ui, |ui| {
                for (index, label) in &devices {
                    if ui
                        .selectable_value(&mut self.selected_device, *index, label.as_str())
                        .clicked()
                    {
                        switched = Some(*index);
                    }
                }
            });

        if let Some(index) = switched {
            match self.camera.start(index, &config.capture) {
                Ok(()) => self.camera_error = None,
                Err(e) => self.camera_error = Some(e.to_string()),
            }
        }
    }

    fn paint_live_frame(&mut self, ui: &mut egui::Ui, frame: &CapturedFrame) {
        let color = ColorImage::from_rgba_unmultiplied(
            [frame.width as usize, frame.height as usize],
            frame.rgba.as_raw(),
        );
        match &mut self.live_texture {
            Some(texture) => texture.set(color, TextureOptions::LINEAR),
            None => {
                self.live_texture =
                    Some(ui.ctx().load_texture("live-preview", color, TextureOptions::LINEAR));
            }
        }

        if let Some(texture) = &self.live_texture {
            let aspect = frame.width.max(1) as f32 / frame.height.max(1) as f32;
            let size = Vec2::new(PREVIEW_WIDTH, PREVIEW_WIDTH / aspect);
            let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
            ui.painter().image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    }

    fn review_ui(&mut self, ui: &mut egui::Ui, config: &Config) -> Option<CaptureEvent> {
        let mut event = None;

        let container_w = PREVIEW_WIDTH;
        let container_h = match self.request.aspect_ratio {
            Some(aspect) if aspect > 0.0 => container_w / aspect,
            _ => container_w * 3.0 / 4.0,
        };
        let pixel_size = (container_w.round() as u32, container_h.round() as u32);

        self.refresh_composite(ui.ctx(), pixel_size);
        self.preview_with_crop_overlay(ui, container_w, container_h);
        ui.add_space(6.0);
        self.transform_controls(ui);

        ui.separator();
        ui.horizontal(|ui| {
            if ui.button("✔ Use photo").clicked() {
                if let Some(composite) = &self.composite {
                    match export::export(composite, self.selection, &config.export) {
                        Ok(photo) => event = Some(CaptureEvent::Confirmed(photo)),
                        Err(e) => self.status = Some(e.to_string()),
                    }
                }
            }
            if ui.button("Retake").clicked() {
                self.retake(config);
            }
            if ui.button("Cancel").clicked() {
                event = Some(CaptureEvent::Cancelled);
            }
        });

        event
    }

    /// Recompose only when the transform, container or source changed.
    fn refresh_composite(&mut self, ctx: &egui::Context, pixel_size: (u32, u32)) {
        let key = (self.transform, pixel_size, self.still_revision);
        if self.composite_key == Some(key) {
            return;
        }
        let Some(still) = &self.still else { return };

        let composite = compositor::compose(still, &self.transform, pixel_size.0, pixel_size.1);
        let color = ColorImage::from_rgba_unmultiplied(
            [pixel_size.0 as usize, pixel_size.1 as usize],
            composite.as_raw(),
        );
        match &mut self.composite_texture {
            Some(texture) => texture.set(color, TextureOptions::LINEAR),
            None => {
                self.composite_texture =
                    Some(ctx.load_texture("review-preview", color, TextureOptions::LINEAR));
            }
        }
        self.composite = Some(composite);
        self.composite_key = Some(key);
    }

    fn preview_with_crop_overlay(&mut self, ui: &mut egui::Ui, container_w: f32, container_h: f32) {
        let sense = if self.crop_mode {
            Sense::click_and_drag()
        } else {
            Sense::hover()
        };
        let (rect, response) = ui.allocate_exact_size(Vec2::new(container_w, container_h), sense);

        if let Some(texture) = &self.composite_texture {
            ui.painter().image(
                texture.id(),
                rect,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
        }

        if self.crop_mode {
            if response.drag_started() {
                if let Some(pos) = response.interact_pointer_pos() {
                    self.drag_anchor = Some(pos);
                    self.selection = None;
                }
            }
            if let (Some(anchor), Some(pos)) = (self.drag_anchor, response.interact_pointer_pos())
            {
                self.selection = Some(CropRect::from_drag(
                    (anchor.x - rect.min.x, anchor.y - rect.min.y),
                    (pos.x - rect.min.x, pos.y - rect.min.y),
                    container_w,
                    container_h,
                ));
            }
            if response.drag_stopped() {
                self.drag_anchor = None;
            }
        }

        if let Some(selection) = self.selection {
            let selection_rect = Rect::from_min_size(
                rect.min + Vec2::new(selection.x, selection.y),
                Vec2::new(selection.width, selection.height),
            );
            ui.painter()
                .rect_stroke(selection_rect, 0.0, SELECTION_STROKE, StrokeKind::Outside);
        }
    }

    fn transform_controls(&mut self, ui: &mut egui::Ui) {
        let mut zoom = self.transform.zoom();
        if ui
            .add(egui::Slider::new(&mut zoom, 0.5..=3.0).text("Zoom"))
            .changed()
        {
            self.transform.set_zoom(zoom);
        }

        let (mut pan_x, mut pan_y) = self.transform.pan();
        let pan_range = -EDITOR_PAN_LIMIT..=EDITOR_PAN_LIMIT;
        let x_changed = ui
            .add(egui::Slider::new(&mut pan_x, pan_range.clone()).text("Pan X"))
            .changed();
        let y_changed = ui
            .add(egui::Slider::new(&mut pan_y, pan_range).text("Pan Y"))
            .changed();
        if x_changed || y_changed {
            self.transform.pan_to(pan_x, pan_y);
        }

        ui.horizontal(|ui| {
            if ui.button("⟲ Rotate left").clicked() {
                self.transform.rotate_left();
            }
            if ui.button("⟳ Rotate right").clicked() {
                self.transform.rotate_right();
            }
            if ui
                .selectable_label(self.transform.flip_h(), "Mirror H")
                .clicked()
            {
                self.transform.toggle_flip_h();
            }
            if ui
                .selectable_label(self.transform.flip_v(), "Mirror V")
                .clicked()
            {
                self.transform.toggle_flip_v();
            }
        });

        ui.horizontal(|ui| {
            if ui.selectable_label(self.crop_mode, "✂ Crop").clicked() {
                self.crop_mode = !self.crop_mode;
            }
            let has_selection = self.selection.is_some_and(|s| s.is_selection());
            if ui
                .add_enabled(has_selection, egui::Button::new("Clear selection"))
                .clicked()
            {
                self.selection = None;
            }
            if ui.button("Reset").clicked() {
                self.transform.reset();
                self.selection = None;
            }

            match self.selection {
                Some(s) if s.is_selection() => {
                    ui.label(format!(
                        "Selection: {}x{} px",
                        s.width.round() as u32,
                        s.height.round() as u32
                    ));
                }
                _ => {
                    ui.label("No selection: full frame is exported");
                }
            }
        });
    }

    fn retake(&mut self, config: &Config) {
        self.still = None;
        self.transform.reset();
        self.selection = None;
        self.drag_anchor = None;
        self.crop_mode = false;
        self.status = None;
        self.stage = Stage::Live;

        // The stream is still up after a camera shot; a file-loaded source
        // needs the camera (re)started.
        if !self.camera.is_active() {
            match self.camera.start(self.selected_device, &config.capture) {
                Ok(()) => self.camera_error = None,
                Err(e) => {
                    self.camera_error = Some(format!("{e} — load a photo from a file instead"));
                }
            }
        }
    }
}
