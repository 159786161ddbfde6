//! Top-level application: a profile form whose avatar is produced by the
//! capture dialog. Owns the tokio runtime that drives the async file picker
//! and the channel that carries picked files back to the UI thread.

use crate::camera::{self, CapturedFrame};
use crate::config::Config;
use crate::dialog::{CaptureDialog, CaptureEvent, CaptureRequest};
use crate::export::{self, EncodedPhoto};
use crate::profile::{completion_level, ProfileRecord};
use crate::viewer::Viewer;
use eframe::egui::{self, Color32, ColorImage, TextureHandle, TextureOptions};
use image::RgbaImage;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

/// Outcome of the async file picker: `None` when the user dismissed it.
type PickedFile = Option<Result<CapturedFrame, String>>;

pub struct SnapcropApp {
    config: Config,
    runtime: Arc<Runtime>,
    profile: ProfileRecord,
    avatar: Option<EncodedPhoto>,
    avatar_raster: Option<RgbaImage>,
    avatar_texture: Option<TextureHandle>,
    dialog: Option<CaptureDialog>,
    viewer: Option<Viewer>,
    file_rx: Option<Receiver<PickedFile>>,
    status: Option<String>,
}

impl SnapcropApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            config: Config::load(),
            runtime: Arc::new(Builder::new_multi_thread().enable_all().build().unwrap()),
            profile: ProfileRecord::default(),
            avatar: None,
            avatar_raster: None,
            avatar_texture: None,
            dialog: None,
            viewer: None,
            file_rx: None,
            status: None,
        }
    }

    fn open_capture_dialog(&mut self) {
        let request = CaptureRequest {
            title: "Profile photo".to_string(),
            description: "Frame your photo, then crop the part to keep.".to_string(),
            aspect_ratio: Some(1.0),
        };
        self.dialog = Some(CaptureDialog::new(request, &self.config));
    }

    /// Run the async file picker on the runtime; the result comes back over
    /// an mpsc channel polled each frame.
    fn spawn_file_pick(&mut self, ctx: egui::Context) {
        let (tx, rx) = mpsc::channel();
        self.file_rx = Some(rx);

        self.runtime.spawn(async move {
            let picked = rfd::AsyncFileDialog::new()
                .add_filter("Images", &["png", "jpg", "jpeg"])
                .pick_file()
                .await;
            let result =
                picked.map(|handle| camera::load_still(handle.path()).map_err(|e| e.to_string()));
            let _ = tx.send(result);
            ctx.request_repaint();
        });
    }

    fn poll_picked_file(&mut self) {
        let Some(rx) = &self.file_rx else { return };

        match rx.try_recv() {
            Ok(Some(Ok(frame))) => {
                self.file_rx = None;
                if let Some(dialog) = self.dialog.as_mut() {
                    dialog.set_still(frame);
                }
            }
            Ok(Some(Err(message))) => {
                self.file_rx = None;
                match self.dialog.as_mut() {
                    Some(dialog) => dialog.set_status(message),
                    None => self.status = Some(message),
                }
            }
            Ok(None) | Err(TryRecvError::Disconnected) => {
                // Picker dismissed or task gone; nothing to load
                self.file_rx = None;
            }
            Err(TryRecvError::Empty) => {}
        }
    }

    /// Consume the confirmed photo: the data URI is the hand-off contract,
    /// so the avatar preview decodes it the way any embedder would.
    fn adopt_avatar(&mut self, ctx: &egui::Context, photo: EncodedPhoto) {
        match export::decode_data_uri(&photo.data_uri) {
            Ok(raster) => {
                let (w, h) = raster.dimensions();
                let color =
                    ColorImage::from_rgba_unmultiplied([w as usize, h as usize], raster.as_raw());
                self.avatar_texture =
                    Some(ctx.load_texture("avatar", color, TextureOptions::LINEAR));
                self.avatar_raster = Some(raster);
                self.avatar = Some(photo);
                self.status = None;
            }
            Err(e) => self.status = Some(format!("Could not decode captured photo: {e}")),
        }
    }

    fn dialog_ui(&mut self, ctx: &egui::Context) {
        let mut wants_file = false;
        let mut event = None;

        if let Some(dialog) = self.dialog.as_mut() {
            wants_file = dialog.take_file_request();
            let config = self.config.clone();
            event = dialog.show(ctx, &config);
        }

        if wants_file {
            self.spawn_file_pick(ctx.clone());
        }
        match event {
            Some(CaptureEvent::Confirmed(photo)) => {
                self.adopt_avatar(ctx, photo);
                self.dialog = None;
            }
            Some(CaptureEvent::Cancelled) => self.dialog = None,
            None => {}
        }
    }

    fn viewer_ui(&mut self, ctx: &egui::Context) {
        if let Some(viewer) = self.viewer.as_mut() {
            if !viewer.show(ctx, &self.config.editor) {
                self.viewer = None;
            }
        }
    }

    fn profile_ui(&mut self, ui: &mut egui::Ui) {
        ui.heading("Profile");
        ui.add_space(6.0);

        ui.horizontal(|ui| {
            match &self.avatar_texture {
                Some(texture) => {
                    ui.image((texture.id(), egui::Vec2::splat(96.0)));
                }
                None => {
                    ui.label(egui::RichText::new("🙂").size(64.0));
                }
            }
            ui.vertical(|ui| {
                if ui.button("Change photo…").clicked() {
                    self.open_capture_dialog();
                }
                let has_avatar = self.avatar_raster.is_some();
                if ui
                    .add_enabled(has_avatar, egui::Button::new("View photo"))
                    .clicked()
                {
                    if let Some(raster) = &self.avatar_raster {
                        self.viewer = Some(Viewer::new(raster.clone()));
                    }
                }
                if let Some(photo) = &self.avatar {
                    ui.label(format!("{}x{} JPEG", photo.width, photo.height));
                }
            });
        });

        if let Some(status) = &self.status {
            ui.colored_label(Color32::LIGHT_RED, status.as_str());
        }

        ui.separator();
        ui.label(format!(
            "Completion level: {} / 5",
            completion_level(&self.profile)
        ));
        ui.add_space(4.0);

        self.profile_fields(ui);

        ui.separator();
        if ui.button("Save settings").clicked() {
            match self.config.save() {
                Ok(()) => self.status = Some("Settings saved".to_string()),
                Err(e) => self.status = Some(format!("Could not save settings: {e}")),
            }
        }
    }

    fn profile_fields(&mut self, ui: &mut egui::Ui) {
        let profile = &mut self.profile;

        ui.collapsing("Identity", |ui| {
            labeled_field(ui, "First name", &mut profile.first_name);
            labeled_field(ui, "Last name", &mut profile.last_name);
            labeled_field(ui, "Phone", &mut profile.phone);
            labeled_field(ui, "National ID", &mut profile.national_id);
        });
        ui.collapsing("Location", |ui| {
            labeled_field(ui, "Country", &mut profile.country);
            labeled_field(ui, "Region", &mut profile.region);
            labeled_field(ui, "District", &mut profile.district);
        });
        ui.collapsing("Address", |ui| {
            labeled_field(ui, "Street address", &mut profile.street_address);

            let mut has_gps = profile.latitude.is_some() && profile.longitude.is_some();
            if ui.checkbox(&mut has_gps, "GPS position").changed() {
                if has_gps {
                    profile.latitude = Some(0.0);
                    profile.longitude = Some(0.0);
                } else {
                    profile.latitude = None;
                    profile.longitude = None;
                }
            }
            if let (Some(lat), Some(lon)) = (&mut profile.latitude, &mut profile.longitude) {
                ui.horizontal(|ui| {
                    ui.label("Latitude");
                    ui.add(egui::DragValue::new(lat).speed(0.0001));
                    ui.label("Longitude");
                    ui.add(egui::DragValue::new(lon).speed(0.0001));
                });
            }
        });
        ui.collapsing("Business", |ui| {
            labeled_field(ui, "Business name", &mut profile.business_name);
            labeled_field(ui, "Tax ID (RUC)", &mut profile.tax_id);
        });
    }
}

fn labeled_field(ui: &mut egui::Ui, label: &str, value: &mut String) {
    ui.horizontal(|ui| {
        ui.label(label);
        ui.text_edit_singleline(value);
    });
}

impl eframe::App for SnapcropApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_picked_file();

        egui::CentralPanel::default().show(ctx, |ui| {
            self.profile_ui(ui);
        });

        self.dialog_ui(ctx);
        self.viewer_ui(ctx);
    }
}
