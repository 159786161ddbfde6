//! Capture sources: webcam streaming via nokhwa and still decoding from a
//! user-selected file. Exactly one camera stream is held at a time; starting
//! a new one always tears the previous one down first.

use crate::config::CaptureConfig;
use image::{ImageBuffer, Rgb, RgbaImage};
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{
    ApiBackend, CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType,
    Resolution,
};
use nokhwa::Camera;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum CameraError {
    #[error("No cameras found")]
    NoCameras,
    #[error("Failed to initialize camera {0}: {1}")]
    InitError(u32, String),
    #[error("No active camera stream")]
    NotStreaming,
    #[error("Failed to grab frame: {0}")]
    FrameError(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: String,
        source: image::ImageError,
    },
}

/// An immutable still, shared cheaply between the preview and the compositor.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Arc<RgbaImage>,
}

impl CapturedFrame {
    pub fn from_rgba_image(rgba: RgbaImage) -> Self {
        let (width, height) = rgba.dimensions();
        Self {
            width,
            height,
            rgba: Arc::new(rgba),
        }
    }

    fn from_rgb_image(rgb: ImageBuffer<Rgb<u8>, Vec<u8>>) -> Self {
        Self::from_rgba_image(image::DynamicImage::ImageRgb8(rgb).to_rgba8())
    }
}

#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub index: u32,
    pub label: String,
}

/// Human-readable device label, with a generated fallback for platforms
/// that withhold names until a permission grant.
fn device_label(human_name: &str, index: usize) -> String {
    let trimmed = human_name.trim();
    if trimmed.is_empty() {
        format!("Camera {}", index)
    } else {
        trimmed.to_string()
    }
}

pub struct CameraManager {
    camera: Option<Camera>,
    devices: Vec<CameraDevice>,
}

impl Default for CameraManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CameraManager {
    pub fn new() -> Self {
        let mut manager = Self {
            camera: None,
            devices: Vec::new(),
        };
        manager.refresh_devices();
        manager
    }

    pub fn devices(&self) -> &[CameraDevice] {
        &self.devices
    }

    pub fn is_active(&self) -> bool {
        self.camera.is_some()
    }

    /// Re-enumerate video input devices. Called again after a successful
    /// start because labels only become available once permission is granted.
    pub fn refresh_devices(&mut self) {
        self.devices = match nokhwa::query(ApiBackend::Auto) {
            Ok(infos) => infos
                .iter()
                .enumerate()
                .map(|(i, info)| CameraDevice {
                    index: i as u32,
                    label: device_label(&info.human_name(), i),
                })
                .collect(),
            Err(e) => {
                log::warn!("Camera enumeration failed: {e}");
                Vec::new()
            }
        };
    }

    /// Open a stream on the given device at the preferred resolution,
    /// stopping any previously held stream first.
    pub fn start(&mut self, index: u32, config: &CaptureConfig) -> Result<(), CameraError> {
        self.stop();

        if self.devices.is_empty() {
            self.refresh_devices();
            if self.devices.is_empty() {
                return Err(CameraError::NoCameras);
            }
        }

        let requested = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(
            CameraFormat::new(
                Resolution::new(config.preferred_width, config.preferred_height),
                FrameFormat::MJPEG,
                config.frame_rate,
            ),
        ));

        let mut camera = Camera::new(CameraIndex::Index(index), requested)
            .map_err(|e| CameraError::InitError(index, e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::InitError(index, e.to_string()))?;

        let resolution = camera.resolution();
        log::info!(
            "Camera {} streaming at {}x{}",
            index,
            resolution.width(),
            resolution.height()
        );

        self.camera = Some(camera);
        self.refresh_devices();
        Ok(())
    }

    /// Release the current stream. No-op when nothing is active.
    pub fn stop(&mut self) {
        if let Some(mut camera) = self.camera.take() {
            if let Err(e) = camera.stop_stream() {
                log::warn!("Failed to stop camera stream: {e}");
            }
        }
    }

    /// Decode the current frame at the stream's native resolution.
    pub fn grab_still(&mut self) -> Result<CapturedFrame, CameraError> {
        let camera = self.camera.as_mut().ok_or(CameraError::NotStreaming)?;

        let buffer = camera
            .frame()
            .map_err(|e| CameraError::FrameError(e.to_string()))?;
        let rgb = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::FrameError(e.to_string()))?;

        Ok(CapturedFrame::from_rgb_image(rgb))
    }
}

impl Drop for CameraManager {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Decode an image file into a still. Read and decode failures are explicit;
/// a corrupt file surfaces as an error instead of a stale preview.
pub fn load_still(path: &Path) -> Result<CapturedFrame, SourceError> {
    let display = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| SourceError::Read {
        path: display.clone(),
        source: e,
    })?;
    let decoded = image::load_from_memory(&bytes).map_err(|e| SourceError::Decode {
        path: display,
        source: e,
    })?;
    Ok(CapturedFrame::from_rgba_image(decoded.to_rgba8()))
}
