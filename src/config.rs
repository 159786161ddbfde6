use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    pub capture: CaptureConfig,
    pub editor: EditorConfig,
    pub export: ExportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CaptureConfig {
    pub preferred_width: u32,
    pub preferred_height: u32,
    pub frame_rate: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            preferred_width: 1280,
            preferred_height: 720,
            frame_rate: 30,
        }
    }
}

/// UX tuning knobs for the viewer gestures. These are defaults, not
/// invariants; the clamped zoom ranges live in the transform itself.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditorConfig {
    pub wheel_zoom_step: f32,
    pub double_tap_zoom: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            wheel_zoom_step: 0.3,
            double_tap_zoom: 2.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExportConfig {
    pub max_output_width: u32,
    pub jpeg_quality_crop: u8,
    pub jpeg_quality_full: u8,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            max_output_width: 800,
            jpeg_quality_crop: 90,
            jpeg_quality_full: 95,
        }
    }
}

fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("snapcrop")
        .join("config.json")
}

impl Config {
    /// Load the persisted configuration, falling back to defaults when the
    /// file is missing or unreadable.
    pub fn load() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                log::warn!("Ignoring malformed config {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> std::io::Result<()> {
        let path = config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_tuning() {
        let config = Config::default();
        assert_eq!(config.capture.preferred_width, 1280);
        assert_eq!(config.capture.preferred_height, 720);
        assert_eq!(config.editor.wheel_zoom_step, 0.3);
        assert_eq!(config.editor.double_tap_zoom, 2.5);
        assert_eq!(config.export.max_output_width, 800);
        assert_eq!(config.export.jpeg_quality_crop, 90);
        assert_eq!(config.export.jpeg_quality_full, 95);
    }

    #[test]
    fn config_round_trips_through_json() {
        let mut config = Config::default();
        config.editor.wheel_zoom_step = 0.5;
        config.export.max_output_width = 1024;

        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
