// config.rs — per-deployment viewer settings

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Viewer settings. Every field is optional in the JSON file; missing
/// fields take the values the viewer has always shipped with.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    /// Server that relative panorama sources are served from.
    pub base_url: String,
    /// Sources starting with this prefix are appended to `base_url` unchanged.
    pub uploads_prefix: String,
    /// Directory (under `base_url`) holding bare panorama file names.
    pub panorama_dir: String,

    /// Degrees of yaw/pitch per pixel of drag.
    pub sensitivity: f32,
    /// Pitch is clamped to `[-pitch_limit, pitch_limit]`.
    pub pitch_limit: f32,
    pub min_radius: f32,
    pub max_radius: f32,
    pub initial_radius: f32,
    /// Radius change per unit of wheel delta.
    pub wheel_factor: f32,
    /// Pixel delta reported for one line of a line-based scroll wheel.
    pub wheel_line_pixels: f32,

    pub fov_deg: f32,
    pub near: f32,
    pub far: f32,

    pub sphere_radius: f32,
    pub width_segments: u32,
    pub height_segments: u32,

    /// Upper bound on a single image fetch + decode.
    pub load_timeout_secs: u64,
    /// Largest response body accepted for a remote panorama.
    pub max_image_bytes: u64,

    pub lang: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            uploads_prefix: "/uploads".to_string(),
            panorama_dir: "/uploads/panoramas/".to_string(),
            sensitivity: 0.1,
            pitch_limit: 85.0,
            min_radius: 50.0,
            max_radius: 200.0,
            initial_radius: 100.0,
            wheel_factor: 0.1,
            wheel_line_pixels: 100.0,
            fov_deg: 75.0,
            near: 0.1,
            far: 1000.0,
            sphere_radius: 500.0,
            width_segments: 60,
            height_segments: 40,
            load_timeout_secs: 30,
            max_image_bytes: 64 * 1024 * 1024,
            lang: "ko".to_string(),
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_radius > 0.0
            && self.min_radius <= self.initial_radius
            && self.initial_radius <= self.max_radius)
        {
            return Err(ConfigError::Invalid(format!(
                "radius bounds must satisfy 0 < min ({}) <= initial ({}) <= max ({})",
                self.min_radius, self.initial_radius, self.max_radius
            )));
        }
        if !(self.pitch_limit > 0.0 && self.pitch_limit < 90.0) {
            return Err(ConfigError::Invalid(format!(
                "pitch_limit must be within (0, 90), got {}",
                self.pitch_limit
            )));
        }
        if self.sensitivity <= 0.0 || self.wheel_factor <= 0.0 {
            return Err(ConfigError::Invalid(
                "sensitivity and wheel_factor must be positive".to_string(),
            ));
        }
        if !(self.near > 0.0 && self.near < self.far) {
            return Err(ConfigError::Invalid(format!(
                "clip planes must satisfy 0 < near ({}) < far ({})",
                self.near, self.far
            )));
        }
        if self.max_radius + self.sphere_radius >= self.far {
            return Err(ConfigError::Invalid(format!(
                "far plane {} does not reach the sphere from radius {}",
                self.far, self.max_radius
            )));
        }
        if self.max_radius >= self.sphere_radius {
            return Err(ConfigError::Invalid(
                "max_radius must keep the camera inside the sphere".to_string(),
            ));
        }
        if self.width_segments < 3 || self.height_segments < 2 {
            return Err(ConfigError::Invalid(format!(
                "sphere needs at least 3x2 segments, got {}x{}",
                self.width_segments, self.height_segments
            )));
        }
        if self.load_timeout_secs == 0 {
            return Err(ConfigError::Invalid("load_timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}
