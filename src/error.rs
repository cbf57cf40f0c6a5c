// error.rs — failure taxonomy for the viewer, its loads and its host

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by the viewer's public operations.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// Zero panorama entries were supplied; nothing is mounted.
    #[error("no panoramas to display")]
    EmptySet,
    #[error("panorama index {index} out of range (set has {len})")]
    IndexOutOfRange { index: usize, len: usize },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("invalid viewer configuration: {0}")]
    Config(#[from] ConfigError),
}

/// A single image fetch/decode that did not produce a texture.
///
/// Load failures are local to the operation: the viewer keeps the last
/// panorama that did load and the render loop keeps running.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("request for {location} failed: {source}")]
    Http {
        location: String,
        #[source]
        source: ureq::Error,
    },
    #[error("failed to decode {location}: {source}")]
    Decode {
        location: String,
        #[source]
        source: image::ImageError,
    },
    #[error("{location} is {size} bytes, over the {limit} byte limit")]
    TooLarge {
        location: String,
        size: u64,
        limit: u64,
    },
    #[error("loading {location} timed out after {after:?}")]
    Timeout { location: String, after: Duration },
    #[error("could not start a load worker for {location}: {source}")]
    Worker {
        location: String,
        #[source]
        source: std::io::Error,
    },
}

impl LoadError {
    pub fn location(&self) -> &str {
        match self {
            LoadError::Io { location, .. }
            | LoadError::Http { location, .. }
            | LoadError::Decode { location, .. }
            | LoadError::TooLarge { location, .. }
            | LoadError::Timeout { location, .. }
            | LoadError::Worker { location, .. } => location,
        }
    }
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),
    #[error("no compatible GPU adapter found")]
    NoAdapter,
    #[error("failed to open GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface frame unavailable: {0}")]
    Frame(#[from] wgpu::SurfaceError),
    #[error("render backend: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("failed to read room file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse room record: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to fetch room from {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: ureq::Error,
    },
}
