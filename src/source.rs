// source.rs — turning panorama references into decoded pixels

use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

use image::io::Reader as ImageReader;
use image::{GenericImage, Rgba, RgbaImage};

use crate::config::ViewerConfig;
use crate::error::LoadError;

/// Maps a stored image reference to something [`ImageFetcher`] can open.
pub trait SourceResolver: Send + Sync {
    fn resolve(&self, source: &str) -> String;
}

/// Fetches and decodes one image. Called on a worker thread.
pub trait ImageFetcher: Send + Sync {
    fn fetch(&self, location: &str) -> Result<RgbaImage, LoadError>;
}

/// True for references that already name a scheme (`http://`, `https://`, `file://`).
pub fn is_complete_reference(source: &str) -> bool {
    let lower = source.trim_start().to_ascii_lowercase();
    ["http://", "https://", "file://"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Upload-server layout: `/uploads/...` paths hang off the base URL,
/// bare names live in the panorama directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BaseUrlResolver {
    pub base_url: String,
    pub uploads_prefix: String,
    pub panorama_dir: String,
}

impl BaseUrlResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        let config = ViewerConfig::default();
        Self {
            base_url: base_url.into(),
            uploads_prefix: config.uploads_prefix,
            panorama_dir: config.panorama_dir,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            uploads_prefix: config.uploads_prefix.clone(),
            panorama_dir: config.panorama_dir.clone(),
        }
    }

    fn join(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

impl SourceResolver for BaseUrlResolver {
    fn resolve(&self, source: &str) -> String {
        if is_complete_reference(source) {
            source.to_string()
        } else if source.starts_with(&self.uploads_prefix) {
            self.join(source)
        } else {
            let dir = self.panorama_dir.trim_end_matches('/');
            self.join(&format!("{}/{}", dir, source.trim_start_matches('/')))
        }
    }
}

/// Reads `file://` URLs and plain paths from disk, everything else over HTTP.
pub struct DefaultFetcher {
    agent: ureq::Agent,
    max_bytes: u64,
}

impl DefaultFetcher {
    pub fn new(timeout: Duration, max_bytes: u64) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            max_bytes,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.load_timeout(), config.max_image_bytes)
    }

    fn fetch_http(&self, location: &str) -> Result<Vec<u8>, LoadError> {
        let http = |source| LoadError::Http {
            location: location.to_string(),
            source,
        };
        let mut response = self.agent.get(location).call().map_err(http)?;
        response
            .body_mut()
            .with_config()
            .limit(self.max_bytes)
            .read_to_vec()
            .map_err(http)
    }
}

impl ImageFetcher for DefaultFetcher {
    fn fetch(&self, location: &str) -> Result<RgbaImage, LoadError> {
        let lower = location.to_ascii_lowercase();
        let bytes = if lower.starts_with("http://") || lower.starts_with("https://") {
            self.fetch_http(location)?
        } else {
            let path = Path::new(location.strip_prefix("file://").unwrap_or(location));
            let io = |source| LoadError::Io {
                location: location.to_string(),
                source,
            };
            let size = std::fs::metadata(path).map_err(io)?.len();
            if size > self.max_bytes {
                return Err(LoadError::TooLarge {
                    location: location.to_string(),
                    size,
                    limit: self.max_bytes,
                });
            }
            std::fs::read(path).map_err(io)?
        };
        decode_image(location, &bytes)
    }
}

/// Sniff the format and decode to RGBA8. Size limits are lifted: panoramas
/// routinely exceed the decoder's default allocation cap.
pub fn decode_image(location: &str, bytes: &[u8]) -> Result<RgbaImage, LoadError> {
    let decode = |source| LoadError::Decode {
        location: location.to_string(),
        source,
    };
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|source| LoadError::Io {
            location: location.to_string(),
            source,
        })?;
    reader.no_limits();
    let img = reader.decode().map_err(decode)?;
    Ok(img.to_rgba8())
}

/// Scale `img` under the GPU's texture limit and pad non-2:1 images at the top
/// so the picture keeps its place on the lower part of the sphere.
/// Returns the prepared image and, if it was scaled, the original size.
pub fn prepare_texture_image(img: RgbaImage, max_dimension: u32) -> (RgbaImage, Option<(u32, u32)>) {
    let (src_w, src_h) = img.dimensions();

    let (img, scaled_from) = if src_w > max_dimension || src_h > max_dimension {
        let scale = (max_dimension as f32 / src_w.max(src_h) as f32).min(1.0);
        let new_w = ((src_w as f32 * scale) as u32).clamp(1, max_dimension);
        let new_h = ((src_h as f32 * scale) as u32).clamp(1, max_dimension);
        let resized = image::imageops::resize(&img, new_w, new_h, image::imageops::FilterType::Lanczos3);
        log::warn!(
            "{}",
            crate::i18n::tr_with(
                "gpu.image_too_large_scaled",
                &[
                    ("src_w", src_w.to_string()),
                    ("src_h", src_h.to_string()),
                    ("max", max_dimension.to_string()),
                    ("new_w", new_w.to_string()),
                    ("new_h", new_h.to_string())
                ]
            )
        );
        (resized, Some((src_w, src_h)))
    } else {
        (img, None)
    };

    let (w, h) = img.dimensions();
    let target_h = w / 2;
    if target_h > 0 && h < target_h {
        let mut canvas = RgbaImage::from_pixel(w, target_h, Rgba([0, 0, 0, 255]));
        // in bounds: target_h - h + h == target_h
        let _ = canvas.copy_from(&img, 0, target_h - h);
        (canvas, scaled_from)
    } else {
        (img, scaled_from)
    }
}
