// panorama.rs — tagged panorama entries and the camera orientation they are viewed with

use glam::Vec3;

use crate::error::ViewerError;

/// One tagged image of a room's 360° set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanoramaEntry {
    source: String,
    tag: String,
}

impl PanoramaEntry {
    pub fn new(source: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            tag: tag.into(),
        }
    }

    /// Image reference as supplied by the storage layer (URL, upload path or bare file name).
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Button label: the tag, or "파노라마 {n}" (1-based) when the tag is blank.
    pub fn label(&self, index: usize) -> String {
        if self.tag.trim().is_empty() {
            crate::i18n::tr_with("panorama.fallback_tag", &[("n", (index + 1).to_string())])
        } else {
            self.tag.clone()
        }
    }
}

/// Ordered, non-empty panorama sequence. Order is display order; tags are
/// labels, not keys, so duplicates are kept as separate entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanoramaSet {
    entries: Vec<PanoramaEntry>,
}

impl PanoramaSet {
    pub fn new(entries: Vec<PanoramaEntry>) -> Result<Self, ViewerError> {
        if entries.is_empty() {
            return Err(ViewerError::EmptySet);
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PanoramaEntry> {
        self.entries.get(index)
    }

    pub fn entry(&self, index: usize) -> Result<&PanoramaEntry, ViewerError> {
        self.entries.get(index).ok_or(ViewerError::IndexOutOfRange {
            index,
            len: self.entries.len(),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &PanoramaEntry> {
        self.entries.iter()
    }

    pub fn tags(&self) -> Vec<&str> {
        self.entries.iter().map(PanoramaEntry::tag).collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| e.label(i))
            .collect()
    }
}

/// Camera orientation around the sphere centre.
///
/// `yaw` is unbounded (wraps for rendering), `pitch` and `radius` are kept
/// inside their limits by the orientation controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationState {
    pub yaw: f32,
    pub pitch: f32,
    pub radius: f32,
}

impl Default for OrientationState {
    fn default() -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            radius: 100.0,
        }
    }
}

impl OrientationState {
    /// Yaw folded into `[0, 360)`.
    pub fn wrapped_yaw(&self) -> f32 {
        self.yaw.rem_euclid(360.0)
    }

    /// Spherical-to-Cartesian camera position; the camera looks back at the origin.
    pub fn camera_position(&self) -> Vec3 {
        let phi = (90.0 - self.pitch).to_radians();
        let theta = self.wrapped_yaw().to_radians();
        Vec3::new(
            self.radius * phi.sin() * theta.cos(),
            self.radius * phi.cos(),
            self.radius * phi.sin() * theta.sin(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-3
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(PanoramaSet::new(vec![]), Err(ViewerError::EmptySet)));
    }

    #[test]
    fn test_order_and_duplicate_tags_preserved() {
        let set = PanoramaSet::new(vec![
            PanoramaEntry::new("a.jpg", "Living"),
            PanoramaEntry::new("b.jpg", "Bedroom"),
            PanoramaEntry::new("c.jpg", "Living"),
        ])
        .unwrap();
        assert_eq!(set.tags(), vec!["Living", "Bedroom", "Living"]);
        assert_eq!(set.get(1).map(PanoramaEntry::source), Some("b.jpg"));
        assert!(matches!(
            set.entry(3),
            Err(ViewerError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_blank_tag_gets_numbered_label() {
        let entry = PanoramaEntry::new("x.jpg", "  ");
        let label = entry.label(1);
        assert!(label.contains('2'), "label was {label}");
        assert_eq!(PanoramaEntry::new("x.jpg", "거실").label(0), "거실");
    }

    #[test]
    fn test_default_camera_on_horizon() {
        let pos = OrientationState::default().camera_position();
        assert!(approx(pos, Vec3::new(100.0, 0.0, 0.0)), "{pos:?}");
    }

    #[test]
    fn test_yaw_wraps_for_rendering() {
        let a = OrientationState {
            yaw: 370.0,
            pitch: 20.0,
            radius: 120.0,
        };
        let b = OrientationState { yaw: 10.0, ..a };
        let c = OrientationState { yaw: -350.0, ..a };
        assert!(approx(a.camera_position(), b.camera_position()));
        assert!(approx(c.camera_position(), b.camera_position()));
        assert!((a.wrapped_yaw() - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_positive_pitch_raises_camera() {
        let up = OrientationState {
            pitch: 45.0,
            ..Default::default()
        };
        let pos = up.camera_position();
        assert!(pos.y > 0.0);
        assert!((pos.length() - 100.0).abs() < 1e-3);
    }
}
