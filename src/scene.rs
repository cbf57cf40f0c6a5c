// scene.rs — scene graph root, perspective camera and the sphere's material slot

use glam::{Mat4, Vec3};
use image::RgbaImage;

use crate::mesh::SphereMesh;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    pub fov_y_deg: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
    pub target: Vec3,
}

impl PerspectiveCamera {
    pub fn new(fov_y_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            fov_y_deg,
            aspect,
            near,
            far,
            position: Vec3::ZERO,
            target: Vec3::ZERO,
        }
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn look_at(&mut self, position: Vec3, target: Vec3) {
        self.position = position;
        self.target = target;
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_deg.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection() * self.view()
    }
}

/// Identity of one decoded panorama as seen by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureId(pub u64);

#[derive(Debug, Clone)]
pub struct Texture {
    pub id: TextureId,
    pub location: String,
    pub width: u32,
    pub height: u32,
    /// Pixels waiting for upload; dropped once the backend has them.
    pixels: Option<RgbaImage>,
}

impl Texture {
    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }
}

/// Unlit material; `needs_update` marks the map for re-upload on the next frame.
#[derive(Debug, Clone)]
pub struct Material {
    pub map: Texture,
    pub needs_update: bool,
}

#[derive(Debug, Clone)]
pub struct SphereNode {
    pub geometry: SphereMesh,
    pub material: Material,
    /// Geometry has been handed to the backend.
    pub uploaded: bool,
}

/// What applying a decoded image did to the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureSwap {
    /// First image: the sphere was built with it.
    CreatedMesh(TextureId),
    /// Existing sphere, texture reference replaced in place.
    Replaced { old: TextureId, new: TextureId },
}

/// Scene root. Holds at most one sphere.
#[derive(Debug, Default)]
pub struct Scene {
    sphere: Option<SphereNode>,
    next_texture: u64,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sphere(&self) -> Option<&SphereNode> {
        self.sphere.as_ref()
    }

    pub fn sphere_mut(&mut self) -> Option<&mut SphereNode> {
        self.sphere.as_mut()
    }

    pub fn mesh_count(&self) -> usize {
        usize::from(self.sphere.is_some())
    }

    /// Current texture on the sphere, if any image has been applied.
    pub fn texture(&self) -> Option<&Texture> {
        self.sphere.as_ref().map(|s| &s.material.map)
    }

    /// Put `image` on the sphere. `geometry` is only called for the first
    /// image; the node is assembled completely before it enters the scene.
    pub fn apply_image(
        &mut self,
        location: &str,
        image: RgbaImage,
        geometry: impl FnOnce() -> SphereMesh,
    ) -> TextureSwap {
        self.next_texture += 1;
        let texture = Texture {
            id: TextureId(self.next_texture),
            location: location.to_string(),
            width: image.width(),
            height: image.height(),
            pixels: Some(image),
        };
        let new = texture.id;

        match self.sphere.as_mut() {
            Some(node) => {
                let old = std::mem::replace(&mut node.material.map, texture).id;
                node.material.needs_update = true;
                TextureSwap::Replaced { old, new }
            }
            None => {
                self.sphere = Some(SphereNode {
                    geometry: geometry(),
                    material: Material {
                        map: texture,
                        needs_update: true,
                    },
                    uploaded: false,
                });
                TextureSwap::CreatedMesh(new)
            }
        }
    }

    /// Drop pending pixels after the backend has copied them.
    pub fn mark_texture_uploaded(&mut self) {
        if let Some(node) = self.sphere.as_mut() {
            node.material.needs_update = false;
            node.material.map.pixels = None;
        }
    }

    pub fn clear(&mut self) {
        self.sphere = None;
    }
}
