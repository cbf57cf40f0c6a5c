// session.rs — per-viewer render session: scene, camera and the GPU backend behind them

use glam::{Mat4, Vec3};
use image::RgbaImage;

use crate::config::ViewerConfig;
use crate::error::RenderError;
use crate::mesh::{build_inverted_sphere, SphereMesh};
use crate::panorama::OrientationState;
use crate::scene::{PerspectiveCamera, Scene, TextureSwap};

/// GPU side of a render session.
///
/// A backend is created by [`Host::attach`] and released exactly once by
/// [`RenderSession::teardown`].
pub trait RenderBackend {
    /// Per-frame render target handed in by the host.
    type Frame;

    fn upload_mesh(&mut self, mesh: &SphereMesh) -> Result<(), RenderError>;
    /// Largest texture edge the backend accepts, in pixels.
    fn max_texture_dimension(&self) -> u32 {
        u32::MAX
    }
    /// Replace the sphere texture with `image`.
    fn upload_texture(&mut self, image: &RgbaImage) -> Result<(), RenderError>;
    fn resize(&mut self, width: u32, height: u32);
    fn draw(&mut self, frame: &mut Self::Frame, view_proj: Mat4) -> Result<(), RenderError>;
    fn release(&mut self);
}

/// Where a viewer is mounted.
pub trait Host {
    type Backend: RenderBackend;

    /// Current drawable size in physical pixels.
    fn client_size(&self) -> (u32, u32);
    fn attach(&self) -> Result<Self::Backend, RenderError>;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct SphereSpec {
    radius: f32,
    lon: usize,
    lat: usize,
}

pub struct RenderSession<B: RenderBackend> {
    scene: Scene,
    camera: PerspectiveCamera,
    backend: Option<B>,
    sphere: SphereSpec,
    size: (u32, u32),
    frames: u64,
}

impl<B: RenderBackend> RenderSession<B> {
    /// Build the session against `host`.
    ///
    /// Returns `Ok(None)` when the host is missing or has no drawable area yet;
    /// the caller retries on its next mount attempt.
    pub fn initialize<H>(host: Option<&H>, config: &ViewerConfig) -> Result<Option<Self>, RenderError>
    where
        H: Host<Backend = B>,
    {
        let Some(host) = host else {
            return Ok(None);
        };
        let (width, height) = host.client_size();
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let mut backend = host.attach()?;
        backend.resize(width, height);

        let mut camera = PerspectiveCamera::new(
            config.fov_deg,
            width as f32 / height as f32,
            config.near,
            config.far,
        );
        camera.look_at(OrientationState::default().camera_position(), Vec3::ZERO);

        log::debug!("render session attached at {width}x{height}");

        Ok(Some(Self {
            scene: Scene::new(),
            camera,
            backend: Some(backend),
            sphere: SphereSpec {
                radius: config.sphere_radius,
                lon: config.width_segments as usize,
                lat: config.height_segments as usize,
            },
            size: (width, height),
            frames: 0,
        }))
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }

    pub fn is_torn_down(&self) -> bool {
        self.backend.is_none()
    }

    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    /// `None` once torn down.
    pub fn max_texture_dimension(&self) -> Option<u32> {
        self.backend.as_ref().map(RenderBackend::max_texture_dimension)
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.backend.as_mut()
    }

    /// Put a decoded panorama on the sphere. `None` once torn down.
    pub fn apply_image(&mut self, location: &str, image: RgbaImage) -> Option<TextureSwap> {
        if self.is_torn_down() {
            return None;
        }
        let spec = self.sphere;
        Some(
            self.scene
                .apply_image(location, image, || build_inverted_sphere(spec.radius, spec.lon, spec.lat)),
        )
    }

    /// One animation tick: place the camera from `orientation`, flush pending
    /// uploads, draw. A no-op after teardown.
    pub fn render_frame(
        &mut self,
        frame: &mut B::Frame,
        orientation: &OrientationState,
    ) -> Result<(), RenderError> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(());
        };

        self.camera.look_at(orientation.camera_position(), Vec3::ZERO);

        let mut flushed = false;
        if let Some(node) = self.scene.sphere_mut() {
            if !node.uploaded {
                backend.upload_mesh(&node.geometry)?;
                node.uploaded = true;
            }
            if node.material.needs_update {
                if let Some(pixels) = node.material.map.pixels() {
                    backend.upload_texture(pixels)?;
                }
                flushed = true;
            }
        }
        if flushed {
            self.scene.mark_texture_uploaded();
        }

        backend.draw(frame, self.camera.view_projection())?;
        self.frames += 1;
        Ok(())
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.camera.set_aspect(width, height);
        if let Some(backend) = self.backend.as_mut() {
            backend.resize(width, height);
        }
    }

    /// Release GPU resources and empty the scene. Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if let Some(mut backend) = self.backend.take() {
            backend.release();
            self.scene.clear();
            log::debug!("render session released after {} frames", self.frames);
        }
    }
}

impl<B: RenderBackend> Drop for RenderSession<B> {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Calls {
        meshes: usize,
        textures: Vec<(u32, u32)>,
        draws: usize,
        releases: usize,
        size: (u32, u32),
    }

    struct Recording(Rc<RefCell<Calls>>);

    impl RenderBackend for Recording {
        type Frame = ();

        fn upload_mesh(&mut self, _mesh: &SphereMesh) -> Result<(), RenderError> {
            self.0.borrow_mut().meshes += 1;
            Ok(())
        }
        fn upload_texture(&mut self, image: &RgbaImage) -> Result<(), RenderError> {
            self.0.borrow_mut().textures.push(image.dimensions());
            Ok(())
        }
        fn resize(&mut self, width: u32, height: u32) {
            self.0.borrow_mut().size = (width, height);
        }
        fn draw(&mut self, _frame: &mut (), _view_proj: Mat4) -> Result<(), RenderError> {
            self.0.borrow_mut().draws += 1;
            Ok(())
        }
        fn release(&mut self) {
            self.0.borrow_mut().releases += 1;
        }
    }

    struct TestHost {
        size: (u32, u32),
        calls: Rc<RefCell<Calls>>,
    }

    impl Host for TestHost {
        type Backend = Recording;

        fn client_size(&self) -> (u32, u32) {
            self.size
        }
        fn attach(&self) -> Result<Recording, RenderError> {
            Ok(Recording(self.calls.clone()))
        }
    }

    fn session(size: (u32, u32)) -> (RenderSession<Recording>, Rc<RefCell<Calls>>) {
        let calls = Rc::new(RefCell::new(Calls::default()));
        let host = TestHost {
            size,
            calls: calls.clone(),
        };
        let session = RenderSession::initialize(Some(&host), &ViewerConfig::default())
            .unwrap()
            .unwrap();
        (session, calls)
    }

    #[test]
    fn test_missing_host_is_a_noop() {
        let none: Option<&TestHost> = None;
        assert!(RenderSession::initialize(none, &ViewerConfig::default())
            .unwrap()
            .is_none());

        let calls = Rc::new(RefCell::new(Calls::default()));
        let collapsed = TestHost { size: (0, 600), calls: calls.clone() };
        assert!(RenderSession::initialize(Some(&collapsed), &ViewerConfig::default())
            .unwrap()
            .is_none());
        assert_eq!(calls.borrow().releases, 0);
    }

    #[test]
    fn test_camera_matches_host() {
        let (session, calls) = session((1200, 600));
        let camera = session.camera();
        assert_eq!(camera.fov_y_deg, 75.0);
        assert_eq!((camera.near, camera.far), (0.1, 1000.0));
        assert_eq!(camera.aspect, 2.0);
        assert_eq!(calls.borrow().size, (1200, 600));
    }

    #[test]
    fn test_frame_follows_orientation() {
        let (mut session, _) = session((800, 600));
        let orientation = OrientationState { yaw: 90.0, pitch: 0.0, radius: 150.0 };
        session.render_frame(&mut (), &orientation).unwrap();
        let pos = session.camera().position;
        assert!((pos - Vec3::new(0.0, 0.0, 150.0)).length() < 1e-3, "{pos:?}");
        assert_eq!(session.camera().target, Vec3::ZERO);
    }

    #[test]
    fn test_uploads_are_flushed_once() {
        let (mut session, calls) = session((800, 600));
        let state = OrientationState::default();
        session.render_frame(&mut (), &state).unwrap();
        assert_eq!(calls.borrow().meshes, 0);

        session.apply_image("a.jpg", RgbaImage::new(8, 4));
        session.render_frame(&mut (), &state).unwrap();
        session.render_frame(&mut (), &state).unwrap();
        session.apply_image("b.jpg", RgbaImage::new(16, 8));
        session.render_frame(&mut (), &state).unwrap();

        let calls = calls.borrow();
        assert_eq!(calls.meshes, 1);
        assert_eq!(calls.textures, vec![(8, 4), (16, 8)]);
        assert_eq!(calls.draws, 4);
        assert_eq!(session.scene().mesh_count(), 1);
    }

    #[test]
    fn test_resize_updates_aspect_and_backend() {
        let (mut session, calls) = session((800, 600));
        session.resize(1000, 500);
        assert_eq!(session.camera().aspect, 2.0);
        assert_eq!(calls.borrow().size, (1000, 500));
        session.resize(0, 0);
        assert_eq!(session.size(), (1000, 500));
    }

    #[test]
    fn test_teardown_releases_once() {
        let (mut session, calls) = session((800, 600));
        session.apply_image("a.jpg", RgbaImage::new(8, 4));
        session.teardown();
        session.teardown();
        assert!(session.apply_image("b.jpg", RgbaImage::new(8, 4)).is_none());
        session.render_frame(&mut (), &OrientationState::default()).unwrap();
        assert_eq!(session.scene().mesh_count(), 0);
        drop(session);

        let calls = calls.borrow();
        assert_eq!(calls.releases, 1);
        assert_eq!(calls.draws, 0);
    }
}
