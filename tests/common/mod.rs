#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use glam::Mat4;
use image::RgbaImage;

use room_panorama::error::{LoadError, RenderError};
use room_panorama::mesh::SphereMesh;
use room_panorama::navigator::LoadResolution;
use room_panorama::session::{Host, RenderBackend};
use room_panorama::source::{ImageFetcher, SourceResolver};
use room_panorama::PanoramaViewer;

#[derive(Debug, Default)]
pub struct Calls {
    pub attaches: usize,
    pub meshes: usize,
    pub textures: Vec<(u32, u32)>,
    pub draws: usize,
    pub releases: usize,
    pub last_view_proj: Option<Mat4>,
    /// Largest texture side the backend reports; unlimited when unset.
    pub texture_limit: Option<u32>,
}

pub struct MockBackend(Rc<RefCell<Calls>>);

impl RenderBackend for MockBackend {
    type Frame = ();

    fn upload_mesh(&mut self, _mesh: &SphereMesh) -> Result<(), RenderError> {
        self.0.borrow_mut().meshes += 1;
        Ok(())
    }

    fn upload_texture(&mut self, image: &RgbaImage) -> Result<(), RenderError> {
        self.0.borrow_mut().textures.push(image.dimensions());
        Ok(())
    }

    fn resize(&mut self, _width: u32, _height: u32) {}

    fn max_texture_dimension(&self) -> u32 {
        self.0.borrow().texture_limit.unwrap_or(u32::MAX)
    }

    fn draw(&mut self, _frame: &mut (), view_proj: Mat4) -> Result<(), RenderError> {
        let mut calls = self.0.borrow_mut();
        calls.draws += 1;
        calls.last_view_proj = Some(view_proj);
        Ok(())
    }

    fn release(&mut self) {
        self.0.borrow_mut().releases += 1;
    }
}

pub struct MockHost {
    pub size: (u32, u32),
    pub calls: Rc<RefCell<Calls>>,
}

impl MockHost {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            calls: Rc::new(RefCell::new(Calls::default())),
        }
    }
}

impl Host for MockHost {
    type Backend = MockBackend;

    fn client_size(&self) -> (u32, u32) {
        self.size
    }

    fn attach(&self) -> Result<MockBackend, RenderError> {
        self.calls.borrow_mut().attaches += 1;
        Ok(MockBackend(Rc::clone(&self.calls)))
    }
}

/// Leaves every reference untouched.
pub struct Verbatim;

impl SourceResolver for Verbatim {
    fn resolve(&self, source: &str) -> String {
        source.to_string()
    }
}

pub enum Reply {
    Image(u32, u32),
    Fail,
}

/// Fetcher whose answers the test hands out one by one.
///
/// Locations with a registered gate block until the test sends a [`Reply`];
/// any other location answers at once with a 64x32 image.
#[derive(Default)]
pub struct GatedFetcher {
    gates: Mutex<HashMap<String, Receiver<Reply>>>,
}

impl GatedFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn gate(&self, location: &str) -> Sender<Reply> {
        let (tx, rx) = channel();
        self.gates.lock().unwrap().insert(location.to_string(), rx);
        tx
    }
}

impl ImageFetcher for GatedFetcher {
    fn fetch(&self, location: &str) -> Result<RgbaImage, LoadError> {
        let gate = self.gates.lock().unwrap().remove(location);
        let reply = match gate {
            Some(rx) => rx.recv().unwrap_or(Reply::Fail),
            None => Reply::Image(64, 32),
        };
        match reply {
            Reply::Image(w, h) => Ok(RgbaImage::new(w, h)),
            Reply::Fail => Err(LoadError::Io {
                location: location.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "404"),
            }),
        }
    }
}

/// Poll until at least `count` loads have resolved, or give up after a few seconds.
pub fn wait_for_resolutions(
    viewer: &mut PanoramaViewer<MockBackend>,
    count: usize,
) -> Vec<LoadResolution> {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut resolved = Vec::new();
    while resolved.len() < count && Instant::now() < deadline {
        resolved.extend(viewer.poll_loads());
        std::thread::sleep(Duration::from_millis(5));
    }
    resolved
}
