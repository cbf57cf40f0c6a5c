//! Immersive 360° viewer for a room's tagged panorama set.
//!
//! The viewer is split into three cooperating parts:
//! - [`session::RenderSession`] owns the scene, camera and GPU resources,
//! - [`orientation::OrientationController`] turns pointer input into yaw/pitch/zoom,
//! - [`navigator::PanoramaNavigator`] loads tagged images and swaps the sphere texture.
//!
//! [`viewer::PanoramaViewer`] wires them together behind a mount/teardown contract.
//! The desktop host (window, egui overlay, wgpu surface) lives in [`app`].

pub mod app;
pub mod backend;
pub mod config;
pub mod error;
pub mod i18n;
pub mod mesh;
pub mod navigator;
pub mod orientation;
pub mod panorama;
pub mod renderer;
pub mod room;
pub mod scene;
pub mod session;
pub mod source;
pub mod ui;
pub mod viewer;

pub use config::ViewerConfig;
pub use error::{LoadError, RenderError, ViewerError};
pub use panorama::{OrientationState, PanoramaEntry, PanoramaSet};
pub use viewer::{Mount, PanoramaViewer, ViewerEvent};
