// app.rs — the desktop shell: window events in, viewer frames out

use std::path::{Path, PathBuf};
use std::sync::Arc;

use winit::dpi::PhysicalPosition;
use winit::event::{
    ElementState, MouseButton, MouseScrollDelta, Touch, TouchPhase, VirtualKeyCode, WindowEvent,
};
use winit::event_loop::ControlFlow;
use winit::window::{Fullscreen, Window};

use crate::backend::SphereRenderer;
use crate::config::ViewerConfig;
use crate::error::{RenderError, RoomError, ViewerError};
use crate::orientation::{PointerId, PointerInput};
use crate::panorama::PanoramaEntry;
use crate::renderer::Renderer;
use crate::room::Room;
use crate::source::{ImageFetcher, SourceResolver};
use crate::ui::{OverlayAction, ViewerOverlay};
use crate::viewer::{FirstLoad, Mount, PanoramaViewer, ViewerEvent};

/// What the window is currently showing.
enum Screen {
    /// Waiting for a usable surface before mounting.
    Mounting(Vec<PanoramaEntry>),
    Viewing(PanoramaViewer<SphereRenderer>),
    Fallback { message: String },
}

/// A local image as a one-entry panorama list. `arg` is `PATH` or `PATH#TAG`.
pub fn image_entry(arg: &str) -> PanoramaEntry {
    let (path, tag) = match arg.rsplit_once('#') {
        Some((path, tag)) => (path, tag),
        None => (arg, ""),
    };
    let path = Path::new(path);
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    PanoramaEntry::new(format!("file://{}", absolute.display()), tag)
}

/// Window coordinates in the logical pixels drag sensitivity is defined against.
fn logical_point(position: PhysicalPosition<f64>, scale_factor: f64) -> (f32, f32) {
    let logical = position.to_logical::<f32>(scale_factor);
    (logical.x, logical.y)
}

/// Logical-pixel wheel delta, positive when scrolling down.
fn wheel_delta_y(delta: &MouseScrollDelta, scale_factor: f64, line_pixels: f32) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * line_pixels,
        MouseScrollDelta::PixelDelta(pos) => -pos.to_logical::<f32>(scale_factor).y,
    }
}

fn is_room_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}

pub struct App {
    window: Arc<Window>,
    renderer: Renderer,
    config: ViewerConfig,
    resolver: Arc<dyn SourceResolver>,
    fetcher: Arc<dyn ImageFetcher>,
    screen: Screen,
    cursor: (f32, f32),
    fullscreen: bool,
}

impl App {
    pub fn new(
        window: Arc<Window>,
        renderer: Renderer,
        config: ViewerConfig,
        resolver: Arc<dyn SourceResolver>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Self {
        Self {
            window,
            renderer,
            config,
            resolver,
            fetcher,
            screen: Screen::Fallback {
                message: crate::i18n::tr("viewer.empty"),
            },
            cursor: (0.0, 0.0),
            fullscreen: false,
        }
    }

    /// Replace whatever is on screen with `entries`. An empty list shows the fallback message.
    pub fn open_entries(&mut self, entries: Vec<PanoramaEntry>, room_name: Option<&str>) {
        self.close_viewer();
        let title = match room_name {
            Some(room) if !room.is_empty() => {
                crate::i18n::tr_with("app.title_room", &[("room", room.to_string())])
            }
            _ => crate::i18n::tr("app.title"),
        };
        self.window.set_title(&title);

        self.screen = if entries.is_empty() {
            Screen::Fallback {
                message: crate::i18n::tr("viewer.empty"),
            }
        } else {
            Screen::Mounting(entries)
        };
        self.try_mount();
    }

    pub fn open_room(&mut self, room: &Room) {
        log::info!(
            "{}",
            crate::i18n::tr_with(
                "log.room_loaded",
                &[
                    ("name", room.display_name().to_string()),
                    ("count", room.panoramas.len().to_string())
                ]
            )
        );
        self.open_entries(room.panorama_entries(), Some(room.display_name()));
    }

    /// A room JSON file or a single image.
    pub fn open_path(&mut self, path: &Path) -> Result<(), RoomError> {
        if is_room_file(path) {
            let room = Room::load(path)?;
            self.open_room(&room);
        } else {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            self.open_entries(vec![image_entry(&path.to_string_lossy())], Some(&name));
        }
        Ok(())
    }

    fn pick_file(&mut self) {
        let picked: Option<PathBuf> = rfd::FileDialog::new()
            .add_filter(&crate::i18n::tr("file.filter.rooms"), &["json"])
            .add_filter(
                &crate::i18n::tr("file.filter.images"),
                &["jpg", "jpeg", "png", "bmp", "webp"],
            )
            .pick_file();
        if let Some(path) = picked {
            self.open_path_or_report(&path);
        }
    }

    fn open_path_or_report(&mut self, path: &Path) {
        if let Err(e) = self.open_path(path) {
            log::error!("{e}");
            self.close_viewer();
            self.screen = Screen::Fallback {
                message: e.to_string(),
            };
        }
    }

    fn try_mount(&mut self) {
        let Screen::Mounting(entries) = &self.screen else {
            return;
        };
        let mounted = PanoramaViewer::mount(
            entries.clone(),
            Some(&self.renderer),
            &self.config,
            Arc::clone(&self.resolver),
            Arc::clone(&self.fetcher),
        );
        match mounted {
            Ok(Mount::Mounted(viewer)) => self.screen = Screen::Viewing(viewer),
            Ok(Mount::HostUnavailable) => {}
            Err(e) => {
                log::error!("{e}");
                let message = match e {
                    ViewerError::EmptySet => crate::i18n::tr("viewer.empty"),
                    other => other.to_string(),
                };
                self.screen = Screen::Fallback { message };
            }
        }
    }

    fn close_viewer(&mut self) {
        if let Screen::Viewing(viewer) = &mut self.screen {
            viewer.teardown();
        }
    }

    fn exit(&mut self, control_flow: &mut ControlFlow) {
        self.close_viewer();
        *control_flow = ControlFlow::Exit;
    }

    fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        if self.fullscreen {
            self.window.set_fullscreen(Some(Fullscreen::Borderless(None)));
        } else {
            self.window.set_fullscreen(None);
        }
    }

    fn feed(&mut self, input: PointerInput) {
        if let Screen::Viewing(viewer) = &mut self.screen {
            viewer.handle_input(input);
        }
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.renderer.resize(winit::dpi::PhysicalSize::new(width, height));
        if let Screen::Viewing(viewer) = &mut self.screen {
            viewer.resize(width, height);
        } else {
            self.try_mount();
        }
    }

    pub fn handle_window_event(&mut self, event: &WindowEvent<'_>, control_flow: &mut ControlFlow) {
        let response = self
            .renderer
            .egui_state
            .on_event(&self.renderer.egui_ctx, event);
        let on_control = response.consumed;

        match event {
            WindowEvent::CloseRequested => self.exit(control_flow),
            WindowEvent::Resized(size) => self.resize(size.width, size.height),
            WindowEvent::ScaleFactorChanged { new_inner_size, .. } => {
                self.resize(new_inner_size.width, new_inner_size.height)
            }

            WindowEvent::KeyboardInput { input, .. }
                if input.state == ElementState::Pressed && !on_control =>
            {
                match input.virtual_keycode {
                    Some(VirtualKeyCode::O) => self.pick_file(),
                    Some(VirtualKeyCode::F11) => self.toggle_fullscreen(),
                    Some(VirtualKeyCode::Escape) => {
                        if self.fullscreen {
                            self.toggle_fullscreen();
                        } else {
                            self.exit(control_flow);
                        }
                    }
                    _ => {}
                }
            }

            WindowEvent::CursorMoved { position, .. } => {
                self.cursor = logical_point(*position, self.window.scale_factor());
                let (x, y) = self.cursor;
                self.feed(PointerInput::Move {
                    pointer: PointerId::Mouse,
                    x,
                    y,
                    on_control,
                });
            }
            WindowEvent::CursorLeft { .. } => self.feed(PointerInput::Leave),
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => {
                let (x, y) = self.cursor;
                match state {
                    ElementState::Pressed => self.feed(PointerInput::Down {
                        pointer: PointerId::Mouse,
                        x,
                        y,
                        on_control,
                    }),
                    // releases always reach the controller so a drag never sticks
                    ElementState::Released => self.feed(PointerInput::Up {
                        pointer: PointerId::Mouse,
                    }),
                }
            }
            WindowEvent::MouseWheel { delta, .. } if !on_control => {
                let delta_y = wheel_delta_y(
                    delta,
                    self.window.scale_factor(),
                    self.config.wheel_line_pixels,
                );
                self.feed(PointerInput::Wheel { delta_y });
            }
            WindowEvent::Touch(Touch {
                phase, location, id, ..
            }) => {
                let pointer = PointerId::Touch(*id);
                let (x, y) = logical_point(*location, self.window.scale_factor());
                let input = match phase {
                    TouchPhase::Started => PointerInput::Down {
                        pointer,
                        x,
                        y,
                        on_control,
                    },
                    TouchPhase::Moved => PointerInput::Move {
                        pointer,
                        x,
                        y,
                        on_control,
                    },
                    TouchPhase::Ended | TouchPhase::Cancelled => PointerInput::Up { pointer },
                };
                self.feed(input);
            }

            WindowEvent::DroppedFile(path) => self.open_path_or_report(path),
            _ => {}
        }
    }

    /// Per-frame work: mount retries, finished loads, then one frame.
    pub fn redraw(&mut self, control_flow: &mut ControlFlow) {
        if let Screen::Mounting(_) = self.screen {
            self.try_mount();
        }

        if let Screen::Viewing(viewer) = &mut self.screen {
            viewer.poll_loads();
            for event in viewer.take_events() {
                match event {
                    ViewerEvent::SelectionChanged { index, tag } => {
                        log::debug!("selected panorama {index} ({tag})")
                    }
                    ViewerEvent::Loaded { index } => log::debug!("panorama {index} on screen"),
                    ViewerEvent::LoadFailed { index, error } => {
                        log::debug!("panorama {index} not shown: {error}")
                    }
                }
            }
            if let FirstLoad::Failed(error) = viewer.first_load() {
                log::error!("{error}");
                let message = crate::i18n::tr("viewer.load_failed");
                viewer.teardown();
                self.screen = Screen::Fallback { message };
            }
        }

        let mut frame = match self.renderer.begin_frame() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.renderer.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory");
                self.exit(control_flow);
                return;
            }
            Err(e) => {
                log::warn!("skipping frame: {e}");
                return;
            }
        };

        if let Screen::Viewing(viewer) = &mut self.screen {
            if let Err(e) = viewer.render_frame(&mut frame) {
                self.report_render_error(e);
            }
        }

        let window = Arc::clone(&self.window);
        let mut action = None;
        let full_output = match &self.screen {
            Screen::Viewing(viewer) => {
                let labels = viewer.labels();
                let overlay = ViewerOverlay {
                    labels: &labels,
                    selected: viewer.selection(),
                    loading: viewer.is_loading(),
                };
                self.renderer
                    .run_ui(&window, |ctx| action = crate::ui::draw_viewer_overlay(ctx, &overlay))
            }
            Screen::Fallback { message } => {
                let message = message.clone();
                self.renderer
                    .run_ui(&window, |ctx| action = crate::ui::draw_fallback(ctx, &message))
            }
            Screen::Mounting(_) => self.renderer.run_ui(&window, |_| {}),
        };
        self.renderer.finish_frame(&window, frame, full_output);

        match action {
            Some(OverlayAction::Select(index)) => {
                if let Screen::Viewing(viewer) = &mut self.screen {
                    if let Err(e) = viewer.select_entry(index) {
                        log::warn!("{e}");
                    }
                }
            }
            Some(OverlayAction::OpenRoom) => self.pick_file(),
            Some(OverlayAction::Exit) => self.exit(control_flow),
            None => {}
        }

        // keep animating only while something is on the sphere
        if *control_flow != ControlFlow::Exit {
            *control_flow = match self.screen {
                Screen::Viewing(_) | Screen::Mounting(_) => ControlFlow::Poll,
                Screen::Fallback { .. } => ControlFlow::Wait,
            };
        }
    }

    fn report_render_error(&mut self, error: RenderError) {
        log::error!("render failed: {error}");
        self.close_viewer();
        self.screen = Screen::Fallback {
            message: crate::i18n::tr("viewer.load_failed"),
        };
    }

    pub fn request_redraw(&self) {
        self.window.request_redraw();
    }
}
