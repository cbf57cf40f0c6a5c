// viewer.rs — one mounted panorama viewer: session + orientation + navigator

use std::sync::Arc;

use crate::config::ViewerConfig;
use crate::error::{RenderError, ViewerError};
use crate::navigator::{LoadResolution, PanoramaNavigator};
use crate::orientation::{OrientationController, PointerInput};
use crate::panorama::{OrientationState, PanoramaEntry, PanoramaSet};
use crate::session::{Host, RenderBackend, RenderSession};
use crate::source::{ImageFetcher, SourceResolver};

/// Signals for the host UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewerEvent {
    /// Highlight moved to `index`.
    SelectionChanged { index: usize, tag: String },
    /// Entry `index` is now on screen.
    Loaded { index: usize },
    LoadFailed { index: usize, error: String },
}

/// State of the very first image, which decides whether the host shows
/// the panorama or a fallback message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FirstLoad {
    Pending,
    Shown,
    Failed(String),
}

pub enum Mount<B: RenderBackend> {
    Mounted(PanoramaViewer<B>),
    /// Host not ready yet; try again on the next mount attempt.
    HostUnavailable,
}

pub struct PanoramaViewer<B: RenderBackend> {
    session: RenderSession<B>,
    controller: OrientationController,
    navigator: PanoramaNavigator,
    events: Vec<ViewerEvent>,
    first_load: FirstLoad,
}

impl<B: RenderBackend> PanoramaViewer<B> {
    /// Mount on `host` and start loading the first entry.
    ///
    /// An empty `entries` list fails with [`ViewerError::EmptySet`] before any
    /// scene or camera exists; an inconsistent `config` fails with
    /// [`ViewerError::Config`] before the host is touched.
    pub fn mount<H>(
        entries: Vec<PanoramaEntry>,
        host: Option<&H>,
        config: &ViewerConfig,
        resolver: Arc<dyn SourceResolver>,
        fetcher: Arc<dyn ImageFetcher>,
    ) -> Result<Mount<B>, ViewerError>
    where
        H: Host<Backend = B>,
    {
        let set = PanoramaSet::new(entries).map_err(|e| {
            log::warn!("panorama viewer not mounted: {e}");
            e
        })?;
        config.validate()?;

        let Some(session) = RenderSession::initialize(host, config)? else {
            log::debug!("host not ready, mount deferred");
            return Ok(Mount::HostUnavailable);
        };

        let mut navigator = PanoramaNavigator::new(set, resolver, fetcher, config.load_timeout());
        if let Some(max) = session.max_texture_dimension() {
            navigator.set_texture_limit(max);
        }

        let mut viewer = Self {
            session,
            controller: OrientationController::from_config(config),
            navigator,
            events: Vec::new(),
            first_load: FirstLoad::Pending,
        };
        viewer.navigator.load_entry(0)?;
        viewer.push_selection(0);
        Ok(Mount::Mounted(viewer))
    }

    pub fn entries(&self) -> &PanoramaSet {
        self.navigator.set()
    }

    /// Selector labels in display order.
    pub fn labels(&self) -> Vec<String> {
        self.navigator.set().labels()
    }

    pub fn selection(&self) -> usize {
        self.navigator.selection()
    }

    pub fn displayed(&self) -> Option<usize> {
        self.navigator.displayed()
    }

    pub fn orientation(&self) -> OrientationState {
        self.controller.state()
    }

    pub fn first_load(&self) -> &FirstLoad {
        &self.first_load
    }

    pub fn is_loading(&self) -> bool {
        self.first_load == FirstLoad::Pending
    }

    pub fn is_mounted(&self) -> bool {
        !self.session.is_torn_down()
    }

    pub fn session(&self) -> &RenderSession<B> {
        &self.session
    }

    pub fn backend_mut(&mut self) -> Option<&mut B> {
        self.session.backend_mut()
    }

    pub fn handle_input(&mut self, input: PointerInput) -> bool {
        if !self.is_mounted() {
            return false;
        }
        self.controller.handle(input)
    }

    pub fn select_entry(&mut self, index: usize) -> Result<(), ViewerError> {
        if !self.is_mounted() {
            return Ok(());
        }
        self.navigator.select_entry(index)?;
        self.push_selection(index);
        Ok(())
    }

    fn push_selection(&mut self, index: usize) {
        let tag = self
            .navigator
            .set()
            .get(index)
            .map(|e| e.tag().to_string())
            .unwrap_or_default();
        self.events.push(ViewerEvent::SelectionChanged { index, tag });
    }

    /// Pick up finished loads. Call once per frame before drawing.
    pub fn poll_loads(&mut self) -> Vec<LoadResolution> {
        let resolved = self.navigator.poll(&mut self.session);
        for resolution in &resolved {
            match resolution {
                LoadResolution::Applied { index, .. } => {
                    self.first_load = FirstLoad::Shown;
                    self.events.push(ViewerEvent::Loaded { index: *index });
                }
                LoadResolution::Failed { index, error } => {
                    if self.navigator.displayed().is_none() {
                        self.first_load = FirstLoad::Failed(error.to_string());
                    }
                    self.events.push(ViewerEvent::LoadFailed {
                        index: *index,
                        error: error.to_string(),
                    });
                }
                LoadResolution::Superseded { .. } | LoadResolution::Discarded { .. } => {}
            }
        }
        resolved
    }

    pub fn render_frame(&mut self, frame: &mut B::Frame) -> Result<(), RenderError> {
        let orientation = self.controller.state();
        self.session.render_frame(frame, &orientation)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.session.resize(width, height);
    }

    pub fn take_events(&mut self) -> Vec<ViewerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Release every graphics resource. Later loads are discarded.
    pub fn teardown(&mut self) {
        self.session.teardown();
    }
}
