// navigator.rs — which panorama of the set is shown, and how switching to another one lands

use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use image::RgbaImage;

use crate::error::{LoadError, ViewerError};
use crate::panorama::PanoramaSet;
use crate::scene::TextureSwap;
use crate::session::{RenderBackend, RenderSession};
use crate::source::{prepare_texture_image, ImageFetcher, SourceResolver};

/// Identity of one load request. Strictly increasing per navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadTicket(u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub ticket: LoadTicket,
    pub index: usize,
    pub location: String,
}

/// Result of a fetch, as delivered by a worker.
#[derive(Debug)]
pub struct LoadOutcome {
    pub ticket: LoadTicket,
    pub index: usize,
    pub location: String,
    pub result: Result<RgbaImage, LoadError>,
}

/// What happened to a finished (or expired) load.
#[derive(Debug)]
pub enum LoadResolution {
    Applied { index: usize, swap: TextureSwap },
    /// A newer request was issued before this one finished; result dropped.
    Superseded { index: usize },
    Failed { index: usize, error: LoadError },
    /// Arrived after the session was torn down; nothing was touched.
    Discarded { index: usize },
}

#[derive(Debug, Clone)]
struct InFlight {
    ticket: LoadTicket,
    index: usize,
    location: String,
    started: Instant,
}

pub struct PanoramaNavigator {
    set: PanoramaSet,
    selection: usize,
    displayed: Option<usize>,
    in_flight: Option<InFlight>,
    next_ticket: u64,
    timeout: Duration,
    texture_limit: u32,
    resolver: Arc<dyn SourceResolver>,
    fetcher: Arc<dyn ImageFetcher>,
    tx: Sender<LoadOutcome>,
    rx: Receiver<LoadOutcome>,
}

impl PanoramaNavigator {
    pub fn new(
        set: PanoramaSet,
        resolver: Arc<dyn SourceResolver>,
        fetcher: Arc<dyn ImageFetcher>,
        timeout: Duration,
    ) -> Self {
        let (tx, rx) = channel();
        Self {
            set,
            selection: 0,
            displayed: None,
            in_flight: None,
            next_ticket: 0,
            timeout,
            texture_limit: u32::MAX,
            resolver,
            fetcher,
            tx,
            rx,
        }
    }

    pub fn set(&self) -> &PanoramaSet {
        &self.set
    }

    /// Highlighted entry: the most recent explicit selection.
    pub fn selection(&self) -> usize {
        self.selection
    }

    /// Entry whose image is currently on the sphere.
    pub fn displayed(&self) -> Option<usize> {
        self.displayed
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Images are fitted to `max` edge pixels on the load worker, before they reach the session.
    pub fn set_texture_limit(&mut self, max: u32) {
        self.texture_limit = max;
    }

    pub fn pending(&self) -> Option<LoadTicket> {
        self.in_flight.as_ref().map(|f| f.ticket)
    }

    /// Register a load for `index` without starting any work.
    /// Any request still in flight is superseded from here on.
    pub fn begin_load(&mut self, index: usize) -> Result<LoadRequest, ViewerError> {
        let entry = self.set.entry(index)?;
        let location = self.resolver.resolve(entry.source());

        self.next_ticket += 1;
        let ticket = LoadTicket(self.next_ticket);
        if let Some(prev) = self.in_flight.replace(InFlight {
            ticket,
            index,
            location: location.clone(),
            started: Instant::now(),
        }) {
            log::debug!("load of entry {} superseded by entry {}", prev.index, index);
        }

        log::info!(
            "{}",
            crate::i18n::tr_with("log.load_start", &[("location", location.clone())])
        );
        Ok(LoadRequest {
            ticket,
            index,
            location,
        })
    }

    /// Start fetching entry `index` on a worker thread. The result is picked up by [`Self::poll`].
    pub fn load_entry(&mut self, index: usize) -> Result<LoadTicket, ViewerError> {
        let request = self.begin_load(index)?;
        let ticket = request.ticket;
        let fetcher = Arc::clone(&self.fetcher);
        let tx = self.tx.clone();
        let location = request.location.clone();
        let texture_limit = self.texture_limit;

        let spawned = thread::Builder::new()
            .name(format!("panorama-load-{}", ticket.0))
            .spawn(move || {
                let result = fetcher
                    .fetch(&request.location)
                    .map(|img| prepare_texture_image(img, texture_limit).0);
                let outcome = LoadOutcome {
                    ticket: request.ticket,
                    index: request.index,
                    location: request.location,
                    result,
                };
                if tx.send(outcome).is_err() {
                    log::debug!("viewer gone before load {:?} finished", request.ticket);
                }
            });

        if let Err(source) = spawned {
            let _ = self.tx.send(LoadOutcome {
                ticket,
                index,
                location: location.clone(),
                result: Err(LoadError::Worker { location, source }),
            });
        }
        Ok(ticket)
    }

    /// User-driven switch: highlight `index` and load it.
    pub fn select_entry(&mut self, index: usize) -> Result<LoadTicket, ViewerError> {
        self.set.entry(index)?;
        self.selection = index;
        self.load_entry(index)
    }

    /// Apply a finished load to `session` if it is still the newest request.
    pub fn complete<B: RenderBackend>(
        &mut self,
        outcome: LoadOutcome,
        session: &mut RenderSession<B>,
    ) -> LoadResolution {
        let index = outcome.index;
        let current = self.in_flight.as_ref().map(|f| f.ticket);
        if current != Some(outcome.ticket) {
            log::debug!("dropping stale result for entry {index} ({})", outcome.location);
            return LoadResolution::Superseded { index };
        }
        self.in_flight = None;
        if session.is_torn_down() {
            log::debug!("load for entry {index} finished after teardown");
            return LoadResolution::Discarded { index };
        }

        match outcome.result {
            Ok(image) => {
                let (w, h) = image.dimensions();
                match session.apply_image(&outcome.location, image) {
                    Some(swap) => {
                        self.displayed = Some(index);
                        log::info!(
                            "{}",
                            crate::i18n::tr_with(
                                "log.load_ok",
                                &[
                                    ("location", outcome.location),
                                    ("w", w.to_string()),
                                    ("h", h.to_string())
                                ]
                            )
                        );
                        LoadResolution::Applied { index, swap }
                    }
                    None => LoadResolution::Discarded { index },
                }
            }
            Err(error) => {
                log::warn!(
                    "{}",
                    crate::i18n::tr_with("log.load_failed", &[("err", error.to_string())])
                );
                LoadResolution::Failed { index, error }
            }
        }
    }

    fn is_overdue(&self, now: Instant) -> bool {
        self.in_flight
            .as_ref()
            .is_some_and(|f| now.saturating_duration_since(f.started) >= self.timeout)
    }

    /// Drop an overdue request without reporting it. Used once nobody is watching.
    fn abandon_overdue(&mut self, now: Instant) -> Option<usize> {
        if !self.is_overdue(now) {
            return None;
        }
        let flight = self.in_flight.take()?;
        log::debug!("load for entry {} expired after teardown", flight.index);
        Some(flight.index)
    }

    /// Fail the in-flight request if it has outlived the timeout as of `now`.
    pub fn expire(&mut self, now: Instant) -> Option<LoadResolution> {
        if !self.is_overdue(now) {
            return None;
        }
        let flight = self.in_flight.take()?;
        let error = LoadError::Timeout {
            location: flight.location,
            after: self.timeout,
        };
        log::warn!(
            "{}",
            crate::i18n::tr_with("log.load_failed", &[("err", error.to_string())])
        );
        Some(LoadResolution::Failed {
            index: flight.index,
            error,
        })
    }

    /// Drain finished workers and apply timeouts. Never blocks.
    pub fn poll<B: RenderBackend>(&mut self, session: &mut RenderSession<B>) -> Vec<LoadResolution> {
        let mut resolved = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(outcome) => resolved.push(self.complete(outcome, session)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        let now = Instant::now();
        if session.is_torn_down() {
            if let Some(index) = self.abandon_overdue(now) {
                resolved.push(LoadResolution::Discarded { index });
            }
        } else if let Some(expired) = self.expire(now) {
            resolved.push(expired);
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::panorama::PanoramaEntry;
    use crate::source::BaseUrlResolver;

    struct Unreachable;

    impl ImageFetcher for Unreachable {
        fn fetch(&self, location: &str) -> Result<RgbaImage, LoadError> {
            Err(LoadError::Io {
                location: location.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "offline"),
            })
        }
    }

    fn navigator(timeout: Duration) -> PanoramaNavigator {
        let set = PanoramaSet::new(vec![
            PanoramaEntry::new("/uploads/liv.jpg", "거실"),
            PanoramaEntry::new("bed.jpg", "침실"),
        ])
        .unwrap();
        PanoramaNavigator::new(
            set,
            Arc::new(BaseUrlResolver::new("http://rooms.test")),
            Arc::new(Unreachable),
            timeout,
        )
    }

    #[test]
    fn test_requests_resolve_through_resolver() {
        let mut nav = navigator(Duration::from_secs(5));
        let first = nav.begin_load(0).unwrap();
        let second = nav.begin_load(1).unwrap();
        assert_eq!(first.location, "http://rooms.test/uploads/liv.jpg");
        assert_eq!(second.location, "http://rooms.test/uploads/panoramas/bed.jpg");
        assert!(second.ticket > first.ticket);
        assert_eq!(nav.pending(), Some(second.ticket));
    }

    #[test]
    fn test_out_of_range_selection_leaves_state() {
        let mut nav = navigator(Duration::from_secs(5));
        assert!(matches!(
            nav.select_entry(2),
            Err(ViewerError::IndexOutOfRange { index: 2, len: 2 })
        ));
        assert_eq!(nav.selection(), 0);
        assert!(!nav.is_loading());
    }

    #[test]
    fn test_expire_reports_timeout_once() {
        let mut nav = navigator(Duration::from_secs(5));
        nav.begin_load(1).unwrap();
        assert!(nav.expire(Instant::now()).is_none());

        let later = Instant::now() + Duration::from_secs(6);
        match nav.expire(later) {
            Some(LoadResolution::Failed {
                index: 1,
                error: LoadError::Timeout { location, .. },
            }) => assert!(location.ends_with("bed.jpg")),
            other => panic!("expected timeout, got {other:?}"),
        }
        assert!(nav.expire(later).is_none());
        assert!(!nav.is_loading());
    }
}
