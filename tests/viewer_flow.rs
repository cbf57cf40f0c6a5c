mod common;

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use room_panorama::error::LoadError;
use room_panorama::navigator::{LoadResolution, PanoramaNavigator};
use room_panorama::orientation::{PointerId, PointerInput};
use room_panorama::panorama::{OrientationState, PanoramaEntry, PanoramaSet};
use room_panorama::scene::TextureSwap;
use room_panorama::session::RenderSession;
use room_panorama::viewer::FirstLoad;
use room_panorama::{Mount, PanoramaViewer, ViewerConfig, ViewerError, ViewerEvent};

use common::{wait_for_resolutions, GatedFetcher, MockBackend, MockHost, Reply, Verbatim};

fn room_entries() -> Vec<PanoramaEntry> {
    vec![
        PanoramaEntry::new("liv.jpg", "거실"),
        PanoramaEntry::new("bed.jpg", "침실"),
        PanoramaEntry::new("bath.jpg", ""),
    ]
}

fn mount(
    entries: Vec<PanoramaEntry>,
    host: &MockHost,
    fetcher: &Arc<GatedFetcher>,
) -> PanoramaViewer<MockBackend> {
    let mounted = PanoramaViewer::mount(
        entries,
        Some(host),
        &ViewerConfig::default(),
        Arc::new(Verbatim),
        fetcher.clone(),
    )
    .unwrap();
    match mounted {
        Mount::Mounted(viewer) => viewer,
        Mount::HostUnavailable => panic!("host should be available"),
    }
}

/// Mount and wait for the first entry to reach the sphere.
fn mount_shown(host: &MockHost, fetcher: &Arc<GatedFetcher>) -> PanoramaViewer<MockBackend> {
    let mut viewer = mount(room_entries(), host, fetcher);
    let first = wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(first[..], [LoadResolution::Applied { index: 0, .. }]));
    viewer.render_frame(&mut ()).unwrap();
    viewer.take_events();
    viewer
}

#[test]
fn test_empty_set_is_rejected_before_attach() {
    let host = MockHost::new(800, 600);
    let result = PanoramaViewer::mount(
        Vec::new(),
        Some(&host),
        &ViewerConfig::default(),
        Arc::new(Verbatim),
        GatedFetcher::new(),
    );
    assert!(matches!(result, Err(ViewerError::EmptySet)));
    assert_eq!(host.calls.borrow().attaches, 0);
}

#[test]
fn test_missing_or_collapsed_host_defers_mount() {
    let none: Option<&MockHost> = None;
    let result = PanoramaViewer::mount(
        room_entries(),
        none,
        &ViewerConfig::default(),
        Arc::new(Verbatim),
        GatedFetcher::new(),
    );
    assert!(matches!(result, Ok(Mount::HostUnavailable)));

    let collapsed = MockHost::new(0, 0);
    let result = PanoramaViewer::mount(
        room_entries(),
        Some(&collapsed),
        &ViewerConfig::default(),
        Arc::new(Verbatim),
        GatedFetcher::new(),
    );
    assert!(matches!(result, Ok(Mount::HostUnavailable)));
    assert_eq!(collapsed.calls.borrow().attaches, 0);
}

#[test]
fn test_room_walkthrough() {
    let host = MockHost::new(1280, 720);
    let fetcher = GatedFetcher::new();
    let mut viewer = mount(room_entries(), &host, &fetcher);

    assert_eq!(viewer.labels(), vec!["거실", "침실", "파노라마 3"]);
    assert!(viewer.is_loading());
    assert_eq!(
        viewer.take_events(),
        vec![ViewerEvent::SelectionChanged {
            index: 0,
            tag: "거실".to_string()
        }]
    );

    let first = wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(
        first[..],
        [LoadResolution::Applied {
            index: 0,
            swap: TextureSwap::CreatedMesh(_)
        }]
    ));
    assert_eq!(viewer.first_load(), &FirstLoad::Shown);
    assert_eq!(viewer.displayed(), Some(0));
    viewer.render_frame(&mut ()).unwrap();

    viewer.select_entry(1).unwrap();
    assert_eq!(viewer.selection(), 1);
    let second = wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(
        second[..],
        [LoadResolution::Applied {
            index: 1,
            swap: TextureSwap::Replaced { .. }
        }]
    ));
    viewer.render_frame(&mut ()).unwrap();

    assert_eq!(viewer.displayed(), Some(1));
    assert_eq!(viewer.session().scene().mesh_count(), 1);
    let calls = host.calls.borrow();
    assert_eq!(calls.meshes, 1);
    assert_eq!(calls.textures.len(), 2);
    assert_eq!(calls.draws, 2);
}

#[test]
fn test_latest_selection_wins_when_it_finishes_first() {
    let host = MockHost::new(800, 600);
    let fetcher = GatedFetcher::new();
    let mut viewer = mount_shown(&host, &fetcher);

    let slow = fetcher.gate("bed.jpg");
    let fast = fetcher.gate("bath.jpg");
    viewer.select_entry(1).unwrap();
    viewer.select_entry(2).unwrap();

    fast.send(Reply::Image(128, 64)).unwrap();
    let resolved = wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(resolved[..], [LoadResolution::Applied { index: 2, .. }]));

    slow.send(Reply::Image(32, 16)).unwrap();
    let resolved = wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(resolved[..], [LoadResolution::Superseded { index: 1 }]));

    viewer.render_frame(&mut ()).unwrap();
    assert_eq!(viewer.displayed(), Some(2));
    assert_eq!(viewer.selection(), 2);
    assert_eq!(host.calls.borrow().textures.last(), Some(&(128, 64)));
}

#[test]
fn test_earlier_selection_finishing_first_is_dropped() {
    let host = MockHost::new(800, 600);
    let fetcher = GatedFetcher::new();
    let mut viewer = mount_shown(&host, &fetcher);

    let older = fetcher.gate("bed.jpg");
    let newer = fetcher.gate("bath.jpg");
    viewer.select_entry(1).unwrap();
    viewer.select_entry(2).unwrap();

    older.send(Reply::Image(32, 16)).unwrap();
    let resolved = wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(resolved[..], [LoadResolution::Superseded { index: 1 }]));
    assert_eq!(viewer.displayed(), Some(0));

    newer.send(Reply::Image(128, 64)).unwrap();
    let resolved = wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(resolved[..], [LoadResolution::Applied { index: 2, .. }]));
    viewer.render_frame(&mut ()).unwrap();

    let calls = host.calls.borrow();
    assert_eq!(calls.textures, vec![(64, 32), (128, 64)]);
}

#[test]
fn test_failed_switch_keeps_current_image() {
    let host = MockHost::new(800, 600);
    let fetcher = GatedFetcher::new();
    let mut viewer = mount_shown(&host, &fetcher);

    fetcher.gate("bed.jpg").send(Reply::Fail).unwrap();
    viewer.select_entry(1).unwrap();
    let resolved = wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(
        resolved[..],
        [LoadResolution::Failed {
            index: 1,
            error: LoadError::Io { .. }
        }]
    ));
    viewer.render_frame(&mut ()).unwrap();

    assert_eq!(viewer.displayed(), Some(0));
    assert_eq!(viewer.selection(), 1);
    assert_eq!(viewer.first_load(), &FirstLoad::Shown);
    assert_eq!(host.calls.borrow().textures.len(), 1);
    assert!(viewer
        .take_events()
        .iter()
        .any(|e| matches!(e, ViewerEvent::LoadFailed { index: 1, .. })));
}

#[test]
fn test_first_image_failure_is_reported() {
    let host = MockHost::new(800, 600);
    let fetcher = GatedFetcher::new();
    fetcher.gate("liv.jpg").send(Reply::Fail).unwrap();
    let mut viewer = mount(room_entries(), &host, &fetcher);

    wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(viewer.first_load(), FirstLoad::Failed(_)));
    assert_eq!(viewer.displayed(), None);
    assert!(viewer.session().scene().sphere().is_none());
}

#[test]
fn test_out_of_range_selection_is_rejected() {
    let host = MockHost::new(800, 600);
    let fetcher = GatedFetcher::new();
    let mut viewer = mount_shown(&host, &fetcher);

    let err = viewer.select_entry(3).unwrap_err();
    assert!(matches!(err, ViewerError::IndexOutOfRange { index: 3, len: 3 }));
    assert_eq!(viewer.selection(), 0);
    assert!(viewer.take_events().is_empty());
}

#[test]
fn test_load_after_teardown_touches_nothing() {
    let host = MockHost::new(800, 600);
    let fetcher = GatedFetcher::new();
    let gate = fetcher.gate("liv.jpg");
    let mut viewer = mount(room_entries(), &host, &fetcher);

    viewer.teardown();
    viewer.teardown();
    assert!(!viewer.is_mounted());

    gate.send(Reply::Image(64, 32)).unwrap();
    let resolved = wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(resolved[..], [LoadResolution::Discarded { index: 0 }]));

    viewer.select_entry(1).unwrap();
    viewer.render_frame(&mut ()).unwrap();
    assert!(!viewer.handle_input(PointerInput::Wheel { delta_y: 100.0 }));

    let calls = host.calls.borrow();
    assert_eq!(calls.releases, 1);
    assert!(calls.textures.is_empty());
    assert_eq!(calls.draws, 0);
}

#[test]
fn test_timeout_after_teardown_is_not_reported() {
    let host = MockHost::new(800, 600);
    let set = PanoramaSet::new(room_entries()).unwrap();
    let fetcher = GatedFetcher::new();
    let gate = fetcher.gate("liv.jpg");
    let mut navigator =
        PanoramaNavigator::new(set, Arc::new(Verbatim), fetcher.clone(), Duration::from_millis(50));
    let mut session: RenderSession<MockBackend> =
        RenderSession::initialize(Some(&host), &ViewerConfig::default())
            .unwrap()
            .unwrap();

    navigator.load_entry(0).unwrap();
    session.teardown();
    thread::sleep(Duration::from_millis(80));

    let resolved = navigator.poll(&mut session);
    assert!(matches!(resolved[..], [LoadResolution::Discarded { index: 0 }]));
    assert!(!navigator.is_loading());
    assert!(navigator.poll(&mut session).is_empty());

    gate.send(Reply::Image(64, 32)).unwrap();
    let mut late = Vec::new();
    for _ in 0..200 {
        late.extend(navigator.poll(&mut session));
        if !late.is_empty() {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(late
        .iter()
        .all(|r| !matches!(r, LoadResolution::Failed { .. } | LoadResolution::Applied { .. })));
    assert!(host.calls.borrow().textures.is_empty());
}

#[test]
fn test_viewer_stays_quiet_when_load_expires_after_teardown() {
    let host = MockHost::new(800, 600);
    let fetcher = GatedFetcher::new();
    let _gate = fetcher.gate("liv.jpg");
    let config = ViewerConfig {
        load_timeout_secs: 1,
        ..ViewerConfig::default()
    };
    let Mount::Mounted(mut viewer) =
        PanoramaViewer::mount(room_entries(), Some(&host), &config, Arc::new(Verbatim), fetcher.clone())
            .unwrap()
    else {
        panic!("host was ready");
    };
    viewer.take_events();

    viewer.teardown();
    thread::sleep(Duration::from_millis(1100));

    let resolved = viewer.poll_loads();
    assert!(matches!(resolved[..], [LoadResolution::Discarded { index: 0 }]));
    assert!(viewer.take_events().is_empty());
    assert_eq!(viewer.first_load(), &FirstLoad::Pending);
}

#[test]
fn test_inverted_zoom_bounds_are_rejected_at_mount() {
    let host = MockHost::new(800, 600);
    let config = ViewerConfig {
        min_radius: 150.0,
        max_radius: 100.0,
        ..ViewerConfig::default()
    };
    let result = PanoramaViewer::mount(
        room_entries(),
        Some(&host),
        &config,
        Arc::new(Verbatim),
        GatedFetcher::new(),
    );
    assert!(matches!(result, Err(ViewerError::Config(_))));
    assert_eq!(host.calls.borrow().attaches, 0);
}

#[test]
fn test_loaded_image_is_fitted_to_backend_texture_limit() {
    let host = MockHost::new(800, 600);
    host.calls.borrow_mut().texture_limit = Some(32);
    let fetcher = GatedFetcher::new();
    let mut viewer = mount(room_entries(), &host, &fetcher);

    let resolved = wait_for_resolutions(&mut viewer, 1);
    assert!(matches!(resolved[..], [LoadResolution::Applied { index: 0, .. }]));
    viewer.render_frame(&mut ()).unwrap();

    assert_eq!(host.calls.borrow().textures, vec![(32, 16)]);
}

#[test]
fn test_drop_releases_backend() {
    let host = MockHost::new(800, 600);
    let fetcher = GatedFetcher::new();
    let viewer = mount_shown(&host, &fetcher);
    drop(viewer);
    assert_eq!(host.calls.borrow().releases, 1);
}

#[test]
fn test_drag_and_zoom_move_the_camera() {
    let host = MockHost::new(800, 600);
    let fetcher = GatedFetcher::new();
    let mut viewer = mount_shown(&host, &fetcher);

    viewer.handle_input(PointerInput::Down {
        pointer: PointerId::Mouse,
        x: 400.0,
        y: 300.0,
        on_control: false,
    });
    viewer.handle_input(PointerInput::Move {
        pointer: PointerId::Mouse,
        x: 300.0,
        y: 350.0,
        on_control: false,
    });
    viewer.handle_input(PointerInput::Up {
        pointer: PointerId::Mouse,
    });
    viewer.handle_input(PointerInput::Wheel { delta_y: 300.0 });

    let state = viewer.orientation();
    assert_eq!(state.yaw, 10.0);
    assert_eq!(state.pitch, 5.0);
    assert_eq!(state.radius, 130.0);

    viewer.render_frame(&mut ()).unwrap();
    let expected = OrientationState {
        yaw: 10.0,
        pitch: 5.0,
        radius: 130.0,
    }
    .camera_position();
    let position = viewer.session().camera().position;
    assert!((position - expected).length() < 1e-3, "{position:?}");
    assert!((position.length() - 130.0).abs() < 1e-3);
}

#[test]
fn test_drag_starting_on_a_control_is_ignored() {
    let host = MockHost::new(800, 600);
    let fetcher = GatedFetcher::new();
    let mut viewer = mount_shown(&host, &fetcher);

    viewer.handle_input(PointerInput::Down {
        pointer: PointerId::Mouse,
        x: 400.0,
        y: 560.0,
        on_control: true,
    });
    assert!(!viewer.handle_input(PointerInput::Move {
        pointer: PointerId::Mouse,
        x: 100.0,
        y: 100.0,
        on_control: false,
    }));
    assert_eq!(viewer.orientation(), OrientationState::default());
}

#[test]
fn test_stalled_load_times_out_and_late_answer_is_ignored() {
    let host = MockHost::new(800, 600);
    let set = PanoramaSet::new(room_entries()).unwrap();
    let fetcher = GatedFetcher::new();
    let gate = fetcher.gate("liv.jpg");
    let mut navigator =
        PanoramaNavigator::new(set, Arc::new(Verbatim), fetcher.clone(), Duration::from_millis(50));
    let mut session: RenderSession<MockBackend> =
        RenderSession::initialize(Some(&host), &ViewerConfig::default())
            .unwrap()
            .unwrap();

    navigator.load_entry(0).unwrap();
    thread::sleep(Duration::from_millis(80));
    let resolved = navigator.poll(&mut session);
    assert!(matches!(
        resolved[..],
        [LoadResolution::Failed {
            index: 0,
            error: LoadError::Timeout { .. }
        }]
    ));
    assert!(!navigator.is_loading());

    gate.send(Reply::Image(64, 32)).unwrap();
    let mut late = Vec::new();
    for _ in 0..200 {
        late.extend(navigator.poll(&mut session));
        if !late.is_empty() {
            break;
        }
        thread::sleep(Duration::from_millis(5));
    }
    assert!(matches!(late[..], [LoadResolution::Superseded { index: 0 }]));
    assert!(session.scene().sphere().is_none());
}
