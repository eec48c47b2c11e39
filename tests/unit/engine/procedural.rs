use super::*;
use crate::RenderJobProgress;
use crate::engine::event::tile_event_channel;
use crate::foundation::core::Point2D;

fn scene() -> Arc<SceneSnapshot> {
    let engine = ProceduralEngine::new();
    let device = engine.resolve_device(None).expect("default device");
    let mut scene = SceneSnapshot::new(device, Default::default());
    scene.objects.push(SceneObject {
        name: "disc".to_string(),
        center: [0.5, 0.5],
        radius: 0.3,
        depth: 2.0,
        color: Rgba::new(0.8, 0.2, 0.1, 1.0),
        velocity: [0.0, 0.0],
    });
    Arc::new(scene)
}

fn params(w: i32, h: i32, progressive: bool) -> BufferParams {
    BufferParams {
        full: Point2D::new(w, h),
        region: Rect2D::from_size(Point2D::new(w, h)),
        passes: vec![
            RenderPassDescriptor::combined(),
            RenderPassDescriptor::new(PassKind::Depth, "Depth"),
        ],
        progressive,
        tile_size: 8,
    }
}

#[test]
fn resolves_default_and_named_devices() {
    let engine = ProceduralEngine::new();
    assert_eq!(engine.resolve_device(None).unwrap().name, "CPU");
    assert!(engine.resolve_device(Some("cpu")).is_some());
    assert!(engine.resolve_device(Some("gpu")).is_none());
}

#[test]
fn start_before_reset_is_an_engine_error() {
    let (tx, _rx) = tile_event_channel();
    let mut session = ProceduralEngine::new().create_session(scene(), tx).unwrap();
    let err = session.start(CancelToken::new()).unwrap_err();
    assert!(matches!(err, BridgeError::Engine(_)));
}

#[test]
fn tile_by_tile_covers_region_once() {
    let (tx, rx) = tile_event_channel();
    let mut session = ProceduralEngine::new().create_session(scene(), tx).unwrap();
    session.reset(&params(20, 12, false), 2);
    session.start(CancelToken::new()).unwrap();
    session.join();
    drop(session);

    let events: Vec<TileEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 3 * 2);
    assert!(events.iter().all(|e| e.kind == TileEventKind::Final));
    let area: i32 = events.iter().map(|e| e.tile.width * e.tile.height).sum();
    assert_eq!(area, 20 * 12);

    let e = &events[0];
    let px = (e.tile.width * e.tile.height) as usize;
    assert_eq!(e.pass("Combined").unwrap().pixels.len(), px * 4);
    assert_eq!(e.pass("Depth").unwrap().pixels.len(), px);
}

#[test]
fn progressive_emits_partials_then_finals() {
    let (tx, rx) = tile_event_channel();
    let mut session = ProceduralEngine::new().create_session(scene(), tx).unwrap();
    session.reset(&params(16, 8, true), 3);
    session.start(CancelToken::new()).unwrap();
    session.join();

    assert_eq!(session.status(), "Finished");
    assert!(!session.is_running());
    let events: Vec<TileEvent> = rx.try_iter().collect();
    let finals = events.iter().filter(|e| e.kind == TileEventKind::Final).count();
    let partials = events.iter().filter(|e| e.kind == TileEventKind::Partial).count();
    assert_eq!(finals, 2);
    assert_eq!(partials, 4);
}

#[test]
fn cropped_region_tiles_start_at_region_bottom() {
    let (tx, rx) = tile_event_channel();
    let mut session = ProceduralEngine::new().create_session(scene(), tx).unwrap();
    let mut p = params(32, 32, false);
    p.region = Rect2D::new(Point2D::new(8, 4), Point2D::new(16, 12));
    session.reset(&p, 1);
    session.start(CancelToken::new()).unwrap();
    session.join();

    let events: Vec<TileEvent> = rx.try_iter().collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].tile, TileRect::new(0, 32 - 12, 8, 8));
}

#[test]
fn pre_cancelled_token_stops_before_any_tile() {
    let (tx, rx) = tile_event_channel();
    let mut session = ProceduralEngine::new().create_session(scene(), tx).unwrap();
    session.reset(&params(16, 16, true), 4);
    let cancel = CancelToken::new();
    cancel.cancel();
    session.start(cancel).unwrap();
    session.join();

    assert_eq!(session.status(), "Cancel");
    assert_eq!(rx.try_iter().count(), 0);
    let progress = RenderJobProgress::parse(&session.status());
    assert!(progress.complete);
    assert!(!progress.errored);
}

#[test]
fn injected_failure_reports_an_error_status() {
    let (tx, _rx) = tile_event_channel();
    let engine = ProceduralEngine::with_opts(ProceduralEngineOpts {
        fail_at_sample: Some(2),
        ..Default::default()
    });
    let mut session = engine.create_session(scene(), tx).unwrap();
    session.reset(&params(8, 8, true), 4);
    session.start(CancelToken::new()).unwrap();
    session.join();

    let progress = RenderJobProgress::parse(&session.status());
    assert!(progress.errored);
    assert!(progress.error_message.contains("injected failure"));
}

#[test]
fn transparent_background_has_zero_alpha() {
    let (tx, rx) = tile_event_channel();
    let mut session = ProceduralEngine::new().create_session(scene(), tx).unwrap();
    session.set_transparent_background(true);
    session.reset(&params(8, 8, false), 1);
    session.start(CancelToken::new()).unwrap();
    session.join();

    let events: Vec<TileEvent> = rx.try_iter().collect();
    let combined = &events[0].pass("Combined").unwrap().pixels;
    // Bottom-left corner lies outside the disc.
    assert_eq!(combined[3], 0.0);
}

#[test]
fn dropped_receiver_stops_the_worker() {
    let (tx, rx) = tile_event_channel();
    drop(rx);
    let mut session = ProceduralEngine::new().create_session(scene(), tx).unwrap();
    session.reset(&params(16, 16, false), 1);
    session.start(CancelToken::new()).unwrap();
    session.join();
    assert_eq!(session.status(), "Cancel");
}
