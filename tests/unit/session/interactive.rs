use super::*;
use crate::engine::procedural::{ProceduralEngine, ProceduralEngineOpts};
use crate::framebuffer::sink::InMemoryFrameBuffer;
use crate::session::host::StaticSceneTranslator;

fn small_config() -> RenderConfig {
    RenderConfig {
        width: 32,
        height: 32,
        samples: 2,
        tile_size: 16,
        ..Default::default()
    }
}

fn session_with(
    opts: ProceduralEngineOpts,
    translator: StaticSceneTranslator,
    config: RenderConfig,
) -> InteractiveSession<StaticSceneTranslator> {
    InteractiveSession::new(Arc::new(ProceduralEngine::with_opts(opts)), translator, config)
}

fn tick_until(
    s: &mut InteractiveSession<StaticSceneTranslator>,
    host: &mut InMemoryFrameBuffer,
    target: SessionState,
) {
    for _ in 0..10_000 {
        if s.state() == target {
            return;
        }
        s.tick(host);
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("never reached {target:?}, stuck in {:?}", s.state());
}

#[test]
fn build_sequence_visits_every_stage_in_order() {
    let mut s = session_with(
        ProceduralEngineOpts::default(),
        StaticSceneTranslator::demo(),
        small_config(),
    );
    let mut host = InMemoryFrameBuffer::new(32, 32);
    let expected = [
        SessionState::Retranslate,
        SessionState::PrepareForBuild,
        SessionState::BuildStage1,
        SessionState::BuildStage2,
        SessionState::BuildStage3,
        SessionState::ReadyToBake,
        SessionState::Baking,
        SessionState::Rendering,
    ];
    assert_eq!(s.state(), SessionState::ReadyToTranslate);
    for want in expected {
        assert!(!s.tick(&mut host));
        assert_eq!(s.state(), want);
    }
    assert_eq!(s.translator().translations(), 2);
    assert!(s.adapter().is_some());
}

#[test]
fn baking_takes_one_tick_per_iteration() {
    let mut s = session_with(
        ProceduralEngineOpts::default(),
        StaticSceneTranslator::demo().with_bake_iterations(3),
        small_config(),
    );
    let mut host = InMemoryFrameBuffer::new(32, 32);
    tick_until(&mut s, &mut host, SessionState::Baking);
    s.tick(&mut host);
    s.tick(&mut host);
    assert_eq!(s.state(), SessionState::Baking);
    s.tick(&mut host);
    assert_eq!(s.state(), SessionState::Rendering);
}

#[test]
fn render_completes_and_stays_complete() {
    let mut s = session_with(
        ProceduralEngineOpts::default(),
        StaticSceneTranslator::demo(),
        small_config(),
    );
    let mut host = InMemoryFrameBuffer::new(32, 32);
    tick_until(&mut s, &mut host, SessionState::Complete);

    assert!(s.copies() >= 1);
    assert!(host.pixels_written() >= 32 * 32);
    assert!(host.pixels().iter().all(|p| p.a > 0.0));
    for _ in 0..3 {
        assert!(s.tick(&mut host));
        assert_eq!(s.state(), SessionState::Complete);
    }
    assert!(s.last_error().is_none());
}

#[test]
fn scene_edit_after_completion_restarts() {
    let mut s = session_with(
        ProceduralEngineOpts::default(),
        StaticSceneTranslator::demo(),
        small_config(),
    );
    let mut host = InMemoryFrameBuffer::new(32, 32);
    tick_until(&mut s, &mut host, SessionState::Complete);

    s.translator_mut().mark_changed();
    assert!(!s.tick(&mut host));
    assert_eq!(s.state(), SessionState::ReadyToTranslate);
    assert!(s.adapter().is_none());
    tick_until(&mut s, &mut host, SessionState::Complete);
    assert_eq!(s.translator().translations(), 4);
}

#[test]
fn first_copy_is_forced_then_throttled() {
    let opts = ProceduralEngineOpts {
        tile_delay: Duration::from_millis(20),
        ..Default::default()
    };
    let mut cfg = small_config();
    cfg.samples = 1000;
    let mut s = session_with(opts, StaticSceneTranslator::demo(), cfg);
    let mut host = InMemoryFrameBuffer::new(32, 32);
    tick_until(&mut s, &mut host, SessionState::Rendering);

    let t0 = Instant::now();
    assert!(!s.tick_at(t0, &mut host));
    assert_eq!(s.copies(), 1);
    assert!(!s.tick_at(t0 + Duration::from_millis(10), &mut host));
    assert_eq!(s.copies(), 1);

    // Later copies need a second sample as well as the interval.
    let deadline = Instant::now() + Duration::from_secs(10);
    while s.adapter().unwrap().progress().samples_rendered <= 1 {
        assert!(Instant::now() < deadline, "engine never reached sample 2");
        std::thread::sleep(Duration::from_millis(5));
    }
    assert!(!s.tick_at(t0 + Duration::from_millis(50), &mut host));
    assert_eq!(s.copies(), 1);
    assert!(!s.tick_at(t0 + Duration::from_millis(150), &mut host));
    assert_eq!(s.copies(), 2);
    assert!(!s.tick_at(t0 + Duration::from_millis(200), &mut host));
    assert_eq!(s.copies(), 2);

    s.translator_mut().mark_changed();
    s.tick_at(t0 + Duration::from_millis(300), &mut host);
    assert_eq!(s.state(), SessionState::Aborting);
    s.tick(&mut host);
    assert_eq!(s.state(), SessionState::ReadyToTranslate);
    assert!(s.adapter().is_none());
}

#[test]
fn missing_camera_aborts_back_to_translate() {
    let mut s = session_with(
        ProceduralEngineOpts::default(),
        StaticSceneTranslator::demo().with_camera(None),
        small_config(),
    );
    let mut host = InMemoryFrameBuffer::new(32, 32);
    tick_until(&mut s, &mut host, SessionState::BuildStage1);
    s.tick(&mut host);
    assert_eq!(s.state(), SessionState::Aborting);
    assert!(s.last_error().unwrap().contains("camera"));
    s.tick(&mut host);
    assert_eq!(s.state(), SessionState::ReadyToTranslate);
}

#[test]
fn unknown_device_aborts() {
    let mut cfg = small_config();
    cfg.device = Some("quantum".to_string());
    let mut s = session_with(ProceduralEngineOpts::default(), StaticSceneTranslator::demo(), cfg);
    let mut host = InMemoryFrameBuffer::new(32, 32);
    tick_until(&mut s, &mut host, SessionState::BuildStage1);
    s.tick(&mut host);
    assert_eq!(s.state(), SessionState::Aborting);
    assert!(s.last_error().unwrap().contains("quantum"));
}

#[test]
fn engine_error_ends_in_complete_with_message() {
    let opts = ProceduralEngineOpts {
        fail_at_sample: Some(2),
        ..Default::default()
    };
    let mut s = session_with(opts, StaticSceneTranslator::demo(), small_config());
    let mut host = InMemoryFrameBuffer::new(32, 32);
    tick_until(&mut s, &mut host, SessionState::Complete);
    assert!(s.last_error().unwrap().contains("injected failure"));
}

#[test]
fn config_updates_apply_on_next_translation() {
    let mut s = session_with(
        ProceduralEngineOpts::default(),
        StaticSceneTranslator::demo(),
        small_config(),
    );
    let mut host = InMemoryFrameBuffer::new(32, 32);
    tick_until(&mut s, &mut host, SessionState::Complete);

    let mut next = small_config();
    next.samples = 3;
    s.update_config(next);
    assert_eq!(s.active_config().samples, 2);

    s.translator_mut().mark_changed();
    s.tick(&mut host);
    s.tick(&mut host);
    assert_eq!(s.active_config().samples, 3);
}
