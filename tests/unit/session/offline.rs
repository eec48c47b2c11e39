use super::*;
use crate::engine::procedural::{ProceduralEngine, ProceduralEngineOpts};
use crate::engine::progress::RenderJobProgress;
use crate::framebuffer::sink::InMemoryFrameBuffer;
use crate::session::host::{NullMonitor, StaticSceneTranslator};
use crate::stereo::layout::{AnaglyphMode, StereoLayout};

fn engine(opts: ProceduralEngineOpts) -> Arc<dyn RenderEngine> {
    Arc::new(ProceduralEngine::with_opts(opts))
}

fn config(width: u32, height: u32, stereo: StereoLayout) -> RenderConfig {
    RenderConfig {
        width,
        height,
        stereo,
        samples: 2,
        tile_size: 16,
        poll_interval_ms: 1,
        ..Default::default()
    }
}

#[derive(Default)]
struct CountingMonitor {
    polls: usize,
    cancel_after: Option<usize>,
    eyes: Vec<u32>,
}

impl RenderMonitor for CountingMonitor {
    fn is_cancelled(&self) -> bool {
        self.cancel_after.is_some_and(|n| self.polls >= n)
    }

    fn on_progress(&mut self, eye_index: u32, _progress: &RenderJobProgress) {
        self.polls += 1;
        if self.eyes.last() != Some(&eye_index) {
            self.eyes.push(eye_index);
        }
    }
}

#[test]
fn mono_frame_completes() {
    let mut job = OfflineRender::new(
        engine(ProceduralEngineOpts::default()),
        config(32, 32, StereoLayout::None),
    )
    .unwrap();
    job.translate(&mut StaticSceneTranslator::demo()).unwrap();
    let mut host = InMemoryFrameBuffer::new(32, 32);
    let outcome = job.run_frame(&mut host, &mut NullMonitor).unwrap();

    assert_eq!(outcome, FrameOutcome::Completed);
    let stats = job.stats();
    assert_eq!(stats.eyes_rendered, 1);
    assert_eq!(stats.final_pixels, 32 * 32);
    assert_eq!(stats.tiles_composited, 4 * 2);
    assert!(host.pixels().iter().all(|p| p.a == 1.0));
    assert!(!job.frame_was_cancelled());
}

#[test]
fn side_by_side_fills_both_halves() {
    let mut job = OfflineRender::new(
        engine(ProceduralEngineOpts::default()),
        config(64, 32, StereoLayout::SideBySide),
    )
    .unwrap();
    job.translate(&mut StaticSceneTranslator::demo()).unwrap();
    let mut host = InMemoryFrameBuffer::new(64, 32);
    let mut monitor = CountingMonitor::default();
    let outcome = job.run_frame(&mut host, &mut monitor).unwrap();

    assert_eq!(outcome, FrameOutcome::Completed);
    assert_eq!(job.stats().eyes_rendered, 2);
    assert_eq!(job.stats().final_pixels, 32 * 32);
    assert_eq!(monitor.eyes, vec![0, 1]);
    assert!(host.pixels().iter().all(|p| p.a == 1.0));
}

#[test]
fn anaglyph_renders_two_eyes_into_one_frame() {
    let mut job = OfflineRender::new(
        engine(ProceduralEngineOpts::default()),
        config(32, 32, StereoLayout::Anaglyph(AnaglyphMode::RedCyan)),
    )
    .unwrap();
    job.translate(&mut StaticSceneTranslator::demo()).unwrap();
    let mut host = InMemoryFrameBuffer::new(32, 32);
    let outcome = job.run_frame(&mut host, &mut NullMonitor).unwrap();
    assert_eq!(outcome, FrameOutcome::Completed);
    assert_eq!(job.stats().eyes_rendered, 2);
    assert_eq!(job.stats().final_pixels, 32 * 32);
}

#[test]
fn missing_camera_writes_error_frame() {
    let mut job = OfflineRender::new(
        engine(ProceduralEngineOpts::default()),
        config(8, 8, StereoLayout::None),
    )
    .unwrap();
    let mut translator = StaticSceneTranslator::demo().with_camera(None);
    let err = job.translate(&mut translator).unwrap_err();
    assert!(err.is_setup_failure());

    let mut host = InMemoryFrameBuffer::new(8, 8);
    let outcome = job.run_frame(&mut host, &mut NullMonitor).unwrap();
    assert!(matches!(outcome, FrameOutcome::Fallback(ref m) if m.contains("camera")));
    assert_eq!(job.stats().final_pixels, 64);
    assert!(host.pixels().iter().all(|p| *p == Rgba::ERROR_RED));
}

#[test]
fn untranslated_job_falls_back() {
    let mut job = OfflineRender::new(
        engine(ProceduralEngineOpts::default()),
        config(4, 4, StereoLayout::None),
    )
    .unwrap();
    let mut host = InMemoryFrameBuffer::new(4, 4);
    let outcome = job.run_frame(&mut host, &mut NullMonitor).unwrap();
    assert_eq!(outcome, FrameOutcome::Fallback("scene was not translated".to_string()));
}

#[test]
fn host_cancellation_stops_after_first_eye() {
    let opts = ProceduralEngineOpts {
        tile_delay: Duration::from_millis(5),
        ..Default::default()
    };
    let mut cfg = config(32, 32, StereoLayout::SideBySide);
    cfg.samples = 10_000;
    let mut job = OfflineRender::new(engine(opts), cfg).unwrap();
    job.translate(&mut StaticSceneTranslator::demo()).unwrap();

    let mut host = InMemoryFrameBuffer::new(32, 32);
    let mut monitor = CountingMonitor {
        cancel_after: Some(3),
        ..Default::default()
    };
    let outcome = job.run_frame(&mut host, &mut monitor).unwrap();
    assert_eq!(outcome, FrameOutcome::Cancelled);
    assert!(job.frame_was_cancelled());
    assert_eq!(job.stats().eyes_rendered, 1);
    assert!(!job.adapter().unwrap().is_session_running());
}

#[test]
fn engine_error_is_reported() {
    let opts = ProceduralEngineOpts {
        fail_at_sample: Some(2),
        ..Default::default()
    };
    let mut job = OfflineRender::new(engine(opts), config(16, 16, StereoLayout::None)).unwrap();
    job.translate(&mut StaticSceneTranslator::demo()).unwrap();
    let mut host = InMemoryFrameBuffer::new(16, 16);
    let outcome = job.run_frame(&mut host, &mut NullMonitor).unwrap();
    assert!(matches!(outcome, FrameOutcome::EngineError(ref m) if m.contains("injected failure")));
}

#[test]
fn render_frame_turns_device_failure_into_fallback() {
    let mut cfg = config(8, 8, StereoLayout::None);
    cfg.device = Some("nope".to_string());
    let mut host = InMemoryFrameBuffer::new(8, 8);
    let (outcome, stats) = render_frame(
        engine(ProceduralEngineOpts::default()),
        cfg,
        &mut StaticSceneTranslator::demo(),
        &mut host,
        &mut NullMonitor,
    )
    .unwrap();
    assert!(matches!(outcome, FrameOutcome::Fallback(ref m) if m.contains("nope")));
    assert_eq!(stats.final_pixels, 64);
}

#[test]
fn invalid_config_is_rejected_up_front() {
    let cfg = config(0, 8, StereoLayout::None);
    assert!(OfflineRender::new(engine(ProceduralEngineOpts::default()), cfg).is_err());
}
