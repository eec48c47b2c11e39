use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracebridge::framebuffer::sink::InMemoryPassSink;
use tracebridge::{
    Backplate, InMemoryFrameBuffer, InteractiveSession, NullMonitor, ProceduralEngine,
    ProceduralEngineOpts, RenderConfig, RenderEngine, Rgba, SessionState,
    StaticSceneTranslator, StereoLayout,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tracebridge", version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` applies otherwise.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one offline frame of the demo scene as a PNG.
    Render(RenderArgs),
    /// Drive the interactive viewport session and write the last host image.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct JobArgs {
    /// Render config JSON; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output width in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Output height in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Samples per pixel.
    #[arg(long)]
    samples: Option<u32>,

    /// Render device name.
    #[arg(long)]
    device: Option<String>,

    /// Backplate image composited behind the render.
    #[arg(long)]
    backplate: Option<PathBuf>,

    /// Engine worker threads.
    #[arg(long)]
    threads: Option<usize>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Stereo layout (none, left, right, anaglyph-red-cyan, side-by-side, top-bottom, ...).
    #[arg(long)]
    stereo: Option<StereoLayout>,

    /// Swap the left and right cameras.
    #[arg(long, default_value_t = false)]
    swap_eyes: bool,

    /// Write every auxiliary pass as `<dir>/<pass>.png`.
    #[arg(long)]
    dump_passes: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[command(flatten)]
    job: JobArgs,

    /// Maximum number of update ticks.
    #[arg(long, default_value_t = 10_000)]
    ticks: u32,

    /// Delay between ticks, in milliseconds.
    #[arg(long, default_value_t = 5)]
    tick_ms: u64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(job: &JobArgs) -> anyhow::Result<RenderConfig> {
    let mut cfg = match &job.config {
        Some(path) => RenderConfig::load(path)?,
        None => RenderConfig::default(),
    };
    if let Some(w) = job.width {
        cfg.width = w;
    }
    if let Some(h) = job.height {
        cfg.height = h;
    }
    if let Some(s) = job.samples {
        cfg.samples = s;
    }
    if job.device.is_some() {
        cfg.device = job.device.clone();
    }
    if job.backplate.is_some() {
        cfg.backplate = job.backplate.clone();
    }
    Ok(cfg)
}

fn engine_for(job: &JobArgs) -> Arc<dyn RenderEngine> {
    let mut opts = ProceduralEngineOpts::default();
    if let Some(threads) = job.threads {
        for device in &mut opts.devices {
            device.threads = threads;
        }
    }
    Arc::new(ProceduralEngine::with_opts(opts))
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.job)?;
    if let Some(stereo) = args.stereo {
        cfg.stereo = stereo;
    }
    cfg.swap_eyes |= args.swap_eyes;
    cfg.validate()?;

    let mut host = InMemoryFrameBuffer::new(cfg.width, cfg.height);
    let pass_names: Vec<String> = cfg
        .passes
        .iter()
        .map(|p| p.sink.clone().unwrap_or_else(|| p.name.clone()))
        .collect();
    for name in &pass_names {
        host = host.with_pass_sink(name.clone());
    }

    let engine = engine_for(&args.job);
    let mut translator = StaticSceneTranslator::demo();
    let (outcome, stats) = tracebridge::render_frame(
        engine,
        cfg,
        &mut translator,
        &mut host,
        &mut NullMonitor,
    )?;
    tracing::info!(?outcome, ?stats, "render finished");

    write_png(&host, &args.out)?;
    if let Some(dir) = &args.dump_passes {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create pass dir '{}'", dir.display()))?;
        for name in &pass_names {
            if let Some(pass) = host.pass(name) {
                let path = dir.join(format!("{name}.png"));
                write_pass_png(pass, &path)?;
                eprintln!("wrote {}", path.display());
            }
        }
    }

    eprintln!("wrote {} ({outcome:?}, {:.2?})", args.out.display(), stats.elapsed);
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(&args.job)?;
    cfg.stereo = StereoLayout::None;
    cfg.validate()?;
    // Fail early on an unreadable backplate instead of silently dropping it.
    if let Some(path) = &cfg.backplate {
        Backplate::load(path)?;
    }

    let mut host = InMemoryFrameBuffer::new(cfg.width, cfg.height);
    let mut session =
        InteractiveSession::new(engine_for(&args.job), StaticSceneTranslator::demo(), cfg);
    let mut ticks = 0;
    while ticks < args.ticks {
        ticks += 1;
        if session.tick(&mut host) {
            break;
        }
        std::thread::sleep(Duration::from_millis(args.tick_ms));
    }
    if let Some(err) = session.last_error() {
        anyhow::bail!("preview failed: {err}");
    }
    if session.state() != SessionState::Complete {
        eprintln!("stopped after {ticks} ticks in {:?}", session.state());
    }

    write_png(&host, &args.out)?;
    eprintln!("wrote {} ({} copies)", args.out.display(), session.copies());
    Ok(())
}

fn write_png(host: &InMemoryFrameBuffer, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    host.save_png(out)?;
    Ok(())
}

fn write_pass_png(pass: &InMemoryPassSink, out: &Path) -> anyhow::Result<()> {
    let size = pass.size();
    let data = pass.data();
    let bytes: Vec<u8> = match pass.channels() {
        1 => {
            let max = data
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .fold(0.0f32, f32::max)
                .max(f32::EPSILON);
            data.iter()
                .flat_map(|v| {
                    let g = ((v / max).clamp(0.0, 1.0) * 255.0).round() as u8;
                    [g, g, g, 255]
                })
                .collect()
        }
        _ => data
            .chunks_exact(4)
            .flat_map(|px| Rgba::from_slice(px).to_rgba8())
            .collect(),
    };
    image::save_buffer_with_format(
        out,
        &bytes,
        size.x as u32,
        size.y as u32,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))?;
    Ok(())
}
