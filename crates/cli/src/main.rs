//! CLI tool for turning PowerPoint decks into narrated videos.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use slidecast_core::{Deck, FormatSpec, VideoFormat};
use slidecast_media::{
    EdgeTts, FfmpegEncoder, LibreOfficeRasterizer, Pipeline, PipelineOptions, DEFAULT_VOICE,
};
use std::path::{Path, PathBuf};

/// Turn a PowerPoint deck into a narrated video with burned-in captions.
#[derive(Parser, Debug)]
#[command(name = "slidecast")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input PowerPoint file (.pptx)
    input: PathBuf,

    /// Output video (default: input name with .mp4, next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Video layout
    #[arg(short, long, value_enum, default_value_t = FormatArg::Shorts)]
    format: FormatArg,

    /// Speech voice
    #[arg(long, default_value = DEFAULT_VOICE)]
    voice: String,

    /// Cap the output at this many seconds
    #[arg(long, conflicts_with = "no_cap")]
    max_duration: Option<f64>,

    /// Never trim the output
    #[arg(long)]
    no_cap: bool,

    /// Parent directory for the per-run work directory
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Keep intermediate files after the run
    #[arg(long)]
    keep_work: bool,

    /// Slide export resolution
    #[arg(long, default_value = "150")]
    dpi: u32,

    /// Print the narration for each slide instead of producing a video
    #[arg(short, long)]
    print_notes: bool,

    /// Print narration as JSON (with --print-notes)
    #[arg(long, requires = "print_notes")]
    json: bool,

    /// LibreOffice executable used to export slides
    #[arg(long, default_value = "soffice")]
    soffice: PathBuf,

    /// pdftoppm executable used to rasterize exported pages
    #[arg(long, default_value = "pdftoppm")]
    pdftoppm: PathBuf,

    /// edge-tts executable used for narration
    #[arg(long, default_value = "edge-tts")]
    edge_tts: PathBuf,

    /// ffmpeg executable
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: PathBuf,

    /// ffprobe executable
    #[arg(long, default_value = "ffprobe")]
    ffprobe: PathBuf,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    /// 1080x1920 vertical short, blurred backdrop, 60 s cap
    Shorts,
    /// 1280x720 horizontal video
    Standard,
}

impl From<FormatArg> for VideoFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Shorts => VideoFormat::Shorts,
            FormatArg::Standard => VideoFormat::Standard,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_filter = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if args.print_notes {
        let deck = slidecast_pptx::load_deck(&args.input)
            .with_context(|| format!("Failed to load {}", args.input.display()))?;
        print!("{}", render_notes(&deck, args.json)?);
        return Ok(());
    }

    let spec = format_spec(&args)?;
    let output = get_output_path(&args.input, args.output.as_deref());

    log::info!(
        "Rendering {} as a {} video ({}x{} @ {} fps)",
        args.input.display(),
        VideoFormat::from(args.format),
        spec.width,
        spec.height,
        spec.fps
    );

    let mut options = PipelineOptions::new(spec).with_keep_work(args.keep_work);
    if let Some(dir) = &args.work_dir {
        options = options.with_work_root(dir);
    }

    let pipeline = Pipeline::new(
        options,
        Box::new(
            LibreOfficeRasterizer::new()
                .with_soffice(&args.soffice)
                .with_pdftoppm(&args.pdftoppm)
                .with_dpi(args.dpi),
        ),
        Box::new(
            EdgeTts::new()
                .with_program(&args.edge_tts)
                .with_voice(&args.voice),
        ),
        Box::new(
            FfmpegEncoder::new()
                .with_ffmpeg(&args.ffmpeg)
                .with_ffprobe(&args.ffprobe),
        ),
    );

    let report = pipeline
        .run(&args.input, &output)
        .with_context(|| format!("Failed to render {}", args.input.display()))?;

    log::info!(
        "Done: {} slides, {:.2}s of narration, {:.2}s written to {}",
        report.slides,
        report.timeline_duration,
        report.output.duration,
        report.output_path.display()
    );
    if let Some(kept) = &report.kept_workspace {
        log::info!("Intermediates: {}", kept.display());
    }

    Ok(())
}

/// Format constants with the runtime cap overrides applied.
fn format_spec(args: &Args) -> Result<FormatSpec> {
    let spec = VideoFormat::from(args.format).spec();
    if args.no_cap {
        return Ok(spec.with_max_duration(None));
    }
    match args.max_duration {
        Some(secs) if !(secs.is_finite() && secs > 0.0) => {
            anyhow::bail!("--max-duration must be a positive number of seconds, got {}", secs)
        }
        Some(secs) => Ok(spec.with_max_duration(Some(secs))),
        None => Ok(spec),
    }
}

/// Narration per slide, as plain text or the serialized deck.
fn render_notes(deck: &Deck, json: bool) -> Result<String> {
    if json {
        let mut out = serde_json::to_string_pretty(deck).context("Failed to encode notes")?;
        out.push('\n');
        return Ok(out);
    }

    let mut out = String::new();
    for slide in &deck.slides {
        out.push_str(&format!("[{}] {}\n", slide.number, slide.narration));
    }
    Ok(out)
}

/// Determine the output path for a rendered deck.
fn get_output_path(input_path: &Path, output: Option<&Path>) -> PathBuf {
    if let Some(path) = output {
        return path.to_path_buf();
    }

    let stem = input_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("output");
    let output_filename = format!("{}.mp4", stem);

    match input_path.parent() {
        Some(parent) => parent.join(output_filename),
        None => PathBuf::from(output_filename),
    }
}
