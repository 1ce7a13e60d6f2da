//! Deck-to-video driver: load, rasterize, then per slide synthesize and
//! compose, then assemble and clean up.

use std::path::{Path, PathBuf};

use slidecast_core::{Deck, Error, FormatSpec, Result, Timeline, Workspace};
use slidecast_pptx::load_deck;

use crate::assemble::VideoAssembler;
use crate::compose::FrameComposer;
use crate::encode::{VideoEncoder, VideoInfo};
use crate::rasterize::SlideRasterizer;
use crate::speech::SpeechSynthesizer;

/// Run-level settings.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    spec: FormatSpec,
    work_root: Option<PathBuf>,
    keep_work: bool,
}

impl PipelineOptions {
    pub fn new(spec: FormatSpec) -> Self {
        Self {
            spec,
            work_root: None,
            keep_work: false,
        }
    }

    /// Create the run workspace under `dir` instead of the system temp dir.
    pub fn with_work_root(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_root = Some(dir.into());
        self
    }

    /// Leave intermediates on disk after the run.
    pub fn with_keep_work(mut self, keep: bool) -> Self {
        self.keep_work = keep;
        self
    }
}

/// What a successful run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub slides: usize,
    /// Sum of all clip durations before any cap.
    pub timeline_duration: f64,
    pub output_path: PathBuf,
    pub output: VideoInfo,
    /// Workspace left on disk when intermediates were kept.
    pub kept_workspace: Option<PathBuf>,
}

/// Sequential deck-to-video pipeline over pluggable backends.
pub struct Pipeline {
    options: PipelineOptions,
    rasterizer: Box<dyn SlideRasterizer>,
    synthesizer: Box<dyn SpeechSynthesizer>,
    encoder: Box<dyn VideoEncoder>,
}

impl Pipeline {
    pub fn new(
        options: PipelineOptions,
        rasterizer: Box<dyn SlideRasterizer>,
        synthesizer: Box<dyn SpeechSynthesizer>,
        encoder: Box<dyn VideoEncoder>,
    ) -> Self {
        Self {
            options,
            rasterizer,
            synthesizer,
            encoder,
        }
    }

    /// Load the deck at `deck_path` and turn it into a video at `output`.
    pub fn run(&self, deck_path: &Path, output: &Path) -> Result<RunReport> {
        let deck = load_deck(deck_path)?;
        log::info!("Loaded {} with {} slides", deck.filename, deck.len());
        self.run_deck(&deck, deck_path, output)
    }

    /// Produce the video for an already loaded `deck` whose source file is
    /// `deck_path`.
    ///
    /// All intermediates live in a fresh workspace that is removed whether
    /// the run succeeds or fails, unless intermediates are kept.
    pub fn run_deck(&self, deck: &Deck, deck_path: &Path, output: &Path) -> Result<RunReport> {
        if deck.is_empty() {
            return Err(Error::InvalidInput(format!("{} has no slides", deck.filename)));
        }

        let mut workspace = Workspace::create(self.options.work_root.as_deref())?;
        let result = self.produce(deck, deck_path, output, &mut workspace);

        let kept = if self.options.keep_work {
            let path = workspace.keep();
            log::info!("Intermediate files kept in {}", path.display());
            Some(path)
        } else {
            if result.is_ok() {
                workspace.cleanup();
            }
            None
        };

        let (timeline_duration, info) = result?;
        Ok(RunReport {
            slides: deck.len(),
            timeline_duration,
            output_path: output.to_path_buf(),
            output: info,
            kept_workspace: kept,
        })
    }

    fn produce(
        &self,
        deck: &Deck,
        deck_path: &Path,
        output: &Path,
        workspace: &mut Workspace,
    ) -> Result<(f64, VideoInfo)> {
        let spec = &self.options.spec;
        let encoder = self.encoder.as_ref();

        log::info!("Rasterizing slides with {}", self.rasterizer.name());
        let images = self
            .rasterizer
            .rasterize(deck_path, &workspace.slides_dir(), deck.len())?;
        if images.len() != deck.len() {
            return Err(Error::InvalidInput(format!(
                "rasterizer produced {} images for {} slides",
                images.len(),
                deck.len()
            )));
        }

        let composer = FrameComposer::new(spec.clone());
        let mut timeline = Timeline::new();
        let mut clip_files = Vec::with_capacity(deck.len());

        for slide in &deck.slides {
            let files = workspace.slide_files(slide.number);
            if !files.image.is_file() {
                return Err(Error::InvalidInput(format!(
                    "slide {} image {} was not exported",
                    slide.number,
                    files.image.display()
                )));
            }

            log::info!(
                "Slide {}/{}: synthesizing narration with {}",
                slide.number,
                deck.len(),
                self.synthesizer.name()
            );
            self.synthesizer
                .synthesize(&slide.narration, &files.audio, &files.captions)?;

            let clip = composer.render(slide.number, &files, encoder)?;
            timeline.push(clip);
            clip_files.push(files.clip);
        }

        let info = VideoAssembler::new(spec.clone()).assemble(
            &timeline,
            &clip_files,
            encoder,
            output,
        )?;

        Ok((timeline.total_duration(), info))
    }
}
