//! Per-slide frame composition and clip construction.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage};
use slidecast_core::captions::{read_srt, to_ass};
use slidecast_core::{Error, FormatSpec, Result, SlideFiles, VisualClip};

use crate::encode::VideoEncoder;

/// Lays slides out on the output frame and turns them into timed clips.
#[derive(Debug, Clone)]
pub struct FrameComposer {
    spec: FormatSpec,
}

impl FrameComposer {
    pub fn new(spec: FormatSpec) -> Self {
        Self { spec }
    }

    /// The still frame for one slide.
    ///
    /// Vertical formats get the slide cropped to fill and blurred as a
    /// backdrop, with the slide itself centered on top. Otherwise the slide
    /// is resized onto the whole frame.
    pub fn build_frame(&self, slide: &DynamicImage) -> RgbImage {
        let (width, height) = (self.spec.width, self.spec.height);

        let mut canvas = if self.spec.blurred_background {
            slide
                .resize_to_fill(width, height, FilterType::Triangle)
                .fast_blur(self.spec.blur_sigma)
                .to_rgb8()
        } else {
            RgbImage::new(width, height)
        };

        let placement = self.spec.foreground_placement(slide.width(), slide.height());
        let foreground = slide
            .resize_exact(placement.width, placement.height, FilterType::Lanczos3)
            .to_rgb8();
        imageops::overlay(
            &mut canvas,
            &foreground,
            i64::from(placement.x),
            i64::from(placement.y),
        );

        canvas
    }

    /// Compose the frame for the slide image at `slide_image` and save it
    /// to `out`.
    pub fn compose_frame(&self, slide_image: &Path, out: &Path) -> Result<()> {
        let slide = image::open(slide_image)
            .map_err(|e| Error::ImageError(format!("{}: {}", slide_image.display(), e)))?;
        let frame = self.build_frame(&slide);
        frame
            .save(out)
            .map_err(|e| Error::ImageError(format!("{}: {}", out.display(), e)))?;
        Ok(())
    }

    /// Build the clip for one slide from its composed frame, narration audio
    /// and SRT captions. The clip lasts exactly `audio_duration` seconds.
    /// Writes the styled caption script next to the other intermediates.
    pub fn build_clip(
        &self,
        slide: usize,
        files: &SlideFiles,
        audio_duration: f64,
    ) -> Result<VisualClip> {
        let captions = read_srt(&files.captions)?;
        let clip = VisualClip::new(slide, &files.frame, &files.audio, audio_duration, captions)?;

        if clip.captions_truncated {
            log::warn!(
                "Slide {}: captions run past the {:.2}s narration and were cut",
                slide,
                clip.duration
            );
        }

        if !clip.captions.is_empty() {
            let script = to_ass(
                &clip.captions,
                &self.spec.caption,
                self.spec.width,
                self.spec.height,
            );
            std::fs::write(&files.styled_captions, script)?;
        }

        Ok(clip)
    }

    /// Compose, build and encode the clip for one slide.
    pub fn render(
        &self,
        slide: usize,
        files: &SlideFiles,
        encoder: &dyn VideoEncoder,
    ) -> Result<VisualClip> {
        self.compose_frame(&files.image, &files.frame)?;
        let audio_duration = encoder.media_duration(&files.audio)?;
        let clip = self.build_clip(slide, files, audio_duration)?;

        let captions = (!clip.captions.is_empty()).then_some(files.styled_captions.as_path());
        encoder.render_clip(&clip, captions, &self.spec, &files.clip)?;

        log::info!(
            "Slide {}: {:.2}s clip, {} captions",
            slide,
            clip.duration,
            clip.captions.len()
        );
        Ok(clip)
    }
}
