//! Joining slide clips into the final video.

use std::path::{Path, PathBuf};

use slidecast_core::{Error, FormatSpec, Result, Timeline};

use crate::encode::{VideoEncoder, VideoInfo};

/// Concatenates encoded slide clips, applies the runtime cap and checks the
/// result.
#[derive(Debug, Clone)]
pub struct VideoAssembler {
    spec: FormatSpec,
}

impl VideoAssembler {
    pub fn new(spec: FormatSpec) -> Self {
        Self { spec }
    }

    /// Encode `clip_files` (one per timeline clip, same order) into `output`.
    ///
    /// When the timeline is longer than the format's cap the output keeps
    /// the first `cap` seconds. Returns the probed output properties.
    pub fn assemble(
        &self,
        timeline: &Timeline,
        clip_files: &[PathBuf],
        encoder: &dyn VideoEncoder,
        output: &Path,
    ) -> Result<VideoInfo> {
        if timeline.is_empty() {
            return Err(Error::InvalidInput("deck produced no clips".to_string()));
        }
        if clip_files.len() != timeline.len() {
            return Err(Error::InvalidInput(format!(
                "{} clip files for {} timeline clips",
                clip_files.len(),
                timeline.len()
            )));
        }

        let total = timeline.total_duration();
        let trim = timeline.trim_to(self.spec.max_duration);
        if trim.is_some() {
            log::info!(
                "Timeline is {:.2}s, trimming to {:.2}s",
                total,
                timeline.output_duration(self.spec.max_duration)
            );
        } else {
            log::info!("Timeline is {:.2}s", total);
        }

        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        encoder.concat(clip_files, &self.spec, trim, output)?;

        let info = encoder.probe(output)?;
        log::info!(
            "Video saved to {} ({}x{}, {:.2}s)",
            output.display(),
            info.width.map(|w| w.to_string()).unwrap_or_else(|| "?".to_string()),
            info.height.map(|h| h.to_string()).unwrap_or_else(|| "?".to_string()),
            info.duration
        );
        if (info.width, info.height) != (Some(self.spec.width), Some(self.spec.height)) {
            log::warn!(
                "Expected {}x{} output, encoder produced {:?}x{:?}",
                self.spec.width,
                self.spec.height,
                info.width,
                info.height
            );
        }

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slidecast_core::{VideoFormat, VisualClip};
    use std::cell::RefCell;

    /// Records concat calls and reports the requested duration back.
    #[derive(Default)]
    struct RecordingEncoder {
        concats: RefCell<Vec<(Vec<PathBuf>, Option<f64>)>>,
    }

    impl VideoEncoder for RecordingEncoder {
        fn media_duration(&self, _path: &Path) -> Result<f64> {
            unreachable!("assembler never probes audio")
        }

        fn render_clip(
            &self,
            _clip: &VisualClip,
            _styled_captions: Option<&Path>,
            _spec: &FormatSpec,
            _out: &Path,
        ) -> Result<()> {
            unreachable!("assembler never renders clips")
        }

        fn concat(
            &self,
            clips: &[PathBuf],
            _spec: &FormatSpec,
            duration: Option<f64>,
            _out: &Path,
        ) -> Result<()> {
            self.concats.borrow_mut().push((clips.to_vec(), duration));
            Ok(())
        }

        fn probe(&self, _path: &Path) -> Result<VideoInfo> {
            let total = self.concats.borrow().last().and_then(|c| c.1).unwrap_or(75.0);
            Ok(VideoInfo {
                width: Some(1080),
                height: Some(1920),
                duration: total,
            })
        }
    }

    fn timeline(durations: &[f64]) -> (Timeline, Vec<PathBuf>) {
        let mut timeline = Timeline::new();
        let mut files = Vec::new();
        for (i, d) in durations.iter().enumerate() {
            timeline.push(VisualClip::new(i + 1, "f.png", "a.mp3", *d, Vec::new()).unwrap());
            files.push(PathBuf::from(format!("clip_{}.mp4", i + 1)));
        }
        (timeline, files)
    }

    #[test]
    fn test_long_timeline_is_cut_to_cap() {
        let dir = tempfile::TempDir::new().unwrap();
        let (timeline, files) = timeline(&[30.0, 25.0, 20.0]);
        let encoder = RecordingEncoder::default();

        let info = VideoAssembler::new(VideoFormat::Shorts.spec())
            .assemble(&timeline, &files, &encoder, &dir.path().join("out.mp4"))
            .unwrap();

        let concats = encoder.concats.borrow();
        assert_eq!(concats.len(), 1);
        assert_eq!(concats[0].0, files);
        assert_eq!(concats[0].1, Some(60.0));
        assert_eq!(info.duration, 60.0);
    }

    #[test]
    fn test_uncapped_format_keeps_everything() {
        let dir = tempfile::TempDir::new().unwrap();
        let (timeline, files) = timeline(&[30.0, 25.0, 20.0]);
        let encoder = RecordingEncoder::default();

        VideoAssembler::new(VideoFormat::Standard.spec())
            .assemble(&timeline, &files, &encoder, &dir.path().join("nested/out.mp4"))
            .unwrap();

        assert_eq!(encoder.concats.borrow()[0].1, None);
        assert!(dir.path().join("nested").is_dir());
    }

    #[test]
    fn test_rejects_empty_or_mismatched_input() {
        let encoder = RecordingEncoder::default();
        let assembler = VideoAssembler::new(VideoFormat::Shorts.spec());

        let err = assembler
            .assemble(&Timeline::new(), &[], &encoder, Path::new("out.mp4"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let (timeline, _) = timeline(&[1.0, 2.0]);
        let err = assembler
            .assemble(&timeline, &[PathBuf::from("clip_1.mp4")], &encoder, Path::new("out.mp4"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(encoder.concats.borrow().is_empty());
    }
}
