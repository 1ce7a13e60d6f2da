//! Per-slide clips and the concatenated timeline.

use std::path::PathBuf;

use crate::captions::CaptionEntry;
use crate::{Error, Result};

/// A slide frame shown for the length of its narration, with captions.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualClip {
    /// 1-based slide number.
    pub slide: usize,
    /// Composed still frame (background and foreground already merged).
    pub frame: PathBuf,
    pub audio: PathBuf,
    /// Captions, clamped to `[0, duration]`.
    pub captions: Vec<CaptionEntry>,
    /// Always the narration audio's duration.
    pub duration: f64,
    /// Set when at least one caption ran past the end of the audio.
    pub captions_truncated: bool,
}

impl VisualClip {
    /// Build a clip whose length is `audio_duration`, whatever the caption
    /// timings say. Captions outside the clip are cut.
    pub fn new(
        slide: usize,
        frame: impl Into<PathBuf>,
        audio: impl Into<PathBuf>,
        audio_duration: f64,
        captions: Vec<CaptionEntry>,
    ) -> Result<Self> {
        if !audio_duration.is_finite() || audio_duration <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "slide {} narration has no usable duration ({})",
                slide, audio_duration
            )));
        }

        let captions_truncated = captions.iter().any(|c| c.end > audio_duration);
        let captions = captions
            .iter()
            .filter_map(|c| c.clamped(audio_duration))
            .collect();

        Ok(Self {
            slide,
            frame: frame.into(),
            audio: audio.into(),
            captions,
            duration: audio_duration,
            captions_truncated,
        })
    }
}

/// Clips in slide order.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    pub clips: Vec<VisualClip>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, clip: VisualClip) {
        self.clips.push(clip);
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Sum of all clip durations.
    pub fn total_duration(&self) -> f64 {
        self.clips.iter().map(|c| c.duration).sum()
    }

    /// Length of the encoded output: the total, cut to `cap` when it is
    /// exceeded. Truncation always keeps the start.
    pub fn output_duration(&self, cap: Option<f64>) -> f64 {
        let total = self.total_duration();
        match cap {
            Some(cap) if total > cap => cap,
            _ => total,
        }
    }

    /// The cap to hand to the encoder, if the timeline exceeds it.
    pub fn trim_to(&self, cap: Option<f64>) -> Option<f64> {
        cap.filter(|&cap| self.total_duration() > cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(slide: usize, duration: f64) -> VisualClip {
        VisualClip::new(slide, "frame.png", "audio.mp3", duration, Vec::new()).unwrap()
    }

    #[test]
    fn test_clip_duration_is_audio_duration() {
        let captions = vec![
            CaptionEntry::new(0.0, 1.5, "first"),
            CaptionEntry::new(1.5, 3.0, "second"),
        ];
        let clip = VisualClip::new(1, "f.png", "a.mp3", 4.2, captions).unwrap();

        assert_eq!(clip.duration, 4.2);
        assert_eq!(clip.captions.len(), 2);
        assert!(!clip.captions_truncated);
        assert_eq!(clip.captions.last().unwrap().end, 3.0);
    }

    #[test]
    fn test_captions_past_audio_are_cut() {
        let captions = vec![
            CaptionEntry::new(0.0, 2.0, "kept"),
            CaptionEntry::new(2.0, 4.0, "cut short"),
            CaptionEntry::new(4.0, 5.0, "dropped"),
        ];
        let clip = VisualClip::new(2, "f.png", "a.mp3", 3.0, captions).unwrap();

        assert_eq!(clip.duration, 3.0);
        assert!(clip.captions_truncated);
        assert_eq!(
            clip.captions,
            vec![
                CaptionEntry::new(0.0, 2.0, "kept"),
                CaptionEntry::new(2.0, 3.0, "cut short"),
            ]
        );
    }

    #[test]
    fn test_clip_rejects_unusable_duration() {
        assert!(VisualClip::new(1, "f", "a", 0.0, Vec::new()).is_err());
        assert!(VisualClip::new(1, "f", "a", f64::NAN, Vec::new()).is_err());
    }

    #[test]
    fn test_timeline_truncated_to_cap() {
        let mut timeline = Timeline::new();
        timeline.push(clip(1, 30.0));
        timeline.push(clip(2, 25.0));
        timeline.push(clip(3, 20.0));

        assert_eq!(timeline.total_duration(), 75.0);
        assert_eq!(timeline.output_duration(Some(60.0)), 60.0);
        assert_eq!(timeline.trim_to(Some(60.0)), Some(60.0));
    }

    #[test]
    fn test_timeline_under_cap_is_untouched() {
        let mut timeline = Timeline::new();
        timeline.push(clip(1, 20.0));
        timeline.push(clip(2, 10.0));

        assert_eq!(timeline.output_duration(Some(60.0)), 30.0);
        assert_eq!(timeline.output_duration(None), 30.0);
        assert_eq!(timeline.trim_to(Some(60.0)), None);
        assert_eq!(timeline.trim_to(None), None);
    }
}
