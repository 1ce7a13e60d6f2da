//! Output formats and where the slide lands on the frame.

use crate::captions::CaptionStyle;

/// Target video shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoFormat {
    /// Vertical 9:16 short with a blurred backdrop and a 60 s cap.
    Shorts,
    /// Horizontal 16:9 video, slide fills the frame.
    Standard,
}

impl VideoFormat {
    pub fn spec(self) -> FormatSpec {
        match self {
            VideoFormat::Shorts => FormatSpec {
                width: 1080,
                height: 1920,
                fps: 30,
                max_duration: Some(60.0),
                blurred_background: true,
                blur_sigma: 50.0,
                foreground_margin: 200,
                caption: CaptionStyle::karaoke(55, 3, 1080 - 100, 1920 - 200),
            },
            VideoFormat::Standard => FormatSpec {
                width: 1280,
                height: 720,
                fps: 24,
                max_duration: None,
                blurred_background: false,
                blur_sigma: 0.0,
                foreground_margin: 0,
                caption: CaptionStyle::karaoke(40, 2, 1280 - 100, 720 - 100),
            },
        }
    }
}

impl std::fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VideoFormat::Shorts => write!(f, "shorts"),
            VideoFormat::Standard => write!(f, "standard"),
        }
    }
}

/// Fixed rendering constants for one [`VideoFormat`].
#[derive(Debug, Clone, PartialEq)]
pub struct FormatSpec {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Output is truncated to this many seconds when set.
    pub max_duration: Option<f64>,
    pub blurred_background: bool,
    pub blur_sigma: f32,
    /// Horizontal space left around the foreground slide (total, both sides).
    pub foreground_margin: u32,
    pub caption: CaptionStyle,
}

impl FormatSpec {
    /// Replace the runtime cap.
    pub fn with_max_duration(mut self, max_duration: Option<f64>) -> Self {
        self.max_duration = max_duration;
        self
    }

    /// Where a `src_width`×`src_height` slide image is drawn.
    ///
    /// With a blurred background the slide keeps its aspect ratio, spans the
    /// frame width minus the margin and is centered; it is shrunk further if
    /// it would be taller than the frame. Without one, it is stretched over
    /// the whole frame.
    pub fn foreground_placement(&self, src_width: u32, src_height: u32) -> Placement {
        if !self.blurred_background || src_width == 0 || src_height == 0 {
            return Placement {
                x: 0,
                y: 0,
                width: self.width,
                height: self.height,
            };
        }

        let target_width = self.width.saturating_sub(self.foreground_margin).max(1) as f64;
        let mut scale = target_width / src_width as f64;
        if src_height as f64 * scale > self.height as f64 {
            scale = self.height as f64 / src_height as f64;
        }

        let width = ((src_width as f64 * scale).round() as u32).clamp(1, self.width);
        let height = ((src_height as f64 * scale).round() as u32).clamp(1, self.height);
        Placement::centered(width, height, self.width, self.height)
    }
}

/// A rectangle on the output frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Placement {
    /// Center a `width`×`height` box on a `frame_width`×`frame_height` frame.
    pub fn centered(width: u32, height: u32, frame_width: u32, frame_height: u32) -> Self {
        Self {
            x: frame_width.saturating_sub(width) / 2,
            y: frame_height.saturating_sub(height) / 2,
            width,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorts_constants() {
        let spec = VideoFormat::Shorts.spec();
        assert_eq!((spec.width, spec.height, spec.fps), (1080, 1920, 30));
        assert_eq!(spec.max_duration, Some(60.0));
        assert_eq!(spec.caption.font_size, 55);
        assert_eq!(spec.caption.stroke_width, 3);
        assert_eq!(spec.caption.box_width, 980);
        assert_eq!(spec.caption.top, 1720);
    }

    #[test]
    fn test_standard_constants() {
        let spec = VideoFormat::Standard.spec();
        assert_eq!((spec.width, spec.height, spec.fps), (1280, 720, 24));
        assert_eq!(spec.max_duration, None);
        assert!(!spec.blurred_background);
        assert_eq!(spec.caption.font_size, 40);
        assert_eq!(spec.caption.top, 620);
    }

    #[test]
    fn test_shorts_foreground_spans_width_minus_margin() {
        let spec = VideoFormat::Shorts.spec();
        let p = spec.foreground_placement(1920, 1080);
        assert_eq!(p.width, 880);
        assert_eq!(p.height, 495);
        assert_eq!(p.x, 100);
        assert_eq!(p.y, (1920 - 495) / 2);
    }

    #[test]
    fn test_shorts_foreground_never_taller_than_frame() {
        let spec = VideoFormat::Shorts.spec();
        let p = spec.foreground_placement(100, 1000);
        assert_eq!(p.height, 1920);
        assert_eq!(p.width, 192);
        assert_eq!(p.y, 0);
    }

    #[test]
    fn test_standard_foreground_fills_frame() {
        let spec = VideoFormat::Standard.spec();
        let p = spec.foreground_placement(1024, 768);
        assert_eq!(
            p,
            Placement {
                x: 0,
                y: 0,
                width: 1280,
                height: 720
            }
        );
    }

    #[test]
    fn test_with_max_duration() {
        let spec = VideoFormat::Standard.spec().with_max_duration(Some(30.0));
        assert_eq!(spec.max_duration, Some(30.0));
        let spec = VideoFormat::Shorts.spec().with_max_duration(None);
        assert_eq!(spec.max_duration, None);
    }

    #[test]
    fn test_format_display() {
        assert_eq!(VideoFormat::Shorts.to_string(), "shorts");
        assert_eq!(VideoFormat::Standard.to_string(), "standard");
    }
}
