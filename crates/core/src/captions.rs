//! Timed captions: SRT parsing and ASS rendering for burned-in subtitles.
//!
//! The speech backend writes SRT. The frame composer burns captions in with
//! libass, so entries are re-emitted as an ASS script carrying the fixed
//! caption style of the target format.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::narration::single_line;
use crate::{Error, Result};

/// `HH:MM:SS,mmm --> HH:MM:SS,mmm` (a `.` separator is accepted too).
static SRT_TIMING_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})\s*-->\s*(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})",
    )
    .unwrap()
});

/// One caption shown between `start` and `end` (seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionEntry {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

impl CaptionEntry {
    pub fn new(start: f64, end: f64, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Restrict the entry to `[0, limit]`. Returns `None` when nothing of it
    /// would be visible.
    pub fn clamped(&self, limit: f64) -> Option<CaptionEntry> {
        let start = self.start.max(0.0);
        let end = self.end.min(limit);
        if start >= limit || end <= start {
            return None;
        }
        Some(CaptionEntry::new(start, end, self.text.clone()))
    }
}

/// Read and parse an SRT file.
pub fn read_srt(path: &Path) -> Result<Vec<CaptionEntry>> {
    let content = std::fs::read_to_string(path)?;
    parse_srt(&content).map_err(|e| match e {
        Error::CaptionParseError(msg) => {
            Error::CaptionParseError(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })
}

/// Parse SRT content into caption entries.
///
/// Cue text is trimmed and its lines joined with single spaces. Cues whose
/// text is empty are skipped.
pub fn parse_srt(content: &str) -> Result<Vec<CaptionEntry>> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
    let mut entries = Vec::new();

    for (block_idx, block) in content.split("\n\n").enumerate() {
        let lines: Vec<&str> = block.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            continue;
        }

        let timing_idx = lines
            .iter()
            .position(|l| l.contains("-->"))
            .ok_or_else(|| {
                Error::CaptionParseError(format!("cue {} has no timing line", block_idx + 1))
            })?;

        let caps = SRT_TIMING_REGEX.captures(lines[timing_idx]).ok_or_else(|| {
            Error::CaptionParseError(format!(
                "malformed timing line '{}'",
                lines[timing_idx].trim()
            ))
        })?;

        let timestamp = |first: usize| {
            srt_seconds(&caps[first], &caps[first + 1], &caps[first + 2], &caps[first + 3])
                .ok_or_else(|| {
                    Error::CaptionParseError(format!(
                        "timestamp out of range in '{}'",
                        lines[timing_idx].trim()
                    ))
                })
        };
        let start = timestamp(1)?;
        let end = timestamp(5)?;

        if end < start {
            return Err(Error::CaptionParseError(format!(
                "cue {} ends before it starts",
                block_idx + 1
            )));
        }

        let text = single_line(&lines[timing_idx + 1..].join("\n"));
        if text.is_empty() {
            continue;
        }

        entries.push(CaptionEntry::new(start, end, text));
    }

    Ok(entries)
}

/// `None` when the timestamp does not fit in a `u64` of milliseconds.
fn srt_seconds(hours: &str, minutes: &str, seconds: &str, millis: &str) -> Option<f64> {
    let hours: u64 = hours.parse().ok()?;
    let minutes: u64 = minutes.parse().ok()?;
    let seconds: u64 = seconds.parse().ok()?;
    // "5" after the separator means 500 ms, not 5 ms.
    let millis: u64 = format!("{:0<3}", millis).parse().ok()?;

    let total_ms = hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(60)?
        .checked_add(seconds)?
        .checked_mul(1000)?
        .checked_add(millis)?;
    Some(total_ms as f64 / 1000.0)
}

/// Fixed caption look for one video format.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    pub font: String,
    pub font_size: u32,
    pub fill: [u8; 3],
    pub stroke: [u8; 3],
    pub stroke_width: u32,
    /// Width of the wrapping box, centered horizontally.
    pub box_width: u32,
    /// Distance from the top of the frame to the top of the caption.
    pub top: u32,
}

impl CaptionStyle {
    /// Yellow text with a black outline.
    pub fn karaoke(font_size: u32, stroke_width: u32, box_width: u32, top: u32) -> Self {
        Self {
            font: "DejaVu Sans".to_string(),
            font_size,
            fill: [0xFF, 0xFF, 0x00],
            stroke: [0x00, 0x00, 0x00],
            stroke_width,
            box_width,
            top,
        }
    }

}

/// Render entries as an ASS script for a `width`×`height` frame.
pub fn to_ass(entries: &[CaptionEntry], style: &CaptionStyle, width: u32, height: u32) -> String {
    let side_margin = width.saturating_sub(style.box_width) / 2;
    let mut out = String::new();

    out.push_str("[Script Info]\n");
    out.push_str("ScriptType: v4.00+\n");
    let _ = writeln!(out, "PlayResX: {}", width);
    let _ = writeln!(out, "PlayResY: {}", height);
    out.push_str("WrapStyle: 0\n");
    out.push_str("ScaledBorderAndShadow: yes\n\n");

    out.push_str("[V4+ Styles]\n");
    out.push_str(
        "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, \
         BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, \
         BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding\n",
    );
    let _ = writeln!(
        out,
        "Style: Caption,{font},{size},{fill},{fill},{stroke},&H00000000,0,0,0,0,100,100,0,0,1,{outline},0,8,{margin},{margin},0,1",
        font = style.font,
        size = style.font_size,
        fill = ass_color(style.fill),
        stroke = ass_color(style.stroke),
        outline = style.stroke_width,
        margin = side_margin,
    );
    out.push('\n');

    out.push_str("[Events]\n");
    out.push_str("Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text\n");
    for entry in entries {
        let _ = writeln!(
            out,
            "Dialogue: 0,{},{},Caption,,0,0,0,,{{\\pos({},{})}}{}",
            ass_time(entry.start),
            ass_time(entry.end),
            width / 2,
            style.top,
            ass_escape(&entry.text),
        );
    }

    out
}

/// ASS colours are `&HAABBGGRR`.
fn ass_color([r, g, b]: [u8; 3]) -> String {
    format!("&H00{:02X}{:02X}{:02X}", b, g, r)
}

/// ASS timestamps are `H:MM:SS.cc`.
fn ass_time(secs: f64) -> String {
    let total_cs = (secs.max(0.0) * 100.0).round() as u64;
    let hours = total_cs / 360_000;
    let minutes = (total_cs % 360_000) / 6_000;
    let seconds = (total_cs % 6_000) / 100;
    let centis = total_cs % 100;
    format!("{hours}:{minutes:02}:{seconds:02}.{centis:02}")
}

/// libass has no portable escape for braces or backslashes in dialogue text.
fn ass_escape(text: &str) -> String {
    text.replace('\\', "\u{FF3C}")
        .replace('{', "(")
        .replace('}', ")")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "1\n00:00:01,000 --> 00:00:02,500\nHello\nworld\n\n2\n00:00:02,500 --> 00:00:04,100\n  second cue  \n";

    #[test]
    fn test_parse_srt_times() {
        let entries = parse_srt(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].start, 1.0);
        assert_eq!(entries[0].end, 2.5);
        assert_eq!(entries[1].start, 2.5);
        assert!((entries[1].end - 4.1).abs() < 1e-9);
    }

    #[test]
    fn test_parse_srt_collapses_text() {
        let entries = parse_srt(SAMPLE).unwrap();
        assert_eq!(entries[0].text, "Hello world");
        assert_eq!(entries[1].text, "second cue");
    }

    #[test]
    fn test_parse_srt_handles_crlf_and_bom() {
        let content = "\u{feff}1\r\n00:01:00,250 --> 01:00:00,000\r\nLong one\r\n";
        let entries = parse_srt(content).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].start, 60.25);
        assert_eq!(entries[0].end, 3600.0);
    }

    #[test]
    fn test_parse_srt_skips_empty_cues() {
        let content = "1\n00:00:00,000 --> 00:00:01,000\n\n\n2\n00:00:01,000 --> 00:00:02,000\nkept\n";
        let entries = parse_srt(content).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].text, "kept");
    }

    #[test]
    fn test_parse_srt_rejects_bad_timing() {
        assert!(parse_srt("1\n00:00:01 --> 00:00:02\nbad\n").is_err());
        assert!(parse_srt("1\nno timing here\n").is_err());
        assert!(parse_srt("1\n00:00:03,000 --> 00:00:02,000\nbackwards\n").is_err());
    }

    #[test]
    fn test_parse_srt_rejects_huge_hours() {
        let content = "1\n18446744073709551615:00:00,000 --> 18446744073709551615:00:01,000\nx\n";
        assert!(matches!(parse_srt(content), Err(Error::CaptionParseError(_))));

        let content = "1\n99999999999999999999:00:00,000 --> 00:00:01,000\nx\n";
        assert!(matches!(parse_srt(content), Err(Error::CaptionParseError(_))));
    }

    #[test]
    fn test_parse_empty_file() {
        assert!(parse_srt("").unwrap().is_empty());
        assert!(parse_srt("\n\n").unwrap().is_empty());
    }

    #[test]
    fn test_short_millis_are_fractions() {
        let entries = parse_srt("1\n00:00:01.5 --> 00:00:02.25\nx\n").unwrap();
        assert_eq!(entries[0].start, 1.5);
        assert_eq!(entries[0].end, 2.25);
    }

    #[test]
    fn test_clamped() {
        let entry = CaptionEntry::new(1.0, 5.0, "x");
        assert_eq!(entry.clamped(3.0), Some(CaptionEntry::new(1.0, 3.0, "x")));
        assert_eq!(entry.clamped(10.0), Some(entry.clone()));
        assert_eq!(entry.clamped(1.0), None);
        assert_eq!(entry.clamped(0.5), None);
    }

    #[test]
    fn test_ass_time() {
        assert_eq!(ass_time(0.0), "0:00:00.00");
        assert_eq!(ass_time(2.5), "0:00:02.50");
        assert_eq!(ass_time(3661.234), "1:01:01.23");
    }

    #[test]
    fn test_ass_color_is_bgr() {
        assert_eq!(ass_color([0xFF, 0xFF, 0x00]), "&H0000FFFF");
        assert_eq!(ass_color([0x12, 0x34, 0x56]), "&H00563412");
    }

    #[test]
    fn test_to_ass_script() {
        let style = CaptionStyle::karaoke(55, 3, 980, 1720);
        let entries = vec![CaptionEntry::new(1.0, 2.5, "Hello {world}")];
        let script = to_ass(&entries, &style, 1080, 1920);

        assert!(script.contains("PlayResX: 1080\n"));
        assert!(script.contains("PlayResY: 1920\n"));
        assert!(script.contains("Style: Caption,DejaVu Sans,55,&H0000FFFF,&H0000FFFF,&H00000000,"));
        assert!(script.contains(",1,3,0,8,50,50,0,1\n"));
        assert!(script.contains(
            "Dialogue: 0,0:00:01.00,0:00:02.50,Caption,,0,0,0,,{\\pos(540,1720)}Hello (world)\n"
        ));
    }
}
