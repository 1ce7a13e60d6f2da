//! ffmpeg / ffprobe invocation.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use slidecast_core::{Error, FormatSpec, Result, VisualClip};

use crate::process::run;

/// Sample rate every clip's audio is resampled to before concatenation.
const AUDIO_SAMPLE_RATE: u32 = 44_100;

/// Probed properties of a media file.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Container duration in seconds.
    pub duration: f64,
}

/// Encoding and probing operations the pipeline needs.
pub trait VideoEncoder {
    /// Duration of an audio (or any media) file in seconds.
    fn media_duration(&self, path: &Path) -> Result<f64>;

    /// Encode one slide clip: the still frame for `clip.duration` seconds,
    /// the narration audio, and `styled_captions` burned in when present.
    fn render_clip(
        &self,
        clip: &VisualClip,
        styled_captions: Option<&Path>,
        spec: &FormatSpec,
        out: &Path,
    ) -> Result<()>;

    /// Concatenate `clips` in order into `out`, cut to `duration` seconds
    /// when given.
    fn concat(
        &self,
        clips: &[PathBuf],
        spec: &FormatSpec,
        duration: Option<f64>,
        out: &Path,
    ) -> Result<()>;

    /// Resolution and duration of an encoded video.
    fn probe(&self, path: &Path) -> Result<VideoInfo>;
}

/// [`VideoEncoder`] backed by the system `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegEncoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self {
            ffmpeg: PathBuf::from("ffmpeg"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ffmpeg(mut self, program: impl Into<PathBuf>) -> Self {
        self.ffmpeg = program.into();
        self
    }

    pub fn with_ffprobe(mut self, program: impl Into<PathBuf>) -> Self {
        self.ffprobe = program.into();
        self
    }
}

impl VideoEncoder for FfmpegEncoder {
    fn media_duration(&self, path: &Path) -> Result<f64> {
        self.probe(path).map(|info| info.duration)
    }

    fn render_clip(
        &self,
        clip: &VisualClip,
        styled_captions: Option<&Path>,
        spec: &FormatSpec,
        out: &Path,
    ) -> Result<()> {
        let mut cmd = Command::new(&self.ffmpeg);

        // The subtitles filter takes a bare file name, so ffmpeg runs next to
        // the caption script instead of escaping a full path into the graph.
        let captions_name = match styled_captions {
            Some(path) => {
                if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
                    cmd.current_dir(dir);
                }
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| {
                        Error::InvalidInput(format!("bad caption path {}", path.display()))
                    })?;
                Some(name.to_string())
            }
            None => None,
        };

        cmd.args(clip_args(clip, captions_name.as_deref(), spec, out));
        run(&mut cmd)?;
        Ok(())
    }

    fn concat(
        &self,
        clips: &[PathBuf],
        spec: &FormatSpec,
        duration: Option<f64>,
        out: &Path,
    ) -> Result<()> {
        if clips.is_empty() {
            return Err(Error::InvalidInput("no clips to concatenate".to_string()));
        }
        let mut cmd = Command::new(&self.ffmpeg);
        cmd.args(concat_args(clips, spec, duration, out));
        run(&mut cmd)?;
        Ok(())
    }

    fn probe(&self, path: &Path) -> Result<VideoInfo> {
        let mut cmd = Command::new(&self.ffprobe);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration:stream=codec_type,width,height",
            "-of",
            "json",
        ])
        .arg(path);
        let output = run(&mut cmd)?;
        parse_probe(&String::from_utf8_lossy(&output.stdout))
            .map_err(|e| Error::ProbeError(format!("{}: {}", path.display(), e)))
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

/// Interpret `ffprobe -of json` output.
fn parse_probe(json: &str) -> Result<VideoInfo> {
    let parsed: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| Error::ProbeError(format!("invalid ffprobe output: {}", e)))?;

    let duration = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.trim().parse::<f64>().ok())
        .filter(|d| d.is_finite())
        .ok_or_else(|| Error::ProbeError("no duration reported".to_string()))?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"));

    Ok(VideoInfo {
        width: video.and_then(|s| s.width),
        height: video.and_then(|s| s.height),
        duration,
    })
}

/// Fixed output codecs.
fn codec_args() -> Vec<OsString> {
    [
        "-c:v",
        "libx264",
        "-preset",
        "medium",
        "-pix_fmt",
        "yuv420p",
        "-c:a",
        "aac",
        "-b:a",
        "192k",
        "-movflags",
        "+faststart",
    ]
    .into_iter()
    .map(OsString::from)
    .collect()
}

fn clip_args(
    clip: &VisualClip,
    captions_name: Option<&str>,
    spec: &FormatSpec,
    out: &Path,
) -> Vec<OsString> {
    let fps = spec.fps.to_string();
    let mut args: Vec<OsString> = vec![
        "-y".into(),
        "-loglevel".into(),
        "error".into(),
        "-loop".into(),
        "1".into(),
        "-framerate".into(),
        fps.clone().into(),
        "-i".into(),
        clip.frame.clone().into(),
        "-i".into(),
        clip.audio.clone().into(),
    ];
    if let Some(name) = captions_name {
        args.push("-vf".into());
        args.push(format!("subtitles={}", name).into());
    }
    args.extend(
        [
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-t".to_string(),
            format!("{:.3}", clip.duration),
            "-r".to_string(),
            fps,
        ]
        .into_iter()
        .map(OsString::from),
    );
    args.extend(codec_args());
    args.push(out.into());
    args
}

/// Filter graph that normalizes every input to the canvas, frame rate and
/// audio format, then joins them with the `concat` filter.
fn concat_filter(count: usize, spec: &FormatSpec) -> String {
    let (w, h) = (spec.width, spec.height);
    let mut graph = String::new();
    let mut joined = String::new();

    for i in 0..count {
        graph.push_str(&format!(
            "[{i}:v]scale={w}:{h}:force_original_aspect_ratio=decrease,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,setsar=1,fps={fps},format=yuv420p[v{i}];",
            fps = spec.fps,
        ));
        graph.push_str(&format!(
            "[{i}:a]aresample={AUDIO_SAMPLE_RATE},aformat=channel_layouts=stereo[a{i}];"
        ));
        joined.push_str(&format!("[v{i}][a{i}]"));
    }

    graph.push_str(&format!("{joined}concat=n={count}:v=1:a=1[vout][aout]"));
    graph
}

fn concat_args(
    clips: &[PathBuf],
    spec: &FormatSpec,
    duration: Option<f64>,
    out: &Path,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-y".into(), "-loglevel".into(), "error".into()];
    for clip in clips {
        args.push("-i".into());
        args.push(clip.into());
    }
    args.push("-filter_complex".into());
    args.push(concat_filter(clips.len(), spec).into());
    for map in ["-map", "[vout]", "-map", "[aout]"] {
        args.push(map.into());
    }
    if let Some(duration) = duration {
        args.push("-t".into());
        args.push(format!("{:.3}", duration).into());
    }
    args.push("-r".into());
    args.push(spec.fps.to_string().into());
    args.extend(codec_args());
    args.push(out.into());
    args
}
