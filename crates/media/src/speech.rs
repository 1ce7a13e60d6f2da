//! Narration audio with timed captions.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use slidecast_core::{Error, Result};

use crate::process::run;

/// Voice used when none is configured.
pub const DEFAULT_VOICE: &str = "en-GB-SoniaNeural";

/// Turns narration text into an audio file plus an SRT caption file.
pub trait SpeechSynthesizer {
    /// Speak `text` into `audio`, writing caption timings to `captions`.
    /// Blocks until both files are written.
    fn synthesize(&self, text: &str, audio: &Path, captions: &Path) -> Result<()>;

    /// Backend name, for logs.
    fn name(&self) -> &str;
}

/// The `edge-tts` command-line client.
#[derive(Debug, Clone)]
pub struct EdgeTts {
    program: PathBuf,
    voice: String,
}

impl Default for EdgeTts {
    fn default() -> Self {
        Self {
            program: PathBuf::from("edge-tts"),
            voice: DEFAULT_VOICE.to_string(),
        }
    }
}

impl EdgeTts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = voice.into();
        self
    }

    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    fn args(&self, text: &str, audio: &Path, captions: &Path) -> Vec<OsString> {
        vec![
            "--voice".into(),
            self.voice.clone().into(),
            // One argument, so text starting with '-' is not read as a flag.
            format!("--text={}", text).into(),
            "--write-media".into(),
            audio.into(),
            "--write-subtitles".into(),
            captions.into(),
        ]
    }
}

impl SpeechSynthesizer for EdgeTts {
    fn synthesize(&self, text: &str, audio: &Path, captions: &Path) -> Result<()> {
        if text.trim().is_empty() {
            return Err(Error::InvalidInput("narration text is empty".to_string()));
        }

        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(text, audio, captions));
        run(&mut cmd)?;
        Ok(())
    }

    fn name(&self) -> &str {
        "edge-tts"
    }
}
