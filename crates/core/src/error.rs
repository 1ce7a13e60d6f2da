//! Error types for deck loading and video production.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while turning a deck into a video.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to parse the PPTX file structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Malformed timed-caption file.
    #[error("Caption parsing error: {0}")]
    CaptionParseError(String),

    /// Failed to decode, transform or encode an image.
    #[error("Image error: {0}")]
    ImageError(String),

    /// A required external program is not installed or not on PATH.
    #[error("Required tool '{0}' was not found on PATH")]
    ToolNotFound(String),

    /// An external program ran but exited unsuccessfully.
    #[error("{program} exited with status {status}: {stderr}")]
    ProcessError {
        program: String,
        status: String,
        stderr: String,
    },

    /// Media probing returned something we could not interpret.
    #[error("Media probe error: {0}")]
    ProbeError(String),

    /// Caller supplied an unusable value.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Build a [`Error::ProcessError`] from a finished command.
    pub fn process(
        program: impl Into<String>,
        status: std::process::ExitStatus,
        stderr: &[u8],
    ) -> Self {
        Error::ProcessError {
            program: program.into(),
            status: status.to_string(),
            stderr: String::from_utf8_lossy(stderr).trim().to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert!(matches!(err, Error::IoError(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_process_error_message() {
        let err = Error::ProcessError {
            program: "edge-tts".to_string(),
            status: "exit status: 1".to_string(),
            stderr: "no voice".to_string(),
        };
        assert_eq!(err.to_string(), "edge-tts exited with status exit status: 1: no voice");
    }
}
