//! Per-run scratch directory and best-effort cleanup.
//!
//! Every intermediate file of a run lives under one temporary directory with
//! fixed names inside it. A dropped [`Workspace`] removes the directory, so
//! failed runs clean up too; [`Workspace::cleanup`] is the explicit path
//! taken after a successful encode.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::Result;

/// Name of the directory that receives rasterized slides.
pub const SLIDES_DIR: &str = "slides";

/// File name of the rasterized image for slide `number`.
pub fn slide_image_name(number: usize) -> String {
    format!("Slide{}.png", number)
}

/// Intermediate files produced for one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideFiles {
    /// Raster export of the slide, `slides/Slide{n}.png`.
    pub image: PathBuf,
    /// Narration audio, `slide_{n}.mp3`.
    pub audio: PathBuf,
    /// Timed captions from the speech backend, `slide_{n}.srt`.
    pub captions: PathBuf,
    /// Styled captions for burning in, `slide_{n}.ass`.
    pub styled_captions: PathBuf,
    /// Composed still frame, `frame_{n}.png`.
    pub frame: PathBuf,
    /// Encoded slide clip, `clip_{n}.mp4`.
    pub clip: PathBuf,
}

/// Scratch directory owned by a single pipeline run.
#[derive(Debug)]
pub struct Workspace {
    dir: TempDir,
    tracked: Vec<PathBuf>,
}

impl Workspace {
    /// Create a fresh workspace under `parent`, or under the system temp
    /// directory when `parent` is `None`.
    pub fn create(parent: Option<&Path>) -> Result<Self> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("slidecast-");
        let dir = match parent {
            Some(parent) => {
                std::fs::create_dir_all(parent)?;
                // Absolute paths stay valid when tools run inside the workspace.
                builder.tempdir_in(std::fs::canonicalize(parent)?)?
            }
            None => builder.tempdir()?,
        };
        std::fs::create_dir_all(dir.path().join(SLIDES_DIR))?;

        log::debug!("Created workspace {}", dir.path().display());
        Ok(Self {
            dir,
            tracked: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Directory the rasterizer exports into.
    pub fn slides_dir(&self) -> PathBuf {
        self.dir.path().join(SLIDES_DIR)
    }

    /// Path of the rasterized image for slide `number`.
    pub fn slide_image(&self, number: usize) -> PathBuf {
        self.slides_dir().join(slide_image_name(number))
    }

    /// Paths for slide `number`; the files are tracked for cleanup.
    pub fn slide_files(&mut self, number: usize) -> SlideFiles {
        let root = self.dir.path();
        let files = SlideFiles {
            image: self.slide_image(number),
            audio: root.join(format!("slide_{}.mp3", number)),
            captions: root.join(format!("slide_{}.srt", number)),
            styled_captions: root.join(format!("slide_{}.ass", number)),
            frame: root.join(format!("frame_{}.png", number)),
            clip: root.join(format!("clip_{}.mp4", number)),
        };
        self.tracked.extend([
            files.audio.clone(),
            files.captions.clone(),
            files.styled_captions.clone(),
            files.frame.clone(),
            files.clip.clone(),
        ]);
        files
    }

    /// Delete every intermediate. Errors are logged and ignored.
    pub fn cleanup(self) {
        let root = self.path().to_path_buf();
        remove_dir_quietly(&root.join(SLIDES_DIR));
        for path in &self.tracked {
            remove_quietly(path);
        }
        if let Err(e) = self.dir.close() {
            log::debug!("Ignoring workspace cleanup failure for {}: {}", root.display(), e);
        }
    }

    /// Leave the workspace on disk and return its path.
    pub fn keep(self) -> PathBuf {
        self.dir.keep()
    }
}

/// Remove a file, ignoring failures (including a missing file).
pub fn remove_quietly(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::debug!("Could not remove {}: {}", path.display(), e),
    }
}

/// Remove a directory tree, ignoring failures (including a missing one).
pub fn remove_dir_quietly(path: &Path) {
    match std::fs::remove_dir_all(path) {
        Ok(()) => log::debug!("Removed {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => log::debug!("Could not remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn test_fixed_names_inside_workspace() {
        let parent = TempDir::new().unwrap();
        let mut ws = Workspace::create(Some(parent.path())).unwrap();
        let files = ws.slide_files(3);

        assert!(files.image.ends_with("slides/Slide3.png"));
        assert!(files.audio.ends_with("slide_3.mp3"));
        assert!(files.captions.ends_with("slide_3.srt"));
        assert!(files.frame.ends_with("frame_3.png"));
        assert!(files.clip.ends_with("clip_3.mp4"));
        assert!(files.audio.starts_with(ws.path()));
        assert!(ws.slides_dir().is_dir());
        assert_eq!(ws.tracked.len(), 5);
    }

    #[test]
    fn test_cleanup_removes_every_intermediate() {
        let parent = TempDir::new().unwrap();
        let mut ws = Workspace::create(Some(parent.path())).unwrap();

        for n in 1..=2 {
            let files = ws.slide_files(n);
            for path in [
                &files.image,
                &files.audio,
                &files.captions,
                &files.styled_captions,
                &files.frame,
                &files.clip,
            ] {
                std::fs::write(path, b"x").unwrap();
            }
        }
        let root = ws.path().to_path_buf();

        ws.cleanup();

        assert!(!root.exists());
        assert_eq!(entries(parent.path()), 0);
    }

    #[test]
    fn test_dropped_workspace_is_removed() {
        let parent = TempDir::new().unwrap();
        {
            let mut ws = Workspace::create(Some(parent.path())).unwrap();
            let files = ws.slide_files(1);
            std::fs::write(&files.audio, b"partial").unwrap();
        }
        assert_eq!(entries(parent.path()), 0);
    }

    #[test]
    fn test_cleanup_tolerates_missing_files() {
        let parent = TempDir::new().unwrap();
        let mut ws = Workspace::create(Some(parent.path())).unwrap();
        let _ = ws.slide_files(1);
        ws.cleanup();
        assert_eq!(entries(parent.path()), 0);
    }

    #[test]
    fn test_remove_missing_paths_is_silent() {
        let parent = TempDir::new().unwrap();
        remove_quietly(&parent.path().join("nope.mp3"));
        remove_dir_quietly(&parent.path().join("nope"));
    }

    #[test]
    fn test_keep_leaves_directory() {
        let parent = TempDir::new().unwrap();
        let ws = Workspace::create(Some(parent.path())).unwrap();
        let kept = ws.keep();
        assert!(kept.is_dir());
        assert!(kept.join(SLIDES_DIR).is_dir());
    }
}
