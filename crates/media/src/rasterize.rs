//! Exporting every slide of a deck as an image.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use slidecast_core::{remove_quietly, slide_image_name, Error, Result};

use crate::process::run;

/// Renders a deck to one still image per slide.
pub trait SlideRasterizer {
    /// Export all slides of `deck` into `out_dir` as `Slide{n}.png`
    /// (1-based, presentation order) and return their paths.
    fn rasterize(&self, deck: &Path, out_dir: &Path, slide_count: usize) -> Result<Vec<PathBuf>>;

    /// Backend name, for logs.
    fn name(&self) -> &str;
}

/// Headless LibreOffice export: deck to PDF with `soffice`, then one PNG per
/// page with `pdftoppm`.
#[derive(Debug, Clone)]
pub struct LibreOfficeRasterizer {
    soffice: PathBuf,
    pdftoppm: PathBuf,
    dpi: u32,
}

impl Default for LibreOfficeRasterizer {
    fn default() -> Self {
        Self {
            soffice: PathBuf::from("soffice"),
            pdftoppm: PathBuf::from("pdftoppm"),
            dpi: 150,
        }
    }
}

impl LibreOfficeRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_soffice(mut self, program: impl Into<PathBuf>) -> Self {
        self.soffice = program.into();
        self
    }

    pub fn with_pdftoppm(mut self, program: impl Into<PathBuf>) -> Self {
        self.pdftoppm = program.into();
        self
    }

    /// Raster resolution of the exported pages.
    pub fn with_dpi(mut self, dpi: u32) -> Self {
        self.dpi = dpi.max(1);
        self
    }

    fn export_pdf(&self, deck: &Path, out_dir: &Path) -> Result<PathBuf> {
        let mut cmd = Command::new(&self.soffice);
        cmd.args(export_args(deck, out_dir));
        run(&mut cmd)?;

        let stem = deck
            .file_stem()
            .ok_or_else(|| Error::InvalidInput(format!("{} has no file name", deck.display())))?;
        let pdf = out_dir.join(format!("{}.pdf", stem.to_string_lossy()));
        if !pdf.is_file() {
            return Err(Error::ProcessError {
                program: self.soffice.display().to_string(),
                status: "exit status: 0".to_string(),
                stderr: format!("expected {} to be written", pdf.display()),
            });
        }
        Ok(pdf)
    }
}

impl SlideRasterizer for LibreOfficeRasterizer {
    fn rasterize(&self, deck: &Path, out_dir: &Path, slide_count: usize) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(out_dir)?;
        let pdf = self.export_pdf(deck, out_dir)?;

        let mut cmd = Command::new(&self.pdftoppm);
        cmd.arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(&pdf)
            .arg(out_dir.join(PAGE_PREFIX));
        let result = run(&mut cmd);
        remove_quietly(&pdf);
        result?;

        let images = rename_pages(out_dir)?;
        if images.len() != slide_count {
            return Err(Error::InvalidInput(format!(
                "{} exported {} slide images but the deck has {} slides",
                deck.display(),
                images.len(),
                slide_count
            )));
        }

        log::info!("Rasterized {} slides with {}", images.len(), self.name());
        Ok(images)
    }

    fn name(&self) -> &str {
        "libreoffice"
    }
}

const PAGE_PREFIX: &str = "page";

/// Impress PDF filter that keeps hidden slides, so every slide gets a page.
const PDF_EXPORT_FILTER: &str =
    r#"pdf:impress_pdf_Export:{"ExportHiddenSlides":{"type":"boolean","value":"true"}}"#;

fn export_args(deck: &Path, out_dir: &Path) -> Vec<OsString> {
    vec![
        "--headless".into(),
        "--norestore".into(),
        "--convert-to".into(),
        PDF_EXPORT_FILTER.into(),
        "--outdir".into(),
        out_dir.into(),
        deck.into(),
    ]
}

/// Rename `pdftoppm` output (`page-1.png`, or zero-padded `page-01.png`) in
/// `dir` to `Slide{n}.png`, returning the new paths in page order.
fn rename_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut pages: Vec<(usize, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let number = name
            .strip_prefix(PAGE_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .and_then(|rest| rest.strip_suffix(".png"))
            .and_then(|digits| digits.parse::<usize>().ok());
        if let Some(number) = number {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);

    let mut images = Vec::with_capacity(pages.len());
    for (idx, (_, path)) in pages.into_iter().enumerate() {
        let target = dir.join(slide_image_name(idx + 1));
        std::fs::rename(&path, &target)?;
        images.push(target);
    }
    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_rename_pages_orders_numerically() {
        let dir = TempDir::new().unwrap();
        for name in ["page-10.png", "page-02.png", "page-1.png", "other.png", "page-x.png"] {
            std::fs::write(dir.path().join(name), name).unwrap();
        }

        let images = rename_pages(dir.path()).unwrap();

        assert_eq!(images.len(), 3);
        assert_eq!(images[0], dir.path().join("Slide1.png"));
        assert_eq!(std::fs::read_to_string(&images[0]).unwrap(), "page-1.png");
        assert_eq!(std::fs::read_to_string(&images[1]).unwrap(), "page-02.png");
        assert_eq!(std::fs::read_to_string(&images[2]).unwrap(), "page-10.png");
        assert!(dir.path().join("other.png").exists());
        assert!(!dir.path().join("page-1.png").exists());
    }

    #[test]
    fn test_export_includes_hidden_slides() {
        let args: Vec<String> = export_args(Path::new("/d/talk.pptx"), Path::new("/w/slides"))
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();

        let convert = args.iter().position(|a| a == "--convert-to").unwrap();
        assert_eq!(
            args[convert + 1],
            r#"pdf:impress_pdf_Export:{"ExportHiddenSlides":{"type":"boolean","value":"true"}}"#
        );
        assert_eq!(args[args.len() - 2..], ["/w/slides", "/d/talk.pptx"]);
    }

    #[test]
    fn test_builder_options() {
        let r = LibreOfficeRasterizer::new()
            .with_soffice("/opt/lo/soffice")
            .with_pdftoppm("/usr/bin/pdftoppm")
            .with_dpi(0);
        assert_eq!(r.soffice, PathBuf::from("/opt/lo/soffice"));
        assert_eq!(r.pdftoppm, PathBuf::from("/usr/bin/pdftoppm"));
        assert_eq!(r.dpi, 1);
    }

    #[test]
    fn test_missing_soffice_aborts() {
        let dir = TempDir::new().unwrap();
        let deck = dir.path().join("deck.pptx");
        std::fs::write(&deck, b"PK").unwrap();

        let r = LibreOfficeRasterizer::new().with_soffice("slidecast-no-such-soffice");
        let err = r.rasterize(&deck, &dir.path().join("out"), 1).unwrap_err();
        assert!(matches!(err, Error::ToolNotFound(_)));
    }
}
