//! Domain types for a loaded slide deck.

use serde::Serialize;

use crate::narration::narration_text;

/// A presentation with one narration per slide.
#[derive(Debug, Clone, Serialize)]
pub struct Deck {
    /// Original filename (without path).
    pub filename: String,

    /// Detected format of the source file.
    pub format: DeckFormat,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Deck {
    /// Create an empty deck with the given filename and format.
    pub fn new(filename: impl Into<String>, format: DeckFormat) -> Self {
        Self {
            filename: filename.into(),
            format,
            slides: Vec::new(),
        }
    }

    /// Append a slide built from its speaker notes. The slide number is its
    /// 1-based position in the deck.
    pub fn push_notes(&mut self, notes: Option<String>) {
        let number = self.slides.len() + 1;
        self.slides.push(Slide::new(number, notes));
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }
}

/// The format of the source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeckFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Detected so it can be rejected clearly.
    Ppt,
}

impl DeckFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}

/// A single slide and the text that will be spoken over it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Raw speaker notes, if the slide has a notes page.
    pub notes: Option<String>,

    /// Narration text: trimmed notes, or a placeholder when there are none.
    pub narration: String,
}

impl Slide {
    pub fn new(number: usize, notes: Option<String>) -> Self {
        let narration = narration_text(number, notes.as_deref());
        Self {
            number,
            notes,
            narration,
        }
    }

    /// Whether the narration came from the slide's own notes.
    pub fn has_notes(&self) -> bool {
        self.notes
            .as_deref()
            .map(|n| !n.trim().is_empty())
            .unwrap_or(false)
    }
}
