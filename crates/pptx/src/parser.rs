//! PPTX file parser implementation.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use slidecast_core::{Deck, DeckFormat, Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use zip::result::ZipError;
use zip::ZipArchive;

const PRESENTATION_PART: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PART: &str = "ppt/_rels/presentation.xml.rels";

/// Open a deck from disk, detecting its format from magic bytes first and
/// the file extension second.
pub fn load_deck(path: &Path) -> Result<Deck> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 8];
    let read = file.read(&mut magic)?;
    file.rewind()?;

    let format = DeckFormat::from_magic(&magic[..read])
        .or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(DeckFormat::from_extension)
        })
        .ok_or_else(|| Error::UnsupportedFormat(path.display().to_string()))?;

    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown");

    match format {
        DeckFormat::Pptx => {
            log::debug!("Parsing {} as PPTX", path.display());
            PptxParser::new().parse(BufReader::new(file), filename)
        }
        DeckFormat::Ppt => Err(Error::UnsupportedFormat(format!(
            "{} is a legacy .ppt deck; save it as .pptx first",
            filename
        ))),
    }
}

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Parse a PPTX file from a reader.
    pub fn parse<R: Read + Seek>(&self, reader: R, filename: &str) -> Result<Deck> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;

        let mut deck = Deck::new(filename, DeckFormat::Pptx);

        for slide_path in self.slide_order(&mut archive)? {
            deck.push_notes(self.slide_notes(&mut archive, &slide_path)?);
            if let Some(slide) = deck.slides.last() {
                let source = if slide.has_notes() {
                    "narrating notes"
                } else {
                    "no notes, using placeholder"
                };
                log::debug!("Slide {} ({}): {}", slide.number, slide_path, source);
            }
        }

        if deck.is_empty() {
            log::warn!("{} contains no slides", filename);
        }

        Ok(deck)
    }

    /// Slide part paths in presentation order.
    ///
    /// The order is the `<p:sldIdLst>` of presentation.xml. Decks without one
    /// fall back to the slide relationships sorted by their trailing number.
    fn slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let rels_content = read_part(archive, PRESENTATION_RELS_PART)?.ok_or_else(|| {
            Error::PptxParseError(format!("missing {}", PRESENTATION_RELS_PART))
        })?;
        let rels: Vec<Relationship> = parse_relationships(&rels_content)?
            .into_iter()
            .filter(|r| r.is_slide())
            .collect();

        let ids = match read_part(archive, PRESENTATION_PART)? {
            Some(content) => slide_id_list(&content)?,
            None => Vec::new(),
        };

        if !ids.is_empty() {
            let mut ordered = Vec::with_capacity(ids.len());
            for id in ids {
                let rel = rels.iter().find(|r| r.id == id).ok_or_else(|| {
                    Error::PptxParseError(format!("slide relationship '{}' not found", id))
                })?;
                ordered.push(resolve_part("ppt", &rel.target));
            }
            return Ok(ordered);
        }

        log::debug!("No sldIdLst in presentation.xml; ordering slides by relationship target");
        let mut slides: Vec<(String, Option<usize>)> = rels
            .iter()
            .map(|r| (resolve_part("ppt", &r.target), extract_slide_number(&r.target)))
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }

    /// Speaker notes of one slide, if it links a notes page with a body.
    fn slide_notes<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        slide_path: &str,
    ) -> Result<Option<String>> {
        let (dir, file) = slide_path.rsplit_once('/').unwrap_or(("", slide_path));
        let rels_path = format!("{}/_rels/{}.rels", dir, file);

        let Some(rels_content) = read_part(archive, &rels_path)? else {
            return Ok(None);
        };

        let notes_target = parse_relationships(&rels_content)?
            .into_iter()
            .find(|r| r.is_notes_slide())
            .map(|r| resolve_part(dir, &r.target));

        let Some(notes_path) = notes_target else {
            return Ok(None);
        };

        match read_part(archive, &notes_path)? {
            Some(content) => Ok(extract_notes_text(&content)),
            None => {
                log::warn!("{} links missing notes part {}", slide_path, notes_path);
                Ok(None)
            }
        }
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// One `<Relationship>` of a `.rels` part.
#[derive(Debug, Clone, PartialEq)]
struct Relationship {
    id: String,
    rel_type: String,
    target: String,
    external: bool,
}

impl Relationship {
    fn is_slide(&self) -> bool {
        !self.external && self.rel_type.ends_with("/slide")
    }

    fn is_notes_slide(&self) -> bool {
        !self.external && self.rel_type.ends_with("/notesSlide")
    }
}

/// Read a part from the archive; `None` when it does not exist.
fn read_part<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<Option<String>> {
    let mut file = match archive.by_name(path) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Ok(None),
        Err(e) => {
            return Err(Error::ZipError(format!("Failed to open '{}': {}", path, e)));
        }
    };

    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(Some(content))
}

fn parse_relationships(xml: &str) -> Result<Vec<Relationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut rels = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel = Relationship {
                    id: String::new(),
                    rel_type: String::new(),
                    target: String::new(),
                    external: false,
                };
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Id" => rel.id = value,
                        b"Type" => rel.rel_type = value,
                        b"Target" => rel.target = value,
                        b"TargetMode" => rel.external = value == "External",
                        _ => {}
                    }
                }
                rels.push(rel);
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing relationships: {}", e)));
            }
            _ => {}
        }
    }

    Ok(rels)
}

/// The `r:id` values of `<p:sldIdLst>` in order.
fn slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                if let Some(id) = relationship_id(e) {
                    ids.push(id);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!("Error parsing presentation.xml: {}", e)));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// The namespaced `r:id` attribute; the bare `id` is a numeric slide id.
fn relationship_id(e: &BytesStart) -> Option<String> {
    e.attributes().flatten().find_map(|attr| {
        let key = attr.key.as_ref();
        (key.contains(&b':') && local_name(key) == b"id")
            .then(|| String::from_utf8_lossy(&attr.value).to_string())
    })
}

/// Text of the body placeholder on a notes page, paragraphs joined by `\n`.
///
/// Returns `None` when the page has no body placeholder or it holds only
/// whitespace.
fn extract_notes_text(xml: &str) -> Option<String> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut depth_in_shape = 0usize;
    let mut is_body = false;
    let mut in_text_body = false;
    let mut in_run_text = false;
    let mut paragraphs: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match local_name(e.name().as_ref()) {
                b"sp" => {
                    depth_in_shape += 1;
                    if depth_in_shape == 1 {
                        is_body = false;
                        paragraphs.clear();
                    }
                }
                b"ph" if depth_in_shape > 0 => is_body |= is_body_placeholder(e),
                b"txBody" if depth_in_shape > 0 => in_text_body = true,
                b"p" if in_text_body => paragraphs.push(String::new()),
                b"t" if in_text_body => in_run_text = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match local_name(e.name().as_ref()) {
                b"ph" if depth_in_shape > 0 => is_body |= is_body_placeholder(e),
                b"br" if in_text_body => {
                    if let Some(p) = paragraphs.last_mut() {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) if in_run_text => {
                let text = e.unescape().unwrap_or_default();
                if let Some(p) = paragraphs.last_mut() {
                    p.push_str(&text);
                }
            }
            Ok(Event::End(ref e)) => match local_name(e.name().as_ref()) {
                b"t" => in_run_text = false,
                b"txBody" => in_text_body = false,
                b"sp" => {
                    depth_in_shape = depth_in_shape.saturating_sub(1);
                    if depth_in_shape == 0 && is_body {
                        break;
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                log::warn!("XML parsing error in notes (using text read so far): {}", e);
                break;
            }
            _ => {}
        }
    }

    if !is_body {
        return None;
    }

    let text = paragraphs.join("\n");
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

fn is_body_placeholder(e: &BytesStart) -> bool {
    e.attributes()
        .flatten()
        .any(|attr| attr.key.as_ref() == b"type" && attr.value.as_ref() == b"body")
}

/// Resolve a relationship target against the directory of its source part.
fn resolve_part(base_dir: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = base_dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "slides/slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
