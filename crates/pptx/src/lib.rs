//! PPTX (Office Open XML) deck reader.
//!
//! Reads .pptx files, which are ZIP archives of XML parts, and returns the
//! slides in presentation order together with their speaker notes.

pub mod parser;

pub use parser::{load_deck, PptxParser};
