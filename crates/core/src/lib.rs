//! Core domain types, caption timing, frame layout and the per-run
//! workspace for turning slide decks into narrated videos.

pub mod captions;
pub mod error;
pub mod layout;
pub mod narration;
pub mod timeline;
pub mod types;
pub mod workspace;

pub use captions::{parse_srt, CaptionEntry, CaptionStyle};
pub use error::{Error, Result};
pub use layout::{FormatSpec, Placement, VideoFormat};
pub use narration::narration_text;
pub use timeline::{Timeline, VisualClip};
pub use types::{Deck, DeckFormat, Slide};
pub use workspace::{
    remove_dir_quietly, remove_quietly, slide_image_name, SlideFiles, Workspace,
};
