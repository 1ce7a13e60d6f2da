//! External tool backends and the deck-to-video pipeline.
//!
//! Slide rasterizing and speech synthesis sit behind the [`SlideRasterizer`]
//! and [`SpeechSynthesizer`] traits; ffmpeg work sits behind
//! [`VideoEncoder`]. [`Pipeline`] drives them one slide at a time.

pub mod assemble;
pub mod compose;
pub mod encode;
pub mod pipeline;
pub mod process;
pub mod rasterize;
pub mod speech;

pub use assemble::VideoAssembler;
pub use compose::FrameComposer;
pub use encode::{FfmpegEncoder, VideoEncoder, VideoInfo};
pub use pipeline::{Pipeline, PipelineOptions, RunReport};
pub use rasterize::{LibreOfficeRasterizer, SlideRasterizer};
pub use speech::{EdgeTts, SpeechSynthesizer, DEFAULT_VOICE};
