//! Субтитры: формат SRT, сборка из журнала, стандарты отображения.

pub mod composer;
pub mod srt;
pub mod standards;

pub use composer::{compose_cues, compose_srt, write_subtitles};
pub use srt::{parse_srt, read_srt, to_srt_string, write_srt};
pub use standards::{assess, format_cues, wrap_text, StandardsAssessment};
