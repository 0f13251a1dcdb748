//! Работа с аудио: форматы, передискретизация, длительность файлов.

pub mod format;
pub mod probe;

pub use format::{decode_audio_file, encode_wav, AudioFormat};
pub use probe::{AudioFileProbe, FfprobeProbe, MediaProbe, ProbeError};
