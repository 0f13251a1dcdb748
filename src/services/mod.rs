// Services module
// Contains business logic separated by domain areas

pub mod text;          // Normalization and sentence splitting
pub mod tts;           // Speech synthesis backends and per-segment synthesizer
pub mod audio;         // Audio decoding, encoding and probing
pub mod assembler;     // Track assembly and timing ledger
pub mod subtitles;     // SRT interchange and display standards
pub mod validation;    // Ledger vs audio synchronization check
pub mod video;         // Video/audio duration reconciliation
pub mod transcription; // Speech recognition with timestamps
pub mod realign;       // Subtitle re-alignment strategies
