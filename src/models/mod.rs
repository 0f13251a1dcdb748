// Domain models module
// Contains core data structures used throughout the application

pub mod report;
pub mod subtitle;
pub mod timing;
pub mod tts;

// Экспортируем основные типы для удобства использования
pub use report::{RealignmentStatus, SynchronizationReport, ACCEPTABLE_DURATION_DIFFERENCE};
pub use subtitle::{last_cue_end, SubtitleCue};
pub use timing::{round_millis, SegmentStatus, TimingLedger, TimingSegment, INTER_SEGMENT_SILENCE};
pub use tts::{estimate_duration, SegmentAudio, SynthesisResult, TextSegment};
