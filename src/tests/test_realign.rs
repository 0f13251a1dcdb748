use std::path::{Path, PathBuf};

use crate::config::{RealignConfig, RealignStrategy};
use crate::models::{RealignmentStatus, SubtitleCue};
use crate::services::audio::format::encode_wav;
use crate::services::audio::AudioFileProbe;
use crate::services::realign::RealignmentEngine;
use crate::services::subtitles::{read_srt, write_srt};
use crate::services::transcription::{
    Recognition, RecognitionError, RecognizedSegment, RecognizedWord, SpeechRecognizer,
};

/// Возвращает заранее заданный результат распознавания
struct StubRecognizer {
    result: Result<Recognition, String>,
}

#[async_trait::async_trait]
impl SpeechRecognizer for StubRecognizer {
    async fn recognize(
        &self,
        _audio_path: &Path,
        _language_hint: Option<&str>,
        with_words: bool,
    ) -> Result<Recognition, RecognitionError> {
        match &self.result {
            Ok(recognition) => {
                let mut recognition = recognition.clone();
                if !with_words {
                    recognition.words.clear();
                }
                Ok(recognition)
            }
            Err(message) => Err(RecognitionError::RecognitionFailed(message.clone())),
        }
    }
}

fn word(text: &str, start: f64, end: f64) -> RecognizedWord {
    RecognizedWord { text: text.to_string(), start, end }
}

/// SRT с двумя репликами и тишина заданной длины рядом с ним
fn fixture(dir: &Path, audio_seconds: f64) -> (PathBuf, PathBuf, String) {
    let subtitles = dir.join("subtitle_en.srt");
    let audio = dir.join("narration_en.wav");
    let cues = vec![
        SubtitleCue::new(1, 0.0, 1.2, "Hello world."),
        SubtitleCue::new(2, 1.5, 2.4, "Second one."),
    ];
    write_srt(&subtitles, &cues).unwrap();
    let rate = 8_000;
    encode_wav(&vec![0.0; (audio_seconds * rate as f64) as usize], rate, &audio).unwrap();
    let original = std::fs::read_to_string(&subtitles).unwrap();
    (subtitles, audio, original)
}

fn engine(strategy: RealignStrategy, recognizer: Option<StubRecognizer>) -> RealignmentEngine {
    let config = RealignConfig { strategy, ..RealignConfig::default() };
    let engine = RealignmentEngine::new(config, Box::new(AudioFileProbe));
    match recognizer {
        Some(recognizer) => engine.with_recognizer(Box::new(recognizer)),
        None => engine,
    }
}

#[tokio::test]
async fn test_forced_alignment_from_word_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let (subtitles, audio, original) = fixture(dir.path(), 10.0);
    let recognizer = StubRecognizer {
        result: Ok(Recognition {
            segments: vec![RecognizedSegment {
                start: 3.0,
                end: 6.0,
                text: "Hello world. Second one.".to_string(),
            }],
            words: vec![
                word("Hello", 3.0, 3.4),
                word("world.", 3.45, 4.0),
                word("Second", 5.0, 5.4),
                word("one.", 5.45, 6.0),
            ],
        }),
    };

    let outcome = engine(RealignStrategy::Auto, Some(recognizer))
        .realign_file(&subtitles, &audio, Some("en"))
        .await
        .unwrap();

    let corrected = RealignmentStatus::Corrected { strategy: "forced_alignment".to_string() };
    assert_eq!(outcome.status, corrected);
    let output = outcome.output_path.clone().unwrap();
    assert_eq!(output, dir.path().join("subtitle_en_synced.srt"));

    let cues = read_srt(&output).unwrap();
    assert_eq!((cues[0].start, cues[0].end), (3.0, 4.0));
    assert_eq!((cues[1].start, cues[1].end), (5.0, 6.0));
    let untouched = std::fs::read_to_string(&subtitles).unwrap();
    assert_eq!(untouched, original, "Исходный файл не должен меняться");
}

#[tokio::test]
async fn test_offset_from_first_recognized_segment() {
    let dir = tempfile::tempdir().unwrap();
    let (subtitles, audio, _) = fixture(dir.path(), 10.0);
    let recognizer = StubRecognizer {
        result: Ok(Recognition {
            segments: vec![RecognizedSegment {
                start: 0.5,
                end: 1.7,
                text: "Hello world.".to_string(),
            }],
            words: Vec::new(),
        }),
    };

    let outcome = engine(RealignStrategy::Offset, Some(recognizer))
        .realign_file(&subtitles, &audio, None)
        .await
        .unwrap();

    assert!(outcome.status.is_corrected());
    let cues = read_srt(outcome.output_path.as_ref().unwrap()).unwrap();
    assert_eq!((cues[0].start, cues[0].end), (0.5, 1.7));
    assert_eq!((cues[1].start, cues[1].end), (2.0, 2.9));
}

#[tokio::test]
async fn test_recognition_failure_keeps_timings() {
    let dir = tempfile::tempdir().unwrap();
    let (subtitles, audio, _) = fixture(dir.path(), 10.0);
    let recognizer = StubRecognizer { result: Err("service offline".to_string()) };

    let outcome = engine(RealignStrategy::Offset, Some(recognizer))
        .realign_file(&subtitles, &audio, None)
        .await
        .unwrap();

    assert!(matches!(
        outcome.status,
        RealignmentStatus::Uncorrected { ref strategy, .. } if strategy == "offset"
    ));
    let cues = read_srt(outcome.output_path.as_ref().unwrap()).unwrap();
    assert_eq!((cues[0].start, cues[0].end), (0.0, 1.2));
    assert_eq!((cues[1].start, cues[1].end), (1.5, 2.4));
}

#[tokio::test]
async fn test_small_drift_needs_no_correction() {
    let dir = tempfile::tempdir().unwrap();
    let (subtitles, audio, _) = fixture(dir.path(), 3.0);

    let outcome = engine(RealignStrategy::Auto, None)
        .realign_file(&subtitles, &audio, None)
        .await
        .unwrap();

    assert_eq!(outcome.status, RealignmentStatus::NotNeeded);
    assert!(outcome.output_path.is_none());
    assert!(!dir.path().join("subtitle_en_synced.srt").exists());
}

#[tokio::test]
async fn test_silent_audio_falls_back_to_proportional() {
    let dir = tempfile::tempdir().unwrap();
    let (subtitles, audio, _) = fixture(dir.path(), 4.8);

    let outcome = engine(RealignStrategy::Auto, None)
        .realign_file(&subtitles, &audio, None)
        .await
        .unwrap();

    let corrected = RealignmentStatus::Corrected { strategy: "proportional".to_string() };
    assert_eq!(outcome.status, corrected);
    let cues = read_srt(outcome.output_path.as_ref().unwrap()).unwrap();
    assert_eq!((cues[1].start, cues[1].end), (3.0, 4.8));
    assert!((outcome.assessment.sync_ratio - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn test_missing_subtitle_file_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let (_, audio, _) = fixture(dir.path(), 3.0);

    let result = engine(RealignStrategy::Auto, None)
        .realign_file(&dir.path().join("absent.srt"), &audio, None)
        .await;
    assert!(matches!(result, Err(crate::errors::AppError::MissingInputFile(_))));
}
