//! Разбор и запись субтитров SRT.
//!
//! Все стратегии пересинхронизации работают с `SubtitleCue`,
//! сырой текст SRT читается и пишется только здесь.

use std::path::Path;

use log::warn;

use crate::errors::{AppError, AppResult};
use crate::models::SubtitleCue;

fn parsing_error(message: &str, value: &str) -> AppError {
    AppError::SubtitleParsingError(format!("{}: {}", message, value))
}

fn parse_component(value: &str, message: &str) -> AppResult<u64> {
    value.trim().parse().map_err(|_| parsing_error(message, value))
}

/// Парсит время из строки формата "HH:MM:SS,mmm" (допускается и точка)
pub fn parse_timestamp(timestamp: &str) -> AppResult<f64> {
    let parts: Vec<&str> = timestamp.trim().split(':').collect();
    if parts.len() != 3 {
        return Err(parsing_error("Неверный формат времени", timestamp));
    }

    let hours = parse_component(parts[0], "Неверный формат часов")?;
    let minutes = parse_component(parts[1], "Неверный формат минут")?;

    let (secs, fraction) = match parts[2].split_once([',', '.']) {
        Some((secs, fraction)) => (secs, fraction),
        None => (parts[2], ""),
    };
    let seconds = parse_component(secs, "Неверный формат секунд")?;

    // "5" -> 500 мс, "05" -> 50 мс, лишние знаки отбрасываются
    let fraction = fraction.trim();
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(parsing_error("Неверный формат миллисекунд", fraction));
    }
    let mut millis_digits: String = fraction.chars().take(3).collect();
    while millis_digits.len() < 3 {
        millis_digits.push('0');
    }
    let milliseconds: u64 = millis_digits.parse().unwrap_or(0);

    if minutes >= 60 || seconds >= 60 {
        return Err(parsing_error("Время вне допустимого диапазона", timestamp));
    }
    let total_ms = hours
        .checked_mul(3_600_000)
        .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1000 + milliseconds))
        .ok_or_else(|| parsing_error("Слишком большое время", timestamp))?;
    Ok(total_ms as f64 / 1000.0)
}

/// Время в формате "HH:MM:SS,mmm", округление до миллисекунд
pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let secs = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{:02}:{:02}:{:02},{:03}", hours, minutes, secs, millis)
}

fn parse_time_range(line: &str) -> AppResult<(f64, f64)> {
    let (start, end) =
        line.split_once("-->").ok_or_else(|| parsing_error("Неверный формат интервала", line))?;
    // После конца интервала могут идти координаты позиционирования
    let end = end.split_whitespace().next().unwrap_or("");
    Ok((parse_timestamp(start)?, parse_timestamp(end)?))
}

/// Парсит содержимое SRT. Нумерация реплик пересчитывается по порядку.
pub fn parse_srt(content: &str) -> AppResult<Vec<SubtitleCue>> {
    let content = content.trim_start_matches('\u{feff}').replace("\r\n", "\n").replace('\r', "\n");

    let mut cues = Vec::new();
    let mut malformed = 0;

    for block in content.split("\n\n").map(str::trim).filter(|b| !b.is_empty()) {
        let lines: Vec<&str> = block.lines().collect();
        let Some(timing_pos) = lines.iter().take(2).position(|l| l.contains("-->")) else {
            warn!("Пропущен блок субтитров без интервала: {:?}", lines.first());
            malformed += 1;
            continue;
        };

        let (start, end) = match parse_time_range(lines[timing_pos]) {
            Ok(range) => range,
            Err(e) => {
                warn!("Пропущен блок субтитров: {}", e);
                malformed += 1;
                continue;
            }
        };

        let text = lines[timing_pos + 1..]
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        cues.push(SubtitleCue::new(cues.len() + 1, start, end, text));
    }

    if cues.is_empty() && malformed > 0 {
        return Err(AppError::SubtitleParsingError(format!(
            "Не найдено ни одной корректной реплики ({} блоков пропущено)",
            malformed
        )));
    }
    Ok(cues)
}

/// Читает SRT файл
pub fn read_srt(path: &Path) -> AppResult<Vec<SubtitleCue>> {
    if !path.exists() {
        return Err(AppError::MissingInputFile(path.display().to_string()));
    }
    let content = std::fs::read_to_string(path)?;
    parse_srt(&content)
}

/// Сериализует реплики в SRT, номера блоков идут с 1
pub fn to_srt_string(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_timestamp(cue.start),
            format_timestamp(cue.end),
            cue.text
        ));
    }
    out
}

pub fn write_srt(path: &Path, cues: &[SubtitleCue]) -> AppResult<()> {
    std::fs::write(path, to_srt_string(cues))?;
    Ok(())
}
