//! Разбиение текста на предложения.

use crate::models::TextSegment;

fn is_terminal(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

fn is_closing(c: char) -> bool {
    matches!(c, '"' | '\'' | '”' | '’' | '»' | ')')
}

// Точка между цифрами ("3.5") предложение не завершает
fn is_decimal_point(chars: &[char], i: usize) -> bool {
    chars[i] == '.'
        && i > 0
        && i + 1 < chars.len()
        && chars[i - 1].is_ascii_digit()
        && chars[i + 1].is_ascii_digit()
}

fn push_fragment(sentences: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    // Фрагменты без букв и цифр ("...", "!?") синтезировать нечего
    if trimmed.chars().any(char::is_alphanumeric) {
        sentences.push(trimmed.to_string());
    }
}

/// Делит текст по сериям завершающих знаков `.`, `!`, `?`.
///
/// Знаки остаются в конце своего предложения, пустые фрагменты отбрасываются,
/// хвост без завершающего знака тоже считается предложением.
/// Индексы начинаются с 1 и идут в порядке текста.
pub fn split_sentences(text: &str) -> Vec<TextSegment> {
    let chars: Vec<char> = text.chars().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();

    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        current.push(c);

        if is_terminal(c) && !is_decimal_point(&chars, i) {
            while i + 1 < chars.len() && is_terminal(chars[i + 1]) {
                i += 1;
                current.push(chars[i]);
            }
            while i + 1 < chars.len() && is_closing(chars[i + 1]) {
                i += 1;
                current.push(chars[i]);
            }
            push_fragment(&mut sentences, &current);
            current.clear();
        }
        i += 1;
    }
    push_fragment(&mut sentences, &current);

    sentences
        .into_iter()
        .enumerate()
        .map(|(i, text)| TextSegment::new(i + 1, text))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(segments: &[TextSegment]) -> Vec<&str> {
        segments.iter().map(|s| s.text.as_str()).collect()
    }

    #[test]
    fn test_basic_split() {
        let segments = split_sentences("Hello world. This is a test.");
        assert_eq!(texts(&segments), vec!["Hello world.", "This is a test."]);
        assert_eq!(segments[0].index, 1);
        assert_eq!(segments[1].index, 2);
    }

    #[test]
    fn test_punctuation_runs() {
        let segments = split_sentences("Wait!!! Really?! Yes... ok");
        assert_eq!(texts(&segments), vec!["Wait!!!", "Really?!", "Yes...", "ok"]);
    }

    #[test]
    fn test_empty_fragments_dropped() {
        assert!(split_sentences("   ").is_empty());
        assert!(split_sentences("...!!!").is_empty());
        let segments = split_sentences("... Start here. . . End.");
        assert_eq!(texts(&segments), vec!["Start here.", "End."]);
        assert_eq!(segments[1].index, 2);
    }

    #[test]
    fn test_decimal_numbers_kept_together() {
        let segments = split_sentences("Pi is 3.14 roughly. Done.");
        assert_eq!(texts(&segments), vec!["Pi is 3.14 roughly.", "Done."]);
    }

    #[test]
    fn test_closing_quotes_stay_with_sentence() {
        let segments = split_sentences("He said \"stop.\" Then left.");
        assert_eq!(texts(&segments), vec!["He said \"stop.\"", "Then left."]);
    }

    #[test]
    fn test_split_is_deterministic() {
        let text = "Bir. İki! Üç?";
        assert_eq!(split_sentences(text), split_sentences(text));
    }
}
