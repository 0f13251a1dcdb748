//! Очистка текста перед синтезом речи.
//!
//! Набор преобразований фиксирован: разметка Markdown снимается,
//! слова из заглавных букв приводятся к обычному написанию,
//! пробелы схлопываются.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]+)\]\([^)]*\)").unwrap());
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").unwrap());
static UNDERLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_(.+?)_").unwrap());
static CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`(.+?)`").unwrap());
static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s*").unwrap());
static MARKUP_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[#*_`~\[\]{}]").unwrap());
static PARENS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^()]*)\)").unwrap());
static CAPS_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\p{Lu}{2,}\b").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Готовит текст для TTS: бэкенды зачитывают символы разметки вслух
/// и произносят аббревиатуры по буквам.
pub fn normalize_for_speech(text: &str) -> String {
    let text = LINK.replace_all(text, "$1");
    let text = BOLD.replace_all(&text, "$1");
    let text = ITALIC.replace_all(&text, "$1");
    let text = UNDERLINE.replace_all(&text, "$1");
    let text = CODE.replace_all(&text, "$1");
    let text = HEADING.replace_all(&text, "");
    let text = MARKUP_CHARS.replace_all(&text, "");
    let text = PARENS.replace_all(&text, "$1");
    let text = CAPS_WORD.replace_all(&text, |caps: &Captures| capitalize(&caps[0]));
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_emphasis_and_headings() {
        let input = "# Başlık\n**Kalın** ve *eğik* ve _altı çizili_ ve `kod`.";
        assert_eq!(normalize_for_speech(input), "Başlık Kalın ve eğik ve altı çizili ve kod.");
    }

    #[test]
    fn test_links_and_parentheses() {
        let input = "See [the docs](https://example.com/docs) (page two) now.";
        assert_eq!(normalize_for_speech(input), "See the docs page two now.");
    }

    #[test]
    fn test_caps_runs_are_capitalized() {
        assert_eq!(normalize_for_speech("NASA and DÜNYA say HELLO."), "Nasa and Dünya say Hello.");
        // Одиночная заглавная буква не трогается
        assert_eq!(normalize_for_speech("I am A person."), "I am A person.");
    }

    #[test]
    fn test_whitespace_collapsed() {
        assert_eq!(normalize_for_speech("  one \n\n two\tthree  "), "one two three");
    }

    #[test]
    fn test_leftover_markup_removed() {
        assert_eq!(normalize_for_speech("a ~b~ {c} #d"), "a b c d");
    }
}
