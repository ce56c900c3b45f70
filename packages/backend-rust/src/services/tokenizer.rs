use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[A-Za-z]{2,}\b").unwrap());

const SENTENCE_TERMINATORS: &[char] = &['.', '!', '?', ':', ';'];

/// Letter case of a token as it appeared in the recognized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenShape {
    Lower,
    Capitalized,
    Upper,
    Mixed,
}

impl TokenShape {
    pub fn of(surface: &str) -> Self {
        let has_lower = surface.chars().any(|c| c.is_ascii_lowercase());
        let has_upper = surface.chars().any(|c| c.is_ascii_uppercase());
        match (has_upper, has_lower) {
            (false, _) => Self::Lower,
            (true, false) => Self::Upper,
            (true, true) => {
                let mut chars = surface.chars();
                let first_upper = chars.next().is_some_and(|c| c.is_ascii_uppercase());
                if first_upper && chars.all(|c| c.is_ascii_lowercase()) {
                    Self::Capitalized
                } else {
                    Self::Mixed
                }
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Lower-cased text.
    pub text: String,
    pub shape: TokenShape,
    /// First token of the text or of a sentence.
    pub sentence_initial: bool,
    /// The whole source line was written in capitals.
    pub upper_line: bool,
}

impl Token {
    /// A token with no case information, as if read from lower-case text.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into().to_ascii_lowercase(),
            shape: TokenShape::Lower,
            sentence_initial: false,
            upper_line: false,
        }
    }
}

/// Extracts alphabetic tokens of two or more letters from each line, in order.
///
/// Lines are read as one running text: a line break does not start a
/// sentence, only the first token or a token after `.!?:;` does.
pub fn tokenize<S: AsRef<str>>(lines: &[S]) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut at_sentence_start = true;

    for line in lines {
        let line = line.as_ref();
        let upper_line = is_upper_line(line);
        let mut cursor = 0;

        for found in WORD_RE.find_iter(line) {
            if line[cursor..found.start()].contains(SENTENCE_TERMINATORS) {
                at_sentence_start = true;
            }
            let surface = found.as_str();
            tokens.push(Token {
                text: surface.to_ascii_lowercase(),
                shape: TokenShape::of(surface),
                sentence_initial: at_sentence_start,
                upper_line,
            });
            at_sentence_start = false;
            cursor = found.end();
        }

        if line[cursor..].contains(SENTENCE_TERMINATORS) {
            at_sentence_start = true;
        }
    }

    tokens
}

/// Lower-cased token texts only.
pub fn token_texts<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    tokenize(lines).into_iter().map(|t| t.text).collect()
}

pub fn dedup_preserving_order(words: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(words.len());
    words
        .into_iter()
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

fn is_upper_line(line: &str) -> bool {
    let mut letters = line.chars().filter(|c| c.is_ascii_alphabetic()).peekable();
    letters.peek().is_some() && letters.all(|c| c.is_ascii_uppercase())
}
