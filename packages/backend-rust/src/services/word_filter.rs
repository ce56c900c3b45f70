use std::collections::HashSet;

use once_cell::sync::Lazy;

use super::pos_tagger::{tag_token, PosTag};
use super::tokenizer::Token;

/// Tags worth studying: common nouns, base and past verbs, gerunds, adjectives.
pub const RETAINED_TAGS: &[PosTag] = &[
    PosTag::NN,
    PosTag::NNS,
    PosTag::VB,
    PosTag::VBD,
    PosTag::VBG,
    PosTag::JJ,
];

/// The standard English stop-word list.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his",
    "himself", "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself",
    "they", "them", "their", "theirs", "themselves", "what", "which", "who", "whom", "this",
    "that", "that'll", "these", "those", "am", "is", "are", "was", "were", "be", "been",
    "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an", "the",
    "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by", "for",
    "with", "about", "against", "between", "into", "through", "during", "before", "after",
    "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over", "under",
    "again", "further", "then", "once", "here", "there", "when", "where", "why", "how", "all",
    "any", "both", "each", "few", "more", "most", "other", "some", "such", "no", "nor", "not",
    "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will", "just",
    "don", "don't", "should", "should've", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain",
    "aren", "aren't", "couldn", "couldn't", "didn", "didn't", "doesn", "doesn't", "hadn",
    "hadn't", "hasn", "hasn't", "haven", "haven't", "isn", "isn't", "ma", "mightn",
    "mightn't", "mustn", "mustn't", "needn", "needn't", "shan", "shan't", "shouldn",
    "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't", "wouldn", "wouldn't",
];

static STOP_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOP_WORDS.iter().copied().collect());

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

pub fn is_important(token: &Token) -> bool {
    if is_stop_word(&token.text) {
        return false;
    }
    let tag = tag_token(token);
    !tag.is_proper_noun() && RETAINED_TAGS.contains(&tag)
}

/// Keeps the study-worthy tokens, in order, duplicates included.
pub fn filter_important_words(tokens: &[Token]) -> Vec<String> {
    tokens
        .iter()
        .filter(|token| is_important(token))
        .map(|token| token.text.clone())
        .collect()
}
