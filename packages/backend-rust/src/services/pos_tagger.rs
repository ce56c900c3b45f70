//! Lexicon and suffix part-of-speech tagger over the Penn Treebank tag set.
//!
//! Every tag is computed from the token alone (its text and its surface
//! shape), never from neighbouring tags, so tagging a word always gives the
//! same answer regardless of the sentence it came from.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use super::tokenizer::{Token, TokenShape};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosTag {
    CC,
    CD,
    DT,
    EX,
    IN,
    JJ,
    JJR,
    JJS,
    MD,
    NN,
    NNS,
    NNP,
    NNPS,
    PRP,
    PRPS,
    RB,
    RP,
    TO,
    UH,
    VB,
    VBD,
    VBG,
    VBN,
    VBP,
    VBZ,
    WDT,
    WP,
    WRB,
}

impl PosTag {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CC => "CC",
            Self::CD => "CD",
            Self::DT => "DT",
            Self::EX => "EX",
            Self::IN => "IN",
            Self::JJ => "JJ",
            Self::JJR => "JJR",
            Self::JJS => "JJS",
            Self::MD => "MD",
            Self::NN => "NN",
            Self::NNS => "NNS",
            Self::NNP => "NNP",
            Self::NNPS => "NNPS",
            Self::PRP => "PRP",
            Self::PRPS => "PRP$",
            Self::RB => "RB",
            Self::RP => "RP",
            Self::TO => "TO",
            Self::UH => "UH",
            Self::VB => "VB",
            Self::VBD => "VBD",
            Self::VBG => "VBG",
            Self::VBN => "VBN",
            Self::VBP => "VBP",
            Self::VBZ => "VBZ",
            Self::WDT => "WDT",
            Self::WP => "WP",
            Self::WRB => "WRB",
        }
    }

    pub fn is_proper_noun(self) -> bool {
        matches!(self, Self::NNP | Self::NNPS)
    }
}

impl std::fmt::Display for PosTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const CLOSED_CLASS: &[(PosTag, &[&str])] = &[
    (
        PosTag::DT,
        &[
            "the", "an", "this", "that", "these", "those", "every", "each", "some", "any", "no",
            "all", "both", "either", "neither", "another", "such", "half",
        ],
    ),
    (
        PosTag::IN,
        &[
            "of", "in", "on", "at", "by", "for", "with", "about", "against", "between", "into",
            "through", "during", "before", "after", "above", "below", "from", "over", "under",
            "than", "since", "until", "upon", "within", "without", "among", "across", "behind",
            "beyond", "near", "toward", "towards", "despite", "except", "per", "via", "around",
            "along", "beside", "besides", "inside", "outside", "onto", "throughout", "if",
            "because", "while", "although", "though", "whether", "unless", "as", "like", "whereas",
        ],
    ),
    (PosTag::CC, &["and", "or", "but", "nor", "plus"]),
    (
        PosTag::PRP,
        &[
            "me", "you", "he", "him", "she", "it", "we", "us", "they", "them", "myself",
            "yourself", "yourselves", "himself", "herself", "itself", "ourselves", "themselves",
            "mine", "yours", "hers", "ours", "theirs", "one",
        ],
    ),
    (PosTag::PRPS, &["my", "your", "his", "her", "its", "our", "their"]),
    (
        PosTag::MD,
        &["can", "could", "may", "might", "must", "shall", "should", "will", "would", "ought"],
    ),
    (PosTag::TO, &["to"]),
    (PosTag::EX, &["there"]),
    (PosTag::WDT, &["which", "whichever", "whatever"]),
    (PosTag::WP, &["who", "whom", "whose", "what", "whoever"]),
    (PosTag::WRB, &["when", "where", "why", "how", "whenever", "wherever"]),
    (PosTag::RP, &["up", "down", "out", "off"]),
    (
        PosTag::RB,
        &[
            "not", "very", "too", "also", "just", "only", "then", "here", "now", "always",
            "never", "often", "soon", "again", "already", "still", "even", "almost", "ever",
            "quite", "rather", "once", "twice", "yet", "so", "thus", "perhaps", "maybe",
            "sometimes", "usually", "seldom", "rarely", "indeed", "instead", "together", "away",
            "back", "forward", "further", "ago", "else", "anyway", "somewhat", "later", "well",
            "nowhere", "somewhere", "anywhere", "everywhere", "otherwise", "meanwhile",
        ],
    ),
    (
        PosTag::CD,
        &[
            "two", "three", "four", "five", "six", "seven", "eight", "nine", "ten", "eleven",
            "twelve", "thirteen", "fourteen", "fifteen", "sixteen", "seventeen", "eighteen",
            "nineteen", "twenty", "thirty", "forty", "fifty", "sixty", "seventy", "eighty",
            "ninety", "hundred", "thousand", "million", "billion", "zero",
        ],
    ),
    (
        PosTag::UH,
        &["oh", "yes", "hello", "hi", "ok", "okay", "wow", "hey", "please", "thanks", "oops"],
    ),
    (PosTag::JJR, &["more", "less", "better", "worse", "fewer", "greater", "larger", "smaller"]),
    (PosTag::JJS, &["most", "least", "best", "worst"]),
];

const AUXILIARIES: &[(&str, PosTag)] = &[
    ("be", PosTag::VB),
    ("am", PosTag::VBP),
    ("is", PosTag::VBZ),
    ("are", PosTag::VBP),
    ("was", PosTag::VBD),
    ("were", PosTag::VBD),
    ("been", PosTag::VBN),
    ("being", PosTag::VBG),
    ("have", PosTag::VBP),
    ("has", PosTag::VBZ),
    ("had", PosTag::VBD),
    ("having", PosTag::VBG),
    ("do", PosTag::VBP),
    ("does", PosTag::VBZ),
    ("did", PosTag::VBD),
    ("doing", PosTag::VBG),
    ("done", PosTag::VBN),
    ("goes", PosTag::VBZ),
    ("says", PosTag::VBZ),
];

const BASE_VERBS: &[&str] = &[
    "go", "make", "take", "see", "come", "know", "get", "give", "find", "think", "tell",
    "become", "leave", "feel", "bring", "begin", "keep", "hold", "write", "stand", "hear",
    "let", "mean", "meet", "pay", "sit", "speak", "lead", "grow", "lose", "send", "build",
    "understand", "draw", "break", "spend", "rise", "drive", "buy", "wear", "choose", "eat",
    "drink", "sing", "swim", "fly", "forget", "learn", "study", "use", "want", "need", "try",
    "ask", "seem", "help", "believe", "happen", "include", "continue", "create", "remember",
    "consider", "appear", "wait", "serve", "die", "expect", "stay", "reach", "remain",
    "suggest", "raise", "sell", "require", "decide", "allow", "provide", "say", "teach",
    "catch", "throw", "steal", "hide", "sleep", "arrive", "receive", "explain", "describe",
    "improve", "prepare", "discover", "achieve", "enjoy", "carry", "hurry", "worry", "apply",
    "rely", "save", "follow", "prefer", "develop", "reduce", "avoid", "protect", "accept",
];

const IRREGULAR_PAST: &[&str] = &[
    "went", "made", "took", "saw", "came", "knew", "got", "gave", "found", "thought", "told",
    "became", "left", "felt", "brought", "began", "kept", "held", "wrote", "stood", "heard",
    "meant", "met", "ran", "paid", "sat", "spoke", "led", "grew", "lost", "fell", "sent",
    "built", "understood", "drew", "broke", "spent", "rose", "drove", "bought", "wore",
    "chose", "ate", "drank", "sang", "swam", "flew", "forgot", "said", "taught", "caught",
    "fought", "sold", "slept", "threw", "stole", "hid", "won", "sought", "struck", "woke",
];

const PAST_PARTICIPLES: &[&str] = &[
    "gone", "taken", "seen", "known", "given", "written", "spoken", "broken", "chosen",
    "eaten", "driven", "flown", "forgotten", "grown", "drawn", "thrown", "worn", "sung",
    "swum", "begun", "drunk", "fallen", "risen", "stolen", "hidden", "woken", "shown",
];

const ADJECTIVES: &[&str] = &[
    "quick", "brown", "big", "small", "good", "bad", "new", "old", "great", "high", "low",
    "long", "short", "large", "little", "young", "blue", "green", "white", "black", "red",
    "yellow", "happy", "sad", "hot", "cold", "warm", "cool", "fast", "slow", "easy", "hard",
    "strong", "weak", "rich", "poor", "full", "empty", "clean", "dirty", "early", "late",
    "important", "different", "free", "true", "real", "sure", "simple", "clear", "dark",
    "bright", "deep", "heavy", "soft", "wide", "nice", "fine", "whole", "main", "lazy", "busy",
    "quiet", "loud", "tall", "thin", "thick", "safe", "wild", "calm", "rare", "fresh", "sweet",
    "sour", "bitter", "huge", "tiny", "angry", "proud", "brave", "smart", "wise", "wrong",
    "right", "ready", "friendly", "lovely", "lonely", "ugly", "silly", "holy", "likely",
    "lively", "elderly", "costly", "deadly", "sacred", "naked", "wicked", "public", "basic",
    "possible", "certain", "common", "modern", "recent", "private", "special", "final",
    "local", "social", "national", "natural", "general", "personal", "open",
];

/// Words whose suffix would mislead the rules below.
const SUFFIX_EXCEPTIONS: &[(&str, PosTag)] = &[
    ("thing", PosTag::NN),
    ("something", PosTag::NN),
    ("nothing", PosTag::NN),
    ("anything", PosTag::NN),
    ("everything", PosTag::NN),
    ("king", PosTag::NN),
    ("ring", PosTag::NN),
    ("spring", PosTag::NN),
    ("string", PosTag::NN),
    ("wing", PosTag::NN),
    ("morning", PosTag::NN),
    ("evening", PosTag::NN),
    ("ceiling", PosTag::NN),
    ("wedding", PosTag::NN),
    ("pudding", PosTag::NN),
    ("bed", PosTag::NN),
    ("seed", PosTag::NN),
    ("speed", PosTag::NN),
    ("weed", PosTag::NN),
    ("shed", PosTag::NN),
    ("family", PosTag::NN),
    ("supply", PosTag::NN),
    ("reply", PosTag::NN),
    ("ally", PosTag::NN),
    ("belly", PosTag::NN),
    ("jelly", PosTag::NN),
    ("rally", PosTag::NN),
    ("bully", PosTag::NN),
    ("music", PosTag::NN),
    ("topic", PosTag::NN),
    ("traffic", PosTag::NN),
    ("logic", PosTag::NN),
    ("magic", PosTag::NN),
    ("panic", PosTag::NN),
    ("picnic", PosTag::NN),
    ("clinic", PosTag::NN),
    ("republic", PosTag::NN),
    ("fabric", PosTag::NN),
    ("garlic", PosTag::NN),
    ("critic", PosTag::NN),
    ("olive", PosTag::NN),
    ("motive", PosTag::NN),
    ("archive", PosTag::NN),
    ("handful", PosTag::NN),
    ("table", PosTag::NN),
    ("cable", PosTag::NN),
    ("fable", PosTag::NN),
    ("vegetable", PosTag::NN),
    ("bible", PosTag::NN),
];

const ADJECTIVE_SUFFIXES: &[&str] = &[
    "ous", "ful", "ive", "able", "ible", "ical", "ial", "less", "ish", "ic",
];

static LEXICON: Lazy<HashMap<&'static str, PosTag>> = Lazy::new(|| {
    let mut lexicon = HashMap::new();
    // Later entries win, so the most specific lists go last.
    for word in ADJECTIVES {
        lexicon.insert(*word, PosTag::JJ);
    }
    for word in BASE_VERBS {
        lexicon.insert(*word, PosTag::VB);
    }
    for word in PAST_PARTICIPLES {
        lexicon.insert(*word, PosTag::VBN);
    }
    for word in IRREGULAR_PAST {
        lexicon.insert(*word, PosTag::VBD);
    }
    for (word, tag) in SUFFIX_EXCEPTIONS {
        lexicon.insert(*word, *tag);
    }
    for (word, tag) in AUXILIARIES {
        lexicon.insert(*word, *tag);
    }
    for (tag, words) in CLOSED_CLASS {
        for word in *words {
            lexicon.insert(*word, *tag);
        }
    }
    lexicon
});

/// Tags a lower-case word with no surface information.
pub fn tag_word(word: &str) -> PosTag {
    let word = word.to_ascii_lowercase();
    if let Some(tag) = LEXICON.get(word.as_str()) {
        return *tag;
    }
    tag_by_suffix(&word)
}

/// Tags a token, promoting capitalised words that do not open a sentence to
/// proper nouns. Lines written entirely in capitals carry no case signal.
pub fn tag_token(token: &Token) -> PosTag {
    let base = tag_word(&token.text);
    if looks_like_proper_noun(token) {
        return if base == PosTag::NNS { PosTag::NNPS } else { PosTag::NNP };
    }
    base
}

pub fn tag_tokens(tokens: &[Token]) -> Vec<(String, PosTag)> {
    tokens
        .iter()
        .map(|token| (token.text.clone(), tag_token(token)))
        .collect()
}

fn looks_like_proper_noun(token: &Token) -> bool {
    token.shape != TokenShape::Lower && !token.sentence_initial && !token.upper_line
}

fn tag_by_suffix(word: &str) -> PosTag {
    let len = word.len();

    if len >= 5 && word.ends_with("ing") {
        return PosTag::VBG;
    }
    if len >= 4 && word.ends_with("ed") {
        return PosTag::VBD;
    }
    if len >= 5 && word.ends_with("ly") {
        return PosTag::RB;
    }
    if ADJECTIVE_SUFFIXES
        .iter()
        .any(|suffix| len > suffix.len() + 2 && word.ends_with(suffix))
    {
        return PosTag::JJ;
    }
    if len >= 3
        && word.ends_with('s')
        && !word.ends_with("ss")
        && !word.ends_with("us")
        && !word.ends_with("is")
    {
        return PosTag::NNS;
    }

    PosTag::NN
}
