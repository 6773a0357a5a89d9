//! OCR spacing repair.
//!
//! OCR splits words with stray spaces ("carci noma"). The resolver rejoins an
//! unknown alphabetic token with the tokens that follow it as soon as the
//! concatenation is a known word, and gives up as soon as a following token
//! is a known word on its own. It never inserts whitespace.

use std::collections::{BTreeMap, HashSet};

use tracing::trace;

/// Stop words added to every lexicon.
pub const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am", "an", "and", "any", "are",
    "as", "at", "be", "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "if", "in", "into", "is", "it", "its", "itself", "just", "me",
    "more", "most", "my", "myself", "no", "nor", "not", "now", "of", "off", "on", "once", "only",
    "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same", "she", "should",
    "so", "some", "such", "than", "that", "the", "their", "theirs", "them", "themselves", "then",
    "there", "these", "they", "this", "those", "through", "to", "too", "under", "until", "up",
    "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "whom", "why",
    "will", "with", "you", "your", "yours", "yourself", "yourselves",
];

/// Longest run of fragments joined into one word.
const DEFAULT_MAX_FRAGMENTS: usize = 4;

/// Known words, stored lowercase. The single letter `i` is never a member,
/// so a stray `i` fragment can still be merged.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    words: HashSet<String>,
}

impl Lexicon {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut lexicon = Self::default();
        lexicon.extend(words);
        lexicon
    }

    /// Domain words, a dictionary, and the stop words.
    pub fn build<D, W, S, T>(domain: D, dictionary: W) -> Self
    where
        D: IntoIterator<Item = S>,
        S: AsRef<str>,
        W: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let mut lexicon = Self::new(domain);
        lexicon.extend(dictionary);
        lexicon.extend(STOP_WORDS.iter().copied());
        lexicon
    }

    /// Words occurring at least `min_count` times across `texts`.
    pub fn from_corpus<I, S>(texts: I, min_count: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for text in texts {
            for token in tokenize(text.as_ref()) {
                if token.kind == TokenKind::Alpha {
                    *counts.entry(token.text.to_lowercase()).or_insert(0) += 1;
                }
            }
        }
        Self::new(
            counts
                .into_iter()
                .filter(|(_, count)| *count >= min_count)
                .map(|(word, _)| word),
        )
    }

    pub fn extend<I, S>(&mut self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for word in words {
            let word = word.as_ref().trim().to_lowercase();
            if !word.is_empty() && word != "i" {
                self.words.insert(word);
            }
        }
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words.contains(&word.to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TokenKind {
    Alpha,
    Space,
    Newline,
    Other,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Token<'a> {
    pub text: &'a str,
    pub kind: TokenKind,
}

fn kind_of(ch: char) -> TokenKind {
    if ch == '\n' || ch == '\r' {
        TokenKind::Newline
    } else if ch.is_whitespace() {
        TokenKind::Space
    } else if ch.is_alphabetic() {
        TokenKind::Alpha
    } else {
        TokenKind::Other
    }
}

/// Splits text into runs of one kind. Newlines are one token each.
pub(crate) fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut current: Option<TokenKind> = None;
    for (idx, ch) in text.char_indices() {
        let kind = kind_of(ch);
        if let Some(open) = current
            && (open != kind || kind == TokenKind::Newline)
        {
            tokens.push(Token {
                text: &text[start..idx],
                kind: open,
            });
            start = idx;
        }
        current = Some(kind);
    }
    if let Some(kind) = current {
        tokens.push(Token {
            text: &text[start..],
            kind,
        });
    }
    tokens
}

/// Repairs intra-word spaces against a lexicon.
#[derive(Debug, Clone)]
pub struct VocabularyResolver {
    lexicon: Lexicon,
    max_fragments: usize,
}

impl VocabularyResolver {
    pub fn new(lexicon: Lexicon) -> Self {
        Self {
            lexicon,
            max_fragments: DEFAULT_MAX_FRAGMENTS,
        }
    }

    #[must_use]
    pub fn with_max_fragments(mut self, max_fragments: usize) -> Self {
        self.max_fragments = max_fragments.max(1);
        self
    }

    pub fn lexicon(&self) -> &Lexicon {
        &self.lexicon
    }

    pub fn resolve(&self, text: &str) -> String {
        let tokens = tokenize(text);
        let mut out = String::with_capacity(text.len());
        let mut idx = 0;
        while idx < tokens.len() {
            let token = tokens[idx];
            if token.kind != TokenKind::Alpha || self.lexicon.contains(token.text) {
                out.push_str(token.text);
                idx += 1;
                continue;
            }
            match self.merge_from(&tokens, idx) {
                Some((merged, next)) => {
                    trace!(fragment = token.text, merged = %merged, "rejoined OCR fragments");
                    out.push_str(&merged);
                    idx = next;
                }
                None => {
                    out.push_str(token.text);
                    idx += 1;
                }
            }
        }
        collapse_spaces(&out)
    }

    /// Joins following alphabetic tokens onto `tokens[start]`, skipping
    /// spaces. Returns the merged word and the index after the last consumed
    /// token, or `None` when the merge is abandoned.
    fn merge_from(&self, tokens: &[Token<'_>], start: usize) -> Option<(String, usize)> {
        let mut joined = tokens[start].text.to_string();
        let mut cursor = start + 1;
        for _ in 0..self.max_fragments {
            while tokens.get(cursor)?.kind == TokenKind::Space {
                cursor += 1;
            }
            let next = tokens.get(cursor)?;
            if next.kind != TokenKind::Alpha {
                return None;
            }
            joined.push_str(next.text);
            if self.lexicon.contains(&joined) {
                return Some((joined, cursor + 1));
            }
            if self.lexicon.contains(next.text) {
                return None;
            }
            cursor += 1;
        }
        None
    }
}

/// Collapses runs of spaces (not newlines) into a single space.
fn collapse_spaces(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut previous_space = false;
    for ch in text.chars() {
        if ch == ' ' {
            if !previous_space {
                out.push(ch);
            }
            previous_space = true;
        } else {
            out.push(ch);
            previous_space = false;
        }
    }
    out
}
