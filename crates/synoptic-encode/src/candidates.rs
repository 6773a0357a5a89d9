//! Candidate phrases of a value.
//!
//! Short values are compared whole. Longer values are broken into phrase
//! chunks at clause punctuation and connective words, so a synonym can match
//! one phrase of a sentence-like value.

use std::sync::LazyLock;

use regex::Regex;

/// Values with more tokens than this are chunked.
pub const MAX_WHOLE_TOKENS: usize = 5;

static CLAUSE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,;:.()\[\]\n]+").expect("Invalid clause break regex"));

const CONNECTIVES: &[&str] = &[
    "and", "or", "but", "with", "without", "which", "that", "is", "are", "was", "were", "of",
    "the", "a", "an", "in", "at", "to", "from", "by", "for", "on",
];

fn is_connective(word: &str) -> bool {
    CONNECTIVES.contains(&word.to_lowercase().as_str())
}

fn push_unique(out: &mut Vec<String>, phrase: &str) {
    let phrase = phrase.split_whitespace().collect::<Vec<_>>().join(" ");
    if !phrase.is_empty() && !out.contains(&phrase) {
        out.push(phrase);
    }
}

/// Candidate phrases of `text`, in source order and without duplicates.
///
/// A value of at most [`MAX_WHOLE_TOKENS`] tokens is its own single
/// candidate. Longer values yield each clause, then each run of words
/// between connectives within a clause.
pub fn candidates(text: &str) -> Vec<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    if trimmed.split_whitespace().count() <= MAX_WHOLE_TOKENS {
        push_unique(&mut out, trimmed);
        return out;
    }
    for clause in CLAUSE_BREAK.split(trimmed) {
        push_unique(&mut out, clause);
        let mut run: Vec<&str> = Vec::new();
        for word in clause.split_whitespace() {
            if is_connective(word) {
                if !run.is_empty() {
                    push_unique(&mut out, &run.join(" "));
                    run.clear();
                }
            } else {
                run.push(word);
            }
        }
        if !run.is_empty() {
            push_unique(&mut out, &run.join(" "));
        }
    }
    out
}
