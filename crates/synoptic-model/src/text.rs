//! Text normalization shared by every stage that compares labels.

/// Longest cleaned name that keeps the `lower_snake` form as a group name.
pub const SNAKE_NAME_MAX: usize = 32;

/// Strips punctuation, lowercases, and collapses whitespace.
///
/// Punctuation is removed rather than replaced, so `non-sentinel` becomes
/// `nonsentinel`.
pub fn clean_text(raw: &str) -> String {
    let stripped: String = raw
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace())
        .collect();
    stripped
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleans a label key for comparison, additionally dropping purely numeric
/// tokens (list markers such as `3.` or `12`).
///
/// Only label keys go through this; values keep their digits.
pub fn clean_label_key(raw: &str) -> String {
    clean_text(raw)
        .split(' ')
        .filter(|token| !token.is_empty() && !token.chars().all(|ch| ch.is_ascii_digit()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Removes all whitespace and lowercases. Used for phrase tests that must
/// survive OCR spacing damage ("no lymph nodes present").
pub fn spaceless(raw: &str) -> String {
    raw.chars()
        .filter(|ch| !ch.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Derives the regex capture-group name for a canonical column.
///
/// Names up to [`SNAKE_NAME_MAX`] characters become `lower_snake`; longer
/// names become `lowerCamel`. Only ASCII alphanumerics survive, and a
/// leading digit is prefixed with an underscore.
pub fn group_name(canonical: &str) -> String {
    let cleaned = clean_text(canonical);
    let words: Vec<String> = cleaned
        .split(' ')
        .map(|word| {
            word.chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect();

    let mut name = if cleaned.chars().count() <= SNAKE_NAME_MAX {
        words.join("_")
    } else {
        let mut camel = String::new();
        for (idx, word) in words.iter().enumerate() {
            if idx == 0 {
                camel.push_str(word);
                continue;
            }
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                camel.push(first.to_ascii_uppercase());
                camel.push_str(chars.as_str());
            }
        }
        camel
    };

    if name.is_empty() || name.starts_with(|ch: char| ch.is_ascii_digit()) {
        name.insert(0, '_');
    }
    name
}
