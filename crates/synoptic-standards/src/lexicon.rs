//! Word lists for the vocabulary resolver.

use std::collections::BTreeSet;
use std::path::Path;

use crate::error::StandardsError;
use crate::table::read_csv_table;

/// Reads a plain word list, one word per line; `#` starts a comment.
pub fn load_word_list(path: &Path) -> Result<BTreeSet<String>, StandardsError> {
    let content = std::fs::read_to_string(path).map_err(|e| StandardsError::io(path, e))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_lowercase)
        .collect())
}

/// Reads a `word,count` frequency list, keeping words seen at least `min_count` times.
pub fn load_frequency_list(path: &Path, min_count: u64) -> Result<BTreeSet<String>, StandardsError> {
    let table = read_csv_table(path)?;
    table.require(path, "word")?;
    table.require(path, "count")?;
    let mut words = BTreeSet::new();
    for row in &table.rows {
        let raw = row.get("count");
        let count: u64 = raw.parse().map_err(|_| {
            StandardsError::malformed(path, row.number, format!("count '{raw}' is not an integer"))
        })?;
        if count >= min_count {
            words.insert(row.get("word").to_lowercase());
        }
    }
    Ok(words)
}
