//! Code-book spreadsheet loader: rows of `(canonical_column, code, synonyms)`.

use std::path::Path;

use synoptic_model::{CodeBook, Encoding};
use tracing::info;

use crate::error::StandardsError;
use crate::table::{read_table, split_list};

/// Loads the code book in row order. `-1` entries are classified later by
/// [`CodeBook::resolve`], once the transform registry is known.
pub fn load_code_book(path: &Path) -> Result<CodeBook, StandardsError> {
    let table = read_table(path)?;
    let column_key = if table.headers.iter().any(|h| h == "canonical_column") {
        "canonical_column"
    } else {
        table.require(path, "column")?;
        "column"
    };
    table.require(path, "code")?;
    table.require(path, "synonyms")?;

    let mut book = CodeBook::new();
    let mut entries = 0usize;
    for row in &table.rows {
        let column = row.get(column_key);
        if column.is_empty() {
            return Err(StandardsError::malformed(path, row.number, "empty column name"));
        }
        let raw_code = row.get("code");
        let code = parse_code(raw_code).ok_or_else(|| {
            StandardsError::malformed(path, row.number, format!("code '{raw_code}' is not an integer"))
        })?;
        let synonyms = split_list(row.get("synonyms"));
        if synonyms.is_empty() {
            return Err(StandardsError::malformed(
                path,
                row.number,
                format!("no synonyms for code {code} of '{column}'"),
            ));
        }
        book.push(column, Encoding::new(synonyms, code).with_row(row.number));
        entries += 1;
    }
    info!(path = %path.display(), entries, "loaded code book");
    Ok(book)
}

fn parse_code(raw: &str) -> Option<i64> {
    if let Ok(code) = raw.parse::<i64>() {
        return Some(code);
    }
    // Spreadsheets store integers as floats.
    raw.parse::<f64>()
        .ok()
        .filter(|v| v.fract() == 0.0)
        .map(|v| v as i64)
}

#[cfg(test)]
mod tests {
    use super::parse_code;

    #[test]
    fn codes_accept_integral_floats() {
        assert_eq!(parse_code("-1"), Some(-1));
        assert_eq!(parse_code("2.0"), Some(2));
        assert_eq!(parse_code("2.5"), None);
        assert_eq!(parse_code("yes"), None);
    }
}
