//! TNM category table: one column per category (`T`, `N`, `M`).

use std::path::Path;

use synoptic_model::{CategoryTable, TnmCategory};

use crate::error::StandardsError;
use crate::table::read_table;

pub fn load_category_table(path: &Path) -> Result<CategoryTable, StandardsError> {
    let table = read_table(path)?;
    let mut categories = CategoryTable::default();
    for category in [TnmCategory::T, TnmCategory::N, TnmCategory::M] {
        let header = category.letter().to_ascii_lowercase().to_string();
        table.require(path, &header)?;
        for row in &table.rows {
            if let Some(code) = row.optional(&header) {
                categories.push(category, code);
            }
        }
    }
    Ok(categories)
}
