use std::collections::BTreeMap;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use crate::types::RunResult;

/// Longest id list printed inline before it is shortened.
const MAX_LISTED_IDS: usize = 12;

pub fn print_summary(result: &RunResult) {
    let batch = &result.batch;
    println!(
        "Report type: {} ({})",
        result.report_type,
        result.report_type.description()
    );
    println!("Raw values: {}", result.outputs.raw.display());
    println!("Codes: {}", result.outputs.coded.display());
    println!("Audit: {}", result.outputs.audit.display());

    let mut table = Table::new();
    table.set_header(vec![header_cell("Measure"), header_cell("Count")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Source reports"), Cell::new(batch.sources)]);
    table.add_row(vec![Cell::new("Rows written"), Cell::new(result.rows)]);
    table.add_row(vec![
        Cell::new("Bilateral splits"),
        count_cell(batch.splits, Color::Blue),
    ]);
    table.add_row(vec![
        Cell::new("No synoptic section"),
        count_cell(batch.no_synoptic.len(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Mostly missing"),
        count_cell(batch.mostly_missing.len(), Color::Yellow),
    ]);
    table.add_row(vec![
        Cell::new("Label rewrites"),
        count_cell(batch.audit.len(), Color::Blue),
    ]);
    table.add_row(vec![
        Cell::new("Malfunction cells"),
        count_cell(batch.malfunctions.len(), Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Failed reports"),
        count_cell(batch.failed.len(), Color::Red),
    ]);
    table.add_row(vec![
        Cell::new("Elapsed (s)")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        Cell::new(format!("{:.2}", result.elapsed.as_secs_f64())).add_attribute(Attribute::Bold),
    ]);
    println!("{table}");

    if !batch.no_synoptic.is_empty() {
        println!("No synoptic section: {}", id_list(&batch.no_synoptic));
    }
    print_malfunction_table(result);
    if !batch.failed.is_empty() {
        eprintln!("Errors:");
        for (id, error) in &batch.failed {
            eprintln!("- {id}: {error}");
        }
    }
}

/// Malfunction cells grouped by column.
fn print_malfunction_table(result: &RunResult) {
    let mut by_column: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (id, column) in &result.batch.malfunctions {
        by_column.entry(column).or_default().push(id);
    }
    if by_column.is_empty() {
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Cells"),
        header_cell("Reports"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (column, ids) in by_column {
        let ids: Vec<String> = ids.into_iter().map(str::to_string).collect();
        table.add_row(vec![
            Cell::new(column).fg(Color::Blue).add_attribute(Attribute::Bold),
            Cell::new(ids.len()).fg(Color::Red),
            Cell::new(id_list(&ids)),
        ]);
    }
    println!();
    println!("Malfunctions:");
    println!("{table}");
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(80);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn id_list(ids: &[String]) -> String {
    if ids.len() <= MAX_LISTED_IDS {
        return ids.join(", ");
    }
    format!(
        "{} and {} more",
        ids[..MAX_LISTED_IDS].join(", "),
        ids.len() - MAX_LISTED_IDS
    )
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_id_lists_are_shortened() {
        let ids: Vec<String> = (1..=15).map(|n| n.to_string()).collect();
        assert_eq!(
            id_list(&ids),
            "1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12 and 3 more"
        );
        assert_eq!(id_list(&ids[..2]), "1, 2");
    }
}
