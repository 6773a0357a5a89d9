//! TNM stage repair against the category table.

use std::sync::LazyLock;

use rapidfuzz::distance::levenshtein;
use regex::Regex;
use synoptic_model::{CategoryTable, TnmCategory};
use tracing::trace;

use crate::error::{Result, TransformError};
use crate::registry::{Transform, TransformInput, TransformKind};

/// A category letter and what follows it up to the next category, space or
/// list punctuation. Lowercase descriptors (`p`, `y`, `m`, ...) fall outside.
static STAGE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[TNM][^\sTNM,;]*").expect("Invalid stage token regex"));

/// Nearest table entry of the token's category.
fn repair_token(token: &str, table: &CategoryTable) -> Option<String> {
    let category = TnmCategory::from_letter(token.chars().next()?)?;
    let token_len = token.chars().count();
    let max_distance = (token_len.div_ceil(3)).max(1);
    let mut best: Option<(&String, usize)> = None;
    for entry in table.entries(category) {
        let distance = levenshtein::distance(token.chars(), entry.chars());
        if distance <= max_distance && best.is_none_or(|(_, current)| distance < current) {
            best = Some((entry, distance));
        }
    }
    best.map(|(entry, _)| entry.clone())
}

/// Repairs an OCR-damaged stage string: `mpTla pNlmi` becomes `T1a N1mi`.
pub fn repair_stage(raw: &str, table: &CategoryTable) -> Result<String> {
    let repaired: Vec<String> = STAGE_TOKEN
        .find_iter(raw)
        .filter_map(|m| {
            let token = m.as_str().trim_end_matches(['.', ')']);
            let fixed = repair_token(token, table);
            trace!(token, fixed = ?fixed, "stage token");
            fixed
        })
        .collect();
    if repaired.is_empty() {
        return Err(TransformError::invalid(
            "tnm_stage",
            raw,
            "no stage category matches the table",
        ));
    }
    Ok(repaired.join(" "))
}

pub struct TnmStage;

impl Transform for TnmStage {
    fn name(&self) -> &'static str {
        "tnm_stage"
    }

    fn description(&self) -> &'static str {
        "Pathologic TNM stage repaired against the category table"
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Cleaning
    }

    fn apply(&self, input: &TransformInput<'_>) -> Result<String> {
        repair_stage(&input.value.primary, &input.context.categories)
    }
}
