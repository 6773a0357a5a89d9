//! Code-book encoder.
//!
//! Lookup columns are encoded first, in schema order, by matching candidate
//! phrases of the value against the synonyms of each encoding. Dependency
//! and computed columns follow, also in schema order, and read the codes
//! produced so far.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use synoptic_model::{
    CodeBook, Column, EncodingMode, MALFUNCTION_CODE, ReportType, Schema, Value,
};
use synoptic_transform::{TransformContext, TransformInput, TransformRegistry};
use tracing::{debug, trace, warn};

use crate::candidates::candidates;
use crate::embedder::{Embedder, NgramEmbedder};
use crate::error::{EncodeError, Result};

/// Threshold used for every column in training mode.
pub const DEFAULT_TRAINING_FLOOR: f32 = 0.6;

/// Similarity treated as an exact match.
const EXACT_SIMILARITY: f32 = 1.0 - 1e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderOptions {
    /// Accept matches down to `training_floor` instead of the column threshold.
    pub training: bool,
    pub training_floor: f32,
}

impl Default for EncoderOptions {
    fn default() -> Self {
        Self {
            training: false,
            training_floor: DEFAULT_TRAINING_FLOOR,
        }
    }
}

/// Codes of one section, keyed by canonical column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Encoded {
    pub codes: BTreeMap<String, String>,
    /// Columns whose transform failed.
    pub malfunctions: Vec<String>,
}

#[derive(Debug, Clone)]
struct Synonym {
    text: String,
    vector: Vec<f32>,
}

#[derive(Debug, Clone)]
struct Entry {
    code: String,
    synonyms: Vec<Synonym>,
}

/// Best match of one side (primary or alternative) of a value.
#[derive(Debug, Clone, PartialEq)]
enum SideMatch {
    Exact(String),
    Scored(String, f32),
    Nothing,
}

/// True when `needle` occurs in `haystack` on word boundaries.
fn contains_phrase(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub struct Encoder<E: Embedder = NgramEmbedder> {
    schema: Schema,
    code_book: CodeBook,
    embedder: E,
    options: EncoderOptions,
    entries: BTreeMap<String, Vec<Entry>>,
}

impl<E: Embedder> std::fmt::Debug for Encoder<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Encoder")
            .field("embedder", &self.embedder.name())
            .field("columns", &self.schema.len())
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Encoder<NgramEmbedder> {
    /// Encoder with the built-in n-gram embedder.
    pub fn with_default_embedder(
        schema: Schema,
        code_book: CodeBook,
        registry: &TransformRegistry,
        options: EncoderOptions,
    ) -> Result<Self> {
        Self::new(schema, code_book, registry, NgramEmbedder::default(), options)
    }
}

impl<E: Embedder> Encoder<E> {
    /// Resolves the code book against the schema and the registry, and
    /// embeds every synonym once.
    pub fn new(
        schema: Schema,
        mut code_book: CodeBook,
        registry: &TransformRegistry,
        embedder: E,
        options: EncoderOptions,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&options.training_floor) {
            return Err(EncodeError::TrainingFloor(options.training_floor));
        }
        code_book.resolve(&schema, &registry.names())?;

        let mut entries = BTreeMap::new();
        for column in code_book.columns() {
            if code_book.mode(column) != &EncodingMode::Lookup {
                continue;
            }
            let list: Vec<Entry> = code_book
                .encodings(column)
                .iter()
                .map(|encoding| Entry {
                    code: encoding.code.to_string(),
                    synonyms: encoding
                        .synonyms
                        .iter()
                        .map(|s| normalize(s))
                        .filter(|s| !s.is_empty())
                        .map(|text| Synonym {
                            vector: embedder.embed(&text),
                            text,
                        })
                        .collect(),
                })
                .collect();
            entries.insert(column.to_string(), list);
        }
        debug!(
            embedder = embedder.name(),
            columns = entries.len(),
            training = options.training,
            "encoder ready"
        );

        Ok(Self {
            schema,
            code_book,
            embedder,
            options,
            entries,
        })
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn code_book(&self) -> &CodeBook {
        &self.code_book
    }

    pub fn options(&self) -> EncoderOptions {
        self.options
    }

    /// Acceptance threshold of a column.
    pub fn threshold(&self, column: &Column) -> f32 {
        if self.options.training {
            self.options.training_floor
        } else {
            column.threshold
        }
    }

    fn match_side(&self, entries: &[Entry], text: &str, threshold: f32) -> SideMatch {
        let phrases: Vec<String> = candidates(text).iter().map(|c| normalize(c)).collect();
        if phrases.is_empty() {
            return SideMatch::Nothing;
        }

        let mut best: Option<(&str, f32)> = None;
        for phrase in &phrases {
            let vector = self.embedder.embed(phrase);
            for entry in entries {
                for synonym in &entry.synonyms {
                    let score = self.embedder.similarity(&vector, &synonym.vector);
                    if synonym.text == *phrase || score >= EXACT_SIMILARITY {
                        return SideMatch::Exact(entry.code.clone());
                    }
                    if best.is_none_or(|(_, current)| score > current) {
                        best = Some((entry.code.as_str(), score));
                    }
                }
            }
        }

        // Literal containment; the longest contained synonym wins.
        let mut contained: Option<(&str, usize)> = None;
        for phrase in &phrases {
            for entry in entries {
                for synonym in &entry.synonyms {
                    let len = synonym.text.len();
                    if contains_phrase(phrase, &synonym.text)
                        && contained.is_none_or(|(_, current)| len > current)
                    {
                        contained = Some((entry.code.as_str(), len));
                    }
                }
            }
        }
        if let Some((code, _)) = contained {
            return SideMatch::Exact(code.to_string());
        }

        match best {
            Some((code, score)) if score >= threshold => SideMatch::Scored(code.to_string(), score),
            _ => SideMatch::Nothing,
        }
    }

    /// Code of a lookup column. A column without encodings keeps its value.
    pub fn encode_lookup(&self, column: &Column, value: &Value) -> String {
        let entries = match self.entries.get(&column.canonical) {
            Some(entries) if !entries.is_empty() => entries,
            _ => {
                let primary = value.primary.trim();
                return if primary.is_empty() {
                    value.first_alternative().unwrap_or_default().trim().to_string()
                } else {
                    primary.to_string()
                };
            }
        };
        let threshold = self.threshold(column);
        let primary = self.match_side(entries, &value.primary, threshold);
        let alternative = value
            .first_alternative()
            .map_or(SideMatch::Nothing, |alt| self.match_side(entries, alt, threshold));
        trace!(column = %column.canonical, ?primary, ?alternative, "lookup");

        match (primary, alternative) {
            (SideMatch::Exact(code), _) | (_, SideMatch::Exact(code)) => code,
            (SideMatch::Scored(code, _), _) | (_, SideMatch::Scored(code, _)) => code,
            (SideMatch::Nothing, SideMatch::Nothing) => String::new(),
        }
    }

    /// Encodes every schema column. Missing values encode as `""`; a failing
    /// transform yields the malfunction code for its column only.
    pub fn encode(
        &self,
        values: &BTreeMap<String, Value>,
        registry: &TransformRegistry,
        context: &TransformContext,
        report_type: ReportType,
    ) -> Encoded {
        let empty = Value::empty();
        let mut encoded = Encoded::default();

        for column in self.schema.columns() {
            if self.code_book.mode(&column.canonical) != &EncodingMode::Lookup {
                continue;
            }
            let value = values.get(&column.canonical).unwrap_or(&empty);
            let code = self.encode_lookup(column, value);
            encoded.codes.insert(column.canonical.clone(), code);
        }

        for column in self.schema.columns() {
            let code = match self.code_book.mode(&column.canonical) {
                EncodingMode::Lookup => continue,
                EncodingMode::Dependency { column: source } => {
                    let source_code = encoded.codes.get(source).map_or("", |c| c.trim());
                    if source_code.is_empty() || source_code == "0" {
                        "0".to_string()
                    } else {
                        "1".to_string()
                    }
                }
                EncodingMode::Computed { transform } => {
                    let input = TransformInput {
                        column: &column.canonical,
                        value: values.get(&column.canonical).unwrap_or(&empty),
                        encoded: &encoded.codes,
                        report_type,
                        context,
                    };
                    match registry.apply(transform, &input) {
                        Ok(code) => code,
                        Err(err) => {
                            warn!(
                                column = %column.canonical,
                                transform = %transform,
                                error = %err,
                                "computed column failed"
                            );
                            encoded.malfunctions.push(column.canonical.clone());
                            MALFUNCTION_CODE.to_string()
                        }
                    }
                }
            };
            encoded.codes.insert(column.canonical.clone(), code);
        }
        encoded
    }
}
