//! Startup inputs: everything read from disk before the first report.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use synoptic_ingest::{Lexicon, SectionRules};
use synoptic_model::{CategoryTable, CodeBook, ExclusionSet, Schema};
use synoptic_standards::{
    apply_regex_rules, apply_thresholds, load_category_table, load_code_book, load_exclusions,
    load_frequency_list, load_regex_rules, load_schema, load_thresholds, load_word_list,
};
use tracing::info;

use crate::options::PipelineOptions;

/// Locations of the startup inputs. Only the schema and the code book are
/// required; optional files that are named but missing get a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPaths {
    pub schema: PathBuf,
    pub code_book: PathBuf,
    pub thresholds: Option<PathBuf>,
    pub regex_rules: Option<PathBuf>,
    pub exclusions: Option<PathBuf>,
    pub categories: Option<PathBuf>,
    /// `word,count` list of domain words.
    pub frequency_list: Option<PathBuf>,
    /// Plain dictionary, one word per line.
    pub word_list: Option<PathBuf>,
    /// TOML override of the section anchors.
    pub section_rules: Option<PathBuf>,
}

/// Loaded startup inputs.
#[derive(Debug, Clone, Default)]
pub struct Resources {
    pub schema: Schema,
    pub code_book: CodeBook,
    pub exclusions: ExclusionSet,
    pub categories: CategoryTable,
    /// Present when at least one word list was given.
    pub lexicon: Option<Lexicon>,
    pub section_rules: Option<SectionRules>,
}

impl Resources {
    /// Resources built in memory, without optional inputs.
    pub fn new(schema: Schema, code_book: CodeBook) -> Self {
        Self {
            schema,
            code_book,
            ..Self::default()
        }
    }

    /// Reads every input. Malformed files fail with the offending row.
    pub fn load(paths: &InputPaths, options: &PipelineOptions) -> Result<Self> {
        let mut schema = load_schema(&paths.schema)
            .with_context(|| format!("load schema {}", paths.schema.display()))?;

        let tuned = match &paths.thresholds {
            Some(path) => load_thresholds(path, &schema)
                .with_context(|| format!("load thresholds {}", path.display()))?,
            None => Default::default(),
        };
        let untuned: Vec<String> = schema
            .canonical_names()
            .filter(|name| !tuned.contains_key(*name))
            .map(str::to_string)
            .collect();
        for name in untuned {
            if let Some(column) = schema.get_mut(&name) {
                column.threshold = options.default_threshold;
            }
        }
        apply_thresholds(&mut schema, &tuned);

        if let Some(path) = &paths.regex_rules {
            let rules = load_regex_rules(path, &schema)
                .with_context(|| format!("load regex rules {}", path.display()))?;
            apply_regex_rules(&mut schema, &rules);
        }

        let code_book = load_code_book(&paths.code_book)
            .with_context(|| format!("load code book {}", paths.code_book.display()))?;

        let exclusions = match &paths.exclusions {
            Some(path) => load_exclusions(path)
                .with_context(|| format!("load exclusions {}", path.display()))?,
            None => ExclusionSet::new(),
        };

        let categories = match &paths.categories {
            Some(path) => load_category_table(path)
                .with_context(|| format!("load category table {}", path.display()))?,
            None => CategoryTable::default(),
        };

        let domain = match &paths.frequency_list {
            Some(path) => Some(
                load_frequency_list(path, options.min_word_count)
                    .with_context(|| format!("load frequency list {}", path.display()))?,
            ),
            None => None,
        };
        let dictionary = match &paths.word_list {
            Some(path) => Some(
                load_word_list(path)
                    .with_context(|| format!("load word list {}", path.display()))?,
            ),
            None => None,
        };
        let lexicon = (domain.is_some() || dictionary.is_some())
            .then(|| Lexicon::build(domain.unwrap_or_default(), dictionary.unwrap_or_default()));

        let section_rules = match &paths.section_rules {
            Some(path) => Some(
                SectionRules::from_toml_file(path)
                    .with_context(|| format!("load section rules {}", path.display()))?,
            ),
            None => None,
        };

        info!(
            columns = schema.len(),
            exclusions = exclusions.len(),
            lexicon = lexicon.as_ref().map_or(0, Lexicon::len),
            "loaded startup inputs"
        );
        Ok(Self {
            schema,
            code_book,
            exclusions,
            categories,
            lexicon,
            section_rules,
        })
    }
}
