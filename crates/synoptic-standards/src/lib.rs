#![deny(unsafe_code)]

pub mod audit;
pub mod category;
pub mod codebook;
pub mod error;
pub mod exclusions;
pub mod lexicon;
pub mod regex_rules;
pub mod schema;
pub mod table;
pub mod thresholds;

pub use crate::audit::save_audit;
pub use crate::category::load_category_table;
pub use crate::codebook::load_code_book;
pub use crate::error::StandardsError;
pub use crate::exclusions::{load_exclusions, save_exclusions};
pub use crate::lexicon::{load_frequency_list, load_word_list};
pub use crate::regex_rules::{apply_regex_rules, load_regex_rules};
pub use crate::schema::load_schema;
pub use crate::thresholds::{apply_thresholds, load_thresholds};
