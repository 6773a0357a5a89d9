//! Report ingestion: file discovery, OCR vocabulary repair, and synoptic
//! section isolation.

pub mod discovery;
pub mod error;
pub mod section;
pub mod vocabulary;

pub use discovery::{DiscoveryOptions, ReportFile, discover_reports, read_report, report_number};
pub use error::{IngestError, Result};
pub use section::{AnchorPair, Isolation, Section, SectionIsolator, SectionRules, SideMarkers};
pub use vocabulary::{Lexicon, STOP_WORDS, VocabularyResolver};
