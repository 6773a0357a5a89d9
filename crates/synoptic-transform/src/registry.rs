//! Named transform registry.
//!
//! Transforms are registered once at startup and looked up by name, either
//! to clean a column's value or to compute a `-1` code-book column.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use synoptic_model::{CategoryTable, ReportType, Value, transform_key};

use crate::computed::{HistologicGrade, NottinghamScore, Reconstruction};
use crate::error::{Result, TransformError};
use crate::measure::{ClockPosition, Millimetres};
use crate::stage::TnmStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformKind {
    /// Replaces the default cleaning of a column's value.
    Cleaning,
    /// Produces the code of a computed code-book column.
    Computed,
}

/// Columns holding the Nottingham subscores and total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NottinghamColumns {
    pub tubule: String,
    pub nuclear: String,
    pub mitotic: String,
    pub score: String,
}

impl Default for NottinghamColumns {
    fn default() -> Self {
        Self {
            tubule: "Glandular (Acinar)/Tubular Differentiation".into(),
            nuclear: "Nuclear Pleomorphism".into(),
            mitotic: "Mitotic Rate".into(),
            score: "Nottingham Score".into(),
        }
    }
}

/// Read-only data shared by all transforms of a run.
#[derive(Debug, Clone, Default)]
pub struct TransformContext {
    pub categories: CategoryTable,
    pub nottingham: NottinghamColumns,
}

/// Arguments of one transform call.
#[derive(Debug, Clone, Copy)]
pub struct TransformInput<'a> {
    pub column: &'a str,
    pub value: &'a Value,
    /// Codes of the columns encoded so far.
    pub encoded: &'a BTreeMap<String, String>,
    pub report_type: ReportType,
    pub context: &'a TransformContext,
}

pub trait Transform: Send + Sync {
    /// Registry key, as written in the code book.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn kind(&self) -> TransformKind;

    fn apply(&self, input: &TransformInput<'_>) -> Result<String>;
}

/// Transforms indexed by name.
#[derive(Default)]
pub struct TransformRegistry {
    transforms: BTreeMap<&'static str, Box<dyn Transform>>,
}

impl std::fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("transforms", &self.transforms.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a transform. A transform with the same name is replaced.
    pub fn register(&mut self, transform: Box<dyn Transform>) {
        self.transforms.insert(transform.name(), transform);
    }

    /// Looks a transform up by name; spacing, case and `-`/`_` are ignored.
    pub fn get(&self, name: &str) -> Option<&dyn Transform> {
        self.transforms
            .get(transform_key(name).as_str())
            .map(|t| t.as_ref())
    }

    pub fn apply(&self, name: &str, input: &TransformInput<'_>) -> Result<String> {
        let transform = self
            .get(name)
            .ok_or_else(|| TransformError::UnknownTransform(name.to_string()))?;
        transform.apply(input)
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Registered names, as expected by code-book resolution.
    pub fn names(&self) -> BTreeSet<String> {
        self.transforms.keys().map(|k| (*k).to_string()).collect()
    }
}

static DEFAULT_REGISTRY: OnceLock<TransformRegistry> = OnceLock::new();

/// Registry with every built-in transform.
pub fn default_registry() -> &'static TransformRegistry {
    DEFAULT_REGISTRY.get_or_init(build_default_registry)
}

fn build_default_registry() -> TransformRegistry {
    let mut registry = TransformRegistry::new();
    registry.register(Box::new(TnmStage));
    registry.register(Box::new(Millimetres));
    registry.register(Box::new(ClockPosition));
    registry.register(Box::new(NottinghamScore));
    registry.register(Box::new(HistologicGrade));
    registry.register(Box::new(Reconstruction));
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_names_are_keys() {
        let registry = default_registry();
        assert_eq!(registry.len(), 6);
        for name in registry.names() {
            assert_eq!(transform_key(&name), name);
        }
        assert!(registry.get("Nottingham Score").is_some());
        assert!(registry.get("clock-position").is_some());
        assert!(registry.get("unknown").is_none());
    }
}
