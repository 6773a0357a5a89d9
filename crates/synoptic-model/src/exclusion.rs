//! User-curated forbidden `(raw_label, canonical)` rewrites.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::text::clean_label_key;

/// Pairs the normalizer must never rewrite, compared in cleaned form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionSet {
    pairs: BTreeSet<(String, String)>,
}

impl ExclusionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, raw_label: &str, canonical: &str) -> bool {
        self.pairs.insert(key(raw_label, canonical))
    }

    pub fn remove(&mut self, raw_label: &str, canonical: &str) -> bool {
        self.pairs.remove(&key(raw_label, canonical))
    }

    pub fn is_excluded(&self, raw_label: &str, canonical: &str) -> bool {
        self.pairs.contains(&key(raw_label, canonical))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(l, c)| (l.as_str(), c.as_str()))
    }
}

impl<L: AsRef<str>, C: AsRef<str>> FromIterator<(L, C)> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = (L, C)>>(iter: I) -> Self {
        let mut set = ExclusionSet::new();
        for (label, canonical) in iter {
            set.insert(label.as_ref(), canonical.as_ref());
        }
        set
    }
}

fn key(raw_label: &str, canonical: &str) -> (String, String) {
    (clean_label_key(raw_label), clean_label_key(canonical))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_punctuation() {
        let set: ExclusionSet = [("Receptor", "Closest Margin")].into_iter().collect();
        assert!(set.is_excluded("receptor:", "closest margin"));
        assert!(!set.is_excluded("receptor", "margins"));
    }
}
