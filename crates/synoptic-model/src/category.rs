//! TNM category table used by stage repair.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TnmCategory {
    T,
    N,
    M,
}

impl TnmCategory {
    pub fn letter(&self) -> char {
        match self {
            TnmCategory::T => 'T',
            TnmCategory::N => 'N',
            TnmCategory::M => 'M',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_uppercase() {
            'T' => Some(TnmCategory::T),
            'N' => Some(TnmCategory::N),
            'M' => Some(TnmCategory::M),
            _ => None,
        }
    }
}

/// Valid stage codes per category, e.g. `T1a`, `N1mi`, `M0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTable {
    pub t: Vec<String>,
    pub n: Vec<String>,
    pub m: Vec<String>,
}

impl CategoryTable {
    pub fn entries(&self, category: TnmCategory) -> &[String] {
        match category {
            TnmCategory::T => &self.t,
            TnmCategory::N => &self.n,
            TnmCategory::M => &self.m,
        }
    }

    pub fn push(&mut self, category: TnmCategory, code: impl Into<String>) {
        let code = code.into();
        match category {
            TnmCategory::T => self.t.push(code),
            TnmCategory::N => self.n.push(code),
            TnmCategory::M => self.m.push(code),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.t.is_empty() && self.n.is_empty() && self.m.is_empty()
    }
}
