//! A single clause of a narrow.

use serde::{Deserialize, Serialize};

/// One `(negated, operator, operand)` clause of a filter.
///
/// Operators are an open set: anything the parser accepts is stored as
/// text, and canonicalization decides what the predicate understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Term {
    #[serde(default)]
    pub negated: bool,
    pub operator: String,
    pub operand: String,
}

impl Term {
    #[must_use]
    pub fn new(operator: impl Into<String>, operand: impl Into<String>) -> Self {
        Self {
            negated: false,
            operator: operator.into(),
            operand: operand.into(),
        }
    }

    #[must_use]
    pub fn negated(operator: impl Into<String>, operand: impl Into<String>) -> Self {
        Self {
            negated: true,
            operator: operator.into(),
            operand: operand.into(),
        }
    }

    #[must_use]
    pub fn is(&self, operator: &str) -> bool {
        !self.negated && self.operator == operator
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.negated { "-" } else { "" };
        write!(f, "{sign}{}:{}", self.operator, self.operand)
    }
}
