use serde::{Deserialize, Serialize};

/// An expense category the classifier can assign.
///
/// `keywords` is a comma-separated list; matching is done on the
/// lowercased receipt text, first category with a hit wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: i64,
    pub name: String,
    pub keywords: String,
}

impl ExpenseCategory {
    pub fn new(id: i64, name: impl Into<String>, keywords: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            keywords: keywords.into(),
        }
    }
}

/// Classifier verdict for one document. `id` is `None` when the match
/// came from the built-in fallback rules or nothing matched at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySuggestion {
    pub id: Option<i64>,
    pub name: String,
}

impl CategorySuggestion {
    /// Sentinel returned when no rule matched.
    pub fn uncategorized() -> Self {
        Self {
            id: None,
            name: "Uncategorized".to_string(),
        }
    }
}

impl Default for CategorySuggestion {
    fn default() -> Self {
        Self::uncategorized()
    }
}
