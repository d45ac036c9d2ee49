//! Two-tier expense-category suggestion from free receipt text.
//!
//! Tier one consults the caller's category table in order; tier two a
//! built-in rule set for installations with no keyword data yet. Matching is
//! case-insensitive substring containment, not word-boundary matching, so a
//! short keyword can over-match inside a longer word. That imprecision is
//! accepted: suggestions are reviewed by a human before anything is stored.

use resibo_core::{CategorySuggestion, ExpenseCategory};
use serde::Deserialize;

/// Fallback rules applied when no caller-supplied category matches.
/// Ordered: earlier entries win on multi-category text.
static DEFAULT_RULES: &[(&str, &[&str])] = &[
    // Transportation sits first: its keywords are brand names and rarely
    // wrong, while generic words like "office" over-match whole sentences.
    ("Transportation & Travel", &[
        "grab", "taxi", "uber", "fuel", "gas", "petrol",
        "diesel", "shell", "petron", "caltex", "travel",
        "airline", "bus", "toll", "parking",
    ]),
    ("Office Supplies", &[
        "paper", "ink", "toner", "stapler", "folder", "pen",
        "notebook", "office", "stationery",
    ]),
    ("Utilities", &[
        "meralco", "electric", "water", "maynilad", "manila water",
        "utility", "power",
    ]),
    ("Communication", &[
        "globe", "smart", "pldt", "converge", "internet",
        "telecom", "postpaid", "prepaid", "load",
    ]),
    ("Meals & Entertainment", &[
        "restaurant", "food", "meal", "jollibee", "mcdonalds",
        "mcdonald", "starbucks", "coffee", "catering",
        "dining", "eat", "snack",
    ]),
    ("Repairs & Maintenance", &[
        "repair", "maintenance", "service", "mechanic",
        "plumbing", "electrical", "aircon", "a/c",
    ]),
    ("Professional Fees", &[
        "legal", "accounting", "audit", "consultant",
        "professional fee", "atty", "attorney", "cpa",
    ]),
    ("Rent", &["rent", "lease", "rental"]),
    ("Advertising & Promotion", &[
        "advertising", "ads", "promo", "marketing",
        "signage", "print ad", "billboard",
    ]),
    ("Taxes & Licenses", &[
        "bir", "business permit", "license", "tax",
        "registration", "clearance", "barangay",
    ]),
    ("Insurance", &["insurance", "hmo", "health", "premium"]),
    ("Admin Expense", &["admin", "administrative", "miscellaneous"]),
];

/// Suggest exactly one category for the paragraph. Never fails: with no hit
/// in either tier the `Uncategorized` sentinel comes back.
pub fn suggest_category(paragraph: &str, categories: &[ExpenseCategory]) -> CategorySuggestion {
    let text = paragraph.to_lowercase();

    for cat in categories {
        for keyword in cat.keywords.split(',') {
            let keyword = keyword.trim().to_lowercase();
            if !keyword.is_empty() && text.contains(&keyword) {
                return CategorySuggestion { id: Some(cat.id), name: cat.name.clone() };
            }
        }
    }

    for (name, keywords) in DEFAULT_RULES {
        for keyword in *keywords {
            if text.contains(keyword) {
                // The static name may still exist in the caller's table.
                let id = categories.iter().find(|c| c.name == *name).map(|c| c.id);
                return CategorySuggestion { id, name: (*name).to_string() };
            }
        }
    }

    CategorySuggestion::uncategorized()
}

#[derive(Debug, Deserialize)]
struct CategoryFile {
    categories: Vec<ExpenseCategory>,
}

/// Load a category table from a TOML document with a `[[categories]]` array
/// of `{id, name, keywords}` tables.
pub fn categories_from_toml(toml_content: &str) -> Result<Vec<ExpenseCategory>, String> {
    let file: CategoryFile =
        toml::from_str(toml_content).map_err(|e| format!("Failed to parse TOML: {e}"))?;
    Ok(file.categories)
}
