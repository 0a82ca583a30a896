//! Name similarity between a view and its candidate tables.
//!
//! View names and table names often differ only in plurality or prefixes
//! (`order_items` vs `order_item`, `fact_orders` vs `orders`). Names are
//! split into tokens, each token singularized with the `inflector` crate
//! plus a small table of irregular plurals, and the normalized forms are
//! compared with a Sørensen–Dice coefficient over character bigrams.

use std::collections::HashMap;

use inflector::Inflector;

/// Irregular plurals that inflector doesn't handle well for schema names.
static IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("analysis", "analyses"),
    ("criterion", "criteria"),
    ("datum", "data"),
    ("medium", "media"),
    ("index", "indices"),
    ("matrix", "matrices"),
    ("status", "statuses"),
];

/// Singularize a word, handling irregulars first then falling back to inflector.
pub fn singularize(word: &str) -> String {
    if word.is_empty() {
        return String::new();
    }

    let lower = word.to_lowercase();

    for (singular, plural) in IRREGULAR_PLURALS {
        if lower == *plural || lower == *singular {
            return singular.to_string();
        }
    }

    lower.to_singular()
}

/// Lowercase, split on `_`/`-`/`.`, singularize each alphabetic token.
///
/// Purely numeric tokens (version or shard numbers) are dropped.
pub fn normalize_name(name: &str) -> String {
    name.split(|c: char| c == '_' || c == '-' || c == '.')
        .filter(|t| !t.is_empty() && !t.chars().all(|c| c.is_ascii_digit()))
        .map(singularize)
        .collect::<Vec<_>>()
        .join("_")
}

/// Similarity in `[0.0, 1.0]` between two names; 1.0 means equal after normalization.
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_name(a);
    let b = normalize_name(b);

    if a == b {
        return 1.0;
    }
    if a.len() < 2 || b.len() < 2 {
        return 0.0;
    }

    let mut bigrams: HashMap<(char, char), usize> = HashMap::new();
    let a_chars: Vec<char> = a.chars().collect();
    for pair in a_chars.windows(2) {
        *bigrams.entry((pair[0], pair[1])).or_insert(0) += 1;
    }

    let b_chars: Vec<char> = b.chars().collect();
    let mut shared = 0usize;
    for pair in b_chars.windows(2) {
        if let Some(count) = bigrams.get_mut(&(pair[0], pair[1])) {
            if *count > 0 {
                *count -= 1;
                shared += 1;
            }
        }
    }

    let total = (a_chars.len() - 1) + (b_chars.len() - 1);
    (2 * shared) as f64 / total as f64
}
