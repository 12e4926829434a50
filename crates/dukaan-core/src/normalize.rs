//! # Name Normalization
//!
//! Maps spoken item and category names onto a small, stable key space so
//! that "आलू", "aloo", "Potatoes" and "potahto" all land on one ledger entry.
//!
//! ## Item Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  raw ──► lowercase + trim ──► synonym table? ──────────────► hit       │
//! │                                    │ miss                               │
//! │                                    ▼                                    │
//! │                              singularize ──► synonym table? ──► hit    │
//! │                                    │ miss                               │
//! │                                    ▼                                    │
//! │                     best edit-distance ratio vs canonicals             │
//! │                                    │                                    │
//! │                          ≥ 0.8 ──► canonical                           │
//! │                          < 0.8 ──► singular form (new key)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Categories stop after the table lookup and fall back to `"other"`.
//!
//! The engine is pure: the same input always yields the same key for a fixed
//! table, and `normalize_item(normalize_item(x)) == normalize_item(x)`.

use std::collections::{BTreeSet, HashMap};

/// Minimum similarity ratio for a fuzzy match to be accepted.
pub const FUZZY_THRESHOLD: f64 = 0.8;

/// Category assigned when the spoken category is unknown or blank.
pub const FALLBACK_CATEGORY: &str = "other";

// =============================================================================
// Synonym Tables
// =============================================================================

/// Item spellings (Devanagari, transliterated, typo'd) → canonical key.
pub const ITEM_SYNONYMS: &[(&str, &str)] = &[
    // Vegetables
    ("आलू", "potato"),
    ("aloo", "potato"),
    ("aaloo", "potato"),
    ("alu", "potato"),
    ("प्याज", "onion"),
    ("pyaaz", "onion"),
    ("pyaz", "onion"),
    ("पियाज", "onion"),
    ("टमाटर", "tomato"),
    ("tamatar", "tomato"),
    ("tamater", "tomato"),
    ("टोमेटो", "tomato"),
    ("भिंडी", "okra"),
    ("bhindi", "okra"),
    ("बैंगन", "eggplant"),
    ("baingan", "eggplant"),
    ("गोभी", "cauliflower"),
    ("gobhi", "cauliflower"),
    ("पत्तागोभी", "cabbage"),
    ("pattagobhi", "cabbage"),
    ("पालक", "spinach"),
    ("palak", "spinach"),
    ("गाजर", "carrot"),
    ("gajar", "carrot"),
    ("मूली", "radish"),
    ("mooli", "radish"),
    // Grains & pulses
    ("चावल", "rice"),
    ("chawal", "rice"),
    ("चाबल", "rice"),
    ("आटा", "wheat_flour"),
    ("atta", "wheat_flour"),
    ("आटे", "wheat_flour"),
    ("मैदा", "refined_flour"),
    ("maida", "refined_flour"),
    ("दाल", "lentil"),
    ("dal", "lentil"),
    ("बेसन", "gram_flour"),
    ("besan", "gram_flour"),
    // Groceries
    ("चीनी", "sugar"),
    ("cheeni", "sugar"),
    ("chini", "sugar"),
    ("शक्कर", "sugar"),
    ("shakkar", "sugar"),
    ("नमक", "salt"),
    ("namak", "salt"),
    ("तेल", "oil"),
    ("tel", "oil"),
    ("घी", "ghee"),
    ("ghee", "ghee"),
    ("दूध", "milk"),
    ("doodh", "milk"),
    ("dudh", "milk"),
    ("दही", "yogurt"),
    ("dahi", "yogurt"),
    ("मक्खन", "butter"),
    ("makkhan", "butter"),
    // Spices
    ("मसाला", "spice"),
    ("masala", "spice"),
    ("मिर्च", "chili"),
    ("mirch", "chili"),
    ("हल्दी", "turmeric"),
    ("haldi", "turmeric"),
    ("धनिया", "coriander"),
    ("dhaniya", "coriander"),
    ("जीरा", "cumin"),
    ("jeera", "cumin"),
    // Common English plurals and typos
    ("potatoes", "potato"),
    ("potatos", "potato"),
    ("potahto", "potato"),
    ("onions", "onion"),
    ("tomatoes", "tomato"),
    ("tomatos", "tomato"),
];

/// Expense category spellings → canonical category.
pub const CATEGORY_SYNONYMS: &[(&str, &str)] = &[
    ("bijli", "electricity"),
    ("बिजली", "electricity"),
    ("बिज्ली", "electricity"),
    ("electric", "electricity"),
    ("electricity", "electricity"),
    ("light bill", "electricity"),
    ("kiraya", "rent"),
    ("किराया", "rent"),
    ("किराय", "rent"),
    ("rent", "rent"),
    ("transport", "transport"),
    ("ट्रांसपोर्ट", "transport"),
    ("गाड़ी", "transport"),
    ("gaadi", "transport"),
    ("petrol", "transport"),
    ("diesel", "transport"),
    ("mazdoori", "labor"),
    ("मजदूरी", "labor"),
    ("labor", "labor"),
    ("labour", "labor"),
    ("worker", "labor"),
    ("phone", "phone"),
    ("फोन", "phone"),
    ("recharge", "phone"),
    ("रिचार्ज", "phone"),
    ("mobile", "phone"),
    ("paani", "water"),
    ("पानी", "water"),
    ("water", "water"),
    ("safai", "cleaning"),
    ("सफाई", "cleaning"),
    ("cleaning", "cleaning"),
    ("other", "other"),
    ("अन्य", "other"),
    ("misc", "other"),
];

// =============================================================================
// Normalization Engine
// =============================================================================

/// Canonicalizes item and category names.
#[derive(Debug, Clone)]
pub struct NormalizationEngine {
    items: HashMap<String, String>,
    categories: HashMap<String, String>,
    /// Distinct canonical item keys in table order. Fuzzy matching walks this
    /// list, so the first maximum wins on ties.
    canonical_items: Vec<String>,
}

impl Default for NormalizationEngine {
    fn default() -> Self {
        NormalizationEngine::with_tables(ITEM_SYNONYMS, CATEGORY_SYNONYMS)
    }
}

impl NormalizationEngine {
    /// Engine over the built-in multilingual vocabulary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine over caller-supplied tables.
    ///
    /// Table keys are cleaned the same way inputs are, so a table may list
    /// "Light Bill" and still match "light bill".
    pub fn with_tables(items: &[(&str, &str)], categories: &[(&str, &str)]) -> Self {
        let mut canonical_items: Vec<String> = Vec::new();
        let mut item_map = HashMap::with_capacity(items.len());

        for (spelling, canonical) in items {
            item_map.insert(clean(spelling), canonical.to_string());
            if !canonical_items.iter().any(|c| c == canonical) {
                canonical_items.push(canonical.to_string());
            }
        }

        let category_map = categories
            .iter()
            .map(|(spelling, canonical)| (clean(spelling), canonical.to_string()))
            .collect();

        NormalizationEngine {
            items: item_map,
            categories: category_map,
            canonical_items,
        }
    }

    /// Maps a raw item name to its canonical key.
    ///
    /// Blank input yields an empty key; the ledger rejects it downstream.
    ///
    /// ## Example
    /// ```rust
    /// use dukaan_core::normalize::NormalizationEngine;
    ///
    /// let engine = NormalizationEngine::new();
    /// assert_eq!(engine.normalize_item("आलू"), "potato");
    /// assert_eq!(engine.normalize_item(" Potatoes "), "potato");
    /// assert_eq!(engine.normalize_item("potahto"), "potato");
    /// assert_eq!(engine.normalize_item("biscuits"), "biscuit");
    /// ```
    pub fn normalize_item(&self, raw: &str) -> String {
        let cleaned = clean(raw);
        if cleaned.is_empty() {
            return cleaned;
        }

        if let Some(canonical) = self.items.get(&cleaned) {
            return canonical.clone();
        }

        let singular = singularize(&cleaned);
        if let Some(canonical) = self.items.get(&singular) {
            return canonical.clone();
        }

        if let Some(canonical) = self.fuzzy_match(&singular) {
            return canonical.to_string();
        }

        singular
    }

    /// Maps a raw expense category to its canonical key, or `"other"`.
    ///
    /// No fuzzy step: the taxonomy is closed and guesses would misfile money.
    pub fn normalize_category(&self, raw: &str) -> String {
        let cleaned = clean(raw);

        self.categories
            .get(&cleaned)
            .cloned()
            .unwrap_or_else(|| FALLBACK_CATEGORY.to_string())
    }

    /// Sorted canonical item keys the table knows about.
    pub fn known_items(&self) -> Vec<String> {
        self.canonical_items
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Sorted canonical category keys.
    pub fn known_categories(&self) -> Vec<String> {
        self.categories
            .values()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn fuzzy_match(&self, word: &str) -> Option<&str> {
        let mut best: Option<&str> = None;
        let mut best_score = 0.0;

        for canonical in &self.canonical_items {
            let score = similarity(word, canonical);
            if score > best_score {
                best_score = score;
                best = Some(canonical.as_str());
            }
        }

        best.filter(|_| best_score >= FUZZY_THRESHOLD)
    }
}

fn clean(raw: &str) -> String {
    raw.trim().to_lowercase()
}

// =============================================================================
// Singularization
// =============================================================================

/// Strips English plural suffixes until the word stops changing.
///
/// Running to a fixed point keeps normalization idempotent: whatever this
/// returns, a second pass returns unchanged.
pub fn singularize(word: &str) -> String {
    let mut current = word.to_string();
    while let Some(next) = singularize_once(&current) {
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn singularize_once(word: &str) -> Option<String> {
    let len = word.chars().count();

    if let Some(stem) = word.strip_suffix("ies") {
        if len > 4 {
            return Some(format!("{stem}y"));
        }
    }

    if let Some(stem) = word.strip_suffix("es") {
        if len > 3 {
            if ["o", "s", "z", "x", "sh", "ch"]
                .iter()
                .any(|suffix| stem.ends_with(suffix))
            {
                return Some(stem.to_string());
            }
            return Some(format!("{stem}e"));
        }
    }

    if let Some(stem) = word.strip_suffix('s') {
        // "glass", "bus" and "analysis" are already singular.
        let protected = ["ss", "us", "is"].iter().any(|end| word.ends_with(end));
        if len > 2 && !protected {
            return Some(stem.to_string());
        }
    }

    None
}

// =============================================================================
// Similarity
// =============================================================================

/// Edit-distance similarity in `[0, 1]`: `1 - levenshtein / longer_len`.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    1.0 - levenshtein(&a, &b) as f64 / longest as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

// =============================================================================
// Unit Tests
// =============================================================================
