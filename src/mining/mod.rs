//! Tag and importance mining from observation text
//!
//! Derives typed tags from a node's concatenated observation text plus its
//! type string, in a fixed precedence order: explicit markers, then the
//! type-derived slug, then mined keywords. The first writer for a tag name
//! wins; later steps skip names already present.
//!
//! Mining is fully deterministic: identical input text and type produce a
//! byte-identical tag list on every call. No randomness, no locale-dependent
//! casing (ASCII case folding only via `to_lowercase` on known-ASCII input).

use crate::graph::{Tag, TagCategory};
use std::collections::{HashMap, HashSet};

/// Hand-tuned stop words dropped from keyword candidates.
///
/// Preserved verbatim for behavioral parity; not an algorithm to improve.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had",
    "her", "was", "one", "our", "out", "day", "get", "has", "him", "his",
    "how", "man", "new", "now", "old", "see", "two", "way", "who", "its",
    "did", "yes", "your", "from", "they", "know", "want", "been", "good",
    "much", "some", "time", "very", "when", "come", "here", "just", "like",
    "long", "make", "many", "more", "most", "over", "such", "take", "than",
    "them", "well", "were", "will", "with", "have", "this", "that", "what",
    "which", "their", "would", "there", "about", "these", "other", "into",
    "also", "only", "then", "being", "does", "each", "both", "under",
];

/// Hand-tuned importance indicators: if any of these words appear anywhere
/// in the source text, keyword base weight is raised to the matched value
/// (the maximum across all matches).
const IMPORTANCE_INDICATORS: &[(&str, u8)] = &[
    ("critical", 9),
    ("essential", 9),
    ("crucial", 9),
    ("important", 8),
    ("major", 8),
    ("significant", 7),
    ("key", 7),
    ("core", 7),
    ("central", 7),
    ("primary", 6),
    ("notable", 6),
    ("main", 6),
    ("standard", 5),
    ("basic", 5),
    ("common", 5),
    ("minor", 3),
    ("trivial", 2),
];

/// Immutable mining configuration, injected at construction.
///
/// The defaults carry the reference constants; callers that need different
/// marker characters or palettes build their own.
#[derive(Debug, Clone)]
pub struct MinerConfig {
    /// Reserved marker character prefixing explicit tags
    pub marker: char,
    /// Fixed weight for explicit-marker tags
    pub explicit_weight: u8,
    /// Fixed weight for the type-derived tag
    pub type_weight: u8,
    /// Base weight for keyword-derived tags before bonuses
    pub keyword_base: u8,
    /// Minimum keyword length (shorter candidates are dropped)
    pub min_keyword_len: usize,
    /// Maximum repeat-frequency bonus
    pub max_repeat_bonus: u8,
    pub stop_words: HashSet<String>,
    pub importance_indicators: Vec<(String, u8)>,
    /// Presentation colors per tag category, opaque to the engine
    pub category_colors: HashMap<TagCategory, String>,
    /// Name-specific color overrides, checked before the category color
    pub tag_colors: HashMap<String, String>,
}

impl Default for MinerConfig {
    fn default() -> Self {
        let category_colors = HashMap::from([
            (TagCategory::ExplicitMarker, "#ff6b6b".to_string()),
            (TagCategory::TypeDerived, "#4ecdc4".to_string()),
            (TagCategory::KeywordDerived, "#ffe66d".to_string()),
        ]);
        Self {
            marker: '#',
            explicit_weight: 6,
            type_weight: 8,
            keyword_base: 5,
            min_keyword_len: 3,
            max_repeat_bonus: 3,
            stop_words: STOP_WORDS.iter().map(|w| w.to_string()).collect(),
            importance_indicators: IMPORTANCE_INDICATORS
                .iter()
                .map(|(w, v)| (w.to_string(), *v))
                .collect(),
            category_colors,
            tag_colors: HashMap::new(),
        }
    }
}

/// Derives tags from node text and type. Stateless between calls.
#[derive(Debug, Clone, Default)]
pub struct TagMiner {
    config: MinerConfig,
}

/// A keyword candidate before weighting, in first-occurrence order.
struct Candidate {
    name: String,
    occurrences: usize,
    /// Carried a hyphen/underscore or an internal capital in the source
    compound: bool,
}

impl TagMiner {
    pub fn new(config: MinerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MinerConfig {
        &self.config
    }

    /// Mine the deduplicated tag list for one node.
    ///
    /// `text` is the node's concatenated observation text; `node_type` its
    /// free-text category.
    pub fn mine(&self, text: &str, node_type: &str) -> Vec<Tag> {
        let mut tags: Vec<Tag> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        // 1. Explicit markers: verbatim tokens after the marker char, case-folded
        for token in text.split_whitespace() {
            if let Some(rest) = token.strip_prefix(self.config.marker) {
                let name: String = rest
                    .chars()
                    .take_while(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
                    .collect::<String>()
                    .to_lowercase();
                if !name.is_empty() && seen.insert(name.clone()) {
                    tags.push(self.colored(Tag::new(
                        name,
                        TagCategory::ExplicitMarker,
                        self.config.explicit_weight,
                    )));
                }
            }
        }

        // 2. Type-derived tag: slug-cased type string
        let slug = slugify(node_type);
        if !slug.is_empty() && seen.insert(slug.clone()) {
            tags.push(self.colored(Tag::new(
                slug,
                TagCategory::TypeDerived,
                self.config.type_weight,
            )));
        }

        // 3. Keyword-derived tags
        let lowered = text.to_lowercase();
        let indicator_boost = self.indicator_boost(&lowered);
        for candidate in self.keyword_candidates(text, &lowered) {
            if seen.insert(candidate.name.clone()) {
                let weight = self.keyword_weight(&candidate, indicator_boost);
                tags.push(self.colored(Tag::new(
                    candidate.name,
                    TagCategory::KeywordDerived,
                    weight,
                )));
            }
        }

        tags
    }

    fn colored(&self, tag: Tag) -> Tag {
        let color = self
            .config
            .tag_colors
            .get(&tag.name)
            .or_else(|| self.config.category_colors.get(&tag.category))
            .cloned();
        match color {
            Some(c) => tag.with_color(c),
            None => tag,
        }
    }

    /// Maximum importance-indicator value present anywhere in the text.
    fn indicator_boost(&self, lowered: &str) -> Option<u8> {
        let words: HashSet<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();
        self.config
            .importance_indicators
            .iter()
            .filter(|(word, _)| words.contains(word.as_str()))
            .map(|(_, value)| *value)
            .max()
    }

    /// Produce keyword candidates in first-occurrence order.
    ///
    /// Plain words come from the lowercased, punctuation-stripped token
    /// stream; pattern-based extras (CamelCase runs and hyphen/underscore
    /// compounds) come from the original text so casing survives detection.
    /// CamelCase terms are already counted by the plain pass (their lowered
    /// form is one alphanumeric word), so the extras pass only flags them.
    fn keyword_candidates(&self, original: &str, lowered: &str) -> Vec<Candidate> {
        let mut order: Vec<String> = Vec::new();
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut compound: HashSet<String> = HashSet::new();

        // Plain words: split on everything non-alphanumeric
        for word in lowered.split(|c: char| !c.is_alphanumeric()) {
            if word.len() < self.config.min_keyword_len
                || self.config.stop_words.contains(word)
                || word.chars().all(|c| c.is_ascii_digit())
            {
                continue;
            }
            let entry = counts.entry(word.to_string()).or_insert(0);
            if *entry == 0 {
                order.push(word.to_string());
            }
            *entry += 1;
        }

        // Pattern extras: CamelCase runs and joined compounds
        for raw in original.split_whitespace() {
            let token = raw.trim_matches(|c: char| !c.is_alphanumeric() && c != '-' && c != '_');
            if token.len() < self.config.min_keyword_len {
                continue;
            }
            let is_joined = token
                .split(['-', '_'])
                .filter(|part| !part.is_empty())
                .count()
                >= 2;
            let has_internal_capital = !is_joined
                && token.chars().skip(1).any(|c| c.is_uppercase())
                && token.chars().any(|c| c.is_lowercase());
            if !has_internal_capital && !is_joined {
                continue;
            }
            let name = token.to_lowercase();
            if self.config.stop_words.contains(&name) {
                continue;
            }
            if is_joined {
                // Joined compounds never survive the plain split, so they
                // are counted here, once per occurrence
                let entry = counts.entry(name.clone()).or_insert(0);
                if *entry == 0 {
                    order.push(name.clone());
                }
                *entry += 1;
            } else if !counts.contains_key(&name) {
                counts.insert(name.clone(), 1);
                order.push(name.clone());
            }
            compound.insert(name);
        }

        order
            .into_iter()
            .map(|name| Candidate {
                occurrences: counts[&name],
                compound: compound.contains(&name)
                    || name.contains('-')
                    || name.contains('_'),
                name,
            })
            .collect()
    }

    fn keyword_weight(&self, candidate: &Candidate, indicator_boost: Option<u8>) -> u8 {
        let base = match indicator_boost {
            Some(boost) => self.config.keyword_base.max(boost),
            None => self.config.keyword_base,
        };
        let repeat = (candidate.occurrences.saturating_sub(1) as u8).min(self.config.max_repeat_bonus);
        let compound = if candidate.compound { 1 } else { 0 };
        (base + repeat + compound).clamp(1, 10)
    }
}

/// Slug-case a type string: trimmed, lowercased, whitespace runs → hyphens.
fn slugify(type_str: &str) -> String {
    type_str
        .trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}
