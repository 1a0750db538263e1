// Canonicalizer - Trope Identity Resolution
//
// Groups differently-worded mentions of the same trope into clusters.
//
// Two passes over the evidence (source order, then mention order):
// 1. Alias pass: normalized labels found in the alias table join the cluster
//    of their canonical name. Alias matches are never re-decided by similarity.
// 2. Fuzzy pass: remaining labels join the most similar existing cluster if
//    similarity >= threshold, otherwise seed a new cluster.
//
// Similarity = max(token-set Jaccard overlap, normalized Levenshtein ratio)
// over normalized labels.

use crate::types::{Confidence, EvidenceItem};
use crate::vocabulary::{BUILTIN_SYNONYMS, CANONICAL_TROPES};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Minimum similarity for a fuzzy cluster join
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.8;

/// Trailing words stripped during normalization
pub const DEFAULT_QUALIFIER_WORDS: [&str; 2] = ["trope", "archetype"];

/// Canonicalizer configuration
#[derive(Debug, Clone)]
pub struct CanonicalizerConfig {
    /// Fuzzy join threshold (0.0-1.0)
    pub similarity_threshold: f64,
    /// Trailing qualifier words to strip ("trope", "archetype")
    pub qualifier_words: Vec<String>,
    /// Extra (variant, canonical name) aliases on top of the built-in table
    pub extra_aliases: Vec<(String, String)>,
}

impl Default for CanonicalizerConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            qualifier_words: DEFAULT_QUALIFIER_WORDS.iter().map(|w| w.to_string()).collect(),
            extra_aliases: Vec::new(),
        }
    }
}

/// A set of mentions believed to denote the same trope
#[derive(Debug, Clone)]
pub struct EvidenceCluster {
    pub canonical_label: String,
    pub items: Vec<EvidenceItem>,
    /// Formed from an alias table entry
    pub alias_resolved: bool,
    /// Normalized form of each item, parallel to `items`
    normalized: Vec<String>,
    /// Normalized representative used for similarity comparisons
    representative: String,
}

impl EvidenceCluster {
    fn from_alias(canonical: &str, representative: String) -> Self {
        Self {
            canonical_label: canonical.to_string(),
            items: Vec::new(),
            alias_resolved: true,
            normalized: Vec::new(),
            representative,
        }
    }

    fn seeded(item: EvidenceItem, normalized: String) -> Self {
        let mut cluster = Self {
            canonical_label: String::new(),
            items: Vec::new(),
            alias_resolved: false,
            normalized: Vec::new(),
            representative: normalized.clone(),
        };
        cluster.push(item, normalized);
        cluster
    }

    fn push(&mut self, item: EvidenceItem, normalized: String) {
        self.items.push(item);
        self.normalized.push(normalized);
        if !self.alias_resolved {
            self.refresh_representative();
        }
    }

    /// Normalized representative label
    pub fn representative(&self) -> &str {
        &self.representative
    }

    /// Most frequent normalized form, then highest single confidence, then alphabetical
    fn refresh_representative(&mut self) {
        let mut forms: BTreeMap<&str, (usize, Confidence)> = BTreeMap::new();
        for (item, form) in self.items.iter().zip(&self.normalized) {
            let entry = forms.entry(form.as_str()).or_insert((0, f64::NEG_INFINITY));
            entry.0 += 1;
            entry.1 = entry.1.max(item.confidence);
        }

        // BTreeMap iterates alphabetically, so the first maximum wins ties
        let mut best: Option<(&str, usize, Confidence)> = None;
        for (&form, &(count, conf)) in &forms {
            match best {
                Some((_, best_count, best_conf)) if (best_count, best_conf) >= (count, conf) => {}
                _ => best = Some((form, count, conf)),
            }
        }
        let Some(best) = best.map(|(form, _, _)| form.to_string()) else {
            return;
        };

        self.canonical_label = display_label(&self.items, &self.normalized, &best);
        self.representative = best;
    }
}

/// Raw label shown for a normalized form: highest confidence, then alphabetical
fn display_label(items: &[EvidenceItem], normalized: &[String], form: &str) -> String {
    items
        .iter()
        .zip(normalized)
        .filter(|(_, n)| n.as_str() == form)
        .map(|(item, _)| item)
        .min_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then_with(|| a.raw_label.cmp(&b.raw_label))
        })
        .map(|item| item.raw_label.clone())
        .unwrap_or_else(|| form.to_string())
}

/// Trope label canonicalizer
pub struct Canonicalizer {
    config: CanonicalizerConfig,
    /// normalized variant -> canonical name
    aliases: HashMap<String, String>,
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new(CanonicalizerConfig::default())
    }
}

impl Canonicalizer {
    /// Build with the built-in vocabulary plus configured extra aliases
    pub fn new(config: CanonicalizerConfig) -> Self {
        let mut canonicalizer = Self {
            config,
            aliases: HashMap::new(),
        };

        for name in CANONICAL_TROPES {
            canonicalizer.add_alias(name, name);
        }
        for (variant, canonical) in BUILTIN_SYNONYMS {
            canonicalizer.add_alias(variant, canonical);
        }
        let extra = std::mem::take(&mut canonicalizer.config.extra_aliases);
        for (variant, canonical) in &extra {
            canonicalizer.add_alias(variant, canonical);
        }
        canonicalizer.config.extra_aliases = extra;

        canonicalizer
    }

    /// Register a surface variant for a canonical name (later entries win)
    pub fn add_alias(&mut self, variant: &str, canonical: &str) {
        let key = self.normalize(variant);
        if !key.is_empty() {
            self.aliases.insert(key, canonical.to_string());
        }
    }

    pub fn config(&self) -> &CanonicalizerConfig {
        &self.config
    }

    /// Resolve a raw label through the alias table
    pub fn lookup_alias(&self, raw_label: &str) -> Option<&str> {
        self.aliases.get(&self.normalize(raw_label)).map(String::as_str)
    }

    /// Normalize a raw label
    ///
    /// Lowercase; apostrophes removed; any other non-alphanumeric run becomes a
    /// single space; trailing qualifier words stripped (never the last token).
    pub fn normalize(&self, raw_label: &str) -> String {
        let mut cleaned = String::with_capacity(raw_label.len());
        for ch in raw_label.to_lowercase().chars() {
            if ch.is_alphanumeric() {
                cleaned.push(ch);
            } else if ch == '\'' || ch == '\u{2019}' {
                continue;
            } else {
                cleaned.push(' ');
            }
        }

        let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
        while tokens.len() > 1 {
            let last = tokens[tokens.len() - 1];
            if self.config.qualifier_words.iter().any(|q| q == last) {
                tokens.pop();
            } else {
                break;
            }
        }
        tokens.join(" ")
    }

    /// Cluster evidence items by trope identity
    ///
    /// Every input item ends up in exactly one cluster. Cluster order is the
    /// order in which clusters were first formed.
    pub fn canonicalize<I>(&self, items: I) -> Vec<EvidenceCluster>
    where
        I: IntoIterator<Item = EvidenceItem>,
    {
        let mut clusters: Vec<EvidenceCluster> = Vec::new();
        let mut alias_index: HashMap<String, usize> = HashMap::new();
        let mut unmatched: Vec<(EvidenceItem, String)> = Vec::new();

        // Pass 1: alias table
        for item in items {
            let normalized = self.normalize(&item.raw_label);
            match self.aliases.get(&normalized) {
                Some(canonical) => {
                    let idx = *alias_index.entry(canonical.clone()).or_insert_with(|| {
                        clusters.push(EvidenceCluster::from_alias(canonical, self.normalize(canonical)));
                        clusters.len() - 1
                    });
                    debug!(label = %item.raw_label, canonical = %canonical, "Alias match");
                    clusters[idx].push(item, normalized);
                }
                None => unmatched.push((item, normalized)),
            }
        }

        // Pass 2: fuzzy clustering against current representatives
        for (item, normalized) in unmatched {
            let best = clusters
                .iter()
                .enumerate()
                .map(|(idx, cluster)| (idx, similarity(&normalized, cluster.representative())))
                .fold(None::<(usize, f64)>, |best, candidate| match best {
                    Some(b) if b.1 >= candidate.1 => Some(b),
                    _ => Some(candidate),
                });

            match best {
                Some((idx, score)) if score >= self.config.similarity_threshold => {
                    debug!(
                        label = %item.raw_label,
                        cluster = %clusters[idx].canonical_label,
                        similarity = score,
                        "Fuzzy match"
                    );
                    clusters[idx].push(item, normalized);
                }
                best => {
                    debug!(
                        label = %item.raw_label,
                        best_similarity = best.map(|b| b.1).unwrap_or(0.0),
                        "No cluster above threshold, seeding new cluster"
                    );
                    clusters.push(EvidenceCluster::seeded(item, normalized));
                }
            }
        }

        debug!(clusters = clusters.len(), "Canonicalization complete");
        clusters
    }
}

/// Token-set Jaccard overlap of two normalized labels
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let a: BTreeSet<&str> = a.split_whitespace().collect();
    let b: BTreeSet<&str> = b.split_whitespace().collect();
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

/// Similarity of two normalized labels (0.0-1.0)
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    token_overlap(a, b).max(strsim::normalized_levenshtein(a, b))
}
