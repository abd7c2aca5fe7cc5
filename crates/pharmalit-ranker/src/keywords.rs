//! Keyword resolution: turn a dot-separated category path into the term sets used for
//! scoring and for building external search queries.
//!
//! Aggregation depends on path depth. A top category alone is a broad search and pulls
//! in every descendant; a subcategory or type is a narrow search and only uses its own
//! terms (plus its direct types, for subcategories).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use pharmalit_common::{CategoryNode, KeywordHierarchy, StudyType};

use crate::text::{normalise_term, push_unique, strip_tag};

/// MeSH terms too generic to be useful in an external search query.
const GENERIC_MESH_STOPLIST: &[&str] = &["efficacy", "treatment outcome", "drug therapy"];

/// Text keywords skipped for narrow (depth > 1) search queries.
const NARROW_TEXT_STOPLIST: &[&str] = &["efficacy", "safety", "pharmacokinetics"];

const BROAD_PRIMARY_CAP: usize = 8;
const NARROW_PRIMARY_CAP: usize = 3;

/// Deduplicated terms resolved for one category path.
/// Terms keep their original spelling and tags; first-seen order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSet {
    pub keywords: Vec<String>,
    pub mesh_terms: Vec<String>,
    pub text_keywords: Vec<String>,
}

impl KeywordSet {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.mesh_terms.is_empty() && self.text_keywords.is_empty()
    }

    fn absorb(&mut self, node: &CategoryNode) {
        for k in &node.keywords {
            push_unique(&mut self.keywords, k.clone());
        }
        for m in &node.mesh_terms {
            push_unique(&mut self.mesh_terms, m.clone());
        }
        for t in &node.text_keywords {
            push_unique(&mut self.text_keywords, t.clone());
        }
    }

    fn absorb_recursive(&mut self, node: &CategoryNode) {
        self.absorb(node);
        for child in node.children() {
            self.absorb_recursive(child);
        }
    }

    /// keywords ∪ meshTerms ∪ textKeywords, tag-stripped, lowercased, deduplicated.
    pub fn all_terms(&self) -> Vec<String> {
        let mut out = Vec::new();
        for term in self
            .keywords
            .iter()
            .chain(&self.mesh_terms)
            .chain(&self.text_keywords)
        {
            let t = normalise_term(term);
            if !t.is_empty() {
                push_unique(&mut out, t);
            }
        }
        out
    }
}

/// Display names collected along a category path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNames {
    /// Name of the top-level category.
    pub parent_name: String,
    /// Name of the deepest node, when the path goes below the top level.
    pub child_name: Option<String>,
    /// All names joined with `" > "`.
    pub full_path: String,
    /// Every name along the path, top first.
    pub segments: Vec<String>,
    pub is_subheading: bool,
    /// Lowercase, tag-stripped keywords, text keywords and name of the deepest node.
    pub inner_keywords: Vec<String>,
}

/// Resolves category paths against an injected, immutable hierarchy.
#[derive(Debug, Clone)]
pub struct KeywordResolver {
    hierarchy: Arc<KeywordHierarchy>,
}

impl KeywordResolver {
    pub fn new(hierarchy: Arc<KeywordHierarchy>) -> Self {
        Self { hierarchy }
    }

    pub fn hierarchy(&self) -> &KeywordHierarchy {
        &self.hierarchy
    }

    /// Walk a path and return every node along it, top first.
    /// `None` when any segment does not resolve or the path is deeper than three levels.
    pub fn locate(&self, study: StudyType, category_path: &str) -> Option<Vec<&CategoryNode>> {
        let segments: Vec<&str> = category_path.split('.').map(str::trim).collect();
        if segments.is_empty() || segments.len() > 3 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let mut chain: Vec<&CategoryNode> = Vec::with_capacity(segments.len());
        for (depth, segment) in segments.iter().enumerate() {
            let node = match depth {
                0 => self.hierarchy.categories(study)?.get(*segment)?,
                1 => chain[0].subcategories.get(*segment)?,
                _ => chain[1].types.get(*segment)?,
            };
            chain.push(node);
        }
        Some(chain)
    }

    /// Resolve the keyword set for a category path.
    /// Unresolvable paths yield an empty set so the request degrades to "no category signal".
    pub fn resolve_keywords(&self, study: StudyType, category_path: &str) -> KeywordSet {
        let Some(chain) = self.locate(study, category_path) else {
            warn!(%study, category_path, "Category not found; using empty keyword set");
            return KeywordSet::default();
        };

        let node = chain[chain.len() - 1];
        let mut set = KeywordSet::default();
        match chain.len() {
            1 => {
                set.absorb_recursive(node);
                push_unique(&mut set.keywords, node.name.clone());
                push_unique(&mut set.text_keywords, node.name.clone());
            }
            2 => {
                set.absorb(node);
                for t in node.types.values() {
                    set.absorb(t);
                }
            }
            _ => set.absorb(node),
        }
        set
    }

    /// A short, query-friendly term list for the external literature search.
    /// MeSH terms first, then text keywords, capped by path depth.
    pub fn resolve_primary_search_keywords(
        &self,
        study: StudyType,
        category_path: &str,
    ) -> Vec<String> {
        let Some(chain) = self.locate(study, category_path) else {
            return Vec::new();
        };
        let broad = chain.len() == 1;
        let set = self.resolve_keywords(study, category_path);

        let cap = if broad { BROAD_PRIMARY_CAP } else { NARROW_PRIMARY_CAP };
        let mesh_quota = (cap * 3 + 2) / 5; // 60 %, rounded

        let mut out: Vec<String> = Vec::with_capacity(cap);
        let mut seen: Vec<String> = Vec::with_capacity(cap);
        let mut take = |term: &str, out: &mut Vec<String>| {
            let lower = term.to_lowercase();
            if !seen.contains(&lower) {
                seen.push(lower);
                out.push(term.to_string());
            }
        };

        for m in &set.mesh_terms {
            if out.len() >= mesh_quota {
                break;
            }
            let term = strip_tag(m);
            if term.is_empty() || GENERIC_MESH_STOPLIST.contains(&term.to_lowercase().as_str()) {
                continue;
            }
            take(term, &mut out);
        }

        for t in &set.text_keywords {
            if out.len() >= cap {
                break;
            }
            let term = strip_tag(t);
            let len = term.chars().count();
            let keep = if broad {
                len > 3
            } else {
                len > 5 && !NARROW_TEXT_STOPLIST.contains(&term.to_lowercase().as_str())
            };
            if keep {
                take(term, &mut out);
            }
        }
        out
    }

    /// Collect display names and the deepest node's inner keywords along a path.
    pub fn resolve_category_names(
        &self,
        study: StudyType,
        category_path: &str,
    ) -> Option<CategoryNames> {
        let chain = self.locate(study, category_path)?;
        let deepest = chain[chain.len() - 1];
        let segments: Vec<String> = chain.iter().map(|n| n.name.clone()).collect();

        let mut inner_keywords = Vec::new();
        for term in deepest
            .keywords
            .iter()
            .chain(&deepest.text_keywords)
            .chain(std::iter::once(&deepest.name))
        {
            let t = normalise_term(term);
            if !t.is_empty() {
                push_unique(&mut inner_keywords, t);
            }
        }

        Some(CategoryNames {
            parent_name: chain[0].name.clone(),
            child_name: (chain.len() > 1).then(|| deepest.name.clone()),
            full_path: segments.join(" > "),
            segments,
            is_subheading: chain.len() > 1,
            inner_keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmalit_test_utils::sample_hierarchy;
    use pretty_assertions::assert_eq;

    fn resolver() -> KeywordResolver {
        KeywordResolver::new(sample_hierarchy())
    }

    #[test]
    fn test_depth_one_aggregates_descendants_and_name() {
        let set = resolver().resolve_keywords(StudyType::Human, "pharmacokinetics");
        assert!(set.keywords.contains(&"absorption".to_string()));
        assert!(set.keywords.contains(&"hepatic metabolism".to_string()));
        assert!(set.text_keywords.contains(&"oral bioavailability".to_string()));
        assert!(set.keywords.contains(&"Pharmacokinetics".to_string()));
        assert!(set.text_keywords.contains(&"Pharmacokinetics".to_string()));
    }

    #[test]
    fn test_depth_two_folds_in_types_only() {
        let set = resolver().resolve_keywords(StudyType::Human, "pharmacokinetics.absorption");
        assert!(set.keywords.contains(&"absorption".to_string()));
        assert!(set.text_keywords.contains(&"oral bioavailability".to_string()));
        assert!(!set.keywords.contains(&"hepatic metabolism".to_string()));
        assert!(!set.keywords.contains(&"Pharmacokinetics".to_string()));
    }

    #[test]
    fn test_depth_three_is_node_only() {
        let set = resolver().resolve_keywords(StudyType::Human, "pharmacokinetics.absorption.oral");
        assert_eq!(set.text_keywords, vec!["oral bioavailability".to_string()]);
        assert!(!set.keywords.contains(&"absorption".to_string()));
    }

    #[test]
    fn test_unknown_segment_gives_empty_set() {
        let r = resolver();
        assert!(r.resolve_keywords(StudyType::Human, "pharmacokinetics.nope").is_empty());
        assert!(r.resolve_keywords(StudyType::Human, "").is_empty());
        assert!(r.resolve_keywords(StudyType::Human, "a.b.c.d").is_empty());
        assert!(r.resolve_keywords(StudyType::Animal, "efficacy.clinical_outcomes").is_empty());
    }

    #[test]
    fn test_dedup_within_class() {
        let set = resolver().resolve_keywords(StudyType::Human, "pharmacokinetics");
        let n = set.mesh_terms.iter().filter(|m| m.as_str() == "Pharmacokinetics[MeSH]").count();
        assert_eq!(n, 1);
    }

    #[test]
    fn test_all_terms_strips_tags_and_lowercases() {
        let set = resolver().resolve_keywords(StudyType::Human, "pharmacokinetics.absorption");
        let all = set.all_terms();
        assert!(all.contains(&"intestinal absorption".to_string()));
        assert!(all.iter().all(|t| !t.contains('[') && *t == t.to_lowercase()));
    }

    #[test]
    fn test_primary_keywords_broad_cap_and_mesh_first() {
        let kws = resolver().resolve_primary_search_keywords(StudyType::Human, "pharmacokinetics");
        assert!(kws.len() <= 8);
        assert_eq!(kws[0], "Pharmacokinetics");
        assert!(kws.iter().all(|k| !k.contains('[')));
    }

    #[test]
    fn test_primary_keywords_narrow_filters() {
        let kws = resolver().resolve_primary_search_keywords(StudyType::Human, "efficacy.clinical_outcomes");
        assert!(kws.len() <= 3);
        // "Treatment Outcome" is too generic, "efficacy" is stoplisted for narrow queries
        assert!(!kws.iter().any(|k| k.eq_ignore_ascii_case("treatment outcome")));
        assert!(!kws.iter().any(|k| k.eq_ignore_ascii_case("efficacy")));
        assert!(kws.iter().all(|k| k.chars().count() > 5));
    }

    #[test]
    fn test_category_names() {
        let names = resolver()
            .resolve_category_names(StudyType::Human, "pharmacokinetics.absorption")
            .unwrap();
        assert_eq!(names.parent_name, "Pharmacokinetics");
        assert_eq!(names.child_name.as_deref(), Some("Absorption"));
        assert_eq!(names.full_path, "Pharmacokinetics > Absorption");
        assert!(names.is_subheading);
        assert!(names.inner_keywords.contains(&"absorption".to_string()));
        assert!(names.inner_keywords.contains(&"bioavailability".to_string()));

        let top = resolver().resolve_category_names(StudyType::Human, "efficacy").unwrap();
        assert!(!top.is_subheading);
        assert_eq!(top.child_name, None);
        assert_eq!(top.full_path, "Efficacy");
    }
}
