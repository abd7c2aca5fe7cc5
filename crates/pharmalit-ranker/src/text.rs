//! Term normalisation and matching primitives shared by the classifier and scorer.
//! Every haystack passed in here is expected to be lowercased already.

use regex::Regex;

/// Strip a trailing PubMed field tag such as `[MeSH]` or `[tiab]`.
pub fn strip_tag(term: &str) -> &str {
    let trimmed = term.trim();
    if trimmed.ends_with(']') {
        if let Some(open) = trimmed.rfind('[') {
            return trimmed[..open].trim_end();
        }
    }
    trimmed
}

/// Tag-stripped, trimmed, lowercased form used for all comparisons.
pub fn normalise_term(term: &str) -> String {
    strip_tag(term).to_lowercase()
}

/// Lowercased MeSH heading without qualifiers (`/drug effects`) or major-topic stars.
pub fn mesh_heading(term: &str) -> String {
    let heading = term.split('/').next().unwrap_or(term);
    heading.trim().trim_end_matches('*').trim().to_lowercase()
}

/// A lowercase term with its precompiled word-boundary pattern.
#[derive(Debug, Clone)]
pub struct TermPattern {
    term: String,
    bounded: Option<Regex>,
}

impl TermPattern {
    /// Returns `None` for terms that are empty after normalisation.
    pub fn new(term: &str) -> Option<Self> {
        let term = normalise_term(term);
        if term.is_empty() {
            return None;
        }
        let bounded = Regex::new(&format!(r"\b{}\b", regex::escape(&term))).ok();
        Some(Self { term, bounded })
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.term.chars().count()
    }

    /// Whole-word match. Terms whose pattern failed to compile fall back to substring.
    pub fn matches_word(&self, haystack: &str) -> bool {
        match &self.bounded {
            Some(re) => re.is_match(haystack),
            None => haystack.contains(&self.term),
        }
    }

    pub fn count_words(&self, haystack: &str) -> usize {
        match &self.bounded {
            Some(re) => re.find_iter(haystack).count(),
            None => self.count_substrings(haystack),
        }
    }

    pub fn matches_substring(&self, haystack: &str) -> bool {
        haystack.contains(&self.term)
    }

    pub fn count_substrings(&self, haystack: &str) -> usize {
        haystack.matches(self.term.as_str()).count()
    }
}

/// Compile a fixed term list, dropping empty entries.
pub fn compile_terms<'a>(terms: impl IntoIterator<Item = &'a str>) -> Vec<TermPattern> {
    terms.into_iter().filter_map(TermPattern::new).collect()
}

/// Push `value` unless already present; keeps first-seen order.
pub(crate) fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}
