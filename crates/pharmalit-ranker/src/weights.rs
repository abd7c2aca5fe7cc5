//! Point table for the relevance scorer.
//!
//! Every constant the scoring stages add lives here so the stages stay free of inline
//! literals and a deployment can override individual values from configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    // ── Drug presence ────────────────────────────────────────────────────────
    /// Query term found in the title
    pub drug_in_title: u32,
    /// Query term found in the abstract only
    pub drug_in_abstract: u32,
    /// Frequency bonus at 5 or more mentions
    pub mentions_5_plus: u32,
    /// Frequency bonus at 3 or 4 mentions
    pub mentions_3_plus: u32,
    /// Frequency bonus at exactly 2 mentions
    pub mentions_2_plus: u32,

    // ── Category locality ────────────────────────────────────────────────────
    pub full_path_with_drug: u32,
    pub full_path_without_drug: u32,
    pub inner_keyword_with_drug: u32,
    pub inner_keyword_without_drug: u32,

    // ── Keyword evidence ─────────────────────────────────────────────────────
    pub mesh_exact: u32,
    pub mesh_substring: u32,
    pub mesh_word_overlap: u32,
    /// Words shorter than this never count as a MeSH word overlap; 1 admits every word
    pub mesh_overlap_min_word_len: usize,
    pub title_word: u32,
    pub title_substring: u32,
    pub title_mesh_cross: u32,
    pub abstract_word: u32,
    pub abstract_substring: u32,
    /// Abstract substring matches need a term longer than this
    pub abstract_substring_min_len: usize,
    pub article_keyword: u32,

    // ── Match-type multiplier (percent) ──────────────────────────────────────
    pub multiplier_three_types_pct: u32,
    pub multiplier_two_types_pct: u32,

    // ── Drug + filter combination ────────────────────────────────────────────
    pub combo_drug_in_title: u32,
    pub combo_drug_in_abstract: u32,
    pub consolation_drug_in_title: u32,
    pub consolation_drug_in_abstract: u32,

    // ── Ranking ──────────────────────────────────────────────────────────────
    /// Added once when an article qualifies under more than one category
    pub multi_category_bonus: u32,
    /// Drug-less articles are accepted at this filter score or above
    pub accept_min_filter_score: u32,
    /// ...or with at least this many distinct match types
    pub accept_min_match_types: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            drug_in_title:                150,
            drug_in_abstract:             80,
            mentions_5_plus:              40,
            mentions_3_plus:              25,
            mentions_2_plus:              15,

            full_path_with_drug:          500,
            full_path_without_drug:       100,
            inner_keyword_with_drug:      300,
            inner_keyword_without_drug:   50,

            mesh_exact:                   20,
            mesh_substring:               15,
            mesh_word_overlap:            8,
            mesh_overlap_min_word_len:    1,
            title_word:                   8,
            title_substring:              4,
            title_mesh_cross:             10,
            abstract_word:                5,
            abstract_substring:           2,
            abstract_substring_min_len:   4,
            article_keyword:              3,

            multiplier_three_types_pct:   150,
            multiplier_two_types_pct:     120,

            combo_drug_in_title:          200,
            combo_drug_in_abstract:       120,
            consolation_drug_in_title:    5,
            consolation_drug_in_abstract: 2,

            multi_category_bonus:         2,
            accept_min_filter_score:      10,
            accept_min_match_types:       2,
        }
    }
}

impl ScoringWeights {
    /// Bonus for how often the query term occurs in title + abstract.
    pub fn frequency_bonus(&self, mentions: usize) -> u32 {
        match mentions {
            n if n >= 5 => self.mentions_5_plus,
            n if n >= 3 => self.mentions_3_plus,
            2           => self.mentions_2_plus,
            _           => 0,
        }
    }

    /// Scale a running score by the number of distinct match types, flooring.
    pub fn apply_multiplier(&self, score: u32, match_types: usize) -> u32 {
        let pct = match match_types {
            n if n >= 3 => self.multiplier_three_types_pct,
            2           => self.multiplier_two_types_pct,
            _           => return score,
        };
        ((u64::from(score) * u64::from(pct)) / 100) as u32
    }

    /// Multipliers below 100 % would let extra evidence lower a score.
    pub fn validate(&self) -> bool {
        self.multiplier_two_types_pct >= 100
            && self.multiplier_three_types_pct >= self.multiplier_two_types_pct
            && self.mentions_5_plus >= self.mentions_3_plus
            && self.mentions_3_plus >= self.mentions_2_plus
    }
}
