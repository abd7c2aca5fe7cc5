//! Caller-facing request validation and external search-query building.

use serde::{Deserialize, Serialize};

use pharmalit_common::{PharmalitError, Result, StudyType};

use crate::keywords::KeywordResolver;

/// Unvalidated ranking request as it arrives from a request handler.
/// Each `category_paths` entry may itself be a comma-joined list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankRequest {
    pub study_type: String,
    pub category_paths: Vec<String>,
    #[serde(default)]
    pub query: String,
    pub top_n: usize,
}

/// A request whose enumerations and bounds have been checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedRankRequest {
    pub study_type: StudyType,
    /// Trimmed, non-empty, first-seen order, no duplicates.
    pub category_paths: Vec<String>,
    /// Trimmed; may be empty, in which case no drug stage can match.
    pub query: String,
    pub top_n: usize,
}

impl RankRequest {
    pub fn new(study_type: &str, category_paths: &str, query: &str, top_n: usize) -> Self {
        Self {
            study_type: study_type.to_string(),
            category_paths: vec![category_paths.to_string()],
            query: query.to_string(),
            top_n,
        }
    }

    pub fn validate(&self) -> Result<ValidatedRankRequest> {
        let study_type: StudyType = self.study_type.parse()?;
        let category_paths = dedup_paths(self.category_paths.iter().map(String::as_str));
        if category_paths.is_empty() {
            return Err(PharmalitError::MissingCategoryPath);
        }
        if self.top_n == 0 {
            return Err(PharmalitError::InvalidTopN(self.top_n));
        }
        Ok(ValidatedRankRequest {
            study_type,
            category_paths,
            query: self.query.trim().to_string(),
            top_n: self.top_n,
        })
    }
}

/// Split comma-joined entries, trim, drop empties and keep the first of any duplicate.
pub fn dedup_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for p in paths.into_iter().flat_map(|p| p.split(',')) {
        let p = p.trim();
        if !p.is_empty() && !out.iter().any(|o| o == p) {
            out.push(p.to_string());
        }
    }
    out
}

/// Query string for the external literature search, built from a drug term and the
/// category's primary keywords (or a caller-supplied override list).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    pub drug: String,
    pub keywords: Vec<String>,
    /// True when `keywords` came from the caller's custom list.
    pub custom: bool,
    pub term: String,
}

impl SearchQuery {
    pub fn build(
        resolver: &KeywordResolver,
        study: StudyType,
        category_path: &str,
        drug_query: &str,
        custom_keywords: Option<&str>,
    ) -> Result<Self> {
        let drug = drug_query.trim();
        if drug.is_empty() {
            return Err(PharmalitError::MissingQuery);
        }
        let category_path = category_path.trim();
        if category_path.is_empty() {
            return Err(PharmalitError::MissingCategoryPath);
        }

        let custom: Vec<String> = custom_keywords
            .map(|c| dedup_paths(std::iter::once(c)))
            .unwrap_or_default();
        let (keywords, is_custom) = if custom.is_empty() {
            (resolver.resolve_primary_search_keywords(study, category_path), false)
        } else {
            (custom, true)
        };

        let mut clauses = vec![format!("({})", tiab(drug))];
        if !keywords.is_empty() {
            let any: Vec<String> = keywords.iter().map(|k| tiab(k)).collect();
            clauses.push(format!("({})", any.join(" OR ")));
        }
        clauses.push(study.mesh_filter().to_string());

        Ok(Self {
            drug: drug.to_string(),
            keywords,
            custom: is_custom,
            term: clauses.join(" AND "),
        })
    }
}

/// `term[tiab]`, quoting multi-word phrases.
fn tiab(term: &str) -> String {
    if term.contains(char::is_whitespace) {
        format!("\"{term}\"[tiab]")
    } else {
        format!("{term}[tiab]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmalit_test_utils::sample_hierarchy;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_validate_ok() {
        let req = RankRequest {
            study_type: "Human".into(),
            category_paths: vec!["efficacy, safety".into(), "efficacy".into(), " ".into()],
            query: "  augmentin ".into(),
            top_n: 20,
        };
        let v = req.validate().unwrap();
        assert_eq!(v.study_type, StudyType::Human);
        assert_eq!(v.category_paths, vec!["efficacy".to_string(), "safety".to_string()]);
        assert_eq!(v.query, "augmentin");
    }

    #[test]
    fn test_validate_errors() {
        assert!(matches!(
            RankRequest::new("plant", "efficacy", "x", 5).validate(),
            Err(PharmalitError::InvalidStudyType(_))
        ));
        assert!(matches!(
            RankRequest::new("human", " , ", "x", 5).validate(),
            Err(PharmalitError::MissingCategoryPath)
        ));
        assert!(matches!(
            RankRequest::new("human", "efficacy", "x", 0).validate(),
            Err(PharmalitError::InvalidTopN(0))
        ));
        // An empty query is allowed for ranking.
        assert!(RankRequest::new("human", "efficacy", "", 5).validate().is_ok());
    }

    #[test]
    fn test_search_query_from_primary_keywords() {
        let resolver = KeywordResolver::new(sample_hierarchy());
        let q = SearchQuery::build(&resolver, StudyType::Human, "pharmacokinetics.absorption", "augmentin", None)
            .unwrap();
        assert!(!q.custom);
        assert!(q.term.starts_with("(augmentin[tiab]) AND ("));
        assert!(q.term.contains("\"Intestinal Absorption\"[tiab]"));
        assert!(q.term.ends_with(" AND humans[MeSH]"));
        assert!(q.keywords.len() <= 3);
    }

    #[test]
    fn test_search_query_custom_keywords_override() {
        let resolver = KeywordResolver::new(sample_hierarchy());
        let q = SearchQuery::build(&resolver, StudyType::Animal, "toxicity", "meloxicam", Some("nephrotoxicity, LD50"))
            .unwrap();
        assert!(q.custom);
        assert_eq!(q.keywords, vec!["nephrotoxicity".to_string(), "LD50".to_string()]);
        assert_eq!(
            q.term,
            "(meloxicam[tiab]) AND (nephrotoxicity[tiab] OR LD50[tiab]) AND animals[MeSH]"
        );
    }

    #[test]
    fn test_search_query_requires_query() {
        let resolver = KeywordResolver::new(sample_hierarchy());
        let err = SearchQuery::build(&resolver, StudyType::Human, "efficacy", "  ", None).unwrap_err();
        assert!(matches!(err, PharmalitError::MissingQuery));
    }
}
