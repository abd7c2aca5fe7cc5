//! The hierarchy shipped in config/ must load and resolve every category it declares.

use std::path::PathBuf;
use std::sync::Arc;

use pharmalit_common::{KeywordHierarchy, StudyType};
use pharmalit_ranker::{KeywordResolver, SearchQuery};

fn shipped() -> Arc<KeywordHierarchy> {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/keyword_hierarchy.yaml");
    Arc::new(KeywordHierarchy::from_path(&path).expect("shipped hierarchy parses"))
}

#[test]
fn test_shipped_hierarchy_covers_both_study_types() {
    let h = shipped();
    for study in [StudyType::Human, StudyType::Animal] {
        let cats = h.categories(study).expect("study type present");
        assert!(cats.contains_key("pharmacokinetics"));
        assert!(cats.contains_key("efficacy"));
    }
}

#[test]
fn test_every_declared_path_resolves() {
    let h = shipped();
    let resolver = KeywordResolver::new(h.clone());
    for study in [StudyType::Human, StudyType::Animal] {
        let cats = h.categories(study).expect("study type present");
        for (key, node) in cats {
            let mut paths = vec![key.clone()];
            for sub in node.subcategories.values() {
                paths.push(format!("{key}.{}", sub.key));
                for ty in sub.types.values() {
                    paths.push(format!("{key}.{}.{}", sub.key, ty.key));
                }
            }
            for path in paths {
                assert!(!resolver.resolve_keywords(study, &path).is_empty(), "{study} {path}");
                assert!(resolver.resolve_category_names(study, &path).is_some(), "{study} {path}");
                assert!(!resolver.resolve_primary_search_keywords(study, &path).is_empty(), "{study} {path}");
            }
        }
    }
}

#[test]
fn test_shipped_query_for_absorption() {
    let resolver = KeywordResolver::new(shipped());
    let q = SearchQuery::build(&resolver, StudyType::Human, "pharmacokinetics.absorption", "augmentin", None)
        .expect("query builds");
    assert!(q.term.starts_with("(augmentin[tiab]) AND ("));
    assert!(q.term.ends_with("AND humans[MeSH]"));
}
