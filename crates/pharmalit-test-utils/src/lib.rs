//! Shared fixtures for pharmalit tests: a small keyword hierarchy and an article builder.

use std::sync::Arc;

use pharmalit_common::{Article, KeywordHierarchy};

pub use pretty_assertions;

/// A compact hierarchy covering every depth and both study types.
pub const SAMPLE_HIERARCHY_YAML: &str = r#"
human:
  efficacy:
    name: Efficacy
    keywords: [efficacy, effectiveness]
    mesh_terms: ["Treatment Outcome[MeSH]"]
    text_keywords: [efficacy, therapeutic effect]
    subcategories:
      clinical_outcomes:
        name: Clinical Outcomes
        keywords: [clinical outcome, cure rate]
        mesh_terms: ["Treatment Outcome[MeSH]", "Remission Induction[MeSH]"]
        text_keywords: [efficacy, clinical response, cure, remission rate]
  safety:
    name: Safety
    keywords: [safety, adverse event]
    mesh_terms: ["Drug-Related Side Effects and Adverse Reactions[MeSH]"]
    text_keywords: [adverse effects, tolerability]
    subcategories:
      hepatotoxicity:
        name: Hepatotoxicity
        keywords: [hepatotoxicity, liver injury]
        mesh_terms: ["Chemical and Drug Induced Liver Injury[MeSH]"]
        text_keywords: [liver enzymes]
  pharmacokinetics:
    name: Pharmacokinetics
    keywords: [pharmacokinetics]
    mesh_terms: ["Pharmacokinetics[MeSH]"]
    text_keywords: [plasma concentration, half-life]
    subcategories:
      absorption:
        name: Absorption
        keywords: [absorption, bioavailability]
        mesh_terms: ["Intestinal Absorption[MeSH]", "Biological Availability[MeSH]"]
        text_keywords: [cmax, tmax]
        types:
          oral:
            name: Oral Absorption
            text_keywords: [oral bioavailability]
      metabolism:
        name: Metabolism
        keywords: [metabolism, hepatic metabolism]
        mesh_terms: ["Pharmacokinetics[MeSH]", "Cytochrome P-450 Enzyme System[MeSH]"]
        text_keywords: [metabolite, clearance]
animal:
  toxicity:
    name: Toxicity
    keywords: [toxicity, LD50]
    mesh_terms: ["Toxicity Tests[MeSH]"]
    text_keywords: [lethal dose, organ toxicity]
  pharmacokinetics:
    name: Pharmacokinetics
    keywords: [pharmacokinetics]
    mesh_terms: ["Pharmacokinetics[MeSH]"]
    text_keywords: [plasma concentration]
    subcategories:
      absorption:
        name: Absorption
        keywords: [absorption, bioavailability]
        mesh_terms: ["Intestinal Absorption[MeSH]"]
"#;

/// The sample hierarchy, parsed and shared.
pub fn sample_hierarchy() -> Arc<KeywordHierarchy> {
    match KeywordHierarchy::from_yaml_str(SAMPLE_HIERARCHY_YAML) {
        Ok(h) => Arc::new(h),
        Err(e) => panic!("sample hierarchy must parse: {e}"),
    }
}

/// Fluent builder for test articles. Every field not set stays empty.
#[derive(Debug, Clone, Default)]
pub struct ArticleBuilder {
    article: Article,
}

impl ArticleBuilder {
    pub fn new(pmid: &str) -> Self {
        Self {
            article: Article {
                pmid: pmid.to_string(),
                url: format!("https://pubmed.ncbi.nlm.nih.gov/{pmid}/"),
                ..Default::default()
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.article.title = title.to_string();
        self
    }

    pub fn abstract_text(mut self, text: &str) -> Self {
        self.article.abstract_text = text.to_string();
        self
    }

    pub fn mesh<'a>(mut self, terms: impl IntoIterator<Item = &'a str>) -> Self {
        self.article.mesh_terms = terms.into_iter().map(String::from).collect();
        self
    }

    pub fn keywords<'a>(mut self, terms: impl IntoIterator<Item = &'a str>) -> Self {
        self.article.keywords = terms.into_iter().map(String::from).collect();
        self
    }

    pub fn authors<'a>(mut self, names: impl IntoIterator<Item = &'a str>) -> Self {
        self.article.authors = names.into_iter().map(String::from).collect();
        self
    }

    pub fn journal(mut self, journal: &str) -> Self {
        self.article.journal = journal.to_string();
        self
    }

    pub fn build(self) -> Article {
        self.article
    }

    /// The article as the loose JSON a literature source would return.
    pub fn build_json(self) -> serde_json::Value {
        serde_json::json!({
            "pmid": self.article.pmid,
            "title": self.article.title,
            "abstract": self.article.abstract_text,
            "authors": self.article.authors,
            "journal": self.article.journal,
            "meshTerms": self.article.mesh_terms,
            "keywords": self.article.keywords,
            "url": self.article.url,
        })
    }
}
