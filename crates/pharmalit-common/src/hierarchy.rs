//! Keyword hierarchy: per study type, a three-level tree of research categories
//! (category → subcategory → type), each node carrying search terms.
//!
//! The hierarchy is loaded once at startup and is read-only afterwards. Nothing in this
//! module hands out `&mut` access; share it as `Arc<KeywordHierarchy>`.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PharmalitError, Result};
use crate::study_type::StudyType;

/// One node of the category tree.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CategoryNode {
    /// Identifier segment used in category paths. Filled from the map key on load.
    #[serde(default, skip_serializing)]
    pub key: String,
    /// Display label; the key when omitted.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default, alias = "meshTerms")]
    pub mesh_terms: Vec<String>,
    #[serde(default, alias = "textKeywords")]
    pub text_keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub subcategories: BTreeMap<String, CategoryNode>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub types: BTreeMap<String, CategoryNode>,
}

impl CategoryNode {
    /// Direct children, whichever level they sit at.
    pub fn children(&self) -> impl Iterator<Item = &CategoryNode> {
        self.subcategories.values().chain(self.types.values())
    }
}

/// The full keyword hierarchy, keyed by study type.
#[derive(Debug, Clone, Default)]
pub struct KeywordHierarchy {
    studies: HashMap<StudyType, BTreeMap<String, CategoryNode>>,
}

impl KeywordHierarchy {
    /// Build from already-deserialised trees, filling keys and validating depth.
    pub fn new(studies: HashMap<StudyType, BTreeMap<String, CategoryNode>>) -> Result<Self> {
        let mut studies = studies;
        for (study, categories) in studies.iter_mut() {
            for (key, node) in categories.iter_mut() {
                finalise(node, key, 1, &format!("{study}.{key}"))?;
            }
        }
        Ok(Self { studies })
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let raw: HashMap<StudyType, BTreeMap<String, CategoryNode>> = serde_yaml::from_str(yaml)?;
        Self::new(raw)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let raw: HashMap<StudyType, BTreeMap<String, CategoryNode>> = serde_json::from_str(json)?;
        Self::new(raw)
    }

    /// Load from a `.yaml`/`.yml` or `.json` file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let hierarchy = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content)?,
            Some("yaml") | Some("yml") => Self::from_yaml_str(&content)?,
            other => {
                return Err(PharmalitError::Config(format!(
                    "unsupported hierarchy file extension {other:?} for {}",
                    path.display()
                )))
            }
        };
        info!(
            path = %path.display(),
            categories = hierarchy.category_count(),
            "Loaded keyword hierarchy"
        );
        Ok(hierarchy)
    }

    /// Top-level categories for a study type (empty when the study type has none).
    pub fn categories(&self, study: StudyType) -> Option<&BTreeMap<String, CategoryNode>> {
        self.studies.get(&study)
    }

    /// Total number of nodes across all study types.
    pub fn category_count(&self) -> usize {
        fn count(node: &CategoryNode) -> usize {
            1 + node.children().map(count).sum::<usize>()
        }
        self.studies
            .values()
            .flat_map(|cats| cats.values())
            .map(count)
            .sum()
    }
}

/// Set node keys from their map keys and enforce the three-level shape:
/// categories hold `subcategories`, subcategories hold `types`, types are leaves.
fn finalise(node: &mut CategoryNode, key: &str, depth: usize, path: &str) -> Result<()> {
    node.key = key.to_string();
    if node.name.trim().is_empty() {
        node.name = key.to_string();
    }

    let misplaced = match depth {
        1 => !node.types.is_empty(),
        2 => !node.subcategories.is_empty(),
        _ => !node.subcategories.is_empty() || !node.types.is_empty(),
    };
    if misplaced {
        return Err(PharmalitError::Config(format!(
            "category {path} has children at the wrong level (depth {depth})"
        )));
    }

    for (k, child) in node.subcategories.iter_mut().chain(node.types.iter_mut()) {
        finalise(child, k, depth + 1, &format!("{path}.{k}"))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
human:
  pharmacokinetics:
    name: Pharmacokinetics
    meshTerms: ["Pharmacokinetics[MeSH]"]
    subcategories:
      absorption:
        name: Absorption
        keywords: [absorption, bioavailability]
        types:
          oral:
            name: Oral Absorption
            text_keywords: [oral bioavailability]
animal:
  toxicity:
    name: Toxicity
"#;

    #[test]
    fn test_yaml_load_fills_keys() {
        let h = KeywordHierarchy::from_yaml_str(YAML).unwrap();
        let pk = &h.categories(StudyType::Human).unwrap()["pharmacokinetics"];
        assert_eq!(pk.key, "pharmacokinetics");
        assert_eq!(pk.mesh_terms, vec!["Pharmacokinetics[MeSH]".to_string()]);
        let oral = &pk.subcategories["absorption"].types["oral"];
        assert_eq!(oral.key, "oral");
        assert_eq!(oral.text_keywords, vec!["oral bioavailability".to_string()]);
        assert_eq!(h.category_count(), 4);
    }

    #[test]
    fn test_rejects_types_on_top_level() {
        let yaml = r#"
human:
  efficacy:
    name: Efficacy
    types:
      x: { name: X }
"#;
        let err = KeywordHierarchy::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, PharmalitError::Config(_)));
    }

    #[test]
    fn test_rejects_unknown_study_type() {
        assert!(KeywordHierarchy::from_yaml_str("plant: {}").is_err());
    }

    #[test]
    fn test_from_path_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml_path = dir.path().join("h.yaml");
        std::fs::write(&yaml_path, YAML).unwrap();
        assert!(KeywordHierarchy::from_path(&yaml_path).is_ok());

        let txt_path = dir.path().join("h.txt");
        std::fs::write(&txt_path, YAML).unwrap();
        assert!(matches!(
            KeywordHierarchy::from_path(&txt_path),
            Err(PharmalitError::Config(_))
        ));
    }
}
