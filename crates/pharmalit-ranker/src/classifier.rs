//! Study-type classification: a conservative heuristic that drops articles whose
//! species context clearly conflicts with the requested study type.
//!
//! Scores are a weighted vote: a MeSH hit counts 10, a term in the title 3, a term in
//! the abstract 1. Only clear conflicts are excluded; everything else passes.

use serde::Serialize;

use pharmalit_common::{Article, StudyType};

use crate::text::{compile_terms, mesh_heading, TermPattern};

const MESH_HIT: u32 = 10;
const TITLE_HIT: u32 = 3;
const ABSTRACT_HIT: u32 = 1;

/// Animal models need at least this score to survive against human-only MeSH.
const MIN_ANIMAL_SCORE: u32 = 3;

const ANIMAL_TERMS: &[&str] = &[
    "animal", "animals", "animal model", "animal models", "in vivo",
    "rat", "rats", "mouse", "mice", "murine", "rodent", "rodents",
    "rabbit", "rabbits", "hamster", "hamsters", "guinea pig", "guinea pigs",
    "dog", "dogs", "canine", "beagle", "beagles", "cat", "cats", "feline",
    "pig", "pigs", "piglets", "swine", "porcine", "minipig", "minipigs",
    "sheep", "ovine", "cattle", "bovine", "calves", "horse", "horses", "equine",
    "monkey", "monkeys", "macaque", "macaques", "primate", "primates", "cynomolgus",
    "zebrafish", "chicken", "chickens", "broiler", "broilers",
    "sprague-dawley", "sprague dawley", "wistar", "c57bl/6", "balb/c",
    "knockout mice", "transgenic mice", "xenograft",
];

const HUMAN_TERMS: &[&str] = &[
    "patient", "patients", "human", "humans", "volunteer", "volunteers",
    "healthy subjects", "subjects", "participants", "outpatients", "inpatients",
    "men", "women", "adults", "adult", "children", "child", "adolescents",
    "infants", "neonates", "elderly", "pregnant women",
    "clinical trial", "randomized", "randomised", "randomized controlled trial",
    "double-blind", "double blind", "single-blind", "placebo-controlled", "open-label",
    "phase i", "phase ii", "phase iii", "phase iv", "cohort", "case series",
];

const ANIMAL_MESH_TERMS: &[&str] = &[
    "animals", "rats", "mice", "rabbits", "dogs", "cats", "swine", "sheep", "cattle",
    "horses", "guinea pigs", "cricetinae", "macaca", "macaca mulatta", "macaca fascicularis",
    "haplorhini", "zebrafish", "chickens", "disease models, animal",
    "rats, sprague-dawley", "rats, wistar", "mice, inbred c57bl", "mice, inbred balb c",
    "mice, knockout", "mice, transgenic", "swine, miniature",
];

const HUMAN_MESH_TERMS: &[&str] = &[
    "humans", "adult", "aged", "aged, 80 and over", "middle aged", "young adult",
    "adolescent", "child", "child, preschool", "infant", "infant, newborn",
];

/// Title phrases that mark a study as an animal study outright.
const ANIMAL_MODEL_TITLE_PHRASES: &[&str] = &[
    "in rats", "in rat", "in a rat", "in mice", "in mouse", "in a mouse",
    "rat model", "mouse model", "murine model", "animal model", "in rodents",
    "in dogs", "in rabbits", "in pigs", "in swine", "in monkeys", "in sheep",
    "in cattle", "in horses", "in zebrafish",
];

/// Title phrases that mark a study as a human clinical study outright.
const CLINICAL_TRIAL_TITLE_PHRASES: &[&str] = &[
    "randomized controlled trial", "randomised controlled trial",
    "randomized clinical trial", "randomised clinical trial", "clinical trial",
    "double-blind", "double blind", "placebo-controlled", "phase i trial",
    "phase ii trial", "phase iii trial", "in patients with", "in healthy volunteers",
];

/// Why an article was excluded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum ExclusionReason {
    AnimalModelInTitle(String),
    AnimalMeshWithoutHuman,
    AnimalTitleOutweighsHuman,
    ClinicalTrialInTitle(String),
    HumanMeshWithoutAnimal,
}

impl ExclusionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExclusionReason::AnimalModelInTitle(_)     => "animal_model_in_title",
            ExclusionReason::AnimalMeshWithoutHuman    => "animal_mesh_without_human",
            ExclusionReason::AnimalTitleOutweighsHuman => "animal_title_outweighs_human",
            ExclusionReason::ClinicalTrialInTitle(_)   => "clinical_trial_in_title",
            ExclusionReason::HumanMeshWithoutAnimal    => "human_mesh_without_animal",
        }
    }
}

/// Species evidence for one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub animal_score: u32,
    pub human_score: u32,
    pub has_animal_mesh: bool,
    pub has_human_mesh: bool,
    pub animal_term_in_title: bool,
    pub exclusion: Option<ExclusionReason>,
}

pub struct StudyTypeClassifier {
    animal_terms: Vec<TermPattern>,
    human_terms: Vec<TermPattern>,
    animal_model_phrases: Vec<TermPattern>,
    clinical_trial_phrases: Vec<TermPattern>,
}

impl Default for StudyTypeClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl StudyTypeClassifier {
    pub fn new() -> Self {
        Self {
            animal_terms: compile_terms(ANIMAL_TERMS.iter().copied()),
            human_terms: compile_terms(HUMAN_TERMS.iter().copied()),
            animal_model_phrases: compile_terms(ANIMAL_MODEL_TITLE_PHRASES.iter().copied()),
            clinical_trial_phrases: compile_terms(CLINICAL_TRIAL_TITLE_PHRASES.iter().copied()),
        }
    }

    /// True when the article's species context conflicts with `study`.
    pub fn should_exclude(&self, article: &Article, study: StudyType) -> bool {
        self.classify(article, study).exclusion.is_some()
    }

    pub fn classify(&self, article: &Article, study: StudyType) -> Classification {
        let title = article.title.to_lowercase();
        let abstract_text = article.abstract_text.to_lowercase();

        let mut animal_mesh_hits = 0u32;
        let mut human_mesh_hits = 0u32;
        for term in &article.mesh_terms {
            let term = mesh_heading(term);
            if ANIMAL_MESH_TERMS.contains(&term.as_str()) {
                animal_mesh_hits += 1;
            }
            if HUMAN_MESH_TERMS.contains(&term.as_str()) {
                human_mesh_hits += 1;
            }
        }

        let (animal_title, animal_abstract) = term_hits(&self.animal_terms, &title, &abstract_text);
        let (human_title, human_abstract) = term_hits(&self.human_terms, &title, &abstract_text);

        let animal_score =
            animal_mesh_hits * MESH_HIT + animal_title * TITLE_HIT + animal_abstract * ABSTRACT_HIT;
        let human_score =
            human_mesh_hits * MESH_HIT + human_title * TITLE_HIT + human_abstract * ABSTRACT_HIT;

        let mut c = Classification {
            animal_score,
            human_score,
            has_animal_mesh: animal_mesh_hits > 0,
            has_human_mesh: human_mesh_hits > 0,
            animal_term_in_title: animal_title > 0,
            exclusion: None,
        };

        c.exclusion = match study {
            StudyType::Human => {
                if let Some(phrase) = find_phrase(&self.animal_model_phrases, &title) {
                    Some(ExclusionReason::AnimalModelInTitle(phrase.to_string()))
                } else if c.has_animal_mesh && !c.has_human_mesh {
                    Some(ExclusionReason::AnimalMeshWithoutHuman)
                } else if c.animal_term_in_title && human_score < animal_score {
                    Some(ExclusionReason::AnimalTitleOutweighsHuman)
                } else {
                    None
                }
            }
            StudyType::Animal => {
                if let Some(phrase) = find_phrase(&self.clinical_trial_phrases, &title) {
                    Some(ExclusionReason::ClinicalTrialInTitle(phrase.to_string()))
                } else if c.has_human_mesh
                    && !c.has_animal_mesh
                    && animal_score < MIN_ANIMAL_SCORE
                {
                    Some(ExclusionReason::HumanMeshWithoutAnimal)
                } else {
                    None
                }
            }
        };
        c
    }
}

/// Number of distinct terms found in the title and in the abstract.
fn term_hits(terms: &[TermPattern], title: &str, abstract_text: &str) -> (u32, u32) {
    terms.iter().fold((0, 0), |(t, a), term| {
        (
            t + u32::from(term.matches_word(title)),
            a + u32::from(term.matches_word(abstract_text)),
        )
    })
}

fn find_phrase<'a>(phrases: &'a [TermPattern], title: &str) -> Option<&'a str> {
    phrases.iter().find(|p| p.matches_word(title)).map(TermPattern::term)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pharmalit_test_utils::ArticleBuilder;

    #[test]
    fn test_human_rejects_animal_model_phrase() {
        let a = ArticleBuilder::new("1")
            .title("Augmentin efficacy in rats: a randomized controlled trial")
            .build();
        let c = StudyTypeClassifier::new().classify(&a, StudyType::Human);
        assert_eq!(c.exclusion, Some(ExclusionReason::AnimalModelInTitle("in rats".into())));
    }

    #[test]
    fn test_phrases_respect_word_boundaries() {
        let a = ArticleBuilder::new("1")
            .title("Changes in rates of amoxicillin resistance in a rational dosing era")
            .build();
        assert!(!StudyTypeClassifier::new().should_exclude(&a, StudyType::Human));
    }

    #[test]
    fn test_human_keeps_pediatric_trial() {
        let a = ArticleBuilder::new("1")
            .title("Augmentin efficacy in children: a randomized controlled trial")
            .build();
        assert!(!StudyTypeClassifier::new().should_exclude(&a, StudyType::Human));
    }

    #[test]
    fn test_animal_mesh_asymmetry() {
        let a = ArticleBuilder::new("1")
            .title("Amoxicillin plasma levels")
            .mesh(["Animals"])
            .build();
        let clf = StudyTypeClassifier::new();
        assert!(clf.should_exclude(&a, StudyType::Human));
        assert!(!clf.should_exclude(&a, StudyType::Animal));
    }

    #[test]
    fn test_mesh_qualifiers_are_ignored() {
        let a = ArticleBuilder::new("1").mesh(["Rats, Wistar/metabolism*"]).build();
        let c = StudyTypeClassifier::new().classify(&a, StudyType::Human);
        assert!(c.has_animal_mesh);
        assert_eq!(c.exclusion, Some(ExclusionReason::AnimalMeshWithoutHuman));
    }

    #[test]
    fn test_human_rejects_animal_title_outweighing_human() {
        let a = ArticleBuilder::new("1")
            .title("Hepatic clearance of cefuroxime in beagle dogs")
            .build();
        let c = StudyTypeClassifier::new().classify(&a, StudyType::Human);
        assert_eq!(c.exclusion, Some(ExclusionReason::AnimalTitleOutweighsHuman));
    }

    #[test]
    fn test_human_keeps_mixed_evidence_when_human_dominates() {
        let a = ArticleBuilder::new("1")
            .title("Translating mouse data to patients: dosing in adults")
            .abstract_text("Healthy volunteers and patients were enrolled.")
            .mesh(["Humans", "Adult", "Animals"])
            .build();
        assert!(!StudyTypeClassifier::new().should_exclude(&a, StudyType::Human));
    }

    #[test]
    fn test_animal_rejects_clinical_trial_title() {
        let a = ArticleBuilder::new("1")
            .title("A double-blind study of meloxicam")
            .build();
        let c = StudyTypeClassifier::new().classify(&a, StudyType::Animal);
        assert_eq!(c.exclusion, Some(ExclusionReason::ClinicalTrialInTitle("double-blind".into())));
    }

    #[test]
    fn test_animal_rejects_human_mesh_only() {
        let a = ArticleBuilder::new("1")
            .title("Meloxicam exposure")
            .mesh(["Humans", "Middle Aged"])
            .build();
        let c = StudyTypeClassifier::new().classify(&a, StudyType::Animal);
        assert_eq!(c.exclusion, Some(ExclusionReason::HumanMeshWithoutAnimal));

        let with_signal = ArticleBuilder::new("2")
            .title("Meloxicam exposure in rabbits")
            .mesh(["Humans"])
            .build();
        assert!(!StudyTypeClassifier::new().should_exclude(&with_signal, StudyType::Animal));
    }

    #[test]
    fn test_scores_weight_title_over_abstract() {
        let a = ArticleBuilder::new("1")
            .title("Mice")
            .abstract_text("rats")
            .mesh(["Animals"])
            .build();
        let c = StudyTypeClassifier::new().classify(&a, StudyType::Animal);
        assert_eq!(c.animal_score, 10 + 3 + 1);
        assert_eq!(c.human_score, 0);
    }
}
