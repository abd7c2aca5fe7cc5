//! Study type selector: which species context a search is about.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PharmalitError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyType {
    Animal,
    Human,
}

impl StudyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StudyType::Animal => "animal",
            StudyType::Human  => "human",
        }
    }

    /// The PubMed MeSH check tag used to restrict external searches to this species.
    pub fn mesh_filter(&self) -> &'static str {
        match self {
            StudyType::Animal => "animals[MeSH]",
            StudyType::Human  => "humans[MeSH]",
        }
    }
}

impl fmt::Display for StudyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyType {
    type Err = PharmalitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "animal" => Ok(StudyType::Animal),
            "human"  => Ok(StudyType::Human),
            _        => Err(PharmalitError::InvalidStudyType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("Human".parse::<StudyType>().unwrap(), StudyType::Human);
        assert_eq!(" animal ".parse::<StudyType>().unwrap(), StudyType::Animal);
    }

    #[test]
    fn test_parse_rejects_unknown() {
        let err = "plant".parse::<StudyType>().unwrap_err();
        assert!(matches!(err, PharmalitError::InvalidStudyType(s) if s == "plant"));
    }
}
