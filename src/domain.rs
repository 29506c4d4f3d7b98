use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HarmonizeError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StudyAccession(String);

impl StudyAccession {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StudyAccession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StudyAccession {
    type Err = HarmonizeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        let digits = normalized.strip_prefix("GSE");
        let is_valid = digits
            .map(|rest| !rest.is_empty() && rest.chars().all(|ch| ch.is_ascii_digit()))
            .unwrap_or(false);
        if !is_valid {
            return Err(HarmonizeError::InvalidStudyAccession(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConditionLabel {
    Control,
    Treated,
    Unknown,
}

impl fmt::Display for ConditionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionLabel::Control => write!(f, "control"),
            ConditionLabel::Treated => write!(f, "treated"),
            ConditionLabel::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for ConditionLabel {
    type Err = HarmonizeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "control" => Ok(ConditionLabel::Control),
            "treated" => Ok(ConditionLabel::Treated),
            "unknown" => Ok(ConditionLabel::Unknown),
            _ => Err(HarmonizeError::InvalidRule(format!(
                "unknown condition label: {value}"
            ))),
        }
    }
}

/// One `key: value` pair from a `!Sample_characteristics_ch1` column.
/// Bare values keep an empty key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Characteristic {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub study_id: StudyAccession,
    pub sample_id: String,
    pub title: String,
    pub characteristics: Vec<Characteristic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HarmonizedRecord {
    pub study_id: StudyAccession,
    pub sample_id: String,
    pub condition: ConditionLabel,
    pub source_text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub study_id: StudyAccession,
    pub total_samples: usize,
    pub unknown_count: usize,
    pub duplicate_ids: BTreeSet<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_study_accession_valid() {
        let acc: StudyAccession = "gse66957".parse().unwrap();
        assert_eq!(acc.as_str(), "GSE66957");
    }

    #[test]
    fn parse_study_accession_invalid() {
        let err = "GSM123".parse::<StudyAccession>().unwrap_err();
        assert_matches!(err, HarmonizeError::InvalidStudyAccession(_));

        let err = "GSE".parse::<StudyAccession>().unwrap_err();
        assert_matches!(err, HarmonizeError::InvalidStudyAccession(_));
    }

    #[test]
    fn condition_label_round_trip() {
        for label in [
            ConditionLabel::Control,
            ConditionLabel::Treated,
            ConditionLabel::Unknown,
        ] {
            let parsed: ConditionLabel = label.to_string().parse().unwrap();
            assert_eq!(parsed, label);
        }
    }

    #[test]
    fn condition_label_rejects_unmapped_text() {
        let err = "tumour".parse::<ConditionLabel>().unwrap_err();
        assert_matches!(err, HarmonizeError::InvalidRule(_));
    }
}
