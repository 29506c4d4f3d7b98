use std::collections::BTreeSet;
use std::collections::HashSet;

use crate::domain::{ConditionLabel, HarmonizedRecord, QualityReport, StudyAccession};

pub const DEFAULT_MIN_SAMPLES: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct QualityPolicy {
    pub min_samples: usize,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            min_samples: DEFAULT_MIN_SAMPLES,
        }
    }
}

/// Validates one study's harmonized records. Records with a blank sample id
/// and later occurrences of a duplicated id are dropped; everything else is
/// retained and only reported on.
pub fn check_study(
    study_id: &StudyAccession,
    records: Vec<HarmonizedRecord>,
    policy: &QualityPolicy,
) -> (Vec<HarmonizedRecord>, QualityReport) {
    let mut retained = Vec::with_capacity(records.len());
    let mut seen_ids: HashSet<String> = HashSet::new();
    let mut duplicate_ids: BTreeSet<String> = BTreeSet::new();
    let mut warnings = Vec::new();
    let mut unknown_count = 0;

    for record in records {
        if record.sample_id.trim().is_empty() {
            warnings.push(format!(
                "dropped sample with empty accession (source: {:?})",
                record.source_text
            ));
            continue;
        }
        if !seen_ids.insert(record.sample_id.clone()) {
            warnings.push(format!(
                "dropped duplicate sample accession {}",
                record.sample_id
            ));
            duplicate_ids.insert(record.sample_id.clone());
            continue;
        }
        if record.condition == ConditionLabel::Unknown {
            unknown_count += 1;
            warnings.push(format!(
                "sample {} has no recognized condition keyword",
                record.sample_id
            ));
        }
        retained.push(record);
    }

    if retained.len() < policy.min_samples {
        warnings.push(format!(
            "study has {} samples, below minimum {}",
            retained.len(),
            policy.min_samples
        ));
    }

    let report = QualityReport {
        study_id: study_id.clone(),
        total_samples: retained.len(),
        unknown_count,
        duplicate_ids,
        warnings,
    };
    (retained, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn harmonized(sample_id: &str, condition: ConditionLabel) -> HarmonizedRecord {
        HarmonizedRecord {
            study_id: "GSE1".parse().unwrap(),
            sample_id: sample_id.to_string(),
            condition,
            source_text: "tissue".to_string(),
        }
    }

    #[test]
    fn duplicate_keeps_first_occurrence() {
        let study = "GSE1".parse().unwrap();
        let records = vec![
            harmonized("GSM1", ConditionLabel::Control),
            harmonized("GSM1", ConditionLabel::Treated),
            harmonized("GSM2", ConditionLabel::Treated),
        ];
        let (retained, report) = check_study(&study, records, &QualityPolicy::default());

        assert_eq!(retained.len(), 2);
        assert_eq!(retained[0].condition, ConditionLabel::Control);
        assert!(report.duplicate_ids.contains("GSM1"));
        assert_eq!(report.total_samples, 2);
    }

    #[test]
    fn empty_sample_id_is_dropped_with_warning() {
        let study = "GSE1".parse().unwrap();
        let records = vec![
            harmonized("", ConditionLabel::Control),
            harmonized("GSM2", ConditionLabel::Control),
            harmonized("GSM3", ConditionLabel::Control),
        ];
        let (retained, report) = check_study(&study, records, &QualityPolicy::default());

        assert_eq!(retained.len(), 2);
        assert!(
            report
                .warnings
                .iter()
                .any(|warning| warning.contains("empty accession"))
        );
    }

    #[test]
    fn unknown_condition_is_retained_and_counted() {
        let study = "GSE1".parse().unwrap();
        let records = vec![
            harmonized("GSM1", ConditionLabel::Unknown),
            harmonized("GSM2", ConditionLabel::Control),
        ];
        let (retained, report) = check_study(&study, records, &QualityPolicy::default());

        assert_eq!(retained.len(), 2);
        assert_eq!(report.unknown_count, 1);
    }

    #[test]
    fn small_study_warns_but_is_retained() {
        let study = "GSE1".parse().unwrap();
        let records = vec![harmonized("GSM1", ConditionLabel::Control)];
        let (retained, report) = check_study(&study, records, &QualityPolicy { min_samples: 3 });

        assert_eq!(retained.len(), 1);
        assert!(
            report
                .warnings
                .iter()
                .any(|warning| warning.contains("below minimum 3"))
        );
    }
}
