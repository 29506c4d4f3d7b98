use serde::{Deserialize, Serialize};

use crate::domain::{ConditionLabel, RawRecord};
use crate::error::HarmonizeError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionRule {
    pub keyword: String,
    pub label: ConditionLabel,
}

/// Ordered decision list over free-text sample annotations. Rule order is
/// load-bearing: the first keyword found in a field wins, so broader
/// keywords ("tumor") must come after the negating ones ("non-tumor").
#[derive(Debug, Clone)]
pub struct RuleTable {
    rules: Vec<ConditionRule>,
}

impl RuleTable {
    pub fn new(rules: Vec<ConditionRule>) -> Result<Self, HarmonizeError> {
        if rules.is_empty() {
            return Err(HarmonizeError::EmptyRuleTable);
        }
        let rules = rules
            .into_iter()
            .map(|rule| {
                let keyword = rule.keyword.trim().to_lowercase();
                if keyword.is_empty() {
                    return Err(HarmonizeError::InvalidRule(
                        "blank keyword".to_string(),
                    ));
                }
                Ok(ConditionRule {
                    keyword,
                    label: rule.label,
                })
            })
            .collect::<Result<Vec<_>, HarmonizeError>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &[ConditionRule] {
        &self.rules
    }

    /// Classifies one record. Characteristic values are scanned in
    /// extraction order, then the title; the first field containing any
    /// keyword decides the label and becomes the source text.
    pub fn classify(&self, record: &RawRecord) -> (ConditionLabel, String) {
        let candidates = record
            .characteristics
            .iter()
            .map(|characteristic| characteristic.value.as_str())
            .chain(std::iter::once(record.title.as_str()));

        for field in candidates {
            if field.is_empty() {
                continue;
            }
            if let Some(label) = self.match_field(field) {
                return (label, field.to_string());
            }
        }

        (ConditionLabel::Unknown, record.title.clone())
    }

    fn match_field(&self, field: &str) -> Option<ConditionLabel> {
        let lowered = field.to_lowercase();
        self.rules
            .iter()
            .find(|rule| lowered.contains(&rule.keyword))
            .map(|rule| rule.label)
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        // Built-in keywords are already lowercase and non-blank.
        Self {
            rules: default_rules(),
        }
    }
}

/// Keyword blocks in precedence order: control vocabulary first, so a field
/// mentioning both ("control vs treated") resolves to control.
pub fn default_rules() -> Vec<ConditionRule> {
    let control = [
        "normal",
        "control",
        "healthy",
        "non-tumor",
        "non tumor",
        "untreated",
        "vehicle",
    ];
    let treated = ["tumor", "carcinoma", "cancer", "treated", "case", "disease"];

    control
        .into_iter()
        .map(|keyword| ConditionRule {
            keyword: keyword.to_string(),
            label: ConditionLabel::Control,
        })
        .chain(treated.into_iter().map(|keyword| ConditionRule {
            keyword: keyword.to_string(),
            label: ConditionLabel::Treated,
        }))
        .collect()
}
