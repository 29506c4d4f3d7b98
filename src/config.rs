use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::classify::{ConditionRule, RuleTable};
use crate::domain::ConditionLabel;
use crate::error::HarmonizeError;
use crate::quality::{DEFAULT_MIN_SAMPLES, QualityPolicy};

pub const DEFAULT_CONFIG_FILE: &str = "geo-mh.json";

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub rules: Vec<RuleEntry>,
    #[serde(default)]
    pub min_samples: Option<usize>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RuleEntry {
    Shorthand(String),
    Detailed(RuleEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RuleEntryObject {
    pub keyword: String,
    pub label: ConditionLabel,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub rules: RuleTable,
    pub policy: QualityPolicy,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            rules: RuleTable::default(),
            policy: QualityPolicy::default(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolves configuration. An explicit path must exist; without one the
    /// working-directory `geo-mh.json` is used when present, and the
    /// built-in rule table otherwise.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, HarmonizeError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| HarmonizeError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| HarmonizeError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, HarmonizeError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let rules = if config.rules.is_empty() {
            RuleTable::default()
        } else {
            let rules = config
                .rules
                .into_iter()
                .map(|entry| match entry {
                    RuleEntry::Shorthand(value) => parse_shorthand(&value),
                    RuleEntry::Detailed(obj) => Ok(ConditionRule {
                        keyword: obj.keyword,
                        label: obj.label,
                    }),
                })
                .collect::<Result<Vec<_>, HarmonizeError>>()?;
            RuleTable::new(rules)?
        };

        Ok(ResolvedConfig {
            schema_version,
            rules,
            policy: QualityPolicy {
                min_samples: config.min_samples.unwrap_or(DEFAULT_MIN_SAMPLES),
            },
        })
    }
}

fn parse_shorthand(value: &str) -> Result<ConditionRule, HarmonizeError> {
    let (keyword, label) = value
        .split_once('=')
        .ok_or_else(|| HarmonizeError::InvalidRule(value.to_string()))?;
    Ok(ConditionRule {
        keyword: keyword.to_string(),
        label: label.parse()?,
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn resolve_shorthand_and_detailed_rules() {
        let config = Config {
            schema_version: None,
            rules: vec![
                RuleEntry::Shorthand("sham=control".to_string()),
                RuleEntry::Detailed(RuleEntryObject {
                    keyword: "xenograft".to_string(),
                    label: ConditionLabel::Treated,
                }),
            ],
            min_samples: Some(4),
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.schema_version, 1);
        assert_eq!(resolved.policy.min_samples, 4);
        assert_eq!(resolved.rules.rules().len(), 2);
        assert_eq!(resolved.rules.rules()[0].keyword, "sham");
        assert_eq!(resolved.rules.rules()[0].label, ConditionLabel::Control);
        assert_eq!(resolved.rules.rules()[1].label, ConditionLabel::Treated);
    }

    #[test]
    fn empty_rule_list_keeps_defaults() {
        let config = Config {
            schema_version: None,
            rules: Vec::new(),
            min_samples: None,
        };

        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.policy.min_samples, DEFAULT_MIN_SAMPLES);
        assert_eq!(resolved.rules.rules(), RuleTable::default().rules());
    }

    #[test]
    fn malformed_shorthand_is_rejected() {
        let config = Config {
            schema_version: None,
            rules: vec![RuleEntry::Shorthand("no-separator".to_string())],
            min_samples: None,
        };

        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, HarmonizeError::InvalidRule(_));
    }
}
