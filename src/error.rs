use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum HarmonizeError {
    #[error("invalid GEO study accession: {0}")]
    InvalidStudyAccession(String),

    #[error("{study}: no !Sample_geo_accession line in series matrix")]
    MissingAccessionLine { study: String },

    #[error("{study}: {label} line has {found} columns, expected {expected}")]
    ColumnCountMismatch {
        study: String,
        label: String,
        expected: usize,
        found: usize,
    },

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("rule table is empty")]
    EmptyRuleTable,

    #[error("invalid condition rule: {0}")]
    InvalidRule(String),

    #[error("no study accession in input file name: {0}")]
    UnresolvedStudy(String),

    #[error("no study parsed successfully, nothing to write")]
    NoUsableInput,

    #[error("failed to write {path}: {message}")]
    Write { path: String, message: String },

    #[error("filesystem error: {0}")]
    Filesystem(String),
}
