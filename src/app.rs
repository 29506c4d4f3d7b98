use std::time::Duration;

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;

use crate::classify::ConditionRule;
use crate::config::ResolvedConfig;
use crate::domain::{HarmonizedRecord, QualityReport, StudyAccession};
use crate::error::HarmonizeError;
use crate::fs_util::{read_matrix_text, study_id_from_path};
use crate::matrix::parse_series_matrix;
use crate::quality::check_study;
use crate::table::{write_diagnostics, write_harmonized_table};

#[derive(Debug, Clone)]
pub struct HarmonizeOptions {
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HarmonizeResult {
    pub studies: Vec<StudyOutcome>,
    pub rows_written: usize,
    pub table_path: String,
    pub diagnostics_path: String,
    pub dry_run: bool,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StudyOutcome {
    pub input: String,
    pub study_id: Option<String>,
    pub status: String,
    pub samples: usize,
    pub unknown: usize,
    pub dropped: usize,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RulesResult {
    pub rules: Vec<ConditionRule>,
    pub min_samples: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App {
    config: ResolvedConfig,
}

impl App {
    pub fn new(config: ResolvedConfig) -> Self {
        Self { config }
    }

    /// Runs the full pipeline over the inputs in order. A study that fails
    /// to read or parse is reported and skipped; the run only fails when no
    /// study survives or when an output cannot be written.
    pub fn harmonize(
        &self,
        inputs: &[Utf8PathBuf],
        table_path: &Utf8Path,
        diagnostics_path: &Utf8Path,
        options: HarmonizeOptions,
        sink: &dyn ProgressSink,
    ) -> Result<HarmonizeResult, HarmonizeError> {
        let mut records: Vec<HarmonizedRecord> = Vec::new();
        let mut reports: Vec<QualityReport> = Vec::new();
        let mut outcomes: Vec<StudyOutcome> = Vec::new();

        for input in inputs {
            sink.event(ProgressEvent {
                message: format!("phase=Extract; {input}"),
                elapsed: None,
            });
            match self.process_study(input) {
                Ok(study) => {
                    outcomes.push(StudyOutcome {
                        input: input.to_string(),
                        study_id: Some(study.report.study_id.to_string()),
                        status: "harmonized".to_string(),
                        samples: study.report.total_samples,
                        unknown: study.report.unknown_count,
                        dropped: study.extracted - study.records.len(),
                        error: None,
                    });
                    records.extend(study.records);
                    reports.push(study.report);
                }
                Err(err) => {
                    tracing::warn!(input = %input, error = %err, "study skipped");
                    outcomes.push(StudyOutcome {
                        input: input.to_string(),
                        study_id: study_id_from_path(input)
                            .ok()
                            .map(|acc| acc.to_string()),
                        status: "failed".to_string(),
                        samples: 0,
                        unknown: 0,
                        dropped: 0,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        if reports.is_empty() {
            return Err(HarmonizeError::NoUsableInput);
        }

        if !options.dry_run {
            sink.event(ProgressEvent {
                message: format!("phase=Assemble; writing {table_path}"),
                elapsed: None,
            });
            write_harmonized_table(table_path, &records)?;
            write_diagnostics(diagnostics_path, &reports)?;
        }

        Ok(HarmonizeResult {
            studies: outcomes,
            rows_written: if options.dry_run { 0 } else { records.len() },
            table_path: table_path.to_string(),
            diagnostics_path: diagnostics_path.to_string(),
            dry_run: options.dry_run,
            generated_at: iso_timestamp(),
        })
    }

    pub fn rules(&self, sink: &dyn ProgressSink) -> RulesResult {
        sink.event(ProgressEvent {
            message: "phase=Resolve; listing rule table".to_string(),
            elapsed: None,
        });
        RulesResult {
            rules: self.config.rules.rules().to_vec(),
            min_samples: self.config.policy.min_samples,
        }
    }

    fn process_study(&self, input: &Utf8Path) -> Result<StudyRun, HarmonizeError> {
        let study: StudyAccession = study_id_from_path(input)?;
        let text = read_matrix_text(input)?;
        let raw = parse_series_matrix(&study, &text)?;
        let extracted = raw.len();

        let harmonized = raw
            .iter()
            .map(|record| {
                let (condition, source_text) = self.config.rules.classify(record);
                HarmonizedRecord {
                    study_id: record.study_id.clone(),
                    sample_id: record.sample_id.clone(),
                    condition,
                    source_text,
                }
            })
            .collect();

        let (records, report) = check_study(&study, harmonized, &self.config.policy);
        Ok(StudyRun {
            records,
            report,
            extracted,
        })
    }
}

struct StudyRun {
    records: Vec<HarmonizedRecord>,
    report: QualityReport,
    extracted: usize,
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::JsonOutput;

    fn write_input(dir: &std::path::Path, name: &str, text: &str) -> Utf8PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        Utf8PathBuf::from_path_buf(path).unwrap()
    }

    #[test]
    fn dry_run_reports_without_writing() {
        let temp = tempfile::tempdir().unwrap();
        let input = write_input(
            temp.path(),
            "GSE11_series_matrix.txt",
            "!Sample_geo_accession\t\"GSM1\"\t\"GSM2\"\n\
             !Sample_characteristics_ch1\t\"control\"\t\"treated\"\n",
        );
        let table = Utf8PathBuf::from_path_buf(temp.path().join("out.csv")).unwrap();
        let diagnostics = Utf8PathBuf::from_path_buf(temp.path().join("diag.csv")).unwrap();

        let app = App::new(ResolvedConfig::default());
        let result = app
            .harmonize(
                &[input],
                &table,
                &diagnostics,
                HarmonizeOptions { dry_run: true },
                &JsonOutput,
            )
            .unwrap();

        assert_eq!(result.rows_written, 0);
        assert_eq!(result.studies[0].samples, 2);
        assert!(!table.as_std_path().exists());
        assert!(!diagnostics.as_std_path().exists());
    }

    #[test]
    fn all_inputs_failing_is_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let input = write_input(temp.path(), "GSE12_series_matrix.txt", "no metadata here\n");
        let table = Utf8PathBuf::from_path_buf(temp.path().join("out.csv")).unwrap();
        let diagnostics = Utf8PathBuf::from_path_buf(temp.path().join("diag.csv")).unwrap();

        let app = App::new(ResolvedConfig::default());
        let err = app
            .harmonize(
                &[input],
                &table,
                &diagnostics,
                HarmonizeOptions { dry_run: false },
                &JsonOutput,
            )
            .unwrap_err();

        assert!(matches!(err, HarmonizeError::NoUsableInput));
    }
}
