use std::io::Write;

use camino::Utf8Path;

use crate::domain::{HarmonizedRecord, QualityReport};
use crate::error::HarmonizeError;

/// Writes the harmonized table. Rows arrive already ordered (study supply
/// order, extraction order within a study) and are emitted as-is.
pub fn write_harmonized_table(
    path: &Utf8Path,
    records: &[HarmonizedRecord],
) -> Result<(), HarmonizeError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(["study_id", "sample_id", "condition", "source_text"])
        .map_err(|err| write_error(path, err))?;
    for record in records {
        let condition = record.condition.to_string();
        writer
            .write_record([
                record.study_id.as_str(),
                record.sample_id.as_str(),
                condition.as_str(),
                record.source_text.as_str(),
            ])
            .map_err(|err| write_error(path, err))?;
    }
    let bytes = finish_csv(path, writer)?;
    write_atomic(path, &bytes)
}

/// Writes one diagnostics row per study, in study supply order.
pub fn write_diagnostics(
    path: &Utf8Path,
    reports: &[QualityReport],
) -> Result<(), HarmonizeError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record([
            "study_id",
            "total_samples",
            "unknown_count",
            "duplicate_count",
            "warnings",
        ])
        .map_err(|err| write_error(path, err))?;
    for report in reports {
        let total_samples = report.total_samples.to_string();
        let unknown_count = report.unknown_count.to_string();
        let duplicate_count = report.duplicate_ids.len().to_string();
        let warnings = report.warnings.join("; ");
        writer
            .write_record([
                report.study_id.as_str(),
                total_samples.as_str(),
                unknown_count.as_str(),
                duplicate_count.as_str(),
                warnings.as_str(),
            ])
            .map_err(|err| write_error(path, err))?;
    }
    let bytes = finish_csv(path, writer)?;
    write_atomic(path, &bytes)
}

fn finish_csv(path: &Utf8Path, writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>, HarmonizeError> {
    writer
        .into_inner()
        .map_err(|err| write_error(path, err.into_error()))
}

/// Writes through a temp file in the destination directory so an unwritable
/// path or a failed run never leaves a partial table behind.
fn write_atomic(path: &Utf8Path, bytes: &[u8]) -> Result<(), HarmonizeError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let mut temp = tempfile::Builder::new()
        .prefix(".geo-mh")
        .tempfile_in(dir.as_std_path())
        .map_err(|err| write_error(path, err))?;
    temp.write_all(bytes)
        .map_err(|err| write_error(path, err))?;
    temp.persist(path.as_std_path())
        .map_err(|err| write_error(path, err.error))?;
    Ok(())
}

fn write_error(path: &Utf8Path, err: impl std::fmt::Display) -> HarmonizeError {
    HarmonizeError::Write {
        path: path.to_string(),
        message: err.to_string(),
    }
}
