use crate::domain::{Characteristic, RawRecord, StudyAccession};
use crate::error::HarmonizeError;

const ACCESSION_LABEL: &str = "!Sample_geo_accession";
const TITLE_LABEL: &str = "!Sample_title";
const CHARACTERISTICS_LABEL: &str = "!Sample_characteristics_ch1";

/// Parses decompressed series-matrix text into one record per sample column.
///
/// The `!Sample_geo_accession` line defines the column layout; `!Sample_title`
/// and every `!Sample_characteristics_ch1` line must agree with its width.
pub fn parse_series_matrix(
    study: &StudyAccession,
    text: &str,
) -> Result<Vec<RawRecord>, HarmonizeError> {
    let mut accessions: Option<Vec<String>> = None;
    let mut titles: Option<Vec<String>> = None;
    let mut characteristic_rows: Vec<Vec<String>> = Vec::new();

    for line in text.lines() {
        let Some(label) = line.split('\t').next() else {
            continue;
        };
        match label {
            ACCESSION_LABEL => accessions = Some(split_matrix_values(line)),
            TITLE_LABEL => titles = Some(split_matrix_values(line)),
            CHARACTERISTICS_LABEL => characteristic_rows.push(split_matrix_values(line)),
            _ => {}
        }
    }

    let accessions = accessions
        .filter(|values| !values.is_empty())
        .ok_or_else(|| HarmonizeError::MissingAccessionLine {
            study: study.to_string(),
        })?;
    let width = accessions.len();

    if let Some(titles) = &titles {
        check_width(study, TITLE_LABEL, width, titles.len())?;
    }
    for row in &characteristic_rows {
        check_width(study, CHARACTERISTICS_LABEL, width, row.len())?;
    }

    let records = accessions
        .into_iter()
        .enumerate()
        .map(|(column, sample_id)| RawRecord {
            study_id: study.clone(),
            sample_id,
            title: titles
                .as_ref()
                .map(|values| values[column].clone())
                .unwrap_or_default(),
            characteristics: characteristic_rows
                .iter()
                .map(|row| split_characteristic(&row[column]))
                .collect(),
        })
        .collect();

    Ok(records)
}

/// Splits a metadata line on tabs, drops the label token and strips the
/// surrounding quotes GEO puts around every value.
fn split_matrix_values(line: &str) -> Vec<String> {
    line.trim_end()
        .split('\t')
        .skip(1)
        .map(|part| part.trim().trim_matches('"').trim().to_string())
        .collect()
}

fn split_characteristic(cell: &str) -> Characteristic {
    match cell.split_once(':') {
        Some((key, value)) => Characteristic {
            key: key.trim().to_string(),
            value: value.trim().to_string(),
        },
        None => Characteristic {
            key: String::new(),
            value: cell.trim().to_string(),
        },
    }
}

fn check_width(
    study: &StudyAccession,
    label: &str,
    expected: usize,
    found: usize,
) -> Result<(), HarmonizeError> {
    if found != expected {
        return Err(HarmonizeError::ColumnCountMismatch {
            study: study.to_string(),
            label: label.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}
