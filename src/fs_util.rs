use std::fs;
use std::io::Read;

use camino::Utf8Path;
use flate2::read::GzDecoder;
use regex::Regex;

use crate::domain::StudyAccession;
use crate::error::HarmonizeError;

/// Reads series-matrix text, transparently decompressing `.gz` inputs.
pub fn read_matrix_text(path: &Utf8Path) -> Result<String, HarmonizeError> {
    let bytes = fs::read(path.as_std_path())
        .map_err(|err| HarmonizeError::Filesystem(format!("read {path}: {err}")))?;
    if path.extension() == Some("gz") {
        let mut decoder = GzDecoder::new(bytes.as_slice());
        let mut text = String::new();
        decoder
            .read_to_string(&mut text)
            .map_err(|err| HarmonizeError::Filesystem(format!("decompress {path}: {err}")))?;
        return Ok(text);
    }
    String::from_utf8(bytes)
        .map_err(|err| HarmonizeError::Filesystem(format!("read {path}: {err}")))
}

/// Extracts the `GSE...` accession from an input file name, e.g.
/// `metadata/GSE66957_series_matrix.txt.gz` -> `GSE66957`.
pub fn study_id_from_path(path: &Utf8Path) -> Result<StudyAccession, HarmonizeError> {
    let name = path.file_name().unwrap_or(path.as_str());
    let pattern = Regex::new(r"GSE\d+").unwrap();
    pattern
        .find(name)
        .ok_or_else(|| HarmonizeError::UnresolvedStudy(path.to_string()))
        .and_then(|found| found.as_str().parse())
}
