use std::collections::HashMap;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::models::RawStudentRecord;

/// Why the roster could not be read. Callers get no partial data in any of
/// these cases.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("roster file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("roster is not in a valid format: {0}")]
    InvalidFormat(String),

    #[error("failed to load roster: {0}")]
    Other(String),
}

impl DatasetError {
    /// Message shown to end users in place of an answer.
    pub fn user_message(&self) -> &'static str {
        match self {
            DatasetError::NotFound(_) => "File data mahasiswa tidak ditemukan.",
            DatasetError::InvalidFormat(_) => "Data mahasiswa bukan format yang valid.",
            DatasetError::Other(_) => "Terjadi kesalahan saat memuat data mahasiswa.",
        }
    }
}

/// Reads the decrypted roster. `.csv` files are read as CSV with the source
/// keys as header; anything else must be a JSON array of objects.
pub fn load_roster(path: &Path) -> Result<Vec<RawStudentRecord>, DatasetError> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    debug!(path = %path.display(), is_csv, "Loading roster");

    let records = if is_csv {
        load_csv(path)?
    } else {
        let bytes = std::fs::read(path).map_err(|e| io_error(path, e))?;
        parse_json_roster(&bytes)?
    };

    info!(path = %path.display(), records = records.len(), "Roster loaded");
    Ok(records)
}

pub fn parse_json_roster(bytes: &[u8]) -> Result<Vec<RawStudentRecord>, DatasetError> {
    serde_json::from_slice(bytes).map_err(|e| DatasetError::InvalidFormat(e.to_string()))
}

fn load_csv(path: &Path) -> Result<Vec<RawStudentRecord>, DatasetError> {
    let file = std::fs::File::open(path).map_err(|e| io_error(path, e))?;
    let mut reader = csv::Reader::from_reader(file);
    let mut records = Vec::new();

    // Rows go through a string map first so phone numbers keep their
    // leading zero instead of being inferred as integers.
    for result in reader.deserialize::<HashMap<String, String>>() {
        let row = result.map_err(|e| DatasetError::InvalidFormat(e.to_string()))?;
        let object: serde_json::Map<String, serde_json::Value> = row
            .into_iter()
            .map(|(key, value)| (key, serde_json::Value::String(value)))
            .collect();
        let record = serde_json::from_value(serde_json::Value::Object(object))
            .map_err(|e| DatasetError::InvalidFormat(e.to_string()))?;
        records.push(record);
    }

    Ok(records)
}

fn io_error(path: &Path, err: std::io::Error) -> DatasetError {
    if err.kind() == std::io::ErrorKind::NotFound {
        DatasetError::NotFound(path.to_path_buf())
    } else {
        DatasetError::Other(err.to_string())
    }
}
