//! Source adapters: one per fundraising platform, each turning the
//! platform's export rows into [`DonorRecord`]s.

mod fundraisingbox;
mod twingle;

pub use fundraisingbox::FundraisingBoxRow;
pub use twingle::TwingleRow;

use crate::domain::DonorRecord;
use crate::utils::error_chain_fmt;
use serde::de::DeserializeOwned;
use std::fmt::{Display, Formatter};
use std::io::Read;
use std::path::{Path, PathBuf};

const AUDIT_SUFFIX: &str = "_processed";

#[derive(thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read donor export {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to parse donor export")]
    Parse(#[from] csv::Error),
    #[error("Failed to list data directory {}", path.display())]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl std::fmt::Debug for SourceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    FundraisingBox,
    Twingle,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::FundraisingBox, Platform::Twingle];

    /// Substring identifying this platform's exports in the data directory.
    pub fn file_marker(&self) -> &'static str {
        match self {
            Platform::FundraisingBox => "FundraisingBox",
            Platform::Twingle => "Twingle",
        }
    }

    pub fn delimiter(&self) -> u8 {
        b';'
    }

    #[tracing::instrument(name = "Reading donor export", skip(self), fields(platform = %self))]
    pub fn load_donor_records(&self, path: &Path) -> Result<Vec<DonorRecord>, SourceError> {
        let reader = self
            .csv_reader_builder()
            .from_path(path)
            .map_err(|source| SourceError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        self.adapt_reader(reader)
            .map_err(|source| SourceError::Read {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn read_donor_records<R: Read>(&self, input: R) -> Result<Vec<DonorRecord>, SourceError> {
        let reader = self.csv_reader_builder().from_reader(input);
        Ok(self.adapt_reader(reader)?)
    }

    fn csv_reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder.delimiter(self.delimiter()).flexible(true);
        builder
    }

    fn adapt_reader<R: Read>(
        &self,
        reader: csv::Reader<R>,
    ) -> Result<Vec<DonorRecord>, csv::Error> {
        let (row_count, records) = match self {
            Platform::FundraisingBox => {
                let rows: Vec<FundraisingBoxRow> = deserialize_rows(reader)?;
                (rows.len(), fundraisingbox::adapt(rows).collect::<Vec<_>>())
            }
            Platform::Twingle => {
                let rows: Vec<TwingleRow> = deserialize_rows(reader)?;
                (rows.len(), twingle::adapt(rows).collect::<Vec<_>>())
            }
        };

        tracing::info!(
            rows = row_count,
            donor_records = records.len(),
            "Kept {} of {} rows with newsletter opt-in",
            records.len(),
            row_count
        );

        Ok(records)
    }
}

impl Display for Platform {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.file_marker())
    }
}

fn deserialize_rows<R: Read, T: DeserializeOwned>(
    mut reader: csv::Reader<R>,
) -> Result<Vec<T>, csv::Error> {
    reader.deserialize().collect()
}

/// Input files for `platform` in `data_directory`, sorted by name. Audit
/// files written by earlier runs are skipped.
pub fn discover_files(
    data_directory: &Path,
    platform: Platform,
) -> Result<Vec<PathBuf>, SourceError> {
    let discovery_error = |source| SourceError::Discovery {
        path: data_directory.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(data_directory).map_err(discovery_error)? {
        let entry = entry.map_err(discovery_error)?;
        if !entry.file_type().map_err(discovery_error)?.is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        let is_audit_file = Path::new(&file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().ends_with(AUDIT_SUFFIX))
            .unwrap_or(false);

        if file_name.contains(platform.file_marker()) && !is_audit_file {
            files.push(entry.path());
        }
    }
    files.sort();

    Ok(files)
}

/// Location of the audit file for `input`: same directory, same stem with a
/// `_processed` suffix.
pub fn audit_file_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}{AUDIT_SUFFIX}.csv"))
}

fn cell(value: Option<String>) -> String {
    value.unwrap_or_default()
}

/// Postal codes and states must stay text. Exports that went through a
/// spreadsheet sometimes render them as floats, e.g. `01234.0`.
fn text_code(value: Option<String>) -> String {
    let value = cell(value);
    let trimmed = value.trim();
    match trimmed.strip_suffix(".0") {
        Some(digits) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            digits.to_string()
        }
        _ => trimmed.to_string(),
    }
}

/// Recurring indicators are numeric `1` when set.
fn is_numeric_one(value: Option<&str>) -> bool {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .map(|v| v == 1.0)
        .unwrap_or(false)
}
