use crate::utils::error_chain_fmt;
use chrono::Local;
use std::path::{Path, PathBuf};

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H-%M-%S";

#[derive(thiserror::Error)]
pub enum ArchiveError {
    #[error("Failed to create archive directory {}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to move {} to {}", from.display(), to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} has no file name", .0.display())]
    InvalidPath(PathBuf),
}

impl std::fmt::Debug for ArchiveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Moves processed files into `<data_directory>/<archive_folder>/<timestamp>/`.
#[derive(Debug, Clone)]
pub struct Archiver {
    archive_root: PathBuf,
}

impl Archiver {
    pub fn new(data_directory: &Path, archive_folder: &str) -> Self {
        Self {
            archive_root: data_directory.join(archive_folder),
        }
    }

    pub fn current_timestamp() -> String {
        Local::now().format(TIMESTAMP_FORMAT).to_string()
    }

    /// Moves every file of one batch into the archive folder for
    /// `timestamp` and returns the directory they landed in.
    ///
    /// The batch moves as a whole: if one file cannot be moved, the files
    /// already moved are put back where they came from.
    #[tracing::instrument(name = "Archiving processed files", skip(self))]
    pub fn archive(&self, files: &[&Path], timestamp: &str) -> Result<PathBuf, ArchiveError> {
        let target_directory = self.archive_root.join(timestamp);
        std::fs::create_dir_all(&target_directory).map_err(|source| {
            ArchiveError::CreateDirectory {
                path: target_directory.clone(),
                source,
            }
        })?;

        let mut moved: Vec<(PathBuf, PathBuf)> = Vec::with_capacity(files.len());
        for file in files {
            let result = file
                .file_name()
                .ok_or_else(|| ArchiveError::InvalidPath(file.to_path_buf()))
                .and_then(|file_name| {
                    let destination = target_directory.join(file_name);
                    std::fs::rename(file, &destination)
                        .map(|()| destination.clone())
                        .map_err(|source| ArchiveError::Move {
                            from: file.to_path_buf(),
                            to: destination,
                            source,
                        })
                });

            match result {
                Ok(destination) => moved.push((file.to_path_buf(), destination)),
                Err(error) => {
                    restore(&moved);
                    return Err(error);
                }
            }
        }

        tracing::info!(directory = %target_directory.display(), "Archived processed files");

        Ok(target_directory)
    }
}

/// Moves already archived files back, newest first.
fn restore(moved: &[(PathBuf, PathBuf)]) {
    for (origin, destination) in moved.iter().rev() {
        if let Err(e) = std::fs::rename(destination, origin) {
            tracing::error!(
                file = %destination.display(),
                error.message = %e,
                "Failed to restore file after incomplete archive"
            );
        }
    }
}
