use anyhow::Context;
use serde::Serialize;
use std::path::PathBuf;

/// Receives intermediate pipeline output for inspection. Only wired in when
/// diagnostic mode is on.
pub trait SnapshotSink: Send + Sync {
    fn write_snapshot(&self, name: &str, payload: &serde_json::Value) -> Result<(), anyhow::Error>;
}

/// Writes each snapshot as `<directory>/<name>.json`.
#[derive(Debug, Clone)]
pub struct DirectorySnapshotSink {
    directory: PathBuf,
}

impl DirectorySnapshotSink {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }
}

impl SnapshotSink for DirectorySnapshotSink {
    fn write_snapshot(&self, name: &str, payload: &serde_json::Value) -> Result<(), anyhow::Error> {
        std::fs::create_dir_all(&self.directory).with_context(|| {
            format!("Failure creating debug directory {}", self.directory.display())
        })?;

        let path = self.directory.join(format!("{name}.json"));
        let content = serde_json::to_vec_pretty(payload).context("Failure serializing snapshot")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failure writing snapshot {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Wrote diagnostic snapshot");
        Ok(())
    }
}

/// Hands `value` to the sink, if there is one. Snapshots are diagnostics
/// only, so failures are logged and swallowed.
pub fn record<T: Serialize + ?Sized>(sink: Option<&dyn SnapshotSink>, name: &str, value: &T) {
    let Some(sink) = sink else {
        return;
    };

    let result = serde_json::to_value(value)
        .context("Failure converting snapshot to JSON")
        .and_then(|payload| sink.write_snapshot(name, &payload));

    if let Err(error) = result {
        tracing::warn!(
            snapshot = name,
            error.cause_chain = ?error,
            error.message = %error,
            "Failed to write diagnostic snapshot"
        );
    }
}
