use crate::adapters::MailchimpClient;
use crate::aggregator::{aggregate, AggregationError};
use crate::archive::{ArchiveError, Archiver};
use crate::configuration::Settings;
use crate::dispatcher::{upsert_contacts, DispatchSummary};
use crate::domain::MailingListClient;
use crate::formatter::{ContactFormatter, FormatError};
use crate::snapshot::{self, DirectorySnapshotSink, SnapshotSink};
use crate::sources::{audit_file_path, discover_files, Platform, SourceError};
use crate::utils::error_chain_fmt;
use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

#[derive(thiserror::Error)]
pub enum BatchError {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error("Donor records could not be merged")]
    Aggregation(#[from] AggregationError),
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error("Processed files could not be archived")]
    Archive(#[from] ArchiveError),
}

impl std::fmt::Debug for BatchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        error_chain_fmt(self, f)
    }
}

#[derive(Debug, Clone)]
pub struct BatchReport {
    pub input: PathBuf,
    pub archived_to: PathBuf,
    pub dispatch: DispatchSummary,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub processed: Vec<BatchReport>,
    pub failed: Vec<PathBuf>,
}

impl RunSummary {
    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }
}

/// Processes every export of every enabled platform, one file at a time.
pub struct SyncJob {
    data_directory: PathBuf,
    list_id: String,
    platforms: Vec<Platform>,
    client: Arc<dyn MailingListClient>,
    formatter: ContactFormatter,
    archiver: Archiver,
    snapshot_sink: Option<Arc<dyn SnapshotSink>>,
}

impl SyncJob {
    /// Builds the job against the live Mailchimp API.
    pub fn build(settings: &Settings) -> Result<Self, anyhow::Error> {
        let client = MailchimpClient::new(
            settings.mailchimp.api_base_url(),
            settings.mailchimp.api_key.clone(),
            settings.mailchimp.timeout(),
        )
        .context("Failed to build Mailchimp client")?;

        Ok(Self::new(settings, Arc::new(client))?)
    }

    pub fn new(
        settings: &Settings,
        client: Arc<dyn MailingListClient>,
    ) -> Result<Self, FormatError> {
        let snapshot_sink: Option<Arc<dyn SnapshotSink>> =
            if settings.application.diagnostic_mode {
                Some(Arc::new(DirectorySnapshotSink::new(
                    settings.application.debug_directory.clone(),
                )))
            } else {
                None
            };

        Ok(Self {
            data_directory: settings.application.data_directory.clone(),
            list_id: settings.mailchimp.list_id.clone(),
            platforms: settings.sources.enabled_platforms(),
            client,
            formatter: ContactFormatter::mailchimp(settings.tags.clone())?,
            archiver: Archiver::new(
                &settings.application.data_directory,
                &settings.application.archive_folder,
            ),
            snapshot_sink,
        })
    }

    pub fn with_snapshot_sink(mut self, sink: Arc<dyn SnapshotSink>) -> Self {
        self.snapshot_sink = Some(sink);
        self
    }

    /// A failing file is logged and skipped; the remaining files are still
    /// attempted.
    #[tracing::instrument(
        name = "Running donor sync",
        skip(self),
        fields(run_id = %Uuid::new_v4())
    )]
    pub async fn run(&self) -> RunSummary {
        let mut summary = RunSummary::default();

        for platform in &self.platforms {
            let files = match discover_files(&self.data_directory, *platform) {
                Ok(files) => files,
                Err(error) => {
                    tracing::error!(
                        platform = %platform,
                        error.cause_chain = ?error,
                        error.message = %error,
                        "Failed to list donor exports"
                    );
                    summary.failed.push(self.data_directory.clone());
                    continue;
                }
            };

            tracing::info!(platform = %platform, files = files.len(), "Found donor exports");

            for file in files {
                match self.process_file(*platform, &file).await {
                    Ok(report) => summary.processed.push(report),
                    Err(error) => {
                        tracing::error!(
                            file = %file.display(),
                            error.cause_chain = ?error,
                            error.message = %error,
                            "Failed to process donor export"
                        );
                        summary.failed.push(file);
                    }
                }
            }
        }

        tracing::info!(
            processed = summary.processed.len(),
            failed = summary.failed.len(),
            "Donor sync finished"
        );

        summary
    }

    /// Runs one export through the whole pipeline and archives it.
    #[tracing::instrument(
        name = "Processing donor export",
        skip(self, platform),
        fields(platform = %platform)
    )]
    pub async fn process_file(
        &self,
        platform: Platform,
        input: &Path,
    ) -> Result<BatchReport, BatchError> {
        let snapshot_name = input
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();

        let records = platform.load_donor_records(input)?;
        snapshot::record(
            self.snapshot_sink.as_deref(),
            &format!("{snapshot_name}_donor_records"),
            &records,
        );

        let contacts = aggregate(records)?;
        snapshot::record(
            self.snapshot_sink.as_deref(),
            &format!("{snapshot_name}_contacts"),
            &contacts,
        );

        let audit_path = audit_file_path(input);
        let formatted = self.formatter.format_batch(&contacts, &audit_path)?;

        let dispatch = upsert_contacts(self.client.as_ref(), &self.list_id, &formatted).await;

        let archived_to = self
            .archiver
            .archive(&[input, audit_path.as_path()], &Archiver::current_timestamp())?;

        Ok(BatchReport {
            input: input.to_path_buf(),
            archived_to,
            dispatch,
        })
    }
}
