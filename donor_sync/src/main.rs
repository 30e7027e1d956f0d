use anyhow::Context;
use donor_sync::configuration::get_configuration;
use donor_sync::sync_job::SyncJob;
use telemetry::{flush_tracer, get_subscriber, init_subscriber, init_tracer};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let configuration = get_configuration().context("Failed to read configuration")?;

    let tracer = init_tracer(&configuration.telemetry);

    let subscriber = get_subscriber(
        "donor_sync".into(),
        "info".into(),
        std::io::stdout,
        &configuration.telemetry,
        &tracer,
    );
    init_subscriber(subscriber);

    let job = SyncJob::build(&configuration)?;
    let summary = job.run().await;

    flush_tracer(&tracer);

    if summary.has_failures() {
        anyhow::bail!(
            "{} donor export(s) could not be processed: {:?}",
            summary.failed.len(),
            summary.failed
        );
    }

    Ok(())
}
