pub mod adapters;
pub mod aggregator;
pub mod archive;
pub mod configuration;
pub mod dispatcher;
pub mod domain;
pub mod formatter;
pub mod snapshot;
pub mod sources;
pub mod sync_job;
pub mod utils;
