mod helpers;
mod sync_job;
