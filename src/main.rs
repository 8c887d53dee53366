mod configuration;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use gtfs_validation::{NoticeRepository, Validator};
use log::info;
use std::time::Instant;

use crate::configuration::Arguments;

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let configuration = Arguments::parse().into_configuration()?;
    let start = Instant::now();

    let notices = Validator::new(configuration.params).run();

    let mut exporter = NoticeRepository::exporter(configuration.format, &configuration.output)
        .with_context(|| format!("Could not write to {}", configuration.output.display()))?;
    notices
        .export(exporter.as_mut())
        .context("Could not export the notices")?;

    info!(
        "{} notices ({} errors, {} warnings) written to {} in {:?}",
        notices.notice_count(),
        notices.error_count(),
        notices.warning_count(),
        configuration.output.join(configuration.format.file_name()).display(),
        start.elapsed()
    );
    Ok(())
}
