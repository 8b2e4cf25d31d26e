//! `ftml`: packages authoring HTML exports as FT map archives and publishes them.
mod cli;
mod config;
mod logging;

use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ftml_engine::{
    build_export_archive, find_export_folders, ArchiveSummary, PublishTarget, Publisher,
    ReqwestPublisher,
};
use ftml_logging::{ftml_error, ftml_info, ftml_warn, level_for_verbosity};

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ftml_error!("{err:#}");
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    logging::initialize(
        level_for_verbosity(config.log_level()?, cli.verbose),
        cli.log_file.as_deref(),
    )?;
    if let Some(path) = &cli.config {
        ftml_info!("loaded config from {:?}", path);
    }

    match cli.command {
        Command::Convert(args) => {
            config.apply_convert(&args);
            convert_all(&args.root, &config)?;
        }
        Command::Publish(args) => {
            config.apply_publish(&args);
            let target = config.publish_target()?;
            let summaries = convert_all(&args.convert.root, &config)?;
            publish_all(&summaries, &target, &config)?;
        }
    }
    Ok(())
}

/// Converts every language folder under `root`, one after another.
fn convert_all(root: &Path, config: &AppConfig) -> anyhow::Result<Vec<ArchiveSummary>> {
    let folders = find_export_folders(root)
        .with_context(|| format!("cannot list export folders in {root:?}"))?;
    if folders.is_empty() {
        ftml_warn!("no language folder with toc and index files under {:?}", root);
    }

    let options = config.convert_options();
    let mut summaries = Vec::with_capacity(folders.len());
    for folder in &folders {
        let summary = build_export_archive(folder, &options)
            .with_context(|| format!("cannot convert {:?}", folder.folder))?;
        ftml_info!(
            "[{}] {} topics archived in {:?}",
            summary.lang,
            summary.topic_count,
            summary.archive_path
        );
        summaries.push(summary);
    }
    Ok(summaries)
}

fn publish_all(
    summaries: &[ArchiveSummary],
    target: &PublishTarget,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?;
    let publisher = ReqwestPublisher::new(config.publish_settings());

    for summary in summaries {
        let answer = runtime
            .block_on(publisher.publish(&summary.archive_path, target))
            .with_context(|| format!("cannot publish {:?}", summary.archive_path))?;
        println!("{}", serde_json::to_string_pretty(&answer)?);
    }
    Ok(())
}
