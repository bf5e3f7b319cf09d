use anyhow::{Context, Result};
use log::debug;
use reconcile::{
    Authenticator, Orchestrator, ReliableSubmitter, RetryConfig, SyncOptions, SyncReport,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::Cli;
use crate::config::{self, Settings};
use crate::progress::PhaseBar;
use crate::slack::{self, SlackClient, SlackLogin};
use crate::ui;

pub fn run(cli: &Cli) -> Result<()> {
    let config_path = match &cli.config {
        Some(path) => config::expand_path(path),
        None => config::default_config_path()?,
    };
    let settings = Settings::load(&config_path, &cli.profile)
        .with_context(|| format!("Failed to load settings for profile \"{}\"", cli.profile))?;

    // Duplicate ids abort here, before anything is touched remotely
    let desired = if cli.upload {
        reconcile::expand(cli.start, cli.finish, &settings)?
    } else {
        Vec::new()
    };
    let removal = if cli.remove {
        reconcile::removal_ids(cli.start, cli.finish, &settings)
    } else {
        BTreeSet::new()
    };

    if !cli.quiet {
        ui::header(&format!("Syncing emoji: profile \"{}\"", settings.profile()));
        ui::kv("Range", &format!("{}..={}", cli.start, cli.finish));
        ui::kv("Configured", &desired.len().to_string());
        ui::kv("Upload threads", &cli.threads.to_string());
        ui::kv("Retries", &cli.retries.to_string());
        if cli.dry_run {
            ui::warn("Dry run - no changes will be made");
        }
        if !cli.upload && !cli.remove {
            ui::info("Neither --upload nor --remove given; only the inventory will be read");
        }
    }

    let timeout = Duration::from_secs(cli.timeout);
    let endpoint = slack::endpoint(&settings)?;
    let session = SlackLogin::new(
        slack::http_agent(timeout),
        endpoint,
        settings.get("browser.user_agent").map(str::to_string),
        settings.get("slack.cookie").map(str::to_string),
    )
    .obtain_session()
    .context("Authentication failed")?;
    debug!("Authenticated against {}", session.endpoint);

    let upload_folder = match cli.upload_folder.as_deref() {
        Some(folder) => config::expand_path(folder),
        None => executable_dir()?,
    };
    debug!("Resolving images against {}", upload_folder.display());
    let client = Arc::new(SlackClient::new(
        slack::http_agent(timeout),
        session,
        upload_folder,
    )?);
    let submitter = ReliableSubmitter::new(
        Arc::clone(&client),
        RetryConfig::with_max_attempts(cli.retries),
    );

    let opts = SyncOptions {
        upload: cli.upload,
        remove: cli.remove,
        dry_run: cli.dry_run,
        threads: cli.threads,
    };
    let mut progress = PhaseBar::new(cli.quiet);
    let report = Orchestrator::new(submitter).run(
        client.as_ref(),
        &desired,
        &removal,
        &opts,
        &mut progress,
    )?;

    if !cli.quiet {
        print_summary(&report, cli.dry_run);
    }
    Ok(())
}

fn executable_dir() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Could not locate the running executable")?;
    Ok(exe
        .parent()
        .map_or_else(|| PathBuf::from("."), std::path::Path::to_path_buf))
}

fn print_summary(report: &SyncReport, dry_run: bool) {
    let summary = report.summary();

    println!();
    ui::kv("Existing", &report.existing.to_string());
    if dry_run {
        ui::kv("Would remove", &ui::id_list(&summary.would_remove));
        ui::kv("Would upload", &ui::id_list(&summary.would_upload));
        ui::dim("Run without --dry-run to apply");
        return;
    }
    ui::kv("Removed", &ui::id_list(&summary.removed));
    ui::kv("Uploaded", &ui::id_list(&summary.uploaded));

    if summary.is_success() {
        if summary.total_changes() == 0 {
            ui::success("Already in sync");
        } else {
            ui::success(&format!("{} changes applied", summary.total_changes()));
        }
    } else {
        ui::warn(&format!(
            "{} applied, {} failed",
            summary.total_changes(),
            summary.failed.len()
        ));
        println!();
        ui::error("Failed emoji:");
        for (id, action, reason) in &summary.failed {
            ui::failure(id, *action, reason);
        }
    }
}
