//! Drydock — bulk code-review project provisioning.
//!
//! # Usage
//!
//! ```text
//! drydock --conf site.yaml --project-conf projects.yaml [project ...] [-v|-d] [--json]
//! ```
//!
//! Reads the site configuration and the declared project list, snapshots
//! the review server, then reconciles every matching project. Individual
//! project failures are reported in the run summary and the log; the exit
//! code reflects only whether the batch itself could run.

mod output;

use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::LevelFilter;

use drydock_core::{registry, types::Layout};
use drydock_gerrit::{GerritClient, SshClient};
use drydock_git::SshWrapper;
use drydock_sync::Reconciler;

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "drydock",
    version,
    about = "Reconcile declared code-review projects against the server and mirror pool",
    long_about = None,
)]
struct Cli {
    /// Site configuration file.
    #[arg(long, default_value = "/etc/drydock/site.yaml")]
    conf: PathBuf,

    /// Declared project list.
    #[arg(long = "project-conf", default_value = "/etc/drydock/projects.yaml")]
    project_conf: PathBuf,

    /// Names of declared projects to process (default: all).
    projects: Vec<String>,

    /// Verbose output.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Debug output.
    #[arg(short = 'd', long)]
    debug: bool,

    /// Emit the run report as JSON.
    #[arg(long)]
    json: bool,
}

fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        LevelFilter::Debug
    } else if cli.verbose {
        LevelFilter::Info
    } else {
        LevelFilter::Error
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    for path in [&cli.conf, &cli.project_conf] {
        if !path.exists() {
            bail!("file must exist: {}", path.display());
        }
    }

    let settings = registry::load_settings(&cli.conf)
        .with_context(|| format!("failed to load site configuration '{}'", cli.conf.display()))?;
    let declared = registry::load_registry(&cli.project_conf).with_context(|| {
        format!(
            "failed to load project list '{}'",
            cli.project_conf.display()
        )
    })?;

    let gerrit = SshClient::new(
        settings.gerrit_host.clone(),
        settings.gerrit_port,
        settings.gerrit_user.clone(),
        settings.gerrit_key.clone(),
    );
    let known: BTreeSet<String> = gerrit
        .list_projects()
        .context("failed to list server projects")?
        .into_iter()
        .collect();

    // One credential wrapper for the whole run; dropping it at the end of
    // main removes the script no matter how many projects failed.
    let wrapper = SshWrapper::create(&settings.gerrit_user, &settings.gerrit_key)
        .context("failed to create the SSH credential wrapper")?;

    let layout = Layout::from_settings(&settings);
    let reconciler = Reconciler::new(&settings, layout, &gerrit, known, wrapper.env().clone())
        .context("failed to build the reconciler")?;

    let selection = declared.select(&cli.projects);
    let report = reconciler.run(&selection);

    if cli.json {
        output::print_json(&report)?;
    } else {
        output::print_table(&report);
    }
    Ok(())
}
