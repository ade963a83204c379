//! # ccdash
//!
//! Dashboard binary: loads settings, installs forwarding hooks, serves the
//! dashboard, and tears everything down on Ctrl-C or a control request.

#![deny(unsafe_code)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use ccdash_hooks::RemovalMode;
use ccdash_server::DashboardServer;
use ccdash_settings::DashboardSettings;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Live browser dashboard for agent sessions.
#[derive(Parser, Debug)]
#[command(name = "ccdash", about = "Live browser dashboard for agent sessions")]
struct Cli {
    /// Port to bind (overrides settings).
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Host to bind (overrides settings).
    #[arg(long)]
    host: Option<String>,

    /// Start the server without touching the agent settings file.
    #[arg(long)]
    no_hooks: bool,

    /// Remove every dashboard hook from the agent settings file and exit.
    #[arg(long, conflicts_with = "no_hooks")]
    remove_hooks: bool,

    /// Agent configuration directory holding `settings.json` (default `~/.claude`).
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Dashboard settings file (default `~/.claude/dashboard/settings.json`).
    #[arg(long)]
    settings: Option<PathBuf>,
}

impl Cli {
    /// Apply CLI overrides on top of loaded settings.
    fn apply(&self, settings: &mut DashboardSettings) {
        if let Some(port) = self.port {
            settings.port = port;
        }
        if let Some(ref host) = self.host {
            settings.host.clone_from(host);
        }
    }

    fn config_dir(&self) -> PathBuf {
        self.config_dir
            .clone()
            .unwrap_or_else(ccdash_hooks::default_config_dir)
    }
}

/// Why the main loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    Signal,
    Shutdown,
    Restart,
}

/// Resolve on Ctrl-C or SIGTERM.
async fn termination_signal() -> Result<()> {
    #[cfg(unix)]
    {
        let mut term =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).ok();
        tokio::select! {
            r = tokio::signal::ctrl_c() => r.context("Failed to listen for ctrl-c")?,
            () = async {
                if let Some(ref mut t) = term {
                    let _ = t.recv().await;
                } else {
                    std::future::pending::<()>().await;
                }
            } => info!("SIGTERM received"),
        }
    }
    #[cfg(not(unix))]
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    Ok(())
}

/// Start a detached copy of this executable with the same arguments.
fn relaunch() -> Result<()> {
    let exe = std::env::current_exe().context("Failed to resolve current executable")?;
    let mut cmd = std::process::Command::new(&exe);
    let _ = cmd
        .args(std::env::args_os().skip(1))
        .stdin(std::process::Stdio::null());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        let _ = cmd.process_group(0);
    }
    let child = cmd
        .spawn()
        .with_context(|| format!("Failed to relaunch {}", exe.display()))?;
    info!(pid = child.id(), "relaunched dashboard");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(ccdash_settings::settings_path);
    let mut settings = ccdash_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    args.apply(&mut settings);
    settings.validate().context("Invalid settings")?;

    ccdash_core::logging::init_subscriber(&settings.log_level);

    let config_dir = args.config_dir();
    if args.remove_hooks {
        let removed = ccdash_hooks::remove_event_forwarding(&config_dir, RemovalMode::All)
            .context("Failed to remove hooks")?;
        info!(removed, config_dir = %config_dir.display(), "dashboard hooks removed");
        return Ok(());
    }

    let (exit_tx, mut exit_rx) = mpsc::unbounded_channel();
    let shutdown_tx = exit_tx.clone();
    let server = DashboardServer::new(settings)
        .on_shutdown(move || {
            let _ = shutdown_tx.send(Exit::Shutdown);
        })
        .on_restart(move || {
            let _ = exit_tx.send(Exit::Restart);
        });

    let addr = server
        .listen()
        .await
        .context("Failed to start dashboard server; try --port <number>")?;

    if !args.no_hooks {
        let path = ccdash_hooks::install_event_forwarding(addr.port(), &config_dir)
            .context("Failed to install hooks")?;
        info!(path = %path.display(), "hooks installed");
    }

    info!("Dashboard running at http://{addr}");

    let exit = tokio::select! {
        r = termination_signal() => { r?; Exit::Signal }
        Some(exit) = exit_rx.recv() => exit,
    };
    info!(?exit, "shutting down");

    if !args.no_hooks {
        match ccdash_hooks::remove_event_forwarding(&config_dir, RemovalMode::Quick) {
            Ok(removed) => info!(removed, "hooks removed"),
            Err(e) => warn!(error = %e, "failed to remove hooks"),
        }
    }

    server.close().await;

    if exit == Exit::Restart {
        relaunch()?;
    }

    info!("Shutdown complete");
    Ok(())
}
