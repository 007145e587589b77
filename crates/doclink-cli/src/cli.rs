//! `doclink` - run document-store operations over a resilient link
//!
//! The link connects with the configured retry policy, runs one command and
//! closes. Results are printed to stdout as relaxed extended JSON; logs go to
//! stderr. Ctrl-C cancels a pending connect or operation.

mod args;
mod commands;
mod logging;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use doclink_connection::{Link, TracingSink};
use doclink_driver_mongodb::MongoDbDriver;
use tokio_util::sync::CancellationToken;

use crate::args::Cli;
use crate::logging::LoggingConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let logging = if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    if let Err(e) = logging::init(logging.with_format(cli.log_format)) {
        eprintln!("Failed to initialize logging: {:#}", e);
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, "command failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let options = cli.connection.resolve(cli.verbose)?;
    tracing::debug!(
        uri = %options.redacted_target(),
        app = options.application_name(),
        "resolved link options"
    );

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let link = Link::detached(options, Arc::new(MongoDbDriver::new()))
        .with_diagnostics(Arc::new(TracingSink))
        .with_cancellation(cancel);
    link.connect().await.context("Failed to establish link")?;

    let result = commands::execute(&link, cli.command).await;
    link.close().await;
    result
}

fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling");
            cancel.cancel();
        }
    });
}
