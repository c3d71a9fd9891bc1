//! `awscmd`: run SQS and Pinpoint Email operations against the local backends.
//!
//! Exit status is non-zero when any invocation failed.

use anyhow::Result;
use clap::Parser;
use cmdlet_aws::cli::{self, Cli, Command};
use cmdlet_aws::config::{Settings, StdEnvSource};
use cmdlet_aws::host::Host;
use cmdlet_framework::tracing::setup_tracing;
use cmdlet_framework::{cancel_pair, AutoDecline, ConfirmationGate, PromptGate};
use std::io::{BufReader, IsTerminal};
use std::sync::Arc;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    let settings = Settings::load(
        args.global.config.as_deref(),
        &StdEnvSource,
        &args.global.overrides(),
    )?;
    setup_tracing(&settings.log);
    debug!(?settings, "Settings loaded");

    // Session commands arrive on stdin, so stdin cannot answer prompts too.
    let interactive =
        std::io::stdin().is_terminal() && matches!(args.command, Command::Service(_));
    let gate: Arc<dyn ConfirmationGate> = if interactive {
        Arc::new(PromptGate::new(
            BufReader::new(std::io::stdin()),
            std::io::stderr(),
        ))
    } else {
        Arc::new(AutoDecline)
    };

    let host = Host::local(&settings, gate);
    let options = args.global.options();
    let mut out = std::io::stdout();
    let mut err = std::io::stderr();

    let succeeded = match args.command {
        Command::Service(command) => {
            let (handle, signal) = cancel_pair();
            let interrupt = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted");
                    handle.cancel();
                }
            });
            let ok = cli::run_command(
                &host,
                command,
                &options,
                Some(&signal),
                &mut out,
                &mut err,
            )
            .await?;
            interrupt.abort();
            ok
        }
        Command::Session => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            cli::run_session(&host, &options, stdin, &mut out, &mut err).await? == 0
        }
    };

    if !succeeded {
        std::process::exit(1);
    }
    Ok(())
}
