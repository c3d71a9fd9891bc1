//! Command-line surface of `awscmd`.
//!
//! ```text
//! awscmd [--region R] [--profile P] [--select S] [--force] sqs create-queue --queue-name orders
//! awscmd --region us-east-1 session < commands.txt
//! ```
//!
//! Projected values are written to stdout as one JSON document per line.
//! Failures are written to stderr as JSON error records.

use crate::config::Overrides;
use crate::host::{Host, InvocationOptions};
use crate::pinpoint_email::ops::*;
use crate::sqs::ops::*;
use clap::{Args, Parser, Subcommand};
use cmdlet_framework::{CancelSignal, ConfirmImpact, ErrorRecord, InvokeError, Operation, Outcome};
use std::io::{self, Write};
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

#[derive(Debug, Parser)]
#[command(
    name = "awscmd",
    version,
    about = "Invoke Amazon SQS and Amazon Pinpoint Email operations"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Default, Args)]
pub struct GlobalArgs {
    /// Settings file (TOML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Region to send requests to
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Credential profile
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Output: `*` for the whole response, a response field name, or `^Parameter`
    #[arg(long, global = true)]
    pub select: Option<String>,

    /// Do not ask for confirmation
    #[arg(long, global = true)]
    pub force: bool,

    /// Lowest impact that asks for confirmation (none, low, medium, high)
    #[arg(long, global = true)]
    pub confirm_impact: Option<ConfirmImpact>,

    /// Log directive used when RUST_LOG is unset, e.g. `info`
    #[arg(long, global = true)]
    pub log: Option<String>,
}

impl GlobalArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            region: self.region.clone(),
            profile: self.profile.clone(),
            confirm_impact: self.confirm_impact,
            log: self.log.clone(),
        }
    }

    /// Flags that configure the process and therefore cannot change per session line.
    pub fn process_flags(&self) -> Vec<&'static str> {
        [
            ("--config", self.config.is_some()),
            ("--confirm-impact", self.confirm_impact.is_some()),
            ("--log", self.log.is_some()),
        ]
        .into_iter()
        .filter_map(|(flag, set)| set.then_some(flag))
        .collect()
    }

    pub fn options(&self) -> InvocationOptions {
        InvocationOptions {
            region: self.region.clone(),
            profile: self.profile.clone(),
            select: self.select.clone(),
            force: self.force,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(flatten)]
    Service(ServiceCommand),

    /// Read one command per line from stdin; clients are shared between lines
    Session,
}

#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
    /// Amazon SQS
    #[command(subcommand)]
    Sqs(SqsCommand),

    /// Amazon Pinpoint Email
    #[command(subcommand)]
    PinpointEmail(PinpointEmailCommand),
}

impl ServiceCommand {
    pub fn operation(&self) -> &'static str {
        match self {
            ServiceCommand::Sqs(c) => c.operation(),
            ServiceCommand::PinpointEmail(c) => c.operation(),
        }
    }

    pub async fn run(
        self,
        host: &Host,
        options: &InvocationOptions,
        cancel: Option<&CancelSignal>,
    ) -> Result<Outcome, InvokeError> {
        match self {
            ServiceCommand::Sqs(c) => c.run(host, options, cancel).await,
            ServiceCommand::PinpointEmail(c) => c.run(host, options, cancel).await,
        }
    }
}

/// One subcommand per operation, each taking the operation's parameters.
macro_rules! operation_commands {
    ($name:ident { $($op:ident),* $(,)? }) => {
        paste::paste! {
            #[derive(Debug, Subcommand)]
            pub enum $name {
                $($op([<$op Params>]),)*
            }

            impl $name {
                pub fn operation(&self) -> &'static str {
                    match self {
                        $($name::$op(_) => <$op as Operation>::NAME,)*
                    }
                }

                pub async fn run(
                    self,
                    host: &Host,
                    options: &InvocationOptions,
                    cancel: Option<&CancelSignal>,
                ) -> Result<Outcome, InvokeError> {
                    match self {
                        $($name::$op(params) => host.run::<$op>(params, options, cancel).await,)*
                    }
                }
            }
        }
    };
}

operation_commands!(SqsCommand {
    AddPermission,
    RemovePermission,
    CreateQueue,
    DeleteQueue,
    GetQueueUrl,
    ListQueues,
    SendMessage,
    SendMessageBatch,
    ReceiveMessage,
    DeleteMessage,
    ChangeMessageVisibility,
    PurgeQueue,
});

operation_commands!(PinpointEmailCommand {
    CreateConfigurationSet,
    DeleteConfigurationSet,
    PutConfigurationSetReputationOptions,
    PutConfigurationSetSendingOptions,
    SendEmail,
    CreateEmailIdentity,
    DeleteEmailIdentity,
    ListEmailIdentities,
    GetAccount,
    PutAccountSendingAttributes,
});

/// Writes an outcome. Returns `false` when an error record was written.
pub fn emit(
    operation: &str,
    result: Result<Outcome, InvokeError>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<bool> {
    match result {
        Ok(Outcome::Emitted(value)) => {
            writeln!(out, "{value}")?;
            Ok(true)
        }
        Ok(Outcome::Declined) => Ok(true),
        Err(error) => {
            let record = ErrorRecord::new(operation, &error);
            writeln!(err, "{}", serde_json::to_string(&record)?)?;
            Ok(false)
        }
    }
}

/// Runs a single command and writes its outcome.
pub async fn run_command(
    host: &Host,
    command: ServiceCommand,
    options: &InvocationOptions,
    cancel: Option<&CancelSignal>,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<bool> {
    let operation = command.operation();
    let result = command.run(host, options, cancel).await;
    emit(operation, result, out, err)
}

/// Runs commands read line by line from `input` against one host.
///
/// Blank lines and lines starting with `#` are skipped. Flags on a line
/// override the session-wide `defaults`; a line carrying `--config`,
/// `--confirm-impact` or `--log` fails. Returns the number of failed lines.
pub async fn run_session<R>(
    host: &Host,
    defaults: &InvocationOptions,
    input: R,
    out: &mut impl Write,
    err: &mut impl Write,
) -> io::Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut failures = 0;
    let mut executed = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let words = match split_words(line) {
            Ok(words) => words,
            Err(reason) => {
                session_error(err, reason)?;
                failures += 1;
                continue;
            }
        };

        let cli = match Cli::try_parse_from(std::iter::once("awscmd".to_string()).chain(words)) {
            Ok(cli) => cli,
            Err(e) if !e.use_stderr() => {
                write!(out, "{}", e.render())?;
                continue;
            }
            Err(e) => {
                session_error(err, e.render().to_string().trim_end().to_string())?;
                failures += 1;
                continue;
            }
        };

        let command = match cli.command {
            Command::Service(command) => command,
            Command::Session => {
                session_error(err, "session cannot be nested".to_string())?;
                failures += 1;
                continue;
            }
        };

        let fixed = cli.global.process_flags();
        if !fixed.is_empty() {
            session_error(
                err,
                format!("{} only apply when starting awscmd", fixed.join(", ")),
            )?;
            failures += 1;
            continue;
        }

        let line_options = cli.global.options();
        let options = InvocationOptions {
            region: line_options.region.or_else(|| defaults.region.clone()),
            profile: line_options.profile.or_else(|| defaults.profile.clone()),
            select: line_options.select.or_else(|| defaults.select.clone()),
            force: line_options.force || defaults.force,
        };
        debug!(operation = command.operation(), "Session command");
        if !run_command(host, command, &options, None, out, err).await? {
            failures += 1;
        }
        executed += 1;
    }

    info!(executed, failures, "Session finished");
    Ok(failures)
}

fn session_error(err: &mut impl Write, message: String) -> io::Result<()> {
    let record = ErrorRecord {
        operation: "session".to_string(),
        category: "InvalidArgument",
        message,
    };
    writeln!(err, "{}", serde_json::to_string(&record)?)
}

/// Splits a command line into words. Single and double quotes group words;
/// a backslash escapes the next character outside single quotes.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some('\''), '\'') => quote = None,
            (Some('"'), '"') => quote = None,
            (Some('"') | None, '\\') => match chars.next() {
                Some(escaped) => {
                    current.push(escaped);
                    in_word = true;
                }
                None => return Err("trailing backslash".to_string()),
            },
            (Some(_), c) => current.push(c),
            (None, '\'' | '"') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_operation_with_globals() {
        let cli = Cli::try_parse_from([
            "awscmd",
            "--region",
            "us-east-1",
            "sqs",
            "add-permission",
            "--queue-url",
            "https://queue.example/q1",
            "--label",
            "AllowSend",
            "--aws-account-id",
            "111122223333",
            "--action",
            "SendMessage,ReceiveMessage",
            "--force",
        ])
        .unwrap();

        assert_eq!(cli.global.region.as_deref(), Some("us-east-1"));
        assert!(cli.global.force);
        let Command::Service(ServiceCommand::Sqs(SqsCommand::AddPermission(params))) = cli.command
        else {
            panic!("expected sqs add-permission");
        };
        assert_eq!(
            params.action,
            Some(vec!["SendMessage".to_string(), "ReceiveMessage".to_string()])
        );
    }

    #[test]
    fn test_explicit_false_flag_is_bound() {
        let cli = Cli::try_parse_from([
            "awscmd",
            "pinpoint-email",
            "create-configuration-set",
            "--configuration-set-name",
            "paused",
            "--sending-options-sending-enabled",
            "false",
        ])
        .unwrap();
        let Command::Service(ServiceCommand::PinpointEmail(
            PinpointEmailCommand::CreateConfigurationSet(params),
        )) = cli.command
        else {
            panic!("expected create-configuration-set");
        };
        assert_eq!(params.sending_options_sending_enabled, Some(false));
        assert_eq!(params.reputation_options_reputation_metrics_enabled, None);
    }

    #[test]
    fn test_process_flags() {
        let cli = Cli::try_parse_from([
            "awscmd",
            "sqs",
            "purge-queue",
            "--queue-url",
            "u",
            "--confirm-impact",
            "high",
            "--log",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.global.process_flags(), ["--confirm-impact", "--log"]);

        let cli = Cli::try_parse_from(["awscmd", "--region", "r", "sqs", "list-queues"]).unwrap();
        assert!(cli.global.process_flags().is_empty());
    }

    #[test]
    fn test_operation_names() {
        let cli = Cli::try_parse_from(["awscmd", "sqs", "get-queue-url", "--queue-name", "q"]).unwrap();
        let Command::Service(command) = cli.command else {
            panic!("expected a service command");
        };
        assert_eq!(command.operation(), "GetQueueUrl");
    }

    #[test]
    fn test_split_words() {
        assert_eq!(
            split_words(r#"sqs send-message --message-body "hello world" --queue-url 'a b'"#).unwrap(),
            [
                "sqs",
                "send-message",
                "--message-body",
                "hello world",
                "--queue-url",
                "a b"
            ]
        );
        assert_eq!(split_words(r#"a\ b "" c"#).unwrap(), ["a b", "", "c"]);
        assert!(split_words("'open").is_err());
        assert!(split_words("trailing\\").is_err());
    }

    #[test]
    fn test_emit_writes_error_record_to_err() {
        let mut out = Vec::new();
        let mut err = Vec::new();
        let ok = emit(
            "DeleteQueue",
            Err(InvokeError::MissingRegion {
                operation: "DeleteQueue",
            }),
            &mut out,
            &mut err,
        )
        .unwrap();
        assert!(!ok);
        assert!(out.is_empty());
        let record: serde_json::Value = serde_json::from_slice(&err).unwrap();
        assert_eq!(record["Operation"], "DeleteQueue");
        assert_eq!(record["Category"], "InvalidArgument");
    }
}
