mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{BackendKind, Command, Context};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "cliputil", version, about = "Shared clipboard utility")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "warn", global = true)]
    log_level: LogLevel,

    /// Clipboard to operate on.
    #[arg(
        long,
        value_name = "BACKEND",
        env = "CLIPUTIL_BACKEND",
        default_value = "system",
        global = true
    )]
    backend: BackendKind,

    /// How long to wait for another process to release the clipboard (e.g. 5s, 500ms).
    #[arg(
        long,
        value_name = "DURATION",
        env = "CLIPUTIL_OPEN_TIMEOUT",
        default_value = "5s",
        global = true
    )]
    open_timeout: String,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::parse_duration(&cli.open_timeout).and_then(|open_timeout| {
        let ctx = Context {
            format,
            backend: cli.backend,
            open_timeout,
        };
        cmd::run(cli.command, &ctx)
    });

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
