use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use cliputil_platform::{system_clipboard, ClipboardBackend, MemoryClipboard};
use cliputil_session::{ClipboardSession, SessionConfig, ValueKind};
use tracing::debug;

use crate::exit::{platform_error, session_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod clear;
pub mod doctor;
pub mod envinfo;
pub mod formats;
pub mod log;
pub mod read;
pub mod size;
pub mod version;
pub mod write;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the clipboard text, optionally decoded as a number.
    Read(ReadArgs),
    /// Replace the clipboard contents with text.
    Write(WriteArgs),
    /// Remove every published format.
    Clear(ClearArgs),
    /// List the published formats and their sizes.
    Formats(FormatsArgs),
    /// Report the size of one format or of the whole clipboard.
    Size(SizeArgs),
    /// Save the clipboard text to a file.
    Log(LogArgs),
    /// Run local clipboard health checks.
    Doctor(DoctorArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Print build and environment diagnostics.
    Envinfo(EnvinfoArgs),
}

pub fn run(command: Command, ctx: &Context) -> CliResult<i32> {
    match command {
        Command::Read(args) => read::run(args, ctx),
        Command::Write(args) => write::run(args, ctx),
        Command::Clear(args) => clear::run(args, ctx),
        Command::Formats(args) => formats::run(args, ctx),
        Command::Size(args) => size::run(args, ctx),
        Command::Log(args) => log::run(args, ctx),
        Command::Doctor(args) => doctor::run(args, ctx),
        Command::Version(args) => version::run(args),
        Command::Envinfo(args) => envinfo::run(args, ctx.format),
    }
}

/// Which clipboard the commands talk to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// The OS clipboard.
    System,
    /// A private in-process clipboard that starts empty on every run.
    Memory,
}

/// Settings shared by every command.
#[derive(Debug, Clone, Copy)]
pub struct Context {
    pub format: OutputFormat,
    pub backend: BackendKind,
    pub open_timeout: Duration,
}

impl Context {
    pub fn backend(&self) -> CliResult<Box<dyn ClipboardBackend>> {
        match self.backend {
            BackendKind::System => system_clipboard()
                .map(|backend| Box::new(backend) as Box<dyn ClipboardBackend>)
                .map_err(|err| platform_error("clipboard backend", err)),
            BackendKind::Memory => Ok(Box::new(MemoryClipboard::new())),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            open_timeout: self.open_timeout,
            ..SessionConfig::default()
        }
    }

    /// Open a session with the default configuration for this run.
    pub fn open_session(&self) -> CliResult<ClipboardSession<Box<dyn ClipboardBackend>>> {
        self.open_session_with(self.session_config())
    }

    pub fn open_session_with(
        &self,
        config: SessionConfig,
    ) -> CliResult<ClipboardSession<Box<dyn ClipboardBackend>>> {
        let backend = self.backend()?;
        debug!(backend = backend.name(), ?config, "opening clipboard session");
        let mut session = ClipboardSession::with_config(backend, config);
        session
            .open_with_retry()
            .map_err(|err| session_error("open clipboard", err))?;
        Ok(session)
    }
}

/// Parse `<n>`, `<n>s` or `<n>ms` into a non-zero duration.
pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .trim()
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    Ok(match unit {
        "ms" => Duration::from_millis(value),
        _ => Duration::from_secs(value),
    })
}

/// Typed reading of the clipboard text.
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReadAs {
    Text,
    Int,
    Float,
}

impl From<ReadAs> for ValueKind {
    fn from(kind: ReadAs) -> Self {
        match kind {
            ReadAs::Text => ValueKind::Text,
            ReadAs::Int => ValueKind::Integer,
            ReadAs::Float => ValueKind::Float,
        }
    }
}

#[derive(Args, Debug)]
pub struct ReadArgs {
    /// Decode the text as this kind of value.
    #[arg(long = "as", value_name = "KIND", default_value = "text")]
    pub kind: ReadAs,
    /// Radix for --as int (2-36; a 0x prefix is accepted for 16).
    #[arg(long, default_value_t = 10)]
    pub radix: u32,
}

#[derive(Args, Debug)]
pub struct WriteArgs {
    /// Text to publish. Read from stdin when neither TEXT nor --file is given.
    #[arg(conflicts_with = "file")]
    pub text: Option<String>,
    /// Read the text from a UTF-8 file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,
    /// Keep the formats already on the clipboard instead of clearing them.
    #[arg(long)]
    pub keep: bool,
}

#[derive(Args, Debug, Default)]
pub struct ClearArgs {}

#[derive(Args, Debug, Default)]
pub struct FormatsArgs {}

#[derive(Args, Debug)]
pub struct SizeArgs {
    /// Native id of a single format (0 means every format).
    #[arg(long, value_name = "ID")]
    pub format_id: Option<u32>,
}

#[derive(Args, Debug)]
pub struct LogArgs {
    /// File that receives the clipboard text.
    pub path: PathBuf,
    /// Append instead of overwriting.
    #[arg(long)]
    pub append: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct EnvinfoArgs {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds() {
        assert_eq!(parse_duration("5s").unwrap(), Duration::from_secs(5));
        assert_eq!(parse_duration("2").unwrap(), Duration::from_secs(2));
    }

    #[test]
    fn parse_duration_millis() {
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
    }

    #[test]
    fn parse_duration_invalid() {
        for bad in ["", "0s", "0ms", "bad", "-1s", "1.5s"] {
            let err = parse_duration(bad).unwrap_err();
            assert_eq!(err.code, USAGE, "{bad}");
        }
    }

    #[test]
    fn memory_backend_session_opens() {
        let ctx = Context {
            format: OutputFormat::Json,
            backend: BackendKind::Memory,
            open_timeout: Duration::from_millis(100),
        };
        let session = ctx.open_session().expect("memory backend should open");
        assert!(session.is_open());
        assert_eq!(session.backend().name(), "in-memory");
    }

    #[test]
    #[cfg(not(windows))]
    fn system_backend_is_unavailable_off_windows() {
        let ctx = Context {
            format: OutputFormat::Json,
            backend: BackendKind::System,
            open_timeout: Duration::from_secs(1),
        };
        let err = ctx.open_session().unwrap_err();
        assert_eq!(err.code, crate::exit::BACKEND_UNAVAILABLE);
    }
}
