use std::time::Duration;

use cliputil_platform::{system_clipboard, ClipboardBackend};
use cliputil_session::{ClipboardSession, SessionConfig, SessionError};
use serde::Serialize;

use crate::cmd::{Context, DoctorArgs};
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: &'static str,
    status: CheckStatus,
    detail: String,
}

impl CheckResult {
    fn new(name: &'static str, status: CheckStatus, detail: impl Into<String>) -> Self {
        Self {
            name,
            status,
            detail: detail.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    schema_id: &'static str,
    backend: &'static str,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(_args: DoctorArgs, ctx: &Context) -> CliResult<i32> {
    let mut checks = vec![native_backend_check()];

    let backend = match ctx.backend() {
        Ok(backend) => Some(backend),
        Err(err) => {
            checks.push(CheckResult::new(
                "selected_backend",
                CheckStatus::Fail,
                err.message,
            ));
            None
        }
    };
    let backend_name = backend.as_ref().map_or("unavailable", |b| b.name());

    match backend {
        Some(backend) => checks.extend(access_checks(backend)),
        None => checks.push(CheckResult::new(
            "clipboard_access",
            CheckStatus::Skip,
            "no backend to probe",
        )),
    }
    checks.push(CheckResult::new(
        "contract_checks",
        CheckStatus::Info,
        if cfg!(debug_assertions) {
            "violations panic (debug build)"
        } else {
            "violations are logged (release build)"
        },
    ));

    let has_fail = checks.iter().any(|c| c.status == CheckStatus::Fail);
    let output = DoctorOutput {
        schema_id: "cliputil/cli/v1/doctor-report",
        backend: backend_name,
        checks,
        overall: if has_fail { "fail" } else { "pass" },
    };

    print_doctor(&output, ctx.format);

    Ok(if has_fail { HEALTH_CHECK_FAILED } else { SUCCESS })
}

fn native_backend_check() -> CheckResult {
    match system_clipboard() {
        Ok(backend) => CheckResult::new(
            "native_backend",
            CheckStatus::Pass,
            format!("{} clipboard available", backend.name()),
        ),
        Err(err) => CheckResult::new("native_backend", CheckStatus::Warn, err.to_string()),
    }
}

/// Single-attempt open, then a look at what is published.
fn access_checks<B: ClipboardBackend>(backend: B) -> Vec<CheckResult> {
    let config = SessionConfig {
        open_timeout: Duration::ZERO,
        ..SessionConfig::default()
    };
    let mut session = ClipboardSession::with_config(backend, config);
    match session.open_with_retry() {
        Ok(()) => {}
        Err(SessionError::AccessDenied { code }) => {
            return vec![CheckResult::new(
                "clipboard_access",
                CheckStatus::Warn,
                format!("clipboard held by another process (os error {code})"),
            )];
        }
        Err(err) => {
            return vec![CheckResult::new(
                "clipboard_access",
                CheckStatus::Fail,
                err.to_string(),
            )];
        }
    }

    let count = session.count();
    let size = session.size();
    let closed = session.close();
    vec![
        CheckResult::new("clipboard_access", CheckStatus::Pass, "open succeeded"),
        CheckResult::new(
            "published_formats",
            CheckStatus::Info,
            format!("{count} formats, {size} bytes"),
        ),
        CheckResult::new(
            "clipboard_release",
            if closed {
                CheckStatus::Pass
            } else {
                CheckStatus::Fail
            },
            if closed {
                "close succeeded"
            } else {
                "close refused"
            },
        ),
    ]
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("cliputil doctor ({})\n", output.backend);
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<20} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => println!("{}", output.overall),
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}
