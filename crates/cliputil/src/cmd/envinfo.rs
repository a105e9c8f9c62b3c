use std::collections::BTreeMap;

use serde::Serialize;

use crate::cmd::EnvinfoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

const ENV_VARS: [&str; 3] = ["CLIPUTIL_BACKEND", "CLIPUTIL_OPEN_TIMEOUT", "RUST_LOG"];

#[derive(Serialize)]
struct EnvInfoOutput {
    schema_id: &'static str,
    version: &'static str,
    target: String,
    os: &'static str,
    arch: &'static str,
    native_backend: &'static str,
    debug_assertions: bool,
    environment: BTreeMap<&'static str, Option<String>>,
}

pub fn run(_args: EnvinfoArgs, format: OutputFormat) -> CliResult<i32> {
    let environment = ENV_VARS
        .iter()
        .map(|&name| (name, std::env::var(name).ok()))
        .collect();

    let output = EnvInfoOutput {
        schema_id: "cliputil/cli/v1/envinfo",
        version: env!("CARGO_PKG_VERSION"),
        target: target_triple(),
        os: std::env::consts::OS,
        arch: std::env::consts::ARCH,
        native_backend: if cfg!(windows) { "win32" } else { "none" },
        debug_assertions: cfg!(debug_assertions),
        environment,
    };

    print_envinfo(&output, format);
    Ok(SUCCESS)
}

fn target_triple() -> String {
    if let Some(target) = option_env!("CLIPUTIL_BUILD_TARGET") {
        return target.to_string();
    }

    match (std::env::consts::ARCH, std::env::consts::OS) {
        ("x86_64", "windows") => "x86_64-pc-windows-msvc".to_string(),
        ("aarch64", "windows") => "aarch64-pc-windows-msvc".to_string(),
        ("x86_64", "linux") => "x86_64-unknown-linux-gnu".to_string(),
        ("aarch64", "macos") => "aarch64-apple-darwin".to_string(),
        (arch, os) => format!("{arch}-unknown-{os}"),
    }
}

fn print_envinfo(output: &EnvInfoOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(output),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("cliputil environment\n");
            println!("  Version:    {}", output.version);
            println!("  Target:     {}", output.target);
            println!("  Platform:   {} ({})", output.os, output.arch);
            println!("  Backend:    {}", output.native_backend);
            println!("  Debug:      {}", output.debug_assertions);
            println!("\n  Environment:");
            for (name, value) in &output.environment {
                println!(
                    "    {:<22} {}",
                    name,
                    value.as_deref().unwrap_or("(not set)")
                );
            }
        }
        OutputFormat::Raw => println!("{}", output.version),
    }
}
