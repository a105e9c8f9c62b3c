use cliputil_platform::ClipboardFormat;
use serde::Serialize;

use crate::cmd::{Context, SizeArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct SizeOutput {
    schema_id: &'static str,
    format: String,
    bytes: usize,
}

pub fn run(args: SizeArgs, ctx: &Context) -> CliResult<i32> {
    let session = ctx.open_session()?;
    let format = args
        .format_id
        .map(ClipboardFormat::from_raw)
        .unwrap_or(ClipboardFormat::ANY);
    let bytes = session.size_of(format);
    let label = if format.is_any() {
        "ALL".to_string()
    } else {
        format.to_string()
    };

    match ctx.format {
        OutputFormat::Json => print_json(&SizeOutput {
            schema_id: "cliputil/cli/v1/size",
            format: label,
            bytes,
        }),
        OutputFormat::Table | OutputFormat::Pretty => println!("{label}: {bytes} bytes"),
        OutputFormat::Raw => println!("{bytes}"),
    }
    Ok(SUCCESS)
}
