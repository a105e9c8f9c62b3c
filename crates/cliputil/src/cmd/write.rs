use std::io::Read;

use serde::Serialize;
use tracing::debug;

use crate::cmd::{Context, WriteArgs};
use crate::exit::{io_error, CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct WriteOutput {
    schema_id: &'static str,
    bytes: usize,
    cleared: bool,
}

pub fn run(args: WriteArgs, ctx: &Context) -> CliResult<i32> {
    let text = match (args.text, args.file) {
        (Some(text), _) => text,
        (None, Some(path)) => std::fs::read_to_string(&path)
            .map_err(|err| io_error(&format!("read {}", path.display()), err))?,
        (None, None) => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .map_err(|err| io_error("read stdin", err))?;
            text
        }
    };

    let mut session = ctx.open_session()?;
    let cleared = !args.keep;
    if cleared && !session.clear() {
        return Err(CliError::new(FAILURE, "clipboard could not be cleared"));
    }
    if !session.write_text(&text) {
        return Err(CliError::new(FAILURE, "clipboard rejected the text"));
    }
    debug!(bytes = text.len(), cleared, "clipboard text written");

    match ctx.format {
        OutputFormat::Json => print_json(&WriteOutput {
            schema_id: "cliputil/cli/v1/write",
            bytes: text.len(),
            cleared,
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("wrote {} bytes to the clipboard", text.len());
        }
        OutputFormat::Raw => println!("{}", text.len()),
    }
    Ok(SUCCESS)
}
