use serde::Serialize;

use crate::cmd::{ClearArgs, Context};
use crate::exit::{CliError, CliResult, FAILURE, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct ClearOutput {
    schema_id: &'static str,
    removed_formats: usize,
    cleared: bool,
}

pub fn run(_args: ClearArgs, ctx: &Context) -> CliResult<i32> {
    let mut session = ctx.open_session()?;
    let removed_formats = session.count();
    if !session.clear() {
        return Err(CliError::new(FAILURE, "clipboard could not be cleared"));
    }

    match ctx.format {
        OutputFormat::Json => print_json(&ClearOutput {
            schema_id: "cliputil/cli/v1/clear",
            removed_formats,
            cleared: true,
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("cleared {removed_formats} formats");
        }
        OutputFormat::Raw => println!("{removed_formats}"),
    }
    Ok(SUCCESS)
}
