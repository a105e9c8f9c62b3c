use crate::cmd::{Context, FormatsArgs};
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_formats, FormatRow};

pub fn run(_args: FormatsArgs, ctx: &Context) -> CliResult<i32> {
    let session = ctx.open_session()?;

    let rows: Vec<FormatRow> = session
        .formats()
        .map(|format| FormatRow::new(format, session.size_of(format)))
        .collect();

    print_formats(&rows, ctx.format);
    Ok(SUCCESS)
}
