use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::cmd::{Context, LogArgs};
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct LogOutput {
    schema_id: &'static str,
    path: String,
    bytes: usize,
    appended: bool,
}

/// Store exactly the clipboard bytes, without a trailing newline.
fn save_text(path: &Path, text: &str, append: bool) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .append(append)
        .truncate(!append)
        .open(path)?;
    file.write_all(text.as_bytes())
}

pub fn run(args: LogArgs, ctx: &Context) -> CliResult<i32> {
    let session = ctx.open_session()?;
    let text = session.read_text();
    // Release the clipboard before touching the filesystem.
    drop(session);

    let context = format!("write {}", args.path.display());
    save_text(&args.path, &text, args.append).map_err(|err| io_error(&context, err))?;
    info!(path = %args.path.display(), bytes = text.len(), "clipboard text logged");

    match ctx.format {
        OutputFormat::Json => print_json(&LogOutput {
            schema_id: "cliputil/cli/v1/log",
            path: args.path.display().to_string(),
            bytes: text.len(),
            appended: args.append,
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("logged {} bytes to {}", text.len(), args.path.display());
        }
        OutputFormat::Raw => println!("{}", text.len()),
    }
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(tag: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("cliputil-log-{tag}-{}.txt", std::process::id()))
    }

    #[test]
    fn saved_text_matches_clipboard_bytes() {
        let path = temp_path("exact");
        std::fs::write(&path, "stale contents").unwrap();

        save_text(&path, "Hello world", false).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"Hello world");

        save_text(&path, "!", true).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"Hello world!");
        let _ = std::fs::remove_file(&path);
    }
}
