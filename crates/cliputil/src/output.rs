use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use cliputil_platform::ClipboardFormat;
use comfy_table::{presets::UTF8_FULL, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// One published format as reported by `cliputil formats`.
#[derive(Debug, Serialize)]
pub struct FormatRow {
    pub id: u32,
    pub name: String,
    pub portable: String,
    pub size: usize,
}

impl FormatRow {
    pub fn new(native: ClipboardFormat, size: usize) -> Self {
        Self {
            id: native.as_raw(),
            name: native.to_string(),
            portable: ClipboardFormat::from_native(native.as_raw()).to_string(),
            size,
        }
    }
}

#[derive(Serialize)]
struct FormatsOutput<'a> {
    schema_id: &'static str,
    count: usize,
    total_size: usize,
    formats: &'a [FormatRow],
}

pub fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

pub fn print_formats(rows: &[FormatRow], format: OutputFormat) {
    let total_size = rows.iter().map(|row| row.size).sum();
    match format {
        OutputFormat::Json => print_json(&FormatsOutput {
            schema_id: "cliputil/cli/v1/formats",
            count: rows.len(),
            total_size,
            formats: rows,
        }),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ID", "NAME", "PORTABLE", "SIZE"]);
            for row in rows {
                table.add_row(vec![
                    format!("{:#06x}", row.id),
                    row.name.clone(),
                    row.portable.clone(),
                    row.size.to_string(),
                ]);
            }
            if let Some(column) = table.column_mut(3) {
                column.set_cell_alignment(CellAlignment::Right);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if rows.is_empty() {
                println!("clipboard is empty");
                return;
            }
            for row in rows {
                println!("  {:#06x}  {:<14} {:>10} bytes", row.id, row.name, row.size);
            }
            println!("\n  {} formats, {} bytes", rows.len(), total_size);
        }
        OutputFormat::Raw => {
            for row in rows {
                println!("{}", row.id);
            }
        }
    }
}
