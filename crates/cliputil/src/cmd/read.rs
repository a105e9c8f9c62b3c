use cliputil_session::{ClipValue, ValueKind};
use serde::Serialize;
use serde_json::json;

use crate::cmd::{Context, ReadArgs};
use crate::exit::{codec_error, CliResult, SUCCESS};
use crate::output::{print_json, print_raw, OutputFormat};

#[derive(Serialize)]
struct ReadOutput {
    schema_id: &'static str,
    kind: String,
    value: serde_json::Value,
}

pub fn run(args: ReadArgs, ctx: &Context) -> CliResult<i32> {
    let session = ctx.open_session()?;
    let value = session
        .read_value(ValueKind::from(args.kind), args.radix)
        .map_err(|err| codec_error("decode clipboard text", err))?;

    match ctx.format {
        OutputFormat::Json => print_json(&ReadOutput {
            schema_id: "cliputil/cli/v1/read",
            kind: value.kind().to_string(),
            value: json_value(&value),
        }),
        OutputFormat::Table | OutputFormat::Pretty => println!("{value}"),
        OutputFormat::Raw => print_raw(value.encode().as_bytes()),
    }
    Ok(SUCCESS)
}

fn json_value(value: &ClipValue) -> serde_json::Value {
    match value {
        ClipValue::Text(text) => json!(text),
        ClipValue::Integer(number) => json!(number),
        ClipValue::Float(number) => json!(number),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_stay_numbers_in_json() {
        assert_eq!(json_value(&ClipValue::Integer(7)), json!(7));
        assert_eq!(json_value(&ClipValue::Float(0.5)), json!(0.5));
        assert_eq!(json_value(&ClipValue::Text("7".into())), json!("7"));
    }

    #[test]
    fn non_finite_floats_become_null() {
        assert!(json_value(&ClipValue::Float(f64::NAN)).is_null());
    }
}
