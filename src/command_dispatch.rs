//! Purpose: Hold top-level CLI command dispatch for `jsonstore`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Command behavior, output envelopes, and exit code semantics stay unchanged.
//! Invariants: Helpers in `main.rs` remain the source of input/output formatting.

use super::*;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            clap_complete::aot::generate(shell, &mut cmd, "jsonstore", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_json(
                &json!({
                    "name": env!("CARGO_PKG_NAME"),
                    "version": env!("CARGO_PKG_VERSION"),
                }),
                true,
            );
            Ok(RunOutcome::ok())
        }
        Command::Load {
            path,
            default,
            compact,
        } => {
            let value = match default {
                Some(text) => {
                    let fallback = parse_default(&text)?;
                    if !path.exists() {
                        emit_notice(&Notice {
                            kind: "missing".to_string(),
                            time: notice_time_now().unwrap_or_default(),
                            cmd: "load".to_string(),
                            path: path.display().to_string(),
                            message: "file not found; using default".to_string(),
                            details: Map::new(),
                        });
                    }
                    load_json_or(&path, fallback)?
                }
                None => load_json(&path)?,
            };
            emit_json(&value, compact);
            Ok(RunOutcome::ok())
        }
        Command::Save {
            path,
            data_json,
            file,
            private,
            no_atomic,
            compact,
            indent,
        } => {
            let document = read_document(data_json, file)?;
            let encoder = if compact {
                JsonEncoder::compact()
            } else {
                JsonEncoder::new().indent(Some(indent.unwrap_or(2)))
            };
            let options = SaveOptions::new()
                .private(private)
                .atomic(!no_atomic)
                .encoder(encoder);
            save_json(&path, &StoredValue::from(document), &options)?;
            emit_json(
                &json!({
                    "saved": path.display().to_string(),
                    "private": options.is_private(),
                    "atomic": options.is_atomic(),
                }),
                true,
            );
            Ok(RunOutcome::ok())
        }
        Command::Check { path } => {
            let value = load_json(&path)?;
            emit_json(
                &json!({
                    "ok": true,
                    "path": path.display().to_string(),
                    "type": document_type(&value),
                }),
                true,
            );
            Ok(RunOutcome::ok())
        }
    }
}

fn document_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
