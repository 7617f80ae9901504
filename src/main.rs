//! Purpose: `jsonstore` CLI entry point and command dispatch.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit stable stdout formats (JSON documents or JSON envelopes).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: All file access goes through `jsonstore::api` (atomic save + structured errors).
use std::error::Error as StdError;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use jsonstore::api::{
    Error, ErrorKind, JsonEncoder, SaveOptions, StoredValue, load_json, load_json_or, save_json,
    to_exit_code,
};
use jsonstore::notice::{Notice, notice_json, notice_time_now};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Run `jsonstore --help` for usage."));
            }
        },
    };

    init_tracing();
    command_dispatch::dispatch_command(cli.command).map_err(add_io_hint)
}

#[derive(Parser, Debug)]
#[command(
    name = "jsonstore",
    version,
    about = "Save and load JSON documents with atomic writes",
    long_about = "Save and load JSON documents with atomic writes.\n\nLog verbosity follows RUST_LOG (default: warn)."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a stored JSON document.
    Load {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
        #[arg(long, help = "JSON document to print when the file does not exist")]
        default: Option<String>,
        #[arg(long, help = "Emit compact JSON instead of pretty output")]
        compact: bool,
    },
    /// Save a JSON document read from --data-json, --file, or stdin.
    Save {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
        #[arg(long, conflicts_with = "file", help = "Inline JSON document to save")]
        data_json: Option<String>,
        #[arg(long, value_hint = ValueHint::FilePath, help = "Read the document from this file")]
        file: Option<PathBuf>,
        #[arg(long, help = "Restrict the saved file to owner read/write")]
        private: bool,
        #[arg(long, help = "Write in place instead of temp file + rename")]
        no_atomic: bool,
        #[arg(long, conflicts_with = "indent", help = "Write compact JSON")]
        compact: bool,
        #[arg(long, help = "Spaces per indent level (default: 2)")]
        indent: Option<usize>,
    },
    /// Verify that a file holds a readable JSON document.
    Check {
        #[arg(value_hint = ValueHint::FilePath)]
        path: PathBuf,
    },
    /// Generate shell completion scripts.
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Print version information as JSON.
    Version,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn clap_error_summary(err: &clap::Error) -> String {
    let rendered = err.to_string();
    rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.trim_start_matches("error:").trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::NotFound => err.with_hint("Check that the file and its directory exist."),
        ErrorKind::Permission => err.with_hint("Check file and directory permissions."),
        ErrorKind::Serialization => {
            err.with_hint("Remove or convert the values listed as bad data and retry.")
        }
        _ => err,
    }
}

fn read_document(data_json: Option<String>, file: Option<PathBuf>) -> Result<Value, Error> {
    let (text, source) = match (data_json, file) {
        (Some(text), _) => (text, "--data-json".to_string()),
        (None, Some(file)) => {
            let text = std::fs::read_to_string(&file).map_err(|err| {
                Error::from_io(err, &file).with_message("failed to read input file")
            })?;
            (text, file.display().to_string())
        }
        (None, None) => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text).map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("failed to read stdin")
                    .with_source(err)
            })?;
            (text, "stdin".to_string())
        }
    };
    serde_json::from_str(&text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("input from {source} is not valid JSON"))
            .with_hint("Provide a single JSON document.")
            .with_source(err)
    })
}

fn parse_default(text: &str) -> Result<Value, Error> {
    serde_json::from_str(text).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("--default is not valid JSON")
            .with_source(err)
    })
}

fn emit_json(value: &Value, compact: bool) {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    let json = rendered.unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn emit_notice(notice: &Notice) {
    if io::stderr().is_terminal() {
        eprintln!("notice: {} (path: {})", notice.message, notice.path);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Corrupt => "corrupt data".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
        ErrorKind::Serialization => "value cannot be serialized".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    if let Some(faults) = err.faults() {
        let faults: Map<String, Value> = faults
            .iter()
            .map(|(path, value)| (path.to_string(), json!(value.repr())))
            .collect();
        inner.insert("faults".to_string(), Value::Object(faults));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(path) = err.path() {
        if !err.is_serialization() {
            lines.push(format!("path: {}", path.display()));
        }
    }
    for cause in error_causes(err) {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}
