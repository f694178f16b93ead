//! Subscriber Schema CLI
//!
//! Command-line interface for inspecting the subscriber schema and overlay,
//! and for validating or default-filling subscriber records.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::Value;
use subscriber_schema::{
    check, fill_record, load_json, EditConfigController, FieldPath, FieldSpec, Mode,
    OverlayContext, OverlayEntry, ValidateError, Viewport,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "subscriber-schema")]
#[command(about = "Validate subscriber records and emit the edit form schema")]
#[command(version)]
struct Cli {
    /// Alternative schema grammar file (default: built-in subscriber schema)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the schema grammar
    Schema {
        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the layout overlay for an edit context
    Overlay {
        /// Edit mode: create or update
        #[arg(long, default_value = "create")]
        mode: Mode,

        /// Viewport category: small or other
        #[arg(long, default_value = "other")]
        viewport: Viewport,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Validate a record against the schema
    Validate {
        /// Record file to validate
        record: PathBuf,

        /// Fill schema defaults before validating
        #[arg(long)]
        fill_defaults: bool,

        /// Output results as JSON (for automation)
        #[arg(long)]
        json: bool,
    },

    /// Fill missing record fields from schema defaults
    Defaults {
        /// Record file to fill
        record: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the field definition at a path (e.g. pdn[*].qos.qci)
    Resolve {
        /// Field path
        path: String,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = load_controller(cli.schema.as_deref()).and_then(|controller| {
        match cli.command {
            Commands::Schema { output, pretty } => {
                write_json(&controller.schema().to_json(), output.as_deref(), pretty)
            }
            Commands::Overlay {
                mode,
                viewport,
                pretty,
            } => {
                let overlay = controller.overlay(OverlayContext::new(mode, viewport));
                write_json(&overlay.to_json(), None, pretty)
            }
            Commands::Validate {
                record,
                fill_defaults,
                json,
            } => run_validate(&controller, &record, fill_defaults, json),
            Commands::Defaults {
                record,
                output,
                pretty,
            } => {
                let record = load_record(&record)?;
                let filled = fill_record(controller.schema(), &record);
                write_json(&filled, output.as_deref(), pretty)
            }
            Commands::Resolve { path, pretty } => run_resolve(controller.schema(), &path, pretty),
        }
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(code) => ExitCode::from(code),
    }
}

fn load_controller(schema_path: Option<&Path>) -> Result<EditConfigController, u8> {
    let controller = match schema_path {
        None => EditConfigController::new(),
        Some(path) => {
            let document = load_json(path).map_err(|e| {
                eprintln!("Error: loading schema: {}", e);
                e.exit_code() as u8
            })?;
            let (schema, mut errors) = FieldSpec::from_json_partial(&document);
            let Some(schema) = schema else {
                let reason = errors.pop().map(|e| e.to_string()).unwrap_or_default();
                eprintln!("Error: invalid schema: {}", reason);
                return Err(2);
            };
            for err in &errors {
                eprintln!("Warning: skipped schema field: {}", err);
            }
            // A custom schema starts from an empty layout.
            EditConfigController::with_parts(schema, OverlayEntry::new())
        }
    };

    controller.map_err(|e| {
        eprintln!("Error: invalid schema: {}", e);
        2u8
    })
}

fn load_record(path: &Path) -> Result<Value, u8> {
    load_json(path).map_err(|e| {
        eprintln!("Error: loading record: {}", e);
        e.exit_code() as u8
    })
}

fn run_validate(
    controller: &EditConfigController,
    record_path: &Path,
    fill_defaults: bool,
    json_output: bool,
) -> Result<(), u8> {
    let mut record = load_record(record_path)?;
    if fill_defaults {
        record = fill_record(controller.schema(), &record);
    }

    match check(controller.schema(), &record) {
        Ok(()) => {
            if json_output {
                println!(r#"{{"valid":true}}"#);
            } else {
                println!("Valid");
            }
            Ok(())
        }
        Err(ValidateError::Invalid { errors }) => {
            if json_output {
                let output = serde_json::json!({
                    "valid": false,
                    "errors": errors
                });
                println!("{}", output);
            } else {
                eprintln!("Validation failed:");
                for error in errors {
                    eprintln!("  {}", error);
                }
            }
            Err(1)
        }
    }
}

fn run_resolve(schema: &FieldSpec, raw_path: &str, pretty: bool) -> Result<(), u8> {
    let path: FieldPath = raw_path.parse().map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    let spec = schema.resolve(&path).map_err(|e| {
        eprintln!("Error: {}", e);
        2u8
    })?;

    write_json(&spec.to_json(), None, pretty)
}

fn write_json(value: &Value, output: Option<&Path>, pretty: bool) -> Result<(), u8> {
    let json_output = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|e| {
        eprintln!("Error serializing output: {}", e);
        2u8
    })?;

    match output {
        Some(path) => {
            std::fs::write(path, &json_output).map_err(|e| {
                eprintln!("Error writing to {}: {}", path.display(), e);
                3u8
            })?;
        }
        None => {
            println!("{}", json_output);
        }
    }

    Ok(())
}
