//! schemac - compiles a directory of schema files
//!
//! Loads the unresolved schemas, runs the resolution and validation passes
//! and writes the compiled application as JSON.

use clap::Parser;
use schemac::{compile, format_diagnostics, serialize_application, BuildOptions};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "schemac")]
#[command(version, about = "Resolve and validate search application schemas")]
struct Cli {
    /// Schema files or directories holding them
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Skip the consistency validators
    #[arg(long)]
    no_validate: bool,

    /// Resolve document types only; skip summaries and rank profiles
    #[arg(long)]
    documents_only: bool,

    /// Fail when any warning is reported
    #[arg(long)]
    warnings_as_errors: bool,

    /// Write the compiled application here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,
}

impl Cli {
    fn options(&self) -> BuildOptions {
        BuildOptions {
            validate: !self.no_validate,
            documents_only: self.documents_only,
            warnings_as_errors: self.warnings_as_errors,
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "schemac=info,schemac_resolve=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let compiled = match compile(&cli.inputs, &cli.options()) {
        Ok(compiled) => compiled,
        Err(e) => {
            eprint!("{}", format_diagnostics(e.warnings()));
            error!("Compilation failed: {}", e);
            return ExitCode::FAILURE;
        }
    };
    eprint!("{}", format_diagnostics(&compiled.warnings));

    let json = match serialize_application(&compiled.application, cli.pretty) {
        Ok(json) => json,
        Err(e) => {
            error!("Failed to serialize application: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match &cli.output {
        Some(path) => {
            if let Err(e) = std::fs::write(path, json) {
                error!("Failed to write {}: {}", path.display(), e);
                return ExitCode::FAILURE;
            }
            info!("Wrote compiled application to {}", path.display());
        }
        None => println!("{}", json),
    }
    ExitCode::SUCCESS
}
