//! Binary entry point for the quire CLI.
//!
//! ## Usage
//!
//! ```bash
//! # Load analyzer output into the store
//! quire import entities.json
//!
//! # Render what changed since the last build
//! quire render
//!
//! # Show what would be rendered
//! quire status
//!
//! # Remove the build output only
//! quire clean --build
//! ```

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};

use quire::cli::{run_clean, run_import, run_render, run_status, CliSettings};
use quire::error::{OutputErrorCode, QuireError};
use quire::output::{emit_response, ErrorResponse};

// ============================================================================
// CLI Structure
// ============================================================================

/// Incremental API documentation builder.
///
/// Renders documentation for the entities in the store, re-rendering only
/// the pages whose inputs changed since the last build. All output is JSON.
#[derive(Parser, Debug)]
#[command(name = "quire", version, about = "Incremental API documentation builder")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

/// Global arguments shared by all subcommands.
#[derive(Parser, Debug)]
struct GlobalArgs {
    /// Configuration file (default: quire.json in the current directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Theme name, overriding the configuration.
    #[arg(long, global = true)]
    theme: Option<String>,

    /// Output directory, overriding the configuration.
    #[arg(long, global = true)]
    build_dir: Option<PathBuf>,

    /// Cache directory, overriding the configuration.
    #[arg(long, global = true)]
    cache_dir: Option<PathBuf>,

    /// Directory to discover themes in (default: themes/).
    ///
    /// Can be specified multiple times; later directories override themes
    /// of the same name found in earlier ones.
    #[arg(long, global = true)]
    themes_dir: Vec<PathBuf>,

    /// Log level for tracing output.
    #[arg(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

impl GlobalArgs {
    fn settings(&self) -> Result<CliSettings, QuireError> {
        let base_dir = std::env::current_dir()
            .map_err(|e| QuireError::internal(format!("cannot read current directory: {}", e)))?;
        Ok(CliSettings {
            config: self.config.clone(),
            theme: self.theme.clone(),
            build_dir: self.build_dir.clone(),
            cache_dir: self.cache_dir.clone(),
            themes_dirs: self.themes_dir.clone(),
            base_dir,
        })
    }
}

/// Log level for tracing output.
#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn to_tracing_level(self) -> tracing::Level {
        match self {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Synchronize the store with a JSON array of entities.
    Import {
        /// Analyzer output file.
        input: PathBuf,
    },
    /// Render pages for everything that changed.
    Render {
        /// Flush the template cache before rendering.
        #[arg(long)]
        force: bool,
    },
    /// Show the pending diff without rendering.
    Status,
    /// Remove cached and generated files.
    Clean {
        /// Remove the entity store.
        #[arg(long)]
        store: bool,
        /// Remove the build output.
        #[arg(long)]
        build: bool,
    },
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.global.log_level);

    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let error_code = OutputErrorCode::from(&err);
            let response = ErrorResponse::from_error(&err);

            // Errors go to stdout as JSON like every other response.
            let _ = emit_response(&response, &mut io::stdout());
            let _ = io::stdout().flush();

            ExitCode::from(error_code.code())
        }
    }
}

/// Initialize tracing subscriber.
fn init_tracing(level: LogLevel) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_tracing_level().to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Execute the CLI command.
fn execute(cli: Cli) -> Result<(), QuireError> {
    let settings = cli.global.settings()?;
    let config = settings.resolve()?;
    let mut stdout = io::stdout();

    let written = match cli.command {
        Command::Import { input } => emit_response(&run_import(&config, &input)?, &mut stdout),
        Command::Render { force } => emit_response(
            &run_render(&config, &settings.theme_roots(), force)?,
            &mut stdout,
        ),
        Command::Status => emit_response(&run_status(&config)?, &mut stdout),
        Command::Clean { store, build } => {
            emit_response(&run_clean(&config, store, build)?, &mut stdout)
        }
    };
    written.map_err(|e| QuireError::internal(format!("failed to write response: {}", e)))
}

// ============================================================================
// Tests
// ============================================================================
