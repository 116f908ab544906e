use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use scout_common::ScoutError;
use scout_common::observability::init_logging;
use scout_config::{ScoutConfig, ScoutConfigLoader};
use scout_web::tools::ToolOutput;
use scout_web::{FetchArgs, SearchArgs, WebTools};
use wiring::{build_tools, log_config};
mod wiring;

const DEFAULT_CONFIG: &str = "scout.yaml";

/// Web search and page extraction from the command line.
#[derive(Debug, Parser)]
#[command(name = "scout", version)]
struct Cli {
    /// YAML config file; `scout.yaml` in the working directory is used when present.
    #[arg(long, global = true, env = "SCOUT_CONFIG")]
    config: Option<PathBuf>,

    /// Mirror log events to stderr.
    #[arg(long, global = true)]
    log_stderr: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Search DuckDuckGo.
    Search {
        query: String,
        #[arg(long, default_value_t = 10.0)]
        count: f64,
    },
    /// Render a page and print its structured text.
    Fetch { url: String },
    /// Invoke a tool by name with JSON arguments.
    Call { tool: String, args: String },
    /// Print the tool definitions as JSON.
    Tools,
}

fn load_config(path: Option<&PathBuf>) -> Result<ScoutConfig> {
    let loader = match path {
        Some(path) => ScoutConfigLoader::new().with_file(path),
        None => ScoutConfigLoader::new().with_optional_file(DEFAULT_CONFIG),
    };
    loader.load().context("loading scout config")
}

fn emit(output: ToolOutput) -> ExitCode {
    println!("{}", output.text);
    if output.is_error {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let cfg = load_config(cli.config.as_ref())?;
    let log_path = init_logging(log_config(&cfg, cli.log_stderr))?;
    tracing::info!(log = %log_path.display(), command = ?cli.command, "scout starting");

    if let Command::Tools = cli.command {
        println!("{}", serde_json::to_string_pretty(&WebTools::definitions())?);
        return Ok(ExitCode::SUCCESS);
    }

    let tools = build_tools(&cfg)?;
    let output = match cli.command {
        Command::Search { query, count } => tools.search(&SearchArgs { query, count }).await,
        Command::Fetch { url } => tools.browse(&FetchArgs { url }).await,
        Command::Call { tool, args } => match serde_json::from_str(&args) {
            Ok(args) => tools.call(&tool, args).await,
            Err(err) => ToolOutput::failure(ScoutError::InvalidArguments(err.to_string())),
        },
        Command::Tools => return Ok(ExitCode::SUCCESS),
    };
    Ok(emit(output))
}
