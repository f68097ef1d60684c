//! Pagesmith - Entry Point
//!
//! Turns an application brief into a static site with a coding agent and
//! publishes it to GitHub Pages.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use colored::Colorize;
use serde::Serialize;
use tracing::{error, info};

use pagesmith::app::pipeline::{Deployer, Pipeline};
use pagesmith::app::run::run;
use pagesmith::app::settings::Settings;
use pagesmith::codegen::parser::parse_agent_output;
use pagesmith::codegen::runner::CommandAgent;
use pagesmith::deploy::command::SystemRunner;
use pagesmith::deploy::publisher::{PublishRequest, Publisher};
use pagesmith::errors::PagesmithError;
use pagesmith::filesys::dir::Dir;
use pagesmith::filesys::file::File;
use pagesmith::logs::{init_logging, LogLevel, LogOptions};
use pagesmith::models::deployment::{DeployRequest, DeploymentResult};
use pagesmith::utils::version_info;

const USAGE: &str = "\
Usage: pagesmith [--settings=<file.json>] [--log-level=<level>] [--log-dir=<dir>] [--json-logs] <command>

Commands:
  --version                                 Print version information
  --deploy --request=<file.json>            Generate and publish one round
  --publish --request=<file.json> --files=<dir>
                                            Publish pre-generated files
  --parse --input=<file>                    Extract files from agent output
  --serve                                   Serve deployment requests over HTTP";

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    let mut cli_args: HashMap<String, String> = HashMap::new();

    for arg in args.iter().skip(1) {
        if let Some((key, value)) = arg.split_once('=') {
            // Handle --key=value format
            let clean_key = key.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), value.to_string());
        } else if arg.starts_with("--") {
            // Handle standalone flags like --version
            let clean_key = arg.trim_start_matches('-');
            cli_args.insert(clean_key.to_string(), "true".to_string());
        }
    }

    // Print version and exit
    if cli_args.contains_key("version") {
        if let Err(e) = print_json(&version_info()) {
            eprintln!("{} {}", "[ERROR]".red().bold(), e);
        }
        return;
    }

    let command = ["deploy", "publish", "parse", "serve"]
        .into_iter()
        .find(|c| cli_args.contains_key(*c));
    let Some(command) = command else {
        eprintln!("{}", USAGE);
        std::process::exit(2);
    };

    // Load settings, then apply the environment
    let settings = match Settings::load(cli_args.get("settings").map(String::as_str)).await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{} Unable to load settings: {}", "[ERROR]".red().bold(), e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    let log_level = match cli_args.get("log-level") {
        Some(level) => level.parse::<LogLevel>().unwrap_or_else(|e| {
            eprintln!("{} {}", "[WARN]".yellow().bold(), e);
            settings.log_level.clone()
        }),
        None => settings.log_level.clone(),
    };
    let log_options = LogOptions {
        log_level,
        log_dir: cli_args.get("log-dir").map(PathBuf::from),
        json_format: cli_args.contains_key("json-logs"),
        ..Default::default()
    };
    let log_guard = match init_logging(log_options) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            None
        }
    };

    let result = match command {
        "parse" => parse_command(&cli_args).await,
        "publish" => publish_command(&cli_args, &settings).await,
        "deploy" => deploy_command(&cli_args, &settings).await,
        _ => serve_command(&settings).await,
    };

    if let Err(e) = result {
        error!("pagesmith --{} failed: {}", command, e);
        eprintln!("{} {}", "[ERROR]".red().bold(), e);
        drop(log_guard);
        std::process::exit(1);
    }
}

/// Print the files found in a saved agent transcript
async fn parse_command(cli_args: &HashMap<String, String>) -> Result<(), PagesmithError> {
    let input = required_arg(cli_args, "input")?;
    let output = File::new(input).read_string().await?;
    let files = parse_agent_output(&output);
    if files.is_empty() {
        eprintln!(
            "{} no html/css/js blocks found in {}",
            "[WARN]".yellow().bold(),
            input
        );
    }
    print_json(&files)
}

/// Publish a directory of pre-generated files without invoking the agent
async fn publish_command(
    cli_args: &HashMap<String, String>,
    settings: &Settings,
) -> Result<(), PagesmithError> {
    let request = read_request(cli_args).await?;
    let files = Dir::new(required_arg(cli_args, "files")?)
        .read_text_files()
        .await?;

    let publisher = build_publisher(settings)?;
    let result = publisher
        .publish(&PublishRequest {
            task: request.task,
            files,
            attachments: request.attachments,
            round: request.round,
        })
        .await?;
    print_result(&result)
}

/// Generate and publish one round
async fn deploy_command(
    cli_args: &HashMap<String, String>,
    settings: &Settings,
) -> Result<(), PagesmithError> {
    let request = read_request(cli_args).await?;
    let pipeline = build_pipeline(settings)?;
    let result = pipeline.deploy(&request).await?;
    print_result(&result)
}

/// Serve deployment requests until interrupted
async fn serve_command(settings: &Settings) -> Result<(), PagesmithError> {
    let deployer: Arc<dyn Deployer> = Arc::new(build_pipeline(settings)?);
    let options = settings.server_options();
    info!("Running pagesmith server with options: {:?}", options);
    run(options, deployer, await_shutdown_signal()).await
}

fn build_publisher(settings: &Settings) -> Result<Publisher<SystemRunner>, PagesmithError> {
    let operator = settings.operator()?;
    let options = settings.publish_options();
    let runner = SystemRunner::new(options.command_timeout);
    Ok(Publisher::new(runner, operator, options))
}

fn build_pipeline(
    settings: &Settings,
) -> Result<Pipeline<CommandAgent, SystemRunner>, PagesmithError> {
    let agent = CommandAgent::new(&settings.agent_options())?;
    Ok(Pipeline::new(agent, build_publisher(settings)?))
}

async fn read_request(cli_args: &HashMap<String, String>) -> Result<DeployRequest, PagesmithError> {
    let path = required_arg(cli_args, "request")?;
    File::new(path).read_json::<DeployRequest>().await
}

fn required_arg<'a>(
    cli_args: &'a HashMap<String, String>,
    key: &str,
) -> Result<&'a str, PagesmithError> {
    cli_args
        .get(key)
        .map(String::as_str)
        .filter(|v| !v.is_empty() && *v != "true")
        .ok_or_else(|| PagesmithError::ConfigError(format!("missing --{}=<value>", key)))
}

fn print_result(result: &DeploymentResult) -> Result<(), PagesmithError> {
    eprintln!(
        "{} Round {} published: {}",
        "[SUCCESS]".green().bold(),
        result.round,
        result.pages_url
    );
    print_json(result)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), PagesmithError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn await_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, shutting down...");
                    }
                    _ = sigint.recv() => {
                        info!("SIGINT received, shutting down...");
                    }
                }
            }
            _ => {
                error!("Unable to install signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
                info!("Ctrl+C received, shutting down...");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down...");
    }
}
