// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Mammoscan: mammogram upload client
//!
//! Command-line front end for the detection session and the scripted
//! awareness assistant.

use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info};

use mammoscan::chat::ChatAssistant;
use mammoscan::client::{AnalysisClient, AnalysisService};
use mammoscan::config::AppConfig;
use mammoscan::render::{render_text, ResultView};
use mammoscan::session::DetectionSession;
use mammoscan::Result;

/// Mammoscan CLI - mammogram upload client
#[derive(Parser, Debug)]
#[command(name = "mammoscan")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "1.0.0")]
#[command(about = "Upload mammogram images to an analysis service and read the results", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "config.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload an image and show the analysis
    Analyze {
        /// Image file to analyze
        path: PathBuf,

        /// Analysis endpoint (overrides config)
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Validate an image and show its inline preview
    Preview {
        /// Image file to preview
        path: PathBuf,

        /// Print the whole data URL
        #[arg(long)]
        full: bool,
    },

    /// Talk to the awareness assistant
    Chat,

    /// Check that the analysis service answers
    Status {
        /// Analysis endpoint (overrides config)
        #[arg(short, long)]
        endpoint: Option<String>,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "config.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(RunStatus::Done) => ExitCode::SUCCESS,
        Ok(RunStatus::Reported) => ExitCode::FAILURE,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// How a command ended when it did not return an error
#[derive(Debug, PartialEq, Eq)]
enum RunStatus {
    Done,
    /// Failed, and the failure was already shown to the user
    Reported,
}

async fn run(cli: Cli) -> Result<RunStatus> {
    let config = AppConfig::load(&cli.config)?;
    let color = config.output.color && !cli.no_color;

    match cli.command {
        Commands::Analyze { path, endpoint } => {
            run_analyze(config, path, endpoint, &cli.format, color).await
        }
        Commands::Preview { path, full } => run_preview(config, path, full, &cli.format).await,
        Commands::Chat => run_chat(config).await.map(|()| RunStatus::Done),
        Commands::Status { endpoint } => run_status(config, endpoint).await.map(|()| RunStatus::Done),
        Commands::Config { action } => {
            run_config_command(config, action, &cli.config).map(|()| RunStatus::Done)
        }
    }
}

fn apply_endpoint(config: &mut AppConfig, endpoint: Option<String>) -> Result<()> {
    if let Some(url) = endpoint {
        config.service.url = url;
        config.validate()?;
    }
    Ok(())
}

/// Pick, upload and render a single image
async fn run_analyze(
    mut config: AppConfig,
    path: PathBuf,
    endpoint: Option<String>,
    format: &str,
    color: bool,
) -> Result<RunStatus> {
    apply_endpoint(&mut config, endpoint)?;
    let client = AnalysisClient::new(&config.service)?;
    let mut session = DetectionSession::new();

    if let Err(e) = session.pick(&path).await {
        print_failure(&path, &e.user_message(), format)?;
        return Ok(RunStatus::Reported);
    }

    if format == "text" {
        println!("Analyzing {} ...", path.display());
    }

    match session.analyze(&client).await {
        Ok(result) => {
            let view = ResultView::from_result(&result);
            match format {
                "json" => {
                    let output = serde_json::json!({
                        "file": path.to_string_lossy(),
                        "endpoint": client.endpoint(),
                        "analyzed_at": Utc::now().to_rfc3339(),
                        "result": result,
                        "view": view,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                _ => {
                    println!();
                    print!("{}", render_text(&view, color));
                    if let Some(summary) = result.summary.as_deref() {
                        debug!("Service summary: {}", summary);
                    }
                }
            }
            Ok(RunStatus::Done)
        }
        Err(e) => {
            print_failure(&path, &e.user_message(), format)?;
            Ok(RunStatus::Reported)
        }
    }
}

fn print_failure(path: &Path, message: &str, format: &str) -> Result<()> {
    match format {
        "json" => {
            let output = serde_json::json!({
                "file": path.to_string_lossy(),
                "error": message,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        _ => eprintln!("Error: {}", message),
    }
    Ok(())
}

/// Show what would be uploaded
async fn run_preview(config: AppConfig, path: PathBuf, full: bool, format: &str) -> Result<RunStatus> {
    let mut session = DetectionSession::new();
    if let Err(e) = session.pick(&path).await {
        print_failure(&path, &e.user_message(), format)?;
        return Ok(RunStatus::Reported);
    }

    let Some(image) = session.image() else {
        return Ok(RunStatus::Reported);
    };

    if format == "json" {
        let output = serde_json::json!({
            "file": image.file_name,
            "media_type": image.media_type,
            "bytes": image.len(),
            "dimensions": image.dimensions.map(|(w, h)| serde_json::json!({"width": w, "height": h})),
            "preview": image.preview,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(RunStatus::Done);
    }

    println!("File: {}", image.file_name);
    println!("Media type: {}", image.media_type);
    println!("Size: {} bytes", image.len());
    match image.dimensions {
        Some((w, h)) => println!("Dimensions: {}x{}", w, h),
        None => println!("Dimensions: unknown"),
    }

    if full || image.preview.len() <= config.output.preview_chars {
        println!("Preview: {}", image.preview);
    } else {
        let head: String = image.preview.chars().take(config.output.preview_chars).collect();
        println!("Preview: {}... ({} chars)", head, image.preview.len());
    }

    Ok(RunStatus::Done)
}

/// Interactive line loop with the scripted assistant
async fn run_chat(config: AppConfig) -> Result<()> {
    let mut chat = ChatAssistant::new(&config.chat);
    if let Some(greeting) = chat.transcript().first() {
        println!("Assistant: {}", greeting.content);
    }
    println!("(type 'exit' to leave)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }
        if let Some(reply) = chat.send(line).await {
            println!("Assistant: {}", reply.content);
        }
    }

    info!("Chat ended after {} messages", chat.transcript().len());
    Ok(())
}

/// Run status check
async fn run_status(mut config: AppConfig, endpoint: Option<String>) -> Result<()> {
    apply_endpoint(&mut config, endpoint)?;
    let client = AnalysisClient::new(&config.service)?;

    println!("Mammoscan v1.0.0 Status");
    println!("=======================");
    println!("Endpoint: {}", client.endpoint());
    println!("Upload field: {}", config.service.field_name);
    match config.service.timeout_secs {
        Some(secs) => println!("Timeout: {}s", secs),
        None => println!("Timeout: none"),
    }

    match client.health_check().await {
        Ok(status) => println!("Service: reachable (HTTP {})", status),
        Err(e) => println!("Service: unreachable - {}", e.user_message()),
    }

    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            let json = serde_json::to_string_pretty(&config)?;
            println!("{}", json);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Endpoint: {}", config.service.url);
            println!("  Upload field: {}", config.service.field_name);
        }
    }

    Ok(())
}
