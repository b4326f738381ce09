// Pinpoint CLI - Command Line Interface Entry Point

mod prefs;
mod send;
mod serve;
mod stdio_host;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pinpoint_config::{Config, ConfigLoader, parse_override};
use pinpoint_core::dispatch::RecordingHost;
use pinpoint_core::{AgentService, Ide, render_prompt};
use pinpoint_protocol::UserMessage;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Pinpoint - route toolbar prompts to IDE coding agents
#[derive(Parser, Debug)]
#[command(name = "pinpoint")]
#[command(version, about, long_about = None)]
struct TopCli {
    #[clap(flatten)]
    config_overrides: CliConfigOverrides,

    #[clap(subcommand)]
    command: Commands,

    /// Named configuration profile
    #[arg(long = "profile", global = true)]
    profile: Option<String>,

    /// Project directory searched for .pinpoint/config.toml
    #[arg(short = 'd', long = "dir", global = true)]
    dir: Option<PathBuf>,
}

/// CLI configuration overrides
#[derive(Debug, clap::Args)]
struct CliConfigOverrides {
    /// Configuration override in key=value format
    #[arg(short = 'c', long = "config", value_name = "KEY=VALUE", global = true)]
    overrides: Vec<String>,
}

/// Available commands
#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the IDE detected from an application name
    Detect {
        /// Host application name; defaults to host.app_name, then $TERM_PROGRAM
        #[arg(long = "app-name")]
        app_name: Option<String>,
    },

    /// Print the rendered prompt of a user message
    Render {
        /// UserMessage JSON file
        #[arg(short = 'm', long = "message")]
        message: PathBuf,
    },

    /// Handle a user message against a recording host and print its calls
    Dispatch {
        /// UserMessage JSON file
        #[arg(short = 'm', long = "message")]
        message: PathBuf,

        /// Host application name
        #[arg(long = "app-name")]
        app_name: Option<String>,

        /// Extension id to report as installed (repeatable)
        #[arg(long = "installed", value_name = "ID")]
        installed: Vec<String>,
    },

    /// Compose a toolbar message and send it to an in-process agent
    Send {
        /// Prompt text
        #[arg(short = 'i', long = "input")]
        input: String,

        /// URL of the page the message is about
        #[arg(long = "page-url")]
        page_url: Option<String>,

        /// Title of that page
        #[arg(long = "title")]
        title: Option<String>,

        /// Registry theme to attach (repeatable)
        #[arg(long = "theme", value_name = "NAME")]
        themes: Vec<String>,

        /// Host application name
        #[arg(long = "app-name")]
        app_name: Option<String>,

        /// Extension id to report as installed (repeatable)
        #[arg(long = "installed", value_name = "ID")]
        installed: Vec<String>,
    },

    /// Run the agent service over stdin/stdout as JSON lines
    Serve,

    /// Toolbar preferences
    Prefs {
        #[command(subcommand)]
        prefs_command: PrefsCommands,
    },
}

/// Preference commands
#[derive(Debug, Subcommand)]
enum PrefsCommands {
    /// Show stored preferences
    Show,

    /// Set one preference
    Set {
        /// Preference key (theme, minimized, prompt_action, cli_version)
        key: String,

        /// New value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries command output and the serve protocol; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info".to_string())
                .as_str(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = TopCli::parse();
    let config = load_config(&cli)?;
    debug!(command = ?cli.command, "pinpoint starting");

    match cli.command {
        Commands::Detect { app_name } => {
            detect(app_name, &config);
        }
        Commands::Render { message } => {
            let message = read_message(&message)?;
            println!("{}", render_prompt(&message));
        }
        Commands::Dispatch {
            message,
            app_name,
            installed,
        } => {
            run_dispatch(&message, app_name, installed, &config).await?;
        }
        Commands::Send {
            input,
            page_url,
            title,
            themes,
            app_name,
            installed,
        } => {
            let options = send::SendOptions {
                input,
                page_url,
                title,
                themes,
                app_name,
                installed,
            };
            let report = send::send_once(options, &config).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Serve => {
            serve::run(&config).await?;
        }
        Commands::Prefs { prefs_command } => {
            handle_prefs_command(prefs_command, &config).await?;
        }
    }

    Ok(())
}

fn load_config(cli: &TopCli) -> Result<Config> {
    let overrides = cli
        .config_overrides
        .overrides
        .iter()
        .map(|raw| parse_override(raw))
        .collect::<Result<Vec<_>>>()?;

    let mut loader = ConfigLoader::new().with_profile(cli.profile.clone());
    let project_dir = match &cli.dir {
        Some(dir) => Some(dir.clone()),
        None => std::env::current_dir().ok(),
    };
    if let Some(dir) = project_dir {
        loader = loader.with_project_dir(dir);
    }
    loader.load_with_cli_overrides(overrides)
}

fn host_app_name(app_name: Option<String>, config: &Config) -> String {
    app_name
        .or_else(|| config.host.app_name.clone())
        .or_else(|| std::env::var("TERM_PROGRAM").ok())
        .unwrap_or_default()
}

fn detect(app_name: Option<String>, config: &Config) {
    let app_name = host_app_name(app_name, config);
    let ide = Ide::detect(&app_name);
    println!("{ide} ({})", ide.display_name());
}

fn read_message(path: &Path) -> Result<UserMessage> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid user message in {}", path.display()))
}

/// Dry run of the agent side: same handling as `serve`, recorded instead of
/// executed.
async fn run_dispatch(
    path: &Path,
    app_name: Option<String>,
    installed: Vec<String>,
    config: &Config,
) -> Result<()> {
    let message = read_message(path)?;
    let host = Arc::new(
        RecordingHost::new(host_app_name(app_name, config))
            .with_installed(config.host.installed_extensions.iter().cloned())
            .with_installed(installed),
    );
    let service = AgentService::new(host.clone(), &config.agent);
    service.start();

    let result = match service.handle_user_message(message).await {
        Ok(report) => serde_json::json!({ "ok": report }),
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    };
    service.shutdown();
    info!(calls = host.calls().len(), "dispatch finished");

    let output = serde_json::json!({
        "result": result,
        "state": service.state(),
        "calls": host.calls(),
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

/// Handle prefs commands
async fn handle_prefs_command(cmd: PrefsCommands, config: &Config) -> Result<()> {
    let store = prefs::open_store(&config.storage).await?;
    match cmd {
        PrefsCommands::Show => {
            let preferences = store.load().await;
            println!("{}", serde_json::to_string_pretty(&preferences)?);
        }
        PrefsCommands::Set { key, value } => {
            let current = store.load().await;
            let updated = prefs::apply_preference(current, &key, &value)?;
            store.save(&updated).await?;
            println!("{}", serde_json::to_string_pretty(&updated)?);
        }
    }
    Ok(())
}
