// crates/fleet-mcp-cli/src/main.rs
// ============================================================================
// Module: Fleet MCP CLI Entry Point
// Description: Command dispatcher for the fleet MCP server and its config.
// Purpose: Start the server and inspect tools and configuration offline.
// Dependencies: clap, fleet-mcp, fleet-mcp-config, fleet-mcp-contract, tokio.
// ============================================================================

//! ## Overview
//! The `fleet-mcp` binary starts the MCP server over stdio, HTTP, or SSE and
//! offers offline helpers for listing tools and validating configuration.
//! Diagnostics go to stderr; stdout carries only command output, or the
//! protocol stream when serving over stdio.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use fleet_mcp::McpServer;
use fleet_mcp_config::ConfigOverrides;
use fleet_mcp_config::FleetMcpConfig;
use fleet_mcp_config::ServerTransport;
use fleet_mcp_config::config_toml_example;
use fleet_mcp_contract::ToolDefinition;
use fleet_mcp_contract::ToolProfile;
use fleet_mcp_contract::profiles::DEFAULT_PROFILE_NAME;
use fleet_mcp_contract::tool_definitions;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "fleet-mcp", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the fleet MCP server.
    Serve(ServeCommand),
    /// List the tools exposed by a profile.
    Tools(ToolsCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Configuration for the `serve` command.
#[derive(Args, Debug, Default)]
struct ServeCommand {
    /// Optional config file path (defaults to fleet-mcp.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Transport override: stdio, http, or sse.
    #[arg(long, value_name = "MODE")]
    transport: Option<String>,
    /// Backend API base URL override.
    #[arg(long, alias = "ocm-base-url", value_name = "URL")]
    base_url: Option<String>,
    /// OAuth client identifier override.
    #[arg(long, value_name = "ID")]
    client_id: Option<String>,
    /// Bind host override for HTTP/SSE.
    #[arg(long, value_name = "IP")]
    host: Option<String>,
    /// Bind port override for HTTP/SSE.
    #[arg(long, value_name = "PORT")]
    port: Option<u16>,
    /// Externally visible base URL reported by discovery.
    #[arg(long, alias = "sse-base-url", value_name = "URL")]
    public_base_url: Option<String>,
}

/// Arguments for the `tools` command.
#[derive(Args, Debug)]
struct ToolsCommand {
    /// Tool profile to list.
    #[arg(long, value_name = "NAME", default_value = DEFAULT_PROFILE_NAME)]
    profile: String,
    /// Output format for the listing.
    #[arg(long, value_enum, default_value_t = ListFormat::Text)]
    format: ListFormat,
}

/// Output formats for tool listings.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
enum ListFormat {
    /// One tool per line.
    Text,
    /// Pretty-printed MCP tool definitions.
    Json,
}

/// Configuration subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file and print a summary.
    Validate(ConfigValidateCommand),
    /// Print an example config file.
    Example,
}

/// Arguments for config validation.
#[derive(Args, Debug)]
struct ConfigValidateCommand {
    /// Optional config file path (defaults to fleet-mcp.toml or env override).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        write_stdout_line(&version_line())
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(command) => command_serve(&command).await,
        Commands::Tools(command) => command_tools(&command),
        Commands::Config {
            command,
        } => command_config(command),
    }
}

/// Renders the version line.
fn version_line() -> String {
    format!("fleet-mcp {}", env!("CARGO_PKG_VERSION"))
}

/// Prints top-level help.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(command: &ServeCommand) -> CliResult<ExitCode> {
    let config = resolve_serve_config(command)?;
    let server = McpServer::from_config(config)
        .map_err(|err| CliError::new(format!("server init failed: {err}")))?;
    server.serve().await.map_err(|err| CliError::new(format!("server failed: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Loads the config file and applies command-line overrides.
fn resolve_serve_config(command: &ServeCommand) -> CliResult<FleetMcpConfig> {
    let overrides = serve_overrides(command)?;
    FleetMcpConfig::load(command.config.as_deref())
        .and_then(|config| config.with_overrides(&overrides))
        .map_err(|err| CliError::new(format!("config load failed: {err}")))
}

/// Builds config overrides from `serve` flags.
fn serve_overrides(command: &ServeCommand) -> CliResult<ConfigOverrides> {
    let transport = command
        .transport
        .as_deref()
        .map(str::parse::<ServerTransport>)
        .transpose()
        .map_err(|err| CliError::new(err.to_string()))?;
    Ok(ConfigOverrides {
        transport,
        host: command.host.clone(),
        port: command.port,
        public_base_url: command.public_base_url.clone(),
        base_url: command.base_url.clone(),
        client_id: command.client_id.clone(),
    })
}

// ============================================================================
// SECTION: Tools Command
// ============================================================================

/// Executes the `tools` command.
fn command_tools(command: &ToolsCommand) -> CliResult<ExitCode> {
    let output = render_tools(&command.profile, command.format)?;
    write_stdout_line(&output).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders the tools enabled by a profile.
fn render_tools(profile_name: &str, format: ListFormat) -> CliResult<String> {
    let profile = ToolProfile::by_name(profile_name)
        .ok_or_else(|| CliError::new(format!("unknown tool profile: {profile_name}")))?;
    let definitions: Vec<ToolDefinition> = tool_definitions()
        .into_iter()
        .filter(|definition| profile.contains(definition.name))
        .collect();
    match format {
        ListFormat::Json => serde_json::to_string_pretty(&definitions)
            .map_err(|err| CliError::new(format!("tool listing failed: {err}"))),
        ListFormat::Text => Ok(definitions
            .iter()
            .map(|definition| {
                format!("{}\t{}", definition.name, first_line(&definition.description))
            })
            .collect::<Vec<_>>()
            .join("\n")),
    }
}

/// Returns the first line of a description.
fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or_default().trim()
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(command) => command_config_validate(&command),
        ConfigCommand::Example => {
            write_stdout_line(config_toml_example().trim_end())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Executes `config validate`.
fn command_config_validate(command: &ConfigValidateCommand) -> CliResult<ExitCode> {
    let config = FleetMcpConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(format!("config load failed: {err}")))?;
    write_stdout_line(&describe_config(&config))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Summarizes a validated configuration on one line.
fn describe_config(config: &FleetMcpConfig) -> String {
    let endpoint = if config.server.transport.is_multi_connection() {
        format!(" bind={}:{}", config.server.host, config.server.port)
    } else {
        String::new()
    };
    format!(
        "config ok: transport={}{endpoint} backend={} profile={}",
        config.server.transport, config.backend.base_url, config.tools.profile
    )
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
