// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Result, anyhow};
use log::{info, LevelFilter, Log, Metadata, Record, Level, SetLoggerError};
use std::io::Write;
use clap::{Parser, ValueEnum, CommandFactory, Subcommand};
use clap_complete::{generate, Shell};
use serde::Serialize;

use ploudos::app_config::{self, Config};
use ploudos::{Controller, StartOutcome};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

/// Commands that talk to the panel
#[derive(Subcommand, Debug)]
enum PanelCommand {
    /// Print the current server status
    Info,

    /// Tell whether the restart fast path is available
    CanRestart,

    /// Bring the server up (restart if possible, otherwise queue and accept)
    Start,

    /// Queue the server and wait until it needs accepting or runs
    Queue,

    /// Accept a queued server and wait until it runs
    Accept,

    /// Start a server that is not fully stopped and wait until it runs
    Restart,

    /// Stop the server
    Stop,

    /// Leave the start queue
    ExitQueue,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(flatten)]
    Panel(PanelCommand),

    /// Generate shell completions for ploudos
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// ploudos - control a PloudOS game server from the command line
#[derive(Parser, Debug)]
#[command(name = "ploudos")]
#[command(version)]
#[command(about = "Unofficial PloudOS server control tool")]
#[command(long_about = "Logs into the PloudOS panel and drives the server lifecycle.

EXAMPLES:
    ploudos info                                # Show server status
    ploudos start                               # Start the server, waiting until it runs
    ploudos -s 1234 stop                        # Stop server 1234
    ploudos --log-level debug queue             # Queue with per-poll logging
    ploudos completions bash > ploudos.bash     # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Credentials can also come from the
    PLOUDOS_USERNAME and PLOUDOS_PASSWORD environment variables.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Panel username
    #[arg(short, long, env = "PLOUDOS_USERNAME")]
    username: Option<String>,

    /// Panel password
    #[arg(short, long, env = "PLOUDOS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Identifier of the server to manage
    #[arg(short, long)]
    server_id: Option<u64>,

    /// Maximum status polls while queued
    #[arg(long)]
    queue_timeout: Option<u32>,

    /// Maximum status polls while waiting for the server to run after accept/restart
    #[arg(long)]
    start_timeout: Option<u32>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: String,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and emoji for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("1;31", "❌ "),
            Level::Warn => ("1;33", "🚧 "),
            Level::Info => ("1;32", " "),
            Level::Debug => ("1;36", "🔍 "),
            Level::Trace => ("1;35", "📋 "),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (color, emoji) = Self::style_for_level(record.level());

            let _ = writeln!(
                std::io::stderr(),
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Accept everything here; the effective level is narrowed with set_max_level below
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(*shell, &mut cmd, "ploudos", &mut std::io::stdout());
            Ok(())
        }
        Commands::Panel(command) => {
            let config = load_config(&cli)?;
            log::set_max_level(config.log_level.to_level_filter());

            run_command(command, &config).await
        }
    }
}

// Load the config file and apply command line overrides
fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    if let Some(username) = &cli.username {
        config.credentials.username = username.clone();
    }

    if let Some(password) = &cli.password {
        config.credentials.password = password.clone();
    }

    if let Some(server_id) = cli.server_id {
        config.server_id = server_id;
    }

    if let Some(queue_timeout) = cli.queue_timeout {
        config.polling.queue_timeout = queue_timeout;
    }

    if let Some(start_timeout) = cli.start_timeout {
        config.polling.start_timeout = start_timeout;
    }

    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate()
        .map_err(|e| anyhow!("Configuration validation failed: {}", e))?;

    Ok(config)
}

async fn run_command(command: &PanelCommand, config: &Config) -> Result<()> {
    let controller = Controller::connect(config).await?;
    let client = controller.client();

    match command {
        PanelCommand::Info => print_json(&client.server_info().await?)?,
        PanelCommand::CanRestart => println!("{}", client.can_restart().await?),
        PanelCommand::Start => {
            let outcome = controller.ensure_running().await?;
            match &outcome {
                StartOutcome::AlreadyRunning(_) => info!("Server was already running"),
                StartOutcome::Restarted(_) => info!("Server restarted"),
                StartOutcome::Accepted(_) => info!("Server queued and accepted"),
                StartOutcome::StartedWithoutAccept(_) => info!("Server started without accept"),
            }
            print_json(outcome.info())?;
        }
        PanelCommand::Queue => {
            let needs_accept = client.queue().await?;
            if needs_accept {
                info!("Server is waiting for accept, run `ploudos accept`");
            }
            println!("{}", needs_accept);
        }
        PanelCommand::Accept => print_json(&client.accept_server().await?)?,
        PanelCommand::Restart => print_json(&client.restart().await?)?,
        PanelCommand::Stop => print_json(&client.stop().await?)?,
        PanelCommand::ExitQueue => print_json(&client.exit_queue().await?)?,
    }

    controller.shutdown();
    Ok(())
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
