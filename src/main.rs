// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, debug, info, warn};
use serde_json::json;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use libretranslate_bridge::app_config::{self, Config, ConnectionEntry};
use libretranslate_bridge::config_flow::{self, ConnectionOptions};
use libretranslate_bridge::providers::libretranslate::LibreTranslate;
use libretranslate_bridge::services::{SERVICE_DETECT, SERVICE_TRANSLATE};
use libretranslate_bridge::translation_service::AUTO_SOURCE;
use libretranslate_bridge::{ConfigFlowError, Controller};

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

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add a LibreTranslate server after checking it answers
    Add {
        /// Display name
        #[arg(short, long, default_value = "LibreTranslate")]
        name: String,

        /// Server host name or address
        #[arg(long, default_value_t = app_config::default_host())]
        host: String,

        /// Server port
        #[arg(short, long, default_value_t = app_config::default_port())]
        port: u16,

        /// API key, if the server requires one
        #[arg(short = 'k', long, env = "LIBRETRANSLATE_API_KEY", default_value = "")]
        api_key: String,

        /// Connect over https
        #[arg(long)]
        ssl: bool,
    },

    /// Change the connection settings of a server
    Update {
        /// Entry id, as shown by `list`
        entry_id: String,

        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        #[arg(short = 'k', long)]
        api_key: Option<String>,

        /// Connect over https (true/false)
        #[arg(long)]
        ssl: Option<bool>,
    },

    /// Remove a server
    Remove {
        /// Entry id, as shown by `list`
        entry_id: String,
    },

    /// List configured servers
    List,

    /// Show the languages installed on a server
    Languages {
        /// Entry id; defaults to the first configured server
        #[arg(short, long)]
        entry: Option<String>,
    },

    /// Show the status of every configured server
    Status,

    /// Translate text
    Translate {
        /// Text to translate
        text: String,

        /// Source language code, or "auto"
        #[arg(short, long, default_value = AUTO_SOURCE)]
        source: String,

        /// Target language code
        #[arg(short, long)]
        target: String,

        /// Entry id; defaults to the first configured server
        #[arg(short, long)]
        entry: Option<String>,
    },

    /// Detect the language of text
    Detect {
        /// Text to examine
        text: String,

        /// Entry id; defaults to the first configured server
        #[arg(short, long)]
        entry: Option<String>,
    },

    /// Poll every server and print its status until interrupted
    Watch,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// libretranslate-bridge - LibreTranslate for home automation
///
/// Keeps track of self-hosted LibreTranslate servers and exposes translation
/// and language detection on top of them.
#[derive(Parser, Debug)]
#[command(name = "libretranslate-bridge")]
#[command(version)]
#[command(about = "Bridge to self-hosted LibreTranslate servers")]
#[command(long_about = "Keeps track of self-hosted LibreTranslate servers and exposes translation and language detection on top of them.

EXAMPLES:
    libretranslate-bridge add --host 192.168.1.10          # Add a server on the default port
    libretranslate-bridge translate \"Hello\" -s en -t es    # Translate with an explicit source
    libretranslate-bridge translate \"Bonjour\" -t de        # Let the server detect the source
    libretranslate-bridge status                           # Show reachability and languages
    libretranslate-bridge completions bash > ltb.bash      # Generate bash completions

CONFIGURATION:
    Servers are stored in a JSON file in the user config directory by default.
    If the file doesn't exist, a default one will be created automatically.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config_path: Option<PathBuf>,

    /// Set logging level
    #[arg(short, long, value_enum, global = true)]
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

    // @returns: ANSI color and label for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
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
            let (color, label) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                color,
                now,
                label,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // The logger passes everything; the global max level does the filtering
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(*shell, &mut cmd, "libretranslate-bridge", &mut std::io::stdout());
        return Ok(());
    }

    let config_path = cli.config_path.clone().unwrap_or_else(app_config::default_config_path);
    let mut config = Config::load_or_create(&config_path)?;
    if let Some(level) = cli.log_level.clone() {
        config.log_level = level.into();
    }
    config.validate().context("Configuration validation failed")?;
    log::set_max_level(config.log_level.into());
    debug!("Using configuration at {}", config_path.display());

    match cli.command {
        Commands::Add { name, host, port, api_key, ssl } => {
            let entry = ConnectionEntry::new(name, host, port, api_key, ssl);
            let provider = LibreTranslate::from_entry(&entry, config.timeout_secs)?;
            let entry = config_flow::add_entry(&mut config, entry, &provider)
                .await
                .map_err(flow_error)?;
            config.save(&config_path)?;
            println!("{}\t{}", entry.entry_id, entry.title());
        }
        Commands::Update { entry_id, host, port, api_key, ssl } => {
            let current = config
                .entry(&entry_id)
                .ok_or_else(|| anyhow!("Unknown config entry: {}", entry_id))?;
            let mut options = ConnectionOptions::from_entry(current);
            if let Some(host) = host {
                options.host = host;
            }
            if let Some(port) = port {
                options.port = port;
            }
            if let Some(api_key) = api_key {
                options.api_key = api_key;
            }
            if let Some(ssl) = ssl {
                options.use_ssl = ssl;
            }

            let candidate = ConnectionEntry {
                host: options.host.clone(),
                port: options.port,
                use_ssl: options.use_ssl,
                api_key: options.api_key.clone(),
                ..current.clone()
            };
            let provider = LibreTranslate::from_entry(&candidate, config.timeout_secs)?;
            let entry = config_flow::update_entry_options(&mut config, &entry_id, options, &provider)
                .await
                .map_err(flow_error)?;
            config.save(&config_path)?;
            println!("{}\t{}", entry.entry_id, entry.title());
        }
        Commands::Remove { entry_id } => {
            let removed = config_flow::remove_entry(&mut config, &entry_id).map_err(flow_error)?;
            config.save(&config_path)?;
            println!("Removed {}", removed.title());
        }
        Commands::List => {
            if config.entries.is_empty() {
                warn!("No translation servers configured, use `add` first");
            }
            for entry in &config.entries {
                let url = entry.base_url().map(|u| u.to_string()).unwrap_or_default();
                println!("{}\t{}\t{}", entry.entry_id, entry.name, url);
            }
        }
        Commands::Languages { entry } => {
            let controller = start(config, entry.as_deref(), false).await?;
            let translator = controller
                .translator(entry.as_deref())
                .ok_or_else(|| anyhow!("No translation server is loaded"))?;
            if let Some(snapshot) = translator.coordinator().data() {
                for language in snapshot.languages() {
                    println!("{}\t{}\t{}", language.code, language.name, language.targets.join(","));
                }
            }
        }
        Commands::Status => {
            let controller = start(config, None, false).await?;
            print_status(&controller)?;
        }
        Commands::Translate { text, source, target, entry } => {
            let controller = start(config, entry.as_deref(), false).await?;
            let data = json!({ "text": text, "source": source, "target": target });
            let response = controller
                .call_service(SERVICE_TRANSLATE, entry.as_deref(), data)
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Detect { text, entry } => {
            let controller = start(config, entry.as_deref(), false).await?;
            let response = controller
                .call_service(SERVICE_DETECT, entry.as_deref(), json!({ "text": text }))
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::Watch => {
            let period = Duration::from_secs(config.scan_interval_secs);
            let mut controller = start(config, None, true).await?;
            let mut ticker = tokio::time::interval(period);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let recovered = controller.setup_pending().await;
                        if recovered > 0 {
                            info!("{} translation server(s) became ready", recovered);
                        }
                        print_status(&controller)?;
                    }
                    _ = tokio::signal::ctrl_c() => {
                        info!("Interrupted, stopping");
                        break;
                    }
                }
            }
        }
        // Handled before the config is loaded
        Commands::Completions { .. } => {}
    }

    Ok(())
}

fn flow_error(err: ConfigFlowError) -> anyhow::Error {
    anyhow!("{} ({})", err, err.error_key())
}

/// Load one entry, or every entry when none is named
async fn start(config: Config, entry_id: Option<&str>, polling: bool) -> Result<Controller> {
    let mut controller = Controller::with_config(config)?.with_polling(polling);
    match entry_id {
        Some(id) => controller.setup_entry(id).await?,
        None => {
            if controller.setup_all().await == 0 && !controller.config().entries.is_empty() {
                warn!("No translation server could be set up");
            }
        }
    }
    Ok(controller)
}

fn print_status(controller: &Controller) -> Result<()> {
    for entry in &controller.config().entries {
        let status = match controller.health(&entry.entry_id) {
            Some(projection) => serde_json::to_value(projection.display_snapshot())?,
            None => json!({ "status": "unknown" }),
        };
        println!("{}\t{}", entry.title(), status);
    }
    Ok(())
}
