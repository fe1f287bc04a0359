use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::task::JoinHandle;

use vehicle_care_bot::application::errors::BotError;
use vehicle_care_bot::application::messaging::MessageParser;
use vehicle_care_bot::application::services::{vehicle_commands, CommandService, DecayService};
use vehicle_care_bot::domain::entities::User;
use vehicle_care_bot::domain::traits::{Bot, VehicleStore};
use vehicle_care_bot::infrastructure::adapters::console::CONSOLE_CHAT_ID;
use vehicle_care_bot::infrastructure::adapters::{ConsoleAdapter, TelegramAdapter};
use vehicle_care_bot::infrastructure::config::{Config, DecayConfig};
use vehicle_care_bot::infrastructure::database::SqliteVehicleStore;
use vehicle_care_bot::infrastructure::storage::MemoryVehicleStore;

/// Long-poll timeout for getUpdates
const POLL_TIMEOUT_SECS: i64 = 30;

#[derive(Parser)]
#[command(name = "vehicle-care-bot")]
#[command(about = "Track fuel, oil and tyre wear of your vehicles over chat", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Bot token (overrides config)
    #[arg(short, long)]
    token: Option<String>,

    /// Keep vehicles in memory instead of the database file
    #[arg(long)]
    memory: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env loaded: {}", e);
    }

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run => run_bot(&cli.config, cli.token, cli.memory),
        Commands::Version => {
            println!("vehicle-care-bot v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::InitConfig => init_config(),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn load_config(config_path: &str) -> Result<Config, BotError> {
    let config = if std::path::Path::new(config_path).exists() {
        Config::load(config_path)?.with_env_overrides()?
    } else {
        tracing::info!("No config at {}, using defaults", config_path);
        Config::load_env()?
    };
    Ok(config)
}

fn run_bot(config_path: &str, token_override: Option<String>, memory: bool) -> Result<(), BotError> {
    let mut config = load_config(config_path)?;
    if token_override.is_some() {
        config.telegram.token = token_override;
    }

    tracing::info!("Starting {}", config.bot.name);

    let store: Arc<dyn VehicleStore> = if memory {
        tracing::warn!("Using in-memory store, vehicles are lost on exit");
        Arc::new(MemoryVehicleStore::new())
    } else {
        let store = SqliteVehicleStore::open(&config.database.path)?;
        tracing::info!("Database initialized at {}", config.database.path.display());
        Arc::new(store)
    };

    let mut commands = CommandService::new(&config.bot.prefix);
    vehicle_commands::register(&mut commands, store.clone());

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        match config.telegram.token.clone() {
            Some(token) => run_telegram_bot(token, &config, store, &commands).await,
            None => run_console_bot(&config, store, &commands).await,
        }
    })
}

/// Start the decay job as its own task on the runtime
fn spawn_decay<B: Bot + 'static>(
    schedule: &DecayConfig,
    store: Arc<dyn VehicleStore>,
    bot: Arc<B>,
) -> JoinHandle<()> {
    let service = DecayService::new(store, bot);
    let (first_delay, interval) = (schedule.first_delay(), schedule.interval());
    tokio::spawn(async move { service.run(first_delay, interval).await })
}

async fn run_telegram_bot(
    token: String,
    config: &Config,
    store: Arc<dyn VehicleStore>,
    commands: &CommandService,
) -> Result<(), BotError> {
    let mut bot = TelegramAdapter::new(token);
    bot.fetch_bot_info().await?;
    bot.start().await?;

    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    if let Err(e) = bot.register_commands(&commands.menu()).await {
        tracing::warn!("Failed to register commands: {}", e);
    }

    let bot = Arc::new(bot);
    let decay = spawn_decay(&config.decay, store, bot.clone());
    let parser = MessageParser::new(commands.prefix());
    let mut offset: i64 = 0;

    tracing::info!("Starting message loop...");

    loop {
        let updates = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            updates = bot.get_updates(offset, POLL_TIMEOUT_SECS) => updates,
        };

        match updates {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::info!("Received {} updates", updates.len());
                }
                for update in &updates {
                    let Some(msg) = update.to_message(&parser) else {
                        continue;
                    };
                    if let Some(response) = commands.respond(&msg) {
                        tracing::info!("Sending response to chat_id {}: {}", msg.chat_id, preview(&response));
                        if let Err(e) = bot.send_message(&msg.chat_id, &response).await {
                            tracing::error!("Failed to send message: {}", e);
                        }
                    }
                }

                // Update offset
                offset = TelegramAdapter::get_next_offset(offset, &updates);
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
            }
        }
    }

    decay.abort();
    Ok(())
}

async fn run_console_bot(
    config: &Config,
    store: Arc<dyn VehicleStore>,
    commands: &CommandService,
) -> Result<(), BotError> {
    let bot = Arc::new(ConsoleAdapter::new());
    bot.start().await?;

    let info = bot.bot_info();
    tracing::info!("Bot started: @{}", info.username);

    let decay = spawn_decay(&config.decay, store, bot.clone());
    let parser = MessageParser::new(commands.prefix());

    loop {
        let input = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            input = bot.read_line("> ") => input,
        };
        let Some(input) = input else {
            break;
        };
        if input.is_empty() {
            continue;
        }

        let msg = parser
            .parse(CONSOLE_CHAT_ID, input.as_str(), Some(User::new(CONSOLE_CHAT_ID)))
            .with_platform("console");
        if let Some(response) = commands.respond(&msg) {
            let _ = bot.send_message(CONSOLE_CHAT_ID, &response).await;
        }
    }

    decay.abort();
    Ok(())
}

fn preview(text: &str) -> String {
    text.chars().take(100).collect()
}

fn init_config() -> Result<(), BotError> {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config)
        .map_err(|e| BotError::Parse(e.to_string()))?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
