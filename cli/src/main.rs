//! miwallet - command-line front end

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod state;

use state::AppState;

#[derive(Parser)]
#[command(name = "miwallet")]
#[command(about = "Xiaomi wallet video-welfare tasks and membership exchange", long_about = None)]
struct Cli {
    /// Directory holding the database (defaults to the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add or refresh an account's credentials
    Login {
        #[command(subcommand)]
        method: LoginMethod,
    },
    /// Manage stored accounts
    Accounts {
        #[command(subcommand)]
        action: AccountsAction,
    },
    /// Manage and run membership exchanges
    Exchange {
        #[command(subcommand)]
        action: ExchangeAction,
    },
    /// Show or change settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Run the daily tasks for every account
    Run {
        /// Seconds to wait before starting
        #[arg(long, default_value_t = 10)]
        countdown: u64,
        /// Exit quietly unless auto-run is enabled in settings (for schedulers)
        #[arg(long)]
        scheduled: bool,
    },
    /// Inspect recorded runs
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum LoginMethod {
    /// Scan a QR code with the Mi app
    Qr { alias: String },
    /// Enter a user id and pass token directly
    Token {
        alias: String,
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        pass_token: String,
    },
}

#[derive(Subcommand)]
enum AccountsAction {
    List,
    Remove { alias: String },
}

#[derive(Subcommand)]
enum ExchangeAction {
    /// Add a membership to redeem, or change its phone number
    Add {
        alias: String,
        /// Free text, e.g. "腾讯视频" or "iqiyi"
        membership_type: String,
        phone: String,
    },
    Remove {
        alias: String,
        membership_type: String,
    },
    List {
        alias: Option<String>,
    },
    /// Redeem every configured membership
    Run,
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set {
        #[arg(long)]
        license_key: Option<String>,
        /// PushPlus token; pass an empty string to disable notifications
        #[arg(long)]
        notification_token: Option<String>,
        #[arg(long)]
        auto_run: Option<bool>,
        /// License verification URL; pass an empty string to clear
        #[arg(long)]
        license_endpoint: Option<String>,
    },
}

#[derive(Subcommand)]
enum HistoryAction {
    List,
    Show { id: String },
    Delete { id: String },
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "miwallet=info,miwallet_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(|| {
        dirs_next::data_local_dir()
            .map(|p| p.join("MiWallet"))
            .unwrap_or_else(|| PathBuf::from("."))
    });
    let state = AppState::open(data_dir).await?;

    match cli.command {
        Commands::Login { method } => match method {
            LoginMethod::Qr { alias } => commands::login::qr(&state, &alias).await?,
            LoginMethod::Token {
                alias,
                user_id,
                pass_token,
            } => commands::login::token(&state, &alias, &user_id, &pass_token).await?,
        },
        Commands::Accounts { action } => match action {
            AccountsAction::List => commands::accounts::list(&state).await?,
            AccountsAction::Remove { alias } => commands::accounts::remove(&state, &alias).await?,
        },
        Commands::Exchange { action } => match action {
            ExchangeAction::Add {
                alias,
                membership_type,
                phone,
            } => commands::exchange::add(&state, &alias, &membership_type, &phone).await?,
            ExchangeAction::Remove {
                alias,
                membership_type,
            } => commands::exchange::remove(&state, &alias, &membership_type).await?,
            ExchangeAction::List { alias } => {
                commands::exchange::list(&state, alias.as_deref()).await?
            }
            ExchangeAction::Run => commands::run::exchanges(&state).await?,
        },
        Commands::Settings { action } => match action {
            SettingsAction::Show => commands::settings::show(&state).await?,
            SettingsAction::Set {
                license_key,
                notification_token,
                auto_run,
                license_endpoint,
            } => {
                commands::settings::set(
                    &state,
                    commands::settings::SettingsUpdate {
                        license_key,
                        notification_token,
                        auto_run,
                        license_endpoint,
                    },
                )
                .await?
            }
        },
        Commands::Run {
            countdown,
            scheduled,
        } => commands::run::daily_tasks(&state, countdown, scheduled).await?,
        Commands::History { action } => match action {
            HistoryAction::List => commands::history::list(&state).await?,
            HistoryAction::Show { id } => commands::history::show(&state, &id).await?,
            HistoryAction::Delete { id } => commands::history::delete(&state, &id).await?,
            HistoryAction::Clear => commands::history::clear(&state).await?,
        },
    }

    Ok(())
}
