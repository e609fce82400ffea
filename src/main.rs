use std::fs;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use herald::auth::TokenGenerator;
use herald::cli::{
    AdminCommands, BroadcastArgs, TokenCommands, VapidCommands, run_broadcast, run_token_create,
    run_token_list, run_token_revoke, run_vapid_show,
};
use herald::config::ServerConfig;
use herald::push::{BroadcastEngine, SubscriptionRegistry, VapidKeys, WebPushSender};
use herald::server::{AppState, create_router};
use herald::store::{SqliteStore, Store};

#[cfg(unix)]
fn set_restrictive_permissions(path: &std::path::Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "herald")]
#[command(about = "Breaking-news push delivery for the portal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(long, short, default_value = "8080")]
        port: u16,

        /// Data directory for the database and key files
        #[arg(long, default_value = "./data")]
        data_dir: String,

        /// Contact URI sent to push services in the VAPID claim
        #[arg(long, default_value = "mailto:newsroom@localhost")]
        vapid_subject: String,

        /// Seconds a push service may hold an undelivered alert
        #[arg(long, default_value = "86400")]
        push_ttl: u32,

        /// Per-delivery timeout in seconds during a broadcast
        #[arg(long, default_value = "10")]
        delivery_timeout: u64,
    },

    /// Manage access tokens
    Token {
        #[command(subcommand)]
        command: TokenCommands,
    },

    /// Inspect the VAPID key pair
    Vapid {
        #[command(subcommand)]
        command: VapidCommands,
    },

    /// Send an alert to every subscriber through a running server
    Broadcast(BroadcastArgs),
}

fn run_init(data_dir: String) -> anyhow::Result<()> {
    let config = ServerConfig::with_data_dir(data_dir);
    fs::create_dir_all(&config.data_dir)?;

    let store = SqliteStore::new(config.db_path())?;
    store.initialize()?;

    let token_file = config.admin_token_path();

    if store.has_admin_token()? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let vapid_file = config.vapid_path();
    let keys = if vapid_file.exists() {
        info!("Reusing VAPID key pair at {}", vapid_file.display());
        VapidKeys::load(&vapid_file)?
    } else {
        let keys = VapidKeys::generate();
        keys.save(&vapid_file)?;
        keys
    };

    let (token, raw_token) = TokenGenerator::new().issue(true, None, None)?;
    store.create_token(&token)?;

    fs::write(&token_file, &raw_token)?;
    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Herald initialized.");
    println!();
    println!("Operator token (saved to {}):", token_file.display());
    println!();
    println!("  {raw_token}");
    println!();
    println!("VAPID public key:");
    println!();
    println!("  {}", keys.public_key());
    println!("========================================");
    println!();

    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let token_file = config.admin_token_path();
    if !token_file.exists() {
        bail!(
            "Server not initialized. Run 'herald admin init' first to create the database and admin token."
        );
    }

    let store = SqliteStore::new(config.db_path())?;
    if !store.has_admin_token()? {
        bail!(
            "Server not initialized. Run 'herald admin init' first to create the database and admin token."
        );
    }
    let store: Arc<dyn Store> = Arc::new(store);

    let keys = VapidKeys::load(config.vapid_path())?;

    info!("Admin token available at {}", token_file.display());

    let sender = WebPushSender::new(
        reqwest::Client::new(),
        keys.private_key(),
        config.vapid_subject.clone(),
        config.push_ttl,
    );
    let engine = BroadcastEngine::new(SubscriptionRegistry::new(store.clone()), Arc::new(sender))
        .with_delivery_timeout(config.delivery_timeout);

    let state = Arc::new(AppState {
        store,
        engine: Arc::new(engine),
        vapid_public_key: keys.public_key().to_string(),
    });

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("herald=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init { data_dir } => run_init(data_dir)?,
        },
        Commands::Serve {
            host,
            port,
            data_dir,
            vapid_subject,
            push_ttl,
            delivery_timeout,
        } => {
            let config = ServerConfig {
                host,
                port,
                data_dir: data_dir.into(),
                vapid_subject,
                push_ttl,
                delivery_timeout: Duration::from_secs(delivery_timeout),
            };
            serve(config).await?;
        }
        Commands::Token { command } => match command {
            TokenCommands::Create {
                data_dir,
                user_id,
                admin,
                expires_days,
                json,
            } => run_token_create(data_dir, user_id, admin, expires_days, json)?,
            TokenCommands::List { data_dir, json } => run_token_list(data_dir, json)?,
            TokenCommands::Revoke {
                data_dir,
                token_id,
                yes,
                non_interactive,
            } => run_token_revoke(data_dir, token_id, yes, non_interactive)?,
        },
        Commands::Vapid { command } => match command {
            VapidCommands::Show { data_dir, json } => run_vapid_show(data_dir, json)?,
        },
        Commands::Broadcast(args) => {
            // The blocking client must not run on a runtime worker thread.
            tokio::task::spawn_blocking(move || run_broadcast(args)).await??;
        }
    }

    Ok(())
}
