//! famchat - terminal client for the family chat
//!
#![doc = "famchat - terminal client for the family chat"]
#![doc = "Main entry point for the famchat application."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use famchat::cli::{Cli, Commands};
use famchat::commands;
use famchat::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    // Load configuration
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);
    let config = Config::load(&config_path)?;

    // Validate configuration
    config.validate()?;

    // Execute command
    match cli.command {
        Commands::Chat { email } => {
            tracing::info!("Starting interactive chat session");
            if let Some(e) = &email {
                tracing::debug!("Using login email hint: {}", e);
            }

            commands::chat::run_chat(config, email).await?;
            Ok(())
        }
        Commands::Login { email } => {
            tracing::info!("Starting sign-in");
            commands::auth::login(config, email).await?;
            Ok(())
        }
        Commands::Logout => {
            tracing::info!("Starting sign-out");
            commands::auth::logout(config).await?;
            Ok(())
        }
        Commands::Rooms => {
            tracing::info!("Listing rooms");
            commands::rooms::list_rooms(config).await?;
            Ok(())
        }
        Commands::Send { room, text } => {
            tracing::info!("Sending one message");
            commands::send::send_once(config, room, text).await?;
            Ok(())
        }
        Commands::Whoami => {
            commands::auth::whoami(config).await?;
            Ok(())
        }
    }
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "famchat=debug"
    } else {
        "famchat=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
