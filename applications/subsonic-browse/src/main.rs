/// Subsonic Browse - command-line catalog browser
mod browse;
mod config;

use clap::{Parser, Subcommand};
use config::BrowseSettings;
use std::path::PathBuf;
use subsonic_client::{CatalogEvent, LoginState, SubsonicService};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "subsonic-browse")]
#[command(about = "Browse the catalog of a Subsonic server", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Server URL
    #[arg(short, long, global = true)]
    server: Option<String>,

    /// Username
    #[arg(short, long, global = true)]
    username: Option<String>,

    /// Password
    #[arg(short, long, global = true)]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the server and credentials
    Ping,
    /// Print the catalog
    Tree {
        /// Levels to expand below the root (1 = artists)
        #[arg(short, long)]
        depth: Option<usize>,
        /// Print JSON instead of an outline
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subsonic_client=info,subsonic_browse=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut settings = BrowseSettings::load(cli.config.as_deref())?;
    settings.apply_overrides(cli.server, cli.username, cli.password);
    settings.validate()?;

    let service = SubsonicService::with_http()?;
    log_events(&service);

    let state = login(&service, &settings).await?;

    match cli.command {
        Commands::Ping => {
            println!("{}", state);
            if state != LoginState::LoggedIn {
                anyhow::bail!("Login failed: {}", state);
            }
        }
        Commands::Tree { depth, json } => {
            if state != LoginState::LoggedIn {
                anyhow::bail!("Login failed: {}", state);
            }

            let depth = depth.unwrap_or(settings.browse.depth);
            browse::expand_to_depth(&service, depth).await?;

            let tree = service.catalog().await;
            if json {
                println!("{}", serde_json::to_string_pretty(&tree)?);
            } else {
                print!("{}", browse::render_tree(&tree));
            }
        }
    }

    Ok(())
}

async fn login(service: &SubsonicService, settings: &BrowseSettings) -> anyhow::Result<LoginState> {
    service.login(settings.server_config()).await?.await?;
    Ok(service.current_login_state().await)
}

/// Mirror catalog events into the debug log.
fn log_events(service: &SubsonicService) {
    let mut events = service.subscribe();

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                CatalogEvent::LoginStateChanged { state } => {
                    tracing::debug!(state = %state, "Login state changed");
                }
                CatalogEvent::NodeAttached { parent_id, entry } => {
                    tracing::debug!(
                        parent = ?parent_id,
                        id = %entry.id,
                        kind = %entry.kind,
                        name = %entry.name,
                        "Node attached"
                    );
                }
            }
        }
    });
}
