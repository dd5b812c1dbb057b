//! todosync - terminal todo client.
//!
//! Restores or starts a session, then reads commands from stdin. Every
//! command is sent to the store and the view is printed once the remote
//! call and the refetch it triggers have settled.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use todosync::cli::Cli;
use todosync::view::{parse_command, HELP};
use todosync::{render, AppAction, AppEnvironment, AppReducer, AppState, Command};
use todosync_core::environment::SystemClock;
use todosync_runtime::Store;
use todosync_supabase::{SupabaseClient, SupabaseConfig};

type AppStore = Store<AppState, AppAction, AppEnvironment, AppReducer>;

/// Upper bound on one command's remote round trips
const SETTLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Graceful shutdown timeout
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine; the variables may come from the shell
    let dotenv = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(&cli);
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    let config = SupabaseConfig::from_env().context("Failed to load Supabase configuration")?;
    let client = Arc::new(SupabaseClient::new(config).context("Failed to build HTTP client")?);
    if let Some(token) = cli.access_token.clone() {
        client.restore_token(token).await;
    }
    let env = AppEnvironment::new(client.clone(), client, Arc::new(SystemClock));
    let store = Store::new(AppState::with_filter(cli.filter), AppReducer::new(), env);

    settle(&store, AppAction::RestoreSession).await?;
    if let Some(credentials) = cli.credentials() {
        settle(&store, AppAction::SignIn { credentials }).await?;
    }
    print_view(&store).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let view = store.state(AppState::view).await;
        match parse_command(&line, &view) {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Dispatch(action)) => {
                settle(&store, action).await?;
                print_view(&store).await;
            },
            Err(error) => println!("{error}"),
        }
    }

    if let Err(error) = store.shutdown(SHUTDOWN_TIMEOUT).await {
        warn!(%error, "Shutdown did not complete cleanly");
    }
    Ok(())
}

/// Send `action` and wait for everything it cascades into
async fn settle(store: &AppStore, action: AppAction) -> Result<()> {
    let mut handle = store.send(action).await.context("Store rejected the action")?;
    if let Err(error) = handle.wait_with_timeout(SETTLE_TIMEOUT).await {
        warn!(%error, "Remote call still running; showing the current view");
    }
    Ok(())
}

async fn print_view(store: &AppStore) {
    let rendered = store.state(render).await;
    print!("{rendered}");
}

/// Logs go to stderr so the rendered view on stdout stays clean
fn init_tracing(cli: &Cli) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| cli.log_directive().into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}
