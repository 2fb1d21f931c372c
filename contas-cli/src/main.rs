//! Terminal front end for Contas.
//!
//! Builds the application state against the hosted backend (or an in-memory one
//! with `--demo`), signs in, mounts the accounts screen and reads commands from
//! stdin. Logs go to stderr.

mod repl;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use contas_app::config::AppConfig;
use contas_app::{AppState, AppStateBuilder};
use contas_backend::{AuthUser, InMemoryBackend, RestClient};
use contas_core::types::NewBankAccount;

const DEMO_EMAIL: &str = "demo@contas.local";
const DEMO_PASSWORD: &str = "demo";

#[derive(Debug, Parser)]
#[command(name = "contas", version, about = "Manage your bank accounts")]
struct Args {
    /// Config file (default: <config dir>/contas/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Use an in-memory backend with sample data instead of the hosted one
    #[arg(long)]
    demo: bool,

    /// Sign in with this email on start
    #[arg(long, env = "CONTAS_EMAIL")]
    email: Option<String>,

    #[arg(long, env = "CONTAS_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .without_time()
                .with_ansi(false),
        )
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()))
        .init();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let state = if args.demo {
        demo_state().await?
    } else {
        let state = remote_state(args.config.as_deref())?;
        if let (Some(email), Some(password)) = (&args.email, &args.password) {
            let user = state
                .auth_service
                .sign_in(email, password)
                .await
                .context("Sign-in failed")?;
            tracing::info!("Signed in as {}", user.id);
        }
        state
    };

    check_session(&state).await;

    let screen = state.accounts_screen();
    screen.mount().await;
    let result = repl::run(&state, &screen).await;
    screen.dispose();
    result
}

/// Confirm the stored session with the backend before showing any accounts.
///
/// A rejected or expired session is dropped; a transport failure keeps it.
async fn check_session(state: &AppState) -> Option<AuthUser> {
    if !state.session.is_signed_in() {
        return None;
    }
    match state.auth_service.verify_session().await {
        Ok(Some(user)) => Some(user),
        Ok(None) => {
            tracing::warn!("Stored session is no longer valid, sign in again");
            None
        }
        Err(e) => {
            tracing::warn!("Could not verify session: {e}");
            state.session.current_user()
        }
    }
}

fn remote_state(config_path: Option<&Path>) -> Result<AppState> {
    let config = AppConfig::load(config_path).context("Failed to load configuration")?;
    let client =
        RestClient::new(config.rest_client_config()).context("Failed to create backend client")?;
    tracing::info!("Using backend at {}", config.backend_url);

    Ok(AppStateBuilder::new().backend(Arc::new(client)).build()?)
}

/// In-memory backend with a signed-in demo user owning two accounts.
async fn demo_state() -> Result<AppState> {
    let backend = Arc::new(InMemoryBackend::new());
    backend.register_user(DEMO_EMAIL, DEMO_PASSWORD).await;

    let state = AppStateBuilder::new().backend(backend).build()?;
    let user = state.auth_service.sign_in(DEMO_EMAIL, DEMO_PASSWORD).await?;

    let samples = [
        (1, 1, 1234, "Conta Corrente", "12345-6"),
        (2, 341, 42, "Poupança", "98765-4"),
    ];
    for (code, bank, branch, description, number) in samples {
        state
            .account_repository
            .create(NewBankAccount {
                account_bank_code: code,
                owner_id: user.id.clone(),
                bank_code: bank,
                branch_code: branch,
                description: description.to_string(),
                account_number: number.to_string(),
            })
            .await?;
    }
    tracing::info!("Demo mode: signed in as {DEMO_EMAIL}");
    Ok(state)
}
