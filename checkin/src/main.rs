//! Interactive check-in shell.
//!
//! Drives the check-in store from stdin, one command per line. Type `help`
//! for the command list.
//!
//! # Usage
//!
//! ```bash
//! CHECKIN_API_URL=https://events.example.com/api/v1 \
//! RUST_LOG=checkin_app=debug \
//!   cargo run --bin checkin
//! ```

use anyhow::Context;
use checkin_api::CheckinClient;
use checkin_app::shell::{self, Command};
use checkin_app::{
    CheckinConfig, CheckinEnvironment, CheckinReducer, CheckinState, FileSecureStorage,
    SessionAction,
};
use checkin_runtime::Store;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = CheckinConfig::from_env().context("invalid configuration")?;
    tracing::info!(api_url = %config.api_url, storage = %config.storage_dir.display(), "Starting check-in shell");

    let client = CheckinClient::new(&config.api_url, config.http_timeout)
        .context("failed to build HTTP client")?;
    let storage = FileSecureStorage::new(&config.storage_dir);
    let env = CheckinEnvironment::new(client, storage);
    let store = Store::new(
        CheckinState::default(),
        CheckinReducer::new(config.scan),
        env,
    );

    // Requests and the re-arm timer both settle within this bound
    let settle = config.http_timeout + config.scan.cooldown + Duration::from_secs(1);

    let mut handle = store.send(SessionAction::Restore.into()).await?;
    let _ = handle.wait_with_timeout(settle).await;
    print!("{}", store.state(shell::render).await);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(error) => {
                eprintln!("{error}");
                continue;
            },
        };

        match command {
            Command::Quit => break,
            Command::Help => {
                println!("{}", shell::HELP);
                continue;
            },
            _ => {},
        }

        for action in command.into_actions() {
            let mut handle = store.send(action).await?;
            if handle.wait_with_timeout(settle).await.is_err() {
                tracing::warn!("Effects still running after {settle:?}");
            }
        }
        print!("{}", store.state(shell::render).await);
    }

    store
        .shutdown(Duration::from_secs(5))
        .await
        .context("shutdown did not finish")?;
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "checkin=info,checkin_app=info,checkin_runtime=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
