mod orchestrator;
mod session;
mod terminal;

use crate::orchestrator::{Orchestrator, OrchestratorConfig};
use profilescope_client::{DEFAULT_BASE_URL, DirectoryClient};
use profilescope_common::{
    present::profile::DateLocale,
    util::{NonPositiveDurationError, PositiveDuration},
};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Error)]
enum InitError {
    #[error("Error parsing .env file: {0}")]
    Dotenv(#[from] dotenvy::Error),
    #[error("Error parsing environment: {0}")]
    Envy(#[from] envy::Error),
    #[error("Invalid suggestion delay: {0}")]
    Delay(#[from] NonPositiveDurationError),
    #[error("Error driving the terminal: {0}")]
    Terminal(std::io::Error),
    #[error("Search orchestrator stopped abnormally: {0}")]
    Orchestrator(#[from] tokio::task::JoinError),
}

fn default_directory_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_debounce_ms() -> u64 {
    300
}

fn default_hide_delay_ms() -> u64 {
    200
}

#[derive(Clone, Eq, PartialEq, Debug, Hash, Deserialize)]
struct Env {
    #[serde(default = "default_directory_base_url")]
    directory_base_url: String,
    #[serde(default = "default_debounce_ms")]
    suggestion_debounce_ms: u64,
    #[serde(default = "default_hide_delay_ms")]
    suggestion_hide_delay_ms: u64,
    #[serde(default)]
    date_locale: DateLocale,
}

impl Env {
    fn orchestrator_config(&self) -> Result<OrchestratorConfig, InitError> {
        Ok(OrchestratorConfig {
            debounce: PositiveDuration::from_millis(self.suggestion_debounce_ms)?.to_std(),
            hide_delay: PositiveDuration::from_millis(self.suggestion_hide_delay_ms)?.to_std(),
        })
    }
}

fn install_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "profilescope_app=info,profilescope_client=info".into()),
        )
        // stdout belongs to the rendered page
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn get_env() -> Result<Env, InitError> {
    if let Err(e) = dotenvy::dotenv() {
        if e.not_found() {
            debug!("No .dotenv file found");
        } else {
            return Err(e.into());
        }
    }

    envy::from_env().map_err(InitError::from)
}

#[tokio::main]
async fn main() -> Result<(), InitError> {
    install_tracing();
    let env = get_env()?;
    let config = env.orchestrator_config()?;

    info!(
        base_url = %env.directory_base_url,
        debounce = ?config.debounce,
        hide_delay = ?config.hide_delay,
        "Starting"
    );

    let directory = Arc::new(DirectoryClient::new(&env.directory_base_url));
    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted");
                shutdown.cancel();
            }
        }
    });

    let mut spawned = Orchestrator::spawn(directory, config, shutdown.clone());
    terminal::run(&mut spawned, env.date_locale, &shutdown)
        .await
        .map_err(InitError::Terminal)?;
    spawned.task.await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::{Env, InitError};
    use profilescope_common::present::profile::DateLocale;
    use std::time::Duration;

    fn parse(vars: &[(&str, &str)]) -> Result<Env, envy::Error> {
        envy::from_iter(
            vars.iter()
                .map(|&(key, value)| (key.to_owned(), value.to_owned())),
        )
    }

    #[test]
    fn defaults_apply() {
        let env = parse(&[]).unwrap();
        assert_eq!(env.directory_base_url, "https://dummyjson.com");
        assert_eq!(env.date_locale, DateLocale::Spanish);

        let config = env.orchestrator_config().unwrap();
        assert_eq!(config.debounce, Duration::from_millis(300));
        assert_eq!(config.hide_delay, Duration::from_millis(200));
    }

    #[test]
    fn overrides_apply() {
        let env = parse(&[
            ("DIRECTORY_BASE_URL", "http://localhost:8080"),
            ("SUGGESTION_DEBOUNCE_MS", "50"),
            ("DATE_LOCALE", "en"),
        ])
        .unwrap();

        assert_eq!(env.directory_base_url, "http://localhost:8080");
        assert_eq!(env.date_locale, DateLocale::English);
        assert_eq!(
            env.orchestrator_config().unwrap().debounce,
            Duration::from_millis(50)
        );
    }

    #[test]
    fn zero_delay_is_rejected() {
        let env = parse(&[("SUGGESTION_HIDE_DELAY_MS", "0")]).unwrap();
        assert!(matches!(
            env.orchestrator_config(),
            Err(InitError::Delay(_))
        ));
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse(&[("SUGGESTION_DEBOUNCE_MS", "soon")]).is_err());
        assert!(parse(&[("DATE_LOCALE", "fr")]).is_err());
    }
}
