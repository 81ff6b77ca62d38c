pub mod config;
pub mod error;

pub use config::{ApiConfig, Config, RetrySettings, SearchConfig, StorageConfig, ValidationResult};
pub use error::{AppError, ConfigError, NetworkError, ReqwestErrorExt, StorageError};

use anyhow::Result;

/// Initialize logging for the client.
///
/// Honors `RUST_LOG`; defaults to `info`. Safe to call more than once, later
/// calls are ignored.
pub fn init() -> Result<()> {
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!("Skycast core initialized");
    }
    Ok(())
}
