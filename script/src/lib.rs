//! Operator tooling for the shielded pool: environment config, the JSON
//! state file and the on-chain verifier oracle.

pub mod config;
pub mod onchain;
pub mod state;

pub use config::CliConfig;
pub use onchain::OnchainVerifier;
pub use state::{CliPool, StateFile};

/// Install the `RUST_LOG`-driven subscriber, defaulting to `info`. Logs go to
/// stderr so command output on stdout stays parseable.
pub fn setup_logger() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
