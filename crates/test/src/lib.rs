#![allow(clippy::unwrap_used)]

mod context;
pub use context::{TestContext, DOMAIN, INVALID_VALUE};

mod fixtures;
pub use fixtures::*;

mod mocks;
pub use mocks::{InMemoryStorage, RecordingNetwork, RecordingTimer};

pub use qbft_signing_ed25519::{Ed25519, Ed25519Provider, PrivateKey, PublicKey, Signature};

/// Install a tracing subscriber honouring `RUST_LOG`, once per test binary.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
