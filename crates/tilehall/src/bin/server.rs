//! `tilehall-server`: runs a Tilehall server.
//!
//! ```text
//! tilehall-server [BIND_ADDR]
//! ```
//!
//! The bind address comes from the first argument, then `TILEHALL_BIND`,
//! then the default `127.0.0.1:8080`. Log filtering follows `RUST_LOG`
//! (default `info`).

use tilehall::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), TilehallError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let bind = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("TILEHALL_BIND").ok())
        .unwrap_or_else(|| ServerConfig::default().bind_addr);

    let server = TilehallServer::builder().bind(&bind).build().await?;
    match server.local_addr() {
        Ok(addr) => tracing::info!(%addr, "listening"),
        Err(e) => tracing::warn!(error = %e, "bound, but local address unavailable"),
    }

    server.run().await
}
