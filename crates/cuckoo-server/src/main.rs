//! Server bootstrap.
//!
//! Configuration comes from the environment:
//!
//! - `CUCKOO_ADDR` — bind address (default `0.0.0.0:8080`)
//! - `RUST_LOG` — tracing filter (default `info`)

use cuckoo_server::CuckooServerBuilder;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let addr = std::env::var("CUCKOO_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    tracing::info!(%addr, "starting Cuckoo server");

    let server = CuckooServerBuilder::new().bind(&addr).build().await?;
    server.run().await?;
    Ok(())
}
