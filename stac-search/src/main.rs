//! Entry point for the STAC search adapter.
//!
//! Initializes configuration and dependencies, then waits for shutdown.
//! The web-service layer that exposes these components over HTTP lives
//! outside this workspace and embeds [`Dependencies`] directly.

use tracing::info;

use stac_search::{init_tracing, AdapterError, Dependencies};

#[tokio::main]
async fn main() -> Result<(), AdapterError> {
    dotenv::dotenv().ok();
    init_tracing();

    let _dependencies = Dependencies::new()?;
    info!("STAC search adapter started");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");
    Ok(())
}
