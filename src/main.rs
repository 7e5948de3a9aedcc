//! `sheet-json` server binary.
//!
//! ```bash
//! sheet-json --listen 0.0.0.0:8080
//! curl -F file=@book.xlsx 'http://localhost:8080/json?sheet=Data'
//!
//! # With debug logging
//! RUST_LOG=sheet_json=debug sheet-json
//! ```

use clap::Parser;
use tracing_subscriber::EnvFilter;

use sheet_json::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();
    sheet_json::server::serve(config).await
}
