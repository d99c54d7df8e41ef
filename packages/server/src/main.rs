#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Worm watch API server binary.
//!
//! ```text
//! worm_watch_server [--in-memory]
//! ```
//!
//! Everything else is read from the environment.

use clap::Parser;
use worm_watch_server::{ServerConfig, ServerError, StoreBackend, run_server};

#[derive(Parser)]
#[command(name = "worm_watch_server", about = "Serve the worm watch API")]
struct Args {
    /// Keep reports in memory instead of Postgres
    #[arg(long)]
    in_memory: bool,
}

impl Args {
    const fn backend(&self) -> StoreBackend {
        if self.in_memory {
            StoreBackend::InMemory
        } else {
            StoreBackend::Database
        }
    }
}

#[actix_web::main]
async fn main() -> Result<(), ServerError> {
    let args = Args::parse();
    pretty_env_logger::init_custom_env("RUST_LOG");

    run_server(ServerConfig::from_env(), args.backend()).await
}
