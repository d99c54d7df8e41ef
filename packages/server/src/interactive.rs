//! Interactive mode for the server.
//!
//! Prompts for bind address, port, and report store before starting the
//! server. Everything else comes from the environment.

use dialoguer::{Confirm, Input, Select};

use crate::{ServerConfig, ServerError, StoreBackend};

/// Runs the server in interactive mode, prompting for configuration.
///
/// # Errors
///
/// Returns [`ServerError`] if the server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> Result<(), ServerError> {
    println!("Worm Watch Server");
    println!();

    let mut config = ServerConfig::from_env();

    config.bind_addr = Input::new()
        .with_prompt("Bind address")
        .default(config.bind_addr.clone())
        .interact_text()
        .unwrap_or(config.bind_addr);

    config.port = Input::new()
        .with_prompt("Port")
        .default(config.port)
        .interact_text()
        .unwrap_or(config.port);

    let labels: Vec<String> = StoreBackend::ALL.iter().map(ToString::to_string).collect();
    let backend = Select::new()
        .with_prompt("Report store")
        .items(&labels)
        .default(0)
        .interact()
        .map_or_else(|_| StoreBackend::default(), |idx| StoreBackend::ALL[idx]);

    if config.admin_secret.is_none() {
        println!("ADMIN_SECRET is not set; admin deletes will be refused.");
    }

    if !Confirm::new()
        .with_prompt(format!(
            "Start server on {}:{} using {backend}?",
            config.bind_addr, config.port
        ))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(config, backend).await
}
