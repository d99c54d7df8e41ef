#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for worm watch.
//!
//! ```text
//! worm_watch serve [--in-memory]
//! worm_watch reports [--limit 20] [--heatmap]
//! worm_watch stats
//! worm_watch submit <lat> <lng> <intensity> [--notes "..."]
//! worm_watch purge [--since <rfc3339>] [--lat-min ..] [--lat-max ..] [--lng-min ..] [--lng-max ..]
//! ```
//!
//! Running with no subcommand starts the server interactively.

mod display;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use dialoguer::Confirm;
use worm_watch_client::{ApiClient, DEFAULT_API_URL, to_heatmap_points};
use worm_watch_server::{ServerConfig, StoreBackend};
use worm_watch_server_models::{ApiDeleteParams, ApiNewReport};

#[derive(Parser)]
#[command(name = "worm_watch", about = "Report and track worm sightings")]
struct Cli {
    /// Base URL of the API for client commands
    #[arg(long, global = true, env = "WORM_WATCH_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Keep reports in memory instead of Postgres
        #[arg(long)]
        in_memory: bool,
    },
    /// List active reports, newest first
    Reports {
        /// Maximum number of reports to show
        #[arg(long)]
        limit: Option<usize>,
        /// Print heatmap points as JSON instead of a table
        #[arg(long)]
        heatmap: bool,
    },
    /// Show the stats snapshot and season status
    Stats,
    /// Submit a sighting
    Submit {
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
        /// Intensity from 1 (stragglers) to 5 (plague)
        intensity: f64,
        /// Optional notes, at most 500 characters
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete reports matching the given filters (all reports if none)
    Purge {
        /// Shared admin secret
        #[arg(long, env = "ADMIN_SECRET", hide_env_values = true)]
        secret: String,
        /// Only reports created at or after this RFC 3339 time
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        #[arg(long, allow_negative_numbers = true)]
        lat_min: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lat_max: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lng_min: Option<f64>,
        #[arg(long, allow_negative_numbers = true)]
        lng_max: Option<f64>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        // The server uses actix-web's runtime, so it runs in a blocking
        // task to avoid nesting tokio runtimes.
        tokio::task::spawn_blocking(|| {
            actix_web::rt::System::new().block_on(worm_watch_server::interactive::run())
        })
        .await??;
        return Ok(());
    };

    if let Commands::Serve { in_memory } = command {
        let backend = if in_memory {
            StoreBackend::InMemory
        } else {
            StoreBackend::Database
        };
        tokio::task::spawn_blocking(move || {
            actix_web::rt::System::new()
                .block_on(worm_watch_server::run_server(ServerConfig::from_env(), backend))
        })
        .await??;
        return Ok(());
    }

    let client = ApiClient::new(&cli.api_url)?;
    log::debug!("Using API at {}", client.base_url());

    match command {
        Commands::Serve { .. } => {}
        Commands::Reports { limit, heatmap } => {
            let mut reports = client.get_reports().await?;
            if let Some(limit) = limit {
                reports.truncate(limit);
            }

            if heatmap {
                let points = to_heatmap_points(&reports);
                println!("{}", serde_json::to_string_pretty(&points)?);
                return Ok(());
            }

            if reports.is_empty() {
                println!("No active reports.");
                return Ok(());
            }

            println!("{:<20} {:<18} {:<30} NOTES", "REPORTED", "INTENSITY", "NEAR");
            println!("{}", "-".repeat(100));
            for report in &reports {
                println!("{}", display::report_line(report));
            }
            println!("\n{} active report(s)", reports.len());
        }
        Commands::Stats => {
            let stats = client.get_stats().await?;
            print!("{}", display::stats_summary(&stats, Utc::now()));
        }
        Commands::Submit {
            lat,
            lng,
            intensity,
            notes,
        } => {
            let created = client
                .submit_report(&ApiNewReport {
                    lat: Some(lat),
                    lng: Some(lng),
                    intensity: Some(intensity),
                    notes,
                })
                .await?;
            let area = worm_watch_neighborhood::nearest(lat, lng)
                .map_or("Winnipeg", |n| n.name.as_str());
            println!(
                "Report {} recorded near {area} at {}",
                created.id,
                created.created_at.format("%Y-%m-%d %H:%M UTC")
            );
        }
        Commands::Purge {
            secret,
            since,
            lat_min,
            lat_max,
            lng_min,
            lng_max,
            yes,
        } => {
            let filter = ApiDeleteParams {
                since,
                lat_min,
                lat_max,
                lng_min,
                lng_max,
            };

            if filter == ApiDeleteParams::default() && !yes {
                let confirmed = Confirm::new()
                    .with_prompt("No filters given. Delete EVERY report?")
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let result = client.delete_reports(&secret, &filter).await?;
            println!("{}", result.message);
        }
    }

    Ok(())
}
