//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `geoip_csv` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use std::process;
use tokio::sync::broadcast::error::RecvError;

use geoip_csv::initialization::init_logger_with;
use geoip_csv::models::{
    BlockRow, CityBlock, CityLocation, CountryBlock, CountryLocation, EnterpriseBlock, IspRecord,
    NoIsp, TableRow,
};
use geoip_csv::{Cli, Command, GeoIpOptions, GeoIpService, RecordShape, RefreshEvent};

#[tokio::main]
async fn main() -> Result<()> {
    // MAXMIND_LICENSE_KEY may live in .env next to the working directory or the executable
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();
    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    let result = match load_options(&cli) {
        Ok(options) => match cli.shape {
            RecordShape::Country => run::<CountryBlock, CountryLocation, NoIsp>(&cli, options).await,
            RecordShape::City => run::<CityBlock, CityLocation, NoIsp>(&cli, options).await,
            RecordShape::Enterprise => {
                run::<EnterpriseBlock, CityLocation, IspRecord>(&cli, options).await
            }
        },
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("geoip_csv error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}

fn load_options(cli: &Cli) -> Result<GeoIpOptions> {
    let options = match &cli.config {
        Some(path) => GeoIpOptions::from_json_file(path)?,
        None => GeoIpOptions::default(),
    };
    Ok(cli.apply_to(options.with_env_license_key()))
}

async fn run<B, L, I>(cli: &Cli, mut options: GeoIpOptions) -> Result<()>
where
    B: BlockRow + Serialize,
    L: TableRow + Serialize,
    I: TableRow + Serialize,
{
    match &cli.command {
        Command::Lookup { addresses } => {
            options.auto_update = false;
            let service = GeoIpService::<B, L, I>::new(options)?;
            service.load().await.context("Failed to load GeoIP data")?;

            let mut failed = 0;
            for address in addresses {
                match service.lookup(address) {
                    Ok(Some(result)) => println!("{}", serde_json::to_string(&result)?),
                    Ok(None) => println!(
                        "{}",
                        serde_json::json!({ "address": address, "found": false })
                    ),
                    Err(e) => {
                        eprintln!("{}", e);
                        failed += 1;
                    }
                }
            }
            if failed > 0 {
                anyhow::bail!("{} of {} addresses were invalid", failed, addresses.len());
            }
        }
        Command::Update => {
            let service = GeoIpService::<B, L, I>::new(options)?;
            let outcome = service.update_files().await.context("Update failed")?;
            println!(
                "✅ Extracted {} file{} (sha256 {})",
                outcome.extracted.len(),
                if outcome.extracted.len() == 1 { "" } else { "s" },
                outcome.sha256
            );
            for path in &outcome.extracted {
                println!("  {}", path.display());
            }
        }
        Command::Watch => {
            options.auto_update = true;
            options.auto_load = true;
            let service = GeoIpService::<B, L, I>::new(options)?;
            let mut events = service.subscribe();
            service.start().await.context("Failed to start GeoIP service")?;

            let counts = service.store().counts();
            println!(
                "Watching for updates ({} blocks, {} locations, {} ISPs loaded). Press Ctrl-C to stop.",
                counts.blocks, counts.locations, counts.isps
            );

            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    event = events.recv() => match event {
                        Ok(RefreshEvent::Reloaded(counts)) => println!(
                            "🔄 Reloaded: {} blocks, {} locations, {} ISPs",
                            counts.blocks, counts.locations, counts.isps
                        ),
                        Ok(RefreshEvent::Failed(message)) => eprintln!("⚠️ {}", message),
                        Ok(RefreshEvent::Updated) => println!("⬇️ New source files extracted"),
                        Err(RecvError::Lagged(_)) => {}
                        Err(RecvError::Closed) => break,
                    },
                }
            }

            service.stop().await;
        }
    }
    Ok(())
}
