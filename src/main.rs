//! # Commutewatch Server Entry Point
//!
//! Loads the destination configuration, starts the polling engine, and
//! prints a summary of each consolidated batch as it arrives.

use commutewatch::{CycleBatch, Engine, EngineConfig, HttpTransport, PollRequest};
use std::path::PathBuf;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    println!("=================================================");
    println!("  Commutewatch - Travel-Time Polling Engine      ");
    println!("=================================================");
    println!();

    let config_path = std::env::var("COMMUTE_CONFIG")
        .unwrap_or_else(|_| "./config/destinations.json".to_string());
    let history_path = std::env::var("COMMUTE_HISTORY")
        .unwrap_or_else(|_| "./var/data/commute_history.json".to_string());

    println!("Loading destination configuration...");
    println!("  - Config: {}", config_path);
    println!("  - History: {}", history_path);

    let raw = std::fs::read_to_string(&config_path)?;
    let request: PollRequest = serde_json::from_str(&raw)?;
    println!("✓ {} destinations configured", request.destinations.len());

    let engine = match Engine::new(
        HttpTransport::new(),
        EngineConfig {
            history_path: PathBuf::from(history_path),
        },
    ) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("✗ Failed to initialize engine: {}", e);
            return Err(e.into());
        }
    };
    println!("✓ Engine initialized ({} routes in history)", engine.history().len());
    println!();

    let (trigger_tx, trigger_rx) = mpsc::channel(8);
    let (batch_tx, mut batches) = mpsc::channel(8);

    println!("Starting poll loop every {} ms...", request.poll_frequency);
    println!();
    let engine_task = tokio::spawn(engine.run(trigger_rx, batch_tx));
    trigger_tx.send(request).await?;

    while let Some(batch) = batches.recv().await {
        print_batch(&batch);
    }

    // Batch channel closed: the engine loop ended, surface its verdict
    engine_task.await??;

    println!("=================================================");
    println!("  Commutewatch Shut Down");
    println!("=================================================");

    Ok(())
}

fn print_batch(batch: &CycleBatch) {
    println!("Batch for instance {}:", batch.instance_id);
    for prediction in &batch.predictions {
        if prediction.error {
            println!(
                "  - {:<20} ERROR: {}",
                prediction.config.label,
                prediction.error_msg.as_deref().unwrap_or("unknown")
            );
        } else if let Some(route) = prediction.routes.first() {
            println!(
                "  - {:<20} {}s (traffic: {}s)",
                prediction.config.label,
                route.time,
                route.time_in_traffic.unwrap_or(route.time)
            );
        }
    }
}
