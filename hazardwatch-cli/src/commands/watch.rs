//! `hazardwatch watch` - run the engine against a position stream.
//!
//! Reads `lat lon` pairs from stdin (one per line), feeds them into the
//! engine and prints danger state transitions as they happen. The zone
//! snapshot is reloaded from disk whenever the movement gate requests a
//! refresh, so edits to the zone file are picked up as the receiver
//! moves. Ctrl-C or end of input shuts the engine down.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use hazardwatch::coord::Position;
use hazardwatch::engine::{EngineConfig, HazardEngine, DEFAULT_DWELL_MS};
use hazardwatch::refresh::{HazardRefresher, DEFAULT_REFRESH_DISTANCE_M};

use crate::commands::load_zones;
use crate::error::CliError;

/// Arguments for the watch command.
#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Path to the zone snapshot (JSON array of zones)
    #[arg(long)]
    pub zones: PathBuf,

    /// Dwell threshold before a zone entry is confirmed, in milliseconds
    #[arg(long, default_value_t = DEFAULT_DWELL_MS)]
    pub dwell_ms: u64,

    /// Movement distance that triggers a zone snapshot reload, in meters
    #[arg(long, default_value_t = DEFAULT_REFRESH_DISTANCE_M)]
    pub refresh_distance_m: f64,
}

/// Refresher that signals the watch loop to reload the zone file.
struct ReloadSignal {
    tx: mpsc::UnboundedSender<()>,
}

impl HazardRefresher for ReloadSignal {
    fn request_refresh(&self) {
        let _ = self.tx.send(());
    }
}

/// Run the engine against stdin positions until Ctrl-C or end of input.
pub async fn run(args: WatchArgs) -> Result<(), CliError> {
    if args.dwell_ms == 0 {
        return Err(CliError::Input("dwell must be greater than zero".to_string()));
    }

    let config = EngineConfig::default()
        .with_dwell(Duration::from_millis(args.dwell_ms))
        .with_refresh_distance_m(args.refresh_distance_m);

    let (reload_tx, mut reload_rx) = mpsc::unbounded_channel();
    let refresher = Arc::new(ReloadSignal { tx: reload_tx });

    let token = CancellationToken::new();
    let (handle, engine_task) = HazardEngine::spawn(config, refresher, token.clone())
        .map_err(|e| CliError::Config(e.to_string()))?;

    handle.replace_zones(load_zones(&args.zones)?);

    // Print state transitions as they are broadcast
    let mut updates = handle.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(state) = updates.recv().await {
            if state.is_active {
                match state.activating_zone_id() {
                    Some(zone_id) => println!("DANGER ACTIVE (zone {})", zone_id),
                    None => println!("DANGER ACTIVE (manual)"),
                }
            } else {
                println!("danger inactive");
            }
        }
    });

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, shutting down");
                break;
            }

            _ = reload_rx.recv() => {
                match load_zones(&args.zones) {
                    Ok(zones) => {
                        info!(count = zones.len(), "Zone snapshot reloaded");
                        handle.replace_zones(zones);
                    }
                    // A broken file keeps the previous snapshot in place
                    Err(e) => warn!(error = %e, "Zone reload failed"),
                }
            }

            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if let Some(position) = parse_position(&line) {
                            handle.update_position(position);
                        } else if !line.trim().is_empty() {
                            warn!(line = %line, "Skipping unparsable position line");
                        }
                    }
                    None => {
                        info!("End of position input, shutting down");
                        break;
                    }
                }
            }
        }
    }

    token.cancel();
    let _ = engine_task.await;
    printer.abort();

    Ok(())
}

/// Parse a `lat lon` line; comma separators are tolerated.
fn parse_position(line: &str) -> Option<Position> {
    let mut parts = line.trim().split([' ', '\t', ',']).filter(|p| !p.is_empty());
    let lat: f64 = parts.next()?.parse().ok()?;
    let lon: f64 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Position::new(lat, lon))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_space_separated() {
        let p = parse_position("53.5 10.0").unwrap();
        assert_eq!(p, Position::new(53.5, 10.0));
    }

    #[test]
    fn test_parse_comma_separated() {
        let p = parse_position("53.5, 10.0").unwrap();
        assert_eq!(p, Position::new(53.5, 10.0));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_position("").is_none());
        assert!(parse_position("north by northwest").is_none());
        assert!(parse_position("53.5").is_none());
        assert!(parse_position("53.5 10.0 99.0").is_none());
    }
}
