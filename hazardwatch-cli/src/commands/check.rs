//! `hazardwatch check` - one-shot zone evaluation for a position.

use std::path::PathBuf;

use clap::Args;

use hazardwatch::coord::Position;
use hazardwatch::zone::{select_highest_priority, zone_contains};

use crate::commands::load_zones;
use crate::error::CliError;

/// Arguments for the check command.
#[derive(Debug, Args)]
pub struct CheckArgs {
    /// Path to the zone snapshot (JSON array of zones)
    #[arg(long)]
    pub zones: PathBuf,

    /// Latitude of the position to evaluate, in degrees
    #[arg(long)]
    pub lat: f64,

    /// Longitude of the position to evaluate, in degrees
    #[arg(long)]
    pub lon: f64,
}

/// Evaluate a single position against a zone snapshot and print the
/// winning zone, if any.
pub fn run(args: CheckArgs) -> Result<(), CliError> {
    let position = Position::new(args.lat, args.lon);
    if !position.is_valid() {
        return Err(CliError::Input(format!(
            "position {} is outside valid coordinate ranges",
            position
        )));
    }

    let zones = load_zones(&args.zones)?;

    let containing: Vec<_> = zones
        .iter()
        .filter(|zone| zone_contains(&position, zone))
        .collect();

    if containing.is_empty() {
        println!("Position {} is not inside any zone", position);
        return Ok(());
    }

    println!("Position {} is inside {} zone(s):", position, containing.len());
    for zone in &containing {
        println!("  {} (alert level {})", zone.label(), zone.alert_level);
    }

    if let Some(winner) = select_highest_priority(&position, &zones) {
        println!(
            "Selected: {} (alert level {})",
            winner.label(),
            winner.alert_level
        );
    }

    Ok(())
}
