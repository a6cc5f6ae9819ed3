//! API client module for the rides API

pub mod client;
mod estimate;

use anyhow::Result;
use std::time::Duration;

use crate::config::Paths;

pub use estimate::EstimateOptions;

/// Print one round-trip estimate
pub async fn estimate_once(paths: &Paths, opts: &EstimateOptions) -> Result<()> {
    estimate::estimate_once(paths, opts).await
}

/// Print a round-trip estimate every `interval` until Ctrl-C
pub async fn watch(paths: &Paths, opts: &EstimateOptions, interval: Duration) -> Result<()> {
    estimate::watch(paths, opts, interval).await
}

/// List known places
pub fn list_places(paths: &Paths) -> Result<()> {
    let places = match paths.app_config_optional()? {
        Some(app) => crate::places::Places::with_overrides(&app.places),
        None => crate::places::Places::default(),
    };

    println!();
    for (name, place) in places.iter() {
        println!("{:<12} {:>11.6} {:>12.6}", name, place.lat, place.lng);
    }
    Ok(())
}
