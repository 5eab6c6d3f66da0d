//! CLI probe over `placemark_core`.
//!
//! # Responsibility
//! - Verify core crate linkage (`ping`, version).
//! - Inspect a marked-places database: list saved places and, given a
//!   position, which of them fall within the search radius.

use clap::Parser;
use placemark_core::db::open_db;
use placemark_core::{
    Coordinate, CoreConfig, FixedLocationProvider, SpatialStore, SqliteMarkedPlaceRepository,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None, allow_negative_numbers = true)]
struct Cli {
    /// Marked-places database to inspect
    db_path: Option<PathBuf>,
    /// Latitude of the reference position
    #[arg(requires = "lon")]
    lat: Option<f64>,
    /// Longitude of the reference position
    #[arg(requires = "lat")]
    lon: Option<f64>,
    /// Search radius in meters (default from config)
    #[arg(requires = "lon")]
    radius_m: Option<f64>,
    /// Absolute directory for rolling log files
    #[arg(long, env = "PLACEMARK_LOG_DIR")]
    log_dir: Option<String>,
    /// trace|debug|info|warn|error
    #[arg(long, env = "PLACEMARK_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn position(&self) -> Option<Coordinate> {
        Some(Coordinate::new(self.lat?, self.lon?))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    println!("placemark_core ping={}", placemark_core::ping());
    println!("placemark_core version={}", placemark_core::core_version());

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or_else(|| placemark_core::default_log_level());
        if let Err(err) = placemark_core::init_logging(level, log_dir) {
            eprintln!("warning: {err}");
        }
    }

    let Some(db_path) = cli.db_path.as_ref() else {
        return ExitCode::SUCCESS;
    };

    match inspect(db_path, &cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

async fn inspect(db_path: &Path, cli: &Cli) -> Result<(), String> {
    let mut config = CoreConfig::default();
    if let Some(radius_m) = cli.radius_m {
        config.default_search_radius_m = radius_m;
    }
    config.validate().map_err(|err| err.to_string())?;

    let position = cli.position();
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = SqliteMarkedPlaceRepository::try_new(&conn).map_err(|err| err.to_string())?;
    let origin = position.unwrap_or(Coordinate::new(0.0, 0.0));
    let store = SpatialStore::new(repo, FixedLocationProvider::new(origin), config)
        .map_err(|err| err.to_string())?;

    let saved_count = store.hydrate().map_err(|err| err.to_string())?;
    println!("saved_count={saved_count}");
    for place in store.saved_places() {
        println!(
            "saved id={} name={:?} lat={:.6} lon={:.6} address={:?}",
            place.id,
            place.name,
            place.latitude,
            place.longitude,
            place.address.as_deref().unwrap_or("")
        );
    }

    if position.is_none() {
        return Ok(());
    }
    if !store.refresh_user_location().await {
        return Err("location fix failed".to_string());
    }

    let settled = store.settled().await;
    println!(
        "visible_count={} radius_m={}",
        settled.visible_places.len(),
        settled.search_radius_m
    );
    for place in &settled.visible_places {
        let meters = placemark_core::distance(origin, place.coordinate());
        println!("visible id={} distance_m={:.0}", place.id, meters);
    }
    Ok(())
}
