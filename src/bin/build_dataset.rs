use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use log::{info, warn};
use orrery_engine::config::EngineConfig;
use orrery_engine::data::serialize_coordinate_set;
use orrery_engine::feed::feed::{validate_timestamp, CoordinateFeed, HttpCoordinateFeed};
use orrery_engine::transform::coordinates::place_catalog;
use serde::Serialize;
use tempfile::NamedTempFile;

const FEED_URL_ENV: &str = "ORRERY_FEED_URL";

#[derive(Debug, Serialize)]
struct DatasetMetadata {
    feed_url: String,
    requested_timestamp: String,
    bodies: usize,
    missing_bodies: Vec<String>,
    generated_at_epoch: u64,
}

fn main() -> Result<()> {
    env_logger::init();

    let timestamp = env::args()
        .nth(1)
        .ok_or_else(|| anyhow!("usage: build_dataset <ISO-8601 timestamp>"))?;
    validate_timestamp(&timestamp)?;
    let feed_url = env::var(FEED_URL_ENV).with_context(|| format!("{FEED_URL_ENV} is not set"))?;

    let config = EngineConfig::from_env().context("failed to load engine config")?;
    let catalog = config.catalog()?;

    info!("Fetching coordinates for {timestamp} from {feed_url}");
    let feed = HttpCoordinateFeed::new(feed_url.clone())?;
    let set = feed
        .fetch(&timestamp)
        .with_context(|| format!("failed to fetch coordinates for {timestamp}"))?;

    let placements = place_catalog(&catalog, &set);
    let missing_bodies: Vec<String> = placements
        .iter()
        .filter(|p| p.fallback)
        .map(|p| p.position.body_id.to_string())
        .collect();
    for id in &missing_bodies {
        warn!("Feed returned no usable coordinate for {id}");
    }

    let output_dir = PathBuf::from("data");
    fs::create_dir_all(&output_dir).context("failed to create data output directory")?;

    let dataset_path = output_dir.join("coordinates.bin");
    let bytes = serialize_coordinate_set(&set)?;
    write_atomically(&dataset_path, &bytes)
        .with_context(|| format!("failed to write dataset to {}", dataset_path.display()))?;

    let metadata = DatasetMetadata {
        feed_url,
        requested_timestamp: timestamp,
        bodies: set.coordinates.len(),
        missing_bodies,
        generated_at_epoch: current_epoch_seconds(),
    };
    let metadata_path = output_dir.join("coordinates.meta.json");
    let metadata_json = serde_json::to_vec_pretty(&metadata)?;
    write_atomically(&metadata_path, &metadata_json)
        .with_context(|| format!("failed to write metadata to {}", metadata_path.display()))?;

    info!(
        "Wrote coordinate bundle to {} ({} bodies, {} missing)",
        dataset_path.display(),
        metadata.bodies,
        metadata.missing_bodies.len()
    );

    Ok(())
}

/// Writes next to `path` and renames over it, so readers never see a
/// half-written bundle.
fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut file = NamedTempFile::new_in(dir)?;
    file.write_all(bytes)?;
    file.persist(path)?;
    Ok(())
}

fn current_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
