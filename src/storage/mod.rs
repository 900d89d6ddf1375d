//! Result serialization and persistence module

use anyhow::Result;
use itertools::Itertools;
use crate::graph::CityMap;
use crate::traffic::{TrafficResult, TraversalStats};
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use serde_json::{json, to_string_pretty};

/// Render results as `city:traffic` pairs joined by commas
pub fn serialize_traffic_result(traffic_result: &TrafficResult) -> String {
    traffic_result
        .iter()
        .map(|entry| format!("{}:{}", entry.city, entry.traffic))
        .join(",")
}

/// Save traffic results and a run summary to the specified directory
pub fn save_results(
    traffic_result: &TrafficResult,
    city_map: &CityMap,
    stats: TraversalStats,
    output_dir: &Path,
) -> Result<()> {
    log::info!("Saving traffic for {} cities to {}", traffic_result.len(), output_dir.display());

    // Ensure output directory exists
    fs::create_dir_all(output_dir)?;

    save_traffic(traffic_result, output_dir)?;
    save_summary(traffic_result, city_map, stats, output_dir)?;

    log::info!("Results saved successfully");

    Ok(())
}

/// Save per-city traffic as a JSON array
fn save_traffic(traffic_result: &TrafficResult, output_dir: &Path) -> Result<()> {
    let path = output_dir.join("traffic.json");
    let mut file = File::create(path)?;

    file.write_all(to_string_pretty(traffic_result)?.as_bytes())?;

    Ok(())
}

/// Save summary information
fn save_summary(
    traffic_result: &TrafficResult,
    city_map: &CityMap,
    stats: TraversalStats,
    output_dir: &Path,
) -> Result<()> {
    log::info!("Saving summary information");

    let path = output_dir.join("summary.json");
    let mut file = File::create(path)?;

    let busiest = traffic_result.iter().max_by_key(|entry| entry.traffic);

    let summary = json!({
        "graph_stats": {
            "city_count": city_map.city_count(),
            "road_count": city_map.road_count(),
        },
        "traffic_stats": {
            "max_traffic": busiest.map_or(0, |entry| entry.traffic),
            "busiest_city": busiest.map(|entry| entry.city),
            "isolated_cities": traffic_result.iter().filter(|entry| entry.traffic == 0).count(),
        },
        "cache_stats": {
            "resolved_paths": stats.resolved,
            "cache_hits": stats.cache_hits,
        }
    });

    file.write_all(to_string_pretty(&summary)?.as_bytes())?;

    Ok(())
}
