//! City map construction from textual descriptions

use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use crate::error::TrafficError;
use crate::graph::{City, CityMap};

/// Builder for incrementally constructing a CityMap from description lines.
///
/// Each description has the form `id:[n1,n2,...]` or `id:[]`. The line declares
/// `id` and appends the listed neighbours to it in order.
pub struct CityMapBuilder {
    /// Map under construction
    city_map: CityMap,

    /// Number of descriptions consumed so far, used for error positions
    line_count: usize,
}

impl CityMapBuilder {
    /// Create a builder whose map rejects (or accepts) the reserved id 0
    pub fn new(reserve_zero_id: bool) -> Self {
        Self::with_capacity(0, reserve_zero_id)
    }

    /// Create a builder with the given capacity
    pub fn with_capacity(capacity: usize, reserve_zero_id: bool) -> Self {
        Self {
            city_map: CityMap::with_capacity(capacity, reserve_zero_id),
            line_count: 0,
        }
    }

    /// Parse one description and add it to the map
    pub fn add_description(&mut self, description: &str) -> Result<(), TrafficError> {
        self.line_count += 1;
        let line = self.line_count;

        let (city, neighbours) = parse_description(description, line)?;

        self.city_map.add_city(city)?;
        for neighbour in neighbours {
            self.city_map.add_road(city, neighbour)?;
        }

        Ok(())
    }

    /// Finish and return the city map
    pub fn build(self) -> CityMap {
        log::debug!(
            "Built city map with {} cities and {} roads from {} descriptions",
            self.city_map.city_count(),
            self.city_map.road_count(),
            self.line_count
        );
        self.city_map
    }
}

/// Split `id:[n1,...]` into the city and its neighbour list
fn parse_description(description: &str, line: usize) -> Result<(City, Vec<City>), TrafficError> {
    let parse_error = |reason: String| TrafficError::Parse { line, reason };

    let (city, rest) = description
        .split_once(':')
        .ok_or_else(|| parse_error(format!("missing ':' in {:?}", description)))?;

    let city = parse_city(city, line)?;

    let rest = rest.trim();
    let inner = rest
        .strip_prefix('[')
        .and_then(|r| r.strip_suffix(']'))
        .ok_or_else(|| parse_error(format!("neighbour list must be enclosed in [] in {:?}", description)))?;

    if inner.trim().is_empty() {
        return Ok((city, Vec::new()));
    }

    let neighbours = inner
        .split(',')
        .map(|token| parse_city(token, line))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((city, neighbours))
}

fn parse_city(token: &str, line: usize) -> Result<City, TrafficError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(TrafficError::Parse {
            line,
            reason: "empty city id".to_string(),
        });
    }

    token.parse::<City>().map_err(|e| TrafficError::Parse {
        line,
        reason: format!("invalid city id {:?}: {}", token, e),
    })
}

/// Build a city map from a sequence of description lines
pub fn parse_descriptions<I, S>(descriptions: I, reserve_zero_id: bool) -> Result<CityMap, TrafficError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut builder = CityMapBuilder::new(reserve_zero_id);
    for description in descriptions {
        builder.add_description(description.as_ref())?;
    }

    Ok(builder.build())
}

/// Load a city map from a file with one description per line.
///
/// Blank lines and lines starting with `#` are skipped.
pub fn parse_description_file(path: &Path, reserve_zero_id: bool) -> Result<CityMap> {
    log::info!("Reading city descriptions: {}", path.display());

    if !path.exists() {
        return Err(anyhow::anyhow!("File not found: {}", path.display()));
    }

    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let descriptions = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'));

    let city_map = parse_descriptions(descriptions, reserve_zero_id)?;

    log::info!(
        "Loaded city map with {} cities and {} roads",
        city_map.city_count(),
        city_map.road_count()
    );

    Ok(city_map)
}
