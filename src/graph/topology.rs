//! Structural checks for the tree precondition

use std::collections::HashSet;
use petgraph::algo::{connected_components, is_cyclic_undirected};
use petgraph::graphmap::UnGraphMap;
use crate::error::TrafficError;
use crate::graph::{City, CityMap};

/// Findings of a topology check over a CityMap
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyReport {
    /// Roads listed in one direction only, as (city, neighbour)
    pub asymmetric_roads: Vec<(City, City)>,

    /// Cities listing themselves as a neighbour
    pub self_loops: Vec<City>,

    /// Neighbours listed more than once by the same city, as (city, neighbour)
    pub duplicate_roads: Vec<(City, City)>,

    /// Neighbours that were never declared as cities, as (city, neighbour)
    pub dangling: Vec<(City, City)>,

    /// Whether the undirected graph contains a cycle
    pub has_cycle: bool,

    /// Number of connected components (isolated cities count as one each)
    pub components: usize,
}

impl TopologyReport {
    /// True when traffic values are well defined: acyclic, without repeated
    /// roads and fully declared
    pub fn is_tree_forest(&self) -> bool {
        !self.has_cycle && self.duplicate_roads.is_empty() && self.dangling.is_empty()
    }

    /// Human-readable list of problems, empty when nothing was found
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.has_cycle {
            problems.push("graph contains a cycle".to_string());
        }
        for &(city, neighbour) in &self.duplicate_roads {
            problems.push(format!("city {} lists neighbour {} more than once", city, neighbour));
        }
        for &(city, neighbour) in &self.dangling {
            problems.push(format!("city {} lists undeclared neighbour {}", city, neighbour));
        }
        for &(city, neighbour) in &self.asymmetric_roads {
            problems.push(format!("road {} -> {} has no reverse entry", city, neighbour));
        }
        for &city in &self.self_loops {
            problems.push(format!("city {} lists itself as a neighbour", city));
        }

        problems
    }
}

/// Inspect the city map for cycles, repeated and dangling neighbours,
/// asymmetric roads and self-loops
pub fn validate_tree(city_map: &CityMap) -> TopologyReport {
    let mut report = TopologyReport::default();
    let mut graph: UnGraphMap<City, ()> = UnGraphMap::with_capacity(
        city_map.city_count(),
        city_map.road_count() / 2,
    );

    for city in city_map.cities() {
        graph.add_node(city);
    }

    for city in city_map.cities() {
        let neighbours = match city_map.neighbours(city) {
            Ok(neighbours) => neighbours,
            Err(_) => continue,
        };

        let mut listed = HashSet::with_capacity(neighbours.len());
        for &neighbour in neighbours {
            // Self-loops are ignored by the engine, so keep them out of the cycle check
            if neighbour == city {
                if !report.self_loops.contains(&city) {
                    report.self_loops.push(city);
                }
                continue;
            }

            // The graphmap merges parallel edges, so a repeated road never shows up as a cycle
            if !listed.insert(neighbour) {
                if !report.duplicate_roads.contains(&(city, neighbour)) {
                    report.duplicate_roads.push((city, neighbour));
                }
                continue;
            }

            match city_map.neighbours(neighbour) {
                Ok(back) => {
                    if !back.contains(&city) {
                        report.asymmetric_roads.push((city, neighbour));
                    }
                }
                Err(_) => report.dangling.push((city, neighbour)),
            }

            graph.add_edge(city, neighbour, ());
        }
    }

    report.has_cycle = is_cyclic_undirected(&graph);
    report.components = connected_components(&graph);

    report
}

/// Validate the city map and either fail (strict) or log each problem as a warning
pub fn enforce_tree(city_map: &CityMap, strict: bool) -> Result<TopologyReport, TrafficError> {
    let report = validate_tree(city_map);
    let problems = report.problems();

    if strict && !report.is_tree_forest() {
        return Err(TrafficError::Topology(problems.join("; ")));
    }

    for problem in &problems {
        log::warn!("Topology: {}", problem);
    }

    log::debug!(
        "Topology check: {} cities in {} components",
        city_map.city_count(),
        report.components
    );

    Ok(report)
}
