//! Maximum traffic computation module

pub mod cache;
pub mod engine;
pub mod batch;

use std::collections::HashMap;
use serde::{Serialize, Deserialize};
use crate::graph::City;

pub use batch::TrafficAnalyzer;
pub use cache::{PathTrafficCache, SharedPathTrafficCache, TrafficCache};
pub use engine::{TrafficEngine, TraversalStats};

/// Aggregate value carried along a direction of the tree. Sums wrap on overflow.
pub type Traffic = u64;

/// Per-root working set: memo of resolved aggregates and re-entrancy guard
pub type TrafficMap = HashMap<City, Traffic>;

/// One orientation of a road: the traffic on `city`'s side when `excluded` is
/// the direction not to recurse into. `None` marks a root with no parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CityPath {
    pub city: City,
    pub excluded: Option<City>,
}

impl CityPath {
    pub fn new(city: City, excluded: Option<City>) -> Self {
        Self { city, excluded }
    }

    /// Path used to resolve `city` as the root of the tree
    pub fn root(city: City) -> Self {
        Self { city, excluded: None }
    }
}

/// Maximum traffic computed for one city
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityTraffic {
    pub city: City,
    pub traffic: Traffic,
}

/// Results for every city, sorted ascending by city
pub type TrafficResult = Vec<CityTraffic>;
