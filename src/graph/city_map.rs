//! Adjacency storage for the city graph

use std::collections::HashMap;
use crate::error::TrafficError;
use crate::graph::City;

/// Identifier reserved by the reference input format to mean "no parent"
pub const RESERVED_CITY: City = 0;

/// Undirected city graph stored as ordered neighbour lists.
///
/// Neighbour order is insertion order and decides ties during max-selection.
/// Symmetry is the caller's responsibility: `add_road(a, b)` only records `b`
/// as a neighbour of `a`.
#[derive(Debug, Clone)]
pub struct CityMap {
    /// Neighbour list per city
    neighbourhoods: HashMap<City, Vec<City>>,

    /// Cities in declaration order, so batch iteration is reproducible
    order: Vec<City>,

    /// Identifier rejected by `add_city`, if any
    reserved: Option<City>,
}

impl Default for CityMap {
    fn default() -> Self {
        Self::new()
    }
}

impl CityMap {
    /// Create an empty map that rejects the reserved id 0
    pub fn new() -> Self {
        Self {
            neighbourhoods: HashMap::new(),
            order: Vec::new(),
            reserved: Some(RESERVED_CITY),
        }
    }

    /// Create an empty map that accepts every id, including 0
    pub fn unrestricted() -> Self {
        Self {
            reserved: None,
            ..Self::new()
        }
    }

    /// Create a map with pre-allocated capacity
    pub fn with_capacity(capacity: usize, reserve_zero_id: bool) -> Self {
        Self {
            neighbourhoods: HashMap::with_capacity(capacity),
            order: Vec::with_capacity(capacity),
            reserved: reserve_zero_id.then_some(RESERVED_CITY),
        }
    }

    /// Ensure `city` is present, with an empty neighbour list if it is new
    pub fn add_city(&mut self, city: City) -> Result<(), TrafficError> {
        if self.reserved == Some(city) {
            return Err(TrafficError::SentinelCollision(city));
        }

        if !self.neighbourhoods.contains_key(&city) {
            self.neighbourhoods.insert(city, Vec::new());
            self.order.push(city);
        }

        Ok(())
    }

    /// Append `neighbour` to the neighbour list of `city`
    pub fn add_road(&mut self, city: City, neighbour: City) -> Result<(), TrafficError> {
        if self.reserved == Some(neighbour) {
            return Err(TrafficError::SentinelCollision(neighbour));
        }

        self.add_city(city)?;
        if let Some(neighbours) = self.neighbourhoods.get_mut(&city) {
            neighbours.push(neighbour);
        }

        Ok(())
    }

    /// Neighbours of `city` in insertion order
    pub fn neighbours(&self, city: City) -> Result<&[City], TrafficError> {
        self.neighbourhoods
            .get(&city)
            .map(Vec::as_slice)
            .ok_or(TrafficError::NotFound(city))
    }

    pub fn contains(&self, city: City) -> bool {
        self.neighbourhoods.contains_key(&city)
    }

    /// Cities in the order they were first declared
    pub fn cities(&self) -> impl Iterator<Item = City> + '_ {
        self.order.iter().copied()
    }

    pub fn city_count(&self) -> usize {
        self.order.len()
    }

    /// Total number of neighbour entries (each direction counted separately)
    pub fn road_count(&self) -> usize {
        self.neighbourhoods.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn reserved(&self) -> Option<City> {
        self.reserved
    }

    /// Drop every city and road, keeping the reservation policy
    pub fn clear(&mut self) {
        self.neighbourhoods.clear();
        self.order.clear();
    }
}
