//! City graph representation and construction module

pub mod city_map;
pub mod builder;
pub mod topology;

pub use city_map::CityMap;

/// Identifier of a city (vertex)
pub type City = u64;
