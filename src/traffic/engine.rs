//! Memoized rerooting traversal

use std::ops::{Add, AddAssign};
use crate::error::TrafficError;
use crate::graph::{City, CityMap};
use crate::traffic::{CityPath, Traffic, TrafficCache, TrafficMap};

/// Counters describing how much work the engine did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraversalStats {
    /// Paths answered straight from the directed-edge cache
    pub cache_hits: usize,

    /// Paths whose aggregate was computed (resolve-body executions)
    pub resolved: usize,
}

impl Add for TraversalStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            cache_hits: self.cache_hits + other.cache_hits,
            resolved: self.resolved + other.resolved,
        }
    }
}

impl AddAssign for TraversalStats {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// Pending path on the explicit traversal stack
struct Frame {
    path: CityPath,
    /// Index of the next neighbour to visit
    cursor: usize,
}

impl Frame {
    fn new(path: CityPath) -> Self {
        Self { path, cursor: 0 }
    }
}

/// Evaluates traffic for one root at a time over a shared directed-edge cache.
///
/// The graph is assumed to be a tree (or a forest). On a graph with cycles the
/// working set still guarantees termination, but the aggregates are not
/// meaningful.
pub struct TrafficEngine<'a, C: TrafficCache> {
    city_map: &'a CityMap,
    cache: &'a C,

    /// Per-root working set; cleared between roots
    traffic_map: TrafficMap,

    stats: TraversalStats,
}

impl<'a, C: TrafficCache> TrafficEngine<'a, C> {
    pub fn new(city_map: &'a CityMap, cache: &'a C) -> Self {
        Self {
            city_map,
            cache,
            traffic_map: TrafficMap::new(),
            stats: TraversalStats::default(),
        }
    }

    /// Traffic on `city`'s side of the tree when `excluded` is the direction
    /// back toward the caller (`None` for a root).
    ///
    /// Every neighbour not yet in the working set gets a placeholder before it
    /// is resolved, then the aggregate sums `n + working_set[n]` over all
    /// neighbours except `excluded` and `city` itself. The sum reads whatever
    /// the working set holds at that point, including values written while
    /// sibling branches were resolved.
    pub fn resolve(&mut self, city: City, excluded: Option<City>) -> Result<Traffic, TrafficError> {
        let path = CityPath::new(city, excluded);
        if let Some(traffic) = self.cache.get(&path) {
            self.stats.cache_hits += 1;
            self.traffic_map.insert(city, traffic);
            return Ok(traffic);
        }

        let city_map = self.city_map;
        let mut stack = vec![Frame::new(path)];
        let mut traffic = Traffic::default();

        while let Some(frame) = stack.last_mut() {
            let current = frame.path.city;
            let neighbours = city_map.neighbours(current)?;

            if let Some(&neighbour) = neighbours.get(frame.cursor) {
                frame.cursor += 1;

                if neighbour == current || self.traffic_map.contains_key(&neighbour) {
                    continue;
                }

                // Placeholder first, so the neighbour is not re-entered during this pass
                self.traffic_map.insert(neighbour, 0);

                let child = CityPath::new(neighbour, Some(current));
                match self.cache.get(&child) {
                    Some(cached) => {
                        self.stats.cache_hits += 1;
                        self.traffic_map.insert(neighbour, cached);
                    }
                    None => stack.push(Frame::new(child)),
                }
                continue;
            }

            let settled = frame.path;
            stack.pop();

            traffic = self.neighbourhood_traffic(settled, neighbours);
            self.stats.resolved += 1;
            self.cache.put(settled, traffic);
            self.traffic_map.insert(settled.city, traffic);
        }

        Ok(traffic)
    }

    /// Sum of `n + working_set[n]` over the neighbours of `path.city`,
    /// skipping the excluded direction and self-loops
    fn neighbourhood_traffic(&self, path: CityPath, neighbours: &[City]) -> Traffic {
        neighbours
            .iter()
            .filter(|&&neighbour| Some(neighbour) != path.excluded && neighbour != path.city)
            .fold(Traffic::default(), |total, &neighbour| {
                total.wrapping_add(neighbour.wrapping_add(self.working_traffic(neighbour)))
            })
    }

    fn working_traffic(&self, city: City) -> Traffic {
        self.traffic_map.get(&city).copied().unwrap_or_default()
    }

    /// Traffic of the branch behind `neighbour` as seen from `root`.
    ///
    /// A root answered from the cache leaves its neighbours out of the working
    /// set; their paths toward the root were cached by the pass that cached
    /// the root itself.
    fn branch_traffic(&self, root: City, neighbour: City) -> Traffic {
        self.traffic_map
            .get(&neighbour)
            .copied()
            .or_else(|| self.cache.get(&CityPath::new(neighbour, Some(root))))
            .unwrap_or_default()
    }

    /// Largest traffic reachable from `root` through any single neighbour.
    ///
    /// Returns 0 for a city without neighbours. The working set is left
    /// populated; call `reset_working_set` before the next root.
    pub fn compute_max_traffic(&mut self, root: City) -> Result<Traffic, TrafficError> {
        self.resolve(root, None)?;

        let max_traffic = self
            .city_map
            .neighbours(root)?
            .iter()
            .filter(|&&neighbour| neighbour != root)
            .map(|&neighbour| neighbour.wrapping_add(self.branch_traffic(root, neighbour)))
            .fold(Traffic::default(), Traffic::max);

        Ok(max_traffic)
    }

    /// Discard the per-root working set
    pub fn reset_working_set(&mut self) {
        self.traffic_map.clear();
    }

    pub fn working_set(&self) -> &TrafficMap {
        &self.traffic_map
    }

    pub fn stats(&self) -> TraversalStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::parse_descriptions;
    use crate::traffic::PathTrafficCache;

    fn star() -> CityMap {
        parse_descriptions(["1:[5]", "2:[5]", "3:[5]", "4:[5]", "5:[1,2,3,4]"], true).unwrap()
    }

    #[test]
    fn test_leaf_root_sees_whole_star() {
        let map = star();
        let cache = PathTrafficCache::new();
        let mut engine = TrafficEngine::new(&map, &cache);

        assert_eq!(engine.compute_max_traffic(1).unwrap(), 14);
        assert_eq!(engine.working_set().get(&5), Some(&9));
        assert_eq!(cache.get(&CityPath::new(5, Some(1))), Some(9));
        assert_eq!(cache.get(&CityPath::new(2, Some(5))), Some(0));
        assert_eq!(cache.get(&CityPath::root(1)), Some(14));
    }

    #[test]
    fn test_center_root_reuses_leaf_paths() {
        let map = star();
        let cache = PathTrafficCache::new();
        let mut engine = TrafficEngine::new(&map, &cache);

        engine.compute_max_traffic(1).unwrap();
        engine.reset_working_set();
        let before = engine.stats();

        assert_eq!(engine.compute_max_traffic(5).unwrap(), 4);

        let after = engine.stats();
        // Only the root path itself is new; the four leaf paths come from the cache
        assert_eq!(after.resolved - before.resolved, 1);
        assert_eq!(after.cache_hits - before.cache_hits, 4);
    }

    #[test]
    fn test_resolve_twice_returns_cached_value() {
        let map = star();
        let cache = PathTrafficCache::new();
        let mut engine = TrafficEngine::new(&map, &cache);

        engine.compute_max_traffic(1).unwrap();
        engine.reset_working_set();
        let resolved = engine.stats().resolved;

        let first = engine.resolve(5, Some(1)).unwrap();
        let second = engine.resolve(5, Some(1)).unwrap();

        assert_eq!(first, 9);
        assert_eq!(first, second);
        assert_eq!(engine.stats().resolved, resolved);
        assert_eq!(engine.working_set().get(&5), Some(&9));
        assert_eq!(cache.overwrites(), 0);
    }

    #[test]
    fn test_isolated_city_has_zero_traffic() {
        let map = parse_descriptions(["13:[]"], true).unwrap();
        let cache = PathTrafficCache::new();
        let mut engine = TrafficEngine::new(&map, &cache);

        assert_eq!(engine.compute_max_traffic(13).unwrap(), 0);
    }

    #[test]
    fn test_self_loops_are_ignored() {
        let map = parse_descriptions(["1:[1,2]", "2:[1,2,3]", "3:[2]"], true).unwrap();
        let cache = PathTrafficCache::new();
        let mut engine = TrafficEngine::new(&map, &cache);

        assert_eq!(engine.compute_max_traffic(1).unwrap(), 5);
        engine.reset_working_set();
        assert_eq!(engine.compute_max_traffic(2).unwrap(), 3);
        engine.reset_working_set();
        assert_eq!(engine.compute_max_traffic(3).unwrap(), 3);
    }

    #[test]
    fn test_unknown_neighbour_is_not_found() {
        let map = parse_descriptions(["1:[2]"], true).unwrap();
        let cache = PathTrafficCache::new();
        let mut engine = TrafficEngine::new(&map, &cache);

        assert_eq!(engine.compute_max_traffic(1), Err(TrafficError::NotFound(2)));
        assert_eq!(engine.compute_max_traffic(7), Err(TrafficError::NotFound(7)));
    }

    #[test]
    fn test_traffic_wraps_on_overflow() {
        let mut map = CityMap::new();
        map.add_road(1, u64::MAX).unwrap();
        map.add_road(u64::MAX, 1).unwrap();
        map.add_road(u64::MAX, 2).unwrap();
        map.add_road(2, u64::MAX).unwrap();

        let cache = PathTrafficCache::new();
        let mut engine = TrafficEngine::new(&map, &cache);

        // u64::MAX + 2 wraps around to 1
        assert_eq!(engine.compute_max_traffic(1).unwrap(), 1);
    }

    #[test]
    fn test_zero_id_without_reservation() {
        let map = parse_descriptions(["0:[1]", "1:[0,2]", "2:[1]"], false).unwrap();
        let cache = PathTrafficCache::new();
        let mut engine = TrafficEngine::new(&map, &cache);

        assert_eq!(engine.compute_max_traffic(0).unwrap(), 3);
        engine.reset_working_set();
        assert_eq!(engine.compute_max_traffic(2).unwrap(), 1);
    }

    #[test]
    fn test_deep_chain_does_not_overflow_stack() {
        let length: City = 200_000;
        let mut map = CityMap::new();
        for city in 1..=length {
            map.add_city(city).unwrap();
            if city > 1 {
                map.add_road(city, city - 1).unwrap();
                map.add_road(city - 1, city).unwrap();
            }
        }

        let cache = PathTrafficCache::new();
        let mut engine = TrafficEngine::new(&map, &cache);

        let expected = (2..=length).sum::<City>();
        assert_eq!(engine.compute_max_traffic(1).unwrap(), expected);
    }
}
