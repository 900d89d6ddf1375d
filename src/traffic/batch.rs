//! Batch driver: maximum traffic for every city

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use crate::config::Config;
use crate::error::TrafficError;
use crate::graph::topology::enforce_tree;
use crate::graph::{City, CityMap};
use crate::traffic::{
    CityTraffic, PathTrafficCache, SharedPathTrafficCache, TrafficCache, TrafficEngine,
    TrafficResult, TraversalStats,
};

/// Owns a city map together with the directed-edge caches built over it.
///
/// Cached paths stay valid for as long as the map is unchanged, so a second
/// batch over the same map is answered mostly from the cache. Call `reset_all`
/// before loading an unrelated map.
pub struct TrafficAnalyzer {
    config: Config,
    city_map: CityMap,
    cache: PathTrafficCache,
    shared_cache: SharedPathTrafficCache,
    last_stats: TraversalStats,
}

impl TrafficAnalyzer {
    /// Create an analyzer with an empty city map
    pub fn new(config: Config) -> Self {
        let city_map = if config.reserve_zero_id {
            CityMap::new()
        } else {
            CityMap::unrestricted()
        };

        Self::with_city_map(city_map, config)
    }

    /// Create an analyzer over an already populated city map
    pub fn with_city_map(city_map: CityMap, config: Config) -> Self {
        Self {
            config,
            city_map,
            cache: PathTrafficCache::new(),
            shared_cache: SharedPathTrafficCache::new(),
            last_stats: TraversalStats::default(),
        }
    }

    pub fn add_city(&mut self, city: City) -> Result<(), TrafficError> {
        self.invalidate_caches();
        self.city_map.add_city(city)
    }

    pub fn add_road(&mut self, city: City, neighbour: City) -> Result<(), TrafficError> {
        self.invalidate_caches();
        self.city_map.add_road(city, neighbour)
    }

    /// Replace the city map, dropping everything cached for the old one
    pub fn load(&mut self, city_map: CityMap) {
        self.reset_all();
        self.city_map = city_map;
    }

    pub fn city_map(&self) -> &CityMap {
        &self.city_map
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Work counters of the most recent batch
    pub fn last_stats(&self) -> TraversalStats {
        self.last_stats
    }

    /// Number of directed paths currently cached
    pub fn cached_paths(&self) -> usize {
        self.cache.len() + self.shared_cache.len()
    }

    /// Number of cache writes that hit an already cached path
    pub fn cache_overwrites(&self) -> usize {
        self.cache.overwrites() + self.shared_cache.overwrites()
    }

    /// Maximum traffic for every city, sorted ascending by city
    pub fn compute_overall_traffic(&mut self) -> Result<TrafficResult, TrafficError> {
        enforce_tree(&self.city_map, self.config.strict_topology)?;

        log::info!(
            "Computing maximum traffic for {} cities ({})",
            self.city_map.city_count(),
            if self.config.parallel { "parallel" } else { "sequential" }
        );

        let (mut traffic_result, stats) = if self.config.parallel {
            self.compute_parallel()?
        } else {
            self.compute_sequential()?
        };

        traffic_result.sort_by_key(|entry| entry.city);
        self.last_stats = stats;

        log::debug!(
            "Batch resolved {} paths with {} cache hits; {} paths cached, {} overwrites",
            stats.resolved,
            stats.cache_hits,
            self.cached_paths(),
            self.cache_overwrites()
        );
        log::info!("Computed traffic for {} cities", traffic_result.len());

        Ok(traffic_result)
    }

    fn compute_sequential(&self) -> Result<(TrafficResult, TraversalStats), TrafficError> {
        let mut traffic_result = TrafficResult::with_capacity(self.city_map.city_count());
        let mut engine = TrafficEngine::new(&self.city_map, &self.cache);

        for city in self.city_map.cities() {
            let traffic = engine.compute_max_traffic(city)?;
            traffic_result.push(CityTraffic { city, traffic });
            engine.reset_working_set();
        }

        Ok((traffic_result, engine.stats()))
    }

    /// Worker pool sized by `Config::threads` (0 = all available cores)
    fn worker_pool(&self) -> Result<ThreadPool, TrafficError> {
        let num_threads = self.config.worker_threads();
        log::debug!("Using {} worker threads", num_threads);

        ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build()
            .map_err(|e| TrafficError::ThreadPool(e.to_string()))
    }

    fn compute_parallel(&self) -> Result<(TrafficResult, TraversalStats), TrafficError> {
        let city_map = &self.city_map;
        let shared_cache = &self.shared_cache;
        let cities: Vec<City> = city_map.cities().collect();

        let evaluated = self.worker_pool()?.install(|| {
            cities
                .par_iter()
                .map(|&city| -> Result<(CityTraffic, TraversalStats), TrafficError> {
                    // Fresh working set per root; only the directed-edge cache is shared
                    let mut engine = TrafficEngine::new(city_map, shared_cache);
                    let traffic = engine.compute_max_traffic(city)?;
                    Ok((CityTraffic { city, traffic }, engine.stats()))
                })
                .collect::<Result<Vec<_>, _>>()
        })?;

        let mut stats = TraversalStats::default();
        let mut traffic_result = TrafficResult::with_capacity(evaluated.len());
        for (entry, root_stats) in evaluated {
            stats += root_stats;
            traffic_result.push(entry);
        }

        Ok((traffic_result, stats))
    }

    /// Clear the city map, the caches and any leftover working state
    pub fn reset_all(&mut self) {
        self.city_map.clear();
        self.invalidate_caches();
    }

    fn invalidate_caches(&mut self) {
        self.cache.clear();
        self.shared_cache.clear();
        self.last_stats = TraversalStats::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::builder::parse_descriptions;

    fn analyzer(lines: &[&str], parallel: bool) -> TrafficAnalyzer {
        let map = parse_descriptions(lines.iter().copied(), true).unwrap();
        let config = Config {
            parallel,
            ..Config::default()
        };
        TrafficAnalyzer::with_city_map(map, config)
    }

    fn pairs(result: &TrafficResult) -> Vec<(City, u64)> {
        result.iter().map(|entry| (entry.city, entry.traffic)).collect()
    }

    #[test]
    fn test_star_batch_is_sorted() {
        let mut analyzer = analyzer(&["5:[1,2,3,4]", "3:[5]", "1:[5]", "4:[5]", "2:[5]"], false);
        let result = analyzer.compute_overall_traffic().unwrap();

        assert_eq!(pairs(&result), vec![(1, 14), (2, 13), (3, 12), (4, 11), (5, 4)]);
    }

    #[test]
    fn test_each_path_materialised_once() {
        let mut analyzer = analyzer(
            &["1:[5]", "2:[5,18]", "3:[5,12]", "4:[5]", "5:[1,2,3,4]", "18:[2]", "12:[3]"],
            false,
        );
        analyzer.compute_overall_traffic().unwrap();

        let stats = analyzer.last_stats();
        assert_eq!(analyzer.cache_overwrites(), 0);
        assert_eq!(stats.resolved, analyzer.cached_paths());
        // Every road in both directions plus one root path per city
        assert_eq!(analyzer.cached_paths(), 2 * 6 + 7);
    }

    #[test]
    fn test_second_batch_is_served_from_cache() {
        let mut analyzer = analyzer(&["1:[5]", "2:[5]", "3:[5]", "4:[5]", "5:[1,2,3,4]"], false);
        let first = analyzer.compute_overall_traffic().unwrap();
        let second = analyzer.compute_overall_traffic().unwrap();

        assert_eq!(first, second);
        assert_eq!(analyzer.last_stats().resolved, 0);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let lines = [
            "1:[2,7,8]", "2:[1,3,6]", "3:[2,4,5]", "4:[3]", "5:[3]", "6:[2]",
            "7:[1]", "8:[1,9,12]", "9:[8,10,11]", "10:[9]", "11:[9]", "12:[8]", "13:[]",
        ];
        let sequential = analyzer(&lines, false).compute_overall_traffic().unwrap();
        let parallel = analyzer(&lines, true).compute_overall_traffic().unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_missing_city_aborts_batch() {
        for parallel in [false, true] {
            let mut analyzer = analyzer(&["1:[2]"], parallel);
            assert_eq!(analyzer.compute_overall_traffic(), Err(TrafficError::NotFound(2)));
        }
    }

    #[test]
    fn test_strict_topology_rejects_cycle() {
        let map = parse_descriptions(["1:[2,3]", "2:[1,3]", "3:[1,2]"], true).unwrap();
        let config = Config {
            strict_topology: true,
            ..Config::default()
        };
        let mut analyzer = TrafficAnalyzer::with_city_map(map, config);

        assert!(matches!(analyzer.compute_overall_traffic(), Err(TrafficError::Topology(_))));
    }

    #[test]
    fn test_strict_topology_rejects_repeated_road() {
        let map = parse_descriptions(["3:[1]", "1:[2,2,3]", "2:[1]"], true).unwrap();
        let config = Config {
            strict_topology: true,
            ..Config::default()
        };
        let mut analyzer = TrafficAnalyzer::with_city_map(map, config);

        match analyzer.compute_overall_traffic() {
            Err(TrafficError::Topology(message)) => assert!(message.contains("more than once")),
            other => panic!("expected topology error, got {:?}", other),
        }
    }

    #[test]
    fn test_worker_pool_follows_configured_threads() {
        let config = Config {
            parallel: true,
            threads: 2,
            ..Config::default()
        };
        let analyzer = TrafficAnalyzer::new(config);
        let pool = analyzer.worker_pool().unwrap();

        assert_eq!(pool.current_num_threads(), 2);
        assert_eq!(pool.install(rayon::current_num_threads), 2);
    }

    #[test]
    fn test_reset_then_replay_is_identical() {
        let lines = ["1:[5]", "2:[5,18]", "3:[5,12]", "4:[5]", "5:[1,2,3,4]", "18:[2]", "12:[3]"];
        let mut analyzer = analyzer(&lines, false);
        let first = analyzer.compute_overall_traffic().unwrap();

        analyzer.reset_all();
        assert!(analyzer.city_map().is_empty());
        assert_eq!(analyzer.cached_paths(), 0);

        analyzer.load(parse_descriptions(lines, true).unwrap());
        let second = analyzer.compute_overall_traffic().unwrap();

        assert_eq!(first, second);
        assert_eq!(analyzer.cache_overwrites(), 0);
    }

    #[test]
    fn test_mutating_the_map_drops_cached_paths() {
        let mut analyzer = TrafficAnalyzer::new(Config::default());
        analyzer.add_road(1, 2).unwrap();
        analyzer.add_road(2, 1).unwrap();
        let before = analyzer.compute_overall_traffic().unwrap();
        assert_eq!(pairs(&before), vec![(1, 2), (2, 1)]);

        analyzer.add_road(2, 3).unwrap();
        analyzer.add_road(3, 2).unwrap();
        assert_eq!(analyzer.cached_paths(), 0);

        let after = analyzer.compute_overall_traffic().unwrap();
        assert_eq!(pairs(&after), vec![(1, 5), (2, 3), (3, 3)]);
    }
}
