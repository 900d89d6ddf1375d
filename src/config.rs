//! Configuration management for the city traffic analyzer

/// Default configuration for the city traffic analyzer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Evaluate roots on the rayon pool over a shared concurrent cache
    pub parallel: bool,

    /// Number of worker threads (0 = use all available cores)
    pub threads: usize,

    /// Fail the batch instead of warning when the map is not a tree/forest
    pub strict_topology: bool,

    /// Reject city id 0, as the reference input format reserves it
    pub reserve_zero_id: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            parallel: false,
            threads: 0,
            strict_topology: false,
            reserve_zero_id: true,
        }
    }
}

impl Config {
    /// Create a new configuration with custom values
    pub fn new(
        parallel: bool,
        threads: usize,
        strict_topology: bool,
        reserve_zero_id: bool,
    ) -> Self {
        Self {
            parallel,
            threads,
            strict_topology,
            reserve_zero_id,
        }
    }

    /// Worker thread count with 0 resolved to the number of available cores
    pub fn worker_threads(&self) -> usize {
        if self.threads > 0 {
            self.threads
        } else {
            num_cpus::get()
        }
    }
}
