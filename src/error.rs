//! Error types for traffic computation

use thiserror::Error;
use crate::graph::City;

/// Errors raised while building a city map or computing traffic over it
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrafficError {
    /// A city was referenced (as a root or as a neighbour) but never declared
    #[error("City {0} is not part of the city map")]
    NotFound(City),

    /// A real city uses the identifier reserved for "no parent"
    #[error("City id {0} is reserved and cannot be used as a real city")]
    SentinelCollision(City),

    /// A description line could not be parsed
    #[error("Parse error on line {line}: {reason}")]
    Parse {
        line: usize,
        reason: String,
    },

    /// Strict topology validation rejected the city map
    #[error("Topology error: {0}")]
    Topology(String),

    /// The worker pool for a parallel batch could not be started
    #[error("Thread pool error: {0}")]
    ThreadPool(String),
}
