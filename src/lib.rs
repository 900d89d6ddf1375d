//! Core library functions for the city traffic analyzer

pub mod config;
pub mod data;
pub mod error;
pub mod graph;
pub mod storage;
pub mod traffic;

pub use anyhow::{Result, anyhow};
pub use error::TrafficError;
