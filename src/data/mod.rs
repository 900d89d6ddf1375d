//! Built-in data sets

pub mod cases;
