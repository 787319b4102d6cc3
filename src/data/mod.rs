// src/data/mod.rs
pub mod dataset;

pub use dataset::Dataset;
