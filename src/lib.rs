// src/lib.rs
pub mod analysis;
pub mod data;
pub mod models;
pub mod service;
pub mod utils;
