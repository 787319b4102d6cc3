// src/analysis/mod.rs
pub mod aggregate;
pub mod correlation;
pub mod hierarchical;
pub mod linkage;
pub mod pipeline;
pub mod sampling;
pub mod standardize;
pub mod validation;

// Re-export the pipeline entry points for a clean API
pub use hierarchical::{cluster, ClusterAssignment, Linkage};
pub use pipeline::{run_clustering_analysis, PipelineOptions};
pub use validation::ValidationError;
