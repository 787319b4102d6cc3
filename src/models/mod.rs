// src/models/mod.rs
pub mod analysis;
pub mod feature;
pub mod record;
pub mod region;

pub use analysis::{AnalysisRequest, AnalysisResult, AnalysisRunInfo, ValidatedRequest};
pub use feature::{Feature, FEATURE_COUNT};
pub use record::{CleanedRecord, ClusteredRecord, Record};
pub use region::Region;
