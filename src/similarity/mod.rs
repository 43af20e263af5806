//! Pattern comparison: per-pair shape distance and aggregate verdict

pub mod metric;
pub mod scorer;

pub use metric::{HuMomentMetric, ShapeMetric};
pub use scorer::{SimilarityScore, SimilarityScorer, Verdict};
