//! # sigverify
//!
//! Compares handwritten signatures embedded in two document images and
//! decides whether they come from the same hand.
//!
//! The library:
//! - locates signature regions with a pluggable [`SignatureDetector`]
//! - turns each region into a [`Pattern`]: a fixed-size crop and the external
//!   contours of its Canny edge map
//! - scores every cross pair of patterns with a Hu-moment shape distance and
//!   keeps the smallest one
//! - reports detection flags, the aggregate score and a same/different verdict
//!
//! ## Example
//!
//! ```rust,no_run
//! use sigverify::{ComparisonConfig, ComparisonPipeline, YoloDetector};
//! use std::path::Path;
//!
//! let config = ComparisonConfig::default();
//! let detector = YoloDetector::from_config(&config.detection)?;
//! let pipeline = ComparisonPipeline::new(detector, &config)?;
//!
//! let report = pipeline.compare(Path::new("contract.jpg"), Path::new("id_card.png"))?;
//! println!("{}", report.outcome.message());
//! # Ok::<(), sigverify::VerificationError>(())
//! ```

pub mod config;
pub mod constants;
pub mod detection;
pub mod error;
pub mod image_loader;
pub mod pattern;
pub mod pipeline;
pub mod similarity;

pub use config::{ComparisonConfig, DetectionConfig, ExtractionConfig, ScoringConfig, ShapeMatchMethod};
pub use detection::{PrecomputedDetector, Region, SignatureDetector, YoloDetector};
pub use error::{Result, VerificationError};
pub use pattern::{Extraction, Pattern, PatternExtractor};
pub use pipeline::{ComparisonOutcome, ComparisonPipeline, ComparisonReport, ComparisonStatus, ImageAnalysis};
pub use similarity::{HuMomentMetric, ShapeMetric, SimilarityScore, SimilarityScorer, Verdict};

use std::path::Path;

/// Compare the signatures in two image files with default settings
///
/// Convenience wrapper around [`ComparisonPipeline::with_defaults`]. Build a
/// pipeline once and call [`ComparisonPipeline::compare`] when comparing
/// more than one pair.
pub fn compare_signatures<D: SignatureDetector>(
    first: &Path,
    second: &Path,
    detector: D,
) -> Result<ComparisonOutcome> {
    ComparisonPipeline::with_defaults(detector)
        .compare(first, second)
        .map(|report| report.outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_signatures_missing_file() {
        let err = compare_signatures(
            Path::new("nonexistent_first.jpg"),
            Path::new("nonexistent_second.jpg"),
            PrecomputedDetector::default(),
        )
        .unwrap_err();

        assert!(matches!(err, VerificationError::ImageLoadError { .. }));
        assert_eq!(err.failing_path(), Some(Path::new("nonexistent_first.jpg")));
    }
}
