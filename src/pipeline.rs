//! Two-image comparison pipeline
//!
//! image → detector → regions → [`PatternExtractor`] → patterns →
//! [`SimilarityScorer`] → [`ComparisonOutcome`]
//!
//! The detector is injected once and reused read-only for every comparison.
//! Both images are decoded before any detection runs, so a load failure
//! aborts the request without computing patterns for either side.

use crate::config::ComparisonConfig;
use crate::constants::{detection::CONFIDENCE_THRESHOLD, NO_PATTERNS_MESSAGE};
use crate::detection::{check_threshold, Region, SignatureDetector};
use crate::error::Result;
use crate::image_loader::load_image;
use crate::pattern::{Pattern, PatternExtractor};
use crate::similarity::{HuMomentMetric, ShapeMetric, SimilarityScore, SimilarityScorer, Verdict};
use opencv::core::Mat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Whether scoring ran
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonStatus {
    /// Both images had patterns and a score was computed
    Compared,
    /// One or both images had no usable pattern; score and verdict are absent
    NoPatterns,
}

/// Caller-facing result of comparing two images
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonOutcome {
    /// Detector returned at least one region for the first image
    pub detected1: bool,
    /// Detector returned at least one region for the second image
    pub detected2: bool,
    /// Patterns that survived extraction in the first image
    pub patterns1: usize,
    /// Patterns that survived extraction in the second image
    pub patterns2: usize,
    /// Minimum pair distance, absent when either side has no patterns
    pub aggregate_score: Option<f64>,
    pub verdict: Option<Verdict>,
    /// Pattern indices of the best-matching pair
    pub best_pair: Option<(usize, usize)>,
    pub status: ComparisonStatus,
}

impl ComparisonOutcome {
    fn from_analyses(first: &ImageAnalysis, second: &ImageAnalysis, score: Option<SimilarityScore>) -> Self {
        Self {
            detected1: first.detected,
            detected2: second.detected,
            patterns1: first.pattern_count,
            patterns2: second.pattern_count,
            aggregate_score: score.map(|s| s.distance),
            verdict: score.map(|s| s.verdict),
            best_pair: score.map(|s| s.best_pair),
            status: if score.is_some() {
                ComparisonStatus::Compared
            } else {
                ComparisonStatus::NoPatterns
            },
        }
    }

    /// First image has at least one pattern available for scoring
    pub fn pattern_bearing1(&self) -> bool {
        self.patterns1 > 0
    }

    /// Second image has at least one pattern available for scoring
    pub fn pattern_bearing2(&self) -> bool {
        self.patterns2 > 0
    }

    /// `Some(true)` for the same hand, `None` when scoring did not run
    pub fn is_same(&self) -> Option<bool> {
        self.verdict.map(Verdict::is_same)
    }

    /// Result text for display
    pub fn message(&self) -> String {
        match (self.aggregate_score, self.verdict) {
            (Some(score), Some(verdict)) => {
                format!("Similarity Score: {:.4}\nResult: {}", score, verdict.label())
            }
            _ => NO_PATTERNS_MESSAGE.to_string(),
        }
    }

    /// Per-image detection report followed by the verdict, when there is one
    pub fn detection_summary(&self) -> String {
        let status = |detected: bool| if detected { "Sign detected" } else { "No sign detected" };
        let mut summary = format!(
            "Image 1: {}\nImage 2: {}\n",
            status(self.detected1),
            status(self.detected2)
        );
        if self.detected1 && self.detected2 {
            if let (Some(score), Some(verdict)) = (self.aggregate_score, self.verdict) {
                let word = if verdict.is_same() { "same" } else { "different" };
                summary.push_str(&format!(
                    "The signs are {} (Similarity Score: {:.4})\n",
                    word, score
                ));
            }
        }
        summary
    }
}

/// Per-image artefacts for the presentation layer
#[derive(Debug)]
pub struct ImageAnalysis {
    /// Regions returned by the detector
    pub regions: Vec<Region>,
    /// True iff `regions` is non-empty
    pub detected: bool,
    /// Patterns that survived contour tracing
    pub pattern_count: usize,
    /// Source image with the regions drawn on it
    pub annotated: Mat,
}

/// Everything a comparison produces
#[derive(Debug)]
pub struct ComparisonReport {
    pub first: ImageAnalysis,
    pub second: ImageAnalysis,
    pub outcome: ComparisonOutcome,
}

/// Compares the signatures in two document images
pub struct ComparisonPipeline<D, M = HuMomentMetric> {
    detector: D,
    extractor: PatternExtractor,
    scorer: SimilarityScorer<M>,
    confidence_threshold: f32,
}

impl<D: SignatureDetector> ComparisonPipeline<D> {
    /// Build a pipeline from a validated configuration
    pub fn new(detector: D, config: &ComparisonConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            detector,
            extractor: PatternExtractor::from_config(&config.extraction),
            scorer: SimilarityScorer::from_config(&config.scoring)?,
            confidence_threshold: config.detection.confidence_threshold,
        })
    }

    /// Pipeline with the reference parameters
    pub fn with_defaults(detector: D) -> Self {
        Self {
            detector,
            extractor: PatternExtractor::new(),
            scorer: SimilarityScorer::new(),
            confidence_threshold: CONFIDENCE_THRESHOLD,
        }
    }
}

impl<D: SignatureDetector, M: ShapeMetric> ComparisonPipeline<D, M> {
    /// Assemble a pipeline from individually configured stages
    pub fn with_components(
        detector: D,
        extractor: PatternExtractor,
        scorer: SimilarityScorer<M>,
        confidence_threshold: f32,
    ) -> Result<Self> {
        check_threshold(confidence_threshold)?;
        Ok(Self {
            detector,
            extractor,
            scorer,
            confidence_threshold,
        })
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn confidence_threshold(&self) -> f32 {
        self.confidence_threshold
    }

    /// Load both images and compare them
    ///
    /// # Errors
    ///
    /// - [`crate::VerificationError::ImageLoadError`] naming the first path
    ///   that fails to decode; nothing else runs
    /// - [`crate::VerificationError::DetectorError`] if detection fails
    pub fn compare(&self, path_a: &Path, path_b: &Path) -> Result<ComparisonReport> {
        let image_a = load_image(path_a)?;
        let image_b = load_image(path_b)?;
        info!(
            first = %path_a.display(),
            second = %path_b.display(),
            "Comparing signatures"
        );
        self.compare_images(&image_a, &image_b)
    }

    /// Compare two already decoded BGR images
    pub fn compare_images(&self, image_a: &Mat, image_b: &Mat) -> Result<ComparisonReport> {
        let (first, patterns_a) = self.analyze(image_a)?;
        let (second, patterns_b) = self.analyze(image_b)?;

        let score = self.scorer.score(&patterns_a, &patterns_b)?;
        let outcome = ComparisonOutcome::from_analyses(&first, &second, score);

        match outcome.aggregate_score {
            Some(score) => info!(score, verdict = ?outcome.verdict, "Comparison finished"),
            None => warn!("{}", NO_PATTERNS_MESSAGE),
        }

        Ok(ComparisonReport {
            first,
            second,
            outcome,
        })
    }

    /// Detect, annotate and extract patterns for one image
    pub fn analyze(&self, image: &Mat) -> Result<(ImageAnalysis, Vec<Pattern>)> {
        let regions = self.detector.detect(image, self.confidence_threshold)?;
        info!(regions = regions.len(), "Number of boxes detected");

        let annotated = self.detector.annotate(image, &regions)?;
        let extraction = self.extractor.extract(image, &regions)?;
        if extraction.detected && !extraction.pattern_bearing() {
            warn!("Signature regions found but none produced contours");
        }

        let analysis = ImageAnalysis {
            detected: extraction.detected,
            pattern_count: extraction.patterns.len(),
            regions: extraction.regions,
            annotated,
        };
        Ok((analysis, extraction.patterns))
    }
}
