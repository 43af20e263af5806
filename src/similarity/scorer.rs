//! Aggregate scoring of two pattern collections
//!
//! Every cross pair is compared through each pattern's representative (first)
//! contour. The aggregate is the smallest pair distance: one strongly
//! matching pair is enough to call the signatures the same, however
//! dissimilar the remaining pairs are.

use super::metric::{HuMomentMetric, ShapeMetric};
use crate::config::ScoringConfig;
use crate::constants::scoring::SIMILARITY_THRESHOLD;
use crate::error::{Result, VerificationError};
use crate::pattern::Pattern;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Same/different classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Same,
    NotSame,
}

impl Verdict {
    pub fn is_same(self) -> bool {
        matches!(self, Verdict::Same)
    }

    /// Display label
    pub fn label(self) -> &'static str {
        match self {
            Verdict::Same => "Same",
            Verdict::NotSame => "Not Same",
        }
    }
}

/// Outcome of scoring two non-empty pattern collections
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimilarityScore {
    /// Minimum pair distance
    pub distance: f64,
    /// `Same` iff `distance` is below the threshold
    pub verdict: Verdict,
    /// Indices `(a, b)` of the pair that produced `distance`
    pub best_pair: (usize, usize),
    /// Number of pairs compared
    pub pairs_evaluated: usize,
}

/// Scores two pattern collections with a pluggable per-pair metric
#[derive(Debug, Clone)]
pub struct SimilarityScorer<M = HuMomentMetric> {
    metric: M,
    threshold: f64,
}

impl Default for SimilarityScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl SimilarityScorer {
    /// Hu-moment I3 metric with the 0.1 threshold
    pub fn new() -> Self {
        Self {
            metric: HuMomentMetric::default(),
            threshold: SIMILARITY_THRESHOLD,
        }
    }

    pub fn from_config(config: &ScoringConfig) -> Result<Self> {
        Self::with_metric(HuMomentMetric::new(config.method), config.similarity_threshold)
    }
}

impl<M: ShapeMetric> SimilarityScorer<M> {
    /// Scorer with a custom metric and threshold
    pub fn with_metric(metric: M, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(VerificationError::invalid_parameter("similarity_threshold", threshold));
        }
        Ok(Self { metric, threshold })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn metric(&self) -> &M {
        &self.metric
    }

    /// Classify a distance against the threshold
    pub fn classify(&self, distance: f64) -> Verdict {
        if distance < self.threshold {
            Verdict::Same
        } else {
            Verdict::NotSame
        }
    }

    /// Score every pair across `patterns_a` × `patterns_b`
    ///
    /// Returns `Ok(None)` when either side is empty. Ties keep the first pair
    /// in row-major order.
    pub fn score(&self, patterns_a: &[Pattern], patterns_b: &[Pattern]) -> Result<Option<SimilarityScore>> {
        if patterns_a.is_empty() || patterns_b.is_empty() {
            warn!(
                first = patterns_a.len(),
                second = patterns_b.len(),
                "Comparison skipped: one or both images have no detectable signature patterns"
            );
            return Ok(None);
        }

        let mut best: Option<(f64, (usize, usize))> = None;
        for (i, a) in patterns_a.iter().enumerate() {
            for (j, b) in patterns_b.iter().enumerate() {
                let distance = self
                    .metric
                    .distance(a.representative_contour(), b.representative_contour())?;
                debug!(a = i, b = j, "Pattern similarity score: {:.4}", distance);

                if best.map_or(true, |(current, _)| distance < current) {
                    best = Some((distance, (i, j)));
                }
            }
        }

        Ok(best.map(|(distance, best_pair)| SimilarityScore {
            distance,
            verdict: self.classify(distance),
            best_pair,
            pairs_evaluated: patterns_a.len() * patterns_b.len(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::Region;
    use crate::pattern::{Contour, Contours};
    use opencv::core::{Mat, Point};
    use std::collections::HashMap;

    fn pattern_with(points: &[(i32, i32)]) -> Pattern {
        let contour: Contour = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
        let region = Region { x1: 0, y1: 0, x2: 10, y2: 10, confidence: 0.9 };
        Pattern::new(region, Mat::default(), std::iter::once(contour).collect::<Contours>()).unwrap()
    }

    /// Pattern whose first contour starts at `(id, 0)` so a lookup metric can
    /// recognise it
    fn tagged(id: i32) -> Pattern {
        pattern_with(&[(id, 0), (id, 10), (id + 10, 10)])
    }

    /// Distances looked up by the tags of the two contours
    struct TableMetric(HashMap<(i32, i32), f64>);

    impl TableMetric {
        fn new(entries: &[((i32, i32), f64)]) -> Self {
            let mut table = HashMap::new();
            for &((a, b), d) in entries {
                table.insert((a, b), d);
                table.insert((b, a), d);
            }
            Self(table)
        }
    }

    impl ShapeMetric for TableMetric {
        fn distance(&self, a: &Contour, b: &Contour) -> Result<f64> {
            let key = (a.get(0).unwrap().x, b.get(0).unwrap().x);
            Ok(self.0.get(&key).copied().unwrap_or(0.0))
        }
    }

    #[test]
    fn test_empty_side_is_absent() {
        let scorer = SimilarityScorer::new();
        let some = vec![tagged(1)];
        assert!(scorer.score(&[], &some).unwrap().is_none());
        assert!(scorer.score(&some, &[]).unwrap().is_none());
        assert!(scorer.score(&[], &[]).unwrap().is_none());
    }

    #[test]
    fn test_minimum_over_cross_product_wins() {
        // A1-B1 0.05, A1-B2 0.4, A2-B1 0.9, A2-B2 0.3
        let metric = TableMetric::new(&[
            ((1, 101), 0.05),
            ((1, 102), 0.4),
            ((2, 101), 0.9),
            ((2, 102), 0.3),
        ]);
        let scorer = SimilarityScorer::with_metric(metric, 0.1).unwrap();

        let score = scorer
            .score(&[tagged(1), tagged(2)], &[tagged(101), tagged(102)])
            .unwrap()
            .unwrap();
        assert_eq!(score.distance, 0.05);
        assert_eq!(score.verdict, Verdict::Same);
        assert_eq!(score.best_pair, (0, 0));
        assert_eq!(score.pairs_evaluated, 4);
    }

    #[test]
    fn test_adding_a_more_dissimilar_pattern_keeps_aggregate() {
        let metric = TableMetric::new(&[((1, 101), 0.3), ((1, 102), 0.8)]);
        let scorer = SimilarityScorer::with_metric(metric, 0.1).unwrap();

        let before = scorer.score(&[tagged(1)], &[tagged(101)]).unwrap().unwrap();
        let after = scorer
            .score(&[tagged(1)], &[tagged(101), tagged(102)])
            .unwrap()
            .unwrap();
        assert_eq!(before.distance, after.distance);
        assert_eq!(after.verdict, Verdict::NotSame);
    }

    #[test]
    fn test_threshold_is_strict() {
        let metric = TableMetric::new(&[((1, 101), 0.1)]);
        let scorer = SimilarityScorer::with_metric(metric, 0.1).unwrap();
        let score = scorer.score(&[tagged(1)], &[tagged(101)]).unwrap().unwrap();
        assert_eq!(score.verdict, Verdict::NotSame);
    }

    #[test]
    fn test_ties_keep_first_pair() {
        let metric = TableMetric::new(&[((1, 101), 0.2), ((2, 101), 0.2)]);
        let scorer = SimilarityScorer::with_metric(metric, 0.1).unwrap();
        let score = scorer.score(&[tagged(1), tagged(2)], &[tagged(101)]).unwrap().unwrap();
        assert_eq!(score.best_pair, (0, 0));
    }

    #[test]
    fn test_identical_patterns_score_zero_with_hu_moments() {
        let scorer = SimilarityScorer::new();
        let score = scorer.score(&[tagged(5)], &[tagged(5)]).unwrap().unwrap();
        assert_eq!(score.distance, 0.0);
        assert!(score.verdict.is_same());
    }

    #[test]
    fn test_score_is_symmetric_with_hu_moments() {
        let scorer = SimilarityScorer::new();
        let bar = || pattern_with(&[(0, 0), (200, 0), (200, 15), (0, 15)]);

        let ab = scorer.score(&[tagged(3)], &[bar()]).unwrap().unwrap();
        let ba = scorer.score(&[bar()], &[tagged(3)]).unwrap().unwrap();
        assert_eq!(ab.distance, ba.distance);
        assert!(ab.distance >= 0.0);
    }

    #[test]
    fn test_invalid_threshold_rejected() {
        assert!(SimilarityScorer::with_metric(HuMomentMetric::default(), -0.5).is_err());
        assert!(SimilarityScorer::with_metric(HuMomentMetric::default(), f64::INFINITY).is_err());
    }

    #[test]
    fn test_verdict_labels() {
        assert_eq!(Verdict::Same.label(), "Same");
        assert_eq!(Verdict::NotSame.label(), "Not Same");
    }
}
