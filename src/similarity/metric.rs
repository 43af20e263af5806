//! Per-pair shape distances

use crate::config::ShapeMatchMethod;
use crate::error::{Result, VerificationError};
use crate::pattern::Contour;
use opencv::imgproc::{contour_area, match_shapes};
use tracing::debug;

/// Non-negative distance between two contours
///
/// Implementations must be symmetric, return zero for identical shapes and
/// grow as the shapes diverge.
pub trait ShapeMetric {
    fn distance(&self, a: &Contour, b: &Contour) -> Result<f64>;
}

/// Hu-moment log-ratio distance (OpenCV `matchShapes`)
///
/// I3 divides by the first shape's moments, so `match_shapes(a, b)` and
/// `match_shapes(b, a)` differ. Both orders are evaluated and the larger one is
/// reported, which keeps the result symmetric and leaves identical shapes at 0.
///
/// `matchShapes` skips every Hu term whose moment is below its epsilon on
/// either side. A zero-area contour (two collinear points traced from a
/// straight edge) has no usable moments, so its distance to any shape carries
/// no information and can come out as 0.0, which classifies as "same". Such
/// contours are logged at debug level; see [`has_zero_area`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HuMomentMetric {
    method: ShapeMatchMethod,
}

impl HuMomentMetric {
    pub fn new(method: ShapeMatchMethod) -> Self {
        Self { method }
    }

    pub fn method(&self) -> ShapeMatchMethod {
        self.method
    }

    fn one_way(&self, a: &Contour, b: &Contour) -> Result<f64> {
        match_shapes(a, b, self.method.opencv_flag(), 0.0)
            .map_err(|e| VerificationError::opencv("Shape matching failed", e))
    }
}

/// True when `contour` encloses no area and so has no usable Hu moments
pub fn has_zero_area(contour: &Contour) -> Result<bool> {
    let area = contour_area(contour, false)
        .map_err(|e| VerificationError::opencv("Contour area computation failed", e))?;
    Ok(area == 0.0)
}

impl ShapeMetric for HuMomentMetric {
    fn distance(&self, a: &Contour, b: &Contour) -> Result<f64> {
        if has_zero_area(a)? || has_zero_area(b)? {
            debug!(
                first_points = a.len(),
                second_points = b.len(),
                "Zero-area contour in shape comparison, distance is not meaningful"
            );
        }
        let forward = self.one_way(a, b)?;
        let backward = self.one_way(b, a)?;
        Ok(forward.max(backward).max(0.0))
    }
}

impl<M: ShapeMetric + ?Sized> ShapeMetric for &M {
    fn distance(&self, a: &Contour, b: &Contour) -> Result<f64> {
        (**self).distance(a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::Point;

    fn polygon(points: &[(i32, i32)]) -> Contour {
        points.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn square(offset: i32, side: i32) -> Contour {
        polygon(&[
            (offset, offset),
            (offset + side, offset),
            (offset + side, offset + side),
            (offset, offset + side),
        ])
    }

    fn triangle() -> Contour {
        polygon(&[(10, 100), (60, 10), (150, 100)])
    }

    fn long_bar() -> Contour {
        polygon(&[(0, 0), (200, 0), (200, 12), (0, 12)])
    }

    #[test]
    fn test_zero_area_contours_are_flagged() {
        assert!(has_zero_area(&polygon(&[(0, 0), (120, 0)])).unwrap());
        assert!(has_zero_area(&polygon(&[(0, 0), (50, 50), (100, 100)])).unwrap());
        assert!(!has_zero_area(&triangle()).unwrap());
        assert!(!has_zero_area(&long_bar()).unwrap());
    }

    #[test]
    fn test_zero_area_contour_still_scores() {
        let metric = HuMomentMetric::default();
        let d = metric.distance(&polygon(&[(0, 0), (120, 0)]), &triangle()).unwrap();
        assert!(d >= 0.0);
    }

    #[test]
    fn test_identical_contours_have_zero_distance() {
        let metric = HuMomentMetric::default();
        assert_eq!(metric.distance(&triangle(), &triangle()).unwrap(), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let metric = HuMomentMetric::default();
        let ab = metric.distance(&triangle(), &long_bar()).unwrap();
        let ba = metric.distance(&long_bar(), &triangle()).unwrap();
        assert_eq!(ab, ba);
        assert!(ab > 0.0);
    }

    #[test]
    fn test_scale_and_translation_invariance() {
        let metric = HuMomentMetric::default();
        let d = metric.distance(&square(0, 40), &square(25, 120)).unwrap();
        assert!(d < 1e-3, "scaled squares should match, got {}", d);
    }

    #[test]
    fn test_all_methods_symmetric_and_non_negative() {
        for method in [ShapeMatchMethod::I1, ShapeMatchMethod::I2, ShapeMatchMethod::I3] {
            let metric = HuMomentMetric::new(method);
            let ab = metric.distance(&triangle(), &long_bar()).unwrap();
            let ba = metric.distance(&long_bar(), &triangle()).unwrap();
            assert_eq!(ab, ba, "{:?}", method);
            assert!(ab >= 0.0);
        }
    }
}
