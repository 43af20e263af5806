//! Signature detection boundary
//!
//! The comparison core treats the object detector as a black box behind
//! [`SignatureDetector`]: given a decoded raster and a confidence threshold it
//! returns clamped, already-filtered [`Region`]s. Two implementations ship
//! with the crate:
//!
//! - [`YoloDetector`] runs an ONNX export of the YOLO signature model
//! - [`PrecomputedDetector`] replays regions produced elsewhere

pub mod region;
pub mod yolo;

pub use region::Region;
pub use yolo::YoloDetector;

use crate::constants::detection::CLASS_LABEL;
use crate::error::{Result, VerificationError};
use opencv::{
    core::{Mat, Point, Scalar},
    imgproc::{put_text, rectangle, FONT_HERSHEY_SIMPLEX, LINE_8, LINE_AA},
    prelude::*,
};

/// Locates signature-like marks in a document image
pub trait SignatureDetector: Send + Sync {
    /// Detect signature regions in a BGR image
    ///
    /// Implementations must only return regions whose confidence is at least
    /// `confidence_threshold`, in source pixel coordinates within the image.
    /// Any failure is reported as [`VerificationError::DetectorError`] rather
    /// than as an empty result.
    fn detect(&self, image: &Mat, confidence_threshold: f32) -> Result<Vec<Region>>;

    /// Draw `regions` over a copy of `image` for display
    fn annotate(&self, image: &Mat, regions: &[Region]) -> Result<Mat> {
        draw_regions(image, regions)
    }
}

impl<D: SignatureDetector + ?Sized> SignatureDetector for &D {
    fn detect(&self, image: &Mat, confidence_threshold: f32) -> Result<Vec<Region>> {
        (**self).detect(image, confidence_threshold)
    }

    fn annotate(&self, image: &Mat, regions: &[Region]) -> Result<Mat> {
        (**self).annotate(image, regions)
    }
}

impl<D: SignatureDetector + ?Sized> SignatureDetector for Box<D> {
    fn detect(&self, image: &Mat, confidence_threshold: f32) -> Result<Vec<Region>> {
        (**self).detect(image, confidence_threshold)
    }

    fn annotate(&self, image: &Mat, regions: &[Region]) -> Result<Mat> {
        (**self).annotate(image, regions)
    }
}

impl<D: SignatureDetector + ?Sized> SignatureDetector for std::sync::Arc<D> {
    fn detect(&self, image: &Mat, confidence_threshold: f32) -> Result<Vec<Region>> {
        (**self).detect(image, confidence_threshold)
    }

    fn annotate(&self, image: &Mat, regions: &[Region]) -> Result<Mat> {
        (**self).annotate(image, regions)
    }
}

/// Reject thresholds outside `[0, 1]`
pub(crate) fn check_threshold(confidence_threshold: f32) -> Result<()> {
    if (0.0..=1.0).contains(&confidence_threshold) {
        Ok(())
    } else {
        Err(VerificationError::invalid_parameter(
            "confidence_threshold",
            confidence_threshold,
        ))
    }
}

/// Detector that replays a fixed set of regions
///
/// Useful when detection runs in another service, and in tests. Regions are
/// filtered by the threshold and clamped to each image they are applied to.
#[derive(Debug, Clone, Default)]
pub struct PrecomputedDetector {
    regions: Vec<Region>,
}

impl PrecomputedDetector {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }
}

impl SignatureDetector for PrecomputedDetector {
    fn detect(&self, image: &Mat, confidence_threshold: f32) -> Result<Vec<Region>> {
        check_threshold(confidence_threshold)?;
        let (width, height) = (image.cols(), image.rows());
        Ok(self
            .regions
            .iter()
            .filter(|r| r.confidence >= confidence_threshold)
            .filter_map(|r| Region::clamped(r.x1, r.y1, r.x2, r.y2, r.confidence, width, height))
            .collect())
    }
}

/// Box colour used for annotations (BGR)
const ANNOTATION_COLOR: (f64, f64, f64) = (255.0, 56.0, 56.0);

/// Draw each region as a box with a `signature 0.87` label
pub fn draw_regions(image: &Mat, regions: &[Region]) -> Result<Mat> {
    let mut annotated = image
        .try_clone()
        .map_err(|e| VerificationError::opencv("Annotation copy failed", e))?;

    let (b, g, r) = ANNOTATION_COLOR;
    let color = Scalar::new(b, g, r, 0.0);
    // Line width scales with the page so boxes stay visible on large scans
    let thickness = ((image.cols() + image.rows()) / 600).max(2);

    for region in regions {
        rectangle(&mut annotated, region.rect(), color, thickness, LINE_8, 0)
            .map_err(|e| VerificationError::opencv("Region rectangle drawing failed", e))?;

        let label = format!("{} {:.2}", CLASS_LABEL, region.confidence);
        let origin = Point::new(region.x1, (region.y1 - 2 * thickness).max(12));
        put_text(
            &mut annotated,
            &label,
            origin,
            FONT_HERSHEY_SIMPLEX,
            0.5,
            color,
            1,
            LINE_AA,
            false,
        )
        .map_err(|e| VerificationError::opencv("Region label drawing failed", e))?;
    }

    Ok(annotated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use opencv::core::{Vec3b, CV_8UC3};

    fn white(rows: i32, cols: i32) -> Mat {
        Mat::new_rows_cols_with_default(rows, cols, CV_8UC3, Scalar::all(255.0)).unwrap()
    }

    fn region(x1: i32, y1: i32, x2: i32, y2: i32, confidence: f32) -> Region {
        Region { x1, y1, x2, y2, confidence }
    }

    #[test]
    fn test_precomputed_filters_by_confidence() {
        let detector = PrecomputedDetector::new(vec![
            region(0, 0, 10, 10, 0.9),
            region(20, 20, 30, 30, 0.1),
        ]);
        let found = detector.detect(&white(50, 50), 0.2).unwrap();
        assert_eq!(found, vec![region(0, 0, 10, 10, 0.9)]);
    }

    #[test]
    fn test_precomputed_clamps_to_image() {
        let detector = PrecomputedDetector::new(vec![
            region(40, 40, 80, 90, 0.8),
            region(60, 60, 90, 90, 0.8),
        ]);
        let found = detector.detect(&white(50, 50), 0.2).unwrap();
        assert_eq!(found, vec![region(40, 40, 50, 50, 0.8)]);
    }

    #[test]
    fn test_threshold_outside_unit_range_rejected() {
        let detector = PrecomputedDetector::default();
        let err = detector.detect(&white(10, 10), 1.2).unwrap_err();
        assert!(matches!(err, VerificationError::InvalidParameter { .. }));
    }

    #[test]
    fn test_draw_regions_leaves_source_untouched() {
        let image = white(100, 100);
        let annotated = draw_regions(&image, &[region(10, 20, 60, 70, 0.75)]).unwrap();

        let edge: &Vec3b = annotated.at_2d(20, 30).unwrap();
        assert_ne!((edge[0], edge[1], edge[2]), (255, 255, 255));

        let source: &Vec3b = image.at_2d(20, 30).unwrap();
        assert_eq!((source[0], source[1], source[2]), (255, 255, 255));
    }

    #[test]
    fn test_blanket_impls_forward() {
        let detector = PrecomputedDetector::new(vec![region(0, 0, 5, 5, 0.5)]);
        let boxed: Box<dyn SignatureDetector> = Box::new(detector.clone());
        let shared = std::sync::Arc::new(detector);

        assert_eq!(boxed.detect(&white(10, 10), 0.2).unwrap().len(), 1);
        assert_eq!(shared.detect(&white(10, 10), 0.2).unwrap().len(), 1);
    }
}
