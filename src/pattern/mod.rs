//! Shape patterns derived from detected signature regions

pub mod extractor;

pub use extractor::{Extraction, PatternExtractor};

use crate::detection::Region;
use opencv::core::{Mat, Point, Vector};

/// One contour: boundary points of a connected edge structure
pub type Contour = Vector<Point>;

/// Ordered contour collection as returned by `find_contours`
pub type Contours = Vector<Contour>;

/// Comparable shape representation of one detected region
///
/// Holds the normalised crop and its external contours. A pattern always has
/// at least one contour.
#[derive(Debug)]
pub struct Pattern {
    region: Region,
    crop: Mat,
    contours: Contours,
    representative: Contour,
}

impl Pattern {
    /// Assemble a pattern, or `None` when `contours` is empty
    pub fn new(region: Region, crop: Mat, contours: Contours) -> Option<Self> {
        let representative = contours.get(0).ok()?;
        Some(Self {
            region,
            crop,
            contours,
            representative,
        })
    }

    /// Region the pattern was cut from
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Square BGR crop the contours were traced on
    pub fn crop(&self) -> &Mat {
        &self.crop
    }

    /// All external contours in extraction order
    pub fn contours(&self) -> &Contours {
        &self.contours
    }

    /// First contour in extraction order
    ///
    /// Scoring compares patterns through this single contour only.
    pub fn representative_contour(&self) -> &Contour {
        &self.representative
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region() -> Region {
        Region { x1: 0, y1: 0, x2: 10, y2: 10, confidence: 0.9 }
    }

    #[test]
    fn test_pattern_requires_a_contour() {
        assert!(Pattern::new(region(), Mat::default(), Contours::new()).is_none());
    }

    #[test]
    fn test_representative_is_first_contour() {
        let first: Contour = [Point::new(1, 1), Point::new(5, 1), Point::new(5, 5)].into_iter().collect();
        let second: Contour = [Point::new(7, 7), Point::new(9, 7)].into_iter().collect();
        let contours: Contours = [first.clone(), second].into_iter().collect();

        let pattern = Pattern::new(region(), Mat::default(), contours).unwrap();
        assert_eq!(pattern.contours().len(), 2);
        assert_eq!(pattern.representative_contour().to_vec(), first.to_vec());
        assert_eq!(pattern.region().confidence, 0.9);
    }
}
