//! Region-to-pattern extraction
//!
//! For every detected region:
//! - crops the source image to the region
//! - resizes the crop to a fixed square canvas, ignoring aspect ratio, so
//!   shapes from differently sized detections share one scale
//! - converts to grayscale and runs Canny edge detection
//! - traces external contours on the edge map
//!
//! Regions whose edge map has no contours produce no pattern.

use super::{Contours, Pattern};
use crate::config::ExtractionConfig;
use crate::constants::extraction::{CANNY_APERTURE, CANNY_HIGH_THRESHOLD, CANNY_LOW_THRESHOLD, CROP_SIZE};
use crate::detection::Region;
use crate::error::{Result, VerificationError};
use crate::image_loader::load_image;
use opencv::{
    core::{AlgorithmHint, Mat, Point, Size},
    imgproc::{canny, cvt_color, find_contours, resize, CHAIN_APPROX_SIMPLE, COLOR_BGR2GRAY, INTER_LINEAR, RETR_EXTERNAL},
    prelude::*,
};
use std::path::Path;
use tracing::{debug, info, warn};

/// Result of extracting patterns from one image
#[derive(Debug)]
pub struct Extraction {
    /// Patterns in region order, at most one per region
    pub patterns: Vec<Pattern>,
    /// Regions handed to the extractor
    pub regions: Vec<Region>,
    /// True iff at least one region was supplied
    ///
    /// This does not depend on whether any pattern survived contour tracing;
    /// see [`Extraction::pattern_bearing`] for the stricter notion.
    pub detected: bool,
}

impl Extraction {
    /// True iff at least one pattern is available for scoring
    pub fn pattern_bearing(&self) -> bool {
        !self.patterns.is_empty()
    }
}

/// Pattern extractor with fixed crop size and Canny thresholds
#[derive(Debug, Clone, PartialEq)]
pub struct PatternExtractor {
    crop_size: i32,
    canny_low: f64,
    canny_high: f64,
    canny_aperture: i32,
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl PatternExtractor {
    /// Create an extractor with the reference parameters (224 px, 100/200)
    pub fn new() -> Self {
        Self {
            crop_size: CROP_SIZE,
            canny_low: CANNY_LOW_THRESHOLD,
            canny_high: CANNY_HIGH_THRESHOLD,
            canny_aperture: CANNY_APERTURE,
        }
    }

    /// Create an extractor with custom crop size and Canny thresholds
    pub fn with_params(crop_size: i32, canny_low: f64, canny_high: f64) -> Self {
        Self {
            crop_size,
            canny_low,
            canny_high,
            canny_aperture: CANNY_APERTURE,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            crop_size: config.crop_size,
            canny_low: config.canny_low,
            canny_high: config.canny_high,
            canny_aperture: config.canny_aperture,
        }
    }

    pub fn crop_size(&self) -> i32 {
        self.crop_size
    }

    /// Extract one pattern per region that yields at least one contour
    ///
    /// No confidence filtering happens here; every region is processed.
    /// The source image is not modified.
    pub fn extract(&self, image: &Mat, regions: &[Region]) -> Result<Extraction> {
        let mut patterns = Vec::with_capacity(regions.len());
        for region in regions {
            match self.pattern_for_region(image, region)? {
                Some(pattern) => patterns.push(pattern),
                None => debug!(?region, "Region produced no contours"),
            }
        }

        Ok(Extraction {
            patterns,
            regions: regions.to_vec(),
            detected: !regions.is_empty(),
        })
    }

    /// Load `path` and extract patterns from it
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::ImageLoadError`] naming `path` if the
    /// image cannot be decoded; no patterns are produced in that case.
    pub fn extract_path(&self, path: &Path, regions: &[Region]) -> Result<Extraction> {
        let image = load_image(path)?;
        let extraction = self.extract(&image, regions)?;
        info!(
            path = %path.display(),
            regions = extraction.regions.len(),
            patterns = extraction.patterns.len(),
            "Extracted signature patterns"
        );
        if !extraction.pattern_bearing() {
            warn!(path = %path.display(), "No signature patterns detected");
        }
        Ok(extraction)
    }

    /// Build the pattern for one region, if its edge map has contours
    pub fn pattern_for_region(&self, image: &Mat, region: &Region) -> Result<Option<Pattern>> {
        let Some(crop) = self.normalized_crop(image, region)? else {
            return Ok(None);
        };
        let contours = self.trace_contours(&crop)?;
        Ok(Pattern::new(*region, crop, contours))
    }

    /// Crop `region` out of `image` and resize it to the square canvas
    ///
    /// Returns `None` when the region does not overlap the image.
    fn normalized_crop(&self, image: &Mat, region: &Region) -> Result<Option<Mat>> {
        let Some(bounded) = Region::clamped(
            region.x1,
            region.y1,
            region.x2,
            region.y2,
            region.confidence,
            image.cols(),
            image.rows(),
        ) else {
            return Ok(None);
        };

        let roi = Mat::roi(image, bounded.rect())
            .map_err(|e| VerificationError::opencv("Region crop failed", e))?;
        let cropped = roi
            .try_clone()
            .map_err(|e| VerificationError::opencv("Region crop copy failed", e))?;

        let mut resized = Mat::default();
        resize(
            &cropped,
            &mut resized,
            Size::new(self.crop_size, self.crop_size),
            0.0,
            0.0,
            INTER_LINEAR,
        )
        .map_err(|e| VerificationError::opencv("Crop resize failed", e))?;

        Ok(Some(resized))
    }

    /// Canny edges of the grayscale crop, then external contours
    fn trace_contours(&self, crop: &Mat) -> Result<Contours> {
        let gray = if crop.channels() == 1 {
            crop.try_clone()
                .map_err(|e| VerificationError::opencv("Grayscale copy failed", e))?
        } else {
            let mut gray = Mat::default();
            cvt_color(crop, &mut gray, COLOR_BGR2GRAY, 0, AlgorithmHint::ALGO_HINT_DEFAULT)
                .map_err(|e| VerificationError::opencv("Grayscale conversion failed", e))?;
            gray
        };

        let mut edges = Mat::default();
        canny(&gray, &mut edges, self.canny_low, self.canny_high, self.canny_aperture, false)
            .map_err(|e| VerificationError::opencv("Canny edge detection failed", e))?;

        let mut contours = Contours::new();
        find_contours(&edges, &mut contours, RETR_EXTERNAL, CHAIN_APPROX_SIMPLE, Point::new(0, 0))
            .map_err(|e| VerificationError::opencv("Contour detection failed", e))?;

        Ok(contours)
    }
}
