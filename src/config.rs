//! Configuration structures for the signature comparison pipeline.
//!
//! All tunable parameters are grouped by stage: detection, pattern
//! extraction and scoring. Defaults reproduce the reference behaviour, so a
//! deployment only needs to override what it changes.
//!
//! ```no_run
//! use sigverify::ComparisonConfig;
//! use std::path::Path;
//!
//! // Load from file (missing fields fall back to defaults)
//! let config = ComparisonConfig::from_json_file(Path::new("sigverify.json"))?;
//!
//! // Or use defaults
//! let config = ComparisonConfig::default();
//! # Ok::<(), sigverify::VerificationError>(())
//! ```

use crate::constants::{detection, extraction, scoring};
use crate::error::{Result, VerificationError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonConfig {
    /// Detector settings
    pub detection: DetectionConfig,

    /// Pattern extraction settings
    pub extraction: ExtractionConfig,

    /// Scoring settings
    pub scoring: ScoringConfig,
}

/// Detector parameters.
///
/// `confidence_threshold` is handed to every detector; the remaining fields
/// only matter to [`crate::detection::YoloDetector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// ONNX export of the signature model
    pub model_path: PathBuf,

    /// Minimum confidence for a region to be reported (0.0-1.0)
    pub confidence_threshold: f32,

    /// Square network input size in pixels
    pub input_size: i32,

    /// IoU threshold for non-maximum suppression (0.0-1.0)
    pub nms_threshold: f32,

    /// Number of classes in the model head
    pub class_count: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(detection::MODEL_PATH),
            confidence_threshold: detection::CONFIDENCE_THRESHOLD,
            input_size: detection::INPUT_SIZE,
            nms_threshold: detection::NMS_THRESHOLD,
            class_count: detection::CLASS_COUNT,
        }
    }
}

/// Pattern extraction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Side of the square canvas each crop is resized to
    pub crop_size: i32,

    /// Canny edge detection low threshold
    pub canny_low: f64,

    /// Canny edge detection high threshold
    pub canny_high: f64,

    /// Canny Sobel aperture (3, 5 or 7)
    pub canny_aperture: i32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            crop_size: extraction::CROP_SIZE,
            canny_low: extraction::CANNY_LOW_THRESHOLD,
            canny_high: extraction::CANNY_HIGH_THRESHOLD,
            canny_aperture: extraction::CANNY_APERTURE,
        }
    }
}

/// Hu-moment comparison method, mirroring OpenCV's `CONTOURS_MATCH_I*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShapeMatchMethod {
    I1,
    I2,
    #[default]
    I3,
}

impl ShapeMatchMethod {
    /// OpenCV constant for this method.
    pub fn opencv_flag(self) -> i32 {
        match self {
            ShapeMatchMethod::I1 => opencv::imgproc::CONTOURS_MATCH_I1,
            ShapeMatchMethod::I2 => opencv::imgproc::CONTOURS_MATCH_I2,
            ShapeMatchMethod::I3 => opencv::imgproc::CONTOURS_MATCH_I3,
        }
    }
}

/// Scoring parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Aggregate dissimilarity strictly below this means "same"
    pub similarity_threshold: f64,

    /// Shape distance used for each pair
    pub method: ShapeMatchMethod,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: scoring::SIMILARITY_THRESHOLD,
            method: ShapeMatchMethod::default(),
        }
    }
}

impl ComparisonConfig {
    /// Load configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            VerificationError::config(format!("Failed to read {}", path.display()), e)
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            VerificationError::config(format!("Failed to parse {}", path.display()), e)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file.
    pub fn to_json_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| VerificationError::config("Failed to serialize configuration", e))?;
        std::fs::write(path, json).map_err(|e| {
            VerificationError::config(format!("Failed to write {}", path.display()), e)
        })?;
        Ok(())
    }

    /// Reject parameter combinations the pipeline cannot run with.
    pub fn validate(&self) -> Result<()> {
        let d = &self.detection;
        if !(0.0..=1.0).contains(&d.confidence_threshold) {
            return Err(VerificationError::invalid_parameter(
                "detection.confidence_threshold",
                d.confidence_threshold,
            ));
        }
        if !(0.0..=1.0).contains(&d.nms_threshold) {
            return Err(VerificationError::invalid_parameter(
                "detection.nms_threshold",
                d.nms_threshold,
            ));
        }
        if d.input_size <= 0 {
            return Err(VerificationError::invalid_parameter("detection.input_size", d.input_size));
        }
        if d.class_count == 0 {
            return Err(VerificationError::invalid_parameter("detection.class_count", d.class_count));
        }

        let e = &self.extraction;
        if e.crop_size <= 0 {
            return Err(VerificationError::invalid_parameter("extraction.crop_size", e.crop_size));
        }
        if e.canny_low < 0.0 || e.canny_low > e.canny_high {
            return Err(VerificationError::invalid_parameter(
                "extraction.canny_low",
                format!("{} (high = {})", e.canny_low, e.canny_high),
            ));
        }
        if !matches!(e.canny_aperture, 3 | 5 | 7) {
            return Err(VerificationError::invalid_parameter(
                "extraction.canny_aperture",
                e.canny_aperture,
            ));
        }

        let s = &self.scoring;
        if !s.similarity_threshold.is_finite() || s.similarity_threshold < 0.0 {
            return Err(VerificationError::invalid_parameter(
                "scoring.similarity_threshold",
                s.similarity_threshold,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let config = ComparisonConfig::default();
        assert_eq!(config.detection.confidence_threshold, 0.2);
        assert_eq!(config.extraction.crop_size, 224);
        assert_eq!(config.extraction.canny_low, 100.0);
        assert_eq!(config.extraction.canny_high, 200.0);
        assert_eq!(config.scoring.similarity_threshold, 0.1);
        assert_eq!(config.scoring.method, ShapeMatchMethod::I3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let json = r#"{ "scoring": { "similarity_threshold": 0.25 } }"#;
        let config: ComparisonConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.scoring.similarity_threshold, 0.25);
        assert_eq!(config.scoring.method, ShapeMatchMethod::I3);
        assert_eq!(config.extraction, ExtractionConfig::default());
        assert_eq!(config.detection, DetectionConfig::default());
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ComparisonConfig::default();
        config.extraction.canny_low = 50.0;
        config.scoring.method = ShapeMatchMethod::I1;
        config.to_json_file(&path).unwrap();

        let loaded = ComparisonConfig::from_json_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = ComparisonConfig::from_json_file(Path::new("does/not/exist.json")).unwrap_err();
        assert!(matches!(err, VerificationError::ConfigError { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ComparisonConfig::default();
        config.detection.confidence_threshold = 1.5;
        assert!(matches!(
            config.validate(),
            Err(VerificationError::InvalidParameter { .. })
        ));

        let mut config = ComparisonConfig::default();
        config.extraction.canny_low = 300.0;
        assert!(config.validate().is_err());

        let mut config = ComparisonConfig::default();
        config.extraction.canny_aperture = 4;
        assert!(config.validate().is_err());

        let mut config = ComparisonConfig::default();
        config.scoring.similarity_threshold = f64::NAN;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_method_flags() {
        assert_eq!(ShapeMatchMethod::I3.opencv_flag(), opencv::imgproc::CONTOURS_MATCH_I3);
        assert_ne!(ShapeMatchMethod::I1.opencv_flag(), ShapeMatchMethod::I2.opencv_flag());
    }
}
