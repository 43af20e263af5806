//! Reference values for signature comparison
//!
//! These are the defaults behind [`crate::ComparisonConfig`]. Leaving a
//! configuration at its defaults reproduces the reference behaviour.

/// Detector invocation defaults
pub mod detection {
    /// Minimum detector confidence for a region to be reported
    pub const CONFIDENCE_THRESHOLD: f32 = 0.2;

    /// Square network input size of the YOLO signature model
    pub const INPUT_SIZE: i32 = 640;

    /// IoU above which overlapping boxes are suppressed
    pub const NMS_THRESHOLD: f32 = 0.45;

    /// The signature model predicts a single class
    pub const CLASS_COUNT: usize = 1;

    /// Label drawn next to annotated regions
    pub const CLASS_LABEL: &str = "signature";

    /// Default location of the exported signature model
    pub const MODEL_PATH: &str = "runs/detect/signature_detection_train_improved/weights/best.onnx";
}

/// Pattern extraction defaults
pub mod extraction {
    /// Side of the square canvas every crop is resized to
    pub const CROP_SIZE: i32 = 224;

    /// Canny hysteresis low threshold
    pub const CANNY_LOW_THRESHOLD: f64 = 100.0;

    /// Canny hysteresis high threshold
    pub const CANNY_HIGH_THRESHOLD: f64 = 200.0;

    /// Sobel aperture used by Canny
    pub const CANNY_APERTURE: i32 = 3;
}

/// Scoring defaults
pub mod scoring {
    /// Aggregate dissimilarity strictly below this counts as the same hand
    pub const SIMILARITY_THRESHOLD: f64 = 0.1;
}

/// Caller-visible status text when scoring is skipped
pub const NO_PATTERNS_MESSAGE: &str = "no detectable signature patterns";
