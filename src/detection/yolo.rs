//! YOLO signature detector over OpenCV's DNN module
//!
//! Runs an ONNX export of the YOLOv8 signature model. The network is loaded
//! once when the detector is built and reused for every image.
//!
//! Pages are letterboxed into the square network input: resized so the
//! longer side equals `input_size`, aspect ratio kept, and padded on both
//! sides with grey (114), the same preparation the model was trained with.
//!
//! Output layout is `[1, 4 + classes, anchors]`: per anchor a box centre,
//! width and height in network-input pixels followed by one score per class.

use super::{check_threshold, Region, SignatureDetector};
use crate::config::DetectionConfig;
use crate::error::{Result, VerificationError};
use opencv::{
    core::{copy_make_border, Mat, Rect, Scalar, Size, Vector, BORDER_CONSTANT, CV_32F},
    dnn::{self, Net},
    imgproc::{resize, INTER_LINEAR},
    prelude::*,
};
use std::path::Path;
use std::sync::Mutex;
use tracing::debug;

/// Raw candidate box before non-maximum suppression
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub rect: Rect,
    pub score: f32,
}

/// YOLO-based [`SignatureDetector`]
pub struct YoloDetector {
    // `Net::forward` needs `&mut`, detection only has `&self`
    net: Mutex<Net>,
    input_size: i32,
    nms_threshold: f32,
    class_count: usize,
}

impl std::fmt::Debug for YoloDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("YoloDetector")
            .field("net", &"<Net>")
            .field("input_size", &self.input_size)
            .field("nms_threshold", &self.nms_threshold)
            .field("class_count", &self.class_count)
            .finish()
    }
}

impl YoloDetector {
    /// Load the model named by `config.model_path`
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError::DetectorError`] if the file is missing or
    /// OpenCV cannot parse it.
    pub fn from_config(config: &DetectionConfig) -> Result<Self> {
        Self::load(&config.model_path, config.input_size, config.nms_threshold, config.class_count)
    }

    /// Load an ONNX model with explicit parameters
    pub fn load(model_path: &Path, input_size: i32, nms_threshold: f32, class_count: usize) -> Result<Self> {
        if !model_path.exists() {
            return Err(VerificationError::DetectorError {
                message: format!("Model file not found at {}", model_path.display()),
                source: None,
            });
        }
        let path_str = model_path.to_str().ok_or_else(|| VerificationError::DetectorError {
            message: format!("Model path is not valid UTF-8: {}", model_path.display()),
            source: None,
        })?;

        let net = dnn::read_net_from_onnx(path_str).map_err(|e| {
            VerificationError::detector(format!("Failed to load model {}", model_path.display()), e)
        })?;
        debug!(model = %model_path.display(), input_size, "Loaded signature model");

        Ok(Self {
            net: Mutex::new(net),
            input_size,
            nms_threshold,
            class_count,
        })
    }

    /// Letterbox `image` into the network input
    fn prepare(&self, image: &Mat, letterbox: &Letterbox) -> Result<Mat> {
        let mut resized = Mat::default();
        resize(
            image,
            &mut resized,
            Size::new(letterbox.width, letterbox.height),
            0.0,
            0.0,
            INTER_LINEAR,
        )
        .map_err(|e| VerificationError::detector("Input resize failed", e))?;

        let right = self.input_size - letterbox.width - letterbox.pad_left;
        let bottom = self.input_size - letterbox.height - letterbox.pad_top;
        let mut padded = Mat::default();
        copy_make_border(
            &resized,
            &mut padded,
            letterbox.pad_top,
            bottom,
            letterbox.pad_left,
            right,
            BORDER_CONSTANT,
            Scalar::all(LETTERBOX_FILL),
        )
        .map_err(|e| VerificationError::detector("Input padding failed", e))?;
        Ok(padded)
    }

    fn forward(&self, input: &Mat) -> Result<Mat> {
        let blob = dnn::blob_from_image(
            input,
            1.0 / 255.0,
            Size::new(self.input_size, self.input_size),
            Scalar::default(),
            true,
            false,
            CV_32F,
        )
        .map_err(|e| VerificationError::detector("Input blob creation failed", e))?;

        let mut net = self.net.lock().map_err(|_| VerificationError::DetectorError {
            message: "Detector state poisoned by an earlier panic".to_string(),
            source: None,
        })?;
        net.set_input(&blob, "", 1.0, Scalar::default())
            .map_err(|e| VerificationError::detector("Setting network input failed", e))?;
        net.forward_single("")
            .map_err(|e| VerificationError::detector("Forward pass failed", e))
    }
}

impl SignatureDetector for YoloDetector {
    fn detect(&self, image: &Mat, confidence_threshold: f32) -> Result<Vec<Region>> {
        check_threshold(confidence_threshold)?;
        if image.empty() {
            return Err(VerificationError::DetectorError {
                message: "Cannot run detection on an empty image".to_string(),
                source: None,
            });
        }
        let letterbox = Letterbox::fit(image.cols(), image.rows(), self.input_size);
        let input = self.prepare(image, &letterbox)?;
        let output = self.forward(&input)?;
        let data = output
            .data_typed::<f32>()
            .map_err(|e| VerificationError::detector("Unexpected network output layout", e))?;

        let candidates = decode_predictions(data, self.class_count, confidence_threshold, &letterbox)?;
        let kept = suppress_overlaps(&candidates, confidence_threshold, self.nms_threshold)?;

        let regions: Vec<Region> = kept
            .iter()
            .filter_map(|c| {
                Region::clamped(
                    c.rect.x,
                    c.rect.y,
                    c.rect.x + c.rect.width,
                    c.rect.y + c.rect.height,
                    c.score,
                    image.cols(),
                    image.rows(),
                )
            })
            .collect();
        debug!(candidates = candidates.len(), regions = regions.len(), "YOLO detection finished");
        Ok(regions)
    }
}

/// Grey used for letterbox padding
const LETTERBOX_FILL: f64 = 114.0;

/// Placement of a source image inside the square network input
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    /// Source-to-input scale factor, equal on both axes
    pub scale: f32,
    /// Resized image size inside the input
    pub width: i32,
    pub height: i32,
    /// Padding before the resized image
    pub pad_left: i32,
    pub pad_top: i32,
}

impl Letterbox {
    /// Fit a `width`×`height` image into an `input_size` square
    pub fn fit(width: i32, height: i32, input_size: i32) -> Self {
        let side = input_size as f32;
        let scale = (side / width.max(1) as f32).min(side / height.max(1) as f32);
        let resized_w = ((width as f32 * scale).round() as i32).clamp(1, input_size);
        let resized_h = ((height as f32 * scale).round() as i32).clamp(1, input_size);
        Self {
            scale,
            width: resized_w,
            height: resized_h,
            pad_left: (input_size - resized_w) / 2,
            pad_top: (input_size - resized_h) / 2,
        }
    }

    /// Map a box from network-input pixels back to source pixels
    pub fn to_source(&self, x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(
            ((x - self.pad_left as f32) / self.scale).round() as i32,
            ((y - self.pad_top as f32) / self.scale).round() as i32,
            (w / self.scale).round() as i32,
            (h / self.scale).round() as i32,
        )
    }
}

/// Turn a flat `[4 + classes, anchors]` prediction buffer into scored boxes
///
/// Boxes are mapped back to source pixels through `letterbox`. Anchors whose
/// best class score is below `confidence_threshold` are dropped.
pub fn decode_predictions(
    data: &[f32],
    class_count: usize,
    confidence_threshold: f32,
    letterbox: &Letterbox,
) -> Result<Vec<Candidate>> {
    let channels = 4 + class_count;
    if data.len() % channels != 0 {
        return Err(VerificationError::DetectorError {
            message: format!(
                "Prediction buffer of {} values does not split into {} channels",
                data.len(),
                channels
            ),
            source: None,
        });
    }
    let anchors = data.len() / channels;

    let mut candidates = Vec::new();
    for i in 0..anchors {
        let score = (0..class_count)
            .map(|k| data[(4 + k) * anchors + i])
            .fold(f32::MIN, f32::max);
        if score < confidence_threshold {
            continue;
        }

        let cx = data[i];
        let cy = data[anchors + i];
        let w = data[2 * anchors + i];
        let h = data[3 * anchors + i];
        let rect = letterbox.to_source(cx - w / 2.0, cy - h / 2.0, w, h);
        candidates.push(Candidate { rect, score });
    }
    Ok(candidates)
}

/// Non-maximum suppression, highest score first
pub fn suppress_overlaps(candidates: &[Candidate], confidence_threshold: f32, nms_threshold: f32) -> Result<Vec<Candidate>> {
    if candidates.is_empty() {
        return Ok(Vec::new());
    }
    let boxes: Vector<Rect> = candidates.iter().map(|c| c.rect).collect();
    let scores: Vector<f32> = candidates.iter().map(|c| c.score).collect();
    let mut indices = Vector::<i32>::new();
    dnn::nms_boxes(&boxes, &scores, confidence_threshold, nms_threshold, &mut indices, 1.0, 0)
        .map_err(|e| VerificationError::detector("Non-maximum suppression failed", e))?;

    Ok(indices
        .iter()
        .filter_map(|i| candidates.get(i as usize).copied())
        .collect())
}
