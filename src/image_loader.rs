//! Image loading into OpenCV rasters
//!
//! Document scans and photos are decoded with the `image` crate and handed
//! to the rest of the pipeline as 8-bit BGR `Mat`s, the layout OpenCV and the
//! detector expect.

use crate::error::{Result, VerificationError};
use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder};
use opencv::core::{Mat, Scalar, CV_8UC3};
use opencv::prelude::*;
use std::path::Path;
use tracing::debug;

/// Load an image from disk as an OpenCV BGR `Mat`
///
/// The format is recognised from the file content, so the extension is not
/// consulted. An EXIF orientation tag, when present, is applied so the
/// raster comes out upright.
///
/// # Errors
///
/// Returns [`VerificationError::ImageLoadError`] naming `path` if the file
/// cannot be opened or decoding fails.
pub fn load_image(path: &Path) -> Result<Mat> {
    let reader = image::ImageReader::open(path)
        .map_err(|e| VerificationError::image_load(path, "Failed to open image file", e))?
        .with_guessed_format()
        .map_err(|e| VerificationError::image_load(path, "Failed to read image header", e))?;
    let mut decoder = reader
        .into_decoder()
        .map_err(|e| VerificationError::image_load(path, "Unrecognised image format", e))?;
    let orientation = decoder.orientation().unwrap_or_else(|e| {
        debug!(path = %path.display(), error = %e, "Unreadable orientation tag, keeping stored layout");
        Orientation::NoTransforms
    });
    let img = DynamicImage::from_decoder(decoder)
        .map_err(|e| VerificationError::image_load(path, "Failed to decode image", e))?;

    let rgb = upright(img, orientation).to_rgb8();
    let (width, height) = rgb.dimensions();
    rgb_to_bgr_mat(rgb.as_raw(), width as i32, height as i32)
        .map_err(|e| VerificationError::image_load(path, "Failed to build raster", e))
}

/// Apply an EXIF orientation to a decoded image
fn upright(mut img: DynamicImage, orientation: Orientation) -> DynamicImage {
    if orientation != Orientation::NoTransforms {
        debug!(?orientation, "Applying EXIF orientation");
        img.apply_orientation(orientation);
    }
    img
}

/// Convert a packed RGB buffer into a BGR `Mat`
pub(crate) fn rgb_to_bgr_mat(rgb_data: &[u8], width: i32, height: i32) -> opencv::Result<Mat> {
    let mut mat = Mat::new_rows_cols_with_default(height, width, CV_8UC3, Scalar::all(0.0))?;
    let bgr = mat.data_bytes_mut()?;
    for (dst, src) in bgr.chunks_exact_mut(3).zip(rgb_data.chunks_exact(3)) {
        dst[0] = src[2];
        dst[1] = src[1];
        dst[2] = src[0];
    }
    Ok(mat)
}
