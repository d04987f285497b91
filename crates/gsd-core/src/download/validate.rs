//! Downloaded-asset validation.
//!
//! Blocked requests on this site come back as tiny HTML bodies or 1x1
//! placeholder images with a 200 status, so a byte-size floor alone is not
//! enough: the file must also decode as an image of plausible dimensions.

use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("file is {actual} bytes, below the {min} byte floor")]
    TooSmall { actual: u64, min: u64 },
    #[error("not a decodable image: {0}")]
    Undecodable(String),
    #[error("image is {width}x{height}, below the {min_width}x{min_height} floor")]
    TinyDimensions {
        width: u32,
        height: u32,
        min_width: u32,
        min_height: u32,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Size floors a downloaded asset must clear.
#[derive(Debug, Clone, Copy)]
pub struct AssetPolicy {
    pub min_bytes: u64,
    pub min_width: u32,
    pub min_height: u32,
}

impl AssetPolicy {
    pub fn from_config(cfg: &crate::config::GsdConfig) -> Self {
        Self {
            min_bytes: cfg.min_asset_bytes,
            min_width: cfg.min_width,
            min_height: cfg.min_height,
        }
    }
}

/// Checks the file at `path` against the policy. Dimensions are read from
/// the image header; the pixel data is never fully decoded. Returns
/// `(width, height)` on success.
pub fn validate_image_file(path: &Path, policy: &AssetPolicy) -> Result<(u32, u32), ValidationError> {
    let len = std::fs::metadata(path)?.len();
    if len < policy.min_bytes {
        return Err(ValidationError::TooSmall {
            actual: len,
            min: policy.min_bytes,
        });
    }

    let reader = image::ImageReader::open(path)?.with_guessed_format()?;
    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| ValidationError::Undecodable(e.to_string()))?;
    if width < policy.min_width || height < policy.min_height {
        return Err(ValidationError::TinyDimensions {
            width,
            height,
            min_width: policy.min_width,
            min_height: policy.min_height,
        });
    }
    Ok((width, height))
}
