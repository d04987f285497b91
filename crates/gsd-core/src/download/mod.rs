//! Asset download: stream to a temp file, validate, move into place.
//!
//! The final filename only ever appears once the bytes have passed
//! validation, so a directory listing never shows truncated or bogus
//! assets and skip-existing can trust what it finds.

mod layout;
mod validate;

pub use layout::{asset_filename, dir_has_assets, extension_for_url, item_dir_name};
pub use validate::{validate_image_file, AssetPolicy, ValidationError};

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::fetch::{FetchError, Fetcher};

#[derive(Debug)]
pub struct Downloaded {
    pub path: PathBuf,
    pub bytes: u64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("rejected: {0}")]
    Invalid(#[from] ValidationError),
    #[error("could not move asset into place: {0}")]
    Finalize(std::io::Error),
}

/// Downloads `url` to `dest`, enforcing the asset policy. The transfer goes
/// through a `<dest>.part` sibling which is removed on any failure.
pub fn download_asset(
    fetcher: &Fetcher,
    url: &str,
    dest: &Path,
    policy: &AssetPolicy,
) -> Result<Downloaded, DownloadError> {
    let part = part_path(dest);
    let result = fetch_validate_rename(fetcher, url, dest, &part, policy);
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

fn fetch_validate_rename(
    fetcher: &Fetcher,
    url: &str,
    dest: &Path,
    part: &Path,
    policy: &AssetPolicy,
) -> Result<Downloaded, DownloadError> {
    let bytes = fetcher.fetch_to_path(url, part)?;
    let (width, height) = validate_image_file(part, policy)?;
    fs::rename(part, dest).map_err(DownloadError::Finalize)?;
    tracing::debug!(url, path = %dest.display(), bytes, width, height, "asset saved");
    Ok(Downloaded {
        path: dest.to_path_buf(),
        bytes,
        width,
        height,
    })
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest.as_os_str().to_owned();
    name.push(".part");
    PathBuf::from(name)
}
