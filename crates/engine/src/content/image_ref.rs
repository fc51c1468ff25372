use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImageRefError {
    #[error("image ref must not start with '/'")]
    LeadingSlash,
    #[error("image ref must not contain '\\\\'")]
    Backslash,
    #[error("image ref must not contain '..'")]
    ParentTraversal,
    #[error("image ref contains invalid character '{character}'")]
    InvalidCharacter { character: char },
    #[error("image ref must name a .png file")]
    NotPng,
}

/// Image refs are asset-root relative paths such as `pictures/floor.png`.
/// An empty ref means "no image" and is accepted.
pub(crate) fn validate_image_ref(image_ref: &str) -> Result<(), ImageRefError> {
    if image_ref.is_empty() {
        return Ok(());
    }
    if image_ref.starts_with('/') {
        return Err(ImageRefError::LeadingSlash);
    }
    if image_ref.contains('\\') {
        return Err(ImageRefError::Backslash);
    }
    if image_ref.contains("..") {
        return Err(ImageRefError::ParentTraversal);
    }
    for ch in image_ref.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '_' | '/' | '-' | '.') {
            continue;
        }
        return Err(ImageRefError::InvalidCharacter { character: ch });
    }
    let is_png = Path::new(image_ref)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
    if !is_png {
        return Err(ImageRefError::NotPng);
    }
    Ok(())
}

pub fn resolve_image_path(asset_root: &Path, image_ref: &str) -> Result<PathBuf, ImageRefError> {
    validate_image_ref(image_ref)?;
    Ok(asset_root.join(image_ref))
}
