//! Icon resolution and icon file ingest.
//!
//! Resolution is a three-tier precedence chain evaluated once, at item
//! creation: the subcategory's stored icon wins over the static default
//! table, which wins over the generic fallback. Later catalog edits do not
//! re-resolve item icons except through the subcategory rename cascade.
//!
//! Ingest accepts raw uploaded bytes and returns a stored icon reference.
//! Decoding/resizing is outside this crate's scope — the blob is sniffed for
//! a known image container and written as-is under a fresh filename.

use std::fs;
use std::path::Path;

use thiserror::Error;
use uuid::Uuid;

use crate::defaults::{CatalogDefaults, GENERIC_ICON};

/// Failure to turn uploaded bytes into a stored icon reference.
///
/// Call sites differ in tolerance: item and subcategory *creation* recover
/// to the generic icon, while an explicit icon *replacement* surfaces the
/// failure to the caller.
#[derive(Debug, Error)]
pub enum IconError {
    /// The payload was empty.
    #[error("icon payload is empty")]
    Empty,
    /// The payload does not start with a known image container signature.
    #[error("unrecognized image format")]
    UnrecognizedFormat,
    /// Writing the icon file failed.
    #[error("failed to write icon file: {0}")]
    Io(#[from] std::io::Error),
}

/// Resolves the icon reference for an item from its subcategory slug.
///
/// Precedence, first match wins:
/// 1. the subcategory's stored icon, when present and non-empty;
/// 2. the static slug→icon default table;
/// 3. the generic fallback.
///
/// `stored_icon` is the icon column of the subcategory record matching the
/// slug, if one exists — the caller performs that lookup so this chain stays
/// pure.
#[must_use]
pub fn resolve_icon(
    stored_icon: Option<&str>,
    defaults: &CatalogDefaults,
    slug: &str,
) -> String {
    if let Some(icon) = stored_icon {
        if !icon.is_empty() {
            return icon.to_string();
        }
    }
    defaults
        .icon_for(slug)
        .unwrap_or(GENERIC_ICON)
        .to_string()
}

/// Sniffs the image container from the payload's magic bytes.
fn sniff_extension(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Stores uploaded icon bytes and returns the stored reference (filename).
///
/// The payload is verified to be a known image container and written under a
/// fresh UUID filename in `dir`, which is created if missing.
///
/// # Errors
///
/// Returns [`IconError`] when the payload is empty, unrecognized, or the
/// write fails.
pub fn store_icon(bytes: &[u8], dir: &Path) -> Result<String, IconError> {
    if bytes.is_empty() {
        return Err(IconError::Empty);
    }
    let ext = sniff_extension(bytes).ok_or(IconError::UnrecognizedFormat)?;

    fs::create_dir_all(dir)?;

    let filename = format!("{}.{ext}", Uuid::new_v4());
    fs::write(dir.join(&filename), bytes)?;
    Ok(filename)
}
