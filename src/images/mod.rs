//! Image stage: locating source images, copying or resizing them into the
//! output dataset.
//!
//! This stage runs before label conversion and reports the dimensions the
//! image has in the output, so boxes are normalized against the image as
//! it is actually written.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use image::imageops::FilterType;
use image::DynamicImage;
use log::{debug, warn};
use walkdir::WalkDir;

use crate::coco::ImageId;
use crate::error::ConvertError;
use crate::yolo::ImageDims;

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "bmp", "webp", "tif", "tiff"];

/// Exact output resolution for resized images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResizeTarget {
    pub width: u32,
    pub height: u32,
}

impl ResizeTarget {
    pub fn dims(&self) -> ImageDims {
        ImageDims::new(self.width, self.height)
    }
}

impl FromStr for ResizeTarget {
    type Err = ConvertError;

    /// Parses `WIDTHxHEIGHT` or a single `SIZE` for a square target.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |message: String| ConvertError::InvalidResizeTarget { message };
        let parse = |raw: &str| {
            raw.trim()
                .parse::<u32>()
                .map_err(|_| invalid(format!("'{raw}' is not a positive integer")))
        };

        let (width, height) = match s.split_once(['x', 'X']) {
            Some((w, h)) => (parse(w)?, parse(h)?),
            None => {
                let side = parse(s)?;
                (side, side)
            }
        };

        if width == 0 || height == 0 {
            return Err(invalid(format!("{width}x{height} has a zero side")));
        }
        Ok(Self { width, height })
    }
}

/// What to do with each source image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ImageAction {
    /// Copy the file unchanged.
    Copy,
    /// Stretch to exactly the target size (no letterboxing).
    Resize(ResizeTarget),
}

/// Outcome of placing one image into the output dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacedImage {
    /// Dimensions of the written file, when they could be determined.
    pub on_disk: Option<ImageDims>,
    /// True if the file was resized to a [`ResizeTarget`].
    pub resized: bool,
}

/// Files found under the input image directory, keyed by relative path.
#[derive(Debug, Default)]
pub struct ImageDirIndex {
    root: PathBuf,
    by_rel: BTreeMap<String, PathBuf>,
    by_lower: BTreeMap<String, PathBuf>,
}

impl ImageDirIndex {
    /// Walks `root` recursively and records every image file.
    pub fn scan(root: &Path) -> Result<Self, ConvertError> {
        let mut by_rel = BTreeMap::new();
        let mut by_lower = BTreeMap::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|source| {
                ConvertError::Io(std::io::Error::other(format!(
                    "failed while traversing {}: {source}",
                    root.display()
                )))
            })?;

            if !entry.file_type().is_file() || !has_image_extension(entry.path()) {
                continue;
            }

            let rel = rel_string(root, entry.path());
            by_lower
                .entry(rel.to_lowercase())
                .or_insert_with(|| entry.path().to_path_buf());
            by_rel.insert(rel, entry.path().to_path_buf());
        }

        debug!("found {} image file(s) under {}", by_rel.len(), root.display());
        Ok(Self {
            root: root.to_path_buf(),
            by_rel,
            by_lower,
        })
    }

    /// Finds the file for a COCO `file_name`, falling back to a
    /// case-insensitive match.
    pub fn resolve(&self, file_name: &str) -> Option<&Path> {
        let key = file_name.replace('\\', "/");
        if let Some(path) = self.by_rel.get(&key) {
            return Some(path);
        }
        let found = self.by_lower.get(&key.to_lowercase())?;
        warn!(
            "'{}' matched '{}' only case-insensitively",
            file_name,
            found.display()
        );
        Some(found)
    }

    /// Where `file_name` would live if it existed, for error messages.
    pub fn expected_path(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name.replace('\\', "/"))
    }

    pub fn len(&self) -> usize {
        self.by_rel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_rel.is_empty()
    }

    /// Number of indexed files not in `used`.
    pub fn unreferenced(&self, used: &HashSet<PathBuf>) -> usize {
        self.by_rel.values().filter(|p| !used.contains(*p)).count()
    }
}

/// Copies or resizes `src` to `dst`, creating parent directories.
pub fn place_image(
    image_id: ImageId,
    src: &Path,
    dst: &Path,
    action: ImageAction,
) -> Result<PlacedImage, ConvertError> {
    let process_error = |message: String| ConvertError::ImageProcess {
        image_id,
        path: src.to_path_buf(),
        message,
    };

    if let Some(parent) = dst.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| process_error(format!("cannot create {}: {e}", parent.display())))?;
    }

    match action {
        ImageAction::Copy => {
            fs::copy(src, dst)
                .map_err(|e| process_error(format!("copy to {} failed: {e}", dst.display())))?;
            let on_disk = match probe_dimensions(dst) {
                Ok(dims) => Some(dims),
                Err(e) => {
                    debug!("could not read dimensions of {}: {e}", dst.display());
                    None
                }
            };
            Ok(PlacedImage {
                on_disk,
                resized: false,
            })
        }
        ImageAction::Resize(target) => {
            let decoded = image::open(src).map_err(|e| process_error(format!("decode failed: {e}")))?;
            let resized = decoded.resize_exact(target.width, target.height, FilterType::Triangle);
            let resized = if is_jpeg(dst) {
                // JPEG has no alpha channel.
                DynamicImage::ImageRgb8(resized.to_rgb8())
            } else {
                resized
            };
            resized
                .save(dst)
                .map_err(|e| process_error(format!("save to {} failed: {e}", dst.display())))?;
            Ok(PlacedImage {
                on_disk: Some(target.dims()),
                resized: true,
            })
        }
    }
}

/// Reads image dimensions from the file header without decoding pixels.
pub fn probe_dimensions(path: &Path) -> Result<ImageDims, imagesize::ImageError> {
    let size = imagesize::size(path)?;
    Ok(ImageDims::new(
        u32::try_from(size.width).unwrap_or(u32::MAX),
        u32::try_from(size.height).unwrap_or(u32::MAX),
    ))
}

fn has_image_extension(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    IMAGE_EXTENSIONS
        .iter()
        .any(|allowed| ext.eq_ignore_ascii_case(allowed))
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg"))
        .unwrap_or(false)
}

fn rel_string(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
