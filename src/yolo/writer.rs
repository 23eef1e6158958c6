//! Label file naming, formatting and writing.
//!
//! A label file pairs with its image by name alone: same relative path and
//! stem, `.txt` extension. Rows are `<class> <cx> <cy> <w> <h>` with six
//! fixed decimals, each row newline-terminated.

use std::fmt::Write as _;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::debug;

use crate::coco::Image;
use crate::error::ConvertError;
use crate::split::Split;

use super::classes::CategoryMap;
use super::convert::YoloBox;

pub const LABEL_EXTENSION: &str = "txt";

/// Label path for an image file name, relative to a labels directory.
pub fn label_relative_path(image: &Image) -> Result<PathBuf, ConvertError> {
    Ok(image_relative_path(image)?.with_extension(LABEL_EXTENSION))
}

/// The image file name as a relative path.
///
/// Subdirectories are kept and backslashes read as separators. Names that
/// are empty, absolute or contain `..` are rejected so neither the image
/// nor its label can land outside the output directory.
pub fn image_relative_path(image: &Image) -> Result<PathBuf, ConvertError> {
    let invalid = || ConvertError::InvalidFileName {
        image_id: image.id,
        file_name: image.file_name.clone(),
    };

    let normalized = image.file_name.replace('\\', "/");
    let mut rel = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(invalid())
            }
        }
    }

    if rel.file_stem().is_none() {
        return Err(invalid());
    }
    Ok(rel)
}

/// One label row, without the trailing newline.
pub fn format_label_line(yolo: &YoloBox) -> String {
    let (cx, cy, w, h) = yolo.bbox.to_cxcywh();
    format!("{} {:.6} {:.6} {:.6} {:.6}", yolo.class_index, cx, cy, w, h)
}

/// Full label file content; empty for an image without boxes.
pub fn format_label_file(boxes: &[YoloBox]) -> String {
    let mut out = String::with_capacity(boxes.len() * 48);
    for yolo in boxes {
        // Writing to a String cannot fail.
        let _ = writeln!(out, "{}", format_label_line(yolo));
    }
    out
}

/// Writes the label file of `image` under `labels_dir` and returns its path.
///
/// Parent directories are created as needed. Each call touches only its own
/// file, so a failure leaves labels written earlier intact.
pub fn write_label_file(
    labels_dir: &Path,
    image: &Image,
    boxes: &[YoloBox],
) -> Result<PathBuf, ConvertError> {
    let path = labels_dir.join(label_relative_path(image)?);
    let write_error = |source| ConvertError::OutputWrite {
        image_id: image.id,
        path: path.clone(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(&path, format_label_file(boxes)).map_err(write_error)?;

    debug!("wrote {} box(es) to {}", boxes.len(), path.display());
    Ok(path)
}

/// Writes the Ultralytics `data.yaml` for the given splits.
pub fn write_data_yaml(
    output_root: &Path,
    splits: &[Split],
    categories: &CategoryMap,
) -> Result<PathBuf, ConvertError> {
    let root = fs::canonicalize(output_root).unwrap_or_else(|_| output_root.to_path_buf());

    let mut yaml = format!("path: {}\n", yaml_single_quoted(&root.to_string_lossy()));
    for split in [Split::Train, Split::Val, Split::Test] {
        if splits.contains(&split) {
            yaml.push_str(&format!("{}: images/{}\n", split.dir_name(), split.dir_name()));
        } else {
            yaml.push_str(&format!("{}:\n", split.dir_name()));
        }
    }

    yaml.push_str(&format!("\nnc: {}\nnames:\n", categories.len()));
    for (idx, name) in categories.names().iter().enumerate() {
        yaml.push_str(&format!("  {}: {}\n", idx, yaml_single_quoted(name)));
    }

    let path = output_root.join("data.yaml");
    fs::write(&path, yaml).map_err(ConvertError::Io)?;
    Ok(path)
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}
