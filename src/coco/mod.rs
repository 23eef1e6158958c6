//! COCO JSON loader.
//!
//! Parses a COCO detection document into [`Dataset`] records. Only the
//! fields the conversion needs are read; `info`, `licenses`, segmentation,
//! `area`, `iscrowd` and any other extra fields are accepted and ignored.
//!
//! COCO bounding boxes use `[x, y, width, height]` where `(x, y)` is the
//! top-left corner in absolute pixels.
//!
//! # Example
//!
//! ```
//! use coco2yolo::coco::from_coco_str;
//!
//! let dataset = from_coco_str(r#"{
//!     "images": [{"id": 1, "file_name": "a.jpg", "width": 100, "height": 200}],
//!     "categories": [{"id": 3, "name": "dog"}],
//!     "annotations": [{"image_id": 1, "category_id": 3, "bbox": [10, 20, 30, 40]}]
//! }"#)?;
//! assert_eq!(dataset.annotations[0].bbox.to_xywh(), (10.0, 20.0, 30.0, 40.0));
//! # Ok::<(), serde_json::Error>(())
//! ```

mod ids;
mod index;
mod model;

pub use ids::{AnnotationId, CategoryId, ImageId};
pub use index::DatasetIndex;
pub use model::{Annotation, Category, Dataset, Image};

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::error::ConvertError;
use crate::geometry::{BBoxXYWH, Pixel};

// ============================================================================
// COCO schema (internal to this module)
// ============================================================================

/// Top-level document. All three collections are required.
#[derive(Debug, Deserialize)]
struct CocoDocument {
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Deserialize)]
struct CocoImage {
    id: u64,
    file_name: String,
    // Some exporters write floats or negative numbers here; keep the raw
    // number and decide validity per image.
    width: f64,
    height: f64,
}

#[derive(Debug, Deserialize)]
struct CocoCategory {
    id: u64,
    name: String,

    #[serde(default)]
    supercategory: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CocoAnnotation {
    #[serde(default)]
    id: Option<u64>,
    image_id: u64,
    category_id: u64,

    /// `[x, y, width, height]` with `(x, y)` the top-left corner.
    bbox: [f64; 4],
}

// ============================================================================
// Public API
// ============================================================================

/// Reads a dataset from a COCO JSON file.
///
/// # Errors
/// `Io` if the file cannot be opened, `MalformedInput` if it is not valid
/// JSON or lacks one of `images`, `annotations`, `categories`.
pub fn read_coco_json(path: &Path) -> Result<Dataset, ConvertError> {
    let file = File::open(path).map_err(ConvertError::Io)?;
    let reader = BufReader::new(file);

    let document: CocoDocument =
        serde_json::from_reader(reader).map_err(|source| ConvertError::MalformedInput {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(document_to_dataset(document))
}

/// Reads a dataset from a COCO JSON string.
pub fn from_coco_str(json: &str) -> Result<Dataset, serde_json::Error> {
    let document: CocoDocument = serde_json::from_str(json)?;
    Ok(document_to_dataset(document))
}

/// Reads a dataset from raw COCO JSON bytes.
pub fn from_coco_slice(bytes: &[u8]) -> Result<Dataset, serde_json::Error> {
    let document: CocoDocument = serde_json::from_slice(bytes)?;
    Ok(document_to_dataset(document))
}

// ============================================================================
// Conversion: schema -> records
// ============================================================================

fn document_to_dataset(document: CocoDocument) -> Dataset {
    let images = document
        .images
        .into_iter()
        .map(|img| Image {
            id: ImageId::new(img.id),
            file_name: img.file_name,
            width: dimension_from_raw(img.width),
            height: dimension_from_raw(img.height),
        })
        .collect();

    let categories = document
        .categories
        .into_iter()
        .map(|cat| Category {
            id: CategoryId::new(cat.id),
            name: cat.name,
            supercategory: cat.supercategory,
        })
        .collect();

    let annotations = document
        .annotations
        .into_iter()
        .enumerate()
        .map(|(index, ann)| {
            let [x, y, w, h] = ann.bbox;
            Annotation {
                index,
                id: ann.id.map(AnnotationId::new),
                image_id: ImageId::new(ann.image_id),
                category_id: CategoryId::new(ann.category_id),
                bbox: BBoxXYWH::<Pixel>::from_xywh(x, y, w, h),
            }
        })
        .collect();

    Dataset {
        images,
        categories,
        annotations,
    }
}

/// Maps a raw JSON dimension to pixels. Negative and non-finite values
/// become 0, which the converter rejects per image.
fn dimension_from_raw(raw: f64) -> u32 {
    if raw.is_finite() && raw > 0.0 {
        // Saturating float-to-int cast.
        raw as u32
    } else {
        0
    }
}

// ============================================================================
// Tests
// ============================================================================
