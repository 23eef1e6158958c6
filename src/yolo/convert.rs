//! COCO pixel box → YOLO normalized box.

use crate::coco::{Annotation, Image, ImageId};
use crate::error::ConvertError;
use crate::geometry::{BBoxCXCYWH, BBoxXYWH, Normalized, Pixel};

use super::classes::CategoryMap;

/// Pixel dimensions an annotation is normalized against.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageDims {
    pub width: u32,
    pub height: u32,
}

impl ImageDims {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The dimensions declared by a COCO image entry.
    pub fn of(image: &Image) -> Self {
        Self::new(image.width, image.height)
    }

    /// Rejects zero width or height.
    pub fn validate(self, image_id: ImageId) -> Result<Self, ConvertError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConvertError::InvalidImageDimensions {
                image_id,
                width: self.width,
                height: self.height,
            });
        }
        Ok(self)
    }

    /// Horizontal and vertical factors taking `self` to `to`.
    pub fn scale_to(self, to: ImageDims) -> (f64, f64) {
        (
            to.width as f64 / self.width as f64,
            to.height as f64 / self.height as f64,
        )
    }
}

/// One converted annotation, ready to be written as a label row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct YoloBox {
    pub class_index: usize,
    pub bbox: BBoxCXCYWH<Normalized>,
}

/// Normalizes a pixel box against `dims` and clamps every field to `[0, 1]`.
///
/// `dims` must be non-zero; [`convert_annotation`] checks that first.
pub fn convert_bbox(bbox: &BBoxXYWH<Pixel>, dims: ImageDims) -> BBoxCXCYWH<Normalized> {
    bbox.to_normalized_cxcywh(dims.width as f64, dims.height as f64)
        .clamped()
}

/// Converts one annotation of the image with id `image_id` and size `dims`.
///
/// # Errors
/// `InvalidImageDimensions` for a zero-sized image, `UnknownCategory` when
/// the category id has no class index.
pub fn convert_annotation(
    annotation: &Annotation,
    image_id: ImageId,
    dims: ImageDims,
    categories: &CategoryMap,
) -> Result<YoloBox, ConvertError> {
    let dims = dims.validate(image_id)?;

    let class_index = categories.class_index(annotation.category_id).ok_or(
        ConvertError::UnknownCategory {
            annotation: annotation.index,
            annotation_id: annotation.id,
            category_id: annotation.category_id,
        },
    )?;

    Ok(YoloBox {
        class_index,
        bbox: convert_bbox(&annotation.bbox, dims),
    })
}
