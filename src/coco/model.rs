//! In-memory records loaded from a COCO document.
//!
//! Records are created once by the loader and never mutated afterwards.
//! Annotations refer to images and categories by id only.

use crate::geometry::{BBoxXYWH, Pixel};

use super::ids::{AnnotationId, CategoryId, ImageId};

/// Everything the converter needs from one COCO document.
#[derive(Clone, Debug, Default)]
pub struct Dataset {
    pub images: Vec<Image>,
    pub categories: Vec<Category>,
    pub annotations: Vec<Annotation>,
}

/// An image entry.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub id: ImageId,

    /// File name as written in the document, possibly with subdirectories.
    pub file_name: String,

    /// Declared width in pixels. Zero marks an unusable value.
    pub width: u32,

    /// Declared height in pixels. Zero marks an unusable value.
    pub height: u32,
}

impl Image {
    pub fn new(id: impl Into<ImageId>, file_name: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            file_name: file_name.into(),
            width,
            height,
        }
    }
}

/// A category (class label).
#[derive(Clone, Debug, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub supercategory: Option<String>,
}

impl Category {
    pub fn new(id: impl Into<CategoryId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            supercategory: None,
        }
    }
}

/// A bounding-box annotation.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    /// Position in the document's `annotations` array.
    pub index: usize,

    /// The `id` field, when the document carries one.
    pub id: Option<AnnotationId>,

    pub image_id: ImageId,
    pub category_id: CategoryId,
    pub bbox: BBoxXYWH<Pixel>,
}

impl Annotation {
    pub fn new(
        index: usize,
        image_id: impl Into<ImageId>,
        category_id: impl Into<CategoryId>,
        bbox: BBoxXYWH<Pixel>,
    ) -> Self {
        Self {
            index,
            id: None,
            image_id: image_id.into(),
            category_id: category_id.into(),
            bbox,
        }
    }

    pub fn with_id(mut self, id: impl Into<AnnotationId>) -> Self {
        self.id = Some(id.into());
        self
    }
}
