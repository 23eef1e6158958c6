use std::path::PathBuf;
use thiserror::Error;

use crate::coco::{AnnotationId, CategoryId, ImageId};
use crate::pipeline::RunReport;

/// The main error type for coco2yolo operations.
///
/// Variants fall into two groups. Document-level failures (`Io`,
/// `MalformedInput`, `InvalidSplit`, ...) abort the run. Per-record
/// failures (`UnknownCategory`, `InvalidImageDimensions`, `OutputWrite`,
/// ...) are caught by the pipeline, recorded in the run report and skipped.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed COCO input {path}: {source}")]
    MalformedInput {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Annotation #{annotation}{} references unknown category {category_id}", fmt_annotation_id(.annotation_id))]
    UnknownCategory {
        annotation: usize,
        annotation_id: Option<AnnotationId>,
        category_id: CategoryId,
    },

    #[error("Image {image_id} has invalid dimensions {width}x{height}")]
    InvalidImageDimensions {
        image_id: ImageId,
        width: u32,
        height: u32,
    },

    #[error("Image {image_id} has unusable file name '{file_name}'")]
    InvalidFileName { image_id: ImageId, file_name: String },

    #[error("Image {image_id} not found at {path}")]
    MissingImage { image_id: ImageId, path: PathBuf },

    #[error("Failed to process image {image_id} ({path}): {message}")]
    ImageProcess {
        image_id: ImageId,
        path: PathBuf,
        message: String,
    },

    #[error("Image {image_id} maps to label file {path}, already written for another image")]
    DuplicateFileName { image_id: ImageId, path: PathBuf },

    #[error("Failed to write label file for image {image_id} to {path}: {source}")]
    OutputWrite {
        image_id: ImageId,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid split ratios: {message}")]
    InvalidSplit { message: String },

    #[error("Invalid resize target: {message}")]
    InvalidResizeTarget { message: String },

    #[error("No images were converted")]
    NothingConverted { report: Box<RunReport> },

    #[error("{count} record(s) were skipped (strict mode)")]
    SkippedRecords {
        count: usize,
        report: Box<RunReport>,
    },
}

fn fmt_annotation_id(id: &Option<AnnotationId>) -> String {
    match id {
        Some(id) => format!(" (id {id})"),
        None => String::new(),
    }
}

impl ConvertError {
    /// The run report carried by run-level failures.
    pub fn report(&self) -> Option<&RunReport> {
        match self {
            ConvertError::NothingConverted { report }
            | ConvertError::SkippedRecords { report, .. } => Some(report.as_ref()),
            _ => None,
        }
    }

    /// Returns true for failures that only affect a single record.
    pub fn is_per_record(&self) -> bool {
        matches!(
            self,
            ConvertError::UnknownCategory { .. }
                | ConvertError::InvalidImageDimensions { .. }
                | ConvertError::InvalidFileName { .. }
                | ConvertError::MissingImage { .. }
                | ConvertError::ImageProcess { .. }
                | ConvertError::OutputWrite { .. }
                | ConvertError::DuplicateFileName { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_category_message_names_the_annotation() {
        let err = ConvertError::UnknownCategory {
            annotation: 4,
            annotation_id: Some(AnnotationId::new(17)),
            category_id: CategoryId::new(99),
        };
        assert_eq!(
            err.to_string(),
            "Annotation #4 (id 17) references unknown category 99"
        );

        let err = ConvertError::UnknownCategory {
            annotation: 0,
            annotation_id: None,
            category_id: CategoryId::new(5),
        };
        assert_eq!(err.to_string(), "Annotation #0 references unknown category 5");
    }

    #[test]
    fn per_record_classification() {
        assert!(ConvertError::MissingImage {
            image_id: ImageId::new(1),
            path: PathBuf::from("a.jpg"),
        }
        .is_per_record());
        assert!(!ConvertError::NothingConverted {
            report: Box::default()
        }
        .is_per_record());
    }
}
