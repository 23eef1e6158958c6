//! Run report: what was converted, what was skipped and why.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::coco::ImageId;
use crate::error::ConvertError;
use crate::split::Split;

/// Summary of one pipeline run.
///
/// Every skipped record leaves exactly one warning-level issue behind.
/// Warnings can also flag records that were converted with a caveat, such
/// as a declared size that differs from the file on disk.
#[derive(Clone, Debug, Default, Serialize)]
pub struct RunReport {
    /// Counts from the input document.
    pub input: InputCounts,
    /// Images whose label file was written.
    pub images_converted: usize,
    /// Boxes written across all label files.
    pub boxes_written: usize,
    pub images_skipped: usize,
    pub annotations_skipped: usize,
    /// Per-split output counts (only splits that received images).
    pub splits: BTreeMap<Split, SplitCounts>,
    pub issues: Vec<RunIssue>,
}

impl RunReport {
    pub fn new(input: InputCounts) -> Self {
        Self {
            input,
            ..Default::default()
        }
    }

    pub fn add(&mut self, issue: RunIssue) {
        self.issues.push(issue);
    }

    /// Records a converted image and its box count.
    pub fn record_converted(&mut self, split: Split, boxes: usize) {
        self.images_converted += 1;
        self.boxes_written += boxes;
        let counts = self.splits.entry(split).or_default();
        counts.images += 1;
        counts.boxes += boxes;
    }

    /// Records an image that produced no label file.
    pub fn skip_image(&mut self, issue: RunIssue) {
        self.images_skipped += 1;
        self.add(issue);
    }

    /// Records an annotation left out of the output.
    pub fn skip_annotation(&mut self, issue: RunIssue) {
        self.annotations_skipped += 1;
        self.add(issue);
    }

    /// Images plus annotations that were skipped.
    pub fn skipped_count(&self) -> usize {
        self.images_skipped + self.annotations_skipped
    }

    pub fn warning_count(&self) -> usize {
        self.count_severity(Severity::Warning)
    }

    pub fn info_count(&self) -> usize {
        self.count_severity(Severity::Info)
    }

    /// Issues carrying `code`.
    pub fn issues_with(&self, code: IssueCode) -> impl Iterator<Item = &RunIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    fn count_severity(&self, severity: Severity) -> usize {
        self.issues.iter().filter(|i| i.severity == severity).count()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  input: {} images, {} categories, {} annotations",
            self.input.images, self.input.categories, self.input.annotations
        )?;
        writeln!(
            f,
            "  converted: {} images, {} boxes",
            self.images_converted, self.boxes_written
        )?;
        for (split, counts) in &self.splits {
            writeln!(
                f,
                "    {}: {} images, {} boxes",
                split.dir_name(),
                counts.images,
                counts.boxes
            )?;
        }
        if self.skipped_count() > 0 {
            writeln!(
                f,
                "  skipped: {} images, {} annotations",
                self.images_skipped, self.annotations_skipped
            )?;
        }

        let sections = [
            (Severity::Warning, "Warnings", self.warning_count()),
            (Severity::Info, "Notes", self.info_count()),
        ];
        for (severity, title, count) in sections {
            if count == 0 {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{title} ({count}):")?;
            for issue in self.issues.iter().filter(|i| i.severity == severity) {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// Counts of input document elements.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct InputCounts {
    pub images: usize,
    pub categories: usize,
    pub annotations: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SplitCounts {
    pub images: usize,
    pub boxes: usize,
}

/// A single issue found during a run.
#[derive(Clone, Debug, Serialize)]
pub struct RunIssue {
    pub severity: Severity,
    pub code: IssueCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<ImageId>,
    /// Zero-based position of the annotation in the input document.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotation: Option<usize>,
}

impl RunIssue {
    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            image_id: None,
            annotation: None,
        }
    }

    pub fn info(code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            ..Self::warning(code, message)
        }
    }

    pub fn with_image(mut self, image_id: ImageId) -> Self {
        self.image_id = Some(image_id);
        self
    }

    pub fn with_annotation(mut self, annotation: usize) -> Self {
        self.annotation = Some(annotation);
        self
    }

    /// Warning for a per-record error, with its image/annotation context.
    pub fn from_error(err: &ConvertError) -> Self {
        let issue = Self::warning(IssueCode::from_error(err), err.to_string());
        match err {
            ConvertError::UnknownCategory { annotation, .. } => issue.with_annotation(*annotation),
            ConvertError::InvalidImageDimensions { image_id, .. }
            | ConvertError::InvalidFileName { image_id, .. }
            | ConvertError::MissingImage { image_id, .. }
            | ConvertError::ImageProcess { image_id, .. }
            | ConvertError::OutputWrite { image_id, .. }
            | ConvertError::DuplicateFileName { image_id, .. } => issue.with_image(*image_id),
            _ => issue,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// A record was skipped or output may be wrong.
    Warning,
    /// Informational note; nothing was lost.
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueCode {
    UnknownCategory,
    InvalidImageDimensions,
    InvalidFileName,
    MissingImage,
    ImageProcess,
    OutputWrite,
    /// Two images map to the same label file path.
    DuplicateFileName,
    /// A later image record reuses an earlier image id.
    DuplicateImageId,
    /// Annotation whose `image_id` matches no image.
    OrphanAnnotation,
    /// On-disk image size differs from the declared size.
    DimensionMismatch,
    /// Files in the image directory that no image record references.
    UnreferencedImages,
    /// Run-level error surfaced as an issue.
    Other,
}

impl IssueCode {
    pub fn from_error(err: &ConvertError) -> Self {
        match err {
            ConvertError::UnknownCategory { .. } => IssueCode::UnknownCategory,
            ConvertError::InvalidImageDimensions { .. } => IssueCode::InvalidImageDimensions,
            ConvertError::InvalidFileName { .. } => IssueCode::InvalidFileName,
            ConvertError::MissingImage { .. } => IssueCode::MissingImage,
            ConvertError::ImageProcess { .. } => IssueCode::ImageProcess,
            ConvertError::OutputWrite { .. } => IssueCode::OutputWrite,
            ConvertError::DuplicateFileName { .. } => IssueCode::DuplicateFileName,
            _ => IssueCode::Other,
        }
    }
}
