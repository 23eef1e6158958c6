//! End-to-end conversion: load, split, place images, convert, write.
//!
//! Images are visited split by split in ascending image id order, so two
//! runs over the same input with the same seed produce identical output.
//! The image stage runs before conversion. Boxes of a resized image are
//! rescaled into the resized pixel space and then normalized against the
//! resized size; copied images are normalized against the declared size.

mod report;

pub use report::{InputCounts, IssueCode, RunIssue, RunReport, Severity, SplitCounts};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::coco::{read_coco_json, Annotation, Dataset, DatasetIndex, Image};
use crate::error::ConvertError;
use crate::images::{place_image, ImageAction, ImageDirIndex, ResizeTarget};
use crate::split::{split_image_ids, Split, SplitRatios, DEFAULT_SEED};
use crate::yolo::{
    convert_annotation, image_relative_path, label_relative_path, write_data_yaml,
    write_label_file, CategoryMap, ImageDims,
};

/// Everything a run needs, already validated by the caller's parser.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    /// COCO annotation file.
    pub coco_path: PathBuf,
    /// Source image directory. Without it only labels are written.
    pub images_dir: Option<PathBuf>,
    /// Dataset root; created if missing.
    pub output_dir: PathBuf,
    /// Stretch every image to this size. Requires `images_dir`.
    pub resize: Option<ResizeTarget>,
    pub split: SplitRatios,
    pub seed: u64,
    /// Fail the run if any record was skipped.
    pub strict: bool,
}

impl PipelineOptions {
    /// Options with default split ratios and seed, no images and no resize.
    pub fn new(coco_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            coco_path: coco_path.into(),
            images_dir: None,
            output_dir: output_dir.into(),
            resize: None,
            split: SplitRatios::default(),
            seed: DEFAULT_SEED,
            strict: false,
        }
    }
}

/// Runs the full conversion described by `options`.
///
/// # Errors
/// Load failures, bad split ratios and failures creating the output layout
/// abort the run before any label is written. Per-record failures are
/// collected in the returned report instead. The run still fails with
/// `NothingConverted` when no image was written, and with `SkippedRecords`
/// in strict mode when anything was skipped.
pub fn run_pipeline(options: &PipelineOptions) -> Result<RunReport, ConvertError> {
    options.split.validate()?;
    if options.resize.is_some() && options.images_dir.is_none() {
        return Err(ConvertError::InvalidResizeTarget {
            message: "resizing requires an image directory".to_string(),
        });
    }

    info!("loading {}", options.coco_path.display());
    let dataset = read_coco_json(&options.coco_path)?;
    info!(
        "loaded {} images, {} categories, {} annotations",
        dataset.images.len(),
        dataset.categories.len(),
        dataset.annotations.len()
    );

    let index = DatasetIndex::build(&dataset);
    let categories = CategoryMap::from_categories(&dataset.categories);
    let assignment = split_image_ids(&index.image_ids(), options.split, options.seed)?;
    info!(
        "split {} images: train {}, val {}, test {} (seed {})",
        assignment.len(),
        assignment.ids(Split::Train).len(),
        assignment.ids(Split::Val).len(),
        assignment.ids(Split::Test).len(),
        options.seed
    );

    let source_images = options
        .images_dir
        .as_deref()
        .map(ImageDirIndex::scan)
        .transpose()?;

    let splits = options.split.active_splits();
    for split in &splits {
        fs::create_dir_all(options.output_dir.join("labels").join(split.dir_name()))?;
        if source_images.is_some() {
            fs::create_dir_all(options.output_dir.join("images").join(split.dir_name()))?;
        }
    }

    let mut converter = Converter::new(&dataset, &index, &categories);
    let action = options
        .resize
        .map_or(ImageAction::Copy, ImageAction::Resize);

    for &split in &splits {
        let labels_dir = options.output_dir.join("labels").join(split.dir_name());
        let stage = source_images.as_ref().map(|sources| ImageStage {
            sources,
            images_dir: options.output_dir.join("images").join(split.dir_name()),
            action,
        });
        for &image_id in assignment.ids(split) {
            if let Some(image) = index.image(image_id) {
                converter.convert_image(image, split, &labels_dir, stage.as_ref());
            }
        }
    }

    if let Some(sources) = &source_images {
        let unreferenced = sources.unreferenced(&converter.used_sources);
        if unreferenced > 0 {
            converter.report.add(RunIssue::info(
                IssueCode::UnreferencedImages,
                format!(
                    "{unreferenced} image file(s) in the image directory are not referenced by any image record"
                ),
            ));
        }
    }

    let yaml = write_data_yaml(&options.output_dir, &splits, &categories)?;
    info!("wrote {}", yaml.display());

    let report = converter.finish();
    info!(
        "converted {} images ({} boxes), skipped {} images and {} annotations",
        report.images_converted,
        report.boxes_written,
        report.images_skipped,
        report.annotations_skipped
    );

    if report.images_converted == 0 {
        return Err(ConvertError::NothingConverted {
            report: Box::new(report),
        });
    }
    if options.strict && report.skipped_count() > 0 {
        return Err(ConvertError::SkippedRecords {
            count: report.skipped_count(),
            report: Box::new(report),
        });
    }
    Ok(report)
}

/// Converts every image of `dataset` into flat label files under
/// `labels_dir`, with no split and no image handling.
///
/// Per-record failures end up in the report; this never fails as a whole.
pub fn convert_dataset(dataset: &Dataset, labels_dir: &Path) -> RunReport {
    let index = DatasetIndex::build(dataset);
    let categories = CategoryMap::from_categories(&dataset.categories);
    let mut converter = Converter::new(dataset, &index, &categories);
    for image_id in index.image_ids() {
        if let Some(image) = index.image(image_id) {
            converter.convert_image(image, Split::Train, labels_dir, None);
        }
    }
    converter.finish()
}

/// Where and how images of one split are placed.
struct ImageStage<'a> {
    sources: &'a ImageDirIndex,
    images_dir: PathBuf,
    action: ImageAction,
}

struct Converter<'a> {
    index: &'a DatasetIndex<'a>,
    categories: &'a CategoryMap,
    report: RunReport,
    label_paths: HashSet<PathBuf>,
    used_sources: HashSet<PathBuf>,
}

impl<'a> Converter<'a> {
    fn new(dataset: &Dataset, index: &'a DatasetIndex<'a>, categories: &'a CategoryMap) -> Self {
        let mut report = RunReport::new(InputCounts {
            images: dataset.images.len(),
            categories: dataset.categories.len(),
            annotations: dataset.annotations.len(),
        });

        for image in index.duplicate_images() {
            warn!("skipping duplicate image record {} ('{}')", image.id, image.file_name);
            report.skip_image(
                RunIssue::warning(
                    IssueCode::DuplicateImageId,
                    format!(
                        "Image id {} appears more than once; '{}' was skipped",
                        image.id, image.file_name
                    ),
                )
                .with_image(image.id),
            );
        }
        for ann in index.orphan_annotations() {
            warn!(
                "skipping annotation #{} for unknown image {}",
                ann.index, ann.image_id
            );
            report.skip_annotation(
                RunIssue::warning(
                    IssueCode::OrphanAnnotation,
                    format!(
                        "Annotation #{} references unknown image {}",
                        ann.index, ann.image_id
                    ),
                )
                .with_annotation(ann.index),
            );
        }

        Self {
            index,
            categories,
            report,
            label_paths: HashSet::new(),
            used_sources: HashSet::new(),
        }
    }

    fn convert_image(
        &mut self,
        image: &Image,
        split: Split,
        labels_dir: &Path,
        stage: Option<&ImageStage<'_>>,
    ) {
        match self.try_convert_image(image, labels_dir, stage) {
            Ok(boxes) => self.report.record_converted(split, boxes),
            Err(err) => {
                warn!("skipping image {}: {err}", image.id);
                self.report.skip_image(RunIssue::from_error(&err));
            }
        }
    }

    /// Converts one image and returns the number of boxes written.
    fn try_convert_image(
        &mut self,
        image: &Image,
        labels_dir: &Path,
        stage: Option<&ImageStage<'_>>,
    ) -> Result<usize, ConvertError> {
        let declared = ImageDims::of(image).validate(image.id)?;

        let label_path = labels_dir.join(label_relative_path(image)?);
        if self.label_paths.contains(&label_path) {
            return Err(ConvertError::DuplicateFileName {
                image_id: image.id,
                path: label_path,
            });
        }

        let (effective, placed) = match stage {
            Some(stage) => {
                let (dims, target) = self.place(image, declared, stage)?;
                (dims, Some(target))
            }
            None => (declared, None),
        };
        let scale = (effective != declared).then(|| declared.scale_to(effective));

        let index = self.index;
        let mut boxes = Vec::new();
        for ann in index.annotations_for(image.id) {
            let converted = match scale {
                Some((sx, sy)) => {
                    let rescaled = Annotation {
                        bbox: ann.bbox.scaled(sx, sy),
                        ..ann.clone()
                    };
                    convert_annotation(&rescaled, image.id, effective, self.categories)
                }
                None => convert_annotation(ann, image.id, effective, self.categories),
            };
            match converted {
                Ok(yolo) => boxes.push(yolo),
                Err(err) => {
                    warn!("skipping box in image {}: {err}", image.id);
                    self.report.skip_annotation(RunIssue::from_error(&err));
                }
            }
        }

        let written = match write_label_file(labels_dir, image, &boxes) {
            Ok(written) => written,
            Err(err) => {
                // A placed image never stays without its label file.
                if let Some(target) = placed {
                    if let Err(cleanup) = fs::remove_file(&target) {
                        warn!("could not remove {}: {cleanup}", target.display());
                    }
                }
                return Err(err);
            }
        };
        self.label_paths.insert(label_path);
        debug!("{} -> {} ({} boxes)", image.file_name, written.display(), boxes.len());
        Ok(boxes.len())
    }

    /// Copies or resizes the source image. Returns the dimensions boxes
    /// must be normalized against and the path of the written file.
    fn place(
        &mut self,
        image: &Image,
        declared: ImageDims,
        stage: &ImageStage<'_>,
    ) -> Result<(ImageDims, PathBuf), ConvertError> {
        let source = stage
            .sources
            .resolve(&image.file_name)
            .ok_or_else(|| ConvertError::MissingImage {
                image_id: image.id,
                path: stage.sources.expected_path(&image.file_name),
            })?
            .to_path_buf();
        let target = stage.images_dir.join(image_relative_path(image)?);

        let placed = place_image(image.id, &source, &target, stage.action)?;
        self.used_sources.insert(source);

        if placed.resized {
            return Ok((placed.on_disk.unwrap_or(declared), target));
        }
        if let Some(actual) = placed.on_disk.filter(|actual| *actual != declared) {
            warn!(
                "image {} is {}x{} on disk but declared {}x{}",
                image.id, actual.width, actual.height, declared.width, declared.height
            );
            self.report.add(
                RunIssue::warning(
                    IssueCode::DimensionMismatch,
                    format!(
                        "Image {} ('{}') is {}x{} on disk but declared {}x{}; labels use the declared size",
                        image.id,
                        image.file_name,
                        actual.width,
                        actual.height,
                        declared.width,
                        declared.height
                    ),
                )
                .with_image(image.id),
            );
        }
        Ok((declared, target))
    }

    fn finish(self) -> RunReport {
        self.report
    }
}
