//! Fuzz target for COCO JSON parsing and box conversion.
//!
//! Run with:
//!   cargo +nightly fuzz run coco_json_parse

#![no_main]

use coco2yolo::coco::{from_coco_slice, DatasetIndex};
use coco2yolo::yolo::{convert_annotation, format_label_line, CategoryMap, ImageDims};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // 10MB is generous for JSON annotation files.
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let Ok(dataset) = from_coco_slice(data) else {
        return;
    };

    let index = DatasetIndex::build(&dataset);
    let categories = CategoryMap::from_categories(&dataset.categories);
    for image_id in index.image_ids() {
        let Some(image) = index.image(image_id) else {
            continue;
        };
        for ann in index.annotations_for(image_id) {
            if let Ok(yolo) = convert_annotation(ann, image.id, ImageDims::of(image), &categories) {
                assert!(yolo.bbox.is_within_unit());
                let _ = format_label_line(&yolo);
            }
        }
    }
});
