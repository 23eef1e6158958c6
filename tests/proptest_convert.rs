use std::fs;

use coco2yolo::coco::ImageId;
use coco2yolo::pipeline::convert_dataset;
use coco2yolo::split::{split_image_ids, SplitRatios};
use coco2yolo::yolo::{convert_bbox, format_label_line, CategoryMap, ImageDims, YoloBox};
use proptest::prelude::*;

mod common;
mod proptest_helpers;

proptest! {
    #![proptest_config(proptest_helpers::proptest_config())]

    #[test]
    fn converted_boxes_stay_in_unit_interval(
        bbox in proptest_helpers::arb_pixel_bbox(),
        width in 1u32..=8192,
        height in 1u32..=8192,
    ) {
        let converted = convert_bbox(&bbox, ImageDims::new(width, height));
        prop_assert!(converted.is_within_unit(), "{:?}", converted);
    }

    #[test]
    fn boxes_inside_the_image_map_back_to_pixels(
        (width, height, bbox) in (2u32..=4096, 2u32..=4096).prop_flat_map(|(w, h)| {
            (Just(w), Just(h), proptest_helpers::arb_bbox_within(w, h))
        })
    ) {
        let (cx, cy, w, h) = convert_bbox(&bbox, ImageDims::new(width, height)).to_cxcywh();
        let (x, y, bw, bh) = bbox.to_xywh();
        let (fw, fh) = (width as f64, height as f64);
        prop_assert!((cx * fw - w * fw / 2.0 - x).abs() < 1e-6);
        prop_assert!((cy * fh - h * fh / 2.0 - y).abs() < 1e-6);
        prop_assert!((w * fw - bw).abs() < 1e-6);
        prop_assert!((h * fh - bh).abs() < 1e-6);
    }

    #[test]
    fn label_rows_parse_back_within_precision(
        bbox in proptest_helpers::arb_pixel_bbox(),
        class_index in 0usize..1000,
    ) {
        let yolo = YoloBox {
            class_index,
            bbox: convert_bbox(&bbox, ImageDims::new(640, 480)),
        };
        let rows = common::parse_labels(&format_label_line(&yolo));
        prop_assert_eq!(rows.len(), 1);
        let (class, values) = rows[0];
        prop_assert_eq!(class, class_index);
        let (cx, cy, w, h) = yolo.bbox.to_cxcywh();
        for (parsed, exact) in values.iter().zip([cx, cy, w, h]) {
            prop_assert!((parsed - exact).abs() <= proptest_helpers::EPS_LABEL);
        }
    }

    #[test]
    fn split_covers_every_image_exactly_once(
        ids in proptest::collection::btree_set(any::<u64>(), 0..60),
        val in 0u32..=50,
        test in 0u32..=50,
        seed in any::<u64>(),
    ) {
        let ids: Vec<ImageId> = ids.into_iter().map(ImageId::new).collect();
        let ratios = SplitRatios { val: val as f64 / 100.0, test: test as f64 / 100.0 };

        let assignment = split_image_ids(&ids, ratios, seed).expect("valid ratios");
        let again = split_image_ids(&ids, ratios, seed).expect("valid ratios");
        prop_assert_eq!(&assignment, &again);

        let mut all: Vec<ImageId> = assignment
            .train
            .iter()
            .chain(&assignment.val)
            .chain(&assignment.test)
            .copied()
            .collect();
        all.sort();
        prop_assert_eq!(all, ids.clone());

        let n = ids.len() as f64;
        prop_assert_eq!(assignment.test.len(), (n * ratios.test).ceil() as usize);
        prop_assert!(assignment.val.len() <= (n * ratios.val).ceil() as usize);
    }

    #[test]
    fn every_image_gets_a_label_file_with_valid_rows(
        dataset in proptest_helpers::arb_dataset(4, 4, 12)
    ) {
        let temp = tempfile::tempdir().expect("create temp dir");
        let report = convert_dataset(&dataset, temp.path());

        prop_assert_eq!(report.images_converted, dataset.images.len());
        prop_assert_eq!(report.boxes_written, dataset.annotations.len());

        let classes = CategoryMap::from_categories(&dataset.categories);
        for image in &dataset.images {
            let path = temp.path().join(&image.file_name).with_extension("txt");
            let content = fs::read_to_string(&path).expect("label file");
            for (class, values) in common::parse_labels(&content) {
                prop_assert!(class < classes.len());
                for value in values {
                    prop_assert!((0.0..=1.0).contains(&value), "{} in {}", value, content);
                }
            }
        }
    }
}
