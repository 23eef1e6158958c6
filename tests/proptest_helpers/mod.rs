#![allow(dead_code)]

use coco2yolo::coco::{Annotation, Category, Dataset, Image};
use coco2yolo::geometry::{BBoxXYWH, Pixel};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

/// Label values carry six decimals.
pub const EPS_LABEL: f64 = 5e-7 + 1e-12;

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Any finite pixel box, including ones that stick out of the image or
/// have negative extent.
pub fn arb_pixel_bbox() -> BoxedStrategy<BBoxXYWH<Pixel>> {
    (
        -5000.0f64..5000.0,
        -5000.0f64..5000.0,
        -100.0f64..5000.0,
        -100.0f64..5000.0,
    )
        .prop_map(|(x, y, w, h)| BBoxXYWH::from_xywh(x, y, w, h))
        .boxed()
}

/// A pixel box lying fully inside a `width` x `height` image.
pub fn arb_bbox_within(width: u32, height: u32) -> BoxedStrategy<BBoxXYWH<Pixel>> {
    prop::num::u32::ANY
        .prop_map(move |seed| {
            bbox_from_seed(
                width,
                height,
                seed,
                seed.rotate_left(3),
                seed.rotate_left(7),
                seed.rotate_left(11),
            )
        })
        .boxed()
}

/// Datasets with unique file names, sparse category ids and boxes that may
/// exceed their image.
pub fn arb_dataset(max_images: usize, max_cats: usize, max_anns: usize) -> BoxedStrategy<Dataset> {
    assert!(max_images > 0, "max_images must be > 0");
    assert!(max_cats > 0, "max_cats must be > 0");

    (1usize..=max_images, 1usize..=max_cats, 0usize..=max_anns)
        .prop_flat_map(|(image_count, category_count, ann_count)| {
            (
                proptest::collection::btree_map(
                    image_file_name_strategy(),
                    (2u32..=4096, 2u32..=4096),
                    image_count..=image_count,
                ),
                proptest::collection::btree_set(1u64..=1000, category_count..=category_count),
                proptest::collection::vec(ann_seed_strategy(), ann_count..=ann_count),
            )
                .prop_map(|(images, category_ids, ann_seeds)| {
                    build_dataset(
                        images.into_iter().collect(),
                        category_ids.into_iter().collect(),
                        ann_seeds,
                    )
                })
        })
        .boxed()
}

type AnnSeed = (u16, u16, u32, u32, u32, u32, bool);

fn ann_seed_strategy() -> impl Strategy<Value = AnnSeed> {
    (
        any::<u16>(),
        any::<u16>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        any::<u32>(),
        any::<bool>(),
    )
}

fn image_file_name_strategy() -> BoxedStrategy<String> {
    proptest::string::string_regex("[a-z0-9_]{1,12}\\.jpg")
        .expect("valid filename regex")
        .boxed()
}

fn build_dataset(
    image_rows: Vec<(String, (u32, u32))>,
    category_ids: Vec<u64>,
    ann_seeds: Vec<AnnSeed>,
) -> Dataset {
    let images: Vec<Image> = image_rows
        .into_iter()
        .enumerate()
        .map(|(idx, (file_name, (width, height)))| {
            Image::new((idx + 1) as u64, file_name, width, height)
        })
        .collect();

    let categories: Vec<Category> = category_ids
        .iter()
        .map(|id| Category::new(*id, format!("class_{id}")))
        .collect();

    let annotations: Vec<Annotation> = ann_seeds
        .into_iter()
        .enumerate()
        .map(|(idx, seed)| {
            let (image_seed, category_seed, sx, sy, sw, sh, overflow) = seed;
            let image = &images[image_seed as usize % images.len()];
            let category = &categories[category_seed as usize % categories.len()];
            let mut bbox = bbox_from_seed(image.width, image.height, sx, sy, sw, sh);
            if overflow {
                let (x, y, w, h) = bbox.to_xywh();
                bbox = BBoxXYWH::from_xywh(x - w, y, w * 3.0, h * 2.0);
            }
            Annotation::new(idx, image.id, category.id, bbox).with_id((idx + 1) as u64)
        })
        .collect();

    Dataset {
        images,
        categories,
        annotations,
    }
}

fn bbox_from_seed(width: u32, height: u32, sx: u32, sy: u32, sw: u32, sh: u32) -> BBoxXYWH<Pixel> {
    let xmin = sx % (width - 1);
    let ymin = sy % (height - 1);
    let w = 1 + (sw % (width - xmin));
    let h = 1 + (sh % (height - ymin));

    BBoxXYWH::from_xywh(xmin as f64, ymin as f64, w as f64, h as f64)
}
