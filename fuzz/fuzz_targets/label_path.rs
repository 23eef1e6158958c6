//! Fuzz target for label file naming: no file name may produce a path
//! that leaves the labels directory.
//!
//! Run with:
//!   cargo +nightly fuzz run label_path

#![no_main]

use std::path::Component;

use coco2yolo::coco::Image;
use coco2yolo::yolo::label_relative_path;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|file_name: &str| {
    let image = Image::new(1u64, file_name, 1, 1);
    if let Ok(path) = label_relative_path(&image) {
        assert!(path
            .components()
            .all(|component| matches!(component, Component::Normal(_))));
    }
});
