#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde_json::{json, Value};

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

pub fn write_json(path: &Path, value: &Value) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, serde_json::to_vec_pretty(value).expect("serialize json"))
        .expect("write json file");
}

/// Eight BMP images of varying size, two categories with non-contiguous
/// ids (7 = dog, 3 = cat) and a few boxes per image. Image 8 has none.
pub fn sample_coco() -> Value {
    let sizes = [
        (40, 20),
        (32, 32),
        (50, 30),
        (24, 48),
        (40, 20),
        (64, 16),
        (30, 30),
        (20, 40),
    ];
    let images: Vec<Value> = sizes
        .iter()
        .enumerate()
        .map(|(idx, (w, h))| {
            json!({
                "id": idx + 1,
                "file_name": format!("img_{:02}.bmp", idx + 1),
                "width": w,
                "height": h
            })
        })
        .collect();

    let mut annotations = Vec::new();
    for (idx, (w, h)) in sizes.iter().enumerate().take(7) {
        let (w, h) = (*w as f64, *h as f64);
        annotations.push(json!({
            "id": annotations.len() + 100,
            "image_id": idx + 1,
            "category_id": if idx % 2 == 0 { 7 } else { 3 },
            "bbox": [w * 0.1, h * 0.2, w * 0.5, h * 0.25]
        }));
        if idx % 3 == 0 {
            annotations.push(json!({
                "id": annotations.len() + 100,
                "image_id": idx + 1,
                "category_id": 3,
                "bbox": [w * 0.6, h * 0.5, w * 0.3, h * 0.45]
            }));
        }
    }

    json!({
        "images": images,
        "annotations": annotations,
        "categories": [
            {"id": 7, "name": "dog", "supercategory": "animal"},
            {"id": 3, "name": "cat", "supercategory": "animal"}
        ]
    })
}

/// Writes a BMP for every image record of `coco` under `dir`, at the
/// declared size.
pub fn materialize_images(coco: &Value, dir: &Path) {
    for image in coco["images"].as_array().expect("images array") {
        let name = image["file_name"].as_str().expect("file_name");
        let width = image["width"].as_u64().expect("width") as u32;
        let height = image["height"].as_u64().expect("height") as u32;
        write_bmp(&dir.join(name), width, height);
    }
}

/// All files under `root`, keyed by relative path.
pub fn read_tree(root: &Path) -> BTreeMap<String, Vec<u8>> {
    walkdir::WalkDir::new(root)
        .into_iter()
        .map(|entry| entry.expect("walk output"))
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let rel = entry
                .path()
                .strip_prefix(root)
                .expect("strip prefix")
                .to_string_lossy()
                .replace('\\', "/");
            (rel, fs::read(entry.path()).expect("read file"))
        })
        .collect()
}

/// Parses label rows into `(class, [cx, cy, w, h])`.
pub fn parse_labels(content: &str) -> Vec<(usize, [f64; 4])> {
    content
        .lines()
        .map(|line| {
            let parts: Vec<&str> = line.split(' ').collect();
            assert_eq!(parts.len(), 5, "bad label row: {line:?}");
            let class = parts[0].parse().expect("class index");
            let mut values = [0.0; 4];
            for (slot, raw) in values.iter_mut().zip(&parts[1..]) {
                *slot = raw.parse().expect("label value");
            }
            (class, values)
        })
        .collect()
}
