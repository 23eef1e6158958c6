//! YOLO side of the conversion: class indices, box conversion and label
//! files.
//!
//! - [`CategoryMap`] assigns dense class indices in ascending COCO
//!   category id order.
//! - [`convert_annotation`] turns one COCO pixel box into one normalized
//!   YOLO box.
//! - [`write_label_file`] and friends emit the `<stem>.txt` files and
//!   `data.yaml`.

mod classes;
mod convert;
mod writer;

pub use classes::CategoryMap;
pub use convert::{convert_annotation, convert_bbox, ImageDims, YoloBox};
pub use writer::{
    format_label_file, format_label_line, image_relative_path, label_relative_path, write_data_yaml,
    write_label_file, LABEL_EXTENSION,
};
