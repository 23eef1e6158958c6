//! Box geometry for the COCO → YOLO conversion.
//!
//! COCO stores boxes as top-left corner plus size in absolute pixels, YOLO as
//! center plus size normalized by the image dimensions. Both shapes carry a
//! zero-sized space marker so a pixel box can never be written where a
//! normalized one is expected.

mod bbox;
mod coord;

pub use bbox::{BBoxCXCYWH, BBoxXYWH};
pub use coord::Coord;

/// Marker for absolute pixel coordinates, origin at the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pixel {}

/// Marker for coordinates divided by the image width/height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Normalized {}
