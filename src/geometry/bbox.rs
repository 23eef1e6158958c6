//! Axis-aligned box shapes used on either side of the conversion.

use super::coord::Coord;
use super::{Normalized, Pixel};

/// Top-left corner plus size, the layout COCO uses for `bbox`.
///
/// Negative sizes and boxes reaching past the image are representable;
/// the converter clamps its output instead of rejecting them here.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYWH<TSpace> {
    pub min: Coord<TSpace>,
    pub width: f64,
    pub height: f64,
}

impl<TSpace> BBoxXYWH<TSpace> {
    #[inline]
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            min: Coord::new(x, y),
            width,
            height,
        }
    }

    /// Returns `(x, y, width, height)`.
    #[inline]
    pub fn to_xywh(&self) -> (f64, f64, f64, f64) {
        (self.min.x, self.min.y, self.width, self.height)
    }
}

impl BBoxXYWH<Pixel> {
    /// Scales the box by independent horizontal and vertical factors.
    ///
    /// Used to move a box into the pixel space of a stretched image.
    pub fn scaled(&self, sx: f64, sy: f64) -> Self {
        Self::from_xywh(
            self.min.x * sx,
            self.min.y * sy,
            self.width * sx,
            self.height * sy,
        )
    }

    /// Center/size form normalized by the image size, without clamping.
    ///
    /// Follows the YOLO definition term for term so that exact inputs give
    /// exact outputs: `cx = (x + w / 2) / W`, `w = bw / W`.
    pub fn to_normalized_cxcywh(&self, image_width: f64, image_height: f64) -> BBoxCXCYWH<Normalized> {
        BBoxCXCYWH::from_cxcywh(
            (self.min.x + self.width / 2.0) / image_width,
            (self.min.y + self.height / 2.0) / image_height,
            self.width / image_width,
            self.height / image_height,
        )
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYWH")
            .field("x", &self.min.x)
            .field("y", &self.min.y)
            .field("w", &self.width)
            .field("h", &self.height)
            .finish()
    }
}

/// Center plus size, the layout of a YOLO label row.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxCXCYWH<TSpace> {
    pub center: Coord<TSpace>,
    pub width: f64,
    pub height: f64,
}

impl<TSpace> BBoxCXCYWH<TSpace> {
    #[inline]
    pub fn from_cxcywh(cx: f64, cy: f64, width: f64, height: f64) -> Self {
        Self {
            center: Coord::new(cx, cy),
            width,
            height,
        }
    }

    #[inline]
    pub fn cx(&self) -> f64 {
        self.center.x
    }

    /// Returns `(cx, cy, width, height)`.
    #[inline]
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        (self.center.x, self.center.y, self.width, self.height)
    }
}

impl BBoxCXCYWH<Normalized> {
    /// Clamps each of the four values into `[0, 1]` independently.
    ///
    /// NaN and `-0.0` map to `0.0`.
    pub fn clamped(&self) -> Self {
        Self::from_cxcywh(
            clamp_unit(self.center.x),
            clamp_unit(self.center.y),
            clamp_unit(self.width),
            clamp_unit(self.height),
        )
    }

    /// Returns true if every value lies in `[0, 1]`.
    pub fn is_within_unit(&self) -> bool {
        let (cx, cy, w, h) = self.to_cxcywh();
        [cx, cy, w, h].iter().all(|v| (0.0..=1.0).contains(v))
    }
}

impl<TSpace> std::fmt::Debug for BBoxCXCYWH<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxCXCYWH")
            .field("cx", &self.center.x)
            .field("cy", &self.center.y)
            .field("w", &self.width)
            .field("h", &self.height)
            .finish()
    }
}

#[inline]
fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        // Adding +0.0 turns -0.0 into 0.0.
        value.clamp(0.0, 1.0) + 0.0
    }
}
