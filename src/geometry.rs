//! Display-space ↔ original-image-space conversion.

use crate::store::BoundingBox;
use thiserror::Error;

/// Rect of the rendered image widget in display space. Unknown until the
/// first layout pass has run.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ImageLayout {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

/// True pixel size of the source image, resolved when the image is decoded.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OriginalImageSize {
    pub width: u32,
    pub height: u32,
}

/// Raised while either the layout or the decoded image size is still
/// pending. Transient: resolves once both are known.
#[derive(Debug, Error, PartialEq)]
#[error("image layout and original size are not both resolved yet")]
pub struct NotReady;

/// A box projected into original-image pixel space, corners sorted so that
/// `x1 <= x2` and `y1 <= y2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

/// Pure scale factors from display space into original-image space.
///
/// Resolved once at submission time rather than per frame; drawing never
/// needs original-image coordinates.
#[derive(Clone, Copy, Debug)]
pub struct CoordinateMapper {
    scale_x: f32,
    scale_y: f32,
}

impl CoordinateMapper {
    /// Joins the two independently resolved readiness sources. Fails with
    /// [`NotReady`] if either is missing or the layout has a zero side.
    pub fn resolve(
        layout: Option<ImageLayout>,
        original: Option<OriginalImageSize>,
    ) -> Result<Self, NotReady> {
        let layout = layout.ok_or(NotReady)?;
        let original = original.ok_or(NotReady)?;
        if layout.width <= 0.0 || layout.height <= 0.0 {
            return Err(NotReady);
        }
        Ok(Self {
            scale_x: original.width as f32 / layout.width,
            scale_y: original.height as f32 / layout.height,
        })
    }

    /// Sorts the box corners and scales them into original-image pixels.
    pub fn project(&self, bbox: &BoundingBox) -> ProjectedBox {
        ProjectedBox {
            x1: bbox.x1.min(bbox.x2) * self.scale_x,
            y1: bbox.y1.min(bbox.y2) * self.scale_y,
            x2: bbox.x1.max(bbox.x2) * self.scale_x,
            y2: bbox.y1.max(bbox.y2) * self.scale_y,
        }
    }
}
