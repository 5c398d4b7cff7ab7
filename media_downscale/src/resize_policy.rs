//! Resize decision
//!
//! Pure function of the probed dimensions, the EXIF orientation and the
//! configured bounding box. Portrait-shaped sources get the box transposed,
//! and nothing is ever upscaled.

use crate::config::BoundingBox;
use crate::size_probe::{Dimensions, Orientation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub target_width: u32,
    pub target_height: u32,
    pub needs_resize: bool,
    pub is_portrait: bool,
}

impl Decision {
    pub fn target(&self) -> BoundingBox {
        BoundingBox {
            width: self.target_width,
            height: self.target_height,
        }
    }
}

pub fn decide(dims: Dimensions, orientation: Orientation, bound: BoundingBox) -> Decision {
    let mut is_portrait = orientation.is_rotated();
    let target = if dims.width >= dims.height {
        bound
    } else {
        is_portrait = true;
        bound.transposed()
    };

    Decision {
        target_width: target.width,
        target_height: target.height,
        needs_resize: dims.width > target.width || dims.height > target.height,
        is_portrait,
    }
}
