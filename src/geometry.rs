//! Axis-aligned boxes in scene pixel coordinates.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeometryError {
    #[error("bounding box {axis} must be non-negative, got {value}")]
    NegativeDimension { axis: &'static str, value: i32 },
}

/// Rectangle anchored at its top-left corner. Extents are closed, so two
/// boxes that share an edge are considered overlapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl BoundingBox {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Result<Self, GeometryError> {
        if width < 0 {
            return Err(GeometryError::NegativeDimension {
                axis: "width",
                value: width,
            });
        }
        if height < 0 {
            return Err(GeometryError::NegativeDimension {
                axis: "height",
                value: height,
            });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
        })
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn overlaps(&self, other: &BoundingBox) -> bool {
        overlaps(self, other)
    }
}

pub fn overlaps(a: &BoundingBox, b: &BoundingBox) -> bool {
    !(a.right() < b.x || b.right() < a.x || a.bottom() < b.y || b.bottom() < a.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bbox(x: i32, y: i32, w: i32, h: i32) -> BoundingBox {
        BoundingBox::new(x, y, w, h).unwrap()
    }

    fn intervals_meet(a0: i32, a1: i32, b0: i32, b1: i32) -> bool {
        (a0..=a1).any(|v| v >= b0 && v <= b1)
    }

    #[test]
    fn rejects_negative_dimensions() {
        assert_eq!(
            BoundingBox::new(0, 0, -1, 5),
            Err(GeometryError::NegativeDimension {
                axis: "width",
                value: -1
            })
        );
        assert!(BoundingBox::new(0, 0, 5, -3).is_err());
        assert!(BoundingBox::new(0, 0, 0, 0).is_ok());
    }

    #[test]
    fn touching_edges_overlap() {
        let a = bbox(0, 0, 10, 10);
        assert!(overlaps(&a, &bbox(10, 0, 5, 5)));
        assert!(overlaps(&a, &bbox(0, 10, 5, 5)));
        assert!(overlaps(&a, &bbox(10, 10, 1, 1)));
        assert!(!overlaps(&a, &bbox(11, 0, 5, 5)));
        assert!(!overlaps(&a, &bbox(0, 11, 5, 5)));
    }

    #[test]
    fn containment_overlaps() {
        let outer = bbox(0, 0, 100, 100);
        let inner = bbox(40, 40, 2, 2);
        assert!(outer.overlaps(&inner));
        assert!(inner.overlaps(&outer));
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(
            ax in -50i32..50, ay in -50i32..50, aw in 0i32..30, ah in 0i32..30,
            bx in -50i32..50, by in -50i32..50, bw in 0i32..30, bh in 0i32..30,
        ) {
            let a = bbox(ax, ay, aw, ah);
            let b = bbox(bx, by, bw, bh);
            prop_assert_eq!(overlaps(&a, &b), overlaps(&b, &a));
        }

        #[test]
        fn overlap_matches_interval_reference(
            ax in -50i32..50, ay in -50i32..50, aw in 0i32..30, ah in 0i32..30,
            bx in -50i32..50, by in -50i32..50, bw in 0i32..30, bh in 0i32..30,
        ) {
            let a = bbox(ax, ay, aw, ah);
            let b = bbox(bx, by, bw, bh);
            let reference = intervals_meet(a.x, a.right(), b.x, b.right())
                && intervals_meet(a.y, a.bottom(), b.y, b.bottom());
            prop_assert_eq!(overlaps(&a, &b), reference);
        }

        #[test]
        fn overlap_is_reflexive(x in -50i32..50, y in -50i32..50, w in 1i32..30, h in 1i32..30) {
            let a = bbox(x, y, w, h);
            prop_assert!(overlaps(&a, &a));
        }
    }
}
