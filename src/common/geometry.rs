use serde::{Deserialize, Serialize};

/// A 2D point in image coordinates. The origin is the top-left corner and
/// `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// True when `self` sits strictly higher in the image than `other`.
    pub fn is_above(&self, other: &Point) -> bool {
        self.y < other.y
    }
}

/// Axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box containing every point, `None` for an empty slice.
    pub fn enclosing(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for point in &points[1..] {
            min_x = min_x.min(point.x);
            min_y = min_y.min(point.y);
            max_x = max_x.max(point.x);
            max_y = max_y.max(point.y);
        }
        Some(Self::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    /// Clips the box to a `width` x `height` frame. Returns `None` when
    /// nothing of the box remains visible.
    pub fn clamp_to(&self, width: u32, height: u32) -> Option<Self> {
        let left = self.x.max(0.0);
        let top = self.y.max(0.0);
        let right = (self.x + self.width).min(width as f32);
        let bottom = (self.y + self.height).min(height as f32);
        if right <= left || bottom <= top {
            return None;
        }
        Some(Self::new(left, top, right - left, bottom - top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smaller_y_is_above() {
        assert!(Point::new(0.0, 10.0).is_above(&Point::new(0.0, 20.0)));
        assert!(!Point::new(0.0, 20.0).is_above(&Point::new(0.0, 20.0)));
    }

    #[test]
    fn enclosing_box_covers_all_points() {
        let bbox = BoundingBox::enclosing(&[
            Point::new(10.0, 40.0),
            Point::new(30.0, 5.0),
            Point::new(20.0, 25.0),
        ])
        .expect("non-empty");
        assert_eq!(bbox, BoundingBox::new(10.0, 5.0, 20.0, 35.0));
        assert!(BoundingBox::enclosing(&[]).is_none());
    }

    #[test]
    fn clamping_trims_to_frame_and_drops_offscreen_boxes() {
        let bbox = BoundingBox::new(-10.0, 90.0, 50.0, 50.0);
        assert_eq!(
            bbox.clamp_to(100, 100),
            Some(BoundingBox::new(0.0, 90.0, 40.0, 10.0))
        );
        assert!(BoundingBox::new(120.0, 0.0, 10.0, 10.0)
            .clamp_to(100, 100)
            .is_none());
    }
}
