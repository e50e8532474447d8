//! Axis-aligned bounding volumes.

use crate::math::Vec3;

/// Axis-aligned bounding box.
///
/// A freshly constructed box is invalid (min > max) until a point is added;
/// an invalid box has a radius of zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::empty()
    }
}

impl BoundingBox {
    pub const fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    /// Box enclosing every point of `points`.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Self {
        let mut bbox = Self::empty();
        for point in points {
            bbox.expand_by(*point);
        }
        bbox
    }

    pub fn expand_by(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Radius of the sphere passing through the box corners.
    pub fn radius(&self) -> f32 {
        if self.is_valid() {
            (self.max - self.min).length() * 0.5
        } else {
            0.0
        }
    }
}
