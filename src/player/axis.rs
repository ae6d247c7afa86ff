//! Conversion between Z-up and Y-up coordinate conventions, plus bounds diagnostics.

use glam::Vec3;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
pub enum Axis {
    X,
    Y,
    Z,
}

/// Maps a point authored with Z up into the Y-up frame the viewer uses.
#[inline]
pub fn z_up_to_y_up(p: Vec3) -> Vec3 {
    Vec3::new(p.x, p.z, -p.y)
}

/// Inverse of [`z_up_to_y_up`].
#[inline]
pub fn y_up_to_z_up(p: Vec3) -> Vec3 {
    Vec3::new(p.x, -p.z, p.y)
}

/// Axis aligned bounds of a point set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisBounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl AxisBounds {
    /// Returns `None` for an empty point set.
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut points = points.into_iter();
        let first = points.next()?;

        Some(points.fold(
            Self {
                min: first,
                max: first,
            },
            |bounds, p| Self {
                min: bounds.min.min(p),
                max: bounds.max.max(p),
            },
        ))
    }

    pub fn span(&self) -> Vec3 {
        self.max - self.min
    }

    /// The axis with the largest span. A standing skeleton is tallest along its up axis, so this
    /// is a hint about the convention the data was authored in. Ties go to the earlier axis.
    pub fn dominant_axis(&self) -> Axis {
        let span = self.span();
        if span.x >= span.y && span.x >= span.z {
            Axis::X
        } else if span.y >= span.z {
            Axis::Y
        } else {
            Axis::Z
        }
    }
}

impl std::fmt::Display for AxisBounds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let span = self.span();
        write!(
            f,
            "x: [{:.3}, {:.3}] ({:.3}), y: [{:.3}, {:.3}] ({:.3}), z: [{:.3}, {:.3}] ({:.3})",
            self.min.x,
            self.max.x,
            span.x,
            self.min.y,
            self.max.y,
            span.y,
            self.min.z,
            self.max.z,
            span.z,
        )
    }
}
