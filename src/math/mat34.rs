#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::mat3::Mat3;
use super::quat::Quat;
use super::vec3::Vec3;

/// A 3x4 affine transform: a rotation block followed by a translation column.
///
/// Rigid bodies cache one of these per step. Column `i < 3` is the body's local
/// axis `i` in world space and column 3 is its position, which is how the box
/// collision routines read it.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Mat34 {
    /// Rotation part
    pub rotation: Mat3,
    /// Translation part
    pub translation: Vec3,
}

impl Default for Mat34 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat34 {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        rotation: Mat3::IDENTITY,
        translation: Vec3::ZERO,
    };

    /// Builds the transform for a body at `position` with unit `orientation`
    #[inline]
    pub fn from_position_orientation(position: Vec3, orientation: Quat) -> Self {
        Self {
            rotation: Mat3::from_quat(orientation),
            translation: position,
        }
    }

    /// Returns column `index`: the local axes for 0..3, the translation for 3.
    #[inline]
    pub fn axis(&self, index: usize) -> Vec3 {
        if index == 3 {
            self.translation
        } else {
            self.rotation.cols[index]
        }
    }

    /// Transforms a point from local space to world space
    #[inline]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation * point + self.translation
    }

    /// Transforms a direction from local space to world space (no translation)
    #[inline]
    pub fn transform_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation * direction
    }

    /// Transforms a world point into local space.
    ///
    /// Assumes the rotation block is orthonormal, which holds for body transforms.
    #[inline]
    pub fn transform_inverse_point(&self, point: Vec3) -> Vec3 {
        self.rotation.transform_transpose(point - self.translation)
    }

    /// Transforms a world direction into local space
    #[inline]
    pub fn transform_inverse_direction(&self, direction: Vec3) -> Vec3 {
        self.rotation.transform_transpose(direction)
    }

    /// Exports a column-major 4x4 homogeneous matrix, the layout most renderers expect.
    pub fn to_cols_array_4x4(&self) -> [f32; 16] {
        let r = &self.rotation.cols;
        let t = self.translation;
        #[rustfmt::skip]
        let m = [
            r[0].x, r[0].y, r[0].z, 0.0,
            r[1].x, r[1].y, r[1].z, 0.0,
            r[2].x, r[2].y, r[2].z, 0.0,
            t.x, t.y, t.z, 1.0,
        ];
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    #[test]
    fn test_transform_point_roundtrip() {
        let t = Mat34::from_position_orientation(
            Vec3::new(1.0, 2.0, 3.0),
            Quat::from_axis_angle(Vec3::new(0.0, 1.0, 1.0), 0.9),
        );
        let p = Vec3::new(-0.5, 0.25, 2.0);
        let world = t.transform_point(p);
        assert_relative_eq!(t.transform_inverse_point(world), p, epsilon = 1e-5);

        let d = Vec3::new(1.0, 0.0, -1.0);
        let world_dir = t.transform_direction(d);
        assert_relative_eq!(t.transform_inverse_direction(world_dir), d, epsilon = 1e-5);
    }

    #[test]
    fn test_axis_columns() {
        let t = Mat34::from_position_orientation(
            Vec3::new(4.0, 5.0, 6.0),
            Quat::from_axis_angle(Vec3::Z, PI / 2.0),
        );
        assert_relative_eq!(t.axis(0), Vec3::Y, epsilon = 1e-5);
        assert_relative_eq!(t.axis(1), -Vec3::X, epsilon = 1e-5);
        assert_relative_eq!(t.axis(2), Vec3::Z, epsilon = 1e-5);
        assert_eq!(t.axis(3), Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_to_cols_array_4x4() {
        let t = Mat34::from_position_orientation(Vec3::new(1.0, 2.0, 3.0), Quat::IDENTITY);
        let m = t.to_cols_array_4x4();
        assert_eq!(&m[0..4], &[1.0, 0.0, 0.0, 0.0]);
        assert_eq!(&m[12..16], &[1.0, 2.0, 3.0, 1.0]);
    }
}
