use std::ops::{Mul, MulAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::vec3::Vec3;

/// Squared-length slack inside which a quaternion counts as normalized.
const UNIT_TOLERANCE: f32 = 8.0 * f32::EPSILON;

/// Orientation quaternion, vector part `(x, y, z)` and scalar part `w`.
///
/// Integration lets the length drift, so bodies renormalize after every update.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct Quat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    #[inline]
    pub const fn new(x: f32, y: f32, z: f32, w: f32) -> Self {
        Self { x, y, z, w }
    }

    #[inline]
    fn from_parts(v: Vec3, w: f32) -> Self {
        Self::new(v.x, v.y, v.z, w)
    }

    #[inline]
    fn vector(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Rotation of `angle` radians about `axis`. The axis need not be unit length.
    #[inline]
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (sin, cos) = (0.5 * angle).sin_cos();
        Self::from_parts(axis.normalize() * sin, cos)
    }

    #[inline]
    pub fn dot(self, rhs: Self) -> f32 {
        self.vector().dot(rhs.vector()) + self.w * rhs.w
    }

    #[inline]
    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Unit length copy. A zero quaternion becomes the identity.
    ///
    /// Quaternions already unit length to within rounding come back unchanged,
    /// so normalizing twice gives the same bits as normalizing once.
    #[inline]
    pub fn normalize(self) -> Self {
        let len_sq = self.dot(self);
        if len_sq == 0.0 {
            return Self::IDENTITY;
        }
        if (len_sq - 1.0).abs() <= UNIT_TOLERANCE {
            return self;
        }
        let inv_len = len_sq.sqrt().recip();
        Self::from_parts(self.vector() * inv_len, self.w * inv_len)
    }

    #[inline]
    pub fn conjugate(self) -> Self {
        Self::from_parts(-self.vector(), self.w)
    }

    #[inline]
    pub fn rotate_vec(self, v: Vec3) -> Vec3 {
        let u = self.vector();
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    /// First order orientation update under angular velocity `v` for time `scale`:
    /// `self += 0.5 * (0, v * scale) * self`. The result is not normalized.
    #[inline]
    pub fn add_scaled_vector(&mut self, v: Vec3, scale: f32) {
        let spin = Self::from_parts(v * scale, 0.0) * *self;
        self.x += 0.5 * spin.x;
        self.y += 0.5 * spin.y;
        self.z += 0.5 * spin.z;
        self.w += 0.5 * spin.w;
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.vector().is_finite() && self.w.is_finite()
    }
}

impl Mul for Quat {
    type Output = Self;

    /// Hamilton product. `a * b` applies `b` first.
    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let (a, b) = (self.vector(), rhs.vector());
        Self::from_parts(b * self.w + a * rhs.w + a.cross(b), self.w * rhs.w - a.dot(b))
    }
}

impl MulAssign for Quat {
    #[inline]
    fn mul_assign(&mut self, rhs: Self) {
        *self = *self * rhs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::{FRAC_PI_2, PI};

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }

    #[test]
    fn test_quarter_turn_about_y() {
        let q = Quat::from_axis_angle(Vec3::Y, FRAC_PI_2);
        assert_vec_eq(q.rotate_vec(Vec3::Z), Vec3::X);
        assert_vec_eq(q.rotate_vec(Vec3::Y), Vec3::Y);
    }

    #[test]
    fn test_conjugate_is_inverse_rotation() {
        let q = Quat::from_axis_angle(Vec3::new(-1.0, 2.0, 0.5), 2.1);
        let v = Vec3::new(3.0, -1.0, 0.25);
        assert_vec_eq(q.conjugate().rotate_vec(q.rotate_vec(v)), v);
    }

    #[test]
    fn test_product_composes_rotations() {
        let about_z = Quat::from_axis_angle(Vec3::Z, FRAC_PI_2);
        let about_x = Quat::from_axis_angle(Vec3::X, FRAC_PI_2);
        let v = Vec3::new(1.0, 2.0, 3.0);
        assert_vec_eq((about_x * about_z).rotate_vec(v), about_x.rotate_vec(about_z.rotate_vec(v)));

        let mut half = about_z;
        half *= about_z;
        assert_relative_eq!(
            half.dot(Quat::from_axis_angle(Vec3::Z, PI)).abs(),
            1.0,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_normalize() {
        let n = Quat::new(0.0, 3.0, 0.0, 4.0).normalize();
        assert_relative_eq!(n.length(), 1.0, epsilon = 1e-6);
        assert_relative_eq!(n.w, 0.8, epsilon = 1e-6);
        assert_eq!(Quat::new(0.0, 0.0, 0.0, 0.0).normalize(), Quat::IDENTITY);
    }

    #[test]
    fn test_normalize_is_a_fixed_point() {
        let once = Quat::new(0.1, 0.7, -0.2, 0.4).normalize();
        assert_eq!(once.normalize(), once);
    }

    #[test]
    fn test_integrating_spin_reaches_quarter_turn() {
        // PI rad/s for half a second
        let spin = Vec3::new(0.0, PI, 0.0);
        let mut q = Quat::IDENTITY;
        for _ in 0..500 {
            q.add_scaled_vector(spin, 0.001);
            q = q.normalize();
        }

        let expected = Quat::from_axis_angle(Vec3::Y, FRAC_PI_2);
        assert!(q.dot(expected).abs() > 0.999);
    }

    #[test]
    fn test_zero_spin_leaves_orientation() {
        let before = Quat::from_axis_angle(Vec3::X, 0.7);
        let mut q = before;
        q.add_scaled_vector(Vec3::ZERO, 0.5);
        assert_eq!(q, before);
    }
}
