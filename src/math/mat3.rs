use std::ops::{Add, AddAssign, Mul, Neg};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::quat::Quat;
use super::vec3::Vec3;

/// Column-major 3x3 matrix.
///
/// Rotation blocks, inertia tensors and contact bases are all stored this way.
/// A contact basis keeps the contact normal in column 0 and the two tangents in
/// columns 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(C)]
pub struct Mat3 {
    pub cols: [Vec3; 3],
}

impl Default for Mat3 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat3 {
    pub const ZERO: Self = Self::from_cols(Vec3::ZERO, Vec3::ZERO, Vec3::ZERO);
    pub const IDENTITY: Self = Self::from_cols(Vec3::X, Vec3::Y, Vec3::Z);

    #[inline]
    pub const fn from_cols(c0: Vec3, c1: Vec3, c2: Vec3) -> Self {
        Self { cols: [c0, c1, c2] }
    }

    #[inline]
    pub fn from_diagonal(d: Vec3) -> Self {
        Self::from_cols(Vec3::X * d.x, Vec3::Y * d.y, Vec3::Z * d.z)
    }

    /// Rotation matrix of a unit quaternion: each column is the rotated world axis.
    #[inline]
    pub fn from_quat(q: Quat) -> Self {
        Self::from_cols(q.rotate_vec(Vec3::X), q.rotate_vec(Vec3::Y), q.rotate_vec(Vec3::Z))
    }

    /// Cross product matrix, `skew(v) * u == v.cross(u)`.
    #[inline]
    pub fn skew(v: Vec3) -> Self {
        Self::from_cols(v.cross(Vec3::X), v.cross(Vec3::Y), v.cross(Vec3::Z))
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.cols[col][row]
    }

    #[inline]
    pub fn col(self, index: usize) -> Vec3 {
        self.cols[index]
    }

    #[inline]
    pub fn row(self, index: usize) -> Vec3 {
        let [a, b, c] = self.cols;
        Vec3::new(a[index], b[index], c[index])
    }

    #[inline]
    pub fn transpose(self) -> Self {
        Self::from_cols(self.row(0), self.row(1), self.row(2))
    }

    #[inline]
    pub fn determinant(self) -> f32 {
        let [a, b, c] = self.cols;
        a.dot(b.cross(c))
    }

    /// None when the matrix is singular or not finite.
    pub fn try_inverse(self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        // Rows of the inverse are the pairwise column cross products over det.
        let [a, b, c] = self.cols;
        let rows = Self::from_cols(b.cross(c), c.cross(a), a.cross(b));
        let inverse = rows.transpose() * det.recip();
        inverse.is_finite().then_some(inverse)
    }

    #[inline]
    pub fn transform_vec(self, v: Vec3) -> Vec3 {
        let [a, b, c] = self.cols;
        a * v.x + b * v.y + c * v.z
    }

    /// `self.transpose() * v` without building the transpose.
    ///
    /// For an orthonormal basis this takes a world vector into the basis' frame.
    #[inline]
    pub fn transform_transpose(self, v: Vec3) -> Vec3 {
        let [a, b, c] = self.cols;
        Vec3::new(a.dot(v), b.dot(v), c.dot(v))
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.cols.iter().all(|c| c.is_finite())
    }

    #[inline]
    fn map_cols(self, f: impl Fn(Vec3) -> Vec3) -> Self {
        let [a, b, c] = self.cols;
        Self::from_cols(f(a), f(b), f(c))
    }
}

impl Add for Mat3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        let [a, b, c] = rhs.cols;
        Self::from_cols(self.cols[0] + a, self.cols[1] + b, self.cols[2] + c)
    }
}

impl AddAssign for Mat3 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Neg for Mat3 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        self.map_cols(|c| -c)
    }
}

impl Mul for Mat3 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        rhs.map_cols(|c| self.transform_vec(c))
    }
}

impl Mul<Vec3> for Mat3 {
    type Output = Vec3;

    #[inline]
    fn mul(self, v: Vec3) -> Vec3 {
        self.transform_vec(v)
    }
}

impl Mul<f32> for Mat3 {
    type Output = Self;

    #[inline]
    fn mul(self, s: f32) -> Self {
        self.map_cols(|c| c * s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn assert_mat_eq(a: Mat3, b: Mat3) {
        for col in 0..3 {
            for row in 0..3 {
                assert_relative_eq!(a.get(row, col), b.get(row, col), epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_rows_and_columns() {
        let m = Mat3::from_cols(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
        );
        assert_eq!(m.get(1, 2), 8.0);
        assert_eq!(m.row(0), Vec3::new(1.0, 4.0, 7.0));
        assert_eq!(m.transpose().col(2), Vec3::new(3.0, 6.0, 9.0));
        assert_eq!(m.transpose().transpose(), m);
    }

    #[test]
    fn test_inverse_of_inertia_like_matrix() {
        let m = Mat3::from_cols(
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(1.0, 0.0, 4.0),
        );
        let inv = m.try_inverse().unwrap();
        assert_mat_eq(m * inv, Mat3::IDENTITY);
        assert_mat_eq(inv * m, Mat3::IDENTITY);

        let diag = Mat3::from_diagonal(Vec3::new(2.0, 4.0, 8.0)).try_inverse().unwrap();
        assert_mat_eq(diag, Mat3::from_diagonal(Vec3::new(0.5, 0.25, 0.125)));
    }

    #[test]
    fn test_singular_matrix_has_no_inverse() {
        assert_eq!(Mat3::ZERO.try_inverse(), None);
        assert_eq!(Mat3::from_diagonal(Vec3::new(1.0, 0.0, 1.0)).try_inverse(), None);
    }

    #[test]
    fn test_from_quat_agrees_with_rotate_vec() {
        let q = Quat::from_axis_angle(Vec3::new(0.5, -2.0, 1.0), 1.2);
        let m = Mat3::from_quat(q);
        let v = Vec3::new(-1.0, 0.25, 3.0);
        let (a, b) = (m * v, q.rotate_vec(v));
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
        assert_relative_eq!(m.determinant(), 1.0, epsilon = 1e-5);

        let quarter = Mat3::from_quat(Quat::from_axis_angle(Vec3::X, FRAC_PI_2));
        assert_relative_eq!((quarter * Vec3::Y).z, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_transform_transpose_undoes_rotation() {
        let m = Mat3::from_quat(Quat::from_axis_angle(Vec3::Z, 0.9));
        let v = Vec3::new(1.0, -2.0, 0.5);
        let back = m.transform_transpose(m * v);
        assert_relative_eq!(back.x, v.x, epsilon = 1e-5);
        assert_relative_eq!(back.y, v.y, epsilon = 1e-5);
        assert_relative_eq!(back.z, v.z, epsilon = 1e-5);
    }

    #[test]
    fn test_skew_matches_cross() {
        let v = Vec3::new(1.0, 2.0, 3.0);
        let u = Vec3::new(-4.0, 0.5, 6.0);
        assert_eq!(Mat3::skew(v) * u, v.cross(u));
        assert_mat_eq(Mat3::skew(v).transpose(), -Mat3::skew(v));
    }
}
