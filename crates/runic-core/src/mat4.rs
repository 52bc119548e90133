//! 4x4 matrix kernel: composition, projections, cofactor inverse, and a
//! bounded transform stack.
//!
//! Matrices are stored row-major (`m[row][col]`); [`Mat4::to_cols_array`]
//! produces the column-major `[f32; 16]` layout GPU uniforms expect. The
//! builder-style `translate`/`scale`/`rotate` methods construct the
//! elementary matrix and right-multiply it into the accumulator, so
//! transforms apply in call order to locally-specified geometry.

use std::ops::Mul;

use crate::vec::{Vec3, Vec4};

/// Depth of the bounded transform stack.
pub const MATRIX_STACK_SIZE: usize = 256;

// ---------------------------------------------------------------------------
// Mat4
// ---------------------------------------------------------------------------

/// A 4x4 float matrix, row-major.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mat4(pub [[f32; 4]; 4]);

impl Default for Mat4 {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Self = Self([
        [1.0, 0.0, 0.0, 0.0],
        [0.0, 1.0, 0.0, 0.0],
        [0.0, 0.0, 1.0, 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);

    // -- elementary matrices ------------------------------------------------

    /// Translation by `(x, y, z)`.
    pub const fn translation(x: f32, y: f32, z: f32) -> Self {
        Self([
            [1.0, 0.0, 0.0, x],
            [0.0, 1.0, 0.0, y],
            [0.0, 0.0, 1.0, z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Non-uniform scale by `(x, y, z)`.
    pub const fn scaling(x: f32, y: f32, z: f32) -> Self {
        Self([
            [x, 0.0, 0.0, 0.0],
            [0.0, y, 0.0, 0.0],
            [0.0, 0.0, z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation of `angle_deg` degrees about `axis` (need not be unit length).
    pub fn rotation(angle_deg: f32, axis: Vec3) -> Self {
        let a = axis.normalize();
        let (x, y, z) = (a.x, a.y, a.z);
        let r = angle_deg.to_radians();
        let (s, c) = r.sin_cos();
        let t = 1.0 - c;
        Self([
            [x * x * t + c, x * y * t - z * s, x * z * t + y * s, 0.0],
            [y * x * t + z * s, y * y * t + c, y * z * t - x * s, 0.0],
            [z * x * t - y * s, z * y * t + x * s, z * z * t + c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    // -- accumulator composition --------------------------------------------

    /// Right-multiply a translation into the accumulator.
    #[inline]
    pub fn translate(self, x: f32, y: f32, z: f32) -> Self {
        self * Self::translation(x, y, z)
    }

    /// Right-multiply a scale into the accumulator.
    #[inline]
    pub fn scale(self, x: f32, y: f32, z: f32) -> Self {
        self * Self::scaling(x, y, z)
    }

    /// Right-multiply a rotation into the accumulator.
    #[inline]
    pub fn rotate(self, angle_deg: f32, axis: Vec3) -> Self {
        self * Self::rotation(angle_deg, axis)
    }

    // -- projections ---------------------------------------------------------

    /// OpenGL-style perspective projection. `fov_deg` is the vertical field
    /// of view; `near`/`far` are positive distances to the clip planes.
    pub fn perspective(fov_deg: f32, aspect: f32, near: f32, far: f32) -> Self {
        let f = 1.0 / (fov_deg.to_radians() / 2.0).tan();
        Self([
            [f / aspect, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [
                0.0,
                0.0,
                (far + near) / (near - far),
                (2.0 * far * near) / (near - far),
            ],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// OpenGL-style orthographic projection mapping the box
    /// `[left, right] x [top, bottom] x [near, far]` to clip space.
    pub fn orthographic(left: f32, right: f32, top: f32, bottom: f32, near: f32, far: f32) -> Self {
        Self([
            [
                2.0 / (right - left),
                0.0,
                0.0,
                -(right + left) / (right - left),
            ],
            [
                0.0,
                2.0 / (top - bottom),
                0.0,
                -(top + bottom) / (top - bottom),
            ],
            [0.0, 0.0, -2.0 / (far - near), -(far + near) / (far - near)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    // -- application ----------------------------------------------------------

    /// Transform a homogeneous 4-vector.
    pub fn transform_vec4(&self, v: Vec4) -> Vec4 {
        let m = &self.0;
        Vec4::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z + m[0][3] * v.w,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z + m[1][3] * v.w,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z + m[2][3] * v.w,
            m[3][0] * v.x + m[3][1] * v.y + m[3][2] * v.z + m[3][3] * v.w,
        )
    }

    /// Transform a point (homogeneous `w = 1`, result truncated to xyz).
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.transform_vec4(p.extend(1.0)).truncate()
    }

    // -- determinant / inverse -------------------------------------------------

    /// Determinant via cofactor expansion along the first row.
    pub fn det(&self) -> f32 {
        let m = &self.0;
        m[0][0] * self.minor(0, 0) - m[0][1] * self.minor(0, 1) + m[0][2] * self.minor(0, 2)
            - m[0][3] * self.minor(0, 3)
    }

    /// Inverse via the adjugate. Returns `None` exactly when the determinant
    /// is zero; there is no epsilon tolerance.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.det();
        if det == 0.0 {
            return None;
        }
        let inv_det = 1.0 / det;
        let mut out = [[0.0f32; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                // Adjugate: transposed cofactor matrix.
                let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
                *v = sign * self.minor(j, i) * inv_det;
            }
        }
        Some(Self(out))
    }

    /// 3x3 minor obtained by deleting row `r` and column `c`.
    fn minor(&self, r: usize, c: usize) -> f32 {
        let m = &self.0;
        let mut sub = [[0.0f32; 3]; 3];
        let mut si = 0;
        for i in 0..4 {
            if i == r {
                continue;
            }
            let mut sj = 0;
            for j in 0..4 {
                if j == c {
                    continue;
                }
                sub[si][sj] = m[i][j];
                sj += 1;
            }
            si += 1;
        }
        sub[0][0] * (sub[1][1] * sub[2][2] - sub[1][2] * sub[2][1])
            - sub[0][1] * (sub[1][0] * sub[2][2] - sub[1][2] * sub[2][0])
            + sub[0][2] * (sub[1][0] * sub[2][1] - sub[1][1] * sub[2][0])
    }

    /// Column-major `[f32; 16]` layout for GPU uniform upload.
    pub fn to_cols_array(&self) -> [f32; 16] {
        let m = &self.0;
        [
            m[0][0], m[1][0], m[2][0], m[3][0], //
            m[0][1], m[1][1], m[2][1], m[3][1], //
            m[0][2], m[1][2], m[2][2], m[3][2], //
            m[0][3], m[1][3], m[2][3], m[3][3],
        ]
    }
}

impl Mul for Mat4 {
    type Output = Self;

    /// Standard matrix product: `out[i][j] = sum_k self[i][k] * rhs[k][j]`.
    fn mul(self, rhs: Self) -> Self {
        let a = &self.0;
        let b = &rhs.0;
        let mut out = [[0.0f32; 4]; 4];
        for (i, row) in out.iter_mut().enumerate() {
            for (j, v) in row.iter_mut().enumerate() {
                *v = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j] + a[i][3] * b[3][j];
            }
        }
        Self(out)
    }
}

// ---------------------------------------------------------------------------
// MatrixStack
// ---------------------------------------------------------------------------

/// A bounded LIFO stack of matrices for nested transform scopes.
///
/// `pop` on an empty stack is a no-op returning `None`; callers must not
/// rely on it to signal underflow.
#[derive(Debug, Default)]
pub struct MatrixStack {
    items: Vec<Mat4>,
}

impl MatrixStack {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Push a copy of `mat`. Returns `false` (and pushes nothing) when the
    /// stack is already at [`MATRIX_STACK_SIZE`].
    pub fn push(&mut self, mat: Mat4) -> bool {
        if self.items.len() >= MATRIX_STACK_SIZE {
            return false;
        }
        self.items.push(mat);
        true
    }

    /// Pop the top matrix, or `None` when empty.
    #[inline]
    pub fn pop(&mut self) -> Option<Mat4> {
        self.items.pop()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    fn approx_eq(a: &Mat4, b: &Mat4) -> bool {
        a.0.iter()
            .flatten()
            .zip(b.0.iter().flatten())
            .all(|(x, y)| (x - y).abs() < EPS)
    }

    #[test]
    fn identity_is_multiplicative_unit() {
        let m = Mat4::translation(3.0, -2.0, 5.0);
        assert!(approx_eq(&(Mat4::IDENTITY * m), &m));
        assert!(approx_eq(&(m * Mat4::IDENTITY), &m));
    }

    #[test]
    fn translate_moves_points() {
        let m = Mat4::IDENTITY.translate(1.0, 2.0, 3.0);
        let p = m.transform_point(Vec3::new(1.0, 1.0, 1.0));
        assert_eq!(p, Vec3::new(2.0, 3.0, 4.0));
    }

    #[test]
    fn rotate_quarter_turn_about_z() {
        let m = Mat4::rotation(90.0, Vec3::new(0.0, 0.0, 1.0));
        let p = m.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!((p.x).abs() < EPS);
        assert!((p.y - 1.0).abs() < EPS);
    }

    #[test]
    fn composition_applies_right_to_left() {
        // translate-then-scale accumulator: scale applies to local geometry
        // first, translation second.
        let m = Mat4::IDENTITY.translate(10.0, 0.0, 0.0).scale(2.0, 2.0, 2.0);
        let p = m.transform_point(Vec3::new(1.0, 0.0, 0.0));
        assert!((p.x - 12.0).abs() < EPS);
    }

    #[test]
    fn inverse_round_trip() {
        let m = Mat4::IDENTITY
            .translate(3.0, -1.0, 7.5)
            .rotate(33.0, Vec3::new(1.0, 2.0, 3.0))
            .scale(2.0, 0.5, 4.0);
        assert!(m.det() != 0.0);
        let inv = m.inverse().expect("matrix should be invertible");
        assert!(approx_eq(&(inv * m), &Mat4::IDENTITY));
        assert!(approx_eq(&(m * inv), &Mat4::IDENTITY));
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Mat4::scaling(1.0, 0.0, 1.0);
        assert_eq!(m.det(), 0.0);
        assert!(m.inverse().is_none());
    }

    #[test]
    fn orthographic_maps_corners_to_clip() {
        // The compositor's logical space: 80 columns x 40 rows, y down.
        let m = Mat4::orthographic(0.0, 80.0, 0.0, 40.0, -1.0, 1.0);
        let tl = m.transform_point(Vec3::new(0.0, 0.0, 0.0));
        let br = m.transform_point(Vec3::new(80.0, 40.0, 0.0));
        assert!((tl.x + 1.0).abs() < EPS && (tl.y - 1.0).abs() < EPS);
        assert!((br.x - 1.0).abs() < EPS && (br.y + 1.0).abs() < EPS);
    }

    #[test]
    fn perspective_near_plane_maps_to_minus_one() {
        let m = Mat4::perspective(90.0, 1.0, 1.0, 10.0);
        let v = m.transform_vec4(Vec4::new(0.0, 0.0, -1.0, 1.0));
        assert!((v.z / v.w + 1.0).abs() < EPS);
        let f = m.transform_vec4(Vec4::new(0.0, 0.0, -10.0, 1.0));
        assert!((f.z / f.w - 1.0).abs() < EPS);
    }

    #[test]
    fn stack_is_lifo_and_bounded() {
        let mut stack = MatrixStack::new();
        assert!(stack.pop().is_none()); // empty pop is a no-op

        let a = Mat4::translation(1.0, 0.0, 0.0);
        let b = Mat4::translation(2.0, 0.0, 0.0);
        assert!(stack.push(a));
        assert!(stack.push(b));
        assert_eq!(stack.pop(), Some(b));
        assert_eq!(stack.pop(), Some(a));

        for _ in 0..MATRIX_STACK_SIZE {
            assert!(stack.push(Mat4::IDENTITY));
        }
        assert!(!stack.push(Mat4::IDENTITY)); // full
        assert_eq!(stack.len(), MATRIX_STACK_SIZE);
    }
}
