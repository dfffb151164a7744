use std::ops::{Index, IndexMut};

use glam::{Quat, Vec3};

use super::float::fma;

/// Row-major 3x4 affine matrix: a 3x3 rotation/scale block with the translation in column 3.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Matrix34 {
    pub mtx: [[f32; 4]; 3],
}

impl Default for Matrix34 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Index<(usize, usize)> for Matrix34 {
    type Output = f32;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f32 {
        &self.mtx[row][col]
    }
}

impl IndexMut<(usize, usize)> for Matrix34 {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f32 {
        &mut self.mtx[row][col]
    }
}

impl Matrix34 {
    pub const ZERO: Self = Self {
        mtx: [[0.0; 4]; 3],
    };

    pub const IDENTITY: Self = Self {
        mtx: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ],
    };

    /// Rotation matrix from a unit quaternion, with no translation.
    #[must_use]
    pub fn make_q(q: Quat) -> Self {
        Self::make_qt(q, Vec3::ZERO)
    }

    /// Rotation from a unit quaternion followed by translation `t`.
    #[must_use]
    pub fn make_qt(q: Quat, t: Vec3) -> Self {
        let yy = 2.0 * q.y * q.y;
        let zz = 2.0 * q.z * q.z;
        let xx = 2.0 * q.x * q.x;
        let xy = 2.0 * q.x * q.y;
        let xz = 2.0 * q.x * q.z;
        let yz = 2.0 * q.y * q.z;
        let wz = 2.0 * q.w * q.z;
        let wx = 2.0 * q.w * q.x;
        let wy = 2.0 * q.w * q.y;

        Self {
            mtx: [
                [1.0 - yy - zz, xy - wz, xz + wy, t.x],
                [xy + wz, 1.0 - xx - zz, yz - wx, t.y],
                [xz - wy, yz + wx, 1.0 - xx - yy, t.z],
            ],
        }
    }

    /// Rotation from Euler angles in radians (x, then y, then z), with no translation.
    #[must_use]
    pub fn make_r(r: Vec3) -> Self {
        Self::make_rt(r, Vec3::ZERO)
    }

    #[must_use]
    pub fn make_rt(r: Vec3, t: Vec3) -> Self {
        let sin = [r.x.sin(), r.y.sin(), r.z.sin()];
        let cos = [r.x.cos(), r.y.cos(), r.z.cos()];

        let c0_c2 = cos[0] * cos[2];
        let s0_s1 = sin[0] * sin[1];
        let c0_s2 = cos[0] * sin[2];

        Self {
            mtx: [
                [
                    cos[1] * cos[2],
                    s0_s1 * cos[2] - c0_s2,
                    c0_c2 * sin[1] + sin[0] * sin[2],
                    t.x,
                ],
                [
                    cos[1] * sin[2],
                    s0_s1 * sin[2] + c0_c2,
                    c0_s2 * sin[1] - sin[0] * cos[2],
                    t.y,
                ],
                [-sin[1], sin[0] * cos[1], cos[0] * cos[1], t.z],
            ],
        }
    }

    /// `self * rhs` with the hardware's fused accumulation order.
    ///
    /// Entries (1, 2) and (2, 2) carry the translation of the same row, reproducing the engine.
    #[must_use]
    pub fn multiply_to(&self, rhs: &Self) -> Self {
        let m = &self.mtx;
        let mut mat = Self::ZERO;

        for row in 0..3 {
            for col in 0..3 {
                mat[(row, col)] = fma(
                    rhs[(2, col)],
                    m[row][2],
                    fma(rhs[(1, col)], m[row][1], rhs[(0, col)] * m[row][0]),
                );
            }

            mat[(row, 3)] = fma(
                1.0,
                m[row][3],
                fma(
                    rhs[(2, 3)],
                    m[row][2],
                    fma(rhs[(1, 3)], m[row][1], rhs[(0, 3)] * m[row][0]),
                ),
            );
        }

        mat[(1, 2)] += m[1][3];
        mat[(2, 2)] += m[2][3];

        mat
    }

    #[must_use]
    pub fn mult_vector(&self, vec: Vec3) -> Vec3 {
        let m = &self.mtx;
        Vec3::new(
            m[0][2] * vec.z + m[0][0] * vec.x + m[0][3] + m[0][1] * vec.y,
            m[1][2] * vec.z + m[1][0] * vec.x + m[1][3] + m[1][1] * vec.y,
            m[2][2] * vec.z + m[2][0] * vec.x + m[2][3] + m[2][1] * vec.y,
        )
    }

    /// Affine transform with paired-single fused evaluation.
    #[must_use]
    pub fn ps_mult_vector(&self, vec: Vec3) -> Vec3 {
        let row = |r: &[f32; 4]| {
            fma(r[2], vec.z, r[0] * vec.x) + fma(r[3], 1.0, r[1] * vec.y)
        };

        Vec3::new(row(&self.mtx[0]), row(&self.mtx[1]), row(&self.mtx[2]))
    }

    /// Multiplies by the 3x3 block only, ignoring translation.
    #[must_use]
    pub fn mult_vector33(&self, vec: Vec3) -> Vec3 {
        let m = &self.mtx;
        Vec3::new(
            m[0][2] * vec.z + m[0][0] * vec.x + m[0][1] * vec.y,
            m[1][2] * vec.z + m[1][0] * vec.x + m[1][1] * vec.y,
            m[2][2] * vec.z + m[2][0] * vec.x + m[2][1] * vec.y,
        )
    }

    /// Inverse of the 3x3 block. A singular matrix yields the identity.
    #[must_use]
    pub fn inverse_to33(&self) -> Self {
        let m = &self.mtx;
        let determinant = (((m[2][1] * m[0][2] * m[1][0]
            + m[2][2] * m[0][0] * m[1][1]
            + m[2][0] * m[0][1] * m[1][2])
            - m[0][2] * m[2][0] * m[1][1])
            - m[2][2] * m[1][0] * m[0][1])
            - m[1][2] * m[0][0] * m[2][1];

        if determinant == 0.0 {
            return Self::IDENTITY;
        }

        let inv_det = 1.0 / determinant;
        let mut ret = Self::ZERO;

        ret[(0, 2)] = (m[0][1] * m[1][2] - m[1][1] * m[0][2]) * inv_det;
        ret[(1, 2)] = -(m[0][0] * m[1][2] - m[0][2] * m[1][0]) * inv_det;
        ret[(2, 1)] = -(m[0][0] * m[2][1] - m[2][0] * m[0][1]) * inv_det;
        ret[(2, 2)] = (m[0][0] * m[1][1] - m[1][0] * m[0][1]) * inv_det;
        ret[(2, 0)] = (m[1][0] * m[2][1] - m[2][0] * m[1][1]) * inv_det;
        ret[(0, 0)] = (m[1][1] * m[2][2] - m[2][1] * m[1][2]) * inv_det;
        ret[(0, 1)] = -(m[0][1] * m[2][2] - m[2][1] * m[0][2]) * inv_det;
        ret[(1, 0)] = -(m[1][0] * m[2][2] - m[2][0] * m[1][2]) * inv_det;
        ret[(1, 1)] = (m[0][0] * m[2][2] - m[2][0] * m[0][2]) * inv_det;

        ret
    }

    /// Transposes the 3x3 block and keeps the translation column.
    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut ret = *self;

        for row in 0..3 {
            for col in 0..3 {
                ret.mtx[row][col] = self.mtx[col][row];
            }
        }

        ret
    }

    /// Column `col` of the matrix.
    #[must_use]
    pub fn base(&self, col: usize) -> Vec3 {
        Vec3::new(self.mtx[0][col], self.mtx[1][col], self.mtx[2][col])
    }

    pub fn set_base(&mut self, col: usize, base: Vec3) {
        self.mtx[0][col] = base.x;
        self.mtx[1][col] = base.y;
        self.mtx[2][col] = base.z;
    }

    #[must_use]
    pub fn translation(&self) -> Vec3 {
        self.base(3)
    }
}
