use glam::{Quat, Vec3};

use super::float::sqrt;

/// Quaternion operations with the engine's exact evaluation order.
///
/// `glam::Quat` is only used as storage here: its own products go through SIMD shuffles whose
/// rounding does not match, so every product, rotation and interpolation used by the simulation
/// is spelled out component by component.
pub trait QuatExt: Sized {
    /// Roll/pitch/yaw (radians) to quaternion.
    fn from_rpy(rpy: Vec3) -> Self;
    /// Shortest-arc rotation taking unit vector `from` onto unit vector `to`.
    fn make_vector_rotation(from: Vec3, to: Vec3) -> Self;
    fn squared_norm(self) -> f32;
    fn quat_dot(self, rhs: Self) -> f32;
    fn add_quat(self, rhs: Self) -> Self;
    fn scale_quat(self, scalar: f32) -> Self;
    /// Hamilton product `self * rhs`.
    fn mult_swap(self, rhs: Self) -> Self;
    /// Hamilton product with the pure quaternion `(0, vec)`.
    fn mult_swap_vec(self, vec: Vec3) -> Self;
    /// The pure-vector product used inside the rotation helpers.
    fn mult_vec(self, vec: Vec3) -> Self;
    fn rotate_vector(self, vec: Vec3) -> Vec3;
    fn rotate_vector_inv(self, vec: Vec3) -> Vec3;
    /// Normalizes in place unless the squared norm is within `f32::EPSILON`.
    fn normalise(&mut self);
    fn slerp_to(self, q1: Self, t: f32) -> Self;
    /// Whether the squared norm is within `tolerance` of one.
    fn is_unit(self, tolerance: f32) -> bool;
}

#[inline]
const fn quat(w: f32, v: Vec3) -> Quat {
    Quat::from_xyzw(v.x, v.y, v.z, w)
}

#[inline]
fn vec(q: Quat) -> Vec3 {
    Vec3::new(q.x, q.y, q.z)
}

impl QuatExt for Quat {
    fn from_rpy(rpy: Vec3) -> Self {
        let cy = (rpy.z * 0.5).cos();
        let cp = (rpy.y * 0.5).cos();
        let cr = (rpy.x * 0.5).cos();
        let sy = (rpy.z * 0.5).sin();
        let sp = (rpy.y * 0.5).sin();
        let sr = (rpy.x * 0.5).sin();

        Self::from_xyzw(
            cy * cp * sr - sy * sp * cr,
            cy * sp * cr + sy * cp * sr,
            sy * cp * cr - cy * sp * sr,
            cy * cp * cr + sy * sp * sr,
        )
    }

    fn make_vector_rotation(from: Vec3, to: Vec3) -> Self {
        let t0 = sqrt(f32::max(0.0, (from.dot(to) + 1.0) * 2.0));

        if t0 <= f32::EPSILON {
            Self::IDENTITY
        } else {
            let inv = 1.0 / t0;
            quat(t0 * 0.5, from.cross(to) * inv)
        }
    }

    #[inline]
    fn squared_norm(self) -> f32 {
        self.w * self.w + vec(self).length_squared()
    }

    #[inline]
    fn quat_dot(self, rhs: Self) -> f32 {
        self.w * rhs.w + vec(self).dot(vec(rhs))
    }

    #[inline]
    fn add_quat(self, rhs: Self) -> Self {
        quat(self.w + rhs.w, vec(self) + vec(rhs))
    }

    #[inline]
    fn scale_quat(self, scalar: f32) -> Self {
        quat(self.w * scalar, vec(self) * scalar)
    }

    #[inline]
    fn mult_swap(self, q: Self) -> Self {
        let w = ((self.w * q.w - self.x * q.x) - self.y * q.y) - self.z * q.z;
        let x = (self.y * q.z + (self.x * q.w + self.w * q.x)) - self.z * q.y;
        let y = (self.z * q.x + (self.y * q.w + self.w * q.y)) - self.x * q.z;
        let z = (self.x * q.y + (self.z * q.w + self.w * q.z)) - self.y * q.x;

        Self::from_xyzw(x, y, z, w)
    }

    #[inline]
    fn mult_swap_vec(self, vec3: Vec3) -> Self {
        let w = -vec(self).dot(vec3);
        let x = (self.w * vec3.x + self.y * vec3.z) - self.z * vec3.y;
        let y = (self.w * vec3.y + self.z * vec3.x) - self.x * vec3.z;
        let z = (self.w * vec3.z + self.x * vec3.y) - self.y * vec3.x;

        Self::from_xyzw(x, y, z, w)
    }

    #[inline]
    fn mult_vec(self, vec3: Vec3) -> Self {
        let v = vec(self);
        let cross = v.cross(vec3);
        let scale = vec3 * self.w;
        quat(-v.dot(vec3), cross + scale)
    }

    fn rotate_vector(self, vec3: Vec3) -> Vec3 {
        let conj = quat(self.w, -vec(self));
        let res = self.mult_vec(vec3);

        Vec3::new(
            (res.y * conj.z + (res.x * conj.w + res.w * conj.x)) - res.z * conj.y,
            (res.z * conj.x + (res.y * conj.w + res.w * conj.y)) - res.x * conj.z,
            (res.x * conj.y + (res.z * conj.w + res.w * conj.z)) - res.y * conj.x,
        )
    }

    fn rotate_vector_inv(self, vec3: Vec3) -> Vec3 {
        let conj = quat(self.w, -vec(self));
        let res = conj.mult_vec(vec3);

        Vec3::new(
            (res.y * self.z + (res.x * self.w + res.w * self.x)) - res.z * self.y,
            (res.z * self.x + (res.y * self.w + res.w * self.y)) - res.x * self.z,
            (res.x * self.y + (res.z * self.w + res.w * self.z)) - res.y * self.x,
        )
    }

    fn normalise(&mut self) {
        let sq_norm = self.squared_norm();
        let len = if sq_norm > f32::EPSILON {
            sqrt(sq_norm)
        } else {
            0.0
        };

        if len != 0.0 {
            let inv = 1.0 / len;
            *self = quat(self.w * inv, vec(*self) * inv);
        }
    }

    fn slerp_to(self, q1: Self, t: f32) -> Self {
        let dot = self.quat_dot(q1).clamp(-1.0, 1.0);
        let negate = dot < 0.0;
        let dot = dot.abs();

        let acos = dot.acos();
        let sin = acos.sin();

        let (s, mut t) = if sin.abs() < 0.00001 {
            (1.0 - t, t)
        } else {
            let inv_sin = 1.0 / sin;
            let tmp0 = t * acos;
            (inv_sin * (acos - tmp0).sin(), inv_sin * tmp0.sin())
        };

        if negate {
            t = -t;
        }

        quat(s * self.w + t * q1.w, vec(self) * s + vec(q1) * t)
    }

    #[inline]
    fn is_unit(self, tolerance: f32) -> bool {
        (self.squared_norm() - 1.0).abs() <= tolerance
    }
}
