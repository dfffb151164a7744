use glam::Vec3;

use super::float::{fma, frsqrt, sqrt};

/// Vector operations with the engine's rounding behavior.
///
/// `glam`'s own `dot`, `cross`, `length_squared` and component-wise arithmetic already evaluate
/// in the same order and are used directly. Anything involving a square root or a fused
/// multiply-add lives here.
pub trait Vec3Ext: Sized {
    /// Length using the emulated square root.
    fn mag(self) -> f32;
    /// Normalizes in place and returns the previous length, or leaves the vector untouched and
    /// returns `0.0` when its squared length is within `f32::EPSILON`.
    fn normalise(&mut self) -> f32;
    /// Normalizes in place with a single reciprocal square root.
    fn normalise2(&mut self);
    /// Copy of `self` normalized, or unchanged when degenerate.
    fn normalised(self) -> Self;
    /// Projection onto the unit vector `rhs`.
    fn proj(self, rhs: Self) -> Self;
    /// Rejection from the unit vector `rhs`.
    fn rej(self, rhs: Self) -> Self;
    fn proj_and_rej(self, rhs: Self) -> (Self, Self);
    fn maximize(self, rhs: Self) -> Self;
    fn minimize(self, rhs: Self) -> Self;
    /// Paired-single dot product.
    fn ps_dot(self, rhs: Self) -> f32;
    /// Component of `self` perpendicular to `rhs`, computed through a double cross product.
    fn perp_in_plane(self, rhs: Self, normalise: bool) -> Self;
}

impl Vec3Ext for Vec3 {
    #[inline]
    fn mag(self) -> f32 {
        sqrt(self.length_squared())
    }

    #[inline]
    fn normalise(&mut self) -> f32 {
        let mut len = 0.0;

        if self.length_squared() > f32::EPSILON {
            len = self.mag();
            *self *= 1.0 / len;
        }

        len
    }

    #[inline]
    fn normalise2(&mut self) {
        let sq_len = self.length_squared();
        if sq_len > f32::EPSILON {
            *self *= frsqrt(sq_len);
        }
    }

    #[inline]
    fn normalised(mut self) -> Self {
        self.normalise();
        self
    }

    #[inline]
    fn proj(self, rhs: Self) -> Self {
        rhs * rhs.dot(self)
    }

    #[inline]
    fn rej(self, rhs: Self) -> Self {
        self - self.proj(rhs)
    }

    #[inline]
    fn proj_and_rej(self, rhs: Self) -> (Self, Self) {
        (self.proj(rhs), self.rej(rhs))
    }

    #[inline]
    fn maximize(self, rhs: Self) -> Self {
        Self::new(
            if self.x > rhs.x { self.x } else { rhs.x },
            if self.y > rhs.y { self.y } else { rhs.y },
            if self.z > rhs.z { self.z } else { rhs.z },
        )
    }

    #[inline]
    fn minimize(self, rhs: Self) -> Self {
        Self::new(
            if self.x < rhs.x { self.x } else { rhs.x },
            if self.y < rhs.y { self.y } else { rhs.y },
            if self.z < rhs.z { self.z } else { rhs.z },
        )
    }

    #[inline]
    fn ps_dot(self, rhs: Self) -> f32 {
        let y = self.y * rhs.y;
        let xy = fma(self.x, rhs.x, y);
        xy + self.z * rhs.z
    }

    fn perp_in_plane(self, rhs: Self, normalise: bool) -> Self {
        if self.dot(rhs).abs() == 1.0 {
            return Self::ZERO;
        }

        let x = (rhs.z * self.x - rhs.x * self.z) * rhs.z - (rhs.x * self.y - rhs.y * self.x) * rhs.y;
        let y = (rhs.x * self.y - rhs.y * self.x) * rhs.x - (rhs.y * self.z - rhs.z * self.y) * rhs.z;
        let z = (rhs.y * self.z - rhs.z * self.y) * rhs.y - (rhs.z * self.x - rhs.x * self.z) * rhs.x;

        let mut ret = Self::new(x, y, z);
        if normalise {
            ret.normalise();
        }

        ret
    }
}
