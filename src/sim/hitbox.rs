use arrayvec::ArrayVec;
use glam::{Quat, Vec3};

use super::params::HitboxParams;
use crate::math::{Matrix34, QuatExt, Vec3Ext};

/// Upper bound of enabled hitboxes per vehicle body.
pub const MAX_HITBOXES: usize = 16;

/// A collision sphere attached to the vehicle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Hitbox {
    params: HitboxParams,
    radius: f32,
    world_pos: Vec3,
    last_pos: Vec3,
    rel_pos: Vec3,
}

impl Hitbox {
    #[must_use]
    pub const fn new(params: HitboxParams) -> Self {
        Self {
            params,
            radius: params.radius,
            world_pos: Vec3::ZERO,
            last_pos: Vec3::ZERO,
            rel_pos: Vec3::ZERO,
        }
    }

    /// Places the sphere for this tick.
    ///
    /// A vehicle squashed below `total_scale` on y is lifted by the missing part of the radius, and
    /// `sink_depth` lowers the sphere into soft ground.
    pub fn calc(&mut self, total_scale: f32, sink_depth: f32, scale: Vec3, rot: Quat, pos: Vec3) {
        let lift = if scale.y < total_scale {
            (total_scale - scale.y) * self.params.radius
        } else {
            0.0
        };

        let mut scaled = self.params.rel_position * scale;
        scaled.y = (self.params.rel_position.y + sink_depth) * scale.y + lift;

        self.rel_pos = rot.rotate_vector(scaled);
        self.world_pos = self.rel_pos + pos;
    }

    /// Re-derives the sweep start point from the refreshed pose.
    pub fn set_last_pos_from_pose(&mut self, scale: Vec3, pose: &Matrix34) {
        let mut y_factor = scale.y;
        let mut scaled = self.params.rel_position;
        scaled.x *= scale.x;
        scaled.z *= scale.z;

        if scale.y != scale.z && scale.y < 1.0 {
            scaled.y += (1.0 - scale.y) * self.radius;
            y_factor = scale.z;
        }

        scaled.y *= y_factor;
        self.last_pos = pose.ps_mult_vector(scaled);
    }

    pub fn reset(&mut self) {
        self.world_pos = Vec3::ZERO;
        self.last_pos = Vec3::ZERO;
        self.rel_pos = Vec3::ZERO;
    }

    #[must_use]
    pub const fn params(&self) -> &HitboxParams {
        &self.params
    }

    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    pub const fn set_radius(&mut self, radius: f32) {
        self.radius = radius;
    }

    pub(crate) const fn set_base_radius(&mut self, radius: f32) {
        self.params.radius = radius;
    }

    #[must_use]
    pub const fn world_pos(&self) -> Vec3 {
        self.world_pos
    }

    pub const fn set_world_pos(&mut self, pos: Vec3) {
        self.world_pos = pos;
    }

    #[must_use]
    pub const fn last_pos(&self) -> Vec3 {
        self.last_pos
    }

    pub const fn set_last_pos(&mut self, pos: Vec3) {
        self.last_pos = pos;
    }

    /// Position relative to the body center, rotated into world space.
    #[must_use]
    pub const fn rel_pos(&self) -> Vec3 {
        self.rel_pos
    }
}

/// The fixed set of spheres making up one collision volume.
#[derive(Clone, Debug, PartialEq)]
pub struct HitboxSet {
    hitboxes: ArrayVec<Hitbox, MAX_HITBOXES>,
    bounding_radius: f32,
    hitbox_scale: f32,
}

impl HitboxSet {
    /// Builds the set from every enabled descriptor.
    ///
    /// Returns the set and the fore/aft collision limit (half the furthest z extent).
    ///
    /// # Panics
    ///
    /// Panics if no descriptor is enabled or more than [`MAX_HITBOXES`] are.
    #[must_use]
    pub fn from_params(params: &[HitboxParams]) -> (Self, f32) {
        let enabled = params.iter().filter(|p| p.enabled).count();
        assert!(
            enabled > 0,
            "HitboxSet::from_params(): a vehicle needs at least one enabled hitbox"
        );
        assert!(
            enabled <= MAX_HITBOXES,
            "HitboxSet::from_params(): {enabled} enabled hitboxes exceed the limit of {MAX_HITBOXES}"
        );

        let hitboxes = params
            .iter()
            .filter(|p| p.enabled)
            .map(|p| Hitbox::new(*p))
            .collect();

        let mut set = Self {
            hitboxes,
            bounding_radius: 0.0,
            hitbox_scale: 1.0,
        };
        let limit = set.compute_collision_limits();

        (set, limit)
    }

    /// The one-sphere set used by a wheel.
    #[must_use]
    pub fn single(radius: f32, rel_position: Vec3) -> Self {
        let mut hitboxes = ArrayVec::new();
        hitboxes.push(Hitbox::new(HitboxParams::new(rel_position, radius)));

        Self {
            hitboxes,
            bounding_radius: radius,
            hitbox_scale: 1.0,
        }
    }

    fn compute_collision_limits(&mut self) -> f32 {
        let mut max = Vec3::ZERO;

        for hitbox in &self.hitboxes {
            let params = hitbox.params();
            max = max.maximize(params.rel_position.abs() + params.radius);
        }

        let mut max_component = max.z;
        if max.x <= max.y {
            if max.z < max.y {
                max_component = max.y;
            }
        } else if max.z < max.x {
            max_component = max.x;
        }

        self.bounding_radius = max_component;

        max.z * 0.5
    }

    /// Places every hitbox for this tick.
    pub fn calc(&mut self, total_scale: f32, sink_depth: f32, scale: Vec3, rot: Quat, pos: Vec3) {
        for hitbox in &mut self.hitboxes {
            hitbox.calc(total_scale, sink_depth, scale, rot, pos);
        }
    }

    /// Clears positions and restores every radius to `base * hitbox_scale`.
    pub fn reset(&mut self) {
        for hitbox in &mut self.hitboxes {
            hitbox.reset();
            hitbox.set_radius(hitbox.params().radius * self.hitbox_scale);
        }
    }

    pub fn set_hitbox_scale(&mut self, scale: f32) {
        self.hitbox_scale = scale;

        for hitbox in &mut self.hitboxes {
            hitbox.set_radius(hitbox.params().radius * scale);
        }
    }

    pub fn set_last_pos_from_pose(&mut self, scale: Vec3, pose: &Matrix34) {
        for hitbox in &mut self.hitboxes {
            hitbox.set_last_pos_from_pose(scale, pose);
        }
    }

    #[must_use]
    pub const fn bounding_radius(&self) -> f32 {
        self.bounding_radius
    }

    #[must_use]
    pub const fn hitbox_scale(&self) -> f32 {
        self.hitbox_scale
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.hitboxes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hitboxes.is_empty()
    }

    #[must_use]
    pub fn hitbox(&self, idx: usize) -> &Hitbox {
        &self.hitboxes[idx]
    }

    pub fn hitbox_mut(&mut self, idx: usize) -> &mut Hitbox {
        &mut self.hitboxes[idx]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Hitbox> {
        self.hitboxes.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Hitbox> {
        self.hitboxes.iter_mut()
    }
}
