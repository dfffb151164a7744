use glam::Vec3;

use super::terrain::{NONE, TerrainMask};

/// The aggregated result of one collision pass of the body or of a single wheel.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CollisionData {
    /// Offset that pushes the colliding volume out of the track.
    pub penetration_offset: Vec3,
    pub floor_normal: Vec3,
    /// Accumulated, un-normalized until the pass ends.
    pub wall_normal: Vec3,
    pub soft_wall_normal: Vec3,
    /// Velocity of the contact point.
    pub velocity: Vec3,
    /// Contact point relative to the body center.
    pub relative_position: Vec3,
    /// Positional correction applied by a wall-only contact.
    pub movement: Vec3,
    pub road_velocity: Vec3,
    pub speed_factor: f32,
    pub rot_factor: f32,
    pub closest_floor_flags: TerrainMask,
    pub closest_floor_settings: u32,
    pub closest_wall_flags: u32,
    pub closest_wall_settings: u32,
    pub intensity: i32,
    pub contact_count: u32,

    pub has_floor: bool,
    pub has_wall: bool,
    /// Contact with the secondary wall type.
    pub has_wall3: bool,
    pub has_invisible_wall: bool,
    pub has_invisible_wall_only: bool,
    pub has_soft_wall: bool,
    pub trickable: bool,
    pub reject_road: bool,
    pub has_road_velocity: bool,
}

impl Default for CollisionData {
    fn default() -> Self {
        Self::new()
    }
}

impl CollisionData {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            penetration_offset: Vec3::ZERO,
            floor_normal: Vec3::ZERO,
            wall_normal: Vec3::ZERO,
            soft_wall_normal: Vec3::ZERO,
            velocity: Vec3::ZERO,
            relative_position: Vec3::ZERO,
            movement: Vec3::ZERO,
            road_velocity: Vec3::ZERO,
            speed_factor: 1.0,
            rot_factor: 1.0,
            closest_floor_flags: NONE,
            closest_floor_settings: u32::MAX,
            closest_wall_flags: 0,
            closest_wall_settings: 0,
            intensity: 0,
            contact_count: 0,
            has_floor: false,
            has_wall: false,
            has_wall3: false,
            has_invisible_wall: false,
            has_invisible_wall_only: false,
            has_soft_wall: false,
            trickable: false,
            reject_road: false,
            has_road_velocity: false,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Marks the start of a contact. The handling factor is summed over contacts from zero.
    pub(crate) fn begin_contact(&mut self) {
        if self.contact_count == 0 {
            self.rot_factor = 0.0;
        }
        self.contact_count += 1;
    }

    #[must_use]
    pub const fn has_any_wall(&self) -> bool {
        self.has_wall || self.has_wall3
    }

    #[must_use]
    pub const fn has_contact(&self) -> bool {
        self.has_floor || self.has_wall || self.has_wall3
    }

    /// Replaces the floor contact with one synthesized from other sources.
    pub fn set_floor_contact(&mut self, relative_position: Vec3, velocity: Vec3, floor_normal: Vec3) {
        self.relative_position = relative_position;
        self.velocity = velocity;
        self.floor_normal = floor_normal;
        self.has_floor = true;
    }
}
