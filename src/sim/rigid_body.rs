use std::fmt::Display;

use glam::{Quat, Vec3};

/// Linear and angular state of the vehicle body.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RigidBodyState {
    pub pos: Vec3,
    /// Velocity induced by forces and collisions.
    pub ext_vel: Vec3,
    /// Drivetrain velocity, set by the external mover.
    pub int_vel: Vec3,
    /// Velocity of a moving object the vehicle stands on.
    pub moving_obj_vel: Vec3,
    /// Velocity of a moving road surface.
    pub moving_road_vel: Vec3,
    /// Sum of every linear velocity after the speed clamp.
    pub velocity: Vec3,
    /// Magnitude of `velocity`.
    pub speed_norm: f32,
    pub acceleration: Vec3,
    /// Angular velocity from accumulated torque.
    pub ang_vel0: Vec3,
    pub ang_vel1: Vec3,
    /// Per-tick angular velocity, cleared after integration.
    pub ang_vel2: Vec3,
    pub main_rot: Quat,
    pub(crate) full_rot: Quat,
    pub special_rot: Quat,
    pub extra_rot: Quat,
    pub total_force: Vec3,
    pub total_torque: Vec3,
    pub gravity: f32,
    /// Up direction the body is stabilized toward.
    pub top: Vec3,
    /// `top` biased toward world up, used by bikes.
    pub top_biased: Vec3,
    pub stabilization_factor: f32,
    /// Signed speed removed from `ext_vel` along the horizontal back axis.
    pub speed_fix: f32,
    pub ang_vel0_y_factor: f32,
    pub force_upright: bool,
    pub no_gravity: bool,
    pub kill_ext_vel_y: bool,
}

impl Default for RigidBodyState {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl RigidBodyState {
    pub const DEFAULT: Self = Self {
        pos: Vec3::ZERO,
        ext_vel: Vec3::ZERO,
        int_vel: Vec3::ZERO,
        moving_obj_vel: Vec3::ZERO,
        moving_road_vel: Vec3::ZERO,
        velocity: Vec3::ZERO,
        speed_norm: 0.0,
        acceleration: Vec3::ZERO,
        ang_vel0: Vec3::ZERO,
        ang_vel1: Vec3::ZERO,
        ang_vel2: Vec3::ZERO,
        main_rot: Quat::IDENTITY,
        full_rot: Quat::IDENTITY,
        special_rot: Quat::IDENTITY,
        extra_rot: Quat::IDENTITY,
        total_force: Vec3::ZERO,
        total_torque: Vec3::ZERO,
        gravity: -1.0,
        top: Vec3::Y,
        top_biased: Vec3::Y,
        stabilization_factor: 0.1,
        speed_fix: 0.0,
        ang_vel0_y_factor: 0.0,
        force_upright: true,
        no_gravity: false,
        kill_ext_vel_y: false,
    };

    /// `extra ∘ main ∘ special`, recomputed by every integration step.
    #[must_use]
    pub const fn full_rot(&self) -> Quat {
        self.full_rot
    }

    /// Clears every velocity and accumulator, keeping pose and configuration.
    pub fn reset_motion(&mut self) {
        self.ext_vel = Vec3::ZERO;
        self.acceleration = Vec3::ZERO;
        self.ang_vel0 = Vec3::ZERO;
        self.moving_obj_vel = Vec3::ZERO;
        self.ang_vel1 = Vec3::ZERO;
        self.moving_road_vel = Vec3::ZERO;
        self.ang_vel2 = Vec3::ZERO;
        self.total_force = Vec3::ZERO;
        self.total_torque = Vec3::ZERO;
        self.int_vel = Vec3::ZERO;
    }

    /// Sets the base orientation and the composed one together, as at spawn.
    pub fn set_rotation(&mut self, rot: Quat) {
        self.main_rot = rot;
        self.full_rot = rot;
    }
}

impl Display for RigidBodyState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("RigidBodyState {")?;
        f.write_fmt(format_args!("\n\tpos: {}", self.pos))?;
        f.write_fmt(format_args!("\n\text_vel: {}", self.ext_vel))?;
        f.write_fmt(format_args!("\n\tint_vel: {}", self.int_vel))?;
        f.write_fmt(format_args!("\n\tang_vel0: {}", self.ang_vel0))?;
        f.write_fmt(format_args!("\n\tmain_rot: {}", self.main_rot))?;
        f.write_fmt(format_args!("\n\tfull_rot: {}", self.full_rot))?;
        f.write_str("}")
    }
}
