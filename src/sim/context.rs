use glam::Vec3;

use super::{integrator::Integrator, oracle::CollisionOracle, params::VehicleParams};
use crate::{
    consts::MAX_SPEED,
    math::{Matrix34, Vec3Ext},
};

/// Per-frame inputs written by the systems around the physics core (drivetrain, actions, tricks).
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleStatus {
    /// Non-uniform model scale.
    pub scale: Vec3,
    /// Uniform scale from shrink/grow effects.
    pub total_scale: f32,
    /// Lean of the vehicle in `[-1, 1]`, shifting wheel spheres forward.
    pub lean_rot: f32,
    /// Direction the drivetrain is pushing toward.
    pub move_dir: Vec3,
    /// Up vector the body stabilizes toward.
    pub up: Vec3,
    pub hard_speed_limit: f32,
    /// Drivetrain velocity for this frame.
    pub int_vel: Vec3,
    pub in_respawn: bool,
    pub in_action: bool,
    /// The running action rotates the vehicle.
    pub action_rotating: bool,
    pub wheelie: bool,
    pub skip_wheel_calc: bool,
    pub in_cannon: bool,
    pub jump_pad_disables_suspension: bool,
    pub soft_wall_collision: bool,
    /// States such as boosting that never bounce off surfaces.
    pub suppress_bounce: bool,
}

impl Default for VehicleStatus {
    fn default() -> Self {
        Self {
            scale: Vec3::ONE,
            total_scale: 1.0,
            lean_rot: 0.0,
            move_dir: Vec3::Z,
            up: Vec3::Y,
            hard_speed_limit: MAX_SPEED,
            int_vel: Vec3::ZERO,
            in_respawn: false,
            in_action: false,
            action_rotating: false,
            wheelie: false,
            skip_wheel_calc: false,
            in_cannon: false,
            jump_pad_disables_suspension: false,
            soft_wall_collision: false,
            suppress_bounce: false,
        }
    }
}

/// Body-level state shared between the wheels and the body resolver during one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChassisState {
    pub pose: Matrix34,
    pub x_axis: Vec3,
    pub y_axis: Vec3,
    pub z_axis: Vec3,
    /// Scale of suspension travel, at least the vehicle's wheel distance.
    pub suspension_scale: f32,
    pub sink_depth: f32,
    pub target_sink_depth: f32,
    /// Deepest sink depth requested by a wheel this tick.
    pub wheel_sink_depth: f32,
    /// Component-wise minimum of the overtravel reported by wheels.
    pub max_overtravel: Vec3,
    /// Component-wise maximum of the overtravel reported by wheels.
    pub min_overtravel: Vec3,
    /// Positional pushes applied this tick outside of the wheels.
    pub collide_movement: Vec3,
    pub airtime: u32,
}

impl Default for ChassisState {
    fn default() -> Self {
        Self {
            pose: Matrix34::IDENTITY,
            x_axis: Vec3::X,
            y_axis: Vec3::Y,
            z_axis: Vec3::Z,
            suspension_scale: 1.0,
            sink_depth: 0.0,
            target_sink_depth: 0.0,
            wheel_sink_depth: 0.0,
            max_overtravel: Vec3::ZERO,
            min_overtravel: Vec3::ZERO,
            collide_movement: Vec3::ZERO,
            airtime: 0,
        }
    }
}

impl ChassisState {
    pub fn update_pose(&mut self, pose: Matrix34) {
        self.pose = pose;
        self.x_axis = pose.base(0);
        self.y_axis = pose.base(1);
        self.z_axis = pose.base(2);
    }

    /// Records how far a wheel went above its attachment point.
    pub fn update_overtravel(&mut self, overtravel: Vec3) {
        self.max_overtravel = self.max_overtravel.minimize(overtravel);
        self.min_overtravel = self.min_overtravel.maximize(overtravel);
    }

    #[must_use]
    pub fn overtravel_compensation(&self) -> Vec3 {
        self.max_overtravel + self.min_overtravel
    }

    pub fn try_set_target_sink_depth(&mut self, depth: f32) {
        self.wheel_sink_depth = f32::max(depth, self.wheel_sink_depth);
        self.target_sink_depth = f32::max(depth, self.target_sink_depth);
    }

    /// Forward axis of the body frame.
    #[must_use]
    pub const fn body_forward(&self) -> Vec3 {
        self.x_axis
    }
}

/// Everything a component needs from the rest of the vehicle during a tick.
pub struct VehicleContext<'a> {
    pub oracle: &'a dyn CollisionOracle,
    pub params: &'a VehicleParams,
    pub status: &'a VehicleStatus,
    pub integrator: &'a mut Integrator,
    pub chassis: &'a mut ChassisState,
}
