use glam::Vec3;
use log::debug;

use super::{
    body_collision::{FloorMomentAxes, apply_floor_moment, resolve_wheel_contact},
    collision_data::CollisionData,
    context::VehicleContext,
    hitbox::HitboxSet,
    params::WheelParams,
};
use crate::{
    consts::{
        floor_moment,
        suspension::{
            BOUNCE_EXT_VEL_Y, COLLISION_VEL_SCALE, DRIFT_SLACK, INITIAL_SWEEP_HEIGHT,
            LEAN_OFFSET, PLACEHOLDER_RADIUS, RADIUS_EASE, SINK_PER_INTENSITY,
        },
    },
    math::{Matrix34, QuatExt, Vec3Ext},
};

/// Position, travel and contact of one wheel.
#[derive(Clone, Debug, PartialEq)]
pub struct WheelState {
    hitboxes: HitboxSet,
    data: CollisionData,
    pos: Vec3,
    last_pos: Vec3,
    last_pos_diff: Vec3,
    suspension_travel: f32,
    collision_vel: Vec3,
    speed: Vec3,
    wheel_edge_pos: Vec3,
    effective_radius: f32,
    target_effective_radius: f32,
    topmost_pos: Vec3,
    bottomed_out: bool,
}

impl WheelState {
    fn new(params: &WheelParams) -> Self {
        let mut wheel = Self {
            hitboxes: HitboxSet::single(PLACEHOLDER_RADIUS, Vec3::ZERO),
            data: CollisionData::new(),
            pos: Vec3::ZERO,
            last_pos: Vec3::ZERO,
            last_pos_diff: Vec3::ZERO,
            suspension_travel: 0.0,
            collision_vel: Vec3::ZERO,
            speed: Vec3::ZERO,
            wheel_edge_pos: Vec3::ZERO,
            effective_radius: 0.0,
            target_effective_radius: 0.0,
            topmost_pos: Vec3::ZERO,
            bottomed_out: false,
        };
        wheel.reset(params);
        wheel
    }

    /// Fully extends the suspension and clears everything else.
    pub fn reset(&mut self, params: &WheelParams) {
        self.pos = Vec3::ZERO;
        self.last_pos = Vec3::ZERO;
        self.last_pos_diff = Vec3::ZERO;
        self.collision_vel = Vec3::ZERO;
        self.speed = Vec3::ZERO;
        self.wheel_edge_pos = Vec3::ZERO;
        self.target_effective_radius = 0.0;
        self.bottomed_out = false;
        self.topmost_pos = Vec3::ZERO;

        self.suspension_travel = params.max_travel;
        self.effective_radius = params.wheel_radius;
    }

    /// Snaps the wheel back onto the suspension axis after the body moved by `vehicle_movement`.
    ///
    /// The resulting `speed` excludes every motion the wheel did not cause itself, and is added to
    /// the contact velocity.
    pub fn realign(
        &mut self,
        ctx: &VehicleContext,
        down: Vec3,
        vehicle_movement: Vec3,
        max_travel_scaled: f32,
        body_movement: Vec3,
    ) {
        let topmost = self.topmost_pos + vehicle_movement;
        let travel = down.dot(self.pos - topmost);
        self.suspension_travel = f32::max(0.0, f32::min(max_travel_scaled, travel));
        self.pos = topmost + down * self.suspension_travel;

        let state = &ctx.integrator.state;
        self.speed = self.pos - self.last_pos;
        self.speed -= state.int_vel;
        self.speed -= state.moving_obj_vel;
        self.speed -= body_movement;
        self.speed -= ctx.chassis.collide_movement;

        self.data.velocity += self.speed;

        self.last_pos = self.pos;
        self.last_pos_diff = self.pos - topmost;
    }

    /// Sweeps the wheel sphere and pushes the wheel out of whatever it hit.
    pub fn update_collision(
        &mut self,
        ctx: &mut VehicleContext,
        params: &WheelParams,
        down: Vec3,
        topmost: Vec3,
    ) {
        let status = ctx.status;
        self.target_effective_radius = params.wheel_radius;

        if !status.skip_wheel_calc {
            let next_radius = params.sphere_radius;
            let scalar =
                self.effective_radius * status.scale.y - next_radius * status.total_scale;
            let mut center = self.pos + down * scalar;

            let scalar = LEAN_OFFSET * (next_radius * status.lean_rot) * status.total_scale;
            center += ctx.chassis.body_forward() * scalar;

            if status.in_cannon {
                self.data.reset();
            } else {
                self.hitboxes.set_hitbox_scale(status.total_scale);
                resolve_wheel_contact(
                    ctx.oracle,
                    &ctx.params.stats,
                    &mut self.hitboxes,
                    &mut self.data,
                    ctx.integrator.state.pos,
                    self.collision_vel,
                    center,
                    next_radius,
                );

                if self.data.has_contact() {
                    self.pos += self.data.penetration_offset;

                    if self.data.intensity > -1 {
                        let sink_depth = SINK_PER_INTENSITY * self.data.intensity as f32;
                        self.target_effective_radius = params.wheel_radius - sink_depth;
                        ctx.chassis.try_set_target_sink_depth(sink_depth);
                    }
                }
            }

            self.hitboxes.hitbox_mut(0).set_last_pos(center);
        }

        self.topmost_pos = topmost;
        self.wheel_edge_pos = self.pos + down * (self.effective_radius * status.total_scale);
        self.effective_radius +=
            (self.target_effective_radius - self.effective_radius) * RADIUS_EASE;
        self.suspension_travel = down.dot(self.pos - topmost);

        if self.suspension_travel < 0.0 {
            if !self.bottomed_out {
                debug!("wheel bottomed out by {}", -self.suspension_travel);
            }
            self.bottomed_out = true;
            ctx.chassis.update_overtravel(down * self.suspension_travel);
        } else {
            self.bottomed_out = false;
        }
    }

    #[must_use]
    pub const fn data(&self) -> &CollisionData {
        &self.data
    }

    #[must_use]
    pub const fn hitboxes(&self) -> &HitboxSet {
        &self.hitboxes
    }

    #[must_use]
    pub const fn pos(&self) -> Vec3 {
        self.pos
    }

    #[must_use]
    pub const fn last_pos(&self) -> Vec3 {
        self.last_pos
    }

    pub const fn set_last_pos(&mut self, pos: Vec3) {
        self.last_pos = pos;
    }

    #[must_use]
    pub const fn last_pos_diff(&self) -> Vec3 {
        self.last_pos_diff
    }

    #[must_use]
    pub const fn suspension_travel(&self) -> f32 {
        self.suspension_travel
    }

    /// Motion of the wheel relative to the ground during the last realignment.
    #[must_use]
    pub const fn speed(&self) -> Vec3 {
        self.speed
    }

    /// Lowest point of the tire along the suspension axis.
    #[must_use]
    pub const fn wheel_edge_pos(&self) -> Vec3 {
        self.wheel_edge_pos
    }

    #[must_use]
    pub const fn effective_radius(&self) -> f32 {
        self.effective_radius
    }

    #[must_use]
    pub const fn topmost_pos(&self) -> Vec3 {
        self.topmost_pos
    }

    /// The wheel ended the collision pass above its attachment point.
    #[must_use]
    pub const fn bottomed_out(&self) -> bool {
        self.bottomed_out
    }
}

/// The spring-damper strut between the body and one [`WheelState`].
#[derive(Clone, Debug, PartialEq)]
pub struct WheelSuspension {
    params: WheelParams,
    wheel: WheelState,
    topmost_pos: Vec3,
    max_travel_scaled: f32,
    down: Vec3,
}

impl WheelSuspension {
    #[must_use]
    pub fn new(params: WheelParams) -> Self {
        Self {
            wheel: WheelState::new(&params),
            params,
            topmost_pos: Vec3::ZERO,
            max_travel_scaled: 0.0,
            down: Vec3::ZERO,
        }
    }

    pub fn reset(&mut self) {
        self.topmost_pos = Vec3::ZERO;
        self.max_travel_scaled = 0.0;
        self.down = Vec3::ZERO;
        self.wheel.reset(&self.params);
    }

    fn attachment(&self, scale: Vec3) -> Vec3 {
        let mut rel = self.params.rel_position * scale;
        if self.params.reflected {
            rel.x = -rel.x;
        }
        rel
    }

    /// Hangs the wheel fully extended below its attachment point, as at spawn.
    pub fn set_initial_state(&mut self, ctx: &VehicleContext) {
        let state = &ctx.integrator.state;
        let full_rot = state.full_rot();

        let rotated = full_rot.rotate_vector(self.attachment(Vec3::ONE)) + state.pos;
        let unit = full_rot.rotate_vector(-Vec3::Y);
        let placed = rotated + unit * self.params.max_travel;

        let wheel = &mut self.wheel;
        wheel.pos = placed;
        wheel.last_pos = placed;
        wheel.last_pos_diff = placed - rotated;
        wheel.wheel_edge_pos = placed + unit * (wheel.effective_radius * ctx.status.total_scale);

        let hitbox = wheel.hitboxes.hitbox_mut(0);
        hitbox.set_world_pos(placed);
        hitbox.set_last_pos(state.pos + Vec3::Y * INITIAL_SWEEP_HEIGHT);

        self.topmost_pos = rotated;
    }

    /// Places the wheel below its attachment point in `mat` and sweeps it against the track.
    pub fn calc_collision(
        &mut self,
        ctx: &mut VehicleContext,
        dt: f32,
        gravity: Vec3,
        mat: &Matrix34,
    ) {
        let suspension_scale = ctx.chassis.suspension_scale;
        self.max_travel_scaled = self.params.max_travel * suspension_scale;

        let topmost = mat.ps_mult_vector(self.attachment(ctx.status.scale));

        let tilt = Matrix34::make_r(Vec3::new(self.params.x_rot_degrees.to_radians(), 0.0, 0.0));
        let local_down = tilt.mult_vector33(Vec3::NEG_Y);
        self.down = mat.mult_vector33(local_down);

        let travel = self.wheel.suspension_travel + suspension_scale * DRIFT_SLACK;
        self.wheel.suspension_travel = f32::max(0.0, f32::min(self.max_travel_scaled, travel));
        self.wheel.collision_vel = gravity * (dt * COLLISION_VEL_SCALE);
        self.wheel.pos = topmost + self.down * self.wheel.suspension_travel;

        if !ctx.status.skip_wheel_calc {
            self.wheel
                .update_collision(ctx, &self.params, self.down, topmost);
            self.topmost_pos = topmost;
        }
    }

    /// Realigns the wheel and, on floor contact, applies the spring-damper force and the floor
    /// moment at the attachment point.
    pub fn calc_suspension(
        &mut self,
        ctx: &mut VehicleContext,
        forward: Vec3,
        vehicle_movement: Vec3,
        body_movement: Vec3,
        floor_moment_rate: f32,
    ) {
        let last_pos_diff = self.wheel.last_pos_diff;
        self.wheel.realign(
            ctx,
            self.down,
            vehicle_movement,
            self.max_travel_scaled,
            body_movement,
        );

        if !self.wheel.data.has_floor {
            return;
        }

        let status = ctx.status;
        let top_diff = self.wheel.pos - self.topmost_pos;
        let y_down = f32::max(0.0, self.down.dot(top_diff));
        let speed = last_pos_diff - top_diff;
        let travel = self.max_travel_scaled - y_down;
        let speed_scalar = self.down.dot(speed);

        let spring_damp = -(self.params.spring_stiffness * travel
            + self.params.damping_factor * speed_scalar);
        let mut f_rot = self.down * spring_damp;

        if status.in_respawn {
            f_rot.y = f32::max(-1.0, f32::min(1.0, f_rot.y));
        }

        let mut f_linear = f_rot;
        let mut rot_proj = f_rot;
        rot_proj.y = 0.0;
        rot_proj = rot_proj.proj(self.wheel.data.floor_normal);
        f_linear.y += rot_proj.y;
        f_linear.y = f32::min(f_linear.y, ctx.params.stats.max_normal_acceleration);

        if ctx.integrator.state.ext_vel.y > BOUNCE_EXT_VEL_Y || status.jump_pad_disables_suspension {
            f_linear.y = 0.0;
        }

        ctx.integrator
            .apply_suspension_wrench(self.topmost_pos, f_linear, f_rot, status.wheelie);

        let rate = if status.soft_wall_collision {
            floor_moment::RATE_MIN
        } else {
            floor_moment_rate
        };

        apply_floor_moment(
            ctx.integrator,
            &self.wheel.data,
            floor_moment::DOWN,
            rate,
            forward,
            status.move_dir,
            self.wheel.speed,
            FloorMomentAxes {
                horizontal: true,
                vertical: true,
                angular: !status.wheelie,
            },
        );
    }

    #[must_use]
    pub const fn params(&self) -> &WheelParams {
        &self.params
    }

    #[must_use]
    pub const fn wheel(&self) -> &WheelState {
        &self.wheel
    }

    pub const fn wheel_mut(&mut self) -> &mut WheelState {
        &mut self.wheel
    }

    #[must_use]
    pub const fn topmost_pos(&self) -> Vec3 {
        self.topmost_pos
    }

    /// Suspension axis in world space, pointing from the body toward the wheel.
    #[must_use]
    pub const fn down(&self) -> Vec3 {
        self.down
    }

    #[must_use]
    pub const fn max_travel_scaled(&self) -> f32 {
        self.max_travel_scaled
    }
}
