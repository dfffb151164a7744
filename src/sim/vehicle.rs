use arrayvec::ArrayVec;
use glam::{Quat, Vec3};
use log::{debug, info, trace};

use super::{
    body_collision::BodyCollisionResolver,
    collision_data::CollisionData,
    context::{ChassisState, VehicleContext, VehicleStatus},
    integrator::Integrator,
    oracle::CollisionOracle,
    params::VehicleParams,
    rigid_body::RigidBodyState,
    suspension::WheelSuspension,
};
use crate::{
    consts::{ANG_VEL0_Y_FACTOR, DT, GRAVITY, OVERLAY_DECAY, moving_obj},
    math::{Matrix34, QuatExt, Vec3Ext},
};

/// Upper bound of wheels per vehicle.
pub const MAX_WHEELS: usize = 4;

/// The physics core of one vehicle: an integrated body, its hitboxes and its wheels.
///
/// Every call to [`VehiclePhysics::tick`] advances the vehicle by one fixed frame.
#[derive(Clone, Debug, PartialEq)]
pub struct VehiclePhysics {
    params: VehicleParams,
    integrator: Integrator,
    body: BodyCollisionResolver,
    wheels: ArrayVec<WheelSuspension, MAX_WHEELS>,
    chassis: ChassisState,
    inst_stunt_rot: Quat,
    decaying_stunt_rot: Quat,
    inst_extra_rot: Quat,
    decaying_extra_rot: Quat,
    moving_obj_vel: Vec3,
    wheel_speed_factor: f32,
    wheel_rot_factor: f32,
    floor_contact_count: u32,
    tick_count: u64,
}

impl VehiclePhysics {
    /// # Panics
    ///
    /// Panics if `params` fails [`VehicleParams::validate`] or has no usable hitbox.
    #[must_use]
    pub fn new(params: VehicleParams) -> Self {
        params.validate();

        let mut integrator = Integrator::new(params.kind);
        integrator.set_body_params(params.body.ang_vel0_factor, params.body.cuboids);

        let body = BodyCollisionResolver::new(&params.hitboxes);
        let wheels = params
            .wheels
            .iter()
            .map(|wheel| WheelSuspension::new(*wheel))
            .collect();

        info!(
            "Created {:?} with {} wheels and {} hitboxes (bounding radius {})",
            params.kind,
            params.wheels.len(),
            body.hitboxes().len(),
            body.bounding_radius()
        );

        let mut vehicle = Self {
            params,
            integrator,
            body,
            wheels,
            chassis: ChassisState::default(),
            inst_stunt_rot: Quat::IDENTITY,
            decaying_stunt_rot: Quat::IDENTITY,
            inst_extra_rot: Quat::IDENTITY,
            decaying_extra_rot: Quat::IDENTITY,
            moving_obj_vel: Vec3::ZERO,
            wheel_speed_factor: 1.0,
            wheel_rot_factor: 0.0,
            floor_contact_count: 0,
            tick_count: 0,
        };
        vehicle.reset();
        vehicle
    }

    /// Returns every component to its freshly constructed state.
    pub fn reset(&mut self) {
        self.integrator.init();
        self.body.reset();
        for wheel in &mut self.wheels {
            wheel.reset();
        }

        self.chassis = ChassisState::default();
        self.inst_stunt_rot = Quat::IDENTITY;
        self.decaying_stunt_rot = Quat::IDENTITY;
        self.inst_extra_rot = Quat::IDENTITY;
        self.decaying_extra_rot = Quat::IDENTITY;
        self.moving_obj_vel = Vec3::ZERO;
        self.wheel_speed_factor = 1.0;
        self.wheel_rot_factor = 0.0;
        self.floor_contact_count = 0;
        self.tick_count = 0;
    }

    /// Places the vehicle at `pos` with orientation `rot` and hangs every wheel fully extended.
    pub fn set_initial_state(
        &mut self,
        oracle: &dyn CollisionOracle,
        status: &VehicleStatus,
        pos: Vec3,
        rot: Quat,
    ) {
        let state = &mut self.integrator.state;
        state.pos = pos;
        state.set_rotation(rot);
        state.top = status.up;

        self.chassis.sink_depth = 0.0;
        self.chassis.target_sink_depth = 0.0;
        self.refresh_pose();
        self.body
            .hitboxes_mut()
            .set_last_pos_from_pose(status.scale, &self.chassis.pose);

        let ctx = VehicleContext {
            oracle,
            params: &self.params,
            status,
            integrator: &mut self.integrator,
            chassis: &mut self.chassis,
        };

        for wheel in &mut self.wheels {
            wheel.set_initial_state(&ctx);
        }
    }

    /// Advances the vehicle by one frame against `oracle`, with the external inputs in `status`.
    pub fn tick(&mut self, oracle: &dyn CollisionOracle, status: &VehicleStatus) {
        let was_grounded = self.floor_contact_count > 0;
        self.chassis.airtime = if was_grounded {
            0
        } else {
            self.chassis.airtime.saturating_add(1)
        };

        self.chassis.max_overtravel = Vec3::ZERO;
        self.chassis.min_overtravel = Vec3::ZERO;
        self.chassis.wheel_sink_depth = 0.0;
        self.chassis.suspension_scale =
            f32::max(status.scale.y, self.params.stats.wheel_distance);

        let state = &mut self.integrator.state;
        state.gravity = GRAVITY;
        state.ang_vel0_y_factor = ANG_VEL0_Y_FACTOR;
        state.top = status.up;
        state.int_vel = status.int_vel;

        let forward = state.full_rot().rotate_vector(Vec3::Z);
        let wheel_matrix = Matrix34::make_qt(state.full_rot(), state.pos);
        let gravity = Vec3::new(0.0, GRAVITY, 0.0);

        let mut ctx = VehicleContext {
            oracle,
            params: &self.params,
            status,
            integrator: &mut self.integrator,
            chassis: &mut self.chassis,
        };

        let mut floors = FloorTally::default();
        let mut speed_factor = 1.0f32;
        let mut handling_factor = 0.0f32;

        for wheel in &mut self.wheels {
            wheel.calc_collision(&mut ctx, DT, gravity, &wheel_matrix);

            let data = wheel.wheel().data();
            speed_factor = f32::min(speed_factor, data.speed_factor);

            if data.has_floor {
                handling_factor += data.rot_factor;
                floors.add(data);
            }
        }

        let mut fallback = None;
        if !status.skip_wheel_calc {
            fallback = fallback_floor(&self.wheels);

            let compensation = ctx.chassis.overtravel_compensation();
            ctx.integrator.state.pos += compensation;

            let body_movement = self.body.data().movement;
            let floor_moment_rate = self.body.floor_moment_rate();

            for wheel in &mut self.wheels {
                wheel.calc_suspension(
                    &mut ctx,
                    forward,
                    compensation,
                    body_movement,
                    floor_moment_rate,
                );
            }
        }

        if !status.in_cannon {
            let rot = ctx.integrator.state.full_rot();

            self.body
                .hitboxes_mut()
                .set_hitbox_scale(status.total_scale);
            self.body.find_collision(&mut ctx, rot, fallback);

            if self.body.data().has_floor {
                floors.add(self.body.data());
            }
        }

        self.wheel_speed_factor = speed_factor;
        self.wheel_rot_factor = handling_factor;
        self.floor_contact_count = floors.count;

        let grounded = self.floor_contact_count > 0;
        if grounded != was_grounded {
            debug!(
                "{} at tick {}",
                if grounded { "Landed" } else { "Left the ground" },
                self.tick_count
            );
        }

        self.calc_moving_obj(&floors);

        self.integrator.state.special_rot = self.inst_stunt_rot.mult_swap(self.decaying_stunt_rot);
        self.integrator.state.extra_rot = self.inst_extra_rot.mult_swap(self.decaying_extra_rot);

        self.integrator
            .integrate(DT, status.hard_speed_limit, !grounded);

        self.decaying_stunt_rot = self.decaying_stunt_rot.slerp_to(Quat::IDENTITY, OVERLAY_DECAY);
        self.decaying_extra_rot = self.decaying_extra_rot.slerp_to(Quat::IDENTITY, OVERLAY_DECAY);
        self.inst_stunt_rot = Quat::IDENTITY;
        self.inst_extra_rot = Quat::IDENTITY;

        self.refresh_pose();
        self.body
            .hitboxes_mut()
            .set_last_pos_from_pose(status.scale, &self.chassis.pose);

        self.tick_count += 1;

        let state = &self.integrator.state;
        trace!(
            "tick {}: pos {} speed {}",
            self.tick_count, state.pos, state.speed_norm
        );
    }

    fn calc_moving_obj(&mut self, floors: &FloorTally) {
        if floors.moving_obj_count == 0 {
            let air_scalar = if self.chassis.airtime < moving_obj::LONG_AIRTIME {
                moving_obj::AIR_DECAY
            } else {
                moving_obj::LONG_AIR_DECAY
            };
            self.compose_decaying_moving_obj_vel(
                moving_obj::FLOOR_DECAY,
                air_scalar,
                floors.count != 0,
            );
        } else {
            let obj_vel = floors.obj_vel * (1.0 / floors.count as f32);
            self.compose_moving_obj_vel(obj_vel, moving_obj::EASE);
        }
    }

    fn refresh_pose(&mut self) {
        let state = &self.integrator.state;
        self.chassis
            .update_pose(Matrix34::make_qt(state.full_rot(), state.pos));
    }

    /// Eases the moving-object velocity toward `v`.
    pub fn compose_moving_obj_vel(&mut self, v: Vec3, scalar: f32) {
        self.moving_obj_vel += (v - self.moving_obj_vel) * scalar;
        self.integrator.state.moving_obj_vel = self.moving_obj_vel;
    }

    /// Decays the moving-object velocity by `floor_scalar` on the ground, `air_scalar` otherwise.
    pub fn compose_decaying_moving_obj_vel(&mut self, floor_scalar: f32, air_scalar: f32, floor: bool) {
        self.moving_obj_vel *= if floor { floor_scalar } else { air_scalar };
        self.integrator.state.moving_obj_vel = self.moving_obj_vel;
    }

    /// Rotation applied for the next tick only, inside the base rotation.
    pub fn compose_stunt_rot(&mut self, rot: Quat) {
        self.inst_stunt_rot = self.inst_stunt_rot.mult_swap(rot);
    }

    /// Rotation applied for the next tick only, outside the base rotation.
    pub fn compose_extra_rot(&mut self, rot: Quat) {
        self.inst_extra_rot = self.inst_extra_rot.mult_swap(rot);
    }

    pub fn compose_decaying_stunt_rot(&mut self, rot: Quat) {
        self.decaying_stunt_rot = self.decaying_stunt_rot.mult_swap(rot);
    }

    pub fn compose_decaying_extra_rot(&mut self, rot: Quat) {
        self.decaying_extra_rot = self.decaying_extra_rot.mult_swap(rot);
    }

    pub fn clear_decaying_rot(&mut self) {
        self.decaying_stunt_rot = Quat::IDENTITY;
        self.decaying_extra_rot = Quat::IDENTITY;
    }

    #[must_use]
    pub const fn params(&self) -> &VehicleParams {
        &self.params
    }

    #[must_use]
    pub const fn state(&self) -> &RigidBodyState {
        &self.integrator.state
    }

    pub const fn state_mut(&mut self) -> &mut RigidBodyState {
        &mut self.integrator.state
    }

    #[must_use]
    pub const fn integrator(&self) -> &Integrator {
        &self.integrator
    }

    #[must_use]
    pub const fn body(&self) -> &BodyCollisionResolver {
        &self.body
    }

    /// The body's contact record from the last tick.
    #[must_use]
    pub const fn collision_data(&self) -> &CollisionData {
        self.body.data()
    }

    #[must_use]
    pub fn wheels(&self) -> &[WheelSuspension] {
        &self.wheels
    }

    /// # Panics
    ///
    /// Panics if `idx` is not a wheel of this vehicle.
    #[must_use]
    pub fn wheel(&self, idx: usize) -> &WheelSuspension {
        self.wheels.get(idx).unwrap_or_else(|| {
            panic!(
                "VehiclePhysics::wheel(): no wheel at index {idx} ({} configured)",
                self.wheels.len()
            )
        })
    }

    #[must_use]
    pub const fn chassis(&self) -> &ChassisState {
        &self.chassis
    }

    #[must_use]
    pub const fn pose(&self) -> &Matrix34 {
        &self.chassis.pose
    }

    #[must_use]
    pub const fn pos(&self) -> Vec3 {
        self.integrator.state.pos
    }

    #[must_use]
    pub const fn full_rot(&self) -> Quat {
        self.integrator.state.full_rot()
    }

    /// Lowest terrain speed factor under any wheel.
    #[must_use]
    pub const fn wheel_speed_factor(&self) -> f32 {
        self.wheel_speed_factor
    }

    /// Sum of the terrain handling factors of the grounded wheels.
    #[must_use]
    pub const fn wheel_rot_factor(&self) -> f32 {
        self.wheel_rot_factor
    }

    /// Grounded wheels, plus one when the body touches a floor.
    #[must_use]
    pub const fn floor_contact_count(&self) -> u32 {
        self.floor_contact_count
    }

    #[must_use]
    pub const fn is_grounded(&self) -> bool {
        self.floor_contact_count > 0
    }

    #[must_use]
    pub const fn airtime(&self) -> u32 {
        self.chassis.airtime
    }

    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }
}

#[derive(Default)]
struct FloorTally {
    count: u32,
    moving_obj_count: u32,
    obj_vel: Vec3,
}

impl FloorTally {
    fn add(&mut self, data: &CollisionData) {
        self.count += 1;

        if data.has_road_velocity {
            self.moving_obj_count += 1;
            self.obj_vel += data.road_velocity;
        }
    }
}

/// The averaged contact of every bottomed-out wheel, if any.
///
/// Taken between the collision and suspension passes, so the velocities are the raw
/// collision velocities.
fn fallback_floor(wheels: &[WheelSuspension]) -> Option<CollisionData> {
    let mut rel_pos = Vec3::ZERO;
    let mut vel = Vec3::ZERO;
    let mut floor_normal = Vec3::ZERO;
    let mut count = 0u32;

    for wheel in wheels.iter().map(WheelSuspension::wheel) {
        if !wheel.bottomed_out() {
            continue;
        }

        let data = wheel.data();
        rel_pos += data.relative_position;
        vel += data.velocity;
        floor_normal += data.floor_normal;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let scalar = 1.0 / count as f32;
    floor_normal.normalise();

    let mut fallback = CollisionData::new();
    fallback.set_floor_contact(rel_pos * scalar, vel * scalar, floor_normal);
    Some(fallback)
}
