use glam::{Quat, Vec3};
use log::debug;

use super::{
    collision_data::CollisionData,
    context::VehicleContext,
    hitbox::{Hitbox, HitboxSet},
    integrator::Integrator,
    oracle::{CollisionOracle, ContactInfo},
    params::{HitboxParams, VehicleStats},
    terrain::{
        ANY_INVISIBLE_WALL, DRIVER_SOLID_SURFACE, DRIVER_WALL_NO_INVISIBLE_WALL,
        DRIVER_WALL_NO_INVISIBLE_WALL2, FLOOR, TerrainType, VEHICLE_COLLIDEABLE, VISIBLE_WALL,
        WALL, WALLS_ONLY,
    },
};
use crate::{
    consts::{
        SINK_DEPTH_EASE, floor_moment,
        impulse::{
            ACTION_FRICTION, BOUNCE_KILL_VEL, FRICTION, LOCK_XZ_AIRTIME, LOCK_XZ_FALL_SPEED,
            RESTITUTION,
        },
        suspension::SINK_PER_INTENSITY,
    },
    math::{QuatExt, Vec3Ext},
};

/// Which parts of a floor moment reach the body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FloorMomentAxes {
    /// Keep the x and z parts of the linear push.
    pub horizontal: bool,
    /// Keep the y part of the linear push.
    pub vertical: bool,
    /// Also turn the push into angular velocity.
    pub angular: bool,
}

/// Sweeps the body hitboxes every tick and turns the contacts into impulses.
#[derive(Clone, Debug, PartialEq)]
pub struct BodyCollisionResolver {
    hitboxes: HitboxSet,
    data: CollisionData,
    floor_moment_rate: f32,
    collision_limit: f32,
}

impl BodyCollisionResolver {
    #[must_use]
    pub fn new(params: &[HitboxParams]) -> Self {
        let (hitboxes, collision_limit) = HitboxSet::from_params(params);

        Self {
            hitboxes,
            data: CollisionData::new(),
            floor_moment_rate: floor_moment::RATE_MAX,
            collision_limit,
        }
    }

    pub fn reset(&mut self) {
        self.hitboxes.reset();
        self.data.reset();
        self.floor_moment_rate = floor_moment::RATE_MAX;
    }

    #[must_use]
    pub const fn data(&self) -> &CollisionData {
        &self.data
    }

    pub const fn data_mut(&mut self) -> &mut CollisionData {
        &mut self.data
    }

    #[must_use]
    pub const fn hitboxes(&self) -> &HitboxSet {
        &self.hitboxes
    }

    pub const fn hitboxes_mut(&mut self) -> &mut HitboxSet {
        &mut self.hitboxes
    }

    #[must_use]
    pub const fn floor_moment_rate(&self) -> f32 {
        self.floor_moment_rate
    }

    /// Half of the furthest fore/aft extent of the hitboxes.
    #[must_use]
    pub const fn collision_limit(&self) -> f32 {
        self.collision_limit
    }

    #[must_use]
    pub const fn bounding_radius(&self) -> f32 {
        self.hitboxes.bounding_radius()
    }

    /// Sweeps every hitbox against the track and folds the contacts into one [`CollisionData`].
    pub fn calc_body_collision(&mut self, ctx: &mut VehicleContext, rot: Quat) {
        self.data.reset();

        let status = ctx.status;
        let pos = ctx.integrator.state.pos;
        let sink_depth = ctx.chassis.sink_depth;

        let mut min = Vec3::ZERO;
        let mut max = Vec3::ZERO;
        let mut pos_rel = Vec3::ZERO;
        let mut count = 0u32;

        for hitbox in self.hitboxes.iter_mut() {
            let mask = if hitbox.params().walls_only {
                WALLS_ONLY
            } else {
                DRIVER_SOLID_SURFACE
            };

            hitbox.calc(status.total_scale, sink_depth, status.scale, rot, pos);

            let Some(info) = ctx.oracle.query_sphere_sweep(
                hitbox.radius(),
                hitbox.last_pos(),
                hitbox.world_pos(),
                mask,
            ) else {
                continue;
            };

            accumulate_contact(&mut self.data, hitbox, &info, &mut min, &mut max, &mut pos_rel);
            count += 1;

            if let Some(road_velocity) = info.road_velocity {
                self.data.has_road_velocity = true;
                self.data.road_velocity = road_velocity;
            }

            process_wall(ctx.oracle, &mut self.data, &info);
            process_floor(ctx.oracle, &mut self.data, &info, &ctx.params.stats);
        }

        if count == 0 {
            self.data.speed_factor = 1.0;
            self.data.rot_factor = 1.0;
        } else {
            apply_body_collision(ctx.integrator, &mut self.data, min + max, pos_rel, count);
        }

        if self.data.has_any_wall() {
            self.data.wall_normal.normalise();
        }
    }

    /// The body stage of a tick: sink depth, the hitbox pass, and the contact impulse.
    ///
    /// `fallback_floor` holds the averaged contact of every bottomed-out wheel, used when the body
    /// itself touched no floor.
    pub fn find_collision(
        &mut self,
        ctx: &mut VehicleContext,
        rot: Quat,
        fallback_floor: Option<CollisionData>,
    ) {
        let chassis = &mut *ctx.chassis;
        chassis.collide_movement = Vec3::ZERO;
        chassis.sink_depth += (chassis.target_sink_depth - chassis.sink_depth) * SINK_DEPTH_EASE;

        self.calc_body_collision(ctx, rot);

        let body_sink = SINK_PER_INTENSITY * self.data.intensity as f32;
        ctx.chassis.target_sink_depth = f32::max(body_sink, ctx.chassis.wheel_sink_depth);

        if self.data.has_any_wall() {
            ctx.chassis.collide_movement += self.data.movement;
        }

        self.update_floor_moment_rate(ctx.status.in_action && ctx.status.action_rotating);

        let was_grounded = self.data.has_floor;
        apply_status_impulse(ctx, &mut self.data);

        if !was_grounded && let Some(fallback) = fallback_floor {
            debug!("body resting on bottomed-out wheels at {}", ctx.integrator.state.pos);
            self.data.set_floor_contact(
                fallback.relative_position,
                fallback.velocity,
                fallback.floor_normal,
            );
            apply_status_impulse(ctx, &mut self.data);
        }
    }

    fn update_floor_moment_rate(&mut self, rotating: bool) {
        self.floor_moment_rate = if rotating {
            floor_moment::RATE_MIN
        } else {
            f32::min(
                self.floor_moment_rate + floor_moment::RATE_STEP,
                floor_moment::RATE_MAX,
            )
        };
    }
}

/// Runs [`apply_contact_impulse`] with the friction and restitution of the current status.
fn apply_status_impulse(ctx: &mut VehicleContext, data: &mut CollisionData) {
    let status = ctx.status;

    let restitution = if status.in_respawn || status.suppress_bounce {
        0.0
    } else {
        RESTITUTION
    };
    let friction = if status.in_action {
        ACTION_FRICTION
    } else {
        FRICTION
    };
    let lock_xz = restitution > 0.0
        && ctx.chassis.airtime > LOCK_XZ_AIRTIME
        && ctx.integrator.state.velocity.y < LOCK_XZ_FALL_SPEED;

    apply_contact_impulse(
        ctx.integrator,
        data,
        friction,
        restitution,
        lock_xz,
        !status.jump_pad_disables_suspension,
    );
}

/// Folds one hitbox contact into the running sums of a body pass.
fn accumulate_contact(
    data: &mut CollisionData,
    hitbox: &Hitbox,
    info: &ContactInfo,
    min: &mut Vec3,
    max: &mut Vec3,
    pos_rel: &mut Vec3,
) {
    data.begin_contact();

    if info.has_any(WALL) {
        data.wall_normal += info.wall_normal;

        let mut skip_walls = false;
        if info.has_any(ANY_INVISIBLE_WALL) {
            data.has_invisible_wall = true;

            if !info.has_any(VISIBLE_WALL) {
                data.has_invisible_wall_only = true;
                skip_walls = info.has_any(TerrainType::HalfPipeInvisibleWall.bit());
            }
        }

        if !skip_walls {
            if info.has_any(TerrainType::Wall2.bit()) {
                data.has_wall3 = true;
            } else {
                data.has_wall = true;
            }
        }
    }

    if info.has_any(FLOOR) {
        data.floor_normal += info.floor_normal;
        data.has_floor = true;
    }

    let offset = info.penetration_offset;
    *min = min.minimize(offset);
    *max = max.maximize(offset);

    let mut dir = offset;
    dir.normalise();

    *pos_rel += hitbox.rel_pos();
    *pos_rel += dir * -hitbox.radius();
}

/// Records the closest visible wall of a contact.
fn process_wall(oracle: &dyn CollisionOracle, data: &mut CollisionData, info: &ContactInfo) {
    if !info.has_any(DRIVER_WALL_NO_INVISIBLE_WALL2)
        || oracle
            .closest_entry(info, DRIVER_WALL_NO_INVISIBLE_WALL2)
            .is_none()
    {
        return;
    }

    if !info.has_any(DRIVER_WALL_NO_INVISIBLE_WALL) {
        return;
    }

    if let Some(entry) = oracle.closest_entry(info, DRIVER_WALL_NO_INVISIBLE_WALL) {
        data.closest_wall_flags = entry.attribute.base_type() as u32;
        data.closest_wall_settings = entry.attribute.variant();

        if entry.attribute.is_soft() {
            data.has_soft_wall = true;
        }
    }
}

/// Applies the terrain entries of the closest floor of a contact.
fn process_floor(
    oracle: &dyn CollisionOracle,
    data: &mut CollisionData,
    info: &ContactInfo,
    stats: &VehicleStats,
) {
    if !info.has_any(FLOOR) {
        return;
    }

    let Some(entry) = oracle.closest_entry(info, FLOOR) else {
        return;
    };

    let attribute = entry.attribute;
    let base = attribute.base_type();

    if attribute.is_trickable() {
        data.trickable = true;
    }

    data.speed_factor = f32::min(data.speed_factor, stats.kcl_speed[base]);
    data.intensity = attribute.intensity();
    data.rot_factor += stats.kcl_rot[base];

    if attribute.is_reject_road() {
        data.reject_road = true;
    }

    data.closest_floor_flags = attribute.type_mask();
    data.closest_floor_settings = attribute.variant();

    if info.has_any(TerrainType::JumpPad.bit())
        && oracle
            .closest_entry(info, TerrainType::JumpPad.bit())
            .is_some()
    {
        data.trickable = true;
    }
}

/// Pushes the body out of the track and derives the averaged contact point and its velocity.
fn apply_body_collision(
    integrator: &mut Integrator,
    data: &mut CollisionData,
    movement: Vec3,
    pos_rel: Vec3,
    count: u32,
) {
    let ang_vel0_factor = integrator.ang_vel0_factor();
    let state = &mut integrator.state;
    state.pos += movement;

    if !data.has_floor && data.has_any_wall() {
        data.movement = movement;
    }

    let inv_count = 1.0 / count as f32;
    let scaled_rel = pos_rel * inv_count;
    data.rot_factor *= inv_count;

    let local_rel = state.main_rot.rotate_vector_inv(scaled_rel);
    let ang_vel = state.ang_vel0 * ang_vel0_factor;
    data.velocity = state.main_rot.rotate_vector(ang_vel.cross(local_rel)) + state.ext_vel;
    data.relative_position = scaled_rel;

    if data.has_floor {
        if state.int_vel.y > 0.0 {
            data.velocity.y += state.int_vel.y;
        }
        data.floor_normal.normalise();
    }
}

/// Sweeps a wheel sphere from its last position to `center` and records the contact.
#[allow(clippy::too_many_arguments)]
pub fn resolve_wheel_contact(
    oracle: &dyn CollisionOracle,
    stats: &VehicleStats,
    hitboxes: &mut HitboxSet,
    data: &mut CollisionData,
    body_pos: Vec3,
    collision_vel: Vec3,
    center: Vec3,
    radius: f32,
) {
    let hitbox = hitboxes.hitbox_mut(0);
    hitbox.set_base_radius(radius);
    data.reset();
    hitbox.set_world_pos(center);

    let Some(info) = oracle.query_sphere_sweep(
        hitbox.radius(),
        hitbox.last_pos(),
        hitbox.world_pos(),
        VEHICLE_COLLIDEABLE,
    ) else {
        data.speed_factor = 1.0;
        data.rot_factor = 1.0;
        return;
    };

    data.begin_contact();
    data.penetration_offset = info.penetration_offset;

    if let Some(soft_wall) = info.soft_wall
        && soft_wall.distance > f32::MIN_POSITIVE
    {
        data.penetration_offset += soft_wall.penetration_offset;
        data.soft_wall_normal = soft_wall.normal;
        data.has_soft_wall = true;
    }

    if info.has_any(FLOOR) {
        data.has_floor = true;
        data.floor_normal = info.floor_normal;
    }

    data.relative_position = hitbox.world_pos() - body_pos;
    data.velocity = collision_vel;

    if let Some(road_velocity) = info.road_velocity {
        data.has_road_velocity = true;
        data.road_velocity = road_velocity;
    }

    process_floor(oracle, data, &info, stats);
}

/// Resolves a body contact with an impulse along the combined floor and wall normal.
///
/// `friction` bounds the tangential part of the impulse relative to the normal part, and
/// `restitution` scales the bounce. `lock_xz` applies the impulse at the body's vertical axis.
/// Without `add_ext_vel_y` the impulse never changes vertical external velocity.
pub fn apply_contact_impulse(
    integrator: &mut Integrator,
    data: &CollisionData,
    friction: f32,
    restitution: f32,
    lock_xz: bool,
    add_ext_vel_y: bool,
) {
    if !data.has_contact() {
        return;
    }

    let mut dir = data.floor_normal + data.wall_normal;
    dir.normalise();

    let vel = data.velocity;
    let dot = vel.dot(dir);
    if dot >= 0.0 {
        return;
    }

    let rot_mat = integrator.world_inv_inertia();

    let mut rel_pos = data.relative_position;
    if lock_xz {
        rel_pos.x = 0.0;
        rel_pos.z = 0.0;
    }

    let cross = rot_mat.mult_vector33(rel_pos.cross(dir)).cross(rel_pos);
    let val = (-dot * (1.0 + restitution)) / (1.0 + dir.dot(cross));

    let mut tangent = dir.cross(-vel).cross(dir);
    tangent.normalise();

    let max_tangent = friction * val.abs();
    let mut tangent_val = val * vel.dot(tangent) / dot;
    if tangent_val.abs() > max_tangent {
        tangent_val = if tangent_val < 0.0 {
            -max_tangent
        } else {
            max_tangent
        };
    }

    let impulse = dir * val + tangent * tangent_val;

    let state = &mut integrator.state;
    let mut impulse_y = impulse.y;
    if !add_ext_vel_y {
        impulse_y = 0.0;
    } else if data.has_floor && state.int_vel.y > 0.0 {
        let vel_y = state.int_vel.y + state.ext_vel.y;
        if vel_y < 0.0 {
            state.ext_vel.y = vel_y;
        }
    }

    let prev_ext_vel_y = state.ext_vel.y;
    state.ext_vel += Vec3::new(impulse.x, impulse_y, impulse.z);

    if prev_ext_vel_y < 0.0 && state.ext_vel.y > 0.0 && state.ext_vel.y < BOUNCE_KILL_VEL {
        state.ext_vel.y = 0.0;
    }

    let mut ang = state
        .main_rot
        .rotate_vector_inv(rot_mat.mult_vector33(rel_pos.cross(impulse)));
    ang.y = 0.0;
    state.ang_vel0 += ang;
}

/// Converts the tangential slip at a floor contact into a bounded push along and across
/// `forward`, optionally with the matching angular velocity.
///
/// `down` and `rate` bound the parts along and across `forward` relative to the normal impulse.
/// The push never has a component along `next_dir`.
#[allow(clippy::too_many_arguments)]
pub fn apply_floor_moment(
    integrator: &mut Integrator,
    data: &CollisionData,
    down: f32,
    rate: f32,
    forward: Vec3,
    next_dir: Vec3,
    speed: Vec3,
    axes: FloorMomentAxes,
) {
    if !data.has_floor {
        return;
    }

    let normal = data.floor_normal;
    let vel_dot = data.velocity.dot(normal);
    if vel_dot >= 0.0 {
        return;
    }

    let rel_pos = data.relative_position;
    let inv_inertia = integrator.world_inv_inertia();

    let cross = inv_inertia.mult_vector(rel_pos.cross(normal)).cross(rel_pos);
    let scalar = -vel_dot / (1.0 + normal.dot(cross));

    let mut slip = normal.cross(-speed).cross(normal);
    if slip.length_squared() <= f32::EPSILON {
        return;
    }
    slip.normalise();

    let speed_dot = f32::min(0.0, speed.dot(slip));
    slip *= (scalar * speed_dot) / vel_dot;

    let (mut proj, mut rej) = slip.proj_and_rej(forward);

    let proj_norm = bound_norm(proj.mag(), down * scalar.abs());
    let rej_norm = bound_norm(rej.mag(), rate * scalar.abs());

    proj.normalise();
    rej.normalise();
    proj *= proj_norm;
    rej *= rej_norm;

    let push = proj + rej;
    let mut linear = push;

    if !axes.horizontal {
        linear.x = 0.0;
        linear.z = 0.0;
    }
    if !axes.vertical {
        linear.y = 0.0;
    }

    let state = &mut integrator.state;
    state.ext_vel += linear.rej(next_dir);

    if axes.angular {
        let mut ang = state
            .main_rot
            .rotate_vector_inv(inv_inertia.mult_vector(rel_pos.cross(push)));
        ang.y = 0.0;
        if !axes.horizontal {
            ang.x = 0.0;
        }
        state.ang_vel0 += ang;
    }
}

/// Caps `norm` to `max` in magnitude. Comparisons against NaN fail, so NaN passes through.
fn bound_norm(norm: f32, max: f32) -> f32 {
    if max < norm.abs() {
        if norm < 0.0 { -max } else { max }
    } else {
        norm
    }
}
