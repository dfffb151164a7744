use glam::{Quat, Vec3};

use super::{params::VehicleKind, rigid_body::RigidBodyState};
use crate::{
    consts::{ANG_VEL_DECAY, ANG_VEL0_LIMIT, EXT_VEL_DECAY, TERMINAL_Y_VEL, UPRIGHT_DOT},
    math::{Matrix34, QuatExt, Vec3Ext, float::sqrt},
};

/// The closed set of ways a vehicle kind keeps itself upright.
pub trait UprightBehavior {
    /// Runs on the clamped angular velocity, before it rotates the body.
    fn force_upright(&self, state: &mut RigidBodyState);
    /// Eases the base rotation back toward the stabilization target.
    fn stabilize(&self, state: &mut RigidBodyState);
}

/// Four-wheeled vehicles stabilize straight toward `top`.
pub struct KartUpright;

/// Two-wheeled vehicles drop roll velocity and stabilize toward `top_biased`, re-orthogonalized
/// against the facing direction.
pub struct BikeUpright;

fn slerp_toward(state: &mut RigidBodyState, target: Vec3) {
    let top = state.main_rot.rotate_vector(Vec3::Y);
    if top.dot(target).abs() >= UPRIGHT_DOT {
        return;
    }

    let q = Quat::make_vector_rotation(top, target);
    state.main_rot = state
        .main_rot
        .slerp_to(q.mult_swap(state.main_rot), state.stabilization_factor);
}

impl UprightBehavior for KartUpright {
    fn force_upright(&self, _state: &mut RigidBodyState) {}

    fn stabilize(&self, state: &mut RigidBodyState) {
        slerp_toward(state, state.top);
    }
}

impl UprightBehavior for BikeUpright {
    fn force_upright(&self, state: &mut RigidBodyState) {
        state.ang_vel0.z = 0.0;
    }

    fn stabilize(&self, state: &mut RigidBodyState) {
        let back = state.main_rot.rotate_vector(Vec3::Z);
        let mut forward = state.top.cross(back).cross(state.top);
        forward.normalise();

        let mut target = forward.cross(state.top_biased.cross(forward));
        target.normalise();

        slerp_toward(state, target);
    }
}

impl VehicleKind {
    #[must_use]
    pub fn upright(self) -> &'static dyn UprightBehavior {
        match self {
            Self::Kart => &KartUpright,
            Self::Bike => &BikeUpright,
        }
    }
}

/// Advances a [`RigidBodyState`] by one fixed step.
#[derive(Clone, Debug, PartialEq)]
pub struct Integrator {
    pub state: RigidBodyState,
    kind: VehicleKind,
    inertia: Matrix34,
    inv_inertia: Matrix34,
    ang_vel0_factor: f32,
}

impl Integrator {
    #[must_use]
    pub fn new(kind: VehicleKind) -> Self {
        Self {
            state: RigidBodyState::DEFAULT,
            kind,
            inertia: Matrix34::IDENTITY,
            inv_inertia: Matrix34::IDENTITY,
            ang_vel0_factor: 1.0,
        }
    }

    /// Restores the freshly constructed state. Inertia and the angular factor are kept.
    pub fn init(&mut self) {
        self.state = RigidBodyState::DEFAULT;
    }

    /// Clears every velocity and accumulator.
    pub fn reset(&mut self) {
        self.state.reset_motion();
    }

    /// Diagonal inertia tensor from the two body cuboids.
    pub fn set_inertia(&mut self, m: Vec3, n: Vec3) {
        const TWELFTH: f32 = 1.0 / 12.0;

        self.inertia = Matrix34::ZERO;
        self.inertia[(0, 0)] = TWELFTH * (m.y * m.y + m.z * m.z) + (n.y * n.y + n.z * n.z);
        self.inertia[(1, 1)] = TWELFTH * (m.z * m.z + m.x * m.x) + (n.z * n.z + n.x * n.x);
        self.inertia[(2, 2)] = TWELFTH * (m.x * m.x + m.y * m.y) + (n.x * n.x + n.y * n.y);
        self.inv_inertia = self.inertia.inverse_to33();
    }

    pub fn set_body_params(&mut self, ang_vel0_factor: f32, cuboids: [Vec3; 2]) {
        self.ang_vel0_factor = ang_vel0_factor;
        self.set_inertia(cuboids[0], cuboids[1]);
    }

    #[must_use]
    pub const fn kind(&self) -> VehicleKind {
        self.kind
    }

    #[must_use]
    pub const fn inertia(&self) -> &Matrix34 {
        &self.inertia
    }

    #[must_use]
    pub const fn inv_inertia(&self) -> &Matrix34 {
        &self.inv_inertia
    }

    #[must_use]
    pub const fn ang_vel0_factor(&self) -> f32 {
        self.ang_vel0_factor
    }

    pub fn add_force(&mut self, force: Vec3) {
        self.state.total_force += force;
    }

    /// Integrates forces, velocities and rotations over `dt`.
    ///
    /// The composed speed is clamped to `max_speed`; `air` caps the upward drivetrain velocity.
    pub fn integrate(&mut self, dt: f32, max_speed: f32, air: bool) {
        let upright = self.kind.upright();
        let s = &mut self.state;

        if !s.no_gravity {
            s.total_force.y += s.gravity;
        }

        s.acceleration = s.total_force;
        s.ext_vel += s.acceleration * dt;

        if s.kill_ext_vel_y {
            s.ext_vel.y = f32::min(0.0, s.ext_vel.y);
        }

        s.ext_vel *= EXT_VEL_DECAY;
        s.ang_vel0 *= ANG_VEL_DECAY;

        let player_back = s.main_rot.rotate_vector(Vec3::Z);
        let mut player_back_horiz = player_back;
        player_back_horiz.y = 0.0;

        if player_back_horiz.length_squared() > f32::EPSILON {
            player_back_horiz.normalise();
            let (speed_back, rej) = s.ext_vel.proj_and_rej(player_back_horiz);
            s.ext_vel = rej;

            let norm = speed_back.length_squared();
            let norm = if norm > f32::EPSILON { sqrt(norm) } else { 0.0 };

            s.speed_fix = norm * player_back.dot(player_back_horiz);
            if speed_back.dot(player_back_horiz) < 0.0 {
                s.speed_fix = -s.speed_fix;
            }
        }

        if air {
            s.int_vel.y = f32::min(TERMINAL_Y_VEL, s.int_vel.y);
        }

        s.velocity = s.ext_vel * dt + s.int_vel + s.moving_obj_vel + s.moving_road_vel;
        s.speed_norm = f32::min(s.velocity.normalise(), max_speed);
        s.velocity *= s.speed_norm;
        s.pos += s.velocity;

        let t1 = self.inv_inertia.mult_vector33(s.total_torque) * dt;
        s.ang_vel0 += (t1 + self.inv_inertia.mult_vector33(t1 + s.total_torque) * dt) * 0.5;

        s.ang_vel0.x = s.ang_vel0.x.clamp(-ANG_VEL0_LIMIT[0], ANG_VEL0_LIMIT[0]);
        s.ang_vel0.y =
            s.ang_vel0.y.clamp(-ANG_VEL0_LIMIT[1], ANG_VEL0_LIMIT[1]) * s.ang_vel0_y_factor;
        s.ang_vel0.z = s.ang_vel0.z.clamp(-ANG_VEL0_LIMIT[2], ANG_VEL0_LIMIT[2]);

        if s.force_upright {
            upright.force_upright(s);
        }

        let ang_vel_sum = s.ang_vel2 + s.ang_vel1 + s.ang_vel0 * self.ang_vel0_factor;

        if ang_vel_sum.length_squared() > f32::EPSILON {
            s.main_rot = s
                .main_rot
                .add_quat(s.main_rot.mult_swap_vec(ang_vel_sum).scale_quat(dt * 0.5));
            normalise_or_identity(&mut s.main_rot);
        }

        if s.force_upright {
            upright.stabilize(s);
        }

        normalise_or_identity(&mut s.main_rot);

        s.full_rot = s.extra_rot.mult_swap(s.main_rot).mult_swap(s.special_rot);
        s.full_rot.normalise();

        debug_assert!(!s.pos.is_nan(), "Integrator::integrate(): position is NaN");
        debug_assert!(!s.main_rot.is_nan(), "Integrator::integrate(): rotation is NaN");

        s.total_force = Vec3::ZERO;
        s.total_torque = Vec3::ZERO;
        s.ang_vel2 = Vec3::ZERO;
    }

    /// Adds a suspension spring force: only the vertical part of `f_linear` moves the body, and
    /// the torque of `f_rot` never yaws it.
    pub fn apply_suspension_wrench(&mut self, p: Vec3, f_linear: Vec3, f_rot: Vec3, ignore_x: bool) {
        let s = &mut self.state;
        s.total_force.y += f_linear.y;

        let f_body = s.full_rot.rotate_vector_inv(f_rot);
        let r_body = s.full_rot.rotate_vector_inv(p - s.pos);
        let mut torque = r_body.cross(f_body);

        if ignore_x {
            torque.x = 0.0;
        }
        torque.y = 0.0;

        s.total_torque += torque;
    }

    /// Applies `f` at world point `p`, scaling only the resulting torque.
    pub fn apply_wrench_scaled(&mut self, p: Vec3, f: Vec3, scale: f32) {
        let s = &mut self.state;
        s.total_force += f;

        let inv_force_rot = s.full_rot.rotate_vector_inv(f);
        let inv_pos_rot = s.full_rot.rotate_vector_inv(p - s.pos);

        s.total_torque += inv_pos_rot.cross(inv_force_rot) * scale;
    }

    /// `R · I⁻¹ · Rᵀ` for the current base rotation.
    #[must_use]
    pub fn world_inv_inertia(&self) -> Matrix34 {
        let rot_mat = Matrix34::make_q(self.state.main_rot);
        let rot_mat_trans = rot_mat.transpose();
        rot_mat
            .multiply_to(&self.inv_inertia)
            .multiply_to(&rot_mat_trans)
    }
}

fn normalise_or_identity(q: &mut Quat) {
    if q.squared_norm().abs() > f32::EPSILON {
        q.normalise();
    } else {
        *q = Quat::IDENTITY;
    }
}
