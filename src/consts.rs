/// Fixed timestep of one simulation frame.
pub const DT: f32 = 1.0;

/// Default cap on the composed velocity magnitude.
pub const MAX_SPEED: f32 = 120.0;

/// Cap on upward drivetrain velocity while airborne.
pub const TERMINAL_Y_VEL: f32 = 120.0;

/// Per-tick decay of the external velocity.
pub const EXT_VEL_DECAY: f32 = 0.998;

/// Per-tick decay of the torque-driven angular velocity.
pub const ANG_VEL_DECAY: f32 = 0.98;

/// Gravity applied while racing.
pub const GRAVITY: f32 = -1.3;

/// Gravity of a freshly reset body.
pub const DEFAULT_GRAVITY: f32 = -1.0;

pub const ANG_VEL0_Y_FACTOR: f32 = 0.9;

pub const STABILIZATION_FACTOR: f32 = 0.1;

/// Alignment past which the body is treated as already upright.
pub const UPRIGHT_DOT: f32 = 0.9999;

pub const ANG_VEL0_LIMIT: [f32; 3] = [0.4, 0.4, 0.8];

pub mod floor_moment {
    /// Projection clamp passed by every wheel.
    pub const DOWN: f32 = 0.1;
    pub const RATE_MAX: f32 = 0.8;
    pub const RATE_MIN: f32 = 0.01;
    pub const RATE_STEP: f32 = 0.01;
}

pub mod impulse {
    /// Tangential friction while an action is playing.
    pub const ACTION_FRICTION: f32 = 0.3;
    pub const FRICTION: f32 = 0.01;
    pub const RESTITUTION: f32 = 0.05;
    /// Upward external velocity below which a bounce is killed.
    pub const BOUNCE_KILL_VEL: f32 = 10.0;
    pub const LOCK_XZ_AIRTIME: u32 = 20;
    pub const LOCK_XZ_FALL_SPEED: f32 = -50.0;
}

pub mod suspension {
    /// Slack added to the travel each tick before the wheel is re-placed.
    pub const DRIFT_SLACK: f32 = 5.0;
    /// Scale of the gravity sweep velocity given to a wheel.
    pub const COLLISION_VEL_SCALE: f32 = 10.0;
    /// External upward velocity past which suspension stops pushing.
    pub const BOUNCE_EXT_VEL_Y: f32 = 5.0;
    /// Forward offset of the wheel sphere per unit of lean.
    pub const LEAN_OFFSET: f32 = 0.3;
    pub const RADIUS_EASE: f32 = 0.1;
    /// Sink depth per terrain intensity level.
    pub const SINK_PER_INTENSITY: f32 = 3.0;
    /// Height of the initial sweep start above the body.
    pub const INITIAL_SWEEP_HEIGHT: f32 = 100.0;
    /// Radius of a wheel sphere before its parameters are applied.
    pub const PLACEHOLDER_RADIUS: f32 = 10.0;
}

pub mod moving_obj {
    pub const EASE: f32 = 0.2;
    pub const FLOOR_DECAY: f32 = 0.7;
    pub const AIR_DECAY: f32 = 1.0;
    pub const LONG_AIR_DECAY: f32 = 0.9;
    pub const LONG_AIRTIME: u32 = 20;
}

/// Slerp rate of the decaying rotation overlays back to identity.
pub const OVERLAY_DECAY: f32 = 0.1;

/// Easing rate of the body sink depth.
pub const SINK_DEPTH_EASE: f32 = 0.1;
