use fastrand::Rng;
use kartsim::{
    CollisionOracle, VehicleParams, VehiclePhysics, VehicleStatus,
    glam::{Quat, Vec3},
    math::QuatExt,
};

/// Height at which the standard kart spawns with its wheels just touching a floor at 0.
pub const KART_SPAWN_HEIGHT: f32 = 20.0;

pub fn spawn(params: VehicleParams, oracle: &dyn CollisionOracle, pos: Vec3) -> VehiclePhysics {
    let mut vehicle = VehiclePhysics::new(params);
    vehicle.set_initial_state(oracle, &VehicleStatus::default(), pos, Quat::IDENTITY);
    vehicle
}

pub fn spawn_kart(oracle: &dyn CollisionOracle) -> VehiclePhysics {
    spawn(
        VehicleParams::standard_kart(),
        oracle,
        Vec3::new(0.0, KART_SPAWN_HEIGHT, 0.0),
    )
}

/// A reproducible sequence of drivetrain inputs.
pub fn random_inputs(seed: u64, count: usize) -> Vec<VehicleStatus> {
    let mut rng = Rng::with_seed(seed);

    (0..count)
        .map(|_| {
            let yaw = (rng.f32() - 0.5) * 0.2;
            let forward = Quat::from_rotation_y(yaw).rotate_vector(Vec3::Z);

            VehicleStatus {
                int_vel: forward * (rng.f32() * 4.0),
                move_dir: forward,
                lean_rot: rng.f32() * 2.0 - 1.0,
                in_action: rng.u8(..) < 8,
                ..VehicleStatus::default()
            }
        })
        .collect()
}

pub fn run(
    vehicle: &mut VehiclePhysics,
    oracle: &dyn CollisionOracle,
    inputs: &[VehicleStatus],
    mut after_tick: impl FnMut(&VehiclePhysics),
) {
    for status in inputs {
        vehicle.tick(oracle, status);
        after_tick(vehicle);
    }
}

pub fn run_idle(vehicle: &mut VehiclePhysics, oracle: &dyn CollisionOracle, ticks: usize) {
    let status = VehicleStatus::default();
    for _ in 0..ticks {
        vehicle.tick(oracle, &status);
    }
}
