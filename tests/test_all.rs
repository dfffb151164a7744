#![allow(unused)]

mod physics_test;
use crate::physics_test::*;

use kartsim::{
    CollisionData, CollisionOracle, RigidBodyState, VehicleKind, VehicleParams, VehiclePhysics,
    VehicleStatus,
    consts::{DT, EXT_VEL_DECAY, GRAVITY, MAX_SPEED, suspension::COLLISION_VEL_SCALE},
    glam::{Quat, Vec3, Vec4},
    logging,
    math::{Matrix34, QuatExt, Vec3Ext, float},
    sim::{
        BodyCollisionResolver, ChassisState, ContactEntry, ContactInfo, FloorMomentAxes,
        HitboxParams, Integrator, MAX_CONTACT_ENTRIES, SoftWallContact, VehicleContext,
        apply_contact_impulse, apply_floor_moment,
        terrain::{TerrainAttribute, TerrainType},
    },
    trace::{FrameRecord, ReferenceFrame, TraceComparison, TraceHeader, read_reference},
};

const ROT_TOLERANCE: f32 = 1e-5;

fn assert_sane(vehicle: &VehiclePhysics) {
    let state = vehicle.state();
    assert!(state.pos.is_finite(), "position is not finite: {}", state.pos);
    assert!(
        state.main_rot.is_unit(ROT_TOLERANCE),
        "main_rot is not normalized: {:?}",
        state.main_rot
    );
    assert!(
        state.full_rot().is_unit(ROT_TOLERANCE),
        "full_rot is not normalized: {:?}",
        state.full_rot()
    );

    for (idx, wheel) in vehicle.wheels().iter().enumerate() {
        let travel = wheel.wheel().suspension_travel();
        assert!(
            (0.0..=wheel.max_travel_scaled()).contains(&travel),
            "wheel {idx} travel {travel} outside [0, {}]",
            wheel.max_travel_scaled()
        );
    }
}

#[test]
fn frsqrte_matches_hardware_table() {
    let cases = [
        (1.0, 0x3FEF_FE80_0000_0000u64),
        (2.0, 0x3FE6_9FA0_0000_0000),
        (4.0, 0x3FDF_FE80_0000_0000),
        (0.25, 0x3FFF_FE80_0000_0000),
        (100.0, 0x3FB9_9940_0000_0000),
    ];

    for (input, expected) in cases {
        let actual = float::frsqrte(input).to_bits();
        assert_eq!(
            actual, expected,
            "frsqrte({input}) = {actual:#018X}, expected {expected:#018X}"
        );
    }
}

#[test]
fn frsqrte_special_values() {
    assert_eq!(float::frsqrte(0.0), f64::INFINITY);
    assert_eq!(float::frsqrte(-0.0), f64::NEG_INFINITY);
    assert_eq!(float::frsqrte(f64::INFINITY), 0.0);
    assert!(float::frsqrte(-1.0).is_nan());
    assert!(float::frsqrte(f64::NAN).is_nan());
}

#[test]
fn emulated_sqrt_is_not_ieee() {
    assert_eq!(float::frsqrt(1.0), 0.999_999_94);
    assert_eq!(float::sqrt(1.0), 0.999_999_94);
    assert_eq!(float::sqrt(4.0), 1.999_999_9);
    assert_eq!(float::sqrt(0.25), 0.499_999_97);
    assert_eq!(float::sqrt(100.0), 10.0);

    assert_eq!(float::sqrt(0.0), 0.0);
    assert_eq!(float::sqrt(-1.0), 0.0);
}

#[test]
fn fused_ops_round_once() {
    let x = 1.0 + 2f32.powi(-12);
    let exact = 2f32.powi(-11) + 2f32.powi(-24);

    assert_eq!(float::fma(x, x, -1.0), exact);
    assert_eq!(float::fms(x, x, 1.0), exact);
    assert_ne!(x * x - 1.0, exact);
}

#[test]
fn ext_vel_decays_without_gravity() {
    let mut integrator = Integrator::new(VehicleKind::Kart);
    integrator.state.no_gravity = true;
    integrator.state.ext_vel = Vec3::new(10.0, 0.0, 0.0);

    integrator.integrate(DT, MAX_SPEED, true);

    let state = &integrator.state;
    assert_eq!(state.ext_vel, Vec3::new(10.0 * EXT_VEL_DECAY, 0.0, 0.0));
    assert!((state.pos.x - 10.0 * EXT_VEL_DECAY).abs() < 1e-4);
    assert_eq!(state.pos.y, 0.0);
}

#[test]
fn speed_is_clamped() {
    let mut integrator = Integrator::new(VehicleKind::Kart);
    integrator.state.no_gravity = true;
    integrator.state.ext_vel = Vec3::new(500.0, 0.0, 0.0);

    integrator.integrate(DT, MAX_SPEED, true);

    let state = &integrator.state;
    assert_eq!(state.speed_norm, MAX_SPEED);
    assert!(
        (state.pos.mag() - MAX_SPEED).abs() < 1e-3,
        "moved {} in one tick",
        state.pos.mag()
    );
}

#[test]
fn contact_impulse_kills_small_bounce() {
    let mut integrator = Integrator::new(VehicleKind::Kart);
    integrator.state.ext_vel = Vec3::new(0.0, -5.0, 0.0);

    let mut data = CollisionData::new();
    data.set_floor_contact(Vec3::ZERO, Vec3::new(0.0, -5.0, 0.0), Vec3::Y);

    apply_contact_impulse(&mut integrator, &data, 0.01, 0.05, false, true);

    assert_eq!(integrator.state.ext_vel.y, 0.0);
    assert_eq!(integrator.state.ang_vel0, Vec3::ZERO);
}

#[test]
fn contact_impulse_keeps_large_bounce() {
    let mut integrator = Integrator::new(VehicleKind::Kart);
    integrator.state.ext_vel = Vec3::new(0.0, -300.0, 0.0);

    let mut data = CollisionData::new();
    data.set_floor_contact(Vec3::ZERO, Vec3::new(0.0, -300.0, 0.0), Vec3::Y);

    apply_contact_impulse(&mut integrator, &data, 0.01, 0.05, false, true);
    assert!((integrator.state.ext_vel.y - 15.0).abs() < 1e-3);

    // a separating contact is left alone
    let mut separating = CollisionData::new();
    separating.set_floor_contact(Vec3::ZERO, Vec3::new(0.0, 5.0, 0.0), Vec3::Y);

    let before = integrator.state;
    apply_contact_impulse(&mut integrator, &separating, 0.01, 0.05, false, true);
    assert_eq!(integrator.state.ext_vel, before.ext_vel);
}

#[test]
fn locked_axis_impulse_adds_no_spin() {
    let mut data = CollisionData::new();
    data.set_floor_contact(Vec3::new(10.0, -5.0, 10.0), Vec3::new(0.0, -20.0, 0.0), Vec3::Y);

    let mut free = Integrator::new(VehicleKind::Kart);
    free.state.ext_vel = Vec3::new(0.0, -20.0, 0.0);
    apply_contact_impulse(&mut free, &data, 0.01, 0.05, false, true);
    assert!(
        free.state.ang_vel0.x != 0.0 && free.state.ang_vel0.z != 0.0,
        "an off-center contact should spin the body: {}",
        free.state.ang_vel0
    );

    let mut locked = Integrator::new(VehicleKind::Kart);
    locked.state.ext_vel = Vec3::new(0.0, -20.0, 0.0);
    apply_contact_impulse(&mut locked, &data, 0.01, 0.05, true, true);
    assert_eq!(locked.state.ang_vel0, Vec3::ZERO);
}

#[test]
fn impulse_can_leave_vertical_velocity_alone() {
    let mut data = CollisionData::new();
    data.set_floor_contact(Vec3::ZERO, Vec3::new(3.0, -20.0, 0.0), Vec3::Y);

    let mut integrator = Integrator::new(VehicleKind::Kart);
    integrator.state.ext_vel = Vec3::new(0.0, -20.0, 0.0);
    apply_contact_impulse(&mut integrator, &data, 0.01, 0.05, false, false);

    // friction still acts against the sideways slide
    assert_eq!(integrator.state.ext_vel.y, -20.0);
    assert!(integrator.state.ext_vel.x < 0.0);

    let mut vertical = Integrator::new(VehicleKind::Kart);
    vertical.state.ext_vel = Vec3::new(0.0, -20.0, 0.0);
    apply_contact_impulse(&mut vertical, &data, 0.01, 0.05, false, true);
    assert!(vertical.state.ext_vel.y > -20.0);
}

#[test]
fn floor_moment_passes_nan_bounds_through() {
    let mut data = CollisionData::new();
    data.set_floor_contact(Vec3::new(0.0, -20.0, 0.0), Vec3::new(0.0, -5.0, 0.0), Vec3::Y);
    let axes = FloorMomentAxes {
        horizontal: true,
        vertical: true,
        angular: false,
    };

    let push = |down: f32, rate: f32| {
        let mut integrator = Integrator::new(VehicleKind::Kart);
        apply_floor_moment(
            &mut integrator,
            &data,
            down,
            rate,
            Vec3::Z,
            Vec3::Z,
            Vec3::new(5.0, 0.0, 0.0),
            axes,
        );
        integrator.state.ext_vel
    };

    let unbounded = push(100.0, 100.0);
    assert!(unbounded.x < 0.0, "slip should be pushed back: {unbounded}");
    assert_eq!(push(f32::NAN, f32::NAN), unbounded);

    let bounded = push(0.1, 0.01);
    assert!(bounded.x < 0.0 && bounded.x > unbounded.x, "rate bound ignored: {bounded}");
}

#[test]
fn floor_moment_skips_slip_free_contact() {
    let mut data = CollisionData::new();
    data.set_floor_contact(Vec3::new(0.0, -20.0, 0.0), Vec3::new(0.0, -5.0, 0.0), Vec3::Y);

    let mut integrator = Integrator::new(VehicleKind::Kart);
    apply_floor_moment(
        &mut integrator,
        &data,
        0.1,
        0.8,
        Vec3::Z,
        Vec3::Z,
        Vec3::new(0.0, -5.0, 0.0),
        FloorMomentAxes {
            horizontal: true,
            vertical: true,
            angular: true,
        },
    );

    assert_eq!(integrator.state.ext_vel, Vec3::ZERO);
    assert_eq!(integrator.state.ang_vel0, Vec3::ZERO);
}

#[test]
fn contact_info_keeps_type_bits_past_capacity() {
    let mut info = ContactInfo::default();
    for _ in 0..MAX_CONTACT_ENTRIES {
        info.push_entry(ContactEntry {
            distance: 1.0,
            attribute: TerrainAttribute::new(TerrainType::Road, 0),
        });
    }
    info.push_entry(ContactEntry {
        distance: 5.0,
        attribute: TerrainAttribute::new(TerrainType::Wall, 0),
    });

    assert_eq!(info.entries.len(), MAX_CONTACT_ENTRIES);
    assert!(info.has_any(TerrainType::Wall.bit()));
    assert!(
        info.entries
            .iter()
            .all(|entry| entry.attribute.base_type() == TerrainType::Road as usize)
    );
}

#[test]
fn std_trig_stays_within_tolerance() {
    const TOLERANCE: f32 = 1e-6;

    assert_eq!(Matrix34::make_r(Vec3::ZERO), Matrix34::IDENTITY);
    assert_eq!(Quat::from_rpy(Vec3::ZERO), Quat::IDENTITY);

    for degrees in [15.0f32, 33.3, 90.0, 140.0] {
        let angle = degrees.to_radians();
        let (sin, cos) = (f64::from(angle).sin() as f32, f64::from(angle).cos() as f32);

        // wheel lean tilt
        let down = Matrix34::make_r(Vec3::new(angle, 0.0, 0.0)).mult_vector33(Vec3::NEG_Y);
        assert!(
            down.distance(Vec3::new(0.0, -cos, -sin)) < TOLERANCE,
            "tilt by {degrees} gave {down}"
        );

        let (half_sin, half_cos) = (
            (f64::from(angle) * 0.5).sin() as f32,
            (f64::from(angle) * 0.5).cos() as f32,
        );
        let yaw = Quat::from_rpy(Vec3::new(0.0, angle, 0.0));
        let expected = Quat::from_xyzw(0.0, half_sin, 0.0, half_cos);
        assert!(
            Vec4::from(yaw).distance(Vec4::from(expected)) < TOLERANCE,
            "from_rpy by {degrees} gave {yaw:?}"
        );

        let halfway = Quat::IDENTITY.slerp_to(yaw, 0.5);
        let quarter = f64::from(angle) * 0.25;
        let expected = Quat::from_xyzw(0.0, quarter.sin() as f32, 0.0, quarter.cos() as f32);
        assert!(
            Vec4::from(halfway).distance(Vec4::from(expected)) < TOLERANCE,
            "slerp by {degrees} gave {halfway:?}"
        );
    }
}

#[test]
fn body_pass_pushes_out_of_floor() {
    let oracle = FlatFloor::road(0.0);
    let params = VehicleParams::standard_kart();
    let status = VehicleStatus::default();

    let mut integrator = Integrator::new(VehicleKind::Kart);
    integrator.state.pos = Vec3::new(0.0, -10.0, 0.0);
    let mut chassis = ChassisState::default();

    let mut resolver = BodyCollisionResolver::new(&params.hitboxes);
    let mut ctx = VehicleContext {
        oracle: &oracle,
        params: &params,
        status: &status,
        integrator: &mut integrator,
        chassis: &mut chassis,
    };
    resolver.calc_body_collision(&mut ctx, Quat::IDENTITY);

    let data = resolver.data();
    assert!(data.has_floor);
    assert!(!data.has_any_wall());
    // only the two lower spheres reach the floor
    assert_eq!(data.contact_count, 2);
    assert_eq!(integrator.state.pos.y, -2.0);
    assert!(data.floor_normal.distance(Vec3::Y) < 1e-5);
    assert!(
        data.relative_position.distance(Vec3::new(0.0, 2.0, 2.5)) < 1e-4,
        "contact point {}",
        data.relative_position
    );
    assert_eq!(
        data.speed_factor,
        params.stats.kcl_speed[TerrainType::Road as usize]
    );
}

#[test]
fn body_pass_pushes_out_of_wall() {
    let oracle = FloorAndWall {
        floor: FlatFloor::road(-100_000.0),
        wall_x: 80.0,
    };
    let params = VehicleParams::standard_kart();
    let status = VehicleStatus::default();

    let old_pos = Vec3::new(40.0, 0.0, 0.0);
    let mut integrator = Integrator::new(VehicleKind::Kart);
    integrator.state.pos = old_pos;
    integrator.state.ext_vel = Vec3::new(5.0, 0.0, 0.0);
    let mut chassis = ChassisState::default();

    let mut resolver = BodyCollisionResolver::new(&params.hitboxes);
    let mut ctx = VehicleContext {
        oracle: &oracle,
        params: &params,
        status: &status,
        integrator: &mut integrator,
        chassis: &mut chassis,
    };
    resolver.calc_body_collision(&mut ctx, Quat::IDENTITY);

    let data = resolver.data();
    assert!(data.has_wall);
    assert!(!data.has_floor);
    assert_eq!(data.contact_count, 1);
    assert!(Vec3::NEG_X.dot(integrator.state.pos - old_pos) > 0.0);
    assert_eq!(data.movement, Vec3::new(-6.0, 0.0, 0.0));
    assert_eq!(data.velocity, Vec3::new(5.0, 0.0, 0.0));
    assert!(data.wall_normal.distance(Vec3::NEG_X) < 1e-5);
}

#[test]
#[should_panic(expected = "exceed the limit")]
fn too_many_hitboxes() {
    let mut params = VehicleParams::standard_kart();
    params.hitboxes = vec![HitboxParams::new(Vec3::ZERO, 10.0); 17];
    VehiclePhysics::new(params);
}

#[test]
#[should_panic(expected = "needs 2 wheels")]
fn wheel_count_mismatch() {
    let mut params = VehicleParams::standard_bike();
    params.wheels = VehicleParams::STANDARD_KART_WHEELS.to_vec();
    VehiclePhysics::new(params);
}

#[test]
fn free_fall() {
    let oracle = EmptyTrack;
    let mut vehicle = spawn(
        VehicleParams::standard_kart(),
        &oracle,
        Vec3::new(0.0, 1000.0, 0.0),
    );

    vehicle.tick(&oracle, &VehicleStatus::default());
    assert_eq!(vehicle.state().ext_vel, Vec3::new(0.0, GRAVITY * EXT_VEL_DECAY, 0.0));

    let mut last_y = vehicle.pos().y;
    for _ in 1..10 {
        vehicle.tick(&oracle, &VehicleStatus::default());
        assert!(vehicle.pos().y < last_y);
        last_y = vehicle.pos().y;
        assert_sane(&vehicle);
    }

    assert!(!vehicle.is_grounded());
    assert_eq!(vehicle.floor_contact_count(), 0);
    assert_eq!(vehicle.collision_data().speed_factor, 1.0);
    assert_eq!(vehicle.collision_data().rot_factor, 1.0);
    assert_eq!(vehicle.wheel_speed_factor(), 1.0);
    for wheel in vehicle.wheels() {
        assert_eq!(wheel.wheel().data().speed_factor, 1.0);
        assert_eq!(wheel.wheel().data().rot_factor, 1.0);
    }
    assert_eq!(vehicle.airtime(), 10);
    assert_eq!(vehicle.tick_count(), 10);
    assert_eq!(vehicle.pos().x, 0.0);
    assert_eq!(vehicle.pos().z, 0.0);
}

#[test]
fn kart_settles_on_flat_floor() {
    let oracle = FlatFloor::road(0.0);
    let mut vehicle = spawn_kart(&oracle);

    for _ in 0..300 {
        vehicle.tick(&oracle, &VehicleStatus::default());
        assert_sane(&vehicle);
    }

    assert!(vehicle.is_grounded());
    assert_eq!(vehicle.airtime(), 0);
    assert!(!vehicle.collision_data().has_floor, "body should rest on its wheels");
    assert!(
        vehicle.pos().y > 0.0 && vehicle.pos().y < KART_SPAWN_HEIGHT + 10.0,
        "resting at {}",
        vehicle.pos()
    );
    assert!(
        vehicle.state().ext_vel.mag() < 1.0,
        "still moving at {}",
        vehicle.state().ext_vel
    );

    let up = vehicle.full_rot().rotate_vector(Vec3::Y);
    assert!(up.y > 0.95, "tipped over, up = {up}");
}

#[test]
fn terrain_factors_come_from_the_floor() {
    let oracle = FlatFloor {
        height: 0.0,
        attribute: TerrainAttribute::new(TerrainType::OffRoad, 0),
    };
    let mut vehicle = spawn_kart(&oracle);
    run_idle(&mut vehicle, &oracle, 100);

    let stats = vehicle.params().stats;
    let off_road = TerrainType::OffRoad as usize;

    let grounded: Vec<_> = vehicle
        .wheels()
        .iter()
        .filter(|wheel| wheel.wheel().data().has_floor)
        .collect();
    assert!(!grounded.is_empty());

    for wheel in &grounded {
        let data = wheel.wheel().data();
        assert_eq!(data.speed_factor, stats.kcl_speed[off_road]);
        assert_eq!(data.rot_factor, stats.kcl_rot[off_road]);
    }

    assert_eq!(vehicle.wheel_speed_factor(), stats.kcl_speed[off_road]);
    assert!(
        (vehicle.wheel_rot_factor() - grounded.len() as f32 * stats.kcl_rot[off_road]).abs()
            < 1e-5
    );
}

#[test]
fn wheels_sink_into_soft_ground() {
    let oracle = FlatFloor {
        height: 0.0,
        attribute: TerrainAttribute::new(TerrainType::OffRoad, 0).with_intensity(2),
    };
    let mut vehicle = spawn_kart(&oracle);
    run_idle(&mut vehicle, &oracle, 200);

    assert_eq!(vehicle.chassis().target_sink_depth, 6.0);

    for wheel in vehicle.wheels() {
        if wheel.wheel().data().has_floor {
            let target = wheel.params().wheel_radius - 6.0;
            assert!(
                (wheel.wheel().effective_radius() - target).abs() < 0.5,
                "effective radius {} should approach {target}",
                wheel.wheel().effective_radius()
            );
        }
    }
}

/// A kart whose only hitbox sits well above its wheels, so a hard landing bottoms the wheels
/// out without the body ever touching the floor.
fn high_body_kart(oracle: &dyn CollisionOracle) -> VehiclePhysics {
    let mut params = VehicleParams::standard_kart();
    params.hitboxes = vec![HitboxParams::new(Vec3::new(0.0, 80.0, 0.0), 20.0)];

    let mut vehicle = spawn(params, oracle, Vec3::new(0.0, KART_SPAWN_HEIGHT, 0.0));
    vehicle.state_mut().ext_vel.y = -60.0;
    vehicle
}

#[test]
fn hard_landing_rests_on_bottomed_out_wheels() {
    let oracle = FlatFloor::road(0.0);
    let mut vehicle = high_body_kart(&oracle);
    let collision_vel = Vec3::new(0.0, GRAVITY, 0.0) * (DT * COLLISION_VEL_SCALE);

    let mut landed = false;
    for _ in 0..10 {
        vehicle.tick(&oracle, &VehicleStatus::default());
        assert_sane(&vehicle);

        let bottomed = vehicle
            .wheels()
            .iter()
            .filter(|wheel| wheel.wheel().bottomed_out())
            .count();
        if bottomed == 0 {
            continue;
        }

        let data = vehicle.collision_data();
        assert_eq!(data.contact_count, 0, "the body itself should stay clear of the floor");
        assert!(data.has_floor, "no floor installed under {bottomed} bottomed-out wheels");
        assert!(data.floor_normal.distance(Vec3::Y) < 1e-5);
        // averaged before the suspension pass adds each wheel's own speed
        assert!(
            data.velocity.distance(collision_vel) < 1e-4,
            "fallback velocity {} should be the wheel collision velocity {collision_vel}",
            data.velocity
        );
        landed = true;
        break;
    }

    assert!(landed, "wheels never bottomed out");
    assert!(vehicle.state().ext_vel.y > -60.0);
}

#[test]
fn skipped_wheel_pass_installs_no_fallback_floor() {
    let oracle = FlatFloor::road(0.0);
    let mut vehicle = high_body_kart(&oracle);

    for _ in 0..10 {
        if vehicle.wheels().iter().any(|wheel| wheel.wheel().bottomed_out()) {
            break;
        }
        vehicle.tick(&oracle, &VehicleStatus::default());
    }
    assert!(vehicle.wheels().iter().any(|wheel| wheel.wheel().bottomed_out()));

    let skip = VehicleStatus {
        skip_wheel_calc: true,
        ..VehicleStatus::default()
    };
    vehicle.tick(&oracle, &skip);

    // the wheels keep their stale bottomed-out flag but are not consulted
    assert!(vehicle.wheels().iter().any(|wheel| wheel.wheel().bottomed_out()));
    assert!(!vehicle.collision_data().has_floor);
}

#[test]
fn wheels_register_soft_walls() {
    let soft_wall = |distance| SoftWallFloor {
        floor: FlatFloor::road(0.0),
        soft_wall: SoftWallContact {
            distance,
            penetration_offset: Vec3::new(-3.0, 0.0, 0.0),
            normal: Vec3::NEG_X,
        },
    };

    let touching = soft_wall(1.0);
    let mut vehicle = spawn_kart(&touching);
    vehicle.tick(&touching, &VehicleStatus::default());

    for (idx, wheel) in vehicle.wheels().iter().enumerate() {
        let data = wheel.wheel().data();
        assert!(data.has_floor, "wheel {idx} should touch the floor");
        assert!(data.has_soft_wall, "wheel {idx} missed the soft wall");
        assert_eq!(data.soft_wall_normal, Vec3::NEG_X);
        assert_eq!(data.penetration_offset.x, -3.0);
    }

    // a soft wall at zero depth is not a contact
    let grazing = soft_wall(0.0);
    let mut vehicle = spawn_kart(&grazing);
    vehicle.tick(&grazing, &VehicleStatus::default());

    for wheel in vehicle.wheels() {
        let data = wheel.wheel().data();
        assert!(data.has_floor);
        assert!(!data.has_soft_wall);
        assert_eq!(data.penetration_offset.x, 0.0);
    }
}

#[test]
fn wall_bounces_vehicle_back() {
    const WALL_X: f32 = 80.0;

    let oracle = FloorAndWall {
        floor: FlatFloor::road(-100_000.0),
        wall_x: WALL_X,
    };
    let mut vehicle = spawn(
        VehicleParams::standard_kart(),
        &oracle,
        Vec3::new(20.0, 500.0, 0.0),
    );
    vehicle.state_mut().ext_vel.x = 6.0;

    let mut hit_wall = false;
    for _ in 0..30 {
        vehicle.tick(&oracle, &VehicleStatus::default());
        assert_sane(&vehicle);

        hit_wall |= vehicle.collision_data().has_wall;
        assert!(
            vehicle.pos().x < WALL_X - 28.0,
            "body went through the wall at {}",
            vehicle.pos()
        );
    }

    assert!(hit_wall);
    assert!(
        vehicle.state().ext_vel.x < 0.0,
        "not bouncing back: {}",
        vehicle.state().ext_vel
    );
}

#[test]
fn decaying_stunt_rotation_fades() {
    let oracle = EmptyTrack;
    let mut vehicle = spawn(
        VehicleParams::standard_kart(),
        &oracle,
        Vec3::new(0.0, 10_000.0, 0.0),
    );
    vehicle.compose_decaying_stunt_rot(Quat::from_rotation_y(10f32.to_radians()));

    vehicle.tick(&oracle, &VehicleStatus::default());
    let state = vehicle.state();
    let angle = state.full_rot().angle_between(state.main_rot).to_degrees();
    assert!(angle > 5.0, "overlay not applied, angle {angle}");

    run_idle(&mut vehicle, &oracle, 100);
    let state = vehicle.state();
    let angle = state.full_rot().angle_between(state.main_rot).to_degrees();
    assert!(angle < 0.1, "overlay did not fade, angle {angle}");
}

#[test]
fn bike_stays_upright() {
    let oracle = FlatFloor::road(0.0);
    let mut vehicle = spawn(
        VehicleParams::standard_bike(),
        &oracle,
        Vec3::new(0.0, 25.0, 0.0),
    );

    for _ in 0..200 {
        vehicle.tick(&oracle, &VehicleStatus::default());
        assert_sane(&vehicle);
    }

    assert!(vehicle.is_grounded());
    assert!(vehicle.full_rot().rotate_vector(Vec3::Y).y > 0.9);
}

#[test]
fn random_inputs_are_deterministic() {
    let oracle = FlatFloor::road(0.0);
    let inputs = random_inputs(0x4B52_4B47, 400);

    let mut records = Vec::with_capacity(inputs.len());
    let mut vehicle = spawn_kart(&oracle);
    run(&mut vehicle, &oracle, &inputs, |vehicle| {
        assert_sane(vehicle);
        records.push(FrameRecord::from_vehicle(vehicle));
    });

    let mut comparison = TraceComparison::new();
    let mut frame = 0;
    let mut replay = spawn_kart(&oracle);
    run(&mut replay, &oracle, &inputs, |vehicle| {
        comparison.compare(frame, &records[frame as usize], &FrameRecord::from_vehicle(vehicle));
        frame += 1;
    });

    assert_eq!(comparison.frames(), inputs.len() as u32);
    assert!(
        comparison.is_synced(),
        "replay desynced at frame {:?}",
        comparison.first_desync()
    );
    assert_eq!(comparison.stat("pos").map(|stat| stat.max), Some(0.0));
}

#[test]
fn comparison_reports_first_desync() {
    let oracle = FlatFloor::road(0.0);
    let mut vehicle = spawn_kart(&oracle);
    run_idle(&mut vehicle, &oracle, 5);

    let expected = FrameRecord::from_vehicle(&vehicle);
    let mut actual = expected.clone();

    let mut comparison = TraceComparison::new();
    assert!(comparison.compare(0, &expected, &actual));
    assert!(comparison.compare(1, &expected, &actual));

    actual.pos.x += 0.5;
    actual.wheels.pop();
    assert!(!comparison.compare(2, &expected, &actual));
    assert!(!comparison.compare(3, &expected, &actual));

    assert_eq!(comparison.first_desync(), Some(2));
    assert_eq!(comparison.frames(), 4);

    let pos = comparison.stat("pos").unwrap();
    assert_eq!(pos.num_samples, 4);
    assert!((pos.max - 0.5).abs() < 1e-3);
    assert!((pos.mean() - 0.25).abs() < 1e-3);
    assert_eq!(comparison.stat("wheel_count").unwrap().num_samples, 2);
}

#[test]
fn frame_record_survives_serialization() {
    let oracle = FlatFloor::road(0.0);
    let mut vehicle = spawn_kart(&oracle);
    run(&mut vehicle, &oracle, &random_inputs(7, 50), |_| ());

    let record = FrameRecord::from_vehicle(&vehicle);
    assert_eq!(record.wheels.len(), 4);

    let mut bytes = Vec::new();
    record.write_to(&mut bytes).unwrap();
    let read = FrameRecord::read_from(&mut bytes.as_slice()).unwrap();

    assert_eq!(read, record);
}

#[test]
fn frame_record_rejects_wheel_overflow() {
    let mut bytes = Vec::new();
    FrameRecord::default().write_to(&mut bytes).unwrap();
    *bytes.last_mut().unwrap() = 5;

    let err = FrameRecord::read_from(&mut bytes.as_slice()).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn reference_file_round_trip() {
    let header = TraceHeader {
        frame_count: 3,
        version_major: 1,
        version_minor: 0,
    };
    let frames: Vec<_> = (0..3)
        .map(|i| ReferenceFrame {
            pos: Vec3::new(i as f32, 2.0 * i as f32, -1.5),
            full_rot: Quat::from_rotation_y(0.25 * i as f32),
        })
        .collect();

    let mut bytes = Vec::new();
    header.write_to(&mut bytes).unwrap();
    for frame in &frames {
        frame.write_to(&mut bytes).unwrap();
    }
    assert_eq!(bytes.len(), TraceHeader::SIZE as usize + frames.len() * 28);
    assert_eq!(&bytes[..4], b"KRKG");

    let (read_header, read_frames) = read_reference(&mut bytes.as_slice()).unwrap();
    assert_eq!(read_header, header);
    assert_eq!(read_frames, frames);
}

#[test]
fn reference_file_little_endian() {
    use byteorder::{LittleEndian, WriteBytesExt};

    let mut bytes = Vec::new();
    bytes.write_u32::<LittleEndian>(0x4B52_4B47).unwrap();
    bytes.write_u16::<LittleEndian>(0xFEFF).unwrap();
    bytes.write_u16::<LittleEndian>(1).unwrap();
    bytes.write_u16::<LittleEndian>(2).unwrap();
    bytes.write_u16::<LittleEndian>(3).unwrap();
    bytes.write_u32::<LittleEndian>(16).unwrap();
    for value in [1.0f32, 2.0, 3.0, 0.0, 0.0, 0.0, 1.0] {
        bytes.write_f32::<LittleEndian>(value).unwrap();
    }

    let (header, frames) = read_reference(&mut bytes.as_slice()).unwrap();
    assert_eq!(header.frame_count, 1);
    assert_eq!(header.version_major, 2);
    assert_eq!(header.version_minor, 3);
    assert_eq!(frames[0].pos, Vec3::new(1.0, 2.0, 3.0));
    assert_eq!(frames[0].full_rot, Quat::IDENTITY);
}

#[test]
fn reference_file_rejects_bad_magic() {
    let mut bytes = vec![0u8; TraceHeader::SIZE as usize];
    bytes[..4].copy_from_slice(b"RKGD");

    let err = read_reference(&mut bytes.as_slice()).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
}

#[test]
fn logger_installs_once() {
    // other tests never install a logger, so whichever call comes first wins
    let first = logging::try_init();
    let second = logging::try_init();
    assert!(first.is_ok());
    assert!(second.is_err());
}
