use glam::Vec3;

/// Number of terrain base types with their own speed and handling entries.
pub const TERRAIN_TYPE_COUNT: usize = 32;

/// Selects the integrator's upright behavior and the expected wheel layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VehicleKind {
    #[default]
    Kart,
    Bike,
}

impl VehicleKind {
    #[must_use]
    pub const fn wheel_count(self) -> usize {
        match self {
            Self::Kart => 4,
            Self::Bike => 2,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WheelParams {
    pub spring_stiffness: f32,
    pub damping_factor: f32,
    /// Full extension of the suspension, before vehicle scaling.
    pub max_travel: f32,
    pub wheel_radius: f32,
    /// Radius of the sphere swept against the track.
    pub sphere_radius: f32,
    /// Topmost suspension attachment point, in body space.
    pub rel_position: Vec3,
    /// Lean of the suspension axis around body x, in degrees.
    pub x_rot_degrees: f32,
    /// Mirror `rel_position` across the body's x axis.
    pub reflected: bool,
}

impl WheelParams {
    #[must_use]
    pub const fn reflect(mut self) -> Self {
        self.reflected = !self.reflected;
        self
    }

    fn validate(&self, idx: usize) {
        assert!(
            self.max_travel.is_finite() && self.max_travel >= 0.0,
            "VehicleParams::validate(): wheel {idx} has invalid max_travel {}",
            self.max_travel
        );
        assert!(
            self.wheel_radius.is_finite() && self.wheel_radius >= 0.0,
            "VehicleParams::validate(): wheel {idx} has invalid wheel_radius {}",
            self.wheel_radius
        );
        assert!(
            self.sphere_radius.is_finite() && self.sphere_radius >= 0.0,
            "VehicleParams::validate(): wheel {idx} has invalid sphere_radius {}",
            self.sphere_radius
        );
        assert!(
            self.spring_stiffness.is_finite() && self.spring_stiffness >= 0.0,
            "VehicleParams::validate(): wheel {idx} has invalid spring_stiffness {}",
            self.spring_stiffness
        );
    }
}

/// One sphere of the body's collision volume.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HitboxParams {
    pub rel_position: Vec3,
    pub radius: f32,
    /// Only collide against the narrow wall mask.
    pub walls_only: bool,
    pub enabled: bool,
}

impl HitboxParams {
    #[must_use]
    pub const fn new(rel_position: Vec3, radius: f32) -> Self {
        Self {
            rel_position,
            radius,
            walls_only: false,
            enabled: true,
        }
    }

    #[must_use]
    pub const fn walls_only(mut self) -> Self {
        self.walls_only = true;
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BodyParams {
    /// The two cuboids whose dimensions make up the diagonal inertia tensor.
    pub cuboids: [Vec3; 2],
    /// Scale applied to the torque-driven angular velocity when rotating the body.
    pub ang_vel0_factor: f32,
}

/// Per-vehicle handling stats consumed by the physics core.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleStats {
    /// Speed multiplier per terrain base type.
    pub kcl_speed: [f32; TERRAIN_TYPE_COUNT],
    /// Handling multiplier per terrain base type.
    pub kcl_rot: [f32; TERRAIN_TYPE_COUNT],
    /// Cap on the upward suspension force of a single wheel.
    pub max_normal_acceleration: f32,
    /// Lower bound of the suspension scale.
    pub wheel_distance: f32,
}

impl VehicleStats {
    const fn terrain_table(road: f32, off_road: f32, heavy: f32, slippery: f32) -> [f32; 32] {
        let mut table = [road; TERRAIN_TYPE_COUNT];
        table[1] = slippery;
        table[2] = (road + off_road) * 0.5;
        table[3] = off_road;
        table[4] = heavy;
        table[5] = slippery;
        table
    }

    pub const STANDARD: Self = Self {
        kcl_speed: Self::terrain_table(1.0, 0.7, 0.45, 0.95),
        kcl_rot: Self::terrain_table(1.0, 0.75, 0.5, 0.85),
        max_normal_acceleration: 5.0,
        wheel_distance: 1.0,
    };
}

impl Default for VehicleStats {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// The immutable parameter table of one vehicle, already decoded into owned values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VehicleParams {
    pub kind: VehicleKind,
    pub wheels: Vec<WheelParams>,
    /// Hitbox descriptors. Disabled entries are skipped.
    pub hitboxes: Vec<HitboxParams>,
    pub body: BodyParams,
    pub stats: VehicleStats,
}

const KART_FRONT_WHEEL: WheelParams = WheelParams {
    spring_stiffness: 0.05,
    damping_factor: 0.15,
    max_travel: 32.0,
    wheel_radius: 14.0,
    sphere_radius: 14.0,
    rel_position: Vec3::new(32.0, 24.0, 42.0),
    x_rot_degrees: 0.0,
    reflected: false,
};

const KART_REAR_WHEEL: WheelParams = WheelParams {
    spring_stiffness: 0.05,
    damping_factor: 0.15,
    max_travel: 32.0,
    wheel_radius: 16.0,
    sphere_radius: 16.0,
    rel_position: Vec3::new(34.0, 24.0, -36.0),
    x_rot_degrees: 0.0,
    reflected: false,
};

const BIKE_FRONT_WHEEL: WheelParams = WheelParams {
    spring_stiffness: 0.1,
    damping_factor: 0.3,
    max_travel: 30.0,
    wheel_radius: 15.0,
    sphere_radius: 15.0,
    rel_position: Vec3::new(0.0, 26.0, 46.0),
    x_rot_degrees: 15.0,
    reflected: false,
};

const BIKE_REAR_WHEEL: WheelParams = WheelParams {
    spring_stiffness: 0.1,
    damping_factor: 0.3,
    max_travel: 30.0,
    wheel_radius: 15.0,
    sphere_radius: 15.0,
    rel_position: Vec3::new(0.0, 26.0, -40.0),
    x_rot_degrees: 0.0,
    reflected: false,
};

impl VehicleParams {
    pub const STANDARD_KART_WHEELS: [WheelParams; 4] = [
        KART_FRONT_WHEEL,
        KART_FRONT_WHEEL.reflect(),
        KART_REAR_WHEEL,
        KART_REAR_WHEEL.reflect(),
    ];

    pub const STANDARD_KART_HITBOXES: [HitboxParams; 5] = [
        HitboxParams::new(Vec3::new(0.0, 30.0, 30.0), 28.0),
        HitboxParams::new(Vec3::new(0.0, 30.0, -25.0), 28.0),
        HitboxParams::new(Vec3::new(0.0, 48.0, -5.0), 20.0),
        HitboxParams::new(Vec3::new(28.0, 30.0, 0.0), 18.0).walls_only(),
        HitboxParams::new(Vec3::new(-28.0, 30.0, 0.0), 18.0).walls_only(),
    ];

    pub const STANDARD_KART_BODY: BodyParams = BodyParams {
        cuboids: [Vec3::new(70.0, 40.0, 110.0), Vec3::new(0.0, 0.0, 0.0)],
        ang_vel0_factor: 1.0,
    };

    pub const STANDARD_BIKE_WHEELS: [WheelParams; 2] = [BIKE_FRONT_WHEEL, BIKE_REAR_WHEEL];

    pub const STANDARD_BIKE_HITBOXES: [HitboxParams; 4] = [
        HitboxParams::new(Vec3::new(0.0, 32.0, 32.0), 24.0),
        HitboxParams::new(Vec3::new(0.0, 32.0, -28.0), 24.0),
        HitboxParams::new(Vec3::new(0.0, 52.0, 0.0), 18.0),
        HitboxParams::new(Vec3::new(0.0, 32.0, 0.0), 22.0).walls_only(),
    ];

    pub const STANDARD_BIKE_BODY: BodyParams = BodyParams {
        cuboids: [Vec3::new(40.0, 50.0, 120.0), Vec3::new(0.0, 0.0, 0.0)],
        ang_vel0_factor: 1.0,
    };

    #[must_use]
    pub fn standard_kart() -> Self {
        Self {
            kind: VehicleKind::Kart,
            wheels: Self::STANDARD_KART_WHEELS.to_vec(),
            hitboxes: Self::STANDARD_KART_HITBOXES.to_vec(),
            body: Self::STANDARD_KART_BODY,
            stats: VehicleStats::STANDARD,
        }
    }

    #[must_use]
    pub fn standard_bike() -> Self {
        Self {
            kind: VehicleKind::Bike,
            wheels: Self::STANDARD_BIKE_WHEELS.to_vec(),
            hitboxes: Self::STANDARD_BIKE_HITBOXES.to_vec(),
            body: Self::STANDARD_BIKE_BODY,
            stats: VehicleStats::STANDARD,
        }
    }

    /// Panics on any entry the physics core cannot run with.
    pub fn validate(&self) {
        assert!(
            !self.wheels.is_empty() && self.wheels.len() <= 4,
            "VehicleParams::validate(): expected 1 to 4 wheels, got {}",
            self.wheels.len()
        );
        assert_eq!(
            self.wheels.len(),
            self.kind.wheel_count(),
            "VehicleParams::validate(): {:?} needs {} wheels",
            self.kind,
            self.kind.wheel_count()
        );

        for (idx, wheel) in self.wheels.iter().enumerate() {
            wheel.validate(idx);
        }
    }

    #[must_use]
    pub fn wheel(&self, idx: usize) -> &WheelParams {
        self.wheels.get(idx).unwrap_or_else(|| {
            panic!(
                "VehicleParams::wheel(): no wheel at index {idx} ({} configured)",
                self.wheels.len()
            )
        })
    }
}
