//! Terrain type bits and the per-triangle attribute word returned by the collision oracle.
//!
//! The low 5 bits of an attribute select one of 32 base types; a query mask is a bitset over those
//! types.

/// Bitset over the 32 terrain base types.
pub type TerrainMask = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum TerrainType {
    Road = 0,
    SlipperyRoad = 1,
    WeakOffRoad = 2,
    OffRoad = 3,
    HeavyOffRoad = 4,
    SlipperyRoad2 = 5,
    BoostPad = 6,
    BoostRamp = 7,
    JumpPad = 8,
    ItemRoad = 9,
    SolidOob = 0xa,
    MovingWater = 0xb,
    Wall = 0xc,
    InvisibleWall = 0xd,
    ItemWall = 0xe,
    Wall2 = 0xf,
    FallBoundary = 0x10,
    CannonTrigger = 0x11,
    ForceRecalculateRoute = 0x12,
    HalfPipeRamp = 0x13,
    PlayerWall = 0x14,
    MovingRoad = 0x15,
    StickyRoad = 0x16,
    Road2 = 0x17,
    SoundTrigger = 0x18,
    WeakWall = 0x19,
    EffectTrigger = 0x1a,
    ItemStateModifier = 0x1b,
    HalfPipeInvisibleWall = 0x1c,
    RotatingRoad = 0x1d,
    SpecialWall = 0x1e,
    InvisibleWall2 = 0x1f,
}

impl TerrainType {
    #[must_use]
    pub const fn bit(self) -> TerrainMask {
        1 << self as u32
    }
}

const fn bits(types: &[TerrainType]) -> TerrainMask {
    let mut mask = 0;
    let mut i = 0;
    while i < types.len() {
        mask |= types[i].bit();
        i += 1;
    }
    mask
}

pub const ANY: TerrainMask = u32::MAX;
pub const NONE: TerrainMask = 0;

/// Anything a vehicle can drive on.
pub const FLOOR: TerrainMask = bits(&[
    TerrainType::Road,
    TerrainType::SlipperyRoad,
    TerrainType::WeakOffRoad,
    TerrainType::OffRoad,
    TerrainType::HeavyOffRoad,
    TerrainType::SlipperyRoad2,
    TerrainType::BoostPad,
    TerrainType::BoostRamp,
    TerrainType::JumpPad,
    TerrainType::ItemRoad,
    TerrainType::SolidOob,
    TerrainType::MovingWater,
    TerrainType::HalfPipeRamp,
    TerrainType::MovingRoad,
    TerrainType::StickyRoad,
    TerrainType::Road2,
    TerrainType::RotatingRoad,
]);

pub const WALL: TerrainMask = bits(&[
    TerrainType::Wall,
    TerrainType::InvisibleWall,
    TerrainType::ItemWall,
    TerrainType::Wall2,
    TerrainType::PlayerWall,
    TerrainType::HalfPipeInvisibleWall,
    TerrainType::SpecialWall,
    TerrainType::InvisibleWall2,
]);

pub const DRIVER_WALL: TerrainMask =
    WALL & !TerrainType::ItemWall.bit() & !TerrainType::HalfPipeInvisibleWall.bit();
pub const DRIVER_WALL_NO_INVISIBLE_WALL: TerrainMask =
    DRIVER_WALL & !TerrainType::InvisibleWall.bit();
pub const DRIVER_WALL_NO_INVISIBLE_WALL2: TerrainMask =
    DRIVER_WALL & !TerrainType::InvisibleWall2.bit();

pub const ANY_INVISIBLE_WALL: TerrainMask = bits(&[
    TerrainType::InvisibleWall,
    TerrainType::HalfPipeInvisibleWall,
    TerrainType::InvisibleWall2,
]);

/// Walls that are always rendered.
pub const VISIBLE_WALL: TerrainMask = 0x4010_D000;

pub const VEHICLE_INTERACTABLE: TerrainMask = !TerrainType::ItemRoad.bit()
    & !TerrainType::ItemWall.bit()
    & !TerrainType::HalfPipeInvisibleWall.bit();

pub const VEHICLE_COLLIDEABLE: TerrainMask = VEHICLE_INTERACTABLE
    & !TerrainType::SoundTrigger.bit()
    & !TerrainType::EffectTrigger.bit()
    & !TerrainType::FallBoundary.bit()
    & !TerrainType::CannonTrigger.bit()
    & !TerrainType::ForceRecalculateRoute.bit();

pub const DRIVER_SOLID_SURFACE: TerrainMask =
    VEHICLE_COLLIDEABLE | TerrainType::CannonTrigger.bit();

/// Query mask for hitboxes flagged as walls-only.
pub const WALLS_ONLY: TerrainMask = 0x4A10_9000;

/// Attribute word attached to a collision triangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TerrainAttribute(pub u16);

impl TerrainAttribute {
    const TRICKABLE: u16 = 1 << 13;
    const REJECT_ROAD: u16 = 1 << 14;
    const SOFT: u16 = 0x8000;

    #[must_use]
    pub const fn new(base_type: TerrainType, variant: u16) -> Self {
        Self(base_type as u16 | ((variant & 7) << 5))
    }

    #[must_use]
    pub const fn with_intensity(self, intensity: u16) -> Self {
        Self((self.0 & !(3 << 11)) | ((intensity & 3) << 11))
    }

    #[must_use]
    pub const fn with_flags(self, trickable: bool, reject_road: bool, soft: bool) -> Self {
        let mut word = self.0;
        if trickable {
            word |= Self::TRICKABLE;
        }
        if reject_road {
            word |= Self::REJECT_ROAD;
        }
        if soft {
            word |= Self::SOFT;
        }
        Self(word)
    }

    /// Index into the 32 per-type stat tables.
    #[must_use]
    pub const fn base_type(self) -> usize {
        (self.0 & 0x1f) as usize
    }

    #[must_use]
    pub const fn type_mask(self) -> TerrainMask {
        1 << (self.0 & 0x1f)
    }

    #[must_use]
    pub const fn variant(self) -> u32 {
        ((self.0 >> 5) & 7) as u32
    }

    /// Wheel sink depth level in `0..=3`.
    #[must_use]
    pub const fn intensity(self) -> i32 {
        ((self.0 >> 11) & 3) as i32
    }

    #[must_use]
    pub const fn is_trickable(self) -> bool {
        self.0 & Self::TRICKABLE != 0
    }

    #[must_use]
    pub const fn is_reject_road(self) -> bool {
        self.0 & Self::REJECT_ROAD != 0
    }

    #[must_use]
    pub const fn is_soft(self) -> bool {
        self.0 & Self::SOFT != 0
    }
}
