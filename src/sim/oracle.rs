use arrayvec::ArrayVec;
use glam::Vec3;
use log::warn;

use super::terrain::{TerrainAttribute, TerrainMask};

/// Maximum number of triangles reported for a single sweep.
pub const MAX_CONTACT_ENTRIES: usize = 8;

/// One triangle touched by a sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactEntry {
    /// Penetration depth of the sphere into the triangle. Larger is closer.
    pub distance: f32,
    pub attribute: TerrainAttribute,
}

/// A soft wall touched by the sweep. Soft walls never bounce the vehicle, they only push it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoftWallContact {
    pub distance: f32,
    pub penetration_offset: Vec3,
    pub normal: Vec3,
}

/// Contact geometry returned by [`CollisionOracle::query_sphere_sweep`].
///
/// Holds at most [`MAX_CONTACT_ENTRIES`] entries. Further entries only set their type bit.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContactInfo {
    pub floor_normal: Vec3,
    pub wall_normal: Vec3,
    /// Offset that pushes the sphere out of everything it touched.
    pub penetration_offset: Vec3,
    pub floor_distance: f32,
    pub wall_distance: f32,
    /// Union of the type bits of every entry.
    pub type_mask: TerrainMask,
    pub entries: ArrayVec<ContactEntry, MAX_CONTACT_ENTRIES>,
    pub soft_wall: Option<SoftWallContact>,
    /// Surface velocity of a moving road under the sphere.
    pub road_velocity: Option<Vec3>,
}

impl ContactInfo {
    /// Records a touched triangle. Entries past capacity are dropped but still contribute their type bit.
    pub fn push_entry(&mut self, entry: ContactEntry) {
        self.type_mask |= entry.attribute.type_mask();
        if self.entries.try_push(entry).is_err() {
            warn!(
                "dropped contact entry {:?} at distance {}: sweep already holds {MAX_CONTACT_ENTRIES}",
                entry.attribute.base_type(),
                entry.distance
            );
        }
    }

    #[must_use]
    pub const fn has_any(&self, mask: TerrainMask) -> bool {
        self.type_mask & mask != 0
    }
}

/// The track collision engine, seen from the vehicle core as a pure query service.
pub trait CollisionOracle {
    /// Sweeps a sphere of `radius` from `from` to `to` against every triangle whose type is in `mask`.
    fn query_sphere_sweep(
        &self,
        radius: f32,
        from: Vec3,
        to: Vec3,
        mask: TerrainMask,
    ) -> Option<ContactInfo>;

    /// The deepest entry of `info` whose type is in `mask`.
    fn closest_entry(&self, info: &ContactInfo, mask: TerrainMask) -> Option<ContactEntry> {
        let mut best = None;
        let mut best_distance = -f32::MIN_POSITIVE;

        for entry in &info.entries {
            if entry.attribute.type_mask() & mask != 0 && entry.distance > best_distance {
                best_distance = entry.distance;
                best = Some(*entry);
            }
        }

        best
    }

    /// Attribute word of the deepest entry of `info` whose type is in `mask`.
    fn closest_attribute(&self, info: &ContactInfo, mask: TerrainMask) -> Option<TerrainAttribute> {
        self.closest_entry(info, mask).map(|entry| entry.attribute)
    }
}
