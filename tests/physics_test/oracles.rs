use kartsim::{
    glam::Vec3,
    sim::{
        CollisionOracle, ContactEntry, ContactInfo, SoftWallContact,
        terrain::{TerrainAttribute, TerrainMask, TerrainType},
    },
};

/// A track with nothing in it.
pub struct EmptyTrack;

impl CollisionOracle for EmptyTrack {
    fn query_sphere_sweep(&self, _: f32, _: Vec3, _: Vec3, _: TerrainMask) -> Option<ContactInfo> {
        None
    }
}

/// An infinite horizontal floor at `height`.
pub struct FlatFloor {
    pub height: f32,
    pub attribute: TerrainAttribute,
}

impl FlatFloor {
    pub const fn road(height: f32) -> Self {
        Self {
            height,
            attribute: TerrainAttribute::new(TerrainType::Road, 0),
        }
    }

    fn touch(&self, info: &mut ContactInfo, radius: f32, to: Vec3, mask: TerrainMask) -> bool {
        if self.attribute.type_mask() & mask == 0 {
            return false;
        }

        let depth = self.height + radius - to.y;
        if depth <= 0.0 {
            return false;
        }

        info.floor_normal = Vec3::Y;
        info.floor_distance = depth;
        info.penetration_offset.y += depth;
        info.push_entry(ContactEntry {
            distance: depth,
            attribute: self.attribute,
        });

        true
    }
}

impl CollisionOracle for FlatFloor {
    fn query_sphere_sweep(
        &self,
        radius: f32,
        _from: Vec3,
        to: Vec3,
        mask: TerrainMask,
    ) -> Option<ContactInfo> {
        let mut info = ContactInfo::default();
        self.touch(&mut info, radius, to, mask).then_some(info)
    }
}

/// A [`FlatFloor`] closed off by a wall facing -x at `wall_x`.
pub struct FloorAndWall {
    pub floor: FlatFloor,
    pub wall_x: f32,
}

impl CollisionOracle for FloorAndWall {
    fn query_sphere_sweep(
        &self,
        radius: f32,
        _from: Vec3,
        to: Vec3,
        mask: TerrainMask,
    ) -> Option<ContactInfo> {
        let mut info = ContactInfo::default();
        let mut hit = self.floor.touch(&mut info, radius, to, mask);

        let wall = TerrainAttribute::new(TerrainType::Wall, 0);
        let depth = to.x + radius - self.wall_x;
        if wall.type_mask() & mask != 0 && depth > 0.0 {
            info.wall_normal = Vec3::NEG_X;
            info.wall_distance = depth;
            info.penetration_offset.x -= depth;
            info.push_entry(ContactEntry {
                distance: depth,
                attribute: wall,
            });
            hit = true;
        }

        hit.then_some(info)
    }
}

/// A [`FlatFloor`] whose wheel contacts also graze a soft wall.
pub struct SoftWallFloor {
    pub floor: FlatFloor,
    pub soft_wall: SoftWallContact,
}

impl CollisionOracle for SoftWallFloor {
    fn query_sphere_sweep(
        &self,
        radius: f32,
        from: Vec3,
        to: Vec3,
        mask: TerrainMask,
    ) -> Option<ContactInfo> {
        let mut info = self.floor.query_sphere_sweep(radius, from, to, mask)?;
        info.soft_wall = Some(self.soft_wall);
        Some(info)
    }
}
