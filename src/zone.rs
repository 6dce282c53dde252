//! Damage zones: sizing from a real-world damage area, plus the rectangle
//! queries the fragment constraint and rasterizer are built on.

use crate::types::{Building, DamageZone, Extent2};

/// Scale a `width × depth` footprint so its area matches `area_sq_m`.
///
/// The aspect ratio is preserved. A zero-area footprint is left unscaled.
pub fn damage_zone_extent(width: f32, depth: f32, area_sq_m: f32, meters_per_unit: f32) -> Extent2 {
    let target_area_units = area_sq_m / (meters_per_unit * meters_per_unit);
    let base_area_units = width * depth;
    let scale = if base_area_units > 0.0 {
        (target_area_units / base_area_units).sqrt()
    } else {
        1.0
    };
    Extent2::new(width * scale, depth * scale)
}

/// Zone for a single building, centered on its ground-plane position.
pub fn compute_damage_zone(building: &Building, meters_per_unit: f32) -> DamageZone {
    DamageZone {
        building_id: building.id.clone(),
        center_x: building.position.x,
        center_z: building.position.z,
        extent: damage_zone_extent(
            building.size.x,
            building.size.z,
            building.damage_area_sq_m,
            meters_per_unit,
        ),
    }
}

/// One zone per building, in building order.
pub fn compute_damage_zones(buildings: &[Building], meters_per_unit: f32) -> Vec<DamageZone> {
    buildings
        .iter()
        .map(|b| compute_damage_zone(b, meters_per_unit))
        .collect()
}

/// `(min_x, max_x, min_z, max_z)` of a zone rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_z: f32,
    pub max_z: f32,
}

impl DamageZone {
    pub fn bounds(&self) -> ZoneBounds {
        let hw = self.extent.width / 2.0;
        let hd = self.extent.depth / 2.0;
        ZoneBounds {
            min_x: self.center_x - hw,
            max_x: self.center_x + hw,
            min_z: self.center_z - hd,
            max_z: self.center_z + hd,
        }
    }

    /// Inclusive on every edge.
    pub fn contains(&self, x: f32, z: f32) -> bool {
        let b = self.bounds();
        x >= b.min_x && x <= b.max_x && z >= b.min_z && z <= b.max_z
    }

    /// Clamp each axis independently into the rectangle.
    pub fn clamp(&self, x: f32, z: f32) -> (f32, f32) {
        let b = self.bounds();
        (x.max(b.min_x).min(b.max_x), z.max(b.min_z).min(b.max_z))
    }

    pub fn distance_sq_to_center(&self, x: f32, z: f32) -> f32 {
        let dx = x - self.center_x;
        let dz = z - self.center_z;
        dx * dx + dz * dz
    }

    pub fn area(&self) -> f32 {
        self.extent.area()
    }
}
