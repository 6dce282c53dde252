//! Damage zone unit tests

#[cfg(test)]
mod tests {
    use quake_debris::types::{Building, Vec3};
    use quake_debris::zone::{compute_damage_zone, compute_damage_zones, damage_zone_extent};

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    // -----------------------------------------------------------------------
    // Sizing
    // -----------------------------------------------------------------------

    #[test]
    fn cube_with_fifty_square_meters() {
        // 50 m² / 2² = 12.5 units², base 4 units², s = sqrt(3.125)
        let e = damage_zone_extent(2.0, 2.0, 50.0, 2.0);
        assert!(approx(e.width, 3.536), "width {}", e.width);
        assert!(approx(e.depth, 3.536), "depth {}", e.depth);
    }

    #[test]
    fn zero_area_gives_zero_zone() {
        let e = damage_zone_extent(3.0, 1.5, 0.0, 2.0);
        assert_eq!(e.width, 0.0);
        assert_eq!(e.depth, 0.0);
    }

    #[test]
    fn aspect_ratio_is_preserved() {
        let e = damage_zone_extent(4.0, 1.0, 100.0, 2.0);
        assert!(approx(e.width / e.depth, 4.0));
        assert!(approx(e.area() * 4.0, 100.0));
    }

    #[test]
    fn zone_can_shrink_below_footprint() {
        let e = damage_zone_extent(10.0, 10.0, 4.0, 1.0);
        assert!(approx(e.width, 2.0));
        assert!(approx(e.depth, 2.0));
    }

    #[test]
    fn degenerate_footprint_is_left_unscaled() {
        let e = damage_zone_extent(0.0, 2.0, 40.0, 2.0);
        assert_eq!(e.width, 0.0);
        assert_eq!(e.depth, 2.0);
    }

    // -----------------------------------------------------------------------
    // Zones from buildings
    // -----------------------------------------------------------------------

    #[test]
    fn zone_is_centered_on_ground_position() {
        let b = Building::new("a", Vec3::new(3.0, 0.5, -7.0), Vec3::new(1.0, 1.0, 1.0), 20.0);
        let zone = compute_damage_zone(&b, 2.0);
        assert_eq!(zone.building_id, "a");
        assert_eq!(zone.center_x, 3.0);
        assert_eq!(zone.center_z, -7.0);
        assert!(approx(zone.area(), 5.0));
    }

    #[test]
    fn one_zone_per_building_in_order() {
        let buildings = vec![
            Building::new("1", Vec3::zero(), Vec3::new(1.0, 1.0, 1.0), 20.0),
            Building::new("2", Vec3::new(3.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0), 0.0),
        ];
        let zones = compute_damage_zones(&buildings, 2.0);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].building_id, "1");
        assert_eq!(zones[1].building_id, "2");
        assert_eq!(zones[1].area(), 0.0);
    }

    // -----------------------------------------------------------------------
    // Rectangle queries
    // -----------------------------------------------------------------------

    #[test]
    fn contains_is_inclusive_on_edges() {
        let b = Building::new("a", Vec3::zero(), Vec3::new(2.0, 2.0, 2.0), 64.0);
        // 64 / 4 = 16 units² → 4×4 zone, bounds [-2, 2]
        let zone = compute_damage_zone(&b, 2.0);
        assert!(zone.contains(2.0, 2.0));
        assert!(zone.contains(-2.0, 0.0));
        assert!(!zone.contains(2.001, 0.0));
    }

    #[test]
    fn clamp_is_per_axis() {
        let b = Building::new("a", Vec3::zero(), Vec3::new(2.0, 2.0, 2.0), 64.0);
        let zone = compute_damage_zone(&b, 2.0);
        assert_eq!(zone.clamp(10.0, 1.0), (2.0, 1.0));
        assert_eq!(zone.clamp(-5.0, -9.0), (-2.0, -2.0));
        assert_eq!(zone.clamp(0.5, 0.5), (0.5, 0.5));
    }

    #[test]
    fn zero_zone_contains_only_its_center() {
        let b = Building::new("a", Vec3::new(1.0, 0.0, 1.0), Vec3::new(1.0, 1.0, 1.0), 0.0);
        let zone = compute_damage_zone(&b, 2.0);
        assert!(zone.contains(1.0, 1.0));
        assert!(!zone.contains(1.01, 1.0));
        assert_eq!(zone.clamp(5.0, -5.0), (1.0, 1.0));
    }
}
