//! Debris decomposition: tile a destroyed building into a grid of
//! fragments with jittered positions and a small initial kick.

use crate::types::{Building, DebrisConfig, DebrisFragment, Vec3};
use log::warn;
use rand::Rng;

/// Number of fragments along one axis. Never zero; saturates at `usize::MAX`.
pub fn pieces_along(extent: f32, fragment_edge: f32) -> usize {
    ((extent / fragment_edge).floor() as usize).max(1)
}

/// Fragment grid dimensions `(nx, ny, nz)` for a building, holding
/// `nx * ny * nz <= max_fragments`.
///
/// Within the cap every axis gets `pieces_along`. Past it, all axes are
/// scaled down by the same factor, then the largest axis is cut back until
/// the product fits. Every axis keeps at least one piece.
pub fn fragment_grid(
    size: Vec3,
    fragment_edge: f32,
    max_fragments: usize,
) -> (usize, usize, usize) {
    let cap = max_fragments.max(1);
    let mut n = [size.x, size.y, size.z].map(|e| pieces_along(e, fragment_edge).min(cap));

    let total: f64 = n.iter().map(|&k| k as f64).product();
    if total > cap as f64 {
        // Rounding slack; the loop below still enforces the cap.
        let scale = (cap as f64 / total).cbrt();
        n = n.map(|k| ((k as f64 * scale + 1e-6).floor() as usize).max(1));
    }

    while n
        .iter()
        .try_fold(1usize, |acc, &k| acc.checked_mul(k))
        .map_or(true, |total| total > cap)
    {
        let largest = (0..3).max_by_key(|&i| n[i]).unwrap_or(0);
        let others = (0..3)
            .filter(|&i| i != largest)
            .fold(1usize, |acc, i| acc.saturating_mul(n[i]));
        n[largest] = (cap / others).max(1);
    }

    (n[0], n[1], n[2])
}

pub fn fragment_id(building_id: &str, ix: usize, iy: usize, iz: usize) -> String {
    format!("{}-debris-{}-{}-{}", building_id, ix, iy, iz)
}

/// Uniform in `[-half_range, half_range)`.
fn symmetric(rng: &mut impl Rng, half_range: f32) -> f32 {
    (rng.gen::<f32>() - 0.5) * 2.0 * half_range
}

/// Decompose `building` into fragments that exactly tile its volume.
///
/// Fragments are emitted in `ix, iy, iz` order. Only positions and
/// kinematics consume randomness; sizes and ids are deterministic.
pub fn decompose(
    building: &Building,
    config: &DebrisConfig,
    rng: &mut impl Rng,
) -> Vec<DebrisFragment> {
    let size = building.size;
    let (nx, ny, nz) = fragment_grid(size, config.fragment_edge, config.max_fragments);
    if (nx, ny, nz) != (
        pieces_along(size.x, config.fragment_edge),
        pieces_along(size.y, config.fragment_edge),
        pieces_along(size.z, config.fragment_edge),
    ) {
        warn!(
            "Building {} exceeds {} fragments, cut into {}x{}x{}",
            building.id, config.max_fragments, nx, ny, nz
        );
    }
    let piece = Vec3::new(size.x / nx as f32, size.y / ny as f32, size.z / nz as f32);

    let mut fragments = Vec::with_capacity(nx * ny * nz);
    for ix in 0..nx {
        for iy in 0..ny {
            for iz in 0..nz {
                let offset = Vec3::new(
                    -size.x / 2.0 + piece.x / 2.0 + ix as f32 * piece.x,
                    -size.y / 2.0 + piece.y / 2.0 + iy as f32 * piece.y,
                    -size.z / 2.0 + piece.z / 2.0 + iz as f32 * piece.z,
                );
                let jitter = Vec3::new(
                    symmetric(rng, piece.x * config.jitter_fraction / 2.0),
                    symmetric(rng, piece.y * config.jitter_fraction / 2.0),
                    symmetric(rng, piece.z * config.jitter_fraction / 2.0),
                );
                let velocity = Vec3::new(
                    symmetric(rng, config.horizontal_kick),
                    0.0,
                    symmetric(rng, config.horizontal_kick),
                );
                let angular_velocity = Vec3::new(
                    symmetric(rng, config.angular_kick),
                    symmetric(rng, config.angular_kick),
                    symmetric(rng, config.angular_kick),
                );

                fragments.push(DebrisFragment {
                    id: fragment_id(&building.id, ix, iy, iz),
                    building_id: building.id.clone(),
                    position: Vec3::new(
                        building.position.x + offset.x + jitter.x,
                        building.position.y + offset.y + jitter.y,
                        building.position.z + offset.z + jitter.z,
                    ),
                    size: piece,
                    velocity,
                    angular_velocity,
                    rotation: Vec3::zero(),
                    mass: 1.0,
                    settled: false,
                });
            }
        }
    }
    fragments
}
