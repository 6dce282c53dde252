//! Core simulation types shared across all modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::QuakeError;

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    pub fn volume(&self) -> f32 {
        self.x * self.y * self.z
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Width (x) × depth (z) on the ground plane.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Extent2 {
    pub width: f32,
    pub depth: f32,
}

impl Extent2 {
    pub fn new(width: f32, depth: f32) -> Self {
        Self { width, depth }
    }

    pub fn area(&self) -> f32 {
        self.width * self.depth
    }
}

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Building {
    pub id: String,
    /// Center of the building volume in world units.
    pub position: Vec3,
    /// Width (x) × height (y) × depth (z); every component is positive.
    pub size: Vec3,
    /// Real-world area expected to be covered in debris, in m².
    pub damage_area_sq_m: f32,
    pub destroyed: bool,
    pub shaking: bool,
    /// Survey attributes and prediction output carried through import/export.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Building {
    pub fn new(id: impl Into<String>, position: Vec3, size: Vec3, damage_area_sq_m: f32) -> Self {
        Self {
            id: id.into(),
            position,
            size,
            damage_area_sq_m,
            destroyed: false,
            shaking: false,
            metadata: HashMap::new(),
        }
    }

    /// Ground-plane distance from `(x, z)` to the building position.
    pub fn ground_distance(&self, x: f32, z: f32) -> f32 {
        let dx = self.position.x - x;
        let dz = self.position.z - z;
        (dx * dx + dz * dz).sqrt()
    }

    /// Horizontal render offset for a shaking building at `t` seconds.
    ///
    /// The phase is seeded from the id so neighbours never sway in lockstep.
    pub fn shake_offset(&self, t: f32, strength: f32) -> Vec3 {
        if !self.shaking || self.destroyed {
            return Vec3::zero();
        }
        let seed = (id_hash(&self.id) % 1000) as f32;
        let ox = (t * 12.0 + seed).sin() * strength * (0.6 + 0.4 * (t * 3.0 + seed).sin());
        let oz = (t * 10.0 + seed).cos() * strength * (0.6 + 0.4 * (t * 2.0 + seed).cos());
        Vec3::new(ox, 0.0, oz)
    }
}

fn id_hash(id: &str) -> u32 {
    let mut h: i32 = 0;
    for c in id.chars() {
        h = h.wrapping_shl(5).wrapping_sub(h).wrapping_add(c as i32);
    }
    h.unsigned_abs()
}

// ---------------------------------------------------------------------------
// Zones + fragments
// ---------------------------------------------------------------------------

/// Axis-aligned ground rectangle expected to be covered in debris.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DamageZone {
    pub building_id: String,
    /// Ground-plane center `(x, z)`.
    pub center_x: f32,
    pub center_z: f32,
    pub extent: Extent2,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebrisFragment {
    /// `{building_id}-debris-{ix}-{iy}-{iz}`, unique within a collapse event.
    pub id: String,
    /// Owning building. Never inferred from the id.
    pub building_id: String,
    pub position: Vec3,
    pub size: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    /// Euler angles accumulated by the host.
    pub rotation: Vec3,
    /// 1 while simulated, 0 once frozen (inert to gravity and forces).
    pub mass: f32,
    pub settled: bool,
}

impl DebrisFragment {
    pub fn is_live(&self) -> bool {
        !self.settled
    }

    /// Irreversibly stop this fragment where it is.
    pub fn freeze(&mut self) {
        self.velocity = Vec3::zero();
        self.angular_velocity = Vec3::zero();
        self.mass = 0.0;
        self.settled = true;
    }
}

// ---------------------------------------------------------------------------
// Collapse phase + stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollapsePhase {
    Idle,
    Collapsing,
    Settled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub phase: CollapsePhase,
    pub buildings: usize,
    pub destroyed_buildings: usize,
    pub zones: usize,
    pub fragments: usize,
    pub live_fragments: usize,
    pub settled_fragments: usize,
    pub total_frames: u64,
    /// How many times zones + occupancy were rebuilt.
    pub zone_recomputes: u64,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebrisConfig {
    /// Target fragment edge length in world units.
    pub fragment_edge: f32,
    /// Jitter range per axis as a fraction of the fragment extent.
    pub jitter_fraction: f32,
    /// Initial horizontal speed bound (±) on x and z.
    pub horizontal_kick: f32,
    /// Initial spin bound (±) per axis, rad/s.
    pub angular_kick: f32,
    /// Upper bound on fragments per building. Larger buildings are cut
    /// into coarser pieces.
    pub max_fragments: usize,
}

/// Largest accepted `debris.max_fragments`.
pub const MAX_FRAGMENTS_LIMIT: usize = 1_000_000;

impl Default for DebrisConfig {
    fn default() -> Self {
        Self {
            fragment_edge: 0.5,
            jitter_fraction: 0.4,
            horizontal_kick: 0.05,
            angular_kick: 0.125,
            max_fragments: 20_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GridConfig {
    pub rows: usize,
    pub cols: usize,
    /// World extent along x covered by the columns, centered on the origin.
    pub world_width: f32,
    /// World extent along z covered by the rows, centered on the origin.
    pub world_depth: f32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            rows: 50,
            cols: 50,
            world_width: 100.0,
            world_depth: 100.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    pub gravity: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Height of the ground plane.
    pub ground_y: f32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            gravity: -9.81,
            linear_damping: 0.6,
            angular_damping: 0.8,
            ground_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Scene units → meters.
    pub meters_per_unit: f32,
    pub debris: DebrisConfig,
    pub grid: GridConfig,
    pub host: HostConfig,
    /// How long the initial debris kick lasts before velocities are zeroed.
    pub kick_duration_ms: u64,
    /// Physics integration step size in seconds.
    pub physics_dt: f32,
    /// Seed for debris jitter and kicks.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            meters_per_unit: 2.0,
            debris: DebrisConfig::default(),
            grid: GridConfig::default(),
            host: HostConfig::default(),
            kick_duration_ms: 6000,
            physics_dt: 1.0 / 60.0,
            seed: 42,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), QuakeError> {
        let positive = |name: &str, v: f32| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(QuakeError::InvalidConfig(format!(
                    "{} must be positive, got {}",
                    name, v
                )))
            }
        };
        positive("meters_per_unit", self.meters_per_unit)?;
        positive("debris.fragment_edge", self.debris.fragment_edge)?;
        positive("grid.world_width", self.grid.world_width)?;
        positive("grid.world_depth", self.grid.world_depth)?;
        positive("physics_dt", self.physics_dt)?;
        if self.grid.rows == 0 || self.grid.cols == 0 {
            return Err(QuakeError::InvalidConfig(format!(
                "grid must have at least one cell, got {}x{}",
                self.grid.rows, self.grid.cols
            )));
        }
        if !(1..=MAX_FRAGMENTS_LIMIT).contains(&self.debris.max_fragments) {
            return Err(QuakeError::InvalidConfig(format!(
                "debris.max_fragments must be in [1, {}], got {}",
                MAX_FRAGMENTS_LIMIT, self.debris.max_fragments
            )));
        }
        if !(0.0..=1.0).contains(&self.debris.jitter_fraction) {
            return Err(QuakeError::InvalidConfig(format!(
                "debris.jitter_fraction must be in [0, 1], got {}",
                self.debris.jitter_fraction
            )));
        }
        Ok(())
    }
}
