//! Host physics seam.
//!
//! The session never integrates motion itself; it asks a [`PhysicsHost`] to
//! advance each live fragment and then applies the zone constraint to the
//! result. [`BallisticHost`] is the built-in host used by the simulator
//! binary: gravity, exponential damping and a flat ground plane.

use crate::types::{DebrisFragment, HostConfig};

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Anything that can move a fragment forward by `dt` seconds.
///
/// Implementations must leave frozen fragments (`mass == 0`) alone.
pub trait PhysicsHost {
    fn integrate(&mut self, fragment: &mut DebrisFragment, dt: f32);
}

// ---------------------------------------------------------------------------
// Ballistic host
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct BallisticHost {
    config: HostConfig,
}

impl BallisticHost {
    pub fn new(config: HostConfig) -> Self {
        Self { config }
    }

    /// Per-step damping factor, `(1 - damping)^dt`.
    fn damping_factor(damping: f32, dt: f32) -> f32 {
        (1.0 - damping.clamp(0.0, 1.0)).powf(dt)
    }
}

impl Default for BallisticHost {
    fn default() -> Self {
        Self::new(HostConfig::default())
    }
}

impl PhysicsHost for BallisticHost {
    fn integrate(&mut self, fragment: &mut DebrisFragment, dt: f32) {
        if fragment.settled || fragment.mass <= 0.0 {
            return;
        }

        let linear = Self::damping_factor(self.config.linear_damping, dt);
        let angular = Self::damping_factor(self.config.angular_damping, dt);

        let v = &mut fragment.velocity;
        v.y += self.config.gravity * dt;
        v.x *= linear;
        v.y *= linear;
        v.z *= linear;

        let p = &mut fragment.position;
        p.x += v.x * dt;
        p.y += v.y * dt;
        p.z += v.z * dt;

        // Rest on the ground plane.
        let floor = self.config.ground_y + fragment.size.y / 2.0;
        if p.y < floor {
            p.y = floor;
            v.y = 0.0;
        }

        let w = &mut fragment.angular_velocity;
        w.x *= angular;
        w.y *= angular;
        w.z *= angular;

        let r = &mut fragment.rotation;
        r.x += w.x * dt;
        r.y += w.y * dt;
        r.z += w.z * dt;
    }
}
