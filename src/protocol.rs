//! `quake.*` event protocol.
//!
//! This module owns **every message that leaves the simulation** towards a
//! renderer, a routing backend, or a log sink.
//!
//! ## Design rules
//!
//! 1. Every struct is `Serialize + Deserialize` with snake_case JSON.
//! 2. Host physics types never leak out; positions are plain `x, y, z`.
//! 3. The occupancy matrix is only sent as dimensions + blocked count; the
//!    full grid goes through the export file.
//! 4. Every outbound event is wrapped in [`SimEvent`] with `frame` and `session`.

use crate::types::{Building, CollapsePhase, DamageZone, DebrisFragment};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Common envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimEvent<T> {
    pub session: String,
    pub frame: u64,
    pub payload: T,
}

impl<T> SimEvent<T> {
    pub fn new(session: impl Into<String>, frame: u64, payload: T) -> Self {
        Self {
            session: session.into(),
            frame,
            payload,
        }
    }
}

// ---------------------------------------------------------------------------
// Collapse lifecycle  (subjects: quake.collapse.*)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollapseTriggered {
    /// Monotonic id of this collapse event within the session.
    pub event_id: u64,
    pub destroyed_buildings: Vec<String>,
    pub fragments: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollapseReset {
    pub event_id: u64,
    pub discarded_fragments: usize,
}

/// The collapse reached its steady state: no live fragments remain.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollapseSettled {
    pub event_id: u64,
    pub fragments: usize,
}

// ---------------------------------------------------------------------------
// Fragment events  (subjects: quake.fragment.*)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FragmentSettled {
    pub fragment_id: String,
    pub building_id: String,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<&DebrisFragment> for FragmentSettled {
    fn from(f: &DebrisFragment) -> Self {
        Self {
            fragment_id: f.id.clone(),
            building_id: f.building_id.clone(),
            x: f.position.x,
            y: f.position.y,
            z: f.position.z,
        }
    }
}

/// The initial kick window elapsed and live fragments were stopped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KickExpired {
    pub event_id: u64,
    pub fragments_stopped: usize,
}

// ---------------------------------------------------------------------------
// Occupancy  (subject: quake.occupancy.updated)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OccupancyUpdated {
    pub rows: usize,
    pub cols: usize,
    pub blocked_cells: usize,
}

// ---------------------------------------------------------------------------
// Snapshot  (subject: quake.snapshot)
// ---------------------------------------------------------------------------

/// Full session state, for a renderer joining mid-collapse or for export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub phase: CollapsePhase,
    pub event_id: u64,
    pub buildings: Vec<Building>,
    pub zones: Vec<DamageZone>,
    pub fragments: Vec<DebrisFragment>,
}

// ---------------------------------------------------------------------------
// Subject helpers
// ---------------------------------------------------------------------------

pub mod subjects {
    pub const COLLAPSE_TRIGGERED: &str = "quake.collapse.triggered";
    pub const COLLAPSE_RESET: &str = "quake.collapse.reset";
    pub const COLLAPSE_SETTLED: &str = "quake.collapse.settled";

    pub const FRAGMENT_SETTLED: &str = "quake.fragment.settled";
    pub const KICK_EXPIRED: &str = "quake.fragment.kick_expired";

    pub const OCCUPANCY_UPDATED: &str = "quake.occupancy.updated";
    pub const SNAPSHOT: &str = "quake.snapshot";
}
