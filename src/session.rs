//! CollapseSession – authoritative building, zone and fragment state, and the
//! collapse state machine that drives them frame by frame.
//!
//! ```text
//! idle ──trigger──▶ collapsing ──(no live fragments)──▶ settled
//!  ▲                    │                                  │
//!  └───────reset────────┴──────────────reset───────────────┘
//! ```

use crate::constraint::{constrain, ConstraintOutcome};
use crate::debris::decompose;
use crate::error::{QuakeError, Result};
use crate::host::PhysicsHost;
use crate::layout;
use crate::protocol::{
    CollapseReset, CollapseSettled, CollapseTriggered, FragmentSettled, KickExpired,
    OccupancyUpdated, SessionSnapshot,
};
use crate::raster::{rasterize, OccupancyMatrix};
use crate::types::{
    Building, CollapsePhase, DamageZone, DebrisFragment, SessionStats, SimConfig, Vec3,
};
use crate::zone::compute_damage_zones;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashSet;
use std::time::Duration;

// ---------------------------------------------------------------------------
// Trigger + step result
// ---------------------------------------------------------------------------

/// Which buildings a collapse takes down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CollapseTrigger {
    All,
    /// Buildings whose ground position lies within `radius` of `(x, z)`.
    Epicenter { x: f32, z: f32, radius: f32 },
}

impl CollapseTrigger {
    fn selects(&self, building: &Building) -> bool {
        match *self {
            CollapseTrigger::All => true,
            CollapseTrigger::Epicenter { x, z, radius } => building.ground_distance(x, z) <= radius,
        }
    }
}

/// Events produced by a single [`CollapseSession::step`] call.
#[derive(Debug, Clone, Default)]
pub struct StepEvents {
    /// The frame counter that produced this set of events.
    pub frame: u64,
    /// Fragments that left their zone and froze this frame.
    pub settled: Vec<FragmentSettled>,
    pub kick_expired: Option<KickExpired>,
    /// Set on the frame the last live fragment froze.
    pub collapse_settled: Option<CollapseSettled>,
}

#[derive(Debug, Clone, Copy)]
struct KickExpiry {
    event_id: u64,
    due: Duration,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct CollapseSession {
    config: SimConfig,
    buildings: Vec<Building>,
    zones: Vec<DamageZone>,
    occupancy: OccupancyMatrix,
    geometry_digest: Option<md5::Digest>,
    fragments: Vec<DebrisFragment>,
    /// Buildings decomposed in the current collapse event.
    collapsing: HashSet<String>,
    pending_kick: Option<KickExpiry>,
    phase: CollapsePhase,
    event_id: u64,
    clock: Duration,
    frame_count: u64,
    zone_recomputes: u64,
    rng: ChaCha8Rng,
}

impl CollapseSession {
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let occupancy = OccupancyMatrix::clear(config.grid.rows, config.grid.cols);
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            buildings: Vec::new(),
            zones: Vec::new(),
            occupancy,
            geometry_digest: None,
            fragments: Vec::new(),
            collapsing: HashSet::new(),
            pending_kick: None,
            phase: CollapsePhase::Idle,
            event_id: 0,
            clock: Duration::ZERO,
            frame_count: 0,
            zone_recomputes: 0,
            rng,
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn zones(&self) -> &[DamageZone] {
        &self.zones
    }

    pub fn occupancy(&self) -> &OccupancyMatrix {
        &self.occupancy
    }

    pub fn fragments(&self) -> &[DebrisFragment] {
        &self.fragments
    }

    pub fn fragment(&self, id: &str) -> Option<&DebrisFragment> {
        self.fragments.iter().find(|f| f.id == id)
    }

    pub fn phase(&self) -> CollapsePhase {
        self.phase
    }

    pub fn event_id(&self) -> u64 {
        self.event_id
    }

    /// Simulation time elapsed across all steps.
    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn is_collapsing(&self, building_id: &str) -> bool {
        self.collapsing.contains(building_id)
    }

    pub fn live_fragment_count(&self) -> usize {
        self.fragments.iter().filter(|f| f.is_live()).count()
    }

    // -----------------------------------------------------------------------
    // Building set
    // -----------------------------------------------------------------------

    /// Replace the building set. Any collapse in progress is discarded.
    ///
    /// Ids must be unique and every size component positive; on error the
    /// session is untouched. Returns the occupancy update when the zone
    /// geometry changed.
    pub fn set_buildings(
        &mut self,
        buildings: Vec<Building>,
    ) -> Result<Option<OccupancyUpdated>> {
        for (index, b) in buildings.iter().enumerate() {
            layout::check_size(index, b.size)?;
        }
        layout::ensure_unique(&buildings)?;

        self.clear_collapse();
        self.buildings = buildings;
        Ok(self.refresh_derived())
    }

    /// Parse a layout file and load it. On error the session is untouched.
    pub fn load_layout_json(&mut self, json: &str) -> Result<usize> {
        let buildings = layout::parse_layout(json)?;
        let count = buildings.len();
        self.set_buildings(buildings)?;
        info!("Loaded layout with {} buildings", count);
        Ok(count)
    }

    /// Parse a prediction response and load it. On error the session is untouched.
    pub fn load_prediction_json(&mut self, json: &str) -> Result<usize> {
        let buildings = layout::parse_predictions(json)?;
        let count = buildings.len();
        self.set_buildings(buildings)?;
        info!("Loaded {} predicted buildings", count);
        Ok(count)
    }

    /// Edit one building in place, then refresh zones if its geometry moved.
    ///
    /// An edit that breaks the building set (non-positive size, duplicate id)
    /// is rolled back. An edit that moves zone geometry while a collapse is
    /// running resets that collapse first, so debris is never clamped
    /// against zones that changed mid-event.
    pub fn update_building(
        &mut self,
        id: &str,
        edit: impl FnOnce(&mut Building),
    ) -> Result<Option<OccupancyUpdated>> {
        let index = self
            .buildings
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| QuakeError::UnknownBuilding(id.to_string()))?;

        let previous = self.buildings[index].clone();
        edit(&mut self.buildings[index]);
        let valid = layout::check_size(index, self.buildings[index].size)
            .and_then(|()| layout::ensure_unique(&self.buildings));
        if let Err(e) = valid {
            self.buildings[index] = previous;
            return Err(e.into());
        }

        if self.phase != CollapsePhase::Idle
            && self.geometry_digest != Some(self.compute_geometry_digest())
        {
            warn!("Building {} edited mid-collapse, resetting", id);
            self.reset();
        }
        Ok(self.refresh_derived())
    }

    /// Toggle the pre-collapse shake on every standing building.
    pub fn set_shaking(&mut self, shaking: bool) {
        for b in self.buildings.iter_mut().filter(|b| !b.destroyed) {
            b.shaking = shaking;
        }
    }

    // -----------------------------------------------------------------------
    // Derived state (memoized)
    // -----------------------------------------------------------------------

    fn compute_geometry_digest(&self) -> md5::Digest {
        let mut bytes = Vec::with_capacity(self.buildings.len() * 48);
        for b in &self.buildings {
            bytes.extend_from_slice(b.id.as_bytes());
            bytes.push(0);
            for v in [b.position.x, b.position.z, b.size.x, b.size.z, b.damage_area_sq_m] {
                bytes.extend_from_slice(&v.to_le_bytes());
            }
        }
        md5::compute(&bytes)
    }

    /// Recompute zones and occupancy only when building geometry changed.
    fn refresh_derived(&mut self) -> Option<OccupancyUpdated> {
        let digest = self.compute_geometry_digest();
        if self.geometry_digest == Some(digest) {
            return None;
        }

        self.zones = compute_damage_zones(&self.buildings, self.config.meters_per_unit);
        self.occupancy = rasterize(&self.zones, &self.config.grid);
        self.geometry_digest = Some(digest);
        self.zone_recomputes += 1;

        let update = OccupancyUpdated {
            rows: self.occupancy.row_count(),
            cols: self.occupancy.col_count(),
            blocked_cells: self.occupancy.blocked_count(),
        };
        debug!(
            "Recomputed {} damage zones, {} blocked cells",
            self.zones.len(),
            update.blocked_cells
        );
        Some(update)
    }

    // -----------------------------------------------------------------------
    // Collapse lifecycle
    // -----------------------------------------------------------------------

    /// Start a collapse. A collapse already in progress is reset first, so
    /// no stale fragments survive a re-trigger.
    pub fn trigger(&mut self, trigger: CollapseTrigger) -> CollapseTriggered {
        if self.phase != CollapsePhase::Idle {
            self.reset();
        }
        self.event_id += 1;

        let mut destroyed = Vec::new();
        for building in self.buildings.iter_mut() {
            building.shaking = false;
            if !trigger.selects(building) || !self.collapsing.insert(building.id.clone()) {
                continue;
            }
            building.destroyed = true;
            self.fragments
                .extend(decompose(building, &self.config.debris, &mut self.rng));
            destroyed.push(building.id.clone());
        }

        if destroyed.is_empty() {
            warn!("Collapse {} selected no buildings", self.event_id);
        } else {
            self.phase = CollapsePhase::Collapsing;
            self.pending_kick = Some(KickExpiry {
                event_id: self.event_id,
                due: self.clock + Duration::from_millis(self.config.kick_duration_ms),
            });
        }

        info!(
            "Collapse {}: {} buildings destroyed, {} fragments",
            self.event_id,
            destroyed.len(),
            self.fragments.len()
        );

        CollapseTriggered {
            event_id: self.event_id,
            destroyed_buildings: destroyed,
            fragments: self.fragments.len(),
        }
    }

    /// Return to idle: drop every fragment, revive every building, cancel
    /// the pending kick expiry. Takes effect before the next step.
    pub fn reset(&mut self) -> CollapseReset {
        let discarded = self.clear_collapse();
        for b in self.buildings.iter_mut() {
            b.destroyed = false;
            b.shaking = false;
        }
        info!(
            "Collapse {} reset, {} fragments discarded",
            self.event_id, discarded
        );
        CollapseReset {
            event_id: self.event_id,
            discarded_fragments: discarded,
        }
    }

    fn clear_collapse(&mut self) -> usize {
        let discarded = self.fragments.len();
        self.fragments.clear();
        self.collapsing.clear();
        self.pending_kick = None;
        self.phase = CollapsePhase::Idle;
        discarded
    }

    /// Stop every live fragment of collapse `event_id`.
    ///
    /// A no-op when that collapse has since been reset or replaced.
    pub fn fire_kick_expiry(&mut self, event_id: u64) -> usize {
        if event_id != self.event_id || self.phase == CollapsePhase::Idle {
            return 0;
        }
        let mut stopped = 0;
        for f in self.fragments.iter_mut().filter(|f| f.is_live()) {
            f.velocity = Vec3::zero();
            f.angular_velocity = Vec3::zero();
            stopped += 1;
        }
        debug!("Kick expired for collapse {}: {} fragments stopped", event_id, stopped);
        stopped
    }

    // -----------------------------------------------------------------------
    // Main step
    // -----------------------------------------------------------------------

    /// Advance the simulation by one frame of `dt` seconds.
    pub fn step(&mut self, host: &mut impl PhysicsHost, dt: f32) -> StepEvents {
        self.frame_count += 1;
        self.clock += Duration::try_from_secs_f32(dt).unwrap_or_default();

        let mut events = StepEvents {
            frame: self.frame_count,
            ..Default::default()
        };

        if let Some(kick) = self.pending_kick.filter(|k| self.clock >= k.due) {
            self.pending_kick = None;
            events.kick_expired = Some(KickExpired {
                event_id: kick.event_id,
                fragments_stopped: self.fire_kick_expiry(kick.event_id),
            });
        }

        if self.phase != CollapsePhase::Collapsing {
            return events;
        }

        for fragment in self.fragments.iter_mut().filter(|f| f.is_live()) {
            host.integrate(fragment, dt);
            if constrain(fragment, &self.zones) == ConstraintOutcome::Settled {
                events.settled.push(FragmentSettled::from(&*fragment));
            }
        }

        if self.fragments.iter().all(|f| !f.is_live()) {
            self.phase = CollapsePhase::Settled;
            info!("Collapse {} settled", self.event_id);
            events.collapse_settled = Some(CollapseSettled {
                event_id: self.event_id,
                fragments: self.fragments.len(),
            });
        }

        events
    }

    // -----------------------------------------------------------------------
    // Stats + snapshot
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> SessionStats {
        let live = self.live_fragment_count();
        SessionStats {
            phase: self.phase,
            buildings: self.buildings.len(),
            destroyed_buildings: self.buildings.iter().filter(|b| b.destroyed).count(),
            zones: self.zones.len(),
            fragments: self.fragments.len(),
            live_fragments: live,
            settled_fragments: self.fragments.len() - live,
            total_frames: self.frame_count,
            zone_recomputes: self.zone_recomputes,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            event_id: self.event_id,
            buildings: self.buildings.clone(),
            zones: self.zones.clone(),
            fragments: self.fragments.clone(),
        }
    }
}
