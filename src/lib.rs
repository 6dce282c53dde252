//! Quake Debris Engine
//!
//! Collapses a layout of buildings into debris, holds the debris inside
//! per-building damage zones, and rasterizes those zones into an occupancy
//! grid for routing.
//!
//! ## Architecture
//!
//! ```text
//! SimRunner  (runner.rs)              ← tokio frame loop, event publishing
//!   └── CollapseSession  (session.rs) ← collapse state machine
//!         ├── zone.rs        damage area → zone rectangle
//!         ├── debris.rs      building → fragment grid
//!         ├── constraint.rs  per-step zone clamp + freeze
//!         ├── raster.rs      zones → occupancy matrix
//!         └── PhysicsHost  (host.rs)  ← motion integration seam
//! ```
//!
//! Layouts and prediction responses enter through `layout.rs`; outbound
//! events are defined in `protocol.rs`.

// Geometry, session and protocol are always available.
pub mod constraint;
pub mod debris;
pub mod error;
pub mod host;
pub mod layout;
pub mod protocol;
pub mod raster;
pub mod session;
pub mod types;
pub mod zone;

// The frame runner requires the `server` feature.
#[cfg(feature = "server")]
pub mod runner;

// Convenience re-exports
pub use constraint::{advance, constrain, ConstraintOutcome};
pub use error::{LayoutError, QuakeError, Result};
pub use host::{BallisticHost, PhysicsHost};
pub use raster::{rasterize, OccupancyMatrix};
#[cfg(feature = "server")]
pub use runner::{RunnerConfig, SimRunner};
pub use session::{CollapseSession, CollapseTrigger, StepEvents};
pub use types::{
    Building, CollapsePhase, DamageZone, DebrisFragment, Extent2, SessionStats, SimConfig, Vec3,
};
