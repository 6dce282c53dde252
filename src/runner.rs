//! Frame runner – drives a shared [`CollapseSession`] from a tokio timer and
//! publishes every step's events.
//!
//! ## Event contract (outbound)
//!
//! | Subject                       | Payload type                      |
//! |-------------------------------|-----------------------------------|
//! | `quake.fragment.settled`      | `SimEvent<FragmentSettled>`       |
//! | `quake.fragment.kick_expired` | `SimEvent<KickExpired>`           |
//! | `quake.collapse.settled`      | `SimEvent<CollapseSettled>`       |
//!
//! The runner stops once the session leaves the collapsing phase (settled,
//! or reset from another task) or after `max_frames` frames.

use crate::host::PhysicsHost;
use crate::protocol::{subjects, SimEvent};
use crate::session::CollapseSession;
use crate::types::{CollapsePhase, SessionStats};
use anyhow::{bail, Result};
use log::{info, warn};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

// ---------------------------------------------------------------------------
// Published message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Published {
    pub subject: &'static str,
    pub payload: serde_json::Value,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Session name stamped on every event.
    pub session: String,
    /// Frame rate in Hz when running in real time.
    pub tick_rate_hz: f32,
    /// Hard cap on frames for one run.
    pub max_frames: u64,
    /// Pace frames with a timer; otherwise run as fast as possible.
    pub realtime: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            session: "default".into(),
            tick_rate_hz: 60.0,
            max_frames: 3600,
            realtime: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub frames: u64,
    pub settled: bool,
    pub stats: SessionStats,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

pub struct SimRunner<H> {
    config: RunnerConfig,
    session: Arc<Mutex<CollapseSession>>,
    host: H,
}

impl<H: PhysicsHost> SimRunner<H> {
    pub fn new(config: RunnerConfig, session: Arc<Mutex<CollapseSession>>, host: H) -> Self {
        Self {
            config,
            session,
            host,
        }
    }

    /// Step the session until it stops collapsing or the frame cap is hit.
    #[tracing::instrument(skip_all, fields(session = %self.config.session))]
    pub async fn run(mut self, out: UnboundedSender<Published>) -> Result<RunSummary> {
        if !(self.config.tick_rate_hz.is_finite() && self.config.tick_rate_hz > 0.0) {
            bail!("tick rate must be positive, got {}", self.config.tick_rate_hz);
        }

        let dt = self.session.lock().config().physics_dt;
        let mut timer = self.config.realtime.then(|| {
            tokio::time::interval(std::time::Duration::from_secs_f32(
                1.0 / self.config.tick_rate_hz,
            ))
        });

        info!(
            "SimRunner started – {} frames max at {:.0}Hz ({})",
            self.config.max_frames,
            self.config.tick_rate_hz,
            if self.config.realtime { "realtime" } else { "free-running" }
        );

        let mut frames = 0;
        while frames < self.config.max_frames {
            match timer.as_mut() {
                Some(t) => {
                    t.tick().await;
                }
                None => tokio::task::yield_now().await,
            }

            // Hold the lock only long enough to step, then release before publishing.
            let (events, phase) = {
                let mut session = self.session.lock();
                let events = session.step(&mut self.host, dt);
                (events, session.phase())
            };
            frames += 1;

            let session = self.config.session.as_str();
            for settled in &events.settled {
                publish(
                    &out,
                    subjects::FRAGMENT_SETTLED,
                    SimEvent::new(session, events.frame, settled),
                );
            }
            if let Some(kick) = &events.kick_expired {
                publish(
                    &out,
                    subjects::KICK_EXPIRED,
                    SimEvent::new(session, events.frame, kick),
                );
            }
            if let Some(done) = &events.collapse_settled {
                publish(
                    &out,
                    subjects::COLLAPSE_SETTLED,
                    SimEvent::new(session, events.frame, done),
                );
            }

            if phase != CollapsePhase::Collapsing {
                break;
            }
        }

        let stats = self.session.lock().stats();
        let settled = stats.phase == CollapsePhase::Settled;
        info!("SimRunner finished after {} frames (settled={})", frames, settled);
        Ok(RunSummary {
            frames,
            settled,
            stats,
        })
    }
}

// ---------------------------------------------------------------------------
// Publish helper
// ---------------------------------------------------------------------------

/// Serialise `event` and send it on `out` under `subject`.
///
/// Errors are logged and swallowed – a closed sink or a bad payload should
/// not stop the frame loop.
pub fn publish<T: Serialize>(
    out: &UnboundedSender<Published>,
    subject: &'static str,
    event: SimEvent<T>,
) {
    match serde_json::to_value(&event) {
        Ok(payload) => {
            if out.send(Published { subject, payload }).is_err() {
                warn!("Event sink closed, dropping {}", subject);
            }
        }
        Err(e) => warn!("Failed to serialise event for {}: {}", subject, e),
    }
}
