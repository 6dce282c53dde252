//! SimRunner tests

#![cfg(feature = "server")]

#[cfg(test)]
mod tests {
    use parking_lot::Mutex;
    use quake_debris::host::PhysicsHost;
    use quake_debris::protocol::subjects;
    use quake_debris::runner::{RunnerConfig, SimRunner};
    use quake_debris::session::{CollapseSession, CollapseTrigger};
    use quake_debris::types::{Building, CollapsePhase, DebrisFragment, SimConfig, Vec3};
    use std::sync::Arc;

    struct DriftHost(f32);

    impl PhysicsHost for DriftHost {
        fn integrate(&mut self, fragment: &mut DebrisFragment, _dt: f32) {
            fragment.position.z += self.0;
        }
    }

    struct StillHost;

    impl PhysicsHost for StillHost {
        fn integrate(&mut self, _fragment: &mut DebrisFragment, _dt: f32) {}
    }

    fn collapsed_session() -> Arc<Mutex<CollapseSession>> {
        let mut s = CollapseSession::new(SimConfig::default()).unwrap();
        s.set_buildings(vec![Building::new(
            "1",
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::new(1.0, 1.0, 1.0),
            20.0,
        )])
        .unwrap();
        s.trigger(CollapseTrigger::All);
        Arc::new(Mutex::new(s))
    }

    fn free_running(max_frames: u64) -> RunnerConfig {
        RunnerConfig {
            session: "test".into(),
            max_frames,
            realtime: false,
            ..Default::default()
        }
    }

    // -----------------------------------------------------------------------
    // Termination
    // -----------------------------------------------------------------------

    #[test]
    fn stops_once_debris_settles() {
        let session = collapsed_session();
        let runner = SimRunner::new(free_running(100), session.clone(), DriftHost(5.0));
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

        let summary = tokio_test::block_on(runner.run(tx)).unwrap();
        assert_eq!(summary.frames, 1);
        assert!(summary.settled);
        assert_eq!(summary.stats.settled_fragments, 8);
        assert_eq!(session.lock().phase(), CollapsePhase::Settled);

        let mut subjects_seen = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            assert_eq!(msg.payload["session"], "test");
            assert_eq!(msg.payload["frame"], 1);
            subjects_seen.push(msg.subject);
        }
        assert_eq!(
            subjects_seen
                .iter()
                .filter(|s| **s == subjects::FRAGMENT_SETTLED)
                .count(),
            8
        );
        assert_eq!(subjects_seen.last(), Some(&subjects::COLLAPSE_SETTLED));
    }

    #[test]
    fn stops_at_frame_cap_when_debris_stays_live() {
        let session = collapsed_session();
        let runner = SimRunner::new(free_running(25), session.clone(), StillHost);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();

        let summary = tokio_test::block_on(runner.run(tx)).unwrap();
        assert_eq!(summary.frames, 25);
        assert!(!summary.settled);
        assert_eq!(summary.stats.live_fragments, 8);
    }

    #[test]
    fn idle_session_stops_after_one_frame() {
        let session = Arc::new(Mutex::new(
            CollapseSession::new(SimConfig::default()).unwrap(),
        ));
        let runner = SimRunner::new(free_running(50), session, StillHost);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let summary = tokio_test::block_on(runner.run(tx)).unwrap();
        assert_eq!(summary.frames, 1);
        assert_eq!(summary.stats.phase, CollapsePhase::Idle);
    }

    #[test]
    fn closed_sink_does_not_stop_the_loop() {
        let session = collapsed_session();
        let runner = SimRunner::new(free_running(3), session, DriftHost(5.0));
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        drop(rx);
        let summary = tokio_test::block_on(runner.run(tx)).unwrap();
        assert!(summary.settled);
    }

    #[test]
    fn rejects_non_positive_tick_rate() {
        let config = RunnerConfig {
            tick_rate_hz: 0.0,
            ..free_running(10)
        };
        let runner = SimRunner::new(config, collapsed_session(), StillHost);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        assert!(tokio_test::block_on(runner.run(tx)).is_err());
    }

    #[test]
    fn realtime_pacing_runs_frames() {
        let config = RunnerConfig {
            tick_rate_hz: 1000.0,
            realtime: true,
            ..free_running(5)
        };
        let runner = SimRunner::new(config, collapsed_session(), StillHost);
        let (tx, _rx) = tokio::sync::mpsc::unbounded_channel();
        let summary = tokio_test::block_on(runner.run(tx)).unwrap();
        assert_eq!(summary.frames, 5);
    }
}
