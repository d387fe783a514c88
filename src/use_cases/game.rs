use super::types::{SnapshotSink, WorldSettings};
use crate::domain::{Command, CommandSender, SpawnKind, SubmitError, Universe, UniverseSnapshot};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::{Instant, MissedTickBehavior, interval, interval_at};
use tracing::{debug, info, warn};

/// Drives the universe at a fixed rate until `shutdown` is notified, then hands it back.
///
/// Periodic spawns go through the command queue like any other external actor; this task
/// only ever calls `step` and reads the result.
pub async fn world_task(
    mut universe: Universe,
    sink: Arc<dyn SnapshotSink>,
    settings: WorldSettings,
    shutdown: Arc<Notify>,
) -> Universe {
    let commands = universe.command_sender();
    let mut tick: u64 = 0;

    let mut step_timer = interval(settings.tick_interval);
    // A late tick runs once; never in a catch-up burst.
    step_timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut threat_timer = interval_at(
        Instant::now() + settings.threat_spawn_interval,
        settings.threat_spawn_interval,
    );
    let mut food_timer = interval_at(
        Instant::now() + settings.food_spawn_interval,
        settings.food_spawn_interval,
    );

    info!(
        bodies = universe.bodies().len(),
        tick_ms = settings.tick_interval.as_millis(),
        "world task started"
    );

    loop {
        tokio::select! {
            biased;
            _ = shutdown.notified() => {
                break;
            }
            _ = step_timer.tick() => {
                let stats = universe.step(settings.tick_interval);
                tick += 1;
                if stats.merges > 0 {
                    debug!(tick, merges = stats.merges, "bodies merged");
                }
                sink.publish(UniverseSnapshot::capture(tick, &universe));
            }
            _ = threat_timer.tick() => {
                enqueue_spawn(&commands, SpawnKind::Threat);
            }
            _ = food_timer.tick() => {
                enqueue_spawn(&commands, SpawnKind::Food);
            }
        }
    }

    info!(tick, bodies = universe.bodies().len(), "world task stopped");
    universe
}

fn enqueue_spawn(commands: &CommandSender, kind: SpawnKind) {
    match commands.submit(Command::Spawn(kind)) {
        Ok(()) => {}
        // Already logged by the sender.
        Err(SubmitError::Full) => {}
        Err(SubmitError::Closed) => warn!(?kind, "command queue closed; spawn skipped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Body, Point, Rect, UniverseConfig};
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingSink {
        snapshots: Mutex<Vec<UniverseSnapshot>>,
    }

    impl SnapshotSink for RecordingSink {
        fn publish(&self, snapshot: UniverseSnapshot) {
            self.snapshots
                .lock()
                .expect("snapshots mutex poisoned")
                .push(snapshot);
        }
    }

    fn settings() -> WorldSettings {
        WorldSettings {
            tick_interval: Duration::from_millis(100),
            threat_spawn_interval: Duration::from_secs(60),
            food_spawn_interval: Duration::from_millis(250),
        }
    }

    fn universe() -> Universe {
        Universe::new(UniverseConfig {
            seed: Some(11),
            ..UniverseConfig::new(Rect::new(-10_000.0, -10_000.0, 20_000.0, 20_000.0))
        })
    }

    #[tokio::test(start_paused = true)]
    async fn publishes_one_snapshot_per_tick() {
        let sink = Arc::new(RecordingSink::default());
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(world_task(
            universe(),
            sink.clone(),
            settings(),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(1_050)).await;
        shutdown.notify_one();
        let universe = handle.await.expect("world task panicked");

        let snapshots = sink.snapshots.lock().expect("snapshots mutex poisoned");
        assert!(snapshots.len() >= 10);
        for (i, snapshot) in snapshots.iter().enumerate() {
            assert_eq!(snapshot.tick, i as u64 + 1);
            assert_eq!(snapshot.bounds, universe.bounds());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn periodic_spawns_arrive_through_the_queue() {
        let sink = Arc::new(RecordingSink::default());
        let shutdown = Arc::new(Notify::new());
        let handle = tokio::spawn(world_task(
            universe(),
            sink.clone(),
            settings(),
            shutdown.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(1_050)).await;
        shutdown.notify_one();
        let universe = handle.await.expect("world task panicked");

        // Food every 250ms; the spawn lands on the tick after it is queued.
        assert!(universe.bodies().len() >= 3);
    }

    #[tokio::test(start_paused = true)]
    async fn external_commands_are_applied_by_the_loop() {
        let sink = Arc::new(RecordingSink::default());
        let shutdown = Arc::new(Notify::new());
        let universe = universe();
        let commands = universe.command_sender();
        let handle = tokio::spawn(world_task(
            universe,
            sink.clone(),
            WorldSettings {
                food_spawn_interval: Duration::from_secs(60),
                ..settings()
            },
            shutdown.clone(),
        ));

        let (tx, rx) = tokio::sync::oneshot::channel();
        commands
            .submit(Command::AddBody {
                body: Body::new(Point::new(0.0, 0.0), 500.0),
                assigned: Some(tx),
            })
            .expect("queue has room");
        let id = rx.await.expect("body assigned");

        tokio::time::sleep(Duration::from_millis(250)).await;
        shutdown.notify_one();
        handle.await.expect("world task panicked");

        let snapshots = sink.snapshots.lock().expect("snapshots mutex poisoned");
        let last = snapshots.last().expect("at least one tick");
        assert!(last.bodies.iter().any(|b| b.id == id));
    }
}
