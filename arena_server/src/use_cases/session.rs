// Authoritative session host: one task per session owns the engine, drains
// commands once per tick and publishes the results.

use super::types::{SessionCommand, SessionStatus, WorldUpdate};
use crate::domain::ports::SnapshotStore;
use crate::domain::{Engine, EngineEvent, TickOutcome};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{Instrument, debug, info, info_span, warn};

/// Where a session task publishes what happened.
#[derive(Debug, Clone)]
pub struct SessionOutputs {
    pub world_tx: broadcast::Sender<WorldUpdate>,
    pub status_tx: watch::Sender<SessionStatus>,
    pub event_tx: broadcast::Sender<EngineEvent>,
}

#[derive(Clone)]
pub struct Persistence {
    pub store: Arc<dyn SnapshotStore>,
    /// Persist after this many simulated ticks; 0 persists only at run end and shutdown.
    pub every_ticks: u64,
}

/// Apply one command to the engine. Returns whether anything observable changed.
pub fn apply_command(engine: &mut Engine, command: SessionCommand) -> bool {
    let result = match command {
        SessionCommand::Join {
            player_id,
            name,
            character,
        } => engine.add_player(player_id, name, character),
        SessionCommand::Leave { player_id } => {
            engine.remove_player(player_id);
            Ok(())
        }
        SessionCommand::Input { player_id, input } => engine.set_input(player_id, input),
        SessionCommand::SelectUpgrade {
            player_id,
            option_id,
        } => engine.select_upgrade(player_id, option_id).map(|_| ()),
        SessionCommand::Admin(command) => engine.apply_admin(command),
    };

    match result {
        Ok(()) => true,
        Err(error) => {
            debug!(%error, "command rejected");
            false
        }
    }
}

pub async fn session_task(
    session_id: Arc<str>,
    engine: Engine,
    command_rx: mpsc::Receiver<SessionCommand>,
    outputs: SessionOutputs,
    persistence: Persistence,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let span = info_span!("session", session_id = %session_id);
    run_session(
        session_id,
        engine,
        command_rx,
        outputs,
        persistence,
        tick_interval,
        shutdown,
    )
    .instrument(span)
    .await
}

async fn run_session(
    session_id: Arc<str>,
    mut engine: Engine,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    outputs: SessionOutputs,
    persistence: Persistence,
    tick_interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut interval = tokio::time::interval(tick_interval);
    // A stalled loop catches up with one long (clamped) delta, not a burst of ticks.
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_tick_at = Instant::now();
    let mut last_persisted_tick = engine.state().tick;
    let mut final_persisted = false;
    publish_status(&outputs.status_tx, &engine);
    info!(tick = last_persisted_tick, "session started");

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            _ = interval.tick() => {}
        }

        let mut changed = false;
        let mut commands_closed = false;
        loop {
            match command_rx.try_recv() {
                Ok(command) => changed |= apply_command(&mut engine, command),
                Err(mpsc::error::TryRecvError::Empty) => break,
                Err(mpsc::error::TryRecvError::Disconnected) => {
                    commands_closed = true;
                    break;
                }
            }
        }

        let now = Instant::now();
        let delta_ms = now.duration_since(last_tick_at).as_secs_f32() * 1000.0;
        last_tick_at = now;

        let outcome = engine.tick(delta_ms);
        if outcome == TickOutcome::Advanced || changed {
            let state = Arc::new(engine.snapshot());
            let _ = outputs.world_tx.send(WorldUpdate {
                tick: state.tick,
                state,
            });
        }

        for event in engine.drain_events() {
            info!(?event, "engine event");
            let _ = outputs.event_tx.send(event);
        }
        let status = publish_status(&outputs.status_tx, &engine);

        let tick = engine.state().tick;
        let periodic =
            persistence.every_ticks > 0 && tick >= last_persisted_tick + persistence.every_ticks;
        let finished = status.is_over() && !final_persisted;
        if periodic || finished {
            persist(&session_id, &engine, &persistence).await;
            last_persisted_tick = tick;
            final_persisted |= finished;
        }

        if commands_closed {
            warn!("command channel closed; stopping session");
            break;
        }
    }

    if engine.state().tick != last_persisted_tick {
        persist(&session_id, &engine, &persistence).await;
    }
    info!(tick = engine.state().tick, "session stopped");
}

fn publish_status(status_tx: &watch::Sender<SessionStatus>, engine: &Engine) -> SessionStatus {
    let status = SessionStatus::of(engine.state());
    status_tx.send_if_modified(|current| {
        if *current == status {
            false
        } else {
            info!(?status, "session status changed");
            *current = status;
            true
        }
    });
    status
}

async fn persist(session_id: &str, engine: &Engine, persistence: &Persistence) {
    let snapshot = engine.snapshot();
    match persistence.store.persist(session_id, &snapshot).await {
        Ok(()) => debug!(tick = snapshot.tick, "snapshot persisted"),
        Err(error) => warn!(%error, tick = snapshot.tick, "failed to persist snapshot"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EngineConfig, PlayerInput};
    use crate::use_cases::test_support::{FailureFlags, RecordingStore};

    struct Harness {
        command_tx: mpsc::Sender<SessionCommand>,
        world_rx: broadcast::Receiver<WorldUpdate>,
        status_rx: watch::Receiver<SessionStatus>,
        shutdown: Arc<Notify>,
        task: tokio::task::JoinHandle<()>,
    }

    fn start(store: RecordingStore, every_ticks: u64) -> Harness {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (world_tx, world_rx) = broadcast::channel(256);
        let (status_tx, status_rx) = watch::channel(SessionStatus::Waiting);
        let (event_tx, _) = broadcast::channel(64);
        let shutdown = Arc::new(Notify::new());
        let task = tokio::spawn(session_task(
            Arc::from("s-1"),
            Engine::new(EngineConfig {
                seed: 7,
                ..EngineConfig::default()
            }),
            command_rx,
            SessionOutputs {
                world_tx,
                status_tx,
                event_tx,
            },
            Persistence {
                store: Arc::new(store),
                every_ticks,
            },
            Duration::from_millis(5),
            shutdown.clone(),
        ));
        Harness {
            command_tx,
            world_rx,
            status_rx,
            shutdown,
            task,
        }
    }

    fn join(player_id: u64) -> SessionCommand {
        SessionCommand::Join {
            player_id,
            name: format!("p{player_id}"),
            character: "Monkey".to_string(),
        }
    }

    #[test]
    fn when_a_command_is_rejected_then_it_reports_no_change() {
        let mut engine = Engine::new(EngineConfig::default());

        assert!(apply_command(&mut engine, join(1)));
        assert!(apply_command(
            &mut engine,
            SessionCommand::Input {
                player_id: 1,
                input: PlayerInput {
                    up: true,
                    ..PlayerInput::default()
                },
            }
        ));
        assert!(!apply_command(
            &mut engine,
            SessionCommand::SelectUpgrade {
                player_id: 1,
                option_id: 3,
            }
        ));
        assert!(engine.state().players[0].input.up);
    }

    #[tokio::test]
    async fn when_a_player_joins_then_updates_include_them_and_status_runs() {
        let mut harness = start(RecordingStore::new(), 0);
        harness.command_tx.send(join(1)).await.expect("send join");

        let update = tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let update = harness.world_rx.recv().await.expect("world update");
                if !update.state.players.is_empty() {
                    return update;
                }
            }
        })
        .await
        .expect("update with player");

        assert_eq!(update.state.players[0].id, 1);
        tokio::time::timeout(
            Duration::from_secs(2),
            harness
                .status_rx
                .wait_for(|status| matches!(status, SessionStatus::Running { .. })),
        )
        .await
        .expect("status in time")
        .expect("status channel open");

        harness.shutdown.notify_one();
        harness.task.await.expect("task joins");
    }

    #[tokio::test]
    async fn when_ticks_accumulate_then_snapshots_are_persisted() {
        let store = RecordingStore::new();
        let mut harness = start(store.clone(), 2);
        harness.command_tx.send(join(1)).await.expect("send join");

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let update = harness.world_rx.recv().await.expect("world update");
                if update.tick >= 4 {
                    break;
                }
            }
        })
        .await
        .expect("ticks advance");

        let saved = store.get_test_snapshot("s-1").expect("snapshot persisted");
        assert!(saved.tick >= 2);
        assert_eq!(saved.players.len(), 1);

        harness.shutdown.notify_one();
        harness.task.await.expect("task joins");
    }

    #[tokio::test]
    async fn when_persisting_fails_then_the_session_keeps_running() {
        let store = RecordingStore::new().with_failures(FailureFlags {
            persist: true,
            ..FailureFlags::default()
        });
        let mut harness = start(store.clone(), 1);
        harness.command_tx.send(join(1)).await.expect("send join");

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let update = harness.world_rx.recv().await.expect("world update");
                if update.tick >= 3 {
                    break;
                }
            }
        })
        .await
        .expect("ticks advance despite store failures");

        assert!(store.get_test_snapshot("s-1").is_none());
        harness.shutdown.notify_one();
        harness.task.await.expect("task joins");
    }

    #[tokio::test]
    async fn when_shut_down_then_the_final_state_is_persisted() {
        let store = RecordingStore::new();
        let mut harness = start(store.clone(), 0);
        harness.command_tx.send(join(1)).await.expect("send join");

        tokio::time::timeout(Duration::from_secs(2), async {
            loop {
                let update = harness.world_rx.recv().await.expect("world update");
                if update.tick >= 1 {
                    break;
                }
            }
        })
        .await
        .expect("ticks advance");

        harness.shutdown.notify_one();
        harness.task.await.expect("task joins");

        let saved = store.get_test_snapshot("s-1").expect("final snapshot");
        assert!(saved.tick >= 1);
    }
}
