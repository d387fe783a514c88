// Per-tick snapshot fan-out to every live websocket session.
//
// Each snapshot is serialized once and offered to every session's bounded outbound
// buffer with a non-blocking send. A full buffer drops the frame for that session only.

use crate::domain::UniverseSnapshot;
use crate::interface_adapters::protocol::ServerMessage;
use crate::use_cases::SnapshotSink;

use axum::extract::ws::{CloseFrame, Utf8Bytes, close_code};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const DROP_LOG_THROTTLE: Duration = Duration::from_secs(2);

/// Liveness flag shared by a session's reader and writer tasks and the hub.
#[derive(Debug, Clone, Default)]
pub struct SessionLiveness {
    inner: Arc<LivenessInner>,
}

#[derive(Debug, Default)]
struct LivenessInner {
    dead: AtomicBool,
    died: Notify,
    close_frame: Mutex<Option<CloseFrame>>,
}

impl SessionLiveness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_alive(&self) -> bool {
        !self.inner.dead.load(Ordering::Acquire)
    }

    pub fn mark_dead(&self) {
        self.inner.dead.store(true, Ordering::Release);
        self.inner.died.notify_waiters();
    }

    /// Resolves once the session has been marked dead.
    pub async fn dead(&self) {
        loop {
            // Registered on creation, so a notify between the check and the await is not lost.
            let died = self.inner.died.notified();
            if !self.is_alive() {
                return;
            }
            died.await;
        }
    }

    /// Marks the session dead and records the close frame the writer should send.
    /// The first recorded frame wins.
    pub fn close_with(&self, code: u16, reason: &'static str) {
        if let Ok(mut frame) = self.inner.close_frame.lock()
            && frame.is_none()
        {
            *frame = Some(CloseFrame {
                code,
                reason: reason.into(),
            });
        }
        self.mark_dead();
    }

    /// Close frame to send when the writer stops; a normal close unless one was recorded.
    pub fn take_close_frame(&self) -> CloseFrame {
        let recorded = self
            .inner
            .close_frame
            .lock()
            .ok()
            .and_then(|mut frame| frame.take());
        recorded.unwrap_or(CloseFrame {
            code: close_code::NORMAL,
            reason: "session closed".into(),
        })
    }
}

/// Result of offering one frame to one session's outbound buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferOutcome {
    Queued,
    // Buffer full; the frame was skipped for this session.
    Dropped,
    // Writer is gone; the session should be pruned.
    Closed,
}

/// Hub-side view of a session: its outbound buffer and the tasks serving it.
#[derive(Debug)]
pub struct SessionHandle {
    id: Uuid,
    outbound: mpsc::Sender<Utf8Bytes>,
    liveness: SessionLiveness,
    tasks: Vec<JoinHandle<()>>,
    dropped: u64,
    last_drop_log: Option<Instant>,
}

impl SessionHandle {
    pub fn new(id: Uuid, outbound: mpsc::Sender<Utf8Bytes>, liveness: SessionLiveness) -> Self {
        Self {
            id,
            outbound,
            liveness,
            tasks: Vec::new(),
            dropped: 0,
            last_drop_log: None,
        }
    }

    /// Attaches a task that is awaited (then aborted) when the hub closes.
    pub fn with_task(mut self, task: JoinHandle<()>) -> Self {
        self.tasks.push(task);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Closes the buffer and aborts the attached tasks.
    pub fn abort(self) {
        self.liveness.mark_dead();
        for task in &self.tasks {
            task.abort();
        }
    }

    fn offer(&mut self, frame: Utf8Bytes) -> OfferOutcome {
        if !self.liveness.is_alive() {
            return OfferOutcome::Closed;
        }
        match self.outbound.try_send(frame) {
            Ok(()) => OfferOutcome::Queued,
            Err(mpsc::error::TrySendError::Full(_)) => {
                self.dropped += 1;
                let log = match self.last_drop_log {
                    Some(at) => at.elapsed() >= DROP_LOG_THROTTLE,
                    None => true,
                };
                if log {
                    self.last_drop_log = Some(Instant::now());
                    warn!(
                        session_id = %self.id,
                        dropped = self.dropped,
                        "outbound buffer full; dropping snapshot"
                    );
                }
                OfferOutcome::Dropped
            }
            Err(mpsc::error::TrySendError::Closed(_)) => OfferOutcome::Closed,
        }
    }
}

/// Counts from a single fan-out pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutReport {
    pub queued: usize,
    pub dropped: usize,
    pub pruned: usize,
}

/// Registry of live sessions. The lock only guards membership and the per-tick walk;
/// nothing awaits while holding it.
#[derive(Debug, Default)]
pub struct SessionHub {
    sessions: Mutex<HashMap<Uuid, SessionHandle>>,
    closed: AtomicBool,
    total_dropped: AtomicU64,
}

impl SessionHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Uuid, SessionHandle>> {
        // A poisoned map is still structurally valid; keep serving.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a session. Once the hub is closed the handle is handed back untouched.
    pub fn register(&self, session: SessionHandle) -> Result<(), SessionHandle> {
        let mut sessions = self.lock();
        if self.closed.load(Ordering::Acquire) {
            debug!(session_id = %session.id, "hub closed; refusing session");
            return Err(session);
        }
        sessions.insert(session.id, session);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Frames dropped across all sessions because their buffers were full.
    pub fn total_dropped(&self) -> u64 {
        self.total_dropped.load(Ordering::Relaxed)
    }

    pub fn dropped_for(&self, id: Uuid) -> Option<u64> {
        self.lock().get(&id).map(SessionHandle::dropped)
    }

    /// Offers one already-encoded frame to every session, pruning dead ones.
    pub fn broadcast(&self, frame: Utf8Bytes) -> FanOutReport {
        let mut report = FanOutReport::default();
        let mut sessions = self.lock();
        sessions.retain(|id, session| match session.offer(frame.clone()) {
            OfferOutcome::Queued => {
                report.queued += 1;
                true
            }
            OfferOutcome::Dropped => {
                report.dropped += 1;
                true
            }
            OfferOutcome::Closed => {
                report.pruned += 1;
                debug!(session_id = %id, "pruning closed session");
                false
            }
        });
        drop(sessions);

        if report.dropped > 0 {
            self.total_dropped
                .fetch_add(report.dropped as u64, Ordering::Relaxed);
        }
        report
    }

    /// Stops accepting sessions, closes every outbound buffer and waits for the
    /// session tasks to finish. Tasks still running after `drain` are aborted.
    pub async fn close_all(&self, drain: Duration) {
        let sessions: Vec<SessionHandle> = {
            let mut map = self.lock();
            self.closed.store(true, Ordering::Release);
            map.drain().map(|(_, session)| session).collect()
        };
        if sessions.is_empty() {
            return;
        }

        let count = sessions.len();
        let mut tasks = Vec::new();
        for session in sessions {
            // Dropping the sender lets each writer flush and send its close frame.
            let SessionHandle {
                outbound,
                tasks: session_tasks,
                ..
            } = session;
            drop(outbound);
            tasks.extend(session_tasks);
        }

        let aborts: Vec<_> = tasks.iter().map(JoinHandle::abort_handle).collect();
        match tokio::time::timeout(drain, futures::future::join_all(tasks)).await {
            Ok(_) => info!(sessions = count, "sessions drained"),
            Err(_) => {
                warn!(
                    sessions = count,
                    drain_ms = drain.as_millis() as u64,
                    "session drain timed out; aborting remaining tasks"
                );
                for abort in aborts {
                    abort.abort();
                }
            }
        }
    }
}

impl SnapshotSink for SessionHub {
    fn publish(&self, snapshot: UniverseSnapshot) {
        if self.is_empty() {
            return;
        }
        let text = match serde_json::to_string(&ServerMessage::game_state(&snapshot)) {
            Ok(text) => text,
            Err(e) => {
                error!(error = ?e, tick = snapshot.tick, "failed to serialize snapshot");
                return;
            }
        };
        let report = self.broadcast(Utf8Bytes::from(text));
        if report.pruned > 0 {
            debug!(
                tick = snapshot.tick,
                pruned = report.pruned,
                remaining = report.queued + report.dropped,
                "pruned sessions during fan-out"
            );
        }
    }
}
