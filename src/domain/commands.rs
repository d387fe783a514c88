// Deferred mutation intents and the bounded queue that carries them into the tick.
//
// The queue is the only way for anything outside the tick loop to touch universe state.

use super::body::{Body, BodyId};
use super::math::Vector;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

const FULL_LOG_THROTTLE: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    /// Randomly sized body that can rival the heaviest one.
    Threat,
    /// Small body seeded into orbit around the heaviest one.
    Food,
}

#[derive(Debug)]
pub enum Command {
    AddBody {
        body: Body,
        // Receives the id once the body is in the universe.
        assigned: Option<oneshot::Sender<BodyId>>,
    },
    SpawnPlayer {
        assigned: oneshot::Sender<BodyId>,
    },
    SetThrust {
        id: BodyId,
        thrust: Vector,
    },
    RemoveBody {
        id: BodyId,
    },
    Spawn(SpawnKind),
}

impl Command {
    pub fn add_body(body: Body) -> Self {
        Command::AddBody {
            body,
            assigned: None,
        }
    }

    /// Thrust command for a player body. A zero vector clears thrust.
    pub fn thrust(id: BodyId, thrust: Vector) -> Self {
        Command::SetThrust { id, thrust }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum SubmitError {
    /// Queue at capacity; the command was dropped.
    Full,
    /// The universe owning the queue is gone.
    Closed,
}

/// Producer side of the command queue. Cheap to clone; never blocks.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
    last_full_log: Arc<Mutex<Option<Instant>>>,
}

impl CommandSender {
    /// Enqueues a command, dropping it if the queue is full.
    pub fn submit(&self, command: Command) -> Result<(), SubmitError> {
        match self.tx.try_send(command) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                if self.should_log_full() {
                    warn!(command = ?dropped, "command queue full; dropping command");
                }
                Err(SubmitError::Full)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => Err(SubmitError::Closed),
        }
    }

    fn should_log_full(&self) -> bool {
        let Ok(mut last) = self.last_full_log.lock() else {
            return true;
        };
        match *last {
            Some(at) if at.elapsed() < FULL_LOG_THROTTLE => false,
            _ => {
                *last = Some(Instant::now());
                true
            }
        }
    }
}

/// Consumer side, owned by the universe.
#[derive(Debug)]
pub struct CommandQueue {
    tx: mpsc::Sender<Command>,
    rx: mpsc::Receiver<Command>,
    last_full_log: Arc<Mutex<Option<Instant>>>,
}

impl CommandQueue {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        Self {
            tx,
            rx,
            last_full_log: Arc::new(Mutex::new(None)),
        }
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
            last_full_log: self.last_full_log.clone(),
        }
    }

    /// Number of commands waiting right now.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Takes every command that was queued when the call started, in FIFO order.
    ///
    /// Commands enqueued while the batch is being run wait for the next drain.
    pub fn take_batch(&mut self) -> Vec<Command> {
        let pending = self.pending();
        let mut batch = Vec::with_capacity(pending);
        for _ in 0..pending {
            match self.rx.try_recv() {
                Ok(command) => batch.push(command),
                Err(_) => break,
            }
        }
        batch
    }
}
