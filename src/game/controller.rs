//! Game controller - the single scheduler that drives a session
//!
//! Commands, voice intents and timer checkpoints all land on one task and
//! are applied to the [`GameMachine`] in arrival order.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::announce::Announcer;
use crate::voice::Intent;
use crate::{Error, Result};

use super::machine::{Checkpoint, Effect, GameMachine, Session, Timer};

/// Requests accepted by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Restart,
    Intent(Intent),
    SetPause(u8),
    Shutdown,
}

#[derive(Debug)]
enum Event {
    Command(Command),
    Timer(Timer),
    IntentsClosed,
}

/// Cloneable handle for sending commands to a running controller
#[derive(Debug, Clone)]
pub struct GameHandle {
    tx: mpsc::UnboundedSender<Event>,
    playing: Arc<AtomicBool>,
}

impl GameHandle {
    /// Send a command
    ///
    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn send(&self, command: Command) -> Result<()> {
        self.tx
            .send(Event::Command(command))
            .map_err(|_| Error::ControllerStopped)
    }

    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn start_game(&self) -> Result<()> {
        self.send(Command::Start)
    }

    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn stop_game(&self) -> Result<()> {
        self.send(Command::Stop)
    }

    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn restart_game(&self) -> Result<()> {
        self.send(Command::Restart)
    }

    /// # Errors
    ///
    /// Returns error if the controller has shut down
    pub fn set_pause_duration(&self, secs: u8) -> Result<()> {
        self.send(Command::SetPause(secs))
    }

    /// Live playing flag, updated on every transition
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

/// Owns the scheduler task of one game session
pub struct GameController {
    handle: GameHandle,
    state: watch::Receiver<Session>,
    task: Option<JoinHandle<()>>,
}

impl GameController {
    /// Spawn the scheduler on the current tokio runtime
    ///
    /// Voice intents from `intents` are bound for the lifetime of the
    /// controller.
    pub fn spawn<R>(
        pause_duration_secs: u8,
        rng: R,
        announcer: Arc<dyn Announcer>,
        intents: Option<mpsc::UnboundedReceiver<Intent>>,
    ) -> Self
    where
        R: Rng + Send + 'static,
    {
        let machine = GameMachine::new(pause_duration_secs, rng);
        let (tx, rx) = mpsc::unbounded_channel();
        let (state_tx, state) = watch::channel(machine.session().clone());
        let playing = Arc::new(AtomicBool::new(false));

        let scheduler = Scheduler {
            machine,
            timers: tx.downgrade(),
            state: state_tx,
            playing: Arc::clone(&playing),
            announcer,
            tick_timer: None,
        };
        let task = tokio::spawn(scheduler.run(rx, intents));

        Self {
            handle: GameHandle { tx, playing },
            state,
            task: Some(task),
        }
    }

    #[must_use]
    pub fn handle(&self) -> GameHandle {
        self.handle.clone()
    }

    /// Watch session snapshots
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.clone()
    }

    /// Latest session snapshot
    #[must_use]
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Stop the scheduler and wait for it to exit
    pub async fn shutdown(mut self) {
        let _ = self.handle.send(Command::Shutdown);
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "game scheduler exited abnormally");
            }
        }
    }
}

impl Drop for GameController {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl std::ops::Deref for GameController {
    type Target = GameHandle;

    fn deref(&self) -> &GameHandle {
        &self.handle
    }
}

struct Scheduler<R> {
    machine: GameMachine<R>,
    timers: mpsc::WeakUnboundedSender<Event>,
    state: watch::Sender<Session>,
    playing: Arc<AtomicBool>,
    announcer: Arc<dyn Announcer>,
    tick_timer: Option<JoinHandle<()>>,
}

impl<R: Rng> Scheduler<R> {
    async fn run(
        mut self,
        mut rx: mpsc::UnboundedReceiver<Event>,
        mut intents: Option<mpsc::UnboundedReceiver<Intent>>,
    ) {
        tracing::debug!("game scheduler running");

        loop {
            let event = tokio::select! {
                event = rx.recv() => event,
                intent = next_intent(&mut intents) => Some(
                    intent.map_or(Event::IntentsClosed, |i| Event::Command(Command::Intent(i))),
                ),
            };
            let Some(event) = event else {
                break;
            };

            let effects = match event {
                Event::Command(Command::Start) => self.machine.start_game(),
                Event::Command(Command::Stop) => self.machine.stop_game(),
                Event::Command(Command::Restart) => self.machine.restart_game(),
                Event::Command(Command::Intent(intent)) => {
                    tracing::info!(%intent, "voice command");
                    self.machine.apply_intent(intent)
                }
                Event::Command(Command::SetPause(secs)) => {
                    self.machine.set_pause_duration(secs);
                    Vec::new()
                }
                Event::Command(Command::Shutdown) => break,
                Event::Timer(timer) => self.machine.fire(timer),
                Event::IntentsClosed => {
                    tracing::debug!("voice intents closed");
                    intents = None;
                    continue;
                }
            };

            self.publish();
            for effect in effects {
                self.apply(effect);
            }
        }

        self.cancel_ticks();
        tracing::debug!("game scheduler stopped");
    }

    fn publish(&self) {
        let session = self.machine.session();
        self.playing.store(session.is_playing(), Ordering::SeqCst);
        self.state.send_if_modified(|current| {
            if current == session {
                false
            } else {
                current.clone_from(session);
                true
            }
        });
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::Schedule { timer, delay } => {
                let Some(tx) = self.timers.upgrade() else {
                    return;
                };
                let handle = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(Event::Timer(timer));
                });
                if timer.checkpoint == Checkpoint::Tick {
                    self.tick_timer = Some(handle);
                }
            }
            Effect::CancelTicks => self.cancel_ticks(),
            Effect::Announce(combination) => self.announcer.announce(combination),
        }
    }

    fn cancel_ticks(&mut self) {
        if let Some(handle) = self.tick_timer.take() {
            handle.abort();
        }
    }
}

async fn next_intent(intents: &mut Option<mpsc::UnboundedReceiver<Intent>>) -> Option<Intent> {
    match intents {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
