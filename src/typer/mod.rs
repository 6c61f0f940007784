//! Macro typer: types a key sequence on a background task
//!
//! ```text
//!  start(seq) ──► [wait] ──► token ──► press ─50ms─► release ──► [pace] ──► next token
//!                   │           │                                   │
//!                   └───────────┴──── cancelled / unknown key ──────┴──► outcome
//! ```
//!
//! The task never touches events itself. Each press and release travels as a
//! [`KeyPress`] over a channel to the owner of the mapper context, which runs
//! it through the `key_<token>` event and answers whether that event exists.
//! The owner must keep draining the channel while a run is in flight,
//! including while `start` or `stop` wait for a previous run.
//!
//! Only one run is in flight at a time. Starting a new run first waits for
//! the previous one, and `stop` waits until the task has observed the
//! cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// How long each typed key stays down
const KEY_HOLD: Duration = Duration::from_millis(50);

/// Token that pauses for one extra pace interval instead of typing
const PAUSE_TOKEN: &str = ",";

/// Key token held around single uppercase letters
const SHIFT_TOKEN: &str = "lshift";

/// Presses queued before the typer waits on the owner
const PRESS_QUEUE: usize = 32;

#[derive(Debug, Error)]
pub enum TyperError {
    #[error("Nothing to type")]
    EmptySequence,

    #[error("Typer task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// How a run ended. `typed` counts the keys that were pressed and released.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypingOutcome {
    Completed { typed: usize },
    Cancelled { typed: usize },
    /// A token named no known key, nothing after it was typed
    Aborted { typed: usize, token: String },
}

/// One press or release of the event `key_<token>`
#[derive(Debug)]
pub struct KeyPress {
    pub token: String,
    pub pressed: bool,
    reply: oneshot::Sender<bool>,
}

impl KeyPress {
    pub fn event_name(&self) -> String {
        format!("key_{}", self.token.to_lowercase())
    }

    /// Answers the typer. `found` is false when no such key event exists.
    pub fn reply(self, found: bool) {
        if self.reply.send(found).is_err() {
            debug!("Typer went away before key_{} was answered", self.token);
        }
    }
}

/// Sending side of the press channel, handed to each run
#[derive(Clone, Debug)]
pub struct TypingKeys {
    presses: mpsc::Sender<KeyPress>,
}

impl TypingKeys {
    /// New press channel. The receiver belongs to whoever owns the mapper context.
    pub fn channel() -> (Self, mpsc::Receiver<KeyPress>) {
        let (presses, receiver) = mpsc::channel(PRESS_QUEUE);
        (Self { presses }, receiver)
    }

    /// Sends one press and waits for the answer. A closed channel counts as unknown.
    async fn send(&self, token: &str, pressed: bool) -> bool {
        let (reply, answer) = oneshot::channel();
        let press = KeyPress {
            token: token.to_string(),
            pressed,
            reply,
        };
        if self.presses.send(press).await.is_err() {
            warn!("Key press receiver is gone");
            return false;
        }
        answer.await.unwrap_or(false)
    }
}

/// Single uppercase letters are typed with shift held
fn needs_shift(token: &str) -> bool {
    let mut chars = token.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

#[derive(Debug, Default)]
pub struct MacroTyper {
    cancel: CancellationToken,
    task: Option<JoinHandle<TypingOutcome>>,
}

impl MacroTyper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts typing `sequence` after `wait_ms`, `pace_ms` apart. Setting
    /// `cancel_flag` stops the run at its next pause.
    pub async fn start(
        &mut self,
        keys: TypingKeys,
        sequence: Vec<String>,
        wait_ms: u64,
        pace_ms: u64,
        cancel_flag: Arc<AtomicBool>,
    ) -> Result<(), TyperError> {
        if sequence.is_empty() {
            return Err(TyperError::EmptySequence);
        }
        if let Some(previous) = self.wait().await? {
            debug!("Previous typing run ended: {:?}", previous);
        }

        self.cancel = CancellationToken::new();
        let run = TypingRun {
            keys,
            cancel: self.cancel.clone(),
            flag: cancel_flag,
            pace: Duration::from_millis(pace_ms),
        };
        info!("Typing {} token(s)", sequence.len());
        self.task = Some(tokio::spawn(async move {
            run.type_sequence(sequence, Duration::from_millis(wait_ms))
                .await
        }));
        Ok(())
    }

    /// Waits for the current run, if any
    pub async fn wait(&mut self) -> Result<Option<TypingOutcome>, TyperError> {
        let Some(task) = self.task.take() else {
            return Ok(None);
        };
        match task.await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(e) => {
                error!("Typer task panicked: {}", e);
                Err(TyperError::TaskFailed(e))
            }
        }
    }

    /// Requests cancellation and waits until the run has stopped
    pub async fn stop(&mut self) -> Result<Option<TypingOutcome>, TyperError> {
        self.cancel.cancel();
        self.wait().await
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }
}

struct TypingRun {
    keys: TypingKeys,
    cancel: CancellationToken,
    flag: Arc<AtomicBool>,
    pace: Duration,
}

impl TypingRun {
    fn cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.flag.load(Ordering::Relaxed)
    }

    /// Sleeps unless cancelled. Returns false once the run must stop.
    async fn pause(&self, duration: Duration) -> bool {
        if self.cancelled() {
            return false;
        }
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => !self.cancelled(),
        }
    }

    async fn type_sequence(self, sequence: Vec<String>, wait: Duration) -> TypingOutcome {
        let mut typed = 0;
        if !self.pause(wait).await {
            return TypingOutcome::Cancelled { typed };
        }

        for token in sequence {
            if token == PAUSE_TOKEN {
                if !self.pause(self.pace).await {
                    return TypingOutcome::Cancelled { typed };
                }
                continue;
            }

            let shifted = needs_shift(&token);
            if shifted && !self.keys.send(SHIFT_TOKEN, true).await {
                warn!(
                    "No key_{} to type \"{}\", typing aborted after {} key(s)",
                    SHIFT_TOKEN, token, typed
                );
                return TypingOutcome::Aborted { typed, token };
            }
            if !self.keys.send(&token, true).await {
                if shifted {
                    self.keys.send(SHIFT_TOKEN, false).await;
                }
                warn!("No key for \"{}\", typing aborted after {} key(s)", token, typed);
                return TypingOutcome::Aborted { typed, token };
            }
            tokio::time::sleep(KEY_HOLD).await;
            self.keys.send(&token, false).await;
            if shifted {
                self.keys.send(SHIFT_TOKEN, false).await;
            }
            typed += 1;

            if !self.pause(self.pace).await {
                return TypingOutcome::Cancelled { typed };
            }
        }
        TypingOutcome::Completed { typed }
    }
}
