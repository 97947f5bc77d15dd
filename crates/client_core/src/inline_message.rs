//! Single-slot outcome message shown next to the control that triggered it.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{runtime::Handle, task::JoinHandle, time::Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineMessageKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineMessage {
    pub text: String,
    pub kind: InlineMessageKind,
}

impl InlineMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: InlineMessageKind::Success,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: InlineMessageKind::Error,
        }
    }
}

#[derive(Default)]
struct SlotState {
    current: Option<InlineMessage>,
    // Bumped on every write; a timer only clears the generation it was armed for.
    generation: u64,
    timer: Option<JoinHandle<()>>,
}

/// Last-write-wins message slot with an optional auto-clear timer per write.
#[derive(Clone, Default)]
pub struct InlineMessageSlot {
    state: Arc<Mutex<SlotState>>,
}

impl InlineMessageSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<InlineMessage> {
        self.lock().current.clone()
    }

    /// Overwrites the slot and returns the generation of the new message. Any
    /// timer armed by an earlier write is cancelled.
    pub fn set(&self, message: InlineMessage, auto_clear: Option<Duration>) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        let generation = state.generation;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        debug!(
            kind = ?message.kind,
            auto_clear_ms = auto_clear.map(|d| d.as_millis() as u64),
            "inline message: set"
        );
        state.current = Some(message);

        if let Some(delay) = auto_clear {
            self.arm(&mut state, generation, delay);
        }
        generation
    }

    /// Starts the auto-clear countdown for the message written at `generation`.
    /// Returns `false` when the slot has been written or cleared since.
    pub fn clear_after(&self, generation: u64, delay: Duration) -> bool {
        let mut state = self.lock();
        if state.generation != generation || state.current.is_none() {
            return false;
        }
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        self.arm(&mut state, generation, delay);
        true
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.generation += 1;
        if let Some(timer) = state.timer.take() {
            timer.abort();
        }
        state.current = None;
    }

    fn arm(&self, state: &mut SlotState, generation: u64, delay: Duration) {
        let Some(deadline) = Instant::now().checked_add(delay) else {
            debug!(generation, "inline message: delay out of range, kept until overwritten");
            return;
        };
        match Handle::try_current() {
            Ok(handle) => {
                let slot = self.clone();
                state.timer = Some(handle.spawn(async move {
                    tokio::time::sleep_until(deadline).await;
                    slot.clear_generation(generation);
                }));
            }
            Err(_) => warn!("inline message: no runtime available, auto-clear skipped"),
        }
    }

    fn clear_generation(&self, generation: u64) {
        let mut state = self.lock();
        if state.generation != generation {
            return;
        }
        state.current = None;
        state.timer = None;
        debug!(generation, "inline message: auto-cleared");
    }

    fn lock(&self) -> MutexGuard<'_, SlotState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/inline_message_tests.rs"]
mod tests;
