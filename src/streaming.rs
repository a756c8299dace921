//! Character-by-character reveal of a completed response
//!
//! One character is committed per step. Each step first waits for a delay
//! derived from the previously revealed character, then re-checks
//! cancellation before committing, so a stop overshoots by at most the
//! step already in progress.

use async_trait::async_trait;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(15);

/// Pause before revealing the next character, given the one just revealed
pub fn delay_after(previous: Option<char>, base: Duration) -> Duration {
    match previous {
        Some('.') => base * 3,
        Some(',') => base * 2,
        Some('!' | '?') => base * 4,
        _ => base,
    }
}

/// Source of suspension between reveal steps
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, delay: Duration);
}

/// Real-time scheduler backed by the Tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Completed,
    Cancelled,
}

/// Reveal state for one response
#[derive(Debug)]
pub struct Reveal {
    text: Vec<char>,
    revealed: String,
    revealed_count: usize,
    cancel: CancellationToken,
}

impl Reveal {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.chars().collect(),
            revealed: String::with_capacity(text.len()),
            revealed_count: 0,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that cancels this reveal when triggered
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the reveal; the committed prefix stays as it is
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed_count
    }

    pub fn revealed(&self) -> &str {
        &self.revealed
    }

    pub fn is_finished(&self) -> bool {
        self.revealed_count == self.text.len()
    }

    /// Drive the reveal to completion or cancellation.
    ///
    /// `commit` receives every new prefix; returning `false` refuses the
    /// update and ends the reveal as cancelled. An empty text finishes
    /// without a single scheduled step.
    pub async fn start<S, F>(&mut self, scheduler: &S, base: Duration, mut commit: F) -> RevealOutcome
    where
        S: Scheduler + ?Sized,
        F: FnMut(&str) -> bool + Send,
    {
        while let Some(&next) = self.text.get(self.revealed_count) {
            if self.is_cancelled() {
                return RevealOutcome::Cancelled;
            }

            let previous = self
                .revealed_count
                .checked_sub(1)
                .and_then(|i| self.text.get(i))
                .copied();
            let delay = delay_after(previous, base);

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return RevealOutcome::Cancelled,
                () = scheduler.sleep(delay) => {}
            }

            if self.is_cancelled() {
                return RevealOutcome::Cancelled;
            }

            self.revealed.push(next);
            if !commit(&self.revealed) {
                self.revealed.pop();
                self.cancel();
                return RevealOutcome::Cancelled;
            }
            self.revealed_count += 1;
        }
        RevealOutcome::Completed
    }
}
