//! Debouncing for rapidly changing values.
//!
//! [`Debounce`] is a single-slot timer: arming it with a new value replaces
//! whatever was pending and restarts the quiet period. It holds no clock of
//! its own, so callers drive it with instants and can test it without
//! sleeping. [`Debounced`] drives the slot from a tokio timer and turns a
//! stream of raw values into a stream of settled ones.

use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::time::{Instant, Sleep};

/// Single-slot debounce timer
#[derive(Debug, Clone)]
pub struct Debounce<T> {
    delay: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Replace the pending value and restart the quiet period from `now`
    pub fn arm(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.delay));
    }

    /// Drop the pending value, if any
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(value, _)| value)
    }

    /// When the pending value settles
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, deadline)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Take the pending value once its quiet period has elapsed
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((_, deadline)) if now >= deadline => self.cancel(),
            _ => None,
        }
    }
}

/// Stream adapter yielding each value only after `delay` passes with no newer value.
///
/// A value arriving at the very instant the timer fires replaces the pending
/// one. Dropping the adapter discards any pending value.
pub struct Debounced<S: Stream> {
    input: Pin<Box<S>>,
    slot: Debounce<S::Item>,
    sleep: Pin<Box<Sleep>>,
    input_done: bool,
    /// Timer has fired; settle on the next poll unless input arrives first
    due: bool,
}

/// Debounce a value stream
pub fn debounced<S: Stream>(input: S, delay: Duration) -> Debounced<S> {
    Debounced {
        input: Box::pin(input),
        slot: Debounce::new(delay),
        sleep: Box::pin(tokio::time::sleep(delay)),
        input_done: false,
        due: false,
    }
}

impl<S> Stream for Debounced<S>
where
    S: Stream,
    S::Item: Unpin,
{
    type Item = S::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        // Drain everything the input has ready; only the newest value survives.
        while !this.input_done {
            match this.input.as_mut().poll_next(cx) {
                Poll::Ready(Some(value)) => {
                    let now = Instant::now();
                    this.slot.arm(value, now);
                    this.sleep.as_mut().reset(now + this.slot.delay());
                    this.due = false;
                }
                Poll::Ready(None) => this.input_done = true,
                Poll::Pending => break,
            }
        }

        if this.slot.is_pending() {
            if this.sleep.as_mut().poll(cx).is_ready() {
                // Let tasks woken at the same instant deliver their input first.
                if !this.due {
                    this.due = true;
                    cx.waker().wake_by_ref();
                    return Poll::Pending;
                }
                this.due = false;
                if let Some(value) = this.slot.take_due(Instant::now()) {
                    return Poll::Ready(Some(value));
                }
            }
            return Poll::Pending;
        }

        if this.input_done {
            Poll::Ready(None)
        } else {
            Poll::Pending
        }
    }
}
