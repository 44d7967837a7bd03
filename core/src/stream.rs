//! Replay-latest state streams with per-consumer teardown.
//!
//! # Design
//! `StateStream` wraps a `tokio::sync::watch` channel: a new subscriber sees
//! the current value immediately, and a slow subscriber only ever observes
//! the latest value, never a backlog. Every `Subscription` is tied to a
//! `Teardown`; once it fires (or is dropped) the subscription yields nothing
//! further, which is how a consumer that has gone away stops receiving
//! updates.

use tokio::sync::watch;

/// A hot stream that always holds a current value.
#[derive(Debug)]
pub struct StateStream<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> StateStream<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Replace the current value and notify subscribers.
    pub fn publish(&self, value: T) {
        self.tx.send_replace(value);
    }

    pub fn current(&self) -> T {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self, teardown: &TeardownSignal) -> Subscription<T> {
        Subscription {
            rx: self.tx.subscribe(),
            teardown: teardown.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Owned by a consumer; firing or dropping it ends all its subscriptions.
#[derive(Debug)]
pub struct Teardown {
    tx: watch::Sender<bool>,
}

impl Default for Teardown {
    fn default() -> Self {
        Self::new()
    }
}

impl Teardown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> TeardownSignal {
        TeardownSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn fire(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_fired(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Read side of a `Teardown`.
#[derive(Debug, Clone)]
pub struct TeardownSignal {
    rx: watch::Receiver<bool>,
}

impl TeardownSignal {
    pub fn is_torn_down(&self) -> bool {
        *self.rx.borrow() || self.rx.has_changed().is_err()
    }

    /// Resolves once the teardown fires or its owner is dropped.
    pub async fn torn_down(&mut self) {
        loop {
            let fired = *self.rx.borrow_and_update();
            if fired || self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

#[derive(Debug)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
    teardown: TeardownSignal,
}

impl<T: Clone> Subscription<T> {
    pub fn is_active(&self) -> bool {
        !self.teardown.is_torn_down()
    }

    /// The current value, or `None` after teardown.
    pub fn latest(&self) -> Option<T> {
        self.is_active().then(|| self.rx.borrow().clone())
    }

    /// The latest value if it changed since last seen, without waiting.
    pub fn next_change(&mut self) -> Option<T> {
        if !self.is_active() {
            return None;
        }
        match self.rx.has_changed() {
            Ok(true) => Some(self.rx.borrow_and_update().clone()),
            _ => None,
        }
    }

    /// Wait for the next value. `None` once torn down or the stream closes.
    pub async fn changed(&mut self) -> Option<T> {
        if !self.is_active() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.teardown.torn_down() => None,
            result = self.rx.changed() => match result {
                Ok(()) => Some(self.rx.borrow_and_update().clone()),
                Err(_) => None,
            },
        }
    }
}
