//! Typed publish/subscribe over std channels.
//!
//! Every component that emits notifications owns an [`EventBus`] over its own
//! closed event enum. Subscribers hold the receiving end and drain it on their
//! own schedule; dropped receivers are pruned on the next emit.

use std::sync::mpsc;

use tracing::trace;

#[derive(Debug)]
pub struct EventBus<E> {
    subscribers: Vec<mpsc::Sender<E>>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self { subscribers: Vec::new() }
    }
}

impl<E: Clone> EventBus<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<E> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn emit(&mut self, event: E) {
        let before = self.subscribers.len();
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        let dropped = before - self.subscribers.len();
        if dropped > 0 {
            trace!(dropped, "pruned closed subscribers");
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
