//! In-process bus backed by `std::sync::mpsc` channels.

use std::convert::Infallible;
use std::sync::{Mutex, MutexGuard, PoisonError, mpsc};

use crate::bus::{EventBus, Subscription};

/// Fan-out to every live subscriber; dropped subscriptions are pruned on publish.
///
/// The subscriber list is only ever pushed to or filtered, so a panic while it was
/// held leaves it usable. A poisoned lock is recovered instead of dropping the
/// subscription or the message.
#[derive(Debug)]
pub struct InMemoryEventBus<M> {
    subscribers: Mutex<Vec<mpsc::Sender<M>>>,
}

impl<M> InMemoryEventBus<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of subscriptions still attached.
    pub fn subscriber_count(&self) -> usize {
        self.senders().len()
    }

    fn senders(&self) -> MutexGuard<'_, Vec<mpsc::Sender<M>>> {
        self.subscribers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<M> Default for InMemoryEventBus<M> {
    fn default() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }
}

impl<M> EventBus<M> for InMemoryEventBus<M>
where
    M: Clone + Send + 'static,
{
    type Error = Infallible;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        self.senders().retain(|tx| tx.send(message.clone()).is_ok());
        Ok(())
    }

    fn subscribe(&self) -> Subscription<M> {
        let (tx, rx) = mpsc::channel();
        self.senders().push(tx);
        Subscription::new(rx)
    }
}
