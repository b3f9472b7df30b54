//! Change notification handles
//!
//! A [`Subscription`] observes one value owned by a store. Only the latest
//! value is retained; a slow listener sees the most recent state, not every
//! intermediate one.

use tokio::sync::watch;

/// Listener handle for a store-owned value.
///
/// Dropping the handle unsubscribes.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: watch::Receiver<T>,
}

impl<T: Clone> Subscription<T> {
    pub(crate) fn new(rx: watch::Receiver<T>) -> Self {
        Self { rx }
    }

    /// The value as of now, marking it seen.
    pub fn current(&mut self) -> T {
        self.rx.borrow_and_update().clone()
    }

    /// True if a new value was published since the last [`current`](Self::current).
    ///
    /// Also true once the owning store is gone, so a polling loop terminates.
    pub fn has_changed(&self) -> bool {
        self.rx.has_changed().unwrap_or(true)
    }

    /// Take the next unseen value, if any.
    pub fn try_next(&mut self) -> Option<T> {
        match self.rx.has_changed() {
            Ok(true) => Some(self.current()),
            _ => None,
        }
    }

    /// Wait for the next published value. `None` once the store is dropped.
    pub async fn changed(&mut self) -> Option<T> {
        self.rx.changed().await.ok()?;
        Some(self.current())
    }

    pub fn unsubscribe(self) {}
}

/// Owner side: holds the current value and fans it out to subscribers.
#[derive(Debug)]
pub(crate) struct Publisher<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Publisher<T> {
    pub(crate) fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub(crate) fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Replace the value, whether or not anyone is listening.
    pub(crate) fn publish(&self, value: T) {
        self.tx.send_replace(value);
    }

    pub(crate) fn subscribe(&self) -> Subscription<T> {
        Subscription::new(self.tx.subscribe())
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_subscribers() {
        let publisher = Publisher::new(1);
        let mut sub = publisher.subscribe();
        assert!(!sub.has_changed());
        assert_eq!(sub.current(), 1);

        publisher.publish(2);
        publisher.publish(3);
        assert_eq!(sub.try_next(), Some(3));
        assert_eq!(sub.try_next(), None);
    }

    #[test]
    fn test_unsubscribe_drops_receiver() {
        let publisher = Publisher::new("a");
        let sub = publisher.subscribe();
        assert_eq!(publisher.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(publisher.subscriber_count(), 0);

        publisher.publish("b");
        assert_eq!(publisher.get(), "b");
    }

    #[test]
    fn test_dropped_publisher_ends_subscription() {
        let publisher = Publisher::new(0u8);
        let sub = publisher.subscribe();
        drop(publisher);
        assert!(sub.has_changed());
    }
}
