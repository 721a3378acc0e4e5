//! Publish/subscribe state cell.

use tokio::sync::watch;

/// A single observable value.
///
/// Owners publish with [`set`](StateCell::set) or
/// [`update`](StateCell::update); readers clone the current value or
/// subscribe for change notifications. Receivers handed out by
/// [`subscribe`](StateCell::subscribe) are read-only, so only the owning
/// store can mutate the value.
///
/// Each cell carries its own lock, which keeps the three stores of the
/// dashboard independently guarded.
#[derive(Debug)]
pub struct StateCell<T> {
    sender: watch::Sender<T>,
}

impl<T: Clone> StateCell<T> {
    pub fn new(initial: T) -> Self {
        let (sender, _) = watch::channel(initial);
        Self { sender }
    }

    /// Returns a clone of the current value.
    pub fn get(&self) -> T {
        self.sender.borrow().clone()
    }

    /// Reads the current value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.sender.borrow())
    }

    /// Replaces the value and notifies subscribers.
    pub fn set(&self, value: T) {
        self.sender.send_replace(value);
    }

    /// Derives the next value from the current one and publishes it.
    ///
    /// The closure runs under the cell's lock, so concurrent updates are
    /// serialized.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.sender.send_modify(f);
    }

    /// Returns a receiver that observes every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.sender.subscribe()
    }
}

impl<T: Clone + Default> Default for StateCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
