use tokio::sync::broadcast;

/// Kind of row-level mutation carried by a change event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// A new row was inserted.
    Insert,
    /// An existing row was updated.
    Update,
}

/// Row-level mutation delivered to change feed subscribers.
///
/// Delivery is at-least-once with no ordering guarantee across rows; the
/// payload is always the full row after the mutation, so subscribers can
/// re-derive their state from the latest event alone.
#[derive(Debug, Clone)]
pub struct ChangeEvent<T> {
    /// Whether the row was inserted or updated.
    pub kind: ChangeKind,
    /// The row after the mutation.
    pub row: T,
}

/// Broadcast hub fanning out change events for one filtered subscription,
/// e.g. all mutations of a single game row.
pub struct FeedHub<T> {
    sender: broadcast::Sender<ChangeEvent<T>>,
}

impl<T: Clone> FeedHub<T> {
    /// Construct a hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Register a subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent<T>> {
        self.sender.subscribe()
    }

    /// Publish an event to all current subscribers, ignoring delivery errors.
    pub fn publish(&self, kind: ChangeKind, row: T) {
        let _ = self.sender.send(ChangeEvent { kind, row });
    }
}
