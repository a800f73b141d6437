//! Synchronous change notification.
//!
//! Observers are invoked in registration order, once per committed buffer
//! state, on the thread that made the change. Callbacks only ever see a
//! shared [`ChangeEvent`]; they hold no handle back into the editor, so they
//! cannot re-enter it while a notification is in flight.

use std::fmt;

/// What caused a commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeOrigin {
    /// A recorded user edit.
    Edit,
    /// Programmatic replacement that bypassed history.
    Restore,
    /// Undo restored an earlier snapshot.
    Undo,
    /// Redo re-applied a snapshot.
    Redo,
    /// Full replacement from the file loader.
    Load,
}

impl fmt::Display for ChangeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChangeOrigin::Edit => "edit",
            ChangeOrigin::Restore => "restore",
            ChangeOrigin::Undo => "undo",
            ChangeOrigin::Redo => "redo",
            ChangeOrigin::Load => "load",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub content: String,
    pub origin: ChangeOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&ChangeEvent)>;

#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    observers: Vec<(SubscriptionId, Callback)>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, Box::new(callback)));
        id
    }

    /// Returns `false` when `id` was not (or is no longer) registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }

    pub fn notify(&mut self, event: &ChangeEvent) {
        for (_, observer) in self.observers.iter_mut() {
            observer(event);
        }
    }
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("observers", &self.observers.len())
            .finish()
    }
}
