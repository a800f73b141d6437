/// Tracks whether the buffer has been committed to since the last load or save.
///
/// The flag is event driven: any committed mutation sets it and only
/// [`DirtyTracker::on_persisted`] clears it. The persisted text is kept so
/// hosts can diff unsaved work against it.
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    dirty: bool,
    persisted: Option<String>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn on_mutation_committed(&mut self) {
        self.dirty = true;
    }

    pub fn on_persisted(&mut self, snapshot: String) {
        self.dirty = false;
        self.persisted = Some(snapshot);
    }

    /// Text as of the last load or save, if any happened.
    pub fn persisted_snapshot(&self) -> Option<&str> {
        self.persisted.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle() {
        let mut tracker = DirtyTracker::new();
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.persisted_snapshot(), None);

        tracker.on_mutation_committed();
        assert!(tracker.is_dirty());
        assert!(tracker.is_dirty(), "reading must not reset the flag");

        tracker.on_persisted("saved".into());
        assert!(!tracker.is_dirty());
        assert_eq!(tracker.persisted_snapshot(), Some("saved"));
    }
}
