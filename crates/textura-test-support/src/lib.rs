//! Shared test harness utilities for Textura crates.

use std::cell::RefCell;
use std::rc::Rc;

use textura_config::Config;
use textura_core::{ChangeEvent, Editor};

/// Baseline configuration that ignores any `.textura.toml` on disk.
pub fn test_config() -> Config {
    Config::builtin()
}

/// A short document exercising headings, a table, a bare URL and a code fence.
pub const SAMPLE_DOCUMENT: &str = "# Notes\n\
\n\
See https://example.com for details.\n\
\n\
| Name | Value |\n\
|------|-------|\n\
| a    | 1     |\n\
\n\
```ruby\n\
puts 1\n\
```\n";

/// Collects every change notification an editor emits.
#[derive(Clone, Default)]
pub struct RecordingObserver {
    events: Rc<RefCell<Vec<ChangeEvent>>>,
}

impl RecordingObserver {
    /// Subscribe a fresh recorder to `editor`.
    pub fn attach(editor: &mut Editor) -> Self {
        let recorder = Self::default();
        let sink = Rc::clone(&recorder.events);
        editor.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        recorder
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events.borrow().clone()
    }

    pub fn contents(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .map(|event| event.content.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }
}
