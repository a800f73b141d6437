//! The editor core: one buffer, its history, its observers and its preview.

use std::path::{Path, PathBuf};

use textura_config::Config;
use tracing::debug;

use crate::buffer::Buffer;
use crate::diff::unsaved_changes_diff;
use crate::dirty::DirtyTracker;
use crate::error::EditorResult;
use crate::fs::DocumentFile;
use crate::history::{History, HistoryLimit};
use crate::notify::{ChangeEvent, ChangeNotifier, ChangeOrigin, SubscriptionId};
use crate::render::{RenderOptions, Renderer};
use crate::script::ScriptCommand;

#[derive(Debug, Clone, Default)]
pub struct EditorOptions {
    pub history_limit: HistoryLimit,
    pub render: RenderOptions,
}

impl EditorOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            history_limit: HistoryLimit::from_setting(config.history.limit),
            render: RenderOptions::from(&config.render),
        }
    }
}

/// Owns the document text exclusively.
///
/// Every change goes through [`Editor::set_content`] (or the restore paths
/// built on the same commit step), which updates history, flips the dirty
/// flag and notifies observers before returning.
#[derive(Debug, Default)]
pub struct Editor {
    buffer: Buffer,
    history: History,
    notifier: ChangeNotifier,
    dirty: DirtyTracker,
    renderer: Renderer,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(initial: impl Into<String>) -> Self {
        Self {
            buffer: Buffer::new(initial),
            ..Self::default()
        }
    }

    pub fn with_options(options: EditorOptions) -> Self {
        Self {
            history: History::with_limit(options.history_limit),
            renderer: Renderer::new(options.render),
            ..Self::default()
        }
    }

    pub fn content(&self) -> &str {
        self.buffer.content()
    }

    pub fn snapshot(&self) -> String {
        self.buffer.snapshot()
    }

    /// Replace the buffer.
    ///
    /// With `record_history` the previous text becomes the newest undo step
    /// and the redo stack is dropped. Without it neither stack is touched.
    /// Observers are notified exactly once either way.
    pub fn set_content(&mut self, text: impl Into<String>, record_history: bool) {
        let origin = if record_history {
            ChangeOrigin::Edit
        } else {
            ChangeOrigin::Restore
        };
        let prior = self.commit(text.into(), origin);
        if record_history {
            self.history.record_edit(prior);
        }
    }

    /// Restore the newest undo snapshot. `None` (and no change) when there is none.
    pub fn undo(&mut self) -> Option<String> {
        let current = self.buffer.snapshot();
        let restored = self.history.undo(current)?;
        self.commit(restored.clone(), ChangeOrigin::Undo);
        Some(restored)
    }

    pub fn redo(&mut self) -> Option<String> {
        let current = self.buffer.snapshot();
        let restored = self.history.redo(current)?;
        self.commit(restored.clone(), ChangeOrigin::Redo);
        Some(restored)
    }

    /// Replace the whole document with freshly loaded text.
    ///
    /// History is reset (earlier snapshots belong to another document) and the
    /// text counts as persisted.
    pub fn load(&mut self, text: impl Into<String>) {
        self.history.clear();
        self.commit(text.into(), ChangeOrigin::Load);
        self.dirty.on_persisted(self.buffer.snapshot());
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&ChangeEvent) + 'static,
    {
        self.notifier.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_dirty()
    }

    /// Called by the host after the current content reached storage.
    pub fn mark_persisted(&mut self) {
        self.dirty.on_persisted(self.buffer.snapshot());
    }

    /// Preview document for the current content.
    pub fn render(&self) -> String {
        self.renderer.render(self.buffer.content())
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Unified diff between the last load/save and the buffer.
    ///
    /// A document that was never persisted diffs against the empty string.
    pub fn pending_diff(&self, label: &str) -> Option<String> {
        let persisted = self.dirty.persisted_snapshot().unwrap_or_default();
        unsaved_changes_diff(persisted, self.buffer.content(), label)
    }

    pub fn open_file(&mut self, file: &mut DocumentFile, path: impl AsRef<Path>) -> EditorResult<()> {
        let text = file.open(path)?;
        self.load(text);
        Ok(())
    }

    pub fn save_file(&mut self, file: &mut DocumentFile) -> EditorResult<PathBuf> {
        let path = file.save(self.buffer.content())?;
        self.mark_persisted();
        Ok(path)
    }

    pub fn save_file_as(
        &mut self,
        file: &mut DocumentFile,
        path: impl AsRef<Path>,
    ) -> EditorResult<PathBuf> {
        let path = file.save_as(path, self.buffer.content())?;
        self.mark_persisted();
        Ok(path)
    }

    /// Run one scripted command. `save` needs `file` to already carry a path.
    pub fn apply(&mut self, command: &ScriptCommand, file: &mut DocumentFile) -> EditorResult<()> {
        match command {
            ScriptCommand::Set(text) => self.set_content(text.clone(), true),
            ScriptCommand::Append(text) => {
                let next = format!("{}{}", self.buffer.content(), text);
                self.set_content(next, true);
            }
            ScriptCommand::Undo => {
                if self.undo().is_none() {
                    debug!("nothing to undo");
                }
            }
            ScriptCommand::Redo => {
                if self.redo().is_none() {
                    debug!("nothing to redo");
                }
            }
            ScriptCommand::Save => {
                self.save_file(file)?;
            }
        }
        Ok(())
    }

    fn commit(&mut self, text: String, origin: ChangeOrigin) -> String {
        let prior = self.buffer.replace(text);
        if origin != ChangeOrigin::Load {
            self.dirty.on_mutation_committed();
        }
        debug!(%origin, bytes = self.buffer.len(), "buffer committed");

        let event = ChangeEvent {
            content: self.buffer.snapshot(),
            origin,
        };
        self.notifier.notify(&event);
        prior
    }
}
