/// The single mutable text document under edit.
///
/// Content is always valid UTF-8 and may be empty. Readers outside the editor
/// get owned copies through [`Buffer::snapshot`]; the only write path is
/// [`Buffer::replace`], which hands back the previous text by value so the
/// caller can file it in history without aliasing the live buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Buffer {
    content: String,
}

impl Buffer {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            content: initial.into(),
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn snapshot(&self) -> String {
        self.content.clone()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Swap in `text` and return what was there before.
    pub fn replace(&mut self, text: impl Into<String>) -> String {
        std::mem::replace(&mut self.content, text.into())
    }
}
