pub mod buffer;
pub mod diff;
pub mod dirty;
pub mod editor;
pub mod error;
pub mod fs;
pub mod history;
pub mod notify;
pub mod render;
pub mod script;

pub use buffer::Buffer;
pub use dirty::DirtyTracker;
pub use editor::{Editor, EditorOptions};
pub use error::{EditorError, EditorResult, ExitCode};
pub use fs::{DocumentFile, FileOptions};
pub use history::{History, HistoryLimit};
pub use notify::{ChangeEvent, ChangeNotifier, ChangeOrigin, SubscriptionId};
pub use render::{render, RenderOptions, Renderer};
pub use script::{ScriptCommand, ScriptSource};
