//! Reading and writing markdown documents.
//!
//! This is the host-side persistence collaborator: it moves bytes between
//! disk and the editor and remembers which path the document belongs to.
//! It never touches editor state itself; [`crate::Editor::open_file`] and
//! [`crate::Editor::save_file`] update dirty state after the I/O succeeds.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use textura_config::{FileSettings, DEFAULT_EXTENSION};
use tracing::info;

use crate::error::{EditorError, EditorResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileOptions {
    /// Extension appended on save when the target path lacks it, without the dot.
    pub extension: String,
    /// Copy the previous file to `<name>.bak` before replacing it.
    pub backup: bool,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_owned(),
            backup: false,
        }
    }
}

impl From<&FileSettings> for FileOptions {
    fn from(settings: &FileSettings) -> Self {
        Self {
            extension: settings.extension.clone(),
            backup: settings.backup,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DocumentFile {
    path: Option<PathBuf>,
    options: FileOptions,
}

impl DocumentFile {
    pub fn new(options: FileOptions) -> Self {
        Self {
            path: None,
            options,
        }
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn options(&self) -> &FileOptions {
        &self.options
    }

    /// Read `path` as UTF-8 and adopt it as the current path.
    pub fn open(&mut self, path: impl AsRef<Path>) -> EditorResult<String> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|err| EditorError::io(path, err))?;
        info!(path = %path.display(), bytes = content.len(), "opened document");
        self.path = Some(path.to_path_buf());
        Ok(content)
    }

    /// Write to the current path. Fails with [`EditorError::NoPath`] for a new document.
    pub fn save(&mut self, content: &str) -> EditorResult<PathBuf> {
        let path = self.path.clone().ok_or(EditorError::NoPath)?;
        write_atomic(&path, content, self.options.backup)?;
        info!(path = %path.display(), bytes = content.len(), "saved document");
        Ok(path)
    }

    /// Write to `path` (extension enforced) and adopt it once the write lands.
    pub fn save_as(&mut self, path: impl AsRef<Path>, content: &str) -> EditorResult<PathBuf> {
        let target = ensure_extension(path.as_ref(), &self.options.extension);
        write_atomic(&target, content, self.options.backup)?;
        info!(path = %target.display(), bytes = content.len(), "saved document as");
        self.path = Some(target.clone());
        Ok(target)
    }
}

/// Append `.{extension}` unless `path` already ends with it (case-insensitive).
pub fn ensure_extension(path: &Path, extension: &str) -> PathBuf {
    let has_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
    if has_extension {
        return path.to_path_buf();
    }

    let mut name = OsString::from(path.as_os_str());
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

pub fn write_atomic(path: &Path, content: &str, backup: bool) -> EditorResult<()> {
    let tmp_path = unique_tmp_path(path);
    {
        let mut file = File::create(&tmp_path).map_err(|err| EditorError::io(&tmp_path, err))?;
        file.write_all(content.as_bytes())
            .and_then(|_| file.sync_all())
            .map_err(|err| EditorError::io(&tmp_path, err))?;
    }

    if backup && path.exists() {
        let backup_path = backup_path(path);
        if let Err(err) = fs::copy(path, &backup_path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(EditorError::io(backup_path, err));
        }
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(EditorError::io(path, err));
    }

    Ok(())
}

fn backup_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".bak");
    PathBuf::from(name)
}

fn unique_tmp_path(path: &Path) -> PathBuf {
    let mut counter = 0u32;
    loop {
        let mut name = OsString::from(path.as_os_str());
        if counter == 0 {
            name.push(".tmp");
        } else {
            name.push(format!(".tmp{counter}"));
        }
        let candidate = PathBuf::from(name);

        if !candidate.exists() {
            return candidate;
        }

        counter += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_atomically_with_backup() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("doc.md");
        fs::write(&file_path, "hello").unwrap();

        write_atomic(&file_path, "updated", true).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "updated");
        assert_eq!(
            fs::read_to_string(dir.path().join("doc.md.bak")).unwrap(),
            "hello"
        );
    }

    #[test]
    fn backup_is_skipped_for_new_files() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("fresh.md");

        write_atomic(&file_path, "first", true).unwrap();

        assert_eq!(fs::read_to_string(&file_path).unwrap(), "first");
        assert!(!dir.path().join("fresh.md.bak").exists());
    }

    #[test]
    fn ensure_extension_appends_when_missing() {
        assert_eq!(
            ensure_extension(Path::new("notes"), "md"),
            PathBuf::from("notes.md")
        );
        assert_eq!(
            ensure_extension(Path::new("notes.txt"), "md"),
            PathBuf::from("notes.txt.md")
        );
        assert_eq!(
            ensure_extension(Path::new("README.MD"), "md"),
            PathBuf::from("README.MD")
        );
    }

    #[test]
    fn save_without_path_is_rejected() {
        let mut file = DocumentFile::default();
        let err = file.save("text").unwrap_err();
        assert!(matches!(err, EditorError::NoPath));
    }

    #[test]
    fn failed_save_as_keeps_previous_path() {
        let dir = tempdir().unwrap();
        let original = dir.path().join("a.md");
        fs::write(&original, "a").unwrap();

        let mut file = DocumentFile::default();
        file.open(&original).unwrap();

        let unwritable = dir.path().join("missing-dir").join("b");
        assert!(file.save_as(&unwritable, "b").is_err());
        assert_eq!(file.current_path(), Some(original.as_path()));
    }
}
