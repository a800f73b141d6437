//! Configuration primitives and loader for the Textura editor.
//!
//! Settings resolve through a precedence stack:
//! override flag → working directory → git root → built-in defaults.
//! Each layer is parsed from TOML into a partial view and merged field by
//! field, so a local file only needs to mention the keys it changes.

use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

const CONFIG_FILE_NAME: &str = ".textura.toml";

pub const DEFAULT_THEME: &str = "InspiredGitHub";
pub const DEFAULT_BODY_STYLE: &str =
    "body { font-family: sans-serif; margin: 1em; line-height: 1.5; }";
pub const DEFAULT_EXTENSION: &str = "md";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub render: RenderSettings,
    pub history: HistorySettings,
    pub files: FileSettings,
    pub sources: ConfigSources,
}

/// Markdown extensions and presentation knobs for the preview.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderSettings {
    pub tables: bool,
    pub autolink: bool,
    pub fenced_code: bool,
    pub theme: String,
    pub body_style: String,
}

/// Undo/redo retention. `limit == None` keeps every snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistorySettings {
    pub limit: Option<usize>,
}

/// Settings used by the persistence collaborator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileSettings {
    pub extension: String,
    pub backup: bool,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
}

impl ConfigSource {
    fn default() -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        ConfigSource {
            kind,
            path: Some(path),
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default();
        let mut merged = defaults_layer(default_source.clone());
        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let resolved = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            render: resolved.render,
            history: resolved.history,
            files: resolved.files,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }

    /// Built-in defaults without touching the filesystem.
    pub fn builtin() -> Self {
        let resolved = defaults_layer(ConfigSource::default())
            .finalize()
            .unwrap_or_else(|err| panic!("built-in textura defaults are invalid: {err}"));
        Config {
            render: resolved.render,
            history: resolved.history,
            files: resolved.files,
            sources: ConfigSources {
                working_directory: PathBuf::from("."),
                layers: vec![ConfigSource::default()],
            },
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::load(LoadOptions::default()).unwrap_or_else(|err| {
            panic!("failed to load textura defaults: {err}");
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    PartialConfig {
        tables: Some(Located::new(true, source.clone())),
        autolink: Some(Located::new(true, source.clone())),
        fenced_code: Some(Located::new(true, source.clone())),
        theme: Some(Located::new(DEFAULT_THEME.to_owned(), source.clone())),
        body_style: Some(Located::new(DEFAULT_BODY_STYLE.to_owned(), source.clone())),
        history_limit: Some(Located::new(0, source.clone())),
        extension: Some(Located::new(DEFAULT_EXTENSION.to_owned(), source.clone())),
        backup: Some(Located::new(false, source)),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    tables: Option<Located<bool>>,
    autolink: Option<Located<bool>>,
    fenced_code: Option<Located<bool>>,
    theme: Option<Located<String>>,
    body_style: Option<Located<String>>,
    history_limit: Option<Located<usize>>,
    extension: Option<Located<String>>,
    backup: Option<Located<bool>>,
}

fn overlay<T>(slot: &mut Option<Located<T>>, other: Option<Located<T>>) {
    if other.is_some() {
        *slot = other;
    }
}

impl PartialConfig {
    fn merge(&mut self, other: PartialConfig) {
        overlay(&mut self.tables, other.tables);
        overlay(&mut self.autolink, other.autolink);
        overlay(&mut self.fenced_code, other.fenced_code);
        overlay(&mut self.theme, other.theme);
        overlay(&mut self.body_style, other.body_style);
        overlay(&mut self.history_limit, other.history_limit);
        overlay(&mut self.extension, other.extension);
        overlay(&mut self.backup, other.backup);
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let theme = required(self.theme, "render.theme", &mut errors);
        if let Some(located) = &theme {
            if located.value.trim().is_empty() {
                errors.push(
                    ConfigValidationError::new(
                        Some(located.source.clone()),
                        "theme name must not be empty".to_owned(),
                    )
                    .with_context("render.theme"),
                );
            }
        }

        let extension = required(self.extension, "files.extension", &mut errors);
        if let Some(located) = &extension {
            if let Some(message) = invalid_extension(&located.value) {
                errors.push(
                    ConfigValidationError::new(Some(located.source.clone()), message)
                        .with_context("files.extension"),
                );
            }
        }

        let tables = required(self.tables, "render.tables", &mut errors);
        let autolink = required(self.autolink, "render.autolink", &mut errors);
        let fenced_code = required(self.fenced_code, "render.fenced_code", &mut errors);
        let body_style = required(self.body_style, "render.body_style", &mut errors);
        let history_limit = required(self.history_limit, "history.limit", &mut errors);
        let backup = required(self.backup, "files.backup", &mut errors);

        if !errors.is_empty() {
            return Err(ConfigValidationErrors(errors));
        }

        // All fields are present past this point; the defaults layer seeds them.
        let value = |located: Option<Located<bool>>| located.map(|l| l.value).unwrap_or_default();
        Ok(ResolvedConfig {
            render: RenderSettings {
                tables: value(tables),
                autolink: value(autolink),
                fenced_code: value(fenced_code),
                theme: theme.map(|l| l.value).unwrap_or_default(),
                body_style: body_style.map(|l| l.value).unwrap_or_default(),
            },
            history: HistorySettings {
                limit: history_limit
                    .map(|l| l.value)
                    .filter(|&limit| limit > 0),
            },
            files: FileSettings {
                extension: extension.map(|l| l.value).unwrap_or_default(),
                backup: value(backup),
            },
        })
    }
}

fn required<T>(
    located: Option<Located<T>>,
    key: &str,
    errors: &mut Vec<ConfigValidationError>,
) -> Option<Located<T>> {
    if located.is_none() {
        errors.push(
            ConfigValidationError::new(None, "missing value".to_owned()).with_context(key),
        );
    }
    located
}

fn invalid_extension(extension: &str) -> Option<String> {
    if extension.is_empty() {
        return Some("extension must not be empty".to_owned());
    }
    if extension.contains(['.', '/', '\\']) {
        return Some(format!(
            "extension '{extension}' must not contain '.' or path separators"
        ));
    }
    None
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    render: RenderSettings,
    history: HistorySettings,
    files: FileSettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    render: Option<RawRender>,
    #[serde(default)]
    history: Option<RawHistory>,
    #[serde(default)]
    files: Option<RawFiles>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRender {
    tables: Option<bool>,
    autolink: Option<bool>,
    fenced_code: Option<bool>,
    theme: Option<String>,
    body_style: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawHistory {
    limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawFiles {
    extension: Option<String>,
    backup: Option<bool>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        let render = self.render.unwrap_or_default();
        let history = self.history.unwrap_or_default();
        let files = self.files.unwrap_or_default();

        PartialConfig {
            tables: located(render.tables, &source),
            autolink: located(render.autolink, &source),
            fenced_code: located(render.fenced_code, &source),
            theme: located(render.theme, &source),
            body_style: located(render.body_style, &source),
            history_limit: located(history.limit, &source),
            extension: located(
                files
                    .extension
                    .map(|ext| ext.trim_start_matches('.').to_owned()),
                &source,
            ),
            backup: located(files.backup, &source),
        }
    }
}

fn located<T>(value: Option<T>, source: &ConfigSource) -> Option<Located<T>> {
    value.map(|value| Located::new(value, source.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_defaults_are_valid() {
        let config = Config::builtin();
        assert!(config.render.tables);
        assert!(config.render.autolink);
        assert!(config.render.fenced_code);
        assert_eq!(config.render.theme, DEFAULT_THEME);
        assert_eq!(config.history.limit, None);
        assert_eq!(config.files.extension, "md");
        assert!(!config.files.backup);
    }

    #[test]
    fn rejects_extension_with_separator() {
        assert!(invalid_extension("md/x").is_some());
        assert!(invalid_extension("").is_some());
        assert!(invalid_extension("markdown").is_none());
    }

    #[test]
    fn later_layer_overrides_earlier() {
        let mut base = defaults_layer(ConfigSource::default());
        let raw: RawConfig = toml::from_str("[render]\ntables = false\n").unwrap();
        base.merge(raw.into_partial(ConfigSource::for_file(
            ConfigSourceKind::Local,
            PathBuf::from(".textura.toml"),
        )));
        let resolved = base.finalize().unwrap();
        assert!(!resolved.render.tables);
        assert!(resolved.render.autolink);
    }
}
