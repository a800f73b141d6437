use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use textura_config::{Config, ConfigError, ConfigSourceKind, LoadOptions, DEFAULT_THEME};
use tempfile::TempDir;

fn write_file(path: impl AsRef<Path>, contents: &str) {
    let mut file = fs::File::create(path).expect("create config");
    file.write_all(contents.as_bytes()).expect("write config");
}

fn canonical(path: impl AsRef<Path>) -> PathBuf {
    fs::canonicalize(path).expect("canonicalize path")
}

#[test]
fn loads_defaults_when_no_files_present() {
    let temp = TempDir::new().expect("tempdir");
    let working_dir = canonical(temp.path());

    let config = Config::load(LoadOptions::default().with_working_dir(working_dir.clone()))
        .expect("load defaults");

    assert!(config.render.tables);
    assert!(config.render.autolink);
    assert!(config.render.fenced_code);
    assert_eq!(config.render.theme, DEFAULT_THEME);
    assert_eq!(config.history.limit, None);
    assert_eq!(config.files.extension, "md");
    assert!(!config.files.backup);

    assert_eq!(config.sources.working_directory, working_dir);
    assert_eq!(config.sources.layers.len(), 1);
    assert_eq!(config.sources.layers[0].kind, ConfigSourceKind::Default);
}

#[test]
fn applies_precedence_and_merges_fields() {
    let temp = TempDir::new().expect("tempdir");
    let git_root = canonical(temp.path());
    fs::create_dir(git_root.join(".git")).expect("create .git");

    write_file(
        git_root.join(".textura.toml"),
        r#"
        [render]
        theme = "Solarized (dark)"
        tables = false

        [history]
        limit = 50
        "#,
    );

    let nested = git_root.join("docs");
    fs::create_dir(&nested).expect("create nested");
    write_file(
        nested.join(".textura.toml"),
        r#"
        [render]
        tables = true

        [files]
        backup = true
        "#,
    );

    let override_path = git_root.join("override.toml");
    write_file(&override_path, "[history]\nlimit = 5\n");

    let config = Config::load(
        LoadOptions::default()
            .with_working_dir(&nested)
            .with_override_path(&override_path),
    )
    .expect("load layered config");

    assert_eq!(config.render.theme, "Solarized (dark)");
    assert!(config.render.tables);
    assert!(config.files.backup);
    assert_eq!(config.history.limit, Some(5));

    let kinds: Vec<_> = config.sources.layers.iter().map(|l| l.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ConfigSourceKind::Default,
            ConfigSourceKind::GitRoot,
            ConfigSourceKind::Local,
            ConfigSourceKind::Override,
        ]
    );
}

#[test]
fn zero_history_limit_means_unbounded() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path().join(".textura.toml"), "[history]\nlimit = 0\n");

    let config =
        Config::load(LoadOptions::default().with_working_dir(temp.path())).expect("load config");
    assert_eq!(config.history.limit, None);
}

#[test]
fn leading_dot_in_extension_is_stripped() {
    let temp = TempDir::new().expect("tempdir");
    write_file(
        temp.path().join(".textura.toml"),
        "[files]\nextension = \".markdown\"\n",
    );

    let config =
        Config::load(LoadOptions::default().with_working_dir(temp.path())).expect("load config");
    assert_eq!(config.files.extension, "markdown");
}

#[test]
fn missing_override_is_reported() {
    let temp = TempDir::new().expect("tempdir");
    let err = Config::load(
        LoadOptions::default()
            .with_working_dir(temp.path())
            .with_override_path("missing.toml"),
    )
    .unwrap_err();

    assert!(matches!(err, ConfigError::OverrideNotFound { .. }));
}

#[test]
fn unknown_keys_fail_to_parse() {
    let temp = TempDir::new().expect("tempdir");
    write_file(temp.path().join(".textura.toml"), "[render]\ncolour = true\n");

    let err =
        Config::load(LoadOptions::default().with_working_dir(temp.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn validation_errors_name_the_key_and_source() {
    let temp = TempDir::new().expect("tempdir");
    write_file(
        temp.path().join(".textura.toml"),
        "[render]\ntheme = \"  \"\n\n[files]\nextension = \"md/x\"\n",
    );

    let err =
        Config::load(LoadOptions::default().with_working_dir(temp.path())).unwrap_err();
    let ConfigError::Validation(errors) = err else {
        panic!("expected validation error, got {err:?}");
    };

    assert_eq!(errors.iter().count(), 2);
    let rendered = errors.to_string();
    assert!(rendered.contains("render.theme"));
    assert!(rendered.contains("files.extension"));
    assert!(rendered.contains("local config"));
}
