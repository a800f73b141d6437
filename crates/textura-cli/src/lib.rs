use std::cell::Cell;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use serde_json::json;
use textura_config::{Config, LoadOptions};
use textura_core::fs::write_atomic;
use textura_core::script::load_script;
use textura_core::{
    DocumentFile, Editor, EditorError, EditorOptions, FileOptions, Renderer, ScriptSource,
};
use tracing::info;

pub mod logging;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let mut load = LoadOptions::default();
    if let Some(path) = &cli.config {
        load = load.with_override_path(path);
    }
    let config = Config::load(load)?;

    match cli.command {
        Command::Render(args) => handle_render(&config, args),
        Command::Session(args) => handle_session(&config, args),
    }
}

fn handle_render(config: &Config, args: RenderArgs) -> Result<i32> {
    let RenderArgs { input, output } = args;

    let markdown = if input == Path::new("-") {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read markdown from stdin")?;
        buffer
    } else {
        fs::read_to_string(&input)
            .with_context(|| format!("failed to read {}", input.display()))?
    };

    let renderer = Renderer::new((&config.render).into());
    let html = renderer.render(&markdown);

    match output {
        Some(path) => {
            if let Err(err) = write_atomic(&path, &html, false) {
                return Ok(report_error(&err));
            }
            info!(path = %path.display(), "wrote preview");
        }
        None => emit(&html)?,
    }
    Ok(0)
}

fn handle_session(config: &Config, args: SessionArgs) -> Result<i32> {
    let SessionArgs {
        file,
        script,
        write,
        format,
    } = args;

    let source = if script == Path::new("-") {
        ScriptSource::Stdin
    } else {
        ScriptSource::File(script)
    };
    let commands = match load_script(source) {
        Ok(commands) => commands,
        Err(err) => return Ok(report_error(&err)),
    };

    let mut document = DocumentFile::new(FileOptions::from(&config.files));
    let mut editor = Editor::with_options(EditorOptions::from_config(config));

    let notifications = Rc::new(Cell::new(0usize));
    let counter = Rc::clone(&notifications);
    editor.subscribe(move |_| counter.set(counter.get() + 1));

    if let Err(err) = editor.open_file(&mut document, &file) {
        return Ok(report_error(&err));
    }

    for command in &commands {
        if let Err(err) = editor.apply(command, &mut document) {
            return Ok(report_error(&err));
        }
    }

    let label = file.display().to_string();
    let pending = editor.pending_diff(&label);

    let mut saved = false;
    if write && editor.is_dirty() {
        if let Err(err) = editor.save_file(&mut document) {
            return Ok(report_error(&err));
        }
        saved = true;
    }

    match format.unwrap_or(SessionFormatValue::Plain) {
        SessionFormatValue::Plain => {
            if let Some(diff) = &pending {
                emit(diff)?;
            }
            let mut summary = format!(
                "dirty: {}\nundo: {} redo: {}\nnotifications: {}",
                if editor.is_dirty() { "yes" } else { "no" },
                editor.history().undo_depth(),
                editor.history().redo_depth(),
                notifications.get(),
            );
            if saved {
                summary.push_str(&format!("\nsaved {label}"));
            }
            emit(&summary)?;
        }
        SessionFormatValue::Json => {
            let report = json!({
                "path": label,
                "content": editor.content(),
                "dirty": editor.is_dirty(),
                "saved": saved,
                "undo_depth": editor.history().undo_depth(),
                "redo_depth": editor.history().redo_depth(),
                "notifications": notifications.get(),
                "diff": pending,
            });
            emit(&serde_json::to_string_pretty(&report)?)?;
        }
    }

    Ok(0)
}

fn report_error(err: &EditorError) -> i32 {
    eprintln!("{err}");
    err.exit_code() as i32
}

fn emit(content: &str) -> Result<()> {
    print!("{}", content);
    if !content.ends_with('\n') {
        println!();
    }
    Ok(())
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Textura markdown editor core",
    propagate_version = true
)]
struct Cli {
    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    /// Use this config file on top of the discovered ones
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a markdown file to a standalone HTML preview
    Render(RenderArgs),
    /// Open a file, replay an editing script and report the result
    Session(SessionArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Markdown input (use '-' for stdin)
    #[arg(value_name = "FILE", allow_hyphen_values = true)]
    input: PathBuf,
    /// Write the HTML here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,
}

#[derive(Args)]
struct SessionArgs {
    /// Markdown document to open
    #[arg(value_name = "FILE")]
    file: PathBuf,
    /// Script of editing commands (use '-' for stdin)
    #[arg(long, value_name = "PATH", allow_hyphen_values = true)]
    script: PathBuf,
    /// Save the document at the end if it has unsaved changes
    #[arg(long)]
    write: bool,
    /// Report format
    #[arg(long, value_enum)]
    format: Option<SessionFormatValue>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SessionFormatValue {
    Plain,
    Json,
}
