//! Line-oriented editing scripts used to drive an [`crate::Editor`] headlessly.
//!
//! ```text
//! # comment
//! set Hello\nWorld
//! append !
//! undo
//! redo
//! save
//! ```

use std::io::{self, Read};
use std::path::PathBuf;

use crate::error::{EditorError, EditorResult};

#[derive(Debug, Clone)]
pub enum ScriptSource {
    File(PathBuf),
    Stdin,
    Inline(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCommand {
    Set(String),
    Append(String),
    Undo,
    Redo,
    Save,
}

pub fn load_script(source: ScriptSource) -> EditorResult<Vec<ScriptCommand>> {
    let text = match source {
        ScriptSource::File(path) => {
            std::fs::read_to_string(&path).map_err(|err| EditorError::io(path, err))?
        }
        ScriptSource::Stdin => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|err| EditorError::io("<stdin>", err))?;
            buffer
        }
        ScriptSource::Inline(text) => text,
    };
    parse_script(&text)
}

pub fn parse_script(text: &str) -> EditorResult<Vec<ScriptCommand>> {
    let mut commands = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_start();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (verb, rest) = match line.split_once(' ') {
            Some((verb, rest)) => (verb, Some(rest)),
            None => (line.trim_end(), None),
        };

        let command = match verb {
            "set" => ScriptCommand::Set(unescape(rest.unwrap_or_default(), line_no)?),
            "append" => ScriptCommand::Append(unescape(rest.unwrap_or_default(), line_no)?),
            "undo" | "redo" | "save" if rest.is_some_and(|r| !r.trim().is_empty()) => {
                return Err(EditorError::InvalidScript {
                    line: line_no,
                    message: format!("'{verb}' takes no argument"),
                });
            }
            "undo" => ScriptCommand::Undo,
            "redo" => ScriptCommand::Redo,
            "save" => ScriptCommand::Save,
            other => {
                return Err(EditorError::InvalidScript {
                    line: line_no,
                    message: format!("unknown command '{other}'"),
                });
            }
        };
        commands.push(command);
    }

    Ok(commands)
}

fn unescape(raw: &str, line: usize) -> EditorResult<String> {
    let mut chars = raw.chars();
    let mut output = String::with_capacity(raw.len());

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            output.push(ch);
            continue;
        }

        let Some(next) = chars.next() else {
            return Err(EditorError::InvalidScript {
                line,
                message: "unterminated escape sequence".to_string(),
            });
        };

        match next {
            'n' => output.push('\n'),
            't' => output.push('\t'),
            '\\' => output.push('\\'),
            '"' => output.push('"'),
            _ => {
                return Err(EditorError::InvalidScript {
                    line,
                    message: format!("unsupported escape sequence: \\{next}"),
                })
            }
        }
    }

    Ok(output)
}
