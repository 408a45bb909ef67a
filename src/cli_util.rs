use std::io::{self, Write};

use crate::control::ControlError;
use crate::error::EngineError;
use crate::program::sanitize;

/// Pretty-print an [`EngineError`] with a caret under the offending character
/// of the raw source `code`. If `program` is `Some("bf")`, messages are
/// prefixed with "bf: ...".
pub fn print_engine_error(program: Option<&str>, code: &str, breakpoint: Option<char>, err: &EngineError) {
    let prefix_program = |msg: &str| {
        if let Some(p) = program {
            format!("{p}: {msg}")
        } else {
            msg.to_string()
        }
    };

    let msg = match err {
        EngineError::UnmatchedBrackets { kind, .. } => {
            prefix_program(&format!("Parse error: unmatched bracket {kind}"))
        }
        EngineError::InvalidInstruction { ch, .. } => {
            prefix_program(&format!("Runtime error: invalid instruction '{ch}'"))
        }
        EngineError::HistoryNotRecorded => {
            eprintln!("{}", prefix_program(&err.to_string()));
            let _ = io::stderr().flush();
            return;
        }
    };

    match err.position() {
        Some(ip) => {
            let (_, offsets) = sanitize(code, breakpoint);
            let pos = offsets.get(ip).copied().unwrap_or_else(|| code.chars().count());
            print_error_with_context(&msg, code, ip, pos);
        }
        None => {
            eprintln!("{msg}");
            let _ = io::stderr().flush();
        }
    }
}

/// Same as [`print_engine_error`], plus the abort messages of a controlled run.
pub fn print_control_error(program: Option<&str>, code: &str, breakpoint: Option<char>, err: &ControlError) {
    match err {
        ControlError::Engine(inner) => print_engine_error(program, code, breakpoint, inner),
        other => {
            eprintln!("{other}");
            let _ = io::stderr().flush();
        }
    }
}

/// Print a concise error with instruction index and a caret context window,
/// working with UTF-8 by slicing using char indices. `pos` is the char
/// offset in `code` of instruction `ip`.
pub fn print_error_with_context(prefix: &str, code: &str, ip: usize, pos: usize) {
    eprintln!("{prefix} at instruction {ip}");
    for line in context_window(code, pos) {
        eprintln!("  {line}");
    }
    let _ = io::stderr().flush();
}

/// A short single-line excerpt of `code` around char `pos` and a caret line
/// pointing at it.
pub fn context_window(code: &str, pos: usize) -> [String; 2] {
    const WINDOW_CHARS: usize = 32;

    let total_chars = code.chars().count();
    let start_char = pos.saturating_sub(WINDOW_CHARS);
    let end_char = (pos + WINDOW_CHARS + 1).min(total_chars);

    // Newlines and tabs would break caret alignment.
    let slice: String = code
        .chars()
        .skip(start_char)
        .take(end_char.saturating_sub(start_char))
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    let caret_offset_chars = pos.saturating_sub(start_char);
    let mut underline = " ".repeat(caret_offset_chars);
    underline.push('^');

    [slice, underline]
}
