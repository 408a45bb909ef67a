use std::env;
use std::io::{self, BufRead, IsTerminal, Write};

use nu_ansi_term::Style;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Highlighter, Reedline, Signal, StyledText};

use crate::debugger::{Command, Flow, Session};
use crate::theme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplMode {
    Bare,
    Editor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeFlagOverride {
    None,
    Bare,
    Editor,
}

/// Pick the front-end: flags, then `BF_DEBUG_MODE`, then TTY detection.
pub fn select_mode(flag: ModeFlagOverride) -> Result<ReplMode, String> {
    select_mode_with(flag, env::var("BF_DEBUG_MODE").ok(), io::stdin().is_terminal())
}

fn select_mode_with(flag: ModeFlagOverride, env_mode: Option<String>, stdin_tty: bool) -> Result<ReplMode, String> {
    match flag {
        ModeFlagOverride::Bare => return Ok(ReplMode::Bare),
        ModeFlagOverride::Editor => {
            if !stdin_tty {
                return Err("cannot start editor: stdin is not a TTY (use --bare or BF_DEBUG_MODE=bare)".to_string());
            }
            return Ok(ReplMode::Editor);
        }
        ModeFlagOverride::None => {}
    }

    if let Some(val) = env_mode {
        let v = val.trim().to_ascii_lowercase();
        return match v.as_str() {
            "bare" => Ok(ReplMode::Bare),
            "editor" => {
                if !stdin_tty {
                    return Err("cannot start editor: stdin is not a TTY (use BF_DEBUG_MODE=bare)".to_string());
                }
                Ok(ReplMode::Editor)
            }
            _ => Err(format!("invalid BF_DEBUG_MODE value: {val}, must be 'bare' or 'editor'")),
        };
    }

    if stdin_tty { Ok(ReplMode::Editor) } else { Ok(ReplMode::Bare) }
}

/// Read one command per line from `input` until EOF or `quit`.
/// Nothing but command results is written, so transcripts stay diffable.
pub fn bare_loop<R: BufRead, W: Write>(session: &mut Session, input: R, out: &mut W) -> io::Result<()> {
    for line in input.lines() {
        let line = line?;
        let flow = session.execute_line(&line, out)?;
        out.flush()?;
        if flow == Flow::Quit {
            break;
        }
    }
    Ok(())
}

/// Interactive debugger prompt backed by reedline.
pub fn editor_loop(session: &mut Session) -> io::Result<()> {
    let history = FileBackedHistory::new(1_000).map_err(|e| io::Error::other(e.to_string()))?;
    let mut editor = Reedline::create()
        .with_highlighter(Box::new(CommandHighlighter))
        .with_history(Box::new(history));
    let prompt = DefaultPrompt::new(DefaultPromptSegment::Basic("bf-dbg".to_string()), DefaultPromptSegment::Empty);

    let mut stdout = io::stdout();
    session.write_state(&mut stdout)?;
    loop {
        match editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => {
                if session.execute_line(&line, &mut stdout)? == Flow::Quit {
                    return Ok(());
                }
                stdout.flush()?;
            }
            Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => return Ok(()),
            Err(e) => {
                eprintln!("debug: editor error: {e}");
                let _ = io::stderr().flush();
                return Ok(());
            }
        }
    }
}

/// Colors the command word by whether it parses.
struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut out = StyledText::new();
        let trimmed = line.trim_start();
        let lead = &line[..line.len() - trimmed.len()];
        let word_end = trimmed.find(char::is_whitespace).unwrap_or(trimmed.len());
        let (word, rest) = trimmed.split_at(word_end);

        let word_style = if line.parse::<Command>().is_ok() {
            Style::new().fg(theme::COMMAND).bold()
        } else {
            Style::new().fg(theme::UNKNOWN_COMMAND)
        };

        if !lead.is_empty() {
            out.push((Style::new(), lead.to_string()));
        }
        if !word.is_empty() {
            out.push((word_style, word.to_string()));
        }
        if !rest.is_empty() {
            out.push((Style::new().fg(theme::ARGUMENT), rest.to_string()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use std::io::Cursor;

    #[test]
    fn flags_override_env() {
        assert_eq!(select_mode_with(ModeFlagOverride::Bare, Some("editor".into()), true), Ok(ReplMode::Bare));
        assert!(select_mode_with(ModeFlagOverride::Editor, None, false).is_err());
    }

    #[test]
    fn env_then_tty_detection() {
        assert_eq!(select_mode_with(ModeFlagOverride::None, Some("BARE".into()), true), Ok(ReplMode::Bare));
        assert!(select_mode_with(ModeFlagOverride::None, Some("fancy".into()), true).is_err());
        assert_eq!(select_mode_with(ModeFlagOverride::None, None, true), Ok(ReplMode::Editor));
        assert_eq!(select_mode_with(ModeFlagOverride::None, None, false), Ok(ReplMode::Bare));
    }

    #[test]
    fn bare_loop_stops_at_quit() {
        let mut session = Session::new("+++", "", EngineConfig::default()).unwrap();
        let mut out = Vec::new();
        bare_loop(&mut session, Cursor::new("s\n\nq\ns\n"), &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "step=1 pc=1/3 ptr=0 cell=1 instr='+' out=0\n");
        assert_eq!(session.engine().step_count(), 1);
    }

    #[test]
    fn highlighter_splits_word_and_args() {
        let styled = CommandHighlighter.highlight("  step 3", 0);
        let parts: Vec<&str> = styled.buffer.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(parts, vec!["  ", "step", " 3"]);
    }
}
