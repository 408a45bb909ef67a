//! A line-oriented stepping debugger on top of [`Engine`].
//!
//! The session owns one engine and routes every user action (step, step
//! back, run, reset) into it as an explicit call. Front-ends feed it parsed
//! [`Command`]s and give it somewhere to write.

use std::io::{self, Write};
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nu_ansi_term::Style;

use crate::cli_util::context_window;
use crate::config::EngineConfig;
use crate::control::{ControlError, StepControl, run_with_control};
use crate::engine::{Engine, RunOutcome};
use crate::error::EngineError;
use crate::format::{TextFormat, escape_cells, format_cells};
use crate::theme;

pub const HELP: &str = "\
Commands:
  step [N]     s    Execute N instructions (default 1; ctrl+c stops early)
  back [N]     b    Undo N instructions (default 1; needs history)
  run          r c  Run until the program ends or a breakpoint is consumed
  reset             Start over with the original input
  mem [FMT]    m    Show every visited cell as dec, hex or ascii; the pointer cell is bracketed
  out [FMT]    o    Show output as ascii, hex or dec
  where        w    Show the source around the program counter
  state             Show counters only
  help         h ?  Show this help
  quit         q    Leave the debugger";

/// One debugger instruction, as typed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Step(usize),
    Back(usize),
    Run,
    Reset,
    Memory(Option<TextFormat>),
    Output(Option<TextFormat>),
    Where,
    State,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err("empty command".to_string());
        };
        let arg = words.next();
        if let Some(extra) = words.next() {
            return Err(format!("unexpected argument '{extra}'"));
        }

        let count = |arg: Option<&str>| -> Result<usize, String> {
            match arg {
                None => Ok(1),
                Some(a) => a.parse::<usize>().map_err(|_| format!("invalid count '{a}'")),
            }
        };
        let format = |arg: Option<&str>| arg.map(|a| a.parse::<TextFormat>()).transpose();
        let no_arg = |cmd: Command| match arg {
            None => Ok(cmd),
            Some(a) => Err(format!("'{name}' takes no argument, got '{a}'")),
        };

        match name.to_ascii_lowercase().as_str() {
            "step" | "s" | "next" | "n" => Ok(Command::Step(count(arg)?)),
            "back" | "b" => Ok(Command::Back(count(arg)?)),
            "run" | "r" | "continue" | "c" => no_arg(Command::Run),
            "reset" => no_arg(Command::Reset),
            "mem" | "m" | "memory" => Ok(Command::Memory(format(arg)?)),
            "out" | "o" | "output" => Ok(Command::Output(format(arg)?)),
            "where" | "w" => no_arg(Command::Where),
            "state" => no_arg(Command::State),
            "help" | "h" | "?" => no_arg(Command::Help),
            "quit" | "q" | "exit" => no_arg(Command::Quit),
            other => Err(format!("unknown command '{other}' (try 'help')")),
        }
    }
}

/// Whether the front-end should keep reading commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Session {
    source: String,
    engine: Engine,
    format: TextFormat,
    memory_format: TextFormat,
    color: bool,
    control: StepControl,
}

impl Session {
    pub fn new(source: &str, input: &str, config: EngineConfig) -> Result<Self, EngineError> {
        Ok(Self {
            source: source.to_string(),
            engine: Engine::new(source, input, config)?,
            format: TextFormat::Ascii,
            memory_format: TextFormat::Decimal,
            color: false,
            control: StepControl::new(None, Arc::new(AtomicBool::new(false))),
        })
    }

    /// Emit ANSI colors in `where` listings.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Bound `run` by a step budget and an external cancel flag.
    pub fn with_control(mut self, control: StepControl) -> Self {
        self.control = control;
        self
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn cancelled(&self) -> bool {
        self.control.cancel_flag.load(Ordering::Relaxed)
    }

    /// Apply `cmd` and describe the result on `out`.
    ///
    /// `step`, `back` and `run` stop early once the cancel flag is raised;
    /// the flag is lowered again when the command returns.
    pub fn execute<W: Write>(&mut self, cmd: Command, out: &mut W) -> io::Result<Flow> {
        let flow = self.apply(cmd, out);
        self.control.cancel_flag.store(false, Ordering::Relaxed);
        flow
    }

    fn apply<W: Write>(&mut self, cmd: Command, out: &mut W) -> io::Result<Flow> {
        match cmd {
            Command::Step(n) => {
                for _ in 0..n {
                    if self.engine.is_halted() {
                        break;
                    }
                    if self.cancelled() {
                        writeln!(out, "interrupted")?;
                        break;
                    }
                    if let Err(e) = self.engine.step() {
                        writeln!(out, "error: {e}")?;
                        break;
                    }
                }
                self.write_state(out)?;
            }
            Command::Back(n) => {
                for _ in 0..n {
                    // With history off, step_back reports why instead.
                    if self.engine.step_count() == 0 && self.engine.config().record_history {
                        break;
                    }
                    if self.cancelled() {
                        writeln!(out, "interrupted")?;
                        break;
                    }
                    if let Err(e) = self.engine.step_back() {
                        writeln!(out, "error: {e}")?;
                        break;
                    }
                }
                self.write_state(out)?;
            }
            Command::Run => {
                match run_with_control(&mut self.engine, &self.control) {
                    Ok(RunOutcome::Halted) => writeln!(out, "halted")?,
                    Ok(RunOutcome::Breakpoint { at }) => writeln!(out, "breakpoint at instruction {at}")?,
                    Err(ControlError::Engine(e)) => writeln!(out, "error: {e}")?,
                    Err(e) => writeln!(out, "{e}")?,
                }
                self.write_state(out)?;
            }
            Command::Reset => {
                self.engine.reset();
                self.write_state(out)?;
            }
            Command::Memory(format) => {
                if let Some(f) = format {
                    self.memory_format = f;
                }
                self.write_memory(out)?;
            }
            Command::Output(format) => {
                if let Some(f) = format {
                    self.format = f;
                }
                writeln!(out, "output: {}", render(self.engine.stdout(), self.format))?;
            }
            Command::Where => self.write_where(out)?,
            Command::State => self.write_state(out)?,
            Command::Help => writeln!(out, "{HELP}")?,
            Command::Quit => return Ok(Flow::Quit),
        }
        Ok(Flow::Continue)
    }

    /// Parse `line` and execute it; parse errors are reported and ignored.
    pub fn execute_line<W: Write>(&mut self, line: &str, out: &mut W) -> io::Result<Flow> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(Flow::Continue);
        }
        match line.parse::<Command>() {
            Ok(cmd) => self.execute(cmd, out),
            Err(msg) => {
                writeln!(out, "error: {msg}")?;
                Ok(Flow::Continue)
            }
        }
    }

    pub fn write_state<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let e = &self.engine;
        let instr = match e.current_instruction() {
            Some(c) => format!("'{c}'"),
            None => "end".to_string(),
        };
        writeln!(
            out,
            "step={} pc={}/{} ptr={} cell={} instr={} out={}",
            e.step_count(),
            e.program_counter(),
            e.program().len(),
            e.address_pointer(),
            e.current_cell(),
            instr,
            e.stdout().len()
        )
    }

    fn write_memory<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let (min, max) = self.engine.memory_bounds();
        let ptr = self.engine.address_pointer();
        let cells: Vec<String> = (min..=max)
            .map(|i| {
                let v = render(&[self.engine.cell(i)], self.memory_format);
                if i == ptr { format!("[{v}]") } else { v }
            })
            .collect();
        writeln!(out, "cells {min}..{max}: {}", cells.join(" "))
    }

    fn write_where<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let pos = self.engine.program().source_offset(self.engine.program_counter());
        let [line, caret] = context_window(&self.source, pos);
        if self.color {
            writeln!(out, "  {}", self.highlight(&line))?;
        } else {
            writeln!(out, "  {line}")?;
        }
        writeln!(out, "  {caret}")
    }

    fn highlight(&self, line: &str) -> String {
        let breakpoint = self.engine.config().breakpoint;
        line.chars()
            .map(|ch| style_for(ch, breakpoint).paint(ch.to_string()).to_string())
            .collect()
    }
}

// ASCII is escaped so control characters can't garble the terminal.
fn render(cells: &[u32], format: TextFormat) -> String {
    match format {
        TextFormat::Ascii => escape_cells(cells),
        other => format_cells(cells, other),
    }
}

/// Per-instruction styling, shared with the line editor.
pub fn style_for(ch: char, breakpoint: Option<char>) -> Style {
    match ch {
        c if breakpoint == Some(c) => Style::new().fg(theme::BREAKPOINT).bold().underline(),
        '>' => Style::new().fg(theme::MOVE_RIGHT).bold(),
        '<' => Style::new().fg(theme::MOVE_LEFT).bold(),
        '+' => Style::new().fg(theme::INCREMENT).bold(),
        '-' => Style::new().fg(theme::DECREMENT).bold(),
        '.' => Style::new().fg(theme::OUTPUT).bold(),
        ',' => Style::new().fg(theme::INPUT).bold(),
        '[' | ']' => Style::new().fg(theme::LOOP).bold(),
        _ => Style::new().fg(theme::COMMENT),
    }
}
