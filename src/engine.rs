//! The execution core: forward stepping, exact reversal, and the run loop.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::config::{EngineConfig, EofPolicy};
use crate::error::EngineError;
use crate::history::{History, InputRecord};
use crate::memory::Tape;
use crate::program::Program;

/// Why [`Engine::run`] returned control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The program counter reached the end of the program.
    Halted,
    /// The breakpoint character at `at` was executed; the next `run` resumes at `at + 1`.
    Breakpoint { at: usize },
}

/// Everything observable about an engine at one point in time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSnapshot {
    pub memory: Vec<u32>,
    pub address_pointer: i64,
    pub program_counter: usize,
    pub step_count: usize,
    pub stdout: Vec<u32>,
}

/// A reversible interpreter for one program and one input.
///
/// Each instance owns its state exclusively; create a new one (or call
/// [`Engine::reset`]) to start over.
#[derive(Debug, Clone)]
pub struct Engine {
    program: Program,
    config: EngineConfig,
    input: String,
    tape: Tape,
    program_counter: usize,
    step_count: usize,
    stdout: Vec<u32>,
    stdin: VecDeque<char>,
    history: History,
}

impl Engine {
    /// Load `instructions` and prepare to run them against `input`.
    ///
    /// Fails when brackets are unbalanced.
    pub fn new(instructions: &str, input: &str, config: EngineConfig) -> Result<Self, EngineError> {
        let program = Program::new(instructions, config.breakpoint)?;
        debug!(
            instructions = program.len(),
            bracket_pairs = program.bracket_pairs(),
            eof = %config.eof,
            cell_width = %config.cell_width,
            history = config.record_history,
            "program loaded"
        );

        Ok(Self {
            program,
            config,
            input: input.to_string(),
            tape: Tape::new(),
            program_counter: 0,
            step_count: 0,
            stdout: Vec::new(),
            stdin: input.chars().collect(),
            history: History::default(),
        })
    }

    /// Return to the initial state, keeping the program, input and configuration.
    pub fn reset(&mut self) {
        self.tape = Tape::new();
        self.program_counter = 0;
        self.step_count = 0;
        self.stdout.clear();
        self.stdin = self.input.chars().collect();
        self.history = History::default();
    }

    /// Execute until the program ends or a breakpoint is consumed.
    ///
    /// There is no step limit: a program that never halts keeps this call
    /// running. See [`crate::control`] for a cancellable variant.
    pub fn run(&mut self) -> Result<RunOutcome, EngineError> {
        while let Some(instr) = self.current_instruction() {
            let at_breakpoint = self.config.breakpoint == Some(instr);
            self.step()?;
            if at_breakpoint {
                let at = self.program_counter - 1;
                debug!(at, step = self.step_count, "suspended at breakpoint");
                return Ok(RunOutcome::Breakpoint { at });
            }
        }
        Ok(RunOutcome::Halted)
    }

    /// Execute one instruction. Does nothing once the program has halted.
    pub fn step(&mut self) -> Result<(), EngineError> {
        let Some(instr) = self.current_instruction() else {
            return Ok(());
        };
        let max_value = self.config.max_value();

        match instr {
            '>' => self.tape.move_right(),
            '<' => self.tape.move_left(),
            '+' => self.tape.increment(max_value),
            '-' => self.tape.decrement(max_value),
            '[' => {
                if self.tape.current() == 0 {
                    self.jump();
                }
            }
            ']' => {
                if self.tape.current() != 0 {
                    self.jump();
                }
            }
            '.' => self.stdout.push(self.tape.current()),
            ',' => self.read_input(),
            c if self.config.breakpoint == Some(c) => {}
            c => {
                return Err(EngineError::InvalidInstruction { ch: c, ip: self.program_counter });
            }
        }

        trace!(
            step = self.step_count,
            instr = %instr,
            ptr = self.tape.pointer(),
            cell = self.tape.current(),
            "step"
        );
        self.program_counter += 1;
        self.step_count += 1;
        Ok(())
    }

    /// Undo the most recent forward step.
    ///
    /// Requires history recording; at step 0 there is nothing to undo and
    /// the call does nothing.
    pub fn step_back(&mut self) -> Result<(), EngineError> {
        if !self.config.record_history {
            return Err(EngineError::HistoryNotRecorded);
        }
        if self.step_count == 0 {
            return Ok(());
        }

        self.program_counter -= 1;
        self.step_count -= 1;
        let Some(instr) = self.current_instruction() else {
            return Ok(());
        };
        let max_value = self.config.max_value();

        match instr {
            '>' => self.tape.move_left(),
            '<' => self.tape.move_right(),
            '+' => self.tape.decrement(max_value),
            '-' => self.tape.increment(max_value),
            '[' | ']' => {
                // Only taken jumps were logged; a fall-through already sits on its bracket.
                if let Some(from_pc) = self.history.take_jump(self.step_count) {
                    self.program_counter = from_pc;
                }
            }
            '.' => {
                self.stdout.pop();
            }
            ',' => {
                if let Some(record) = self.history.take_input(self.step_count) {
                    if let Some(ch) = record.consumed {
                        self.stdin.push_front(ch);
                    }
                    self.tape.set_current(record.previous);
                }
            }
            _ => {}
        }

        trace!(
            step = self.step_count,
            instr = %instr,
            pc = self.program_counter,
            ptr = self.tape.pointer(),
            "step back"
        );
        Ok(())
    }

    fn jump(&mut self) {
        if self.config.record_history {
            self.history.record_jump(self.step_count, self.program_counter);
        }
        self.program_counter = self
            .program
            .matching(self.program_counter)
            .expect("validated bracket");
    }

    fn read_input(&mut self) {
        let previous = self.tape.current();
        let consumed = self.stdin.pop_front();
        if self.config.record_history {
            self.history.record_input(self.step_count, InputRecord { previous, consumed });
        }

        let max_value = self.config.max_value();
        match consumed {
            // Characters wider than the cell are truncated to its width.
            Some(ch) => self.tape.set_current(ch as u32 & max_value),
            None => match self.config.eof {
                EofPolicy::LeaveUnchanged => {}
                EofPolicy::SetToZero => self.tape.set_current(0),
                EofPolicy::SetToMinusOne => self.tape.set_current(max_value),
            },
        }
    }

    /// Dense copy of every visited cell, lowest index first.
    pub fn memory(&self) -> Vec<u32> {
        self.tape.snapshot()
    }

    /// Lowest and highest cell indices ever visited.
    pub fn memory_bounds(&self) -> (i64, i64) {
        self.tape.bounds()
    }

    pub fn cell(&self, index: i64) -> u32 {
        self.tape.get(index)
    }

    pub fn current_cell(&self) -> u32 {
        self.tape.current()
    }

    pub fn address_pointer(&self) -> i64 {
        self.tape.pointer()
    }

    pub fn program_counter(&self) -> usize {
        self.program_counter
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }

    pub fn stdout(&self) -> &[u32] {
        &self.stdout
    }

    /// Input not yet consumed by `,`.
    pub fn remaining_input(&self) -> String {
        self.stdin.iter().collect()
    }

    pub fn current_instruction(&self) -> Option<char> {
        self.program.instruction(self.program_counter)
    }

    pub fn is_halted(&self) -> bool {
        self.program_counter >= self.program.len()
    }

    /// Whether a `step_back` call would change anything.
    pub fn can_step_back(&self) -> bool {
        self.config.record_history && self.step_count > 0
    }

    pub fn program(&self) -> &Program {
        &self.program
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            memory: self.memory(),
            address_pointer: self.address_pointer(),
            program_counter: self.program_counter,
            step_count: self.step_count,
            stdout: self.stdout.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CellWidth;

    fn engine(code: &str, input: &str) -> Engine {
        Engine::new(code, input, EngineConfig::default()).unwrap()
    }

    fn with_config(code: &str, input: &str, config: EngineConfig) -> Engine {
        Engine::new(code, input, config).unwrap()
    }

    #[test]
    fn step_on_halted_program_is_noop() {
        let mut bf = engine("+", "");
        bf.step().unwrap();
        bf.step().unwrap();
        assert_eq!(bf.step_count(), 1);
        assert_eq!(bf.program_counter(), 1);
        assert!(bf.is_halted());
    }

    #[test]
    fn pointer_moves_into_negative_indices() {
        let mut bf = engine("<<+>", "");
        bf.run().unwrap();
        assert_eq!(bf.address_pointer(), -1);
        assert_eq!(bf.memory(), vec![1, 0, 0]);
        assert_eq!(bf.memory_bounds(), (-2, 0));
    }

    #[test]
    fn open_bracket_on_zero_skips_past_match() {
        let mut bf = engine("[+]+", "");
        bf.step().unwrap();
        assert_eq!(bf.program_counter(), 3);
        bf.step().unwrap();
        assert_eq!(bf.memory(), vec![1]);
    }

    #[test]
    fn open_bracket_on_nonzero_falls_through() {
        let mut bf = engine("+[-]", "");
        bf.step().unwrap();
        bf.step().unwrap();
        assert_eq!(bf.program_counter(), 2);
    }

    #[test]
    fn close_bracket_on_nonzero_jumps_back() {
        let mut bf = engine("++[-]", "");
        for _ in 0..4 {
            bf.step().unwrap();
        }
        // cell is 1 at ']', so the next step lands just past '['
        bf.step().unwrap();
        assert_eq!(bf.program_counter(), 3);
    }

    #[test]
    fn output_appends_current_cell() {
        let mut bf = engine(".+.", "");
        bf.run().unwrap();
        assert_eq!(bf.stdout(), &[0, 1]);
    }

    #[test]
    fn input_overwrites_cell_and_is_consumed() {
        let mut bf = engine(",>,", "AB");
        bf.step().unwrap();
        assert_eq!(bf.current_cell(), 65);
        assert_eq!(bf.remaining_input(), "B");
        bf.run().unwrap();
        assert_eq!(bf.memory(), vec![65, 66]);
        assert_eq!(bf.remaining_input(), "");
    }

    #[test]
    fn wide_input_is_truncated_to_cell_width() {
        let mut bf = engine(",", "\u{20AC}");
        bf.run().unwrap();
        assert_eq!(bf.current_cell(), 0x20AC & 0xFF);

        let config = EngineConfig { cell_width: CellWidth::ThirtyTwoBit, ..EngineConfig::default() };
        let mut bf = with_config(",", "\u{20AC}", config);
        bf.run().unwrap();
        assert_eq!(bf.current_cell(), 0x20AC);
    }

    #[test]
    fn eof_policies() {
        let run_with = |eof| {
            let config = EngineConfig { eof, ..EngineConfig::default() };
            let mut bf = with_config("+++,", "", config);
            bf.run().unwrap();
            bf.current_cell()
        };
        assert_eq!(run_with(EofPolicy::SetToZero), 0);
        assert_eq!(run_with(EofPolicy::LeaveUnchanged), 3);
        assert_eq!(run_with(EofPolicy::SetToMinusOne), 255);
    }

    #[test]
    fn eof_minus_one_uses_thirty_two_bit_max() {
        let config = EngineConfig {
            eof: EofPolicy::SetToMinusOne,
            cell_width: CellWidth::ThirtyTwoBit,
            ..EngineConfig::default()
        };
        let mut bf = with_config(",", "", config);
        bf.run().unwrap();
        assert_eq!(bf.current_cell(), u32::MAX);
    }

    #[test]
    fn thirty_two_bit_cells_do_not_wrap_at_255() {
        let config = EngineConfig { cell_width: CellWidth::ThirtyTwoBit, ..EngineConfig::default() };
        let mut bf = with_config(&"+".repeat(256), "", config);
        bf.run().unwrap();
        assert_eq!(bf.current_cell(), 256);

        let mut bf = with_config("-", "", config);
        bf.run().unwrap();
        assert_eq!(bf.current_cell(), u32::MAX);
    }

    #[test]
    fn step_back_without_history_fails() {
        let config = EngineConfig { record_history: false, ..EngineConfig::default() };
        let mut bf = with_config("+", "", config);
        bf.step().unwrap();
        assert_eq!(bf.step_back(), Err(EngineError::HistoryNotRecorded));
        assert!(!bf.can_step_back());
    }

    #[test]
    fn step_back_at_start_is_noop() {
        let mut bf = engine("+", "");
        bf.step_back().unwrap();
        assert_eq!(bf.snapshot(), engine("+", "").snapshot());
        assert!(!bf.can_step_back());
    }

    #[test]
    fn step_back_undoes_wraparound() {
        let mut bf = engine("-", "");
        bf.step().unwrap();
        assert_eq!(bf.current_cell(), 255);
        bf.step_back().unwrap();
        assert_eq!(bf.current_cell(), 0);
        assert_eq!(bf.program_counter(), 0);
    }

    #[test]
    fn step_back_restores_taken_jump() {
        let mut bf = engine("[>]+", "");
        bf.step().unwrap();
        assert_eq!(bf.program_counter(), 3);
        bf.step_back().unwrap();
        assert_eq!(bf.program_counter(), 0);
        assert_eq!(bf.step_count(), 0);
    }

    #[test]
    fn step_back_restores_input_and_cell() {
        let mut bf = engine("+,", "xy");
        bf.run().unwrap();
        assert_eq!(bf.current_cell(), 'x' as u32);
        bf.step_back().unwrap();
        assert_eq!(bf.current_cell(), 1);
        assert_eq!(bf.remaining_input(), "xy");
    }

    #[test]
    fn step_back_over_eof_read_keeps_input_empty() {
        let config = EngineConfig { eof: EofPolicy::SetToMinusOne, ..EngineConfig::default() };
        let mut bf = with_config(",", "", config);
        bf.run().unwrap();
        bf.step_back().unwrap();
        assert_eq!(bf.remaining_input(), "");
        assert_eq!(bf.current_cell(), 0);
        bf.step().unwrap();
        assert_eq!(bf.current_cell(), 255);
    }

    #[test]
    fn step_back_removes_output() {
        let mut bf = engine("+.+.", "");
        bf.run().unwrap();
        bf.step_back().unwrap();
        assert_eq!(bf.stdout(), &[1]);
    }

    #[test]
    fn run_suspends_after_breakpoint() {
        let config = EngineConfig { breakpoint: Some('@'), ..EngineConfig::default() };
        let mut bf = with_config("+@+.", "", config);
        assert_eq!(bf.run().unwrap(), RunOutcome::Breakpoint { at: 1 });
        assert_eq!(bf.program_counter(), 2);
        assert_eq!(bf.step_count(), 2);
        assert_eq!(bf.memory(), vec![1]);

        assert_eq!(bf.run().unwrap(), RunOutcome::Halted);
        assert_eq!(bf.stdout(), &[2]);
    }

    #[test]
    fn breakpoint_is_ignored_when_not_configured() {
        let mut bf = engine("+@+", "");
        assert_eq!(bf.run().unwrap(), RunOutcome::Halted);
        assert_eq!(bf.program().len(), 2);
        assert_eq!(bf.current_cell(), 2);
    }

    #[test]
    fn instruction_used_as_breakpoint_keeps_its_meaning() {
        let config = EngineConfig { breakpoint: Some('.'), ..EngineConfig::default() };
        let mut bf = with_config("+.+.", "", config);
        assert_eq!(bf.run().unwrap(), RunOutcome::Breakpoint { at: 1 });
        assert_eq!(bf.stdout(), &[1]);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut bf = engine(",.", "q");
        bf.run().unwrap();
        bf.reset();
        assert_eq!(bf.snapshot(), engine(",.", "q").snapshot());
        assert_eq!(bf.remaining_input(), "q");
    }

    #[test]
    fn history_disabled_still_runs() {
        let config = EngineConfig { record_history: false, ..EngineConfig::default() };
        let mut bf = with_config(",[.,]", "hi", config);
        bf.run().unwrap();
        assert_eq!(bf.stdout(), &['h' as u32, 'i' as u32]);
    }
}
