//! A reversible Brainfuck interpreter.
//!
//! Every forward [`Engine::step`] has an exact inverse, [`Engine::step_back`],
//! so a program can be rewound one instruction at a time and replayed to an
//! identical state.
//!
//! Features and behaviors:
//! - Memory is sparse and unbounded in both directions; unvisited cells read as 0.
//! - Cells are 8 or 32 bits wide and wrap on overflow and underflow.
//! - Input `,` consumes from a fixed input string; what happens at end of
//!   input is set by [`EofPolicy`].
//! - Output `.` appends the current cell to an output buffer.
//! - Brackets are paired once at load time; unmatched brackets are reported
//!   before anything runs.
//! - Characters outside `><+-.,[]` are ignored as comments, except for an
//!   optional breakpoint character that makes [`Engine::run`] return right
//!   after executing it.
//!
//! Quick start:
//!
//! ```
//! use rewind_bf::{Engine, EngineConfig};
//!
//! let code = "++++++++[>++++++++<-]>+.";  // prints 'A'
//! let mut bf = Engine::new(code, "", EngineConfig::default()).unwrap();
//! bf.run().unwrap();
//! assert_eq!(bf.stdout(), &[65]);
//!
//! // Rewind the last three instructions and replay them.
//! for _ in 0..3 { bf.step_back().unwrap(); }
//! assert!(bf.stdout().is_empty());
//! for _ in 0..3 { bf.step().unwrap(); }
//! assert_eq!(bf.stdout(), &[65]);
//! ```

pub mod cli_util;
pub mod commands;
pub mod config;
pub mod control;
pub mod debugger;
pub mod engine;
pub mod error;
pub mod format;
pub mod history;
pub mod logging;
pub mod memory;
pub mod program;
pub mod repl;
pub mod theme;

pub use config::{CellWidth, EngineConfig, EofPolicy};
pub use control::{ControlError, StepControl, run_with_control};
pub use engine::{Engine, EngineSnapshot, RunOutcome};
pub use error::{ConfigError, EngineError, UnmatchedBracketKind};
pub use format::{TextFormat, format_cells};
pub use program::Program;
