pub mod debug;
pub mod run;

use std::fs;
use std::io::{self, IsTerminal, Read};

use clap::Args;

use crate::config::{CellWidth, EngineConfig, EofPolicy, parse_breakpoint};
use crate::error::ConfigError;

/// Engine settings shared by every subcommand. Flags win over `BF_*`
/// environment variables, which win over `bf.toml`.
#[derive(Args, Debug, Default)]
pub struct EngineArgs {
    /// End-of-input policy for ',': zero, unchanged or max
    #[arg(long = "eof", value_name = "POLICY")]
    pub eof: Option<EofPolicy>,

    /// Cell width in bits: 8 or 32
    #[arg(long = "cell-width", value_name = "BITS")]
    pub cell_width: Option<CellWidth>,

    /// Character that suspends `run` after it executes
    #[arg(long = "breakpoint", value_name = "CHAR")]
    pub breakpoint: Option<String>,
}

impl EngineArgs {
    pub fn resolve(&self) -> Result<EngineConfig, ConfigError> {
        let mut cfg = EngineConfig::load()?;
        if let Some(eof) = self.eof {
            cfg.eof = eof;
        }
        if let Some(width) = self.cell_width {
            cfg.cell_width = width;
        }
        if let Some(bp) = self.breakpoint.as_deref() {
            cfg.breakpoint = parse_breakpoint(bp)?;
        }
        Ok(cfg)
    }
}

/// Where the program text and its input come from.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// Read Brainfuck code from PATH instead of positional "<code>"
    #[arg(short = 'f', long = "file", value_name = "PATH")]
    pub file: Option<String>,

    /// Text consumed by ','
    #[arg(short = 'i', long = "input", value_name = "TEXT", conflicts_with = "input_file")]
    pub input: Option<String>,

    /// Read the text consumed by ',' from PATH
    #[arg(long = "input-file", value_name = "PATH")]
    pub input_file: Option<String>,

    /// Concatenated Brainfuck code parts
    #[arg(value_name = "code", trailing_var_arg = true)]
    pub code: Vec<String>,
}

impl SourceArgs {
    /// Load the program text. `Ok(None)` means nothing was given.
    pub fn load_code(&self) -> Result<Option<String>, String> {
        if self.file.is_some() && !self.code.is_empty() {
            return Err("cannot use positional code together with --file".to_string());
        }
        match &self.file {
            Some(path) => fs::read_to_string(path)
                .map(Some)
                .map_err(|e| format!("failed to read code file as UTF-8: {e}")),
            None if self.code.is_empty() => Ok(None),
            None => Ok(Some(self.code.join(""))),
        }
    }

    /// Input text from `--input`, `--input-file`, or piped stdin when
    /// `stdin_is_input` is set.
    pub fn load_input(&self, stdin_is_input: bool) -> Result<String, String> {
        if let Some(text) = &self.input {
            return Ok(text.clone());
        }
        if let Some(path) = &self.input_file {
            return fs::read_to_string(path).map_err(|e| format!("failed to read input file as UTF-8: {e}"));
        }
        if stdin_is_input && !io::stdin().is_terminal() {
            let mut s = String::new();
            io::stdin()
                .read_to_string(&mut s)
                .map_err(|e| format!("failed reading UTF-8 from stdin: {e}"))?;
            return Ok(s);
        }
        Ok(String::new())
    }
}
