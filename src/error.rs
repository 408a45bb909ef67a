use std::fmt;

/// Errors raised while loading or executing a program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// Loops were not balanced; `ip` is the sanitized index of the offending bracket.
    #[error("Unmatched bracket {kind} at instruction {ip}")]
    UnmatchedBrackets { ip: usize, kind: UnmatchedBracketKind },

    /// Encountered a character outside the instruction set while stepping.
    #[error("Invalid instruction: '{ch}' at instruction {ip}")]
    InvalidInstruction { ch: char, ip: usize },

    /// `step_back` was called on an engine built without history recording.
    #[error("Cannot step back: execution history is not being recorded")]
    HistoryNotRecorded,
}

impl EngineError {
    /// Instruction index the error points at, when there is one.
    pub fn position(&self) -> Option<usize> {
        match self {
            EngineError::UnmatchedBrackets { ip, .. } => Some(*ip),
            EngineError::InvalidInstruction { ip, .. } => Some(*ip),
            EngineError::HistoryNotRecorded => None,
        }
    }
}

/// Which side of the loop was unmatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedBracketKind {
    Open,
    Close,
}

impl fmt::Display for UnmatchedBracketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedBracketKind::Open => write!(f, "'['"),
            UnmatchedBracketKind::Close => write!(f, "']'"),
        }
    }
}

/// Errors produced while resolving an [`EngineConfig`](crate::EngineConfig).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid EOF policy '{0}', expected one of: zero, unchanged, max")]
    InvalidEofPolicy(String),

    #[error("invalid cell width '{0}', expected 8 or 32")]
    InvalidCellWidth(String),

    #[error("invalid breakpoint '{0}', expected exactly one character")]
    InvalidBreakpoint(String),

    #[error("invalid boolean '{value}' for {key}, expected true or false")]
    InvalidFlag { key: String, value: String },
}
