//! Program loading: sanitizing raw text and pairing brackets.

use crate::error::{EngineError, UnmatchedBracketKind};

/// The eight instruction characters.
pub const INSTRUCTIONS: [char; 8] = ['>', '<', '+', '-', '.', ',', '[', ']'];

/// Returns true when `ch` is one of `><+-.,[]`.
pub fn is_instruction(ch: char) -> bool {
    matches!(ch, '>' | '<' | '+' | '-' | '.' | ',' | '[' | ']')
}

/// A sanitized instruction sequence with its precomputed jump table.
///
/// Immutable once built. Every `[` is paired with exactly one `]` at a
/// greater index, so jumps resolve in O(1) during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    instructions: Vec<char>,
    // jump_map[i] holds the matching index for '[' or ']' at index i.
    jump_map: Vec<Option<usize>>,
    // Char offset in the raw text each instruction was taken from.
    source_offsets: Vec<usize>,
    source_len: usize,
}

impl Program {
    /// Sanitize `raw` and build the jump table.
    ///
    /// Anything outside the instruction alphabet (and the breakpoint
    /// character, when one is given) is dropped.
    pub fn new(raw: &str, breakpoint: Option<char>) -> Result<Self, EngineError> {
        let (instructions, source_offsets) = sanitize(raw, breakpoint);
        let jump_map = build_jump_table(&instructions)?;

        Ok(Self {
            instructions,
            jump_map,
            source_offsets,
            source_len: raw.chars().count(),
        })
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instruction(&self, pc: usize) -> Option<char> {
        self.instructions.get(pc).copied()
    }

    pub fn instructions(&self) -> &[char] {
        &self.instructions
    }

    /// The index of the bracket paired with the one at `pc`.
    pub fn matching(&self, pc: usize) -> Option<usize> {
        self.jump_map.get(pc).copied().flatten()
    }

    /// Number of bracket pairs in the jump table.
    pub fn bracket_pairs(&self) -> usize {
        self.jump_map.iter().filter(|j| j.is_some()).count() / 2
    }

    /// Map a program counter back to a char offset in the raw source text.
    ///
    /// A halted counter (`pc == len`) maps to the end of the source.
    pub fn source_offset(&self, pc: usize) -> usize {
        self.source_offsets.get(pc).copied().unwrap_or(self.source_len)
    }
}

/// Keep only instruction characters plus the breakpoint character.
///
/// Returns the kept characters and, for each, its char offset in `raw`.
pub fn sanitize(raw: &str, breakpoint: Option<char>) -> (Vec<char>, Vec<usize>) {
    raw.chars()
        .enumerate()
        .filter(|&(_, c)| is_instruction(c) || Some(c) == breakpoint)
        .map(|(offset, c)| (c, offset))
        .unzip()
}

/// Pair every bracket with a single left-to-right scan over an index stack.
pub fn build_jump_table(instructions: &[char]) -> Result<Vec<Option<usize>>, EngineError> {
    let mut jump_map: Vec<Option<usize>> = vec![None; instructions.len()];
    let mut stack: Vec<usize> = Vec::new();

    for (i, &c) in instructions.iter().enumerate() {
        if c == '[' {
            stack.push(i);
        } else if c == ']' {
            let Some(open_index) = stack.pop() else {
                return Err(EngineError::UnmatchedBrackets {
                    ip: i,
                    kind: UnmatchedBracketKind::Close,
                });
            };
            jump_map[open_index] = Some(i);
            jump_map[i] = Some(open_index);
        }
    }

    if let Some(unmatched_open) = stack.last().copied() {
        return Err(EngineError::UnmatchedBrackets {
            ip: unmatched_open,
            kind: UnmatchedBracketKind::Open,
        });
    }

    Ok(jump_map)
}
