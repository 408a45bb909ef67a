use std::collections::HashMap;

/// What a `,` overwrote, so the read can be undone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputRecord {
    /// Cell value before the read.
    pub previous: u32,
    /// Character taken from the input, or `None` when the read hit EOF.
    pub consumed: Option<char>,
}

/// Undo log for the two instructions whose effect can't be recomputed
/// from the instruction alone: taken jumps and input reads.
///
/// Entries are keyed by the step count at which the forward step ran and
/// are removed when that step is reversed.
#[derive(Debug, Clone, Default)]
pub struct History {
    jumps: HashMap<usize, usize>,
    inputs: HashMap<usize, InputRecord>,
}

impl History {
    pub fn record_jump(&mut self, step: usize, from_pc: usize) {
        self.jumps.insert(step, from_pc);
    }

    pub fn take_jump(&mut self, step: usize) -> Option<usize> {
        self.jumps.remove(&step)
    }

    pub fn record_input(&mut self, step: usize, record: InputRecord) {
        self.inputs.insert(step, record);
    }

    pub fn take_input(&mut self, step: usize) -> Option<InputRecord> {
        self.inputs.remove(&step)
    }

    pub fn len(&self) -> usize {
        self.jumps.len() + self.inputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jumps.is_empty() && self.inputs.is_empty()
    }
}
