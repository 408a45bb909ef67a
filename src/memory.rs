use std::collections::HashMap;

/// Sparse, unbounded memory tape.
///
/// Cells live in a map keyed by signed index; anything never written reads
/// as 0. `min_index`/`max_index` remember the widest span the pointer has
/// visited and only grow, so the dense snapshot covers every visited cell.
#[derive(Debug, Clone, Default)]
pub struct Tape {
    cells: HashMap<i64, u32>,
    pointer: i64,
    min_index: i64,
    max_index: i64,
}

impl Tape {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer(&self) -> i64 {
        self.pointer
    }

    pub fn get(&self, index: i64) -> u32 {
        self.cells.get(&index).copied().unwrap_or(0)
    }

    pub fn current(&self) -> u32 {
        self.get(self.pointer)
    }

    pub fn set_current(&mut self, value: u32) {
        self.cells.insert(self.pointer, value);
    }

    pub fn move_left(&mut self) {
        if self.pointer == self.min_index {
            self.min_index -= 1;
        }
        self.pointer -= 1;
    }

    pub fn move_right(&mut self) {
        if self.pointer == self.max_index {
            self.max_index += 1;
        }
        self.pointer += 1;
    }

    /// Add one to the current cell, wrapping `max_value` to 0.
    pub fn increment(&mut self, max_value: u32) {
        let after = match self.cells.get(&self.pointer) {
            None => 1,
            Some(&v) if v >= max_value => 0,
            Some(&v) => v + 1,
        };
        self.set_current(after);
    }

    /// Subtract one from the current cell, wrapping 0 to `max_value`.
    pub fn decrement(&mut self, max_value: u32) {
        let after = match self.cells.get(&self.pointer) {
            None | Some(0) => max_value,
            Some(&v) => v - 1,
        };
        self.set_current(after);
    }

    /// Visited span as `(min_index, max_index)`, inclusive.
    pub fn bounds(&self) -> (i64, i64) {
        (self.min_index, self.max_index)
    }

    /// Dense copy of every visited cell, from `min_index` to `max_index`.
    pub fn snapshot(&self) -> Vec<u32> {
        (self.min_index..=self.max_index).map(|i| self.get(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_tape_snapshot_is_single_zero() {
        assert_eq!(Tape::new().snapshot(), vec![0]);
    }

    #[test]
    fn moving_left_grows_the_window_downwards() {
        let mut tape = Tape::new();
        tape.move_left();
        tape.increment(255);
        tape.move_right();
        tape.move_right();
        assert_eq!(tape.pointer(), 1);
        assert_eq!(tape.bounds(), (-1, 1));
        assert_eq!(tape.snapshot(), vec![1, 0, 0]);
    }

    #[test]
    fn bounds_never_shrink() {
        let mut tape = Tape::new();
        tape.move_right();
        tape.move_right();
        tape.move_left();
        tape.move_left();
        assert_eq!(tape.bounds(), (0, 2));
    }

    #[test]
    fn increment_wraps_at_max_value() {
        let mut tape = Tape::new();
        tape.set_current(255);
        tape.increment(255);
        assert_eq!(tape.current(), 0);

        tape.set_current(u32::MAX);
        tape.increment(u32::MAX);
        assert_eq!(tape.current(), 0);
    }

    #[test]
    fn decrement_wraps_at_zero() {
        let mut tape = Tape::new();
        tape.decrement(255);
        assert_eq!(tape.current(), 255);

        tape.move_right();
        tape.decrement(u32::MAX);
        assert_eq!(tape.current(), u32::MAX);
    }
}
