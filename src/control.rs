//! Cooperative cancellation and step limiting for callers that run an
//! engine on a worker thread.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::debug;

use crate::engine::{Engine, RunOutcome};
use crate::error::EngineError;

/// Controls for cooperative cancellation and step limiting.
#[derive(Clone)]
pub struct StepControl {
    pub max_steps: Option<usize>,
    pub cancel_flag: Arc<AtomicBool>,
}

impl StepControl {
    pub fn new(max_steps: Option<usize>, cancel_flag: Arc<AtomicBool>) -> Self {
        Self { max_steps, cancel_flag }
    }
}

/// Reasons a controlled run stops short of halting.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Execution aborted due to step limit.
    #[error("Execution aborted: step limit exceeded ({limit})")]
    StepLimitExceeded { limit: usize },

    /// Execution aborted due to cooperative cancellation (e.g., timeout)
    #[error("Execution aborted: cancelled")]
    Canceled,
}

/// Like [`Engine::run`], but checks `control` before every instruction.
///
/// The step budget counts steps taken by this call, not the engine's
/// total step count.
pub fn run_with_control(engine: &mut Engine, control: &StepControl) -> Result<RunOutcome, ControlError> {
    let breakpoint = engine.config().breakpoint;
    let mut steps: usize = 0;

    while let Some(instr) = engine.current_instruction() {
        if control.cancel_flag.load(Ordering::Relaxed) {
            debug!(steps, "run cancelled");
            return Err(ControlError::Canceled);
        }
        if let Some(max) = control.max_steps {
            if steps >= max {
                return Err(ControlError::StepLimitExceeded { limit: max });
            }
        }

        engine.step()?;
        steps += 1;

        if breakpoint == Some(instr) {
            return Ok(RunOutcome::Breakpoint { at: engine.program_counter() - 1 });
        }
    }

    Ok(RunOutcome::Halted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;

    fn control(max_steps: Option<usize>) -> StepControl {
        StepControl::new(max_steps, Arc::new(AtomicBool::new(false)))
    }

    #[test]
    fn step_limit_stops_infinite_loop() {
        let mut bf = Engine::new("+[]", "", EngineConfig::default()).unwrap();
        let result = run_with_control(&mut bf, &control(Some(50)));
        assert!(matches!(result, Err(ControlError::StepLimitExceeded { limit: 50 })));
        assert_eq!(bf.step_count(), 50);
    }

    #[test]
    fn cancel_flag_stops_before_first_step() {
        let ctrl = control(None);
        ctrl.cancel_flag.store(true, Ordering::Relaxed);
        let mut bf = Engine::new("+++", "", EngineConfig::default()).unwrap();
        assert!(matches!(run_with_control(&mut bf, &ctrl), Err(ControlError::Canceled)));
        assert_eq!(bf.step_count(), 0);
    }

    #[test]
    fn matches_plain_run_when_unconstrained() {
        let config = EngineConfig { breakpoint: Some('#'), ..EngineConfig::default() };
        let mut controlled = Engine::new("+#+.", "", config).unwrap();
        let mut plain = controlled.clone();

        assert_eq!(run_with_control(&mut controlled, &control(None)).unwrap(), plain.run().unwrap());
        assert_eq!(controlled.snapshot(), plain.snapshot());
        assert_eq!(run_with_control(&mut controlled, &control(None)).unwrap(), RunOutcome::Halted);
    }
}
