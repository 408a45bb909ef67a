use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

use clap::Args;
use tracing::{debug, warn};

use crate::cli_util::{print_control_error, print_engine_error};
use crate::commands::{EngineArgs, SourceArgs};
use crate::control::{ControlError, StepControl, run_with_control};
use crate::engine::{Engine, RunOutcome};
use crate::format::{TextFormat, format_cells};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct RunArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Render output as ascii, hex or dec
    #[arg(long = "format", value_name = "FMT", default_value = "ascii")]
    pub format: TextFormat,

    /// Wall-clock timeout in milliseconds (fallback BF_TIMEOUT_MS; default 2_000)
    #[arg(long = "timeout", value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Maximum interpreter steps before abort (fallback BF_MAX_STEPS; default unlimited)
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<u64>,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: RunArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    if args.source.file.is_some() && !args.source.code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let code_str = match args.source.load_code() {
        Ok(Some(code)) => code,
        Ok(None) => usage_and_exit(program, 2),
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let input = match args.source.load_input(true) {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let mut config = match args.engine.resolve() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{program}: {e}");
            let _ = io::stderr().flush();
            return 2;
        }
    };
    // A straight run never steps back; recording would only grow memory.
    config.record_history = false;

    let engine = match Engine::new(&code_str, &input, config) {
        Ok(engine) => engine,
        Err(err) => {
            print_engine_error(Some(program), &code_str, config.breakpoint, &err);
            println!();
            let _ = io::stdout().flush();
            return 1;
        }
    };

    // Resolve limits: flags -> env -> defaults
    let timeout_ms = args.timeout_ms
        .or_else(|| std::env::var("BF_TIMEOUT_MS").ok().and_then(|s| s.parse::<u64>().ok()))
        .unwrap_or(2_000);
    let max_steps = args.max_steps
        .or_else(|| std::env::var("BF_MAX_STEPS").ok().and_then(|s| s.parse::<u64>().ok()))
        .map(|n| usize::try_from(n).unwrap_or(usize::MAX));

    // Execute on a worker thread with cooperative cancellation
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_signal = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || cancel_for_signal.store(true, Ordering::Relaxed)) {
        warn!("failed to set ctrl+c handler: {e}");
    }

    let (tx, rx) = mpsc::channel::<(Engine, Result<RunOutcome, ControlError>)>();
    let ctrl = StepControl::new(max_steps, cancel.clone());
    thread::spawn(move || {
        let mut engine = engine;
        let res = run_with_control(&mut engine, &ctrl);
        let _ = tx.send((engine, res));
    });

    let timeout = Duration::from_millis(timeout_ms);
    let mut timed_out = false;
    let received = match rx.recv_timeout(timeout) {
        Ok(done) => Some(done),
        Err(mpsc::RecvTimeoutError::Timeout) => {
            timed_out = true;
            cancel.store(true, Ordering::Relaxed);
            rx.recv().ok()
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => None,
    };
    let Some((engine, result)) = received else {
        return 1;
    };
    debug!(steps = engine.step_count(), "run finished");

    // Whatever was produced before an abort is still shown
    print!("{}", format_cells(engine.stdout(), args.format));

    let exit_code = match result {
        Ok(RunOutcome::Halted) => 0,
        Ok(RunOutcome::Breakpoint { at }) => {
            eprintln!("{program}: suspended at breakpoint (instruction {at}, step {})", engine.step_count());
            let _ = io::stderr().flush();
            0
        }
        Err(ControlError::Canceled) if timed_out => {
            eprintln!("Execution aborted: wall-clock timeout exceeded ({timeout_ms} ms)");
            let _ = io::stderr().flush();
            1
        }
        Err(err) => {
            print_control_error(Some(program), &code_str, config.breakpoint, &err);
            1
        }
    };

    // For readability, ensure output ends with a newline
    println!();
    let _ = io::stdout().flush();
    exit_code
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run [OPTIONS] "<code>"
  {0} run [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>     Read Brainfuck code from PATH instead of positional "<code>"
  --input, -i <TEXT>     Text consumed by ',' (otherwise piped stdin, otherwise empty)
  --input-file <PATH>    Read the text consumed by ',' from PATH
  --eof <POLICY>         On exhausted input: zero (default), unchanged, max
  --cell-width <BITS>    8 (default) or 32
  --breakpoint <CHAR>    Suspend after executing CHAR
  --format <FMT>         Render output as ascii (default), hex or dec
  --timeout <MS>         Wall-clock limit (fallback BF_TIMEOUT_MS; default 2000)
  --max-steps <N>        Step limit (fallback BF_MAX_STEPS; default unlimited)
  --help,  -h            Show this help

Notes:
- Characters outside of ><+-.,[] (and the breakpoint) are ignored as comments.
- Memory is unbounded in both directions.
- Settings may also come from BF_EOF, BF_CELL_WIDTH, BF_BREAKPOINT and the
  [engine] section of bf.toml in your config directory.

Examples:
- Load Brainfuck code from a file:
    {0} run --file ./program.bf
- Feed a file to ',':
    {0} run ",[.,]" < input.txt
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
