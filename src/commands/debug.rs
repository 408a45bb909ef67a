use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Args;

use crate::cli_util::print_engine_error;
use crate::commands::{EngineArgs, SourceArgs};
use crate::control::StepControl;
use crate::debugger::Session;
use crate::repl::{ModeFlagOverride, ReplMode, bare_loop, editor_loop, select_mode};

#[derive(Args, Debug)]
#[command(disable_help_flag = true)]
pub struct DebugArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    #[command(flatten)]
    pub engine: EngineArgs,

    /// Do not record history (disables `back`)
    #[arg(long = "no-history")]
    pub no_history: bool,

    /// Step limit for each `run` command
    #[arg(long = "max-steps", value_name = "N")]
    pub max_steps: Option<usize>,

    /// Force non-interactive bare mode
    #[arg(long = "bare", conflicts_with = "editor")]
    pub bare: bool,

    /// Force interactive mode (errors if stdin is not a TTY)
    #[arg(long = "editor", conflicts_with = "bare")]
    pub editor: bool,

    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    pub help: bool,
}

pub fn run(program: &str, args: DebugArgs) -> i32 {
    if args.help {
        usage_and_exit(program, 0);
    }

    if args.source.file.is_some() && !args.source.code.is_empty() {
        eprintln!("{program}: cannot use positional code together with --file");
        usage_and_exit(program, 2);
    }

    let mode_flag = if args.bare {
        ModeFlagOverride::Bare
    } else if args.editor {
        ModeFlagOverride::Editor
    } else {
        ModeFlagOverride::None
    };
    let mode = match select_mode(mode_flag) {
        Ok(m) => m,
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    let code_str = match args.source.load_code() {
        Ok(Some(code)) => code,
        Ok(None) => usage_and_exit(program, 2),
        Err(msg) => {
            eprintln!("{program}: {msg}");
            let _ = io::stderr().flush();
            return 1;
        }
    };

    // Piped stdin carries debugger commands, never program input
    let input = match args.source.load_input(false) {
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
    if args.no_history {
        config.record_history = false;
    }

    let session = match Session::new(&code_str, &input, config) {
        Ok(s) => s,
        Err(err) => {
            print_engine_error(Some(program), &code_str, config.breakpoint, &err);
            return 1;
        }
    };

    // Ctrl+C interrupts a runaway `run` instead of killing the session
    let cancel = Arc::new(AtomicBool::new(false));
    let cancel_for_signal = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || cancel_for_signal.store(true, Ordering::Relaxed)) {
        eprintln!("{program}: failed to set ctrl+c handler: {e}");
        let _ = io::stderr().flush();
        return 1;
    }
    let mut session = session.with_control(StepControl::new(args.max_steps, cancel));

    let result = match mode {
        ReplMode::Editor => {
            if io::stderr().is_terminal() {
                eprintln!("Brainfuck debugger. Type 'help' for commands, ctrl+d to exit");
                let _ = io::stderr().flush();
            }
            session = session.with_color(io::stdout().is_terminal());
            editor_loop(&mut session)
        }
        ReplMode::Bare => {
            let stdin = io::stdin();
            let mut stdout = io::stdout();
            bare_loop(&mut session, stdin.lock(), &mut stdout)
        }
    };

    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{program}: debugger error: {e}");
            let _ = io::stderr().flush();
            1
        }
    }
}

fn usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} debug [OPTIONS] "<code>"
  {0} debug [OPTIONS] --file <PATH>

Options:
  --file,  -f <PATH>     Read Brainfuck code from PATH instead of positional "<code>"
  --input, -i <TEXT>     Text consumed by ','
  --input-file <PATH>    Read the text consumed by ',' from PATH
  --eof <POLICY>         On exhausted input: zero (default), unchanged, max
  --cell-width <BITS>    8 (default) or 32
  --breakpoint <CHAR>    'run' suspends after executing CHAR
  --no-history           Do not record history; 'back' is unavailable
  --max-steps <N>        Step limit for each 'run'
  --bare                 Force non-interactive bare mode
  --editor               Force interactive editor mode (errors if stdin is not a TTY)
  --help,  -h            Show this help

Description:
  Steps through a program forwards and backwards. In bare mode (piped stdin)
  one command is read per line and only results are printed.

Commands:
  step [N], back [N], run, reset, mem [ascii|hex|dec], out [ascii|hex|dec], where, state, help, quit

Notes:
    - Ctrl+C interrupts a running 'run' command.
    - Ctrl+D leaves the debugger.
    - Mode selection:
        * Flags: --bare|--editor override environment and auto-detection.
        * Env: BF_DEBUG_MODE=bare|editor overrides auto-detection.
        * Auto-detect: if stdin is a TTY, starts in interactive editor mode; otherwise, bare mode.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}
