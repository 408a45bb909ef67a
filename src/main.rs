use std::env;
use std::io::{self, Write};

use clap::{Parser, Subcommand};
use rewind_bf::commands::debug::{self, DebugArgs};
use rewind_bf::commands::run::{self, RunArgs};
use rewind_bf::logging;

fn print_top_usage_and_exit(program: &str, code: i32) -> ! {
    eprintln!(
        r#"Usage:
  {0} run   [OPTIONS] "<code>"       # Run Brainfuck code (args are concatenated)
  {0} run   [OPTIONS] --file <PATH>  # Run Brainfuck code loaded from file
  {0} debug [OPTIONS] "<code>"       # Step through code forwards and backwards
  {0} debug [OPTIONS] --file <PATH>  # Debug code loaded from file

Run "{0} <subcommand> --help" for more info.
"#,
        program
    );
    let _ = io::stderr().flush();
    std::process::exit(code);
}

#[derive(Parser, Debug)]
#[command(name = "bf", disable_help_flag = true, disable_help_subcommand = true)]
struct Cli {
    /// Show this help
    #[arg(short = 'h', long = "help", action = clap::ArgAction::SetTrue)]
    help: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Run(RunArgs),
    Debug(DebugArgs),
}

fn main() {
    // We still pull the program name for help rendering consistency
    let program = env::args().next().unwrap_or_else(|| String::from("bf"));

    let cli = Cli::parse();
    logging::init();

    let Some(command) = cli.command else {
        print_top_usage_and_exit(&program, if cli.help { 0 } else { 2 });
    };
    if cli.help {
        print_top_usage_and_exit(&program, 0);
    }

    let code = match command {
        Command::Run(args) => run::run(&program, args),
        Command::Debug(args) => debug::run(&program, args),
    };

    std::process::exit(code);
}
