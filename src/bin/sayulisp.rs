use std::{fs, path::PathBuf, process::ExitCode, thread};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use sayulisp::{Interpreter, Repl, SayulispError};

/// Script recursion maps onto native recursion, so the interpreter gets a
/// thread with room for `--max-depth` nested evaluations.
const INTERPRETER_STACK_BYTES: usize = 512 * 1024 * 1024;

#[derive(Parser)]
#[command(author, version, about = "Sayulisp interpreter")]
struct Args {
    /// Deepest evaluation nesting allowed before raising @runtime-error
    #[arg(long, default_value_t = 20_000)]
    max_depth: usize,
    /// Log engine activity to stderr (overrides RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a script file
    Run { script: PathBuf },
    /// Start an interactive REPL session
    Repl,
    /// Evaluate a snippet and print its value
    Eval { source: String },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);
    let worker = thread::Builder::new()
        .name("sayulisp".into())
        .stack_size(INTERPRETER_STACK_BYTES)
        .spawn(move || match execute(args) {
            Ok(()) => ExitCode::SUCCESS,
            Err(err) => {
                eprintln!("Error: {err}");
                ExitCode::FAILURE
            }
        });
    match worker {
        Ok(handle) => handle.join().unwrap_or(ExitCode::FAILURE),
        Err(err) => {
            eprintln!("Error: failed to start interpreter thread: {err}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("sayulisp=debug")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(args: Args) -> Result<(), SayulispError> {
    let mut interpreter = Interpreter::new();
    interpreter.set_max_depth(args.max_depth);
    match args.command.unwrap_or(Command::Repl) {
        Command::Run { script } => {
            let source = fs::read_to_string(&script)?;
            interpreter.eval_source(&source)?;
        }
        Command::Repl => Repl::with_interpreter(interpreter).run()?,
        Command::Eval { source } => {
            let value = interpreter.eval_source(&source)?;
            println!("{value}");
        }
    }
    Ok(())
}
