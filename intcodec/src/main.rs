use std::{
    collections::VecDeque,
    fs,
    io::{self, BufRead},
    path::PathBuf,
    process::ExitCode,
};

use clap::Parser;
use intcode_base::{io::InputSource, network, program::Program, runner::Runner};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about, long_about, arg_required_else_help(true))]
struct Args {
    /// File to execute
    file: PathBuf,

    /// Assembly file
    #[arg(short, long)]
    assembly: bool,

    /// Output file for assembled program (--assembly)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Do not execute file
    #[arg(short, long)]
    no_exec: bool,

    /// Comma separated input values
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    input: Vec<i64>,

    /// Read input values from stdin, one per line
    #[arg(long, conflicts_with = "input")]
    stdin: bool,

    /// Run a feedback ring of instances with these phase settings
    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    phases: Vec<i64>,

    /// Run instances one after another instead of a ring (--phases)
    #[arg(long, requires = "phases")]
    chain: bool,

    /// Print memory after program halts
    #[arg(short = 'm', long)]
    dump_memory: bool,

    /// Raise log level, can be repeated
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Reads values from stdin lazily, only when program executes `in`.
struct StdinInput {
    lines: io::Lines<io::StdinLock<'static>>,
}

impl InputSource for StdinInput {
    fn read(&mut self) -> Option<i64> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    warn!("failed to read stdin: {e}");
                    return None;
                }
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            return match line.parse() {
                Ok(v) => Some(v),
                Err(e) => {
                    warn!("invalid input value `{line}`: {e}");
                    None
                }
            };
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    let Args {
        file,
        assembly,
        output,
        no_exec,
        input,
        stdin,
        phases,
        chain,
        dump_memory,
        verbose,
    } = Args::parse();

    init_logging(verbose);

    let source = match fs::read_to_string(&file) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read file to UTF-8: {e}");

            return ExitCode::FAILURE;
        }
    };

    let program = if assembly {
        match intcode_as::assemble(&source) {
            Ok(v) => v,
            Err(e) => {
                let line = e.line();
                let fragment = source.lines().nth(line.saturating_sub(1)).unwrap_or_default();
                eprintln!("error:{}:{line}: {e}\n{fragment}", file.display());

                return ExitCode::FAILURE;
            }
        }
    } else {
        match Program::parse(&source) {
            Ok(v) => v,
            Err(e) => {
                eprintln!("error:{}: {e}", file.display());

                return ExitCode::FAILURE;
            }
        }
    };
    info!(len = program.len(), "program loaded");

    if let Some(output) = output {
        if assembly {
            if let Err(e) = fs::write(output, program.to_string()) {
                eprintln!("Failed to write to file: {e}");

                return ExitCode::FAILURE;
            }
        }
    }

    if no_exec {
        return ExitCode::SUCCESS;
    }

    if !phases.is_empty() {
        let signal = if chain {
            network::run_chain(&program, &phases)
        } else {
            network::run_feedback_loop(&program, &phases)
        };

        return match signal {
            Ok(v) => {
                println!("{v}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("runtime-error: {e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut runner = Runner::new(&program).with_output(|v: i64| println!("{v}"));
    if stdin {
        runner.connect_input(StdinInput {
            lines: io::stdin().lock().lines(),
        });
    } else if !input.is_empty() {
        debug!(count = input.len(), "input values given");
        runner.connect_input(VecDeque::from(input));
    }

    let memory = match runner.run() {
        Ok(v) => v,
        Err(e) => {
            eprintln!("runtime-error: {e}");

            return ExitCode::FAILURE;
        }
    };

    if dump_memory {
        println!("{}", Program::new(memory.to_vec()));
    }

    ExitCode::SUCCESS
}
