use std::collections::VecDeque;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;

use lmc_ensemble::asm::{assemble_with, AsmFlags, ObjectFile, SourceInfo};
use lmc_ensemble::ast::Instr;
use lmc_ensemble::err::Error;
use lmc_ensemble::sim::io::{BiChannelIO, IODevice};
use lmc_ensemble::sim::mem::{AccPolicy, Word};
use lmc_ensemble::sim::{SimErr, SimFlags, Simulator};

/// Assembler and simulator for the Little Man Computer.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Show more logging (-v for debug, -vv for every step)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Assemble and run a program, printing each output on its own line
    Run {
        /// Source file to run
        name: PathBuf,
        /// Input value for an INP instruction (can be repeated); stdin is read after these run out
        #[arg(short, long = "input", allow_hyphen_values = true)]
        inputs: Vec<String>,
        /// Maximum number of instructions to execute
        #[arg(short, long)]
        limit: Option<u64>,
        /// Pause before each instruction, in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
        /// Report bad operands and illegal opcodes instead of ignoring them
        #[arg(long)]
        strict: bool,
        /// How results are fit into the accumulator (unchecked, wrap, or clamp)
        #[arg(long, default_value_t = AccPolicy::Unchecked)]
        policy: AccPolicy,
    },
    /// Assemble a program and print its memory image
    Assemble {
        /// Source file to assemble
        name: PathBuf,
        /// Report bad operands instead of ignoring them
        #[arg(long)]
        strict: bool,
        /// Print one line per written cell, with its instruction and label
        #[arg(long)]
        listing: bool,
    },
    /// Check a program for errors without running it
    Check {
        /// Source file to check
        name: PathBuf,
        /// Report bad operands instead of ignoring them
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger(args.verbose);

    match args.command {
        Command::Run { name, inputs, limit, delay_ms, strict, policy } => {
            let flags = SimFlags { strict, acc_policy: policy };
            run(&name, inputs, limit, Duration::from_millis(delay_ms), flags)
        },
        Command::Assemble { name, strict, listing } => {
            let Some((_, obj)) = load(&name, strict) else { return ExitCode::FAILURE };
            match listing {
                true  => print_listing(&obj),
                false => print_image(&obj),
            }
            ExitCode::SUCCESS
        },
        Command::Check { name, strict } => {
            let Some((_, obj)) = load(&name, strict) else { return ExitCode::FAILURE };
            println!("{}: no errors found ({} of 100 cells used)", name.display(), obj.len());
            ExitCode::SUCCESS
        },
    }
}

/// Sets up logging, using `RUST_LOG` if it is set.
fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

/// Reads and assembles a file, reporting any errors.
fn load(name: &Path, strict: bool) -> Option<(SourceInfo, ObjectFile)> {
    let src = match std::fs::read_to_string(name) {
        Ok(src) => src,
        Err(e) => {
            eprintln!("error: could not read {}: {e}", name.display());
            return None;
        }
    };

    let flags = AsmFlags { strict, debug_symbols: true };
    match assemble_with(&src, flags) {
        Ok(obj) => Some((SourceInfo::new(&src), obj)),
        Err(e) => {
            let span = e.span().map(|s| s.first());
            report(name, &SourceInfo::new(&src), &e, span);
            None
        }
    }
}

/// Prints an error, pointing at the given source span.
fn report(name: &Path, info: &SourceInfo, err: &dyn Error, span: Option<Range<usize>>) {
    eprintln!("error: {err}");

    if let Some(span) = span {
        let (lno, cno) = info.position(span.start);
        eprintln!(" --> {}:{}:{}", name.display(), lno + 1, cno + 1);

        let raw_line = info.source()
            .lines()
            .nth(lno)
            .unwrap_or("")
            .trim_end();
        let gutter = " ".repeat((lno + 1).to_string().len());
        let width = span.len().clamp(1, raw_line.len().saturating_sub(cno).max(1));

        eprintln!("{gutter} |");
        eprintln!("{} | {raw_line}", lno + 1);
        eprintln!("{gutter} | {}{}", " ".repeat(cno), "^".repeat(width));
    }

    if let Some(help) = err.help() {
        eprintln!("help: {help}");
    }
}

/// Prints the memory image as a 10x10 grid.
fn print_image(obj: &ObjectFile) {
    for row in obj.words().chunks(10) {
        let row: Vec<_> = row.iter().map(|w| format!("{w:03}")).collect();
        println!("{}", row.join(" "));
    }
}

/// Prints every cell written by the program along with its decoded instruction (or its `DAT` value).
fn print_listing(obj: &ObjectFile) {
    let sym = obj.symbol_table();
    for (addr, word) in obj.addr_iter() {
        let is_data = sym.is_some_and(|s| s.is_data(addr));
        let instr = match Instr::decode(word) {
            Some(i) if !is_data => i.to_string(),
            _ => format!("DAT {word}"),
        };
        let label = sym.and_then(|s| s.rev_lookup_label(addr)).unwrap_or("");
        let line = format!("{addr:02}  {word:03}  {instr:<7} {label}");
        println!("{}", line.trim_end());
    }
}

/// Input from the command line, then from stdin.
/// Output goes to stdout.
struct HostIO {
    queued: VecDeque<String>,
    stdio: BiChannelIO,
}
impl IODevice for HostIO {
    fn read_input(&mut self) -> Option<String> {
        self.queued.pop_front()
            .or_else(|| self.stdio.read_input())
    }

    fn write_output(&mut self, value: Word) {
        self.stdio.write_output(value);
    }
}

fn run(name: &Path, inputs: Vec<String>, limit: Option<u64>, delay: Duration, flags: SimFlags) -> ExitCode {
    let Some((info, obj)) = load(name, flags.strict) else { return ExitCode::FAILURE };

    let mut sim = Simulator::new(flags);
    sim.load_obj_file(&obj);

    let mut io = HostIO { queued: inputs.into(), stdio: BiChannelIO::stdio() };
    let result = loop {
        let result = sim.run_io_while(&mut io, |sim| {
            if !delay.is_zero() {
                std::thread::sleep(delay);
            }
            limit.map_or(true, |n| sim.instructions_run < n)
        });

        match result {
            Err(SimErr::InvalidInput(token)) => log::warn!("ignoring input {token:?}, expected an integer"),
            r => break r,
        }
    };
    io.stdio.close();

    let limit_hit = limit.is_some_and(|n| sim.instructions_run >= n);
    match result {
        Ok(()) if sim.hit_halt() => {
            log::debug!("halted after {} instruction(s)", sim.instructions_run);
            ExitCode::SUCCESS
        },
        Ok(()) if sim.awaiting_input() && !limit_hit => {
            eprintln!("error: program is waiting for input at {:02}, but there is no more input", sim.prefetch_pc());
            ExitCode::FAILURE
        },
        Ok(()) => {
            eprintln!("error: stopped after {} instruction(s) without halting", sim.instructions_run);
            eprintln!("{}", sim.state);
            ExitCode::FAILURE
        },
        Err(e) => {
            let addr = sim.prefetch_pc();
            let span = obj.symbol_table()
                .and_then(|s| s.rev_lookup_line(usize::from(addr)))
                .and_then(|line| info.line_span(line));
            eprintln!("at address {addr:02}:");
            report(name, &info, &e, span);
            ExitCode::FAILURE
        },
    }
}
