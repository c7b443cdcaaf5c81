//! Simulating and execution for LMC programs.
//!
//! This module is focused on executing fully assembled code (i.e., [`ObjectFile`]).
//!
//! This module consists of:
//! - [`Simulator`]: The struct that simulates assembled code.
//! - [`state`]: The module holding the machine's registers and its fetch-decode-execute cycle.
//! - [`mem`]: The module handling memory and the accumulator policy.
//! - [`io`]: The module connecting input and output to an external source and sink.
//! - [`debug`]: The module handling types of breakpoints for the simulator.
//! - [`observer`]: The module tracking what each memory cell did during execution.
//!
//! # Usage
//!
//! To simulate some code, you need to instantiate a Simulator and load an object file to it:
//!
//! ```
//! use lmc_ensemble::asm::assemble;
//! use lmc_ensemble::sim::{OutputEvent, Simulator};
//!
//! let src = "
//!     LDA A
//!     ADD B
//!     OUT
//!     HLT
//!     A DAT 5
//!     B DAT 7
//! ";
//! let obj_file = assemble(src).unwrap();
//!
//! let mut sim = Simulator::new(Default::default());
//! sim.load_obj_file(&obj_file);
//! sim.run().unwrap();
//!
//! assert!(sim.hit_halt());
//! assert_eq!(sim.output(), &[OutputEvent(12)]);
//! ```
//!
//! ## Flags
//!
//! Here, we define `sim` to have the default flags.
//! We could also configure the simulator by editing the flags. For example,
//! if we wish to keep the accumulator within three digits, we can edit the flags like so:
//!
//! ```
//! # use lmc_ensemble::sim::{Simulator, SimFlags};
//! use lmc_ensemble::sim::mem::AccPolicy;
//!
//! let mut sim = Simulator::new(SimFlags { acc_policy: AccPolicy::Wrap, ..Default::default() });
//! ```
//!
//! All of the available flags can be found in [`SimFlags`].
//!
//! ## Execution
//!
//! Beyond the basic [`Simulator::run`] (which runs until halting or until input is needed),
//! there are also:
//! - [`Simulator::step_in`]: manual step-by-step simulation
//! - [`Simulator::run_while`], [`Simulator::run_with_limit`]: more advanced programmatic execution
//! - [`Simulator::run_io`]: execution which takes input from and sends output to an [`IODevice`]
//!
//! ```
//! use lmc_ensemble::asm::assemble;
//! use lmc_ensemble::sim::Simulator;
//!
//! let obj_file = assemble("LDA 3\nADD 3\nHLT\nDAT 4").unwrap();
//!
//! let mut sim = Simulator::new(Default::default());
//! sim.load_obj_file(&obj_file);
//!
//! // Running step by step:
//! sim.step_in().unwrap();
//! assert_eq!(sim.state.acc, 4);
//! sim.step_in().unwrap();
//! assert_eq!(sim.state.acc, 8);
//! sim.step_in().unwrap();
//! assert!(sim.state.halted);
//! assert_eq!(sim.prefetch_pc(), 2);
//! ```
//!
//! ## Input
//!
//! The simulator never blocks for input. When an `INP` instruction is executed,
//! the simulator pauses and waits for a value from [`Simulator::resume_with_input`].
//!
//! ```
//! use lmc_ensemble::asm::assemble;
//! use lmc_ensemble::sim::{OutputEvent, SimErr, Simulator};
//!
//! let obj_file = assemble("INP\nOUT\nHLT").unwrap();
//!
//! let mut sim = Simulator::new(Default::default());
//! sim.load_obj_file(&obj_file);
//!
//! sim.run().unwrap();
//! assert!(sim.awaiting_input());
//!
//! // Invalid input is rejected, and the simulator keeps waiting:
//! assert!(matches!(sim.resume_with_input("abc"), Err(SimErr::InvalidInput(_))));
//! assert!(sim.awaiting_input());
//!
//! sim.resume_with_input("9").unwrap();
//! sim.run().unwrap();
//! assert!(sim.hit_halt());
//! assert_eq!(sim.take_output(), vec![OutputEvent(9)]);
//! ```
//!
//! ## Querying State
//!
//! The registers and memory of the machine are held in the `sim.state` field (a [`MachineState`]).
//! A copy of the state can be made at any time with [`Simulator::snapshot`].
//!
//! ## Debugging with breakpoints
//!
//! Breakpoints are accessible through the `breakpoints` field on [`Simulator`].
//!
//! To add a `breakpoint`, simply insert a [`Breakpoint`] and
//! it will break if its condition is met during all execution functions (except [`Simulator::step_in`]).
//!
//! ```
//! use lmc_ensemble::asm::assemble;
//! use lmc_ensemble::sim::Simulator;
//! use lmc_ensemble::sim::debug::Breakpoint;
//!
//! let obj_file = assemble("
//!     LDA ONE
//!     ADD ONE
//!     ADD ONE
//!     ADD ONE
//!     HLT
//!     ONE DAT 1
//! ").unwrap();
//!
//! let mut sim = Simulator::new(Default::default());
//! sim.load_obj_file(&obj_file);
//!
//! // Without breakpoint
//! sim.run().unwrap();
//! assert_eq!(sim.state.acc, 4);
//!
//! // With breakpoint
//! sim.load_obj_file(&obj_file);
//! sim.breakpoints.insert(Breakpoint::PC(2));
//! sim.run().unwrap();
//! assert!(sim.hit_breakpoint());
//! assert_eq!(sim.state.pc, 2);
//! assert_eq!(sim.state.acc, 2);
//! ```
//!
//! ## Strictness
//!
//! By default, words which are not instructions are skipped.
//! With the `strict` flag, the simulator errors instead, and stays on the offending word.
//!
//! ```
//! use lmc_ensemble::sim::{Simulator, SimErr, SimFlags};
//! use lmc_ensemble::sim::mem::MemArray;
//!
//! let mut sim = Simulator::new(SimFlags { strict: true, ..Default::default() });
//! sim.state.mem = MemArray::from_words(&[902, 404, 0]);
//!
//! assert_eq!(sim.run(), Err(SimErr::IllegalOpcode(404)));
//! assert_eq!(sim.prefetch_pc(), 1);
//! ```
//!
//! [`ObjectFile`]: crate::asm::ObjectFile
//! [`Breakpoint`]: self::debug::Breakpoint
//! [`IODevice`]: self::io::IODevice
pub mod mem;
pub mod state;
pub mod io;
pub mod debug;
pub mod observer;

use std::collections::HashSet;

use crate::asm::ObjectFile;
use debug::Breakpoint;
use io::IODevice;

use self::mem::{AccPolicy, Word};
use self::state::{MachineState, Status, StepEffect};

/// Errors that can occur during simulation.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum SimErr {
    /// Input supplied to an `INP` instruction could not be parsed as an integer.
    ///
    /// The machine is still waiting for input.
    InvalidInput(String),
    /// Input was supplied while the machine was not waiting for input,
    /// or the machine was stepped while it was waiting for input.
    InvalidResumeState,
    /// Word was decoded, but it is not an instruction (strict mode).
    IllegalOpcode(Word),
}
impl std::fmt::Display for SimErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SimErr::InvalidInput(s)    => write!(f, "invalid input {s:?}, expected an integer"),
            SimErr::InvalidResumeState => f.write_str("machine is not in a state to accept this operation"),
            SimErr::IllegalOpcode(w)   => write!(f, "simulator executed illegal opcode {w:03} (strict mode)"),
        }
    }
}
impl std::error::Error for SimErr {}
impl crate::err::Error for SimErr {
    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match self {
            SimErr::InvalidInput(_)    => Some("input must be a decimal integer, such as 42 or -7".into()),
            SimErr::InvalidResumeState => Some("input can only be supplied after an INP instruction is executed".into()),
            SimErr::IllegalOpcode(_)   => Some("this word may be data placed in the path of execution; try adding a HLT or BRA before it".into()),
        }
    }
}

/// A value output by an `OUT` instruction.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct OutputEvent(pub Word);
impl std::fmt::Display for OutputEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Reason for why execution paused if it wasn't due to an error.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
enum PauseCondition {
    /// Program reached a halt.
    Halt,
    /// Program is waiting for input.
    AwaitingInput,
    /// Program hit a breakpoint.
    Breakpoint,
    /// Program hit a tripwire condition.
    Tripwire,
    /// Program hit an error and did not pause successfully.
    #[default]
    Unsuccessful
}

/// Configuration flags for [`Simulator`].
///
/// These can be modified after the `Simulator` is created with [`Simulator::new`]
/// and their effects should still apply.
///
/// Read the field descriptions for more details.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct SimFlags {
    /// Whether strict mode is enabled.
    ///
    /// In strict mode, executing a word which does not decode
    /// into an instruction raises [`SimErr::IllegalOpcode`]
    /// instead of being skipped.
    ///
    /// By default, this flag is `false`.
    pub strict: bool,

    /// How results are fit into the accumulator.
    ///
    /// By default, this is [`AccPolicy::Unchecked`].
    pub acc_policy: AccPolicy,
}

/// Executes assembled code.
#[derive(Debug)]
pub struct Simulator {
    // ------------------ SIMULATION STATE ------------------
    // Calling [`Simulator::reset`] resets these values.

    /// The machine's registers and memory.
    pub state: MachineState,

    /// Every value output since the last reset (or [`Simulator::take_output`]).
    output: Vec<OutputEvent>,

    /// The number of instructions successfully run since the last reset
    /// (or [`Simulator::load_obj_file`], which resets).
    ///
    /// This can be set to 0 to reset the counter.
    pub instructions_run: u64,

    /// The address of the last instruction the simulator tried to execute.
    ///
    /// See [`Simulator::prefetch_pc`].
    fetched: Option<u8>,

    /// Indicates the reason why the last execution (via [`Simulator::run_while`] and adjacent)
    /// had paused.
    pause_condition: PauseCondition,

    /// Tracks memory activity of the last execution.
    pub observer: observer::ActivityObserver,

    // ------------------ CONFIG/DEBUG STATE ------------------
    // Calling [`Simulator::reset`] does not reset these values.

    /// Configuration settings for the simulator.
    ///
    /// These are preserved between resets.
    ///
    /// See [`SimFlags`] for more details on what configuration
    /// settings are available.
    pub flags: SimFlags,

    /// Breakpoints for the simulator.
    pub breakpoints: HashSet<Breakpoint>,
}
impl Simulator where Simulator: Send + Sync {}

impl Simulator {
    /// Creates a new simulator with zeroed memory.
    pub fn new(flags: SimFlags) -> Self {
        Self {
            state: MachineState::default(),
            output: vec![],
            instructions_run: 0,
            fetched: None,
            pause_condition: Default::default(),
            observer: Default::default(),

            flags,
            breakpoints: Default::default(),
        }
    }

    /// Resets the simulator.
    ///
    /// This resets the state of the `Simulator` back to before any execution calls,
    /// while preserving configuration and debug state.
    ///
    /// Note that this function preserves:
    /// - Flags
    /// - Breakpoints
    ///
    /// Memory is cleared, so any object file has to be reloaded into the Simulator.
    pub fn reset(&mut self) {
        let flags = self.flags;
        let breakpoints = std::mem::take(&mut self.breakpoints);

        *self = Simulator::new(flags);
        self.breakpoints = breakpoints;
    }

    /// Loads an object file into this simulator.
    ///
    /// This resets the simulator (see [`Simulator::reset`]),
    /// then copies the object file's memory image into memory.
    pub fn load_obj_file(&mut self, obj: &ObjectFile) {
        self.reset();
        self.state.mem.copy_obj_file(obj);
        log::debug!("loaded object file with {} statement(s)", obj.len());
    }

    /// The current execution state of the machine.
    pub fn status(&self) -> Status {
        self.state.status()
    }

    /// Creates a copy of the machine's registers and memory.
    pub fn snapshot(&self) -> MachineState {
        self.state.clone()
    }

    /// Every value output since the last reset or [`Simulator::take_output`].
    pub fn output(&self) -> &[OutputEvent] {
        &self.output
    }

    /// Takes every value output since the last reset or `take_output`,
    /// clearing the output log.
    pub fn take_output(&mut self) -> Vec<OutputEvent> {
        std::mem::take(&mut self.output)
    }

    /// Gets the address of the currently executing instruction.
    ///
    /// This is the address of the last instruction the simulator executed (or tried to execute),
    /// so after a `HLT` this points to the `HLT` instruction
    /// and after a failed step this points to the instruction which failed.
    ///
    /// If nothing has executed yet, this is the PC.
    pub fn prefetch_pc(&self) -> u8 {
        self.fetched.unwrap_or(self.state.pc)
    }

    /// Indicates whether the last execution of the simulator hit a breakpoint.
    pub fn hit_breakpoint(&self) -> bool {
        matches!(self.pause_condition, PauseCondition::Breakpoint)
    }

    /// Indicates whether the last execution of the simulator resulted in a halt.
    ///
    /// This includes running off the end of memory.
    pub fn hit_halt(&self) -> bool {
        matches!(self.pause_condition, PauseCondition::Halt)
    }

    /// Indicates whether the simulator is waiting for input.
    ///
    /// If so, input should be supplied with [`Simulator::resume_with_input`].
    pub fn awaiting_input(&self) -> bool {
        self.status() == Status::AwaitingInput
    }

    /// Runs until the tripwire condition returns false (or any of the typical breaks occur).
    ///
    /// The typical break conditions are:
    /// - the machine halts
    /// - the machine is waiting for input
    /// - A breakpoint matches
    pub fn run_while(&mut self, mut tripwire: impl FnMut(&mut Simulator) -> bool) -> Result<(), SimErr> {
        self.observer.clear();
        std::mem::take(&mut self.pause_condition);

        // event loop
        // run until:
        // 1. the machine halts or needs input
        // 2. the tripwire condition returns false
        // 3. any of the breakpoints are hit
        let result = loop {
            match self.status() {
                Status::Halted => break Ok(PauseCondition::Halt),
                Status::AwaitingInput => break Ok(PauseCondition::AwaitingInput),
                Status::Fetching => {},
            }
            // Tripwire turned off:
            if !tripwire(self) {
                break Ok(PauseCondition::Tripwire);
            }

            // Run a step:
            let effect = match self.step() {
                Ok(effect) => effect,
                Err(e) => break Err(e),
            };

            // After executing, check that any breakpoints were hit.
            // A halt or input wait takes precedence.
            if self.status() == Status::Fetching && self.breakpoints.iter().any(|bp| bp.check(&self.state, &effect)) {
                break Ok(PauseCondition::Breakpoint);
            }
        };

        self.pause_condition = result?;
        Ok(())
    }

    /// Execute the program.
    ///
    /// This runs until the program halts or needs input.
    /// If you would like to limit the maximum number of steps to execute, consider [`Simulator::run_with_limit`].
    pub fn run(&mut self) -> Result<(), SimErr> {
        self.run_while(|_| true)
    }

    /// Execute the program with a limit on how many steps to execute.
    ///
    /// This runs until the program halts, needs input, or until the number of steps to execute has been hit.
    pub fn run_with_limit(&mut self, max_steps: u64) -> Result<(), SimErr> {
        let i = self.instructions_run;
        self.run_while(|sim| sim.instructions_run.wrapping_sub(i) < max_steps)
    }

    /// Simulate one step, executing one instruction.
    ///
    /// This records the step's activity, output, and instruction count.
    fn step(&mut self) -> Result<StepEffect, SimErr> {
        let pc = self.state.pc;
        match self.state.step(&self.flags) {
            Ok(effect) => {
                if let Some(addr) = effect.fetched {
                    self.fetched = Some(addr);
                    self.instructions_run = self.instructions_run.wrapping_add(1);
                }
                self.observer.record(&effect);
                self.output.extend(effect.output);
                Ok(effect)
            },
            Err(e) => {
                self.fetched = Some(pc);
                Err(e)
            }
        }
    }

    /// Simulate one step, executing one instruction.
    ///
    /// This does nothing if the machine has halted,
    /// and errors with [`SimErr::InvalidResumeState`] if the machine is waiting for input.
    pub fn step_in(&mut self) -> Result<(), SimErr> {
        self.observer.clear();
        self.step().map(|_| ())
    }

    /// Completes a pending `INP` instruction with the given input.
    ///
    /// The input is parsed as a decimal integer (surrounding whitespace is not allowed).
    /// This does not execute any further instructions.
    ///
    /// This errors with:
    /// - [`SimErr::InvalidResumeState`] if the machine is not waiting for input,
    /// - [`SimErr::InvalidInput`] if the input is not an integer.
    ///
    /// In either case, the machine is unchanged.
    pub fn resume_with_input(&mut self, input: &str) -> Result<(), SimErr> {
        self.state.resume_with_input(input, &self.flags)
    }

    /// Execute the program, taking input from and sending output to the given IO device.
    ///
    /// This runs until the program halts, the device has no more input,
    /// or any of the typical breaks occur (see [`Simulator::run_while`]).
    ///
    /// Output is sent to the device as it is produced, and also kept in the output log.
    /// Input tokens have surrounding whitespace removed before being supplied to the machine.
    /// If a token is not an integer, this errors with [`SimErr::InvalidInput`]
    /// and the machine is left waiting for input.
    ///
    /// ```
    /// use lmc_ensemble::asm::assemble;
    /// use lmc_ensemble::sim::Simulator;
    /// use lmc_ensemble::sim::io::BufferedIO;
    ///
    /// let obj_file = assemble("
    ///     LOOP INP
    ///          BRZ END
    ///          OUT
    ///          BRA LOOP
    ///     END  HLT
    /// ").unwrap();
    ///
    /// let mut sim = Simulator::new(Default::default());
    /// sim.load_obj_file(&obj_file);
    ///
    /// let mut io = BufferedIO::with_input(["4", " 5 ", "0"]);
    /// sim.run_io(&mut io).unwrap();
    ///
    /// assert!(sim.hit_halt());
    /// assert_eq!(*io.get_output().read().unwrap(), vec![4, 5]);
    /// ```
    pub fn run_io(&mut self, io: &mut (impl IODevice + ?Sized)) -> Result<(), SimErr> {
        self.run_io_while(io, |_| true)
    }

    /// Execute the program with IO, with a limit on how many steps to execute.
    ///
    /// The limit applies to the whole call, across every input wait.
    /// See [`Simulator::run_io`] for details.
    pub fn run_io_with_limit(&mut self, io: &mut (impl IODevice + ?Sized), max_steps: u64) -> Result<(), SimErr> {
        let i = self.instructions_run;
        self.run_io_while(io, |sim| sim.instructions_run.wrapping_sub(i) < max_steps)
    }

    /// Execute the program with IO until the tripwire condition returns false
    /// (or any of the typical breaks occur).
    ///
    /// The tripwire is also checked before each input is read,
    /// so a tripped run leaves the machine waiting and the device's input untouched.
    ///
    /// See [`Simulator::run_io`] for details.
    pub fn run_io_while(
        &mut self,
        io: &mut (impl IODevice + ?Sized),
        mut tripwire: impl FnMut(&mut Simulator) -> bool
    ) -> Result<(), SimErr> {
        loop {
            let mut sent = self.output.len();
            let result = self.run_while(|sim| {
                for &OutputEvent(value) in &sim.output[sent..] {
                    io.write_output(value);
                }
                sent = sim.output.len();
                tripwire(sim)
            });

            for &OutputEvent(value) in &self.output[sent..] {
                io.write_output(value);
            }
            result?;

            if self.pause_condition != PauseCondition::AwaitingInput {
                return Ok(());
            }
            // Completing the INP counts against the tripwire too.
            if !tripwire(self) {
                self.pause_condition = PauseCondition::Tripwire;
                return Ok(());
            }
            let Some(token) = io.read_input() else {
                log::debug!("no more input, pausing");
                return Ok(());
            };
            self.resume_with_input(token.trim())?;
        }
    }
}
impl Default for Simulator {
    fn default() -> Self {
        Self::new(Default::default())
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::asm::{assemble, AsmErrKind};

    use super::debug::Breakpoint;
    use super::io::{BufferedIO, EmptyIO};
    use super::mem::{AccPolicy, MemArray};
    use super::state::Status;
    use super::{OutputEvent, SimErr, SimFlags, Simulator};

    fn load(src: &str) -> Simulator {
        let obj = assemble(src).unwrap();
        let mut sim = Simulator::default();
        sim.load_obj_file(&obj);
        sim
    }

    fn outputs(sim: &Simulator) -> Vec<i32> {
        sim.output().iter().map(|&OutputEvent(v)| v).collect()
    }

    #[test]
    fn test_load_and_halt() {
        // 3 instructions, then 7 empty cells, then 42 at address 10
        let mut sim = load("LDA 10\nOUT\nHLT\nDAT\nDAT\nDAT\nDAT\nDAT\nDAT\nDAT\nDAT 42");
        assert_eq!(sim.state.mem[10], 42);
        sim.run().unwrap();

        assert_eq!(outputs(&sim), vec![42]);
        assert!(sim.hit_halt());
        assert_eq!(sim.prefetch_pc(), 2);
        assert_eq!(sim.state.mem[2], 0);
    }

    #[test]
    fn test_add_program() {
        let mut sim = load("LDA A\nADD B\nOUT\nHLT\nA DAT 5\nB DAT 7");
        sim.run().unwrap();
        assert_eq!(outputs(&sim), vec![12]);
        assert!(sim.hit_halt());
        assert_eq!(sim.instructions_run, 4);
    }

    #[test]
    fn test_countdown() {
        let src = "
                 LDA N
            LOOP BRZ END
                 OUT
                 SUB ONE
                 BRA LOOP
            END  HLT
            N    DAT 3
            ONE  DAT 1
        ";
        let mut sim = load(src);
        sim.run().unwrap();
        assert_eq!(outputs(&sim), vec![3, 2, 1]);
        assert!(sim.hit_halt());
    }

    #[test]
    fn test_input_wait() {
        let mut sim = load("INP\nOUT\nHLT");

        let mut waits = 0;
        loop {
            sim.run().unwrap();
            if sim.awaiting_input() {
                waits += 1;
                sim.resume_with_input("9").unwrap();
            } else {
                break;
            }
        }

        assert_eq!(waits, 1);
        assert_eq!(outputs(&sim), vec![9]);
        assert!(sim.hit_halt());
        assert!(!sim.hit_breakpoint());
    }

    #[test]
    fn test_invalid_input() {
        let mut sim = load("INP\nHLT");
        sim.run().unwrap();
        assert!(!sim.hit_halt());

        let before = sim.snapshot();
        assert_eq!(sim.resume_with_input("abc"), Err(SimErr::InvalidInput("abc".to_string())));
        assert_eq!(sim.snapshot(), before);
        assert!(sim.awaiting_input());

        // stepping while waiting is an error
        assert_eq!(sim.step_in(), Err(SimErr::InvalidResumeState));
        assert_eq!(sim.snapshot(), before);

        // resuming while not waiting is an error
        sim.resume_with_input("1").unwrap();
        assert_eq!(sim.resume_with_input("2"), Err(SimErr::InvalidResumeState));
        assert_eq!(sim.state.acc, 1);
    }

    #[test]
    fn test_unknown_mnemonic_produces_nothing() {
        let err = assemble("LDA 1\nFOO\nHLT").unwrap_err();
        assert_eq!(err.kind, AsmErrKind::UnknownInstruction("FOO".to_string()));
    }

    #[test]
    fn test_breakpoints() {
        let src = "
                 LDA N
            LOOP OUT
                 SUB ONE
                 STA N
                 BRP LOOP
                 HLT
            N    DAT 2
            ONE  DAT 1
        ";
        let mut sim = load(src);
        sim.breakpoints.insert(Breakpoint::Output);
        sim.run().unwrap();
        assert!(sim.hit_breakpoint());
        assert_eq!(outputs(&sim), vec![2]);
        assert_eq!(sim.prefetch_pc(), 1);

        // step_in ignores breakpoints
        sim.step_in().unwrap();
        assert!(sim.hit_breakpoint());
        assert_eq!(sim.state.acc, 1);

        sim.breakpoints.clear();
        sim.breakpoints.insert(Breakpoint::Store(6));
        sim.run().unwrap();
        assert!(sim.hit_breakpoint());
        assert_eq!(sim.state.mem[6], 1);

        sim.breakpoints.clear();
        sim.breakpoints.insert(Breakpoint::Branch);
        sim.run().unwrap();
        assert!(sim.hit_breakpoint());
        assert_eq!(sim.state.pc, 1);

        sim.breakpoints.clear();
        sim.breakpoints.insert(Breakpoint::PC(6));
        sim.run().unwrap();
        assert!(sim.hit_halt());
        assert_eq!(outputs(&sim), vec![2, 1, 0]);
        assert_eq!(sim.state.acc, -1);

        // breakpoints survive reset
        sim.reset();
        assert_eq!(sim.breakpoints.len(), 1);
        assert_eq!(sim.state.mem[6], 0);
    }

    #[test]
    fn test_breakpoint_on_skipped_word() {
        let mut sim = Simulator::default();
        sim.state.mem = MemArray::from_words(&[902, 450, 902, 0]);
        sim.breakpoints.insert(Breakpoint::Skipped);
        sim.run().unwrap();
        assert!(sim.hit_breakpoint());
        assert_eq!(sim.prefetch_pc(), 1);
        assert_eq!(sim.state.pc, 2);
    }

    #[test]
    fn test_breakpoint_on_overflow() {
        let mut sim = load("LDA A\nADD A\nADD A\nHLT\nA DAT 400");
        sim.breakpoints.insert(Breakpoint::Overflow);
        sim.run().unwrap();
        assert!(sim.hit_breakpoint());
        assert_eq!(sim.state.acc, 1200);
        assert_eq!(sim.instructions_run, 3);

        // a bounded accumulator never overflows
        let mut sim = load("LDA A\nADD A\nADD A\nHLT\nA DAT 400");
        sim.flags.acc_policy = AccPolicy::Clamp;
        sim.breakpoints.insert(Breakpoint::Overflow);
        sim.run().unwrap();
        assert!(sim.hit_halt());
    }

    #[test]
    fn test_breakpoint_on_halt() {
        // a halt takes precedence over a breakpoint
        let mut sim = load("HLT");
        sim.breakpoints.insert(Breakpoint::PC(1));
        sim.run().unwrap();
        assert!(sim.hit_halt());
        assert!(!sim.hit_breakpoint());
    }

    #[test]
    fn test_run_with_limit() {
        let mut sim = load("LOOP BRA LOOP");
        sim.run_with_limit(50).unwrap();
        assert_eq!(sim.instructions_run, 50);
        assert!(!sim.hit_halt());
        assert_eq!(sim.status(), Status::Fetching);

        sim.run_with_limit(25).unwrap();
        assert_eq!(sim.instructions_run, 75);

        // the counter starts over on reset
        sim.reset();
        assert_eq!(sim.instructions_run, 0);
    }

    #[test]
    fn test_strict() {
        let mut sim = Simulator::new(SimFlags { strict: true, ..Default::default() });
        sim.state.mem = MemArray::from_words(&[902, 450, 0]);
        assert_eq!(sim.run(), Err(SimErr::IllegalOpcode(450)));
        assert_eq!(sim.prefetch_pc(), 1);
        assert_eq!(sim.state.pc, 1);
        assert!(!sim.hit_halt());

        // skipped without strict
        sim.flags.strict = false;
        sim.run().unwrap();
        assert!(sim.hit_halt());
        assert_eq!(sim.instructions_run, 3);
    }

    #[test]
    fn test_observer() {
        let mut sim = load("LDA A\nSTA B\nSTA B\nHLT\nA DAT 3\nB DAT 0");
        sim.step_in().unwrap();
        assert_eq!(sim.observer.cell(4).loaded, 1);

        // cleared on each step_in
        sim.step_in().unwrap();
        assert!(!sim.observer.cell(4).touched());
        assert!(sim.observer.cell(5).changed);

        sim.step_in().unwrap();
        let b = sim.observer.cell(5);
        assert_eq!(b.stored, 1);
        assert!(!b.changed);
    }

    #[test]
    fn test_observer_over_run() {
        let src = "
                 LDA N
            LOOP BRZ END
                 SUB ONE
                 BRA LOOP
            END  HLT
            N    DAT 3
            ONE  DAT 1
        ";
        let mut sim = load(src);
        sim.run().unwrap();
        assert!(sim.hit_halt());

        let loop_head = sim.observer.cell(1);
        assert_eq!((loop_head.executed, loop_head.entered), (4, 3));
        assert_eq!(sim.observer.cell(4).entered, 1);
        assert_eq!(sim.observer.cell(6).loaded, 3);

        let executed: Vec<_> = sim.observer.touched()
            .filter(|(_, cell)| cell.executed > 0)
            .map(|(addr, _)| addr)
            .collect();
        assert_eq!(executed, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_acc_policy_flag() {
        let src = "LDA A\nADD A\nOUT\nHLT\nA DAT 600";
        for (policy, expected) in [(AccPolicy::Unchecked, 1200), (AccPolicy::Wrap, 200), (AccPolicy::Clamp, 999)] {
            let mut sim = load(src);
            sim.flags.acc_policy = policy;
            sim.run().unwrap();
            assert_eq!(outputs(&sim), vec![expected], "{policy}");
        }

        // flags survive loading
        let obj = assemble(src).unwrap();
        let mut sim = Simulator::new(SimFlags { acc_policy: AccPolicy::Wrap, ..Default::default() });
        sim.load_obj_file(&obj);
        assert_eq!(sim.flags.acc_policy, AccPolicy::Wrap);
    }

    #[test]
    fn test_run_io() {
        let src = "
            LOOP INP
                 BRZ END
                 OUT
                 BRA LOOP
            END  HLT
        ";
        let mut sim = load(src);
        let mut io = BufferedIO::with_input(["3", "x", "4", "0"]);

        assert_eq!(sim.run_io(&mut io), Err(SimErr::InvalidInput("x".to_string())));
        assert!(sim.awaiting_input());
        assert_eq!(*io.get_output().read().unwrap(), vec![3]);

        sim.run_io(&mut io).unwrap();
        assert!(sim.hit_halt());
        assert_eq!(*io.get_output().read().unwrap(), vec![3, 4]);
        assert_eq!(outputs(&sim), vec![3, 4]);

        // no input
        let mut sim = load(src);
        sim.run_io(&mut EmptyIO).unwrap();
        assert!(sim.awaiting_input());
        assert!(!sim.hit_halt());
    }

    #[test]
    fn test_run_io_with_limit() {
        let mut sim = load("LOOP INP\nOUT\nBRA LOOP");
        let mut io = BufferedIO::with_input(["1", "2", "3", "4"]);
        sim.run_io_with_limit(&mut io, 7).unwrap();
        assert_eq!(sim.instructions_run, 7);
        // INP OUT BRA INP OUT BRA INP
        assert_eq!(*io.get_output().read().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_run_io_limit_leaves_input_queued() {
        let mut sim = load("INP\nOUT\nHLT");
        let mut io = BufferedIO::with_input(["7"]);
        sim.run_io_with_limit(&mut io, 1).unwrap();

        assert_eq!(sim.instructions_run, 1);
        assert!(sim.awaiting_input());
        assert_eq!(sim.state.acc, 0);
        assert_eq!(sim.state.pc, 0);
        assert_eq!(io.get_input().read().unwrap().len(), 1);

        // the next run picks up the token
        sim.run_io(&mut io).unwrap();
        assert!(sim.hit_halt());
        assert_eq!(*io.get_output().read().unwrap(), vec![7]);
        assert!(io.get_input().read().unwrap().is_empty());
    }

    #[test]
    fn test_run_io_tripwire_before_input() {
        let mut sim = load("LOOP INP\nOUT\nBRA LOOP");
        let mut io = BufferedIO::with_input(["1", "2"]);

        // the tripwire sees the machine waiting for input
        let mut waiting = 0;
        sim.run_io_while(&mut io, |sim| {
            if sim.awaiting_input() {
                waiting += 1;
            }
            waiting < 2
        }).unwrap();

        assert!(sim.awaiting_input());
        assert_eq!(*io.get_output().read().unwrap(), vec![1]);
        assert_eq!(io.get_input().read().unwrap().len(), 1);
    }

    #[test]
    fn test_random_programs_never_panic() {
        let mut rng = StdRng::seed_from_u64(2110);

        for _ in 0..200 {
            let words: Vec<i32> = (0..100).map(|_| rng.gen_range(-999..=999)).collect();
            let mut sim = Simulator::default();
            sim.state.mem = MemArray::from_words(&words);

            for _ in 0..20 {
                sim.run_with_limit(500).unwrap();
                match sim.status() {
                    Status::AwaitingInput => sim.resume_with_input("1").unwrap(),
                    Status::Halted => break,
                    Status::Fetching => {},
                }
            }
            assert!(usize::from(sim.state.pc) <= 100);
        }
    }
}
