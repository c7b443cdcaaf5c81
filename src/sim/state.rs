//! The state of the machine and its fetch-decode-execute cycle.
//!
//! [`MachineState`] holds every register and the memory of one machine.
//! It can be stepped directly with [`MachineState::step`] and [`MachineState::resume_with_input`],
//! although most uses should go through [`Simulator`], which adds flags, output logging,
//! breakpoints, and run drivers on top of this.
//!
//! [`Simulator`]: super::Simulator

use crate::ast::Instr;

use super::mem::{MemArray, Word, MEM_SIZE};
use super::{OutputEvent, SimErr, SimFlags};

/// The execution state of a machine.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Status {
    /// The machine is ready to fetch the next instruction.
    Fetching,
    /// The machine is suspended on an `INP` instruction,
    /// waiting for a value from [`MachineState::resume_with_input`].
    AwaitingInput,
    /// The machine has halted (or ran past the end of memory).
    Halted,
}

/// The effects of one step of execution.
///
/// A step fetches at most one instruction,
/// reads at most one memory cell as data,
/// writes at most one memory cell,
/// and produces at most one output.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct StepEffect {
    /// The address of the fetched instruction, if one was fetched.
    pub fetched: Option<u8>,
    /// The decoded instruction, if the fetched word was an instruction.
    pub instr: Option<Instr>,
    /// The address read by `ADD`, `SUB`, or `LDA`.
    pub read: Option<u8>,
    /// The address written by `STA`, and whether its value changed.
    pub written: Option<(u8, bool)>,
    /// The value output by `OUT`.
    pub output: Option<OutputEvent>,
    /// The target of a taken branch.
    pub branched: Option<u8>,
}

/// The registers and memory of a machine.
///
/// The fields can be read freely (e.g., to display the machine),
/// and are public so that a host can also set up specific states.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MachineState {
    /// The memory.
    pub mem: MemArray,
    /// The accumulator.
    pub acc: Word,
    /// The program counter.
    ///
    /// This can be 100 after the instruction in the last cell executes,
    /// at which point the machine halts.
    pub pc: u8,
    /// The instruction register (the last fetched word).
    pub ir: Word,
    /// The address register (the address part of the last fetched word).
    ///
    /// This is `ir % 100`, which can be negative if `ir` is.
    pub ar: Word,
    /// Whether the machine halted.
    pub halted: bool,
    /// Whether the machine is waiting for input.
    pub pending_input: bool,
}

impl MachineState {
    /// Creates a new machine with the given memory.
    ///
    /// All registers are zeroed.
    pub fn new(mem: MemArray) -> Self {
        Self {
            mem,
            acc: 0,
            pc: 0,
            ir: 0,
            ar: 0,
            halted: false,
            pending_input: false,
        }
    }

    /// The current execution state.
    pub fn status(&self) -> Status {
        match (self.halted, self.pending_input) {
            (true, _) => Status::Halted,
            (false, true) => Status::AwaitingInput,
            (false, false) => Status::Fetching,
        }
    }

    /// Halts if the PC is outside of memory.
    fn check_pc_bounds(&mut self) {
        if usize::from(self.pc) >= MEM_SIZE && !self.halted {
            log::debug!("pc ran off the end of memory ({}), halting", self.pc);
            self.halted = true;
        }
    }

    /// Executes one instruction.
    ///
    /// - If the machine halted, this does nothing.
    /// - If the machine is waiting for input, this errors with [`SimErr::InvalidResumeState`].
    ///     Input has to be supplied with [`MachineState::resume_with_input`].
    /// - Otherwise, this fetches, decodes, and executes the instruction at the PC.
    ///
    /// Words which do not decode into an instruction are skipped,
    /// unless strict mode is on, in which case this errors with [`SimErr::IllegalOpcode`].
    ///
    /// The machine is unchanged if this errors.
    ///
    /// # Example
    /// ```
    /// use lmc_ensemble::sim::mem::MemArray;
    /// use lmc_ensemble::sim::state::{MachineState, Status};
    /// use lmc_ensemble::sim::{OutputEvent, SimFlags};
    ///
    /// // LDA 3, OUT, HLT, DAT 42
    /// let mut state = MachineState::new(MemArray::from_words(&[503, 902, 0, 42]));
    /// let flags = SimFlags::default();
    ///
    /// state.step(&flags).unwrap();
    /// assert_eq!(state.acc, 42);
    ///
    /// let effect = state.step(&flags).unwrap();
    /// assert_eq!(effect.output, Some(OutputEvent(42)));
    ///
    /// state.step(&flags).unwrap();
    /// assert_eq!(state.status(), Status::Halted);
    /// ```
    pub fn step(&mut self, flags: &SimFlags) -> Result<StepEffect, SimErr> {
        let mut effect = StepEffect::default();

        match self.status() {
            Status::Halted => return Ok(effect),
            Status::AwaitingInput => return Err(SimErr::InvalidResumeState),
            Status::Fetching => {},
        }
        self.check_pc_bounds();
        if self.halted {
            return Ok(effect);
        }

        // FETCH
        let addr = self.pc;
        let word = self.mem[addr];

        // DECODE
        let instr = Instr::decode(word);
        if instr.is_none() && flags.strict {
            return Err(SimErr::IllegalOpcode(word));
        }
        effect.fetched = Some(addr);
        effect.instr = instr;
        self.pc += 1;
        self.ir = word;
        (_, self.ar) = Instr::split(word);

        // EXECUTE
        match instr {
            Some(Instr::ADD(a)) => {
                effect.read = Some(a);
                self.acc = flags.acc_policy.apply(i64::from(self.acc) + i64::from(self.mem[a]));
            },
            Some(Instr::SUB(a)) => {
                effect.read = Some(a);
                self.acc = flags.acc_policy.apply(i64::from(self.acc) - i64::from(self.mem[a]));
            },
            Some(Instr::STA(a)) => {
                effect.written = Some((a, self.mem[a] != self.acc));
                self.mem[a] = self.acc;
            },
            Some(Instr::LDA(a)) => {
                effect.read = Some(a);
                self.acc = self.mem[a];
            },
            Some(Instr::BRA(a)) => effect.branched = Some(a),
            Some(Instr::BRZ(a)) => if self.acc == 0 { effect.branched = Some(a) },
            Some(Instr::BRP(a)) => if self.acc >= 0 { effect.branched = Some(a) },
            Some(Instr::INP) => {
                // The PC stays on INP until the input arrives.
                self.pc = addr;
                self.pending_input = true;
                log::debug!("waiting for input at {addr:02}");
            },
            Some(Instr::OUT) => effect.output = Some(OutputEvent(self.acc)),
            Some(Instr::HLT) => {
                self.halted = true;
                log::debug!("halted at {addr:02}");
            },
            None => log::warn!("word {word:03} at {addr:02} is not an instruction, skipping"),
        }

        if let Some(target) = effect.branched {
            self.pc = target;
        }

        match instr {
            Some(instr) => log::trace!("{addr:02}: {word:03} {instr:<6} | acc = {}, pc = {}", self.acc, self.pc),
            None => log::trace!("{addr:02}: {word:03} ?      | acc = {}, pc = {}", self.acc, self.pc),
        }

        self.check_pc_bounds();
        Ok(effect)
    }

    /// Completes an `INP` instruction with the given input.
    ///
    /// The input is parsed as a decimal integer. If successful,
    /// this sets the accumulator, moves the PC past the `INP` instruction, and
    /// returns the machine to fetching.
    ///
    /// This errors with:
    /// - [`SimErr::InvalidResumeState`] if the machine is not waiting for input,
    /// - [`SimErr::InvalidInput`] if the input is not an integer.
    ///
    /// The machine is unchanged if this errors.
    ///
    /// # Example
    /// ```
    /// use lmc_ensemble::sim::mem::MemArray;
    /// use lmc_ensemble::sim::state::{MachineState, Status};
    /// use lmc_ensemble::sim::{SimErr, SimFlags};
    ///
    /// // INP, HLT
    /// let mut state = MachineState::new(MemArray::from_words(&[901, 0]));
    /// let flags = SimFlags::default();
    ///
    /// state.step(&flags).unwrap();
    /// assert_eq!(state.status(), Status::AwaitingInput);
    ///
    /// assert!(matches!(state.resume_with_input("abc", &flags), Err(SimErr::InvalidInput(_))));
    /// assert_eq!(state.status(), Status::AwaitingInput);
    ///
    /// state.resume_with_input("9", &flags).unwrap();
    /// assert_eq!(state.acc, 9);
    /// assert_eq!(state.pc, 1);
    /// assert_eq!(state.status(), Status::Fetching);
    /// ```
    pub fn resume_with_input(&mut self, input: &str, flags: &SimFlags) -> Result<(), SimErr> {
        if self.status() != Status::AwaitingInput {
            return Err(SimErr::InvalidResumeState);
        }
        let value: Word = input.parse()
            .map_err(|_| SimErr::InvalidInput(input.to_string()))?;

        self.acc = flags.acc_policy.apply(i64::from(value));
        self.pending_input = false;
        // pc can be anything if it was set by hand
        self.pc = self.pc.saturating_add(1);
        log::debug!("received input {value}");

        self.check_pc_bounds();
        Ok(())
    }
}
impl Default for MachineState {
    fn default() -> Self {
        Self::new(MemArray::new())
    }
}
impl std::fmt::Display for MachineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ACC: {:03}  PC: {:03}  IR: {:03}  AR: {:02}", self.acc, self.pc, self.ir, self.ar)?;
        match self.status() {
            Status::Fetching => Ok(()),
            Status::AwaitingInput => f.write_str("  (waiting for input)"),
            Status::Halted => f.write_str("  (halted)"),
        }
    }
}
