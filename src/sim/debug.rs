//! Utilities to debug simulation.
//!
//! The key type here is [`Breakpoint`], which can be appended to the [`Simulator`]'s
//! breakpoint field to cause the simulator to break.
//!
//! Breakpoints are checked after every step of a run driver, against the machine
//! and the [`StepEffect`] of that step.
//!
//! [`Simulator`]: super::Simulator
use super::mem::Word;
use super::state::{MachineState, StepEffect};

/// The largest magnitude that fits in three decimal digits.
const ACC_LIMIT: Word = 999;

/// Conditions to break on.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Breakpoint {
    /// Break when the PC reaches the given address
    /// (before the instruction at that address executes).
    PC(u8),

    /// Break after any `OUT`.
    Output,

    /// Break after a `STA` stores to the given address, even if the value did not change.
    Store(u8),

    /// Break after a branch (`BRA`, or a `BRZ`/`BRP` whose condition held) is taken.
    Branch,

    /// Break when the accumulator no longer fits in three digits.
    ///
    /// This can only happen with [`AccPolicy::Unchecked`].
    ///
    /// [`AccPolicy::Unchecked`]: super::mem::AccPolicy::Unchecked
    Overflow,

    /// Break after a word which is not an instruction was skipped.
    ///
    /// This usually means data was placed in the path of execution.
    /// In strict mode, such words are errors instead, so this never triggers.
    Skipped,
}

impl Breakpoint where Breakpoint: Send + Sync { /* assert Breakpoint is send/sync */ }

impl Breakpoint {
    /// Checks if a break should occur, given the machine after a step and the effects of that step.
    pub fn check(&self, state: &MachineState, effect: &StepEffect) -> bool {
        match *self {
            Breakpoint::PC(addr)    => state.pc == addr,
            Breakpoint::Output      => effect.output.is_some(),
            Breakpoint::Store(addr) => effect.written.is_some_and(|(a, _)| a == addr),
            Breakpoint::Branch      => effect.branched.is_some(),
            Breakpoint::Overflow    => !(-ACC_LIMIT..=ACC_LIMIT).contains(&state.acc),
            Breakpoint::Skipped     => effect.fetched.is_some() && effect.instr.is_none(),
        }
    }
}
impl std::fmt::Display for Breakpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Breakpoint::PC(addr)    => write!(f, "pc == {addr:02}"),
            Breakpoint::Output      => f.write_str("on OUT"),
            Breakpoint::Store(addr) => write!(f, "on STA {addr:02}"),
            Breakpoint::Branch      => f.write_str("on branch"),
            Breakpoint::Overflow    => f.write_str("on overflow"),
            Breakpoint::Skipped     => f.write_str("on skipped word"),
        }
    }
}
