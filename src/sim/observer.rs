//! Module tracking what happened to each memory cell during execution,
//! so a renderer can highlight executed code, data traffic, and branch targets.
//!
//! You would typically access an observer via the [`Simulator::observer`] field.
//!
//! The simulator clears the observer at the start of every [`Simulator::step_in`] or run,
//! so the observer holds the activity of the last execution call.
//! Completing an `INP` with [`Simulator::resume_with_input`] touches no memory and records nothing.
//!
//! [`Simulator::observer`]: crate::sim::Simulator::observer
//! [`Simulator::step_in`]: crate::sim::Simulator::step_in
//! [`Simulator::resume_with_input`]: crate::sim::Simulator::resume_with_input

use super::mem::MEM_SIZE;
use super::state::StepEffect;

/// The activity of one memory cell.
///
/// ## Example
///
/// ```
/// use lmc_ensemble::asm::assemble;
/// use lmc_ensemble::sim::Simulator;
///
/// let obj_file = assemble("LDA A\nSTA A\nHLT\nA DAT 3").unwrap();
/// let mut sim = Simulator::new(Default::default());
/// sim.load_obj_file(&obj_file);
/// sim.run().unwrap();
///
/// let a = sim.observer.cell(3);
/// assert_eq!((a.loaded, a.stored), (1, 1));
/// assert!(!a.changed);
/// assert_eq!(sim.observer.cell(0).executed, 1);
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CellActivity {
    /// Times the cell was fetched as an instruction.
    pub executed: u32,
    /// Times the cell was read as data by `ADD`, `SUB`, or `LDA`.
    pub loaded: u32,
    /// Times the cell was written by `STA`.
    pub stored: u32,
    /// Whether any store changed the cell's value.
    pub changed: bool,
    /// Times a taken branch jumped to this cell.
    pub entered: u32,
}
impl CellActivity {
    /// True if anything happened to this cell.
    pub fn touched(&self) -> bool {
        self.executed > 0 || self.loaded > 0 || self.stored > 0 || self.entered > 0
    }
}

/// Per-cell activity for every memory cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityObserver {
    cells: [CellActivity; MEM_SIZE]
}
impl ActivityObserver {
    /// Creates a new observer with no recorded activity.
    pub fn new() -> Self {
        Self { cells: [CellActivity::default(); MEM_SIZE] }
    }

    /// Clears all activity.
    pub fn clear(&mut self) {
        self.cells.fill(CellActivity::default());
    }

    /// Gets the activity of the given memory cell.
    ///
    /// Addresses outside of memory have no activity.
    pub fn cell(&self, addr: u8) -> CellActivity {
        self.cells.get(usize::from(addr))
            .copied()
            .unwrap_or_default()
    }

    /// Iterates over every cell with activity, in address order.
    pub fn touched(&self) -> impl Iterator<Item=(u8, CellActivity)> + '_ {
        (0u8..).zip(self.cells.iter().copied())
            .filter(|(_, cell)| cell.touched())
    }

    /// Records the effects of one step.
    pub(super) fn record(&mut self, effect: &StepEffect) {
        if let Some(cell) = effect.fetched.and_then(|a| self.slot(a)) {
            cell.executed = cell.executed.saturating_add(1);
        }
        if let Some(cell) = effect.read.and_then(|a| self.slot(a)) {
            cell.loaded = cell.loaded.saturating_add(1);
        }
        if let Some((addr, changed)) = effect.written {
            if let Some(cell) = self.slot(addr) {
                cell.stored = cell.stored.saturating_add(1);
                cell.changed |= changed;
            }
        }
        if let Some(cell) = effect.branched.and_then(|a| self.slot(a)) {
            cell.entered = cell.entered.saturating_add(1);
        }
    }

    fn slot(&mut self, addr: u8) -> Option<&mut CellActivity> {
        self.cells.get_mut(usize::from(addr))
    }
}
impl Default for ActivityObserver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::sim::state::StepEffect;

    use super::{ActivityObserver, CellActivity};

    #[test]
    fn test_record() {
        let mut obs = ActivityObserver::new();
        obs.record(&StepEffect { fetched: Some(0), read: Some(4), ..Default::default() });
        obs.record(&StepEffect { fetched: Some(1), written: Some((4, false)), ..Default::default() });
        obs.record(&StepEffect { fetched: Some(2), written: Some((9, true)), ..Default::default() });
        obs.record(&StepEffect { fetched: Some(3), branched: Some(0), ..Default::default() });
        obs.record(&StepEffect { fetched: Some(0), read: Some(4), ..Default::default() });

        let four = obs.cell(4);
        assert_eq!((four.loaded, four.stored, four.changed), (2, 1, false));
        assert!(obs.cell(9).changed);
        assert_eq!(obs.cell(0), CellActivity { executed: 2, entered: 1, ..Default::default() });
        assert!(!obs.cell(50).touched());
        assert!(!obs.cell(200).touched());

        let touched: Vec<_> = obs.touched().map(|(addr, _)| addr).collect();
        assert_eq!(touched, vec![0, 1, 2, 3, 4, 9]);

        obs.clear();
        assert_eq!(obs.touched().count(), 0);
    }
}
