//! Memory handling for the LMC simulator.
//!
//! This module consists of:
//! - [`Word`]: The value held in a memory cell or the accumulator.
//! - [`MemArray`]: The memory.
//! - [`AccPolicy`]: How arithmetic results are fit into the accumulator.

use crate::asm::ObjectFile;

/// The value of a memory cell or register.
///
/// Nominally, words are three decimal digits (`0..=999`),
/// but memory can hold any integer (e.g., `DAT -5`),
/// and the accumulator can hold any integer unless an [`AccPolicy`] restricts it.
pub type Word = i32;

/// The number of memory cells.
pub const MEM_SIZE: usize = 100;

/// Memory. This consists of 100 cells, addressed `0..=99`.
///
/// Memory can be indexed by address:
/// ```
/// use lmc_ensemble::sim::mem::MemArray;
///
/// let mut mem = MemArray::new();
/// mem[12] = 901;
/// assert_eq!(mem[12], 901);
/// assert_eq!(mem.get(12), Some(901));
/// assert_eq!(mem.get(100), None);
/// ```
///
/// Indexing outside of memory panics, so the simulator only indexes
/// with addresses taken from a decoded instruction.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct MemArray([Word; MEM_SIZE]);
impl MemArray {
    /// Creates a new memory with every cell set to 0.
    pub fn new() -> Self {
        Self([0; MEM_SIZE])
    }

    /// Creates a new memory from a list of words.
    ///
    /// Cells after the end of the list are set to 0,
    /// and words past the end of memory are ignored.
    pub fn from_words(words: &[Word]) -> Self {
        let mut mem = Self::new();
        let len = words.len().min(MEM_SIZE);
        mem.0[..len].copy_from_slice(&words[..len]);
        mem
    }

    /// Copies the memory image of an object file into this memory.
    pub fn copy_obj_file(&mut self, obj: &ObjectFile) {
        self.0.copy_from_slice(obj.words());
    }

    /// Gets the word at a given address, or `None` if the address is outside memory.
    pub fn get(&self, addr: usize) -> Option<Word> {
        self.0.get(addr).copied()
    }

    /// Gets a reference to the cells of memory.
    pub fn as_slice(&self) -> &[Word] {
        &self.0
    }
}
impl Default for MemArray {
    fn default() -> Self {
        Self::new()
    }
}
impl std::ops::Index<u8> for MemArray {
    type Output = Word;

    fn index(&self, index: u8) -> &Self::Output {
        &self.0[usize::from(index)]
    }
}
impl std::ops::IndexMut<u8> for MemArray {
    fn index_mut(&mut self, index: u8) -> &mut Self::Output {
        &mut self.0[usize::from(index)]
    }
}

/// The policy used to fit a result into the accumulator.
///
/// This is applied to the results of `ADD` and `SUB` and to values supplied to `INP`.
/// `LDA` copies memory into the accumulator as is.
#[derive(Debug, Default, PartialEq, Eq, Hash, Clone, Copy)]
pub enum AccPolicy {
    /// The accumulator is not bounded to three digits.
    ///
    /// The result only wraps if it exceeds the limits of [`Word`].
    #[default]
    Unchecked,
    /// The result is reduced modulo 1000, into `0..=999`.
    Wrap,
    /// The result is saturated into `-999..=999`.
    Clamp,
}
impl AccPolicy {
    /// Fits a result into the accumulator.
    ///
    /// ```
    /// use lmc_ensemble::sim::mem::AccPolicy;
    ///
    /// assert_eq!(AccPolicy::Unchecked.apply(1200), 1200);
    /// assert_eq!(AccPolicy::Wrap.apply(1200), 200);
    /// assert_eq!(AccPolicy::Wrap.apply(-1), 999);
    /// assert_eq!(AccPolicy::Clamp.apply(1200), 999);
    /// assert_eq!(AccPolicy::Clamp.apply(-1200), -999);
    /// ```
    pub fn apply(self, result: i64) -> Word {
        match self {
            // Intentional truncation to the width of a word.
            AccPolicy::Unchecked => result as Word,
            AccPolicy::Wrap      => result.rem_euclid(1000) as Word,
            AccPolicy::Clamp     => result.clamp(-999, 999) as Word,
        }
    }
}
impl std::str::FromStr for AccPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match &*s.to_ascii_lowercase() {
            "unchecked" => Ok(AccPolicy::Unchecked),
            "wrap"      => Ok(AccPolicy::Wrap),
            "clamp"     => Ok(AccPolicy::Clamp),
            _ => Err(format!("unknown accumulator policy {s:?} (expected unchecked, wrap, or clamp)"))
        }
    }
}
impl std::fmt::Display for AccPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccPolicy::Unchecked => f.write_str("unchecked"),
            AccPolicy::Wrap      => f.write_str("wrap"),
            AccPolicy::Clamp     => f.write_str("clamp"),
        }
    }
}
