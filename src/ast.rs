//! Components relating to the abstract syntax trees (ASTs)
//! used in representing assembly instructions.
//!
//! These components together are used to construct...
//! - [`Stmt`] (a data structure holding one line of assembly source code),
//! - and [`Instr`] (a data structure holding a decoded machine word).

use std::fmt::Write as _;
use std::ops::Range;

use crate::parse::lex::Ident;
use crate::sim::mem::Word;

/// A label.
///
/// This struct stores the name of the label (accessible by the `name` field)
/// and the source code span indicating where the label is located in assembly source code.
///
/// Labels are case-sensitive.
///
/// # Examples
/// ```text
/// LOOP LDA COUNT
/// ~~~~
///      BRZ DONE
///      SUB ONE
///      STA COUNT
///      BRA LOOP
/// DONE HLT
/// ~~~~
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug, Default)]
pub struct Label {
    /// The label's identifier
    pub name: String,

    /// The start of the label in assembly source code.
    start: usize
}
impl Label {
    /// Creates a new label.
    pub fn new(name: String, span: Range<usize>) -> Self {
        debug_assert_eq!(span.start + name.len(), span.end, "span should have the same length as name");
        Label { name, start: span.start }
    }
    /// Returns the span of the label in assembly source code.
    pub fn span(&self) -> Range<usize> {
        self.start .. (self.start + self.name.len())
    }
}
impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.name.fmt(f)
    }
}

/// The operand of an instruction, as written in source code.
///
/// An operand is either a reference to a label or a numeric literal.
/// Which one it is cannot be decided until the symbol table is built,
/// because a label may be named like a number.
///
/// # Examples
/// ```text
/// LDA COUNT
///     ~~~~~
/// ADD 99
///     ~~
/// ONE DAT 1
///         ~
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Operand {
    /// The operand's text.
    pub text: String,

    /// The start of the operand in assembly source code.
    start: usize
}
impl Operand {
    /// Creates a new operand.
    pub fn new(text: String, span: Range<usize>) -> Self {
        debug_assert_eq!(span.start + text.len(), span.end, "span should have the same length as text");
        Operand { text, start: span.start }
    }
    /// Returns the span of the operand in assembly source code.
    pub fn span(&self) -> Range<usize> {
        self.start .. (self.start + self.text.len())
    }
    /// Parses this operand as a decimal literal (e.g., `7`, `-3`, `+12`).
    pub fn literal(&self) -> Option<Word> {
        self.text.parse().ok()
    }
}
impl std::fmt::Display for Operand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.text.fmt(f)
    }
}

/// A statement, which is one non-empty line of assembly source code.
///
/// Each statement occupies exactly one word of memory.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Stmt {
    /// The label bound to this statement's address, if there is one.
    pub label: Option<Label>,
    /// The instruction. This is [`Ident::Label`] if the word isn't a known mnemonic.
    pub instr: Ident,
    /// The span of the instruction.
    pub instr_span: Range<usize>,
    /// The operand of the instruction, if present.
    pub operand: Option<Operand>,
    /// Any words after the operand. These are not assembled.
    pub extra: Vec<Operand>,
    /// The span of the whole statement.
    pub span: Range<usize>
}
impl std::fmt::Display for Stmt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(label) = &self.label {
            write!(f, "{label} ")?;
        }
        self.instr.fmt(f)?;
        if let Some(operand) = &self.operand {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

/// A decoded machine word.
///
/// A word is decoded by splitting it into an opcode (`word / 100`) and
/// an address (`word % 100`).
///
/// | word      | instruction | effect                          |
/// |-----------|-------------|---------------------------------|
/// | `1xx`     | `ADD xx`    | `ACC += mem[xx]`                |
/// | `2xx`     | `SUB xx`    | `ACC -= mem[xx]`                |
/// | `3xx`     | `STA xx`    | `mem[xx] = ACC`                 |
/// | `5xx`     | `LDA xx`    | `ACC = mem[xx]`                 |
/// | `6xx`     | `BRA xx`    | `PC = xx`                       |
/// | `7xx`     | `BRZ xx`    | `PC = xx` if `ACC == 0`         |
/// | `8xx`     | `BRP xx`    | `PC = xx` if `ACC >= 0`         |
/// | `901`     | `INP`       | `ACC = input`                   |
/// | `902`     | `OUT`       | output `ACC`                    |
/// | `0xx`     | `HLT`       | stop                            |
///
/// Every other word (`4xx`, `9xx` besides `901` and `902`, and anything outside `0..=999`)
/// does not decode to an instruction.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
#[allow(clippy::upper_case_acronyms)]
pub enum Instr {
    #[allow(missing_docs)]
    ADD(u8),
    #[allow(missing_docs)]
    SUB(u8),
    #[allow(missing_docs)]
    STA(u8),
    #[allow(missing_docs)]
    LDA(u8),
    #[allow(missing_docs)]
    BRA(u8),
    #[allow(missing_docs)]
    BRZ(u8),
    #[allow(missing_docs)]
    BRP(u8),
    #[allow(missing_docs)]
    INP,
    #[allow(missing_docs)]
    OUT,
    #[allow(missing_docs)]
    HLT
}
impl Instr {
    /// Splits a word into its opcode and address parts.
    ///
    /// Division truncates toward zero, so negative words produce
    /// non-positive opcodes and addresses.
    pub fn split(word: Word) -> (Word, Word) {
        (word / 100, word % 100)
    }

    /// Decodes a word into an instruction, returning `None` if the word is not a valid instruction.
    ///
    /// # Example
    /// ```
    /// use lmc_ensemble::ast::Instr;
    ///
    /// assert_eq!(Instr::decode(512), Some(Instr::LDA(12)));
    /// assert_eq!(Instr::decode(901), Some(Instr::INP));
    /// assert_eq!(Instr::decode(0), Some(Instr::HLT));
    /// assert_eq!(Instr::decode(450), None);
    /// ```
    pub fn decode(word: Word) -> Option<Self> {
        let (opcode, addr) = Self::split(word);
        // Opcodes 1-8 imply 100 <= word <= 899, so `addr` is always in 0..=99 there.
        let a = u8::try_from(addr).ok();
        match opcode {
            0 => Some(Instr::HLT),
            1 => a.map(Instr::ADD),
            2 => a.map(Instr::SUB),
            3 => a.map(Instr::STA),
            5 => a.map(Instr::LDA),
            6 => a.map(Instr::BRA),
            7 => a.map(Instr::BRZ),
            8 => a.map(Instr::BRP),
            9 if addr == 1 => Some(Instr::INP),
            9 if addr == 2 => Some(Instr::OUT),
            _ => None
        }
    }

    /// The mnemonic of this instruction.
    pub fn mnemonic(self) -> Ident {
        match self {
            Instr::ADD(_) => Ident::ADD,
            Instr::SUB(_) => Ident::SUB,
            Instr::STA(_) => Ident::STA,
            Instr::LDA(_) => Ident::LDA,
            Instr::BRA(_) => Ident::BRA,
            Instr::BRZ(_) => Ident::BRZ,
            Instr::BRP(_) => Ident::BRP,
            Instr::INP    => Ident::INP,
            Instr::OUT    => Ident::OUT,
            Instr::HLT    => Ident::HLT,
        }
    }
}
impl std::fmt::Display for Instr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.mnemonic().fmt(f)?;
        match *self {
            | Instr::ADD(a) | Instr::SUB(a) | Instr::STA(a) | Instr::LDA(a)
            | Instr::BRA(a) | Instr::BRZ(a) | Instr::BRP(a) => {
                f.write_char(' ')?;
                write!(f, "{a:02}")
            },
            Instr::INP | Instr::OUT | Instr::HLT => Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Instr;

    #[test]
    fn test_decode_all_opcodes() {
        assert_eq!(Instr::decode(105), Some(Instr::ADD(5)));
        assert_eq!(Instr::decode(299), Some(Instr::SUB(99)));
        assert_eq!(Instr::decode(300), Some(Instr::STA(0)));
        assert_eq!(Instr::decode(510), Some(Instr::LDA(10)));
        assert_eq!(Instr::decode(642), Some(Instr::BRA(42)));
        assert_eq!(Instr::decode(701), Some(Instr::BRZ(1)));
        assert_eq!(Instr::decode(850), Some(Instr::BRP(50)));
        assert_eq!(Instr::decode(901), Some(Instr::INP));
        assert_eq!(Instr::decode(902), Some(Instr::OUT));
        assert_eq!(Instr::decode(0), Some(Instr::HLT));
        assert_eq!(Instr::decode(57), Some(Instr::HLT));
    }

    #[test]
    fn test_decode_undefined() {
        assert_eq!(Instr::decode(400), None);
        assert_eq!(Instr::decode(499), None);
        assert_eq!(Instr::decode(900), None);
        assert_eq!(Instr::decode(903), None);
        assert_eq!(Instr::decode(999), None);
        assert_eq!(Instr::decode(1000), None);
        assert_eq!(Instr::decode(-150), None);
        // Truncating division puts small negative words in the HLT range.
        assert_eq!(Instr::decode(-5), Some(Instr::HLT));
    }

    #[test]
    fn test_display() {
        assert_eq!(Instr::LDA(7).to_string(), "LDA 07");
        assert_eq!(Instr::BRP(42).to_string(), "BRP 42");
        assert_eq!(Instr::OUT.to_string(), "OUT");
    }
}
