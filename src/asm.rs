//! Assembling assembly source code into object files.
//!
//! This module is used to convert assembly source code (or its statements, `Vec<`[`Stmt`]`>`)
//! into object files that can be executed by the simulator.
//!
//! The assembler module notably consists of:
//! - [`assemble`], [`assemble_debug`], and [`assemble_with`]: The main functions which assemble source code into an object file.
//! - [`SymbolTable`]: a struct holding the symbol table, which stores location information for labels after the first assembler pass
//! - [`ObjectFile`]: a struct holding the object file, which can be loaded into the simulator and executed
//!
//! By default, the assembler is permissive. Operands which are neither a label nor a number
//! assemble as `0`, duplicate labels resolve to their last definition, and statements
//! past the end of memory are dropped. Each of these becomes an error with [`AsmFlags::strict`].
//!
//! [`Stmt`]: crate::ast::Stmt

use std::collections::HashMap;
use std::ops::Range;

use crate::ast::{Operand, Stmt};
use crate::err::ErrSpan;
use crate::parse::lex::Ident;
use crate::parse::parse_ast;
use crate::sim::mem::{Word, MEM_SIZE};

/// Configuration flags for the assembler.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub struct AsmFlags {
    /// Whether malformed (but assemblable) source should be rejected.
    ///
    /// If true, the following raise errors instead of being accepted silently:
    /// - operands which are neither a label nor an integer ([`AsmErrKind::InvalidOperand`]),
    /// - address operands outside `0..=99` and `DAT` values outside `-999..=999` ([`AsmErrKind::OperandOutOfRange`]),
    /// - address instructions without an operand ([`AsmErrKind::MissingOperand`]),
    /// - programs with more than 100 statements ([`AsmErrKind::CapacityExceeded`]),
    /// - labels defined more than once ([`AsmErrKind::DuplicateLabel`]).
    ///
    /// This is false by default.
    pub strict: bool,

    /// Whether debug symbols should be kept in the object file.
    ///
    /// See [`SymbolTable`] for more details about debug symbols.
    ///
    /// This is false by default.
    pub debug_symbols: bool
}

/// Assembles assembly source code into an object file.
///
/// This function assembles the source *without* including debug symbols
/// in the object file.
/// See [`SymbolTable`] for more details about debug symbols.
///
/// # Example
/// ```
/// use lmc_ensemble::asm::assemble;
///
/// let src = "
///     LDA A
///     ADD B
///     OUT
///     HLT
///     A DAT 5
///     B DAT 7
/// ";
///
/// let obj_file = assemble(src);
/// assert!(obj_file.is_ok());
///
/// let obj_file = obj_file.unwrap();
/// assert_eq!(&obj_file.words()[..6], &[504, 105, 902, 0, 5, 7]);
///
/// // Symbol table doesn't exist in object file:
/// assert!(obj_file.symbol_table().is_none());
/// ```
pub fn assemble(src: &str) -> Result<ObjectFile, AsmErr> {
    assemble_with(src, AsmFlags::default())
}
/// Assembles assembly source code into an object file.
///
/// This function assembles the source *and* includes debug symbols
/// in the object file.
/// See [`SymbolTable`] for more details about debug symbols.
///
/// # Example
/// ```
/// use lmc_ensemble::asm::assemble_debug;
///
/// let src = "
///     LOOP BRA LOOP
/// ";
///
/// let obj_file = assemble_debug(src);
/// assert!(obj_file.is_ok());
///
/// // Symbol table does exist in object file:
/// let obj_file = obj_file.unwrap();
/// let sym = obj_file.symbol_table().unwrap();
/// assert_eq!(sym.lookup_label("LOOP"), Some(0));
/// ```
pub fn assemble_debug(src: &str) -> Result<ObjectFile, AsmErr> {
    assemble_with(src, AsmFlags { debug_symbols: true, ..Default::default() })
}
/// Assembles assembly source code into an object file, using the provided flags.
///
/// If assembly fails, no part of the object file is produced.
pub fn assemble_with(src: &str, flags: AsmFlags) -> Result<ObjectFile, AsmErr> {
    let ast = parse_ast(src);
    let sym = SymbolTable::new(&ast, flags.debug_symbols.then_some(src), flags)?;
    ObjectFile::new(ast, sym, flags)
}

/// Kinds of errors that can occur from assembling given assembly code.
///
/// See [`AsmErr`] for this error type with span information included.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub enum AsmErrKind {
    /// The instruction is not a known mnemonic (pass 2).
    ///
    /// This holds the instruction name, uppercased.
    UnknownInstruction(String),
    /// The program has more statements than there are memory cells (pass 2, strict).
    CapacityExceeded,
    /// The operand is neither a label nor an integer (pass 2, strict).
    InvalidOperand,
    /// The operand does not fit the instruction (pass 2, strict).
    OperandOutOfRange,
    /// The instruction requires an operand, but none was given (pass 2, strict).
    MissingOperand,
    /// There were multiple labels of the same name (pass 1, strict).
    DuplicateLabel,
}
impl std::fmt::Display for AsmErrKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownInstruction(name) => write!(f, "unknown instruction: {name}"),
            Self::CapacityExceeded  => write!(f, "program does not fit in {MEM_SIZE} memory cells"),
            Self::InvalidOperand    => f.write_str("operand is not a label or an integer"),
            Self::OperandOutOfRange => f.write_str("operand is out of range"),
            Self::MissingOperand    => f.write_str("instruction is missing an operand"),
            Self::DuplicateLabel    => f.write_str("label was defined multiple times"),
        }
    }
}

/// Error from assembling given assembly code.
#[derive(Debug, PartialEq, Eq)]
pub struct AsmErr {
    /// The value with a span.
    pub kind: AsmErrKind,
    /// The span in the source associated with this value.
    pub span: ErrSpan
}
impl AsmErr {
    /// Creates a new [`AsmErr`].
    pub fn new<E: Into<ErrSpan>>(kind: AsmErrKind, span: E) -> Self {
        AsmErr { kind, span: span.into() }
    }
}
impl std::fmt::Display for AsmErr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.kind.fmt(f)
    }
}
impl std::error::Error for AsmErr {}
impl crate::err::Error for AsmErr {
    fn span(&self) -> Option<crate::err::ErrSpan> {
        Some(self.span.clone())
    }

    fn help(&self) -> Option<std::borrow::Cow<str>> {
        match &self.kind {
            AsmErrKind::UnknownInstruction(_) => Some(format!("valid instructions are {}", MnemonicList).into()),
            AsmErrKind::CapacityExceeded  => Some("each instruction and DAT takes one cell; try shortening the program".into()),
            AsmErrKind::InvalidOperand    => Some("check the spelling of this label (labels are case-sensitive)".into()),
            AsmErrKind::OperandOutOfRange => Some("addresses must be between 0 and 99, and DAT values between -999 and 999".into()),
            AsmErrKind::MissingOperand    => Some("try adding an address or label after this instruction".into()),
            AsmErrKind::DuplicateLabel    => Some("labels must be unique within a file, try renaming one of the labels".into()),
        }
    }
}

/// Displays every mnemonic, separated by commas.
struct MnemonicList;
impl std::fmt::Display for MnemonicList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut it = Ident::MNEMONICS.iter();
        if let Some(first) = it.next() {
            first.fmt(f)?;
        }
        for m in it {
            write!(f, ", {m}")?;
        }
        Ok(())
    }
}

/// A mapping from line numbers to memory addresses (and vice-versa).
///
/// Every statement takes exactly one line and one address, so
/// this is the line number of each address's statement, in address order.
///
/// For example,
/// ```text
/// 0 | // countdown
/// 1 | LOOP LDA N
/// 2 |      BRZ DONE
/// 3 |
/// 4 | DONE HLT
/// 5 | N    DAT 3
/// ```
/// maps to `LineSymbolMap([1, 2, 4, 5])`.
///
/// The line numbers are strictly increasing.
#[derive(PartialEq, Eq, Clone, Debug)]
struct LineSymbolMap(Vec<usize>);

impl LineSymbolMap {
    /// Gets the memory address associated with this line, if it is present in the line symbol mapping.
    fn get(&self, line: usize) -> Option<usize> {
        self.0.binary_search(&line).ok()
    }

    /// Gets the source line number associated with this memory address, if it is present in the symbol table.
    fn find(&self, addr: usize) -> Option<usize> {
        self.0.get(addr).copied()
    }

    /// Gets an iterable representing the mapping of line numbers to addresses.
    fn iter(&self) -> impl Iterator<Item=(usize, usize)> + '_ {
        self.0.iter()
            .enumerate()
            .map(|(addr, &line)| (line, addr))
    }
}

/// The source text of a program, indexed by line.
///
/// Every statement sits on its own line, so source positions
/// are reported as a line and a column (both starting at 0).
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SourceInfo {
    src: String,
    /// The byte index where each line starts.
    line_starts: Vec<usize>
}
impl SourceInfo {
    /// Indexes the lines of the given source.
    pub fn new(src: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();

        Self { src: src.to_string(), line_starts }
    }

    /// Returns the entire source.
    pub fn source(&self) -> &str {
        &self.src
    }

    /// Gets the line holding the given byte index.
    ///
    /// Indices past the end of the source are on the last line.
    fn line_of(&self, index: usize) -> usize {
        // line_starts[0] is 0, so this is at least 1
        self.line_starts.partition_point(|&start| start <= index) - 1
    }

    /// Gets the byte range of the provided line, without surrounding whitespace.
    ///
    /// This returns None if the line does not exist.
    pub fn line_span(&self, line: usize) -> Option<Range<usize>> {
        let start = *self.line_starts.get(line)?;
        let end = self.line_starts.get(line + 1)
            .map_or(self.src.len(), |&next| next - 1);

        let text = self.src[start..end].trim_end();
        let indent = text.len() - text.trim_start().len();
        Some(start + indent .. start + text.len())
    }

    /// Calculates the line and column for a given byte index.
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::asm::SourceInfo;
    ///
    /// let info = SourceInfo::new("INP\nOUT\n  HLT");
    /// assert_eq!(info.position(0), (0, 0));
    /// assert_eq!(info.position(5), (1, 1));
    /// assert_eq!(info.position(10), (2, 2));
    /// ```
    pub fn position(&self, index: usize) -> (usize, usize) {
        let line = self.line_of(index);
        (line, index - self.line_starts[line])
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
struct SymbolData {
    addr: usize,
    src_start: usize
}
impl SymbolData {
    /// Calculates the source range of this symbol, given the name of the label.
    fn span(&self, label: &str) -> Range<usize> {
        self.src_start .. (self.src_start + label.len())
    }
}

/// Debug symbols.
#[derive(PartialEq, Eq, Debug, Clone)]
struct DebugSymbols {
    /// A mapping from each line with a statement in the source to an address.
    line_map: LineSymbolMap,

    /// Information about the source.
    src_info: SourceInfo
}

/// The symbol table created in the first assembler pass
/// that encodes source code mappings to memory addresses in the object file.
///
/// The symbol table consists of:
/// - A mapping from source code labels to memory addresses.
/// - A mapping from source code line numbers to memory addresses (if debug symbols are enabled).
/// - The source text (if debug symbols are enabled).
///
/// Here is a table of the mappings that the symbol table provides:
///
/// | from ↓, to →   | label                              | memory address                | source line/span                  |
/// |----------------|------------------------------------|-------------------------------|-----------------------------------|
/// | label          | -                                  | [`SymbolTable::lookup_label`] | [`SymbolTable::get_label_source`] |
/// | memory address | [`SymbolTable::rev_lookup_label`]  | -                             | [`SymbolTable::rev_lookup_line`]  |
/// | source line    | none                               | [`SymbolTable::lookup_line`]  | -                                 |
///
/// Labels are case-sensitive. An address is the index of the labeled statement, so
/// labels on statements which do not fit in memory have addresses of 100 or more.
///
/// # Debug symbols
///
/// Debug symbols are optional data added to this symbol table which can help users debug their code.
///
/// Without debug symbols, the symbol table is only used to translate labels in source code to addresses
/// during the assembly process. After the completion of this assembly process,
/// the [`SymbolTable`] is dropped and is not part of the resultant [`ObjectFile`].
///
/// However, with debug symbols, this information persists in the resultant [`ObjectFile`], allowing
/// the label mappings to be accessed during simulation time. Additionally, more information from the source
/// text is available during simulation time:
/// - Mappings from source code line numbers to memory addresses
/// - Source code text (which grants access to line contents from a given line number; see [`SourceInfo`] for more details)
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct SymbolTable {
    /// A mapping from label to address and span of the label.
    label_map: HashMap<String, SymbolData>,

    /// Whether each address holds a `DAT` statement.
    dat_cells: Vec<bool>,

    /// Debug symbols. If None, there were no debug symbols provided.
    debug_symbols: Option<DebugSymbols>,
}

impl SymbolTable {
    /// Creates a new symbol table.
    ///
    /// This performs the first assembler pass, calculating the memory address of
    /// labels at each provided statement.
    ///
    /// If a `src` argument is provided, debug symbols are also computed for the symbol table.
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::{AsmFlags, SymbolTable};
    ///
    /// let src = "
    ///     INP
    ///     LABEL HLT
    /// ";
    /// let ast = parse_ast(src);
    ///
    /// // without debug symbols
    /// let sym = SymbolTable::new(&ast, None, AsmFlags::default()).unwrap();
    /// assert_eq!(sym.lookup_label("LABEL"), Some(1));
    /// assert_eq!(sym.lookup_line(2), None);
    ///
    /// // with debug symbols
    /// let sym = SymbolTable::new(&ast, Some(src), AsmFlags::default()).unwrap();
    /// assert_eq!(sym.lookup_label("LABEL"), Some(1));
    /// assert_eq!(sym.lookup_line(2), Some(1));
    /// ```
    pub fn new(stmts: &[Stmt], src: Option<&str>, flags: AsmFlags) -> Result<Self, AsmErr> {
        let mut label_map: HashMap<String, SymbolData> = HashMap::new();

        for (addr, stmt) in stmts.iter().enumerate() {
            let Some(label) = &stmt.label else { continue };

            let data = SymbolData { addr, src_start: label.span().start };
            if let Some(old) = label_map.insert(label.name.clone(), data) {
                if flags.strict {
                    return Err(AsmErr::new(AsmErrKind::DuplicateLabel, [old.span(&label.name), label.span()]));
                }
                log::warn!("label {} redefined (address {} -> {addr})", label.name, old.addr);
            }
            log::debug!("bound label {} to address {addr}", label.name);
        }

        let debug_symbols = src.map(|src| {
            let src_info = SourceInfo::new(src);
            let lines = stmts.iter()
                .map(|stmt| src_info.line_of(stmt.span.start))
                .collect();

            DebugSymbols { line_map: LineSymbolMap(lines), src_info }
        });

        let dat_cells = stmts.iter()
            .map(|stmt| matches!(stmt.instr, Ident::DAT))
            .collect();

        Ok(SymbolTable { label_map, dat_cells, debug_symbols })
    }

    /// Gets the memory address of a given label (if it exists).
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::{AsmFlags, SymbolTable};
    ///
    /// let src = "
    ///     LOOP  ADD ONE
    ///           BRA LOOP
    ///     LOOP2 SUB ONE
    ///           BRA LOOP2
    ///     ONE   DAT 1
    /// ";
    /// let ast = parse_ast(src);
    ///
    /// let sym = SymbolTable::new(&ast, None, AsmFlags::default()).unwrap();
    /// assert_eq!(sym.lookup_label("LOOP"), Some(0));
    /// assert_eq!(sym.lookup_label("LOOP2"), Some(2));
    /// assert_eq!(sym.lookup_label("ONE"), Some(4));
    /// assert_eq!(sym.lookup_label("loop"), None);
    /// ```
    pub fn lookup_label(&self, label: &str) -> Option<usize> {
        self.label_map.get(label).map(|sym_data| sym_data.addr)
    }

    /// Gets the label at a given memory address (if it exists).
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::{AsmFlags, SymbolTable};
    ///
    /// let src = "
    ///     LOOP  ADD ONE
    ///           BRA LOOP
    ///     ONE   DAT 1
    /// ";
    /// let ast = parse_ast(src);
    ///
    /// let sym = SymbolTable::new(&ast, None, AsmFlags::default()).unwrap();
    /// assert_eq!(sym.rev_lookup_label(0), Some("LOOP"));
    /// assert_eq!(sym.rev_lookup_label(1), None);
    /// assert_eq!(sym.rev_lookup_label(2), Some("ONE"));
    /// ```
    pub fn rev_lookup_label(&self, addr: usize) -> Option<&str> {
        let (label, _) = self.label_map.iter()
            .find(|&(_, sym_data)| sym_data.addr == addr)?;

        Some(label)
    }

    /// Gets the source span of a given label (if it exists).
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::{AsmFlags, SymbolTable};
    ///
    /// let src = "INP\nLOOPY BRA LOOPY";
    /// let ast = parse_ast(src);
    ///
    /// let sym = SymbolTable::new(&ast, None, AsmFlags::default()).unwrap();
    /// assert_eq!(sym.get_label_source("LOOPY"), Some(4..9));
    /// assert_eq!(sym.get_label_source("LOOP_DE_LOOP"), None);
    /// ```
    pub fn get_label_source(&self, label: &str) -> Option<Range<usize>> {
        self.label_map.get(label)
            .map(|data| data.span(label))
    }

    /// Gets the address of a given source line.
    ///
    /// If debug symbols are not enabled, this unconditionally returns `None`.
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::{AsmFlags, SymbolTable};
    ///
    /// let src = "// countdown
    /// LOOP LDA N
    ///      BRZ DONE
    ///
    /// DONE HLT
    /// N    DAT 3";
    /// let ast = parse_ast(src);
    ///
    /// // Debug symbols required:
    /// let sym = SymbolTable::new(&ast, Some(src), AsmFlags::default()).unwrap();
    /// assert_eq!(sym.lookup_line(0), None);
    /// assert_eq!(sym.lookup_line(1), Some(0));
    /// assert_eq!(sym.lookup_line(2), Some(1));
    /// assert_eq!(sym.lookup_line(3), None);
    /// assert_eq!(sym.lookup_line(4), Some(2));
    /// assert_eq!(sym.lookup_line(5), Some(3));
    /// ```
    pub fn lookup_line(&self, line: usize) -> Option<usize> {
        self.debug_symbols.as_ref()?.line_map.get(line)
    }

    /// Gets the source line of a given memory address (if it exists.)
    ///
    /// The result can be converted into a source span (range of characters encompassed by the instruction)
    /// using [`SymbolTable::source_info`] and [`SourceInfo::line_span`].
    ///
    /// If debug symbols are not enabled, this unconditionally returns `None`.
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::{AsmFlags, SymbolTable};
    ///
    /// let src = "// countdown
    /// LOOP LDA N
    ///
    /// N    DAT 3";
    /// let ast = parse_ast(src);
    ///
    /// // Debug symbols required:
    /// let sym = SymbolTable::new(&ast, Some(src), AsmFlags::default()).unwrap();
    /// assert_eq!(sym.rev_lookup_line(0), Some(1));
    /// assert_eq!(sym.rev_lookup_line(1), Some(3));
    /// assert_eq!(sym.rev_lookup_line(2), None);
    /// ```
    pub fn rev_lookup_line(&self, addr: usize) -> Option<usize> {
        self.debug_symbols.as_ref()?.line_map.find(addr)
    }

    /// Whether the statement at a given memory address is a `DAT`.
    ///
    /// Such a cell holds data, even if its value decodes as an instruction.
    ///
    /// ## Example
    /// ```
    /// use lmc_ensemble::parse::parse_ast;
    /// use lmc_ensemble::asm::{AsmFlags, SymbolTable};
    ///
    /// let ast = parse_ast("LDA A\nHLT\nA DAT 5");
    ///
    /// let sym = SymbolTable::new(&ast, None, AsmFlags::default()).unwrap();
    /// assert!(!sym.is_data(1));
    /// assert!(sym.is_data(2));
    /// assert!(!sym.is_data(3));
    /// ```
    pub fn is_data(&self, addr: usize) -> bool {
        self.dat_cells.get(addr).copied().unwrap_or(false)
    }

    /// Reads the source info from this symbol table (if debug symbols are enabled).
    pub fn source_info(&self) -> Option<&SourceInfo> {
        self.debug_symbols.as_ref().map(|ds| &ds.src_info)
    }

    /// Gets an iterable of the mapping from labels to addresses.
    pub fn label_iter(&self) -> impl Iterator<Item=(&str, usize)> + '_ {
        self.label_map.iter()
            .map(|(label, sym_data)| (&**label, sym_data.addr))
    }

    /// Gets an iterable of the mapping from lines to addresses.
    ///
    /// This iterator will be empty if debug symbols were not enabled.
    pub fn line_iter(&self) -> impl Iterator<Item=(usize, usize)> + '_ {
        self.debug_symbols.iter()
            .flat_map(|s| s.line_map.iter())
    }

    /// Resolves an operand into a value.
    ///
    /// Labels take precedence over numeric literals.
    fn resolve_operand(&self, operand: &Operand, flags: AsmFlags) -> Result<Word, AsmErr> {
        if let Some(addr) = self.lookup_label(&operand.text) {
            // Label addresses never exceed the number of statements.
            return Ok(Word::try_from(addr).unwrap_or(Word::MAX));
        }
        match operand.literal() {
            Some(n) => Ok(n),
            None if flags.strict => Err(AsmErr::new(AsmErrKind::InvalidOperand, operand.span())),
            None => {
                log::warn!("operand {operand} is not a label or an integer, assembling as 0");
                Ok(0)
            }
        }
    }
}

/// An object file.
///
/// This is the final product after assembly source code is fully assembled.
/// This can be loaded in the simulator to run the assembled code.
///
/// An object file always describes all 100 memory cells.
/// Cells not written by the program are `0` (`HLT`).
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ObjectFile {
    /// The memory image.
    words: [Word; MEM_SIZE],

    /// The number of cells written by the program.
    len: usize,

    /// Debug symbols.
    sym: Option<SymbolTable>
}
impl ObjectFile {
    /// Creates an empty object file.
    pub fn empty() -> Self {
        ObjectFile { words: [0; MEM_SIZE], len: 0, sym: None }
    }

    /// Creates a new object file from an assembly AST and a symbol table.
    ///
    /// This performs the second assembler pass.
    fn new(ast: Vec<Stmt>, sym: SymbolTable, flags: AsmFlags) -> Result<Self, AsmErr> {
        let mut obj = ObjectFile::empty();
        let mut dropped = 0;

        for (addr, stmt) in ast.iter().enumerate() {
            if addr >= MEM_SIZE && flags.strict {
                return Err(AsmErr::new(AsmErrKind::CapacityExceeded, stmt.span.clone()));
            }

            let word = encode_stmt(stmt, &sym, flags)?;
            match obj.words.get_mut(addr) {
                Some(cell) => {
                    log::trace!("{addr:02}: {word:03} ({stmt})");
                    *cell = word;
                    obj.len += 1;
                },
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            log::warn!("program does not fit in memory, dropped {dropped} statement(s)");
        }
        log::debug!("assembled {} word(s)", obj.len);

        if flags.debug_symbols {
            obj.sym.replace(sym);
        }
        Ok(obj)
    }

    /// Gets every word of the memory image, in address order.
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    /// Gets the word at a given address, or `None` if the address is outside memory.
    pub fn get(&self, addr: usize) -> Option<Word> {
        self.words.get(addr).copied()
    }

    /// The number of memory cells written by the program.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the program wrote no memory cells.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Gets an iterator over all of the memory locations written by the program.
    pub fn addr_iter(&self) -> impl Iterator<Item=(usize, Word)> + '_ {
        self.words[..self.len].iter()
            .copied()
            .enumerate()
    }

    /// Gets the symbol table if it is present in the object file.
    pub fn symbol_table(&self) -> Option<&SymbolTable> {
        self.sym.as_ref()
    }
}
impl Default for ObjectFile {
    fn default() -> Self {
        Self::empty()
    }
}

/// Encodes a statement into a word.
fn encode_stmt(stmt: &Stmt, sym: &SymbolTable, flags: AsmFlags) -> Result<Word, AsmErr> {
    let base: Word = match &stmt.instr {
        Ident::ADD => 100,
        Ident::SUB => 200,
        Ident::STA => 300,
        Ident::LDA => 500,
        Ident::BRA => 600,
        Ident::BRZ => 700,
        Ident::BRP => 800,
        Ident::INP => return Ok(901),
        Ident::OUT => return Ok(902),
        Ident::HLT => return Ok(0),
        Ident::DAT => 0,
        Ident::Label(name) => {
            return Err(AsmErr::new(AsmErrKind::UnknownInstruction(name.to_uppercase()), stmt.instr_span.clone()));
        }
    };

    let value = match &stmt.operand {
        Some(operand) => sym.resolve_operand(operand, flags)?,
        None if flags.strict && stmt.instr.takes_address() => {
            return Err(AsmErr::new(AsmErrKind::MissingOperand, stmt.instr_span.clone()));
        },
        None => 0,
    };

    if flags.strict {
        let range = match stmt.instr.takes_address() {
            true  => 0..=(MEM_SIZE as Word - 1),
            false => -999..=999,
        };
        if !range.contains(&value) {
            // Only an explicit operand can be out of range.
            let span = stmt.operand.as_ref().map_or(stmt.span.clone(), Operand::span);
            return Err(AsmErr::new(AsmErrKind::OperandOutOfRange, span));
        }
    }

    Ok(base.wrapping_add(value))
}
