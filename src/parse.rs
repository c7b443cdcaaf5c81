//! Parsing assembly source code into an AST.
//!
//! This module is used to convert strings (which represent assembly source code)
//! into abstract syntax trees ([`Stmt`]s).
//!
//! The main function to parse assembly source code is [`parse_ast`].
//!
//! LMC assembly is line-based. Every line that holds at least one word
//! (after comments are removed) produces exactly one statement.
//! A line is read as:
//! ```text
//! [label] mnemonic [operand] [ignored...]
//! ```
//! where the first word is treated as a label only if the line has more than one word
//! and the first word isn't a mnemonic.
//!
//! Parsing never fails. Lines with an unrecognized mnemonic are kept as is
//! and rejected during assembly.

pub mod lex;

use std::ops::Range;

use logos::Logos;

use crate::ast::{Label, Operand, Stmt};
use lex::{Ident, Token};

/// Parses a string of assembly source code into a list of statements.
///
/// # Example
/// ```
/// use lmc_ensemble::parse::parse_ast;
/// use lmc_ensemble::parse::lex::Ident;
///
/// let stmts = parse_ast("
///     // countdown
///     LOOP LDA N
///          HLT
///     N    DAT 3
/// ");
/// assert_eq!(stmts.len(), 3);
/// assert_eq!(stmts[0].label.as_ref().map(|l| &*l.name), Some("LOOP"));
/// assert_eq!(stmts[0].instr, Ident::LDA);
/// assert_eq!(stmts[2].operand.as_ref().map(|o| &*o.text), Some("3"));
/// ```
pub fn parse_ast(src: &str) -> Vec<Stmt> {
    let mut stmts = vec![];
    let mut words: Vec<(Ident, Range<usize>)> = vec![];

    for (m_token, span) in Token::lexer(src).spanned() {
        match m_token {
            Ok(Token::Ident(id)) => words.push((id, span)),
            Ok(Token::Comment) => {},
            Ok(Token::NewLine) => stmts.extend(build_stmt(src, std::mem::take(&mut words))),
            // Every non-whitespace character is part of some word,
            // but if the lexer rejects something anyway, keep its text as a word.
            Err(()) => words.push((Ident::Label(src[span.clone()].to_string()), span)),
        }
    }
    stmts.extend(build_stmt(src, words));

    log::debug!("parsed {} statement(s)", stmts.len());
    stmts
}

/// Builds a statement out of the words of one line.
///
/// This returns `None` if the line had no words.
fn build_stmt(src: &str, words: Vec<(Ident, Range<usize>)>) -> Option<Stmt> {
    let end = words.last()?.1.end;
    let mut words = words.into_iter();

    let (first, first_span) = words.next()?;
    let has_more = words.len() > 0;
    let start = first_span.start;

    let (label, (instr, instr_span)) = match first {
        Ident::Label(name) if has_more => (Some(Label::new(name, first_span)), words.next()?),
        id => (None, (id, first_span)),
    };

    // Operands are taken as written, since a mnemonic-like word (e.g., `add`)
    // would have been uppercased by the lexer.
    let mut rest = words.map(|(_, span)| Operand::new(src[span.clone()].to_string(), span));
    let operand = rest.next();
    let extra: Vec<_> = rest.collect();
    if !extra.is_empty() {
        log::trace!("ignoring {} extra word(s) after {instr}", extra.len());
    }

    Some(Stmt { label, instr, instr_span, operand, extra, span: start..end })
}
