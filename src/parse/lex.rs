//! Tokenizing LMC assembly.
//!
//! This module holds the tokens that characterize LMC assembly ([`Token`]).
//! This module is used by the parser to facilitate the conversion of
//! assembly source code into a list of statements.
//!
//! LMC assembly is whitespace-delimited, so there are only three kinds of tokens:
//! words (mnemonics, labels, and operands), comments, and new lines.

use logos::Logos;

/// A unit of information in LMC source code.
#[derive(Debug, Logos, PartialEq, Eq, Clone)]
#[logos(skip r"[ \t\r\x0B\x0C]+")]
pub enum Token {
    // This regex spans over anything that isn't whitespace.
    // Whether a word is a label, a mnemonic, or a numeric operand
    // depends on its position in the line, so it's resolved by the parser.

    /// A word.
    ///
    /// This can refer to either:
    /// - an instruction (e.g. `ADD`, `lda`, `Hlt`)
    /// - a label (e.g., `LOOP`, `ONE`, `result`)
    /// - a numeric operand (e.g., `10`, `-5`)
    ///
    /// Instructions are case-insensitive.
    #[regex(r"[^ \t\r\n\x0B\x0C]+", |lx| lx.slice().parse::<Ident>().ok())]
    Ident(Ident),

    /// A comment, which starts with `//` and spans the remaining part of the line.
    #[regex(r"//[^\n]*", priority = 5)]
    Comment,

    /// A new line
    #[token("\n")]
    NewLine
}

macro_rules! ident_enum {
    ($($instr:ident),+) => {
        /// An identifier.
        ///
        /// This can refer to either:
        /// - an instruction (e.g. `ADD`, `SUB`, `DAT`)
        /// - anything else (e.g., `LOOP`, `ONE`, `10`)
        ///
        /// Instructions are case insensitive. Anything else keeps its text as written.
        #[derive(Debug, PartialEq, Eq, Hash, Clone)]
        pub enum Ident {
            $(
                #[allow(missing_docs)]
                $instr
            ),+,
            #[allow(missing_docs)]
            Label(String)
        }

        impl Ident {
            /// Every mnemonic of the instruction set.
            pub const MNEMONICS: &'static [Ident] = &[$(Ident::$instr),+];
        }

        impl std::str::FromStr for Ident {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match &*s.to_uppercase() {
                    $(stringify!($instr) => Ok(Self::$instr)),*,
                    _ => Ok(Self::Label(s.to_string()))
                }
            }
        }

        impl std::fmt::Display for Ident {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$instr => f.write_str(stringify!($instr))),*,
                    Self::Label(id) => f.write_str(id)
                }
            }
        }
    };
}
ident_enum! {
    ADD, SUB, STA, LDA, BRA, BRZ, BRP, INP, OUT, HLT, DAT
}

impl Ident {
    /// Whether this identifier is one of the instruction mnemonics.
    pub fn is_mnemonic(&self) -> bool {
        !matches!(self, Ident::Label(_))
    }

    /// Whether this mnemonic takes a memory address as its operand.
    pub fn takes_address(&self) -> bool {
        matches!(self,
            Ident::ADD | Ident::SUB | Ident::STA | Ident::LDA |
            Ident::BRA | Ident::BRZ | Ident::BRP
        )
    }
}

#[cfg(test)]
mod tests {
    use logos::Logos;

    use crate::parse::lex::{Ident, Token};

    fn label(s: &str) -> Token {
        Token::Ident(Ident::Label(s.to_string()))
    }

    #[test]
    fn test_keywords_labels() {
        let kws = "ADD SUB STA LDA BRA BRZ BRP INP OUT HLT DAT";
        for m_token in Token::lexer(kws) {
            let token = m_token.unwrap();
            assert!(
                matches!(token, Token::Ident(ref id) if id.is_mnemonic()),
                "Expected {token:?} to be keyword"
            );
        }
        assert_eq!(Token::lexer(kws).count(), Ident::MNEMONICS.len());

        // Case insensitivity
        let mut tokens = Token::lexer("LDA LDa LdA Lda lDA lDa ldA lda");
        for _ in 0..8 {
            assert_eq!(tokens.next(), Some(Ok(Token::Ident(Ident::LDA))));
        }
        assert_eq!(tokens.next(), None);

        // Labels keep their case
        let mut tokens = Token::lexer("LOOP loop _one first");
        assert_eq!(tokens.next(), Some(Ok(label("LOOP"))));
        assert_eq!(tokens.next(), Some(Ok(label("loop"))));
        assert_eq!(tokens.next(), Some(Ok(label("_one"))));
        assert_eq!(tokens.next(), Some(Ok(label("first"))));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_words() {
        // Numbers and punctuation are words too; the parser decides what they mean
        let mut tokens = Token::lexer("10 -5 +7 x@y 1a");
        assert_eq!(tokens.next(), Some(Ok(label("10"))));
        assert_eq!(tokens.next(), Some(Ok(label("-5"))));
        assert_eq!(tokens.next(), Some(Ok(label("+7"))));
        assert_eq!(tokens.next(), Some(Ok(label("x@y"))));
        assert_eq!(tokens.next(), Some(Ok(label("1a"))));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_comments() {
        let mut tokens = Token::lexer("// full line\nLDA ONE // trailing comment\n//");
        assert_eq!(tokens.next(), Some(Ok(Token::Comment)));
        assert_eq!(tokens.next(), Some(Ok(Token::NewLine)));
        assert_eq!(tokens.next(), Some(Ok(Token::Ident(Ident::LDA))));
        assert_eq!(tokens.next(), Some(Ok(label("ONE"))));
        assert_eq!(tokens.next(), Some(Ok(Token::Comment)));
        assert_eq!(tokens.next(), Some(Ok(Token::NewLine)));
        assert_eq!(tokens.next(), Some(Ok(Token::Comment)));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_whitespace() {
        let mut tokens = Token::lexer("  \tINP\r\n\x0BOUT \x0C\n");
        assert_eq!(tokens.next(), Some(Ok(Token::Ident(Ident::INP))));
        assert_eq!(tokens.next(), Some(Ok(Token::NewLine)));
        assert_eq!(tokens.next(), Some(Ok(Token::Ident(Ident::OUT))));
        assert_eq!(tokens.next(), Some(Ok(Token::NewLine)));
        assert_eq!(tokens.next(), None);
    }

    #[test]
    fn test_ident_display() {
        assert_eq!("hlt".parse::<Ident>().unwrap().to_string(), "HLT");
        assert_eq!("Done".parse::<Ident>().unwrap().to_string(), "Done");
        assert!(Ident::BRZ.takes_address());
        assert!(!Ident::DAT.takes_address());
        assert!(!Ident::INP.takes_address());
    }
}
