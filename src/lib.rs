//! A Little Man Computer (LMC) parser, assembler, and simulator.
//!
//! The LMC is a teaching machine with 100 decimal memory cells,
//! one accumulator, and blocking input and output.
//!
//! # Usage
//!
//! To convert LMC source code to an object file, it must be assembled:
//! ```
//! use lmc_ensemble::asm::{assemble, assemble_debug, ObjectFile};
//!
//! let code = "
//!          INP
//!          STA X
//!          ADD X
//!          OUT
//!          HLT
//!     X    DAT
//! ";
//!
//! // Assemble source into object file:
//! let obj_file: ObjectFile = assemble(code).unwrap();
//! // OR, keeping labels and line information:
//! let obj_file: ObjectFile = assemble_debug(code).unwrap();
//! ```
//!
//! The parsed form of the source is also available through [`parse::parse_ast`].
//!
//! Once an object file has been created, it can be executed with the simulator:
//! ```
//! # // Assembling was shown in the previous example, so this doesn't need to be shown again.
//! # use lmc_ensemble::asm::assemble;
//! #
//! # let code = "INP\nSTA X\nADD X\nOUT\nHLT\nX DAT";
//! # let obj_file = assemble(code).unwrap();
//! #
//! use lmc_ensemble::sim::{OutputEvent, Simulator};
//!
//! let mut simulator = Simulator::new(Default::default());
//! simulator.load_obj_file(&obj_file);
//! simulator.run().unwrap(); // <-- Result can be handled accordingly
//!
//! // The program is waiting on INP:
//! assert!(simulator.awaiting_input());
//! simulator.resume_with_input("21").unwrap();
//! simulator.run().unwrap();
//!
//! assert!(simulator.hit_halt());
//! assert_eq!(simulator.output(), &[OutputEvent(42)]);
//! ```
//!
//! If more granularity is needed for simulation, there are also step-by-step functions
//! and IO adapters. See the [`sim`] module for more details.
#![warn(missing_docs)]

pub mod parse;
pub mod ast;
pub mod asm;
pub mod sim;
pub mod err;
