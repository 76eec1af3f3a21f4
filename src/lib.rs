//! LL(1)-Tutor is an engine for teaching context-free grammar parsing.
//!
//! It provides a table-driven predictive parser that runs one step at a
//! time and records its stack and remaining input after every step, a
//! random generator that finds sentences of bounded length by backtracking
//! over production choices, and a session for building a leftmost
//! derivation by hand.
//!
//! # Example
//!
//! ```rust
//! use ll1_tutor::{Generator, GeneratorConfig, ParseState, PredictiveParser};
//!
//! let parser = PredictiveParser::standard().unwrap();
//!
//! let mut analysis = parser.start("ab").unwrap();
//! analysis.step();
//! assert_eq!(analysis.remaining(), "ab$");
//! assert_eq!(analysis.run(), &ParseState::Accepted { steps: 4 });
//!
//! let mut generator = Generator::new(parser.grammar(), GeneratorConfig::default());
//! let generated = generator.generate().unwrap();
//! assert!(parser.accepts(&generated.sentence));
//! ```

pub mod derivation;
pub mod generator;
pub mod grammar;
pub mod parser;
pub mod table;
pub mod utils;

pub use derivation::{Choice, Derivation, DerivationSession};
pub use generator::{Generated, Generator, GeneratorConfig};
pub use grammar::{END_MARKER, EPSILON, Grammar, GrammarBuilder, Production, Symbol};
pub use parser::{Action, Analysis, ParseState, PredictiveParser, Step};
pub use table::ParsingTable;
pub use utils::{Result, TutorError};
