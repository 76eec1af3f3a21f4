//! Table-driven predictive parser with a steppable, recorded trace.

use std::collections::BTreeSet;
use std::fmt;

use log::{debug, info};
use serde::Serialize;

use crate::grammar::{END_MARKER, Grammar, Production, Symbol};
use crate::table::ParsingTable;
use crate::utils::{Result, TutorError};

/// Where an analysis run stands. Every state but `Running` is final.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ParseState {
    Running,
    Accepted { steps: usize },
    /// The terminal on top of the stack differs from the lookahead
    RejectedMismatch { expected: char, found: char },
    /// The table has no production for the non-terminal on top of the stack
    RejectedNoEntry { nonterminal: String, lookahead: char },
}

impl ParseState {
    pub fn is_finished(&self) -> bool {
        !matches!(self, ParseState::Running)
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, ParseState::Accepted { .. })
    }

    /// The error describing a rejection, for reporting
    pub fn rejection(&self) -> Option<TutorError> {
        match self {
            ParseState::RejectedMismatch { expected, found } => Some(TutorError::ParseMismatch {
                expected: *expected,
                found: *found,
            }),
            ParseState::RejectedNoEntry {
                nonterminal,
                lookahead,
            } => Some(TutorError::NoTableEntry {
                nonterminal: nonterminal.clone(),
                lookahead: *lookahead,
            }),
            ParseState::Running | ParseState::Accepted { .. } => None,
        }
    }
}

/// What a single trace record did
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Initial,
    Match { terminal: char },
    Apply { production: Production },
    Mismatch { expected: char, found: char },
    NoEntry { nonterminal: String, lookahead: char },
    Accept { steps: usize },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Initial => write!(f, "initial configuration"),
            Action::Match { terminal } => write!(f, "matched terminal '{}'", terminal),
            Action::Apply { production } => write!(f, "applied {}", production),
            Action::Mismatch { expected, found } => {
                write!(f, "error: expected '{}', found '{}'", expected, found)
            }
            Action::NoEntry {
                nonterminal,
                lookahead,
            } => write!(f, "error: no production for {} with input '{}'", nonterminal, lookahead),
            Action::Accept { steps } => write!(f, "accepted in {} steps", steps),
        }
    }
}

/// One record of the trace; the stack is a copy taken after the step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    pub number: usize,
    pub stack: Vec<Symbol>,
    pub remaining: String,
    pub action: Action,
}

impl Step {
    /// The stack bottom to top, space separated
    pub fn stack_string(&self) -> String {
        self.stack
            .iter()
            .map(Symbol::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A grammar paired with its parsing table. Read-only once built, so any
/// number of analyses may borrow it at the same time.
#[derive(Debug, Clone)]
pub struct PredictiveParser {
    grammar: Grammar,
    table: ParsingTable,
    alphabet: BTreeSet<char>,
}

impl PredictiveParser {
    pub fn new(grammar: Grammar, table: ParsingTable) -> Self {
        let alphabet = grammar.terminals();
        PredictiveParser {
            grammar,
            table,
            alphabet,
        }
    }

    /// The standard grammar and its table
    pub fn standard() -> Result<Self> {
        let grammar = Grammar::standard();
        let table = ParsingTable::standard(&grammar)?;
        Ok(Self::new(grammar, table))
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn table(&self) -> &ParsingTable {
        &self.table
    }

    pub fn alphabet(&self) -> &BTreeSet<char> {
        &self.alphabet
    }

    /// Check that the sentence is non-empty and only uses the alphabet
    pub fn validate_input(&self, input: &str) -> Result<Vec<char>> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TutorError::EmptyInput);
        }

        input
            .chars()
            .enumerate()
            .map(|(position, symbol)| {
                if self.alphabet.contains(&symbol) {
                    Ok(symbol)
                } else {
                    Err(TutorError::InvalidInputSymbol { symbol, position })
                }
            })
            .collect()
    }

    /// Start a new analysis of `input`; nothing is stepped yet
    pub fn start(&self, input: &str) -> Result<Analysis<'_>> {
        let mut chars = self.validate_input(input)?;
        chars.push(END_MARKER);
        info!("starting analysis of {:?}", input.trim());
        Ok(Analysis::new(self, chars))
    }

    /// Run a whole analysis and return it in its final state
    pub fn parse(&self, input: &str) -> Result<Analysis<'_>> {
        let mut analysis = self.start(input)?;
        analysis.run();
        Ok(analysis)
    }

    pub fn accepts(&self, input: &str) -> bool {
        self.parse(input).is_ok_and(|a| a.state().is_accepted())
    }
}

/// State of one analysis run: stack, input pointer and trace
#[derive(Debug, Clone)]
pub struct Analysis<'p> {
    parser: &'p PredictiveParser,
    stack: Vec<Symbol>,
    input: Vec<char>,
    pointer: usize,
    steps: usize,
    trace: Vec<Step>,
    state: ParseState,
}

impl<'p> Analysis<'p> {
    fn new(parser: &'p PredictiveParser, input: Vec<char>) -> Self {
        let start = Symbol::nonterminal(parser.grammar.start_symbol());
        let mut analysis = Analysis {
            parser,
            stack: vec![Symbol::Terminal(END_MARKER), start],
            input,
            pointer: 0,
            steps: 0,
            trace: Vec::new(),
            state: ParseState::Running,
        };
        analysis.record(Action::Initial);
        analysis
    }

    /// Discard this run and start over on a new sentence. On invalid input
    /// the current run is left untouched.
    pub fn restart(&mut self, input: &str) -> Result<()> {
        let parser = self.parser;
        *self = parser.start(input)?;
        Ok(())
    }

    fn record(&mut self, action: Action) {
        let step = Step {
            number: self.steps,
            stack: self.stack.clone(),
            remaining: self.remaining(),
            action,
        };
        debug!("{:>3}  {:<16} {:>16}  {}", step.number, step.stack_string(), step.remaining, step.action);
        self.trace.push(step);
    }

    /// Perform one step. Does nothing once the run is finished.
    pub fn step(&mut self) -> &ParseState {
        if self.state.is_finished() {
            return &self.state;
        }
        let Some(top) = self.stack.last().cloned() else {
            return &self.state;
        };
        let look = self.lookahead();
        let parser = self.parser;

        self.steps += 1;
        match top {
            Symbol::Terminal(terminal) if terminal == look => {
                self.stack.pop();
                self.pointer += 1;
                self.record(Action::Match { terminal });
            }
            Symbol::Terminal(expected) => {
                self.record(Action::Mismatch {
                    expected,
                    found: look,
                });
                self.state = ParseState::RejectedMismatch {
                    expected,
                    found: look,
                };
                return &self.state;
            }
            Symbol::NonTerminal(nonterminal) => match parser.table.entry(&nonterminal, look) {
                Some(production) => {
                    self.stack.pop();
                    self.stack.extend(production.elements.iter().rev().cloned());
                    self.record(Action::Apply {
                        production: production.clone(),
                    });
                }
                None => {
                    self.record(Action::NoEntry {
                        nonterminal: nonterminal.clone(),
                        lookahead: look,
                    });
                    self.state = ParseState::RejectedNoEntry {
                        nonterminal,
                        lookahead: look,
                    };
                    return &self.state;
                }
            },
        }

        if self.stack == [Symbol::Terminal(END_MARKER)] && self.input[self.pointer..] == [END_MARKER] {
            self.state = ParseState::Accepted { steps: self.steps };
            self.record(Action::Accept { steps: self.steps });
            info!("accepted in {} steps", self.steps);
        }

        &self.state
    }

    /// Step until the run is accepted or rejected
    pub fn run(&mut self) -> &ParseState {
        while !self.state.is_finished() {
            self.step();
        }
        &self.state
    }

    pub fn state(&self) -> &ParseState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.state.is_finished()
    }

    pub fn trace(&self) -> &[Step] {
        &self.trace
    }

    /// The live stack, bottom first
    pub fn stack(&self) -> &[Symbol] {
        &self.stack
    }

    /// Unconsumed input including the end-marker
    pub fn remaining(&self) -> String {
        self.input[self.pointer..].iter().collect()
    }

    pub fn lookahead(&self) -> char {
        self.input.get(self.pointer).copied().unwrap_or(END_MARKER)
    }

    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    /// Productions of the non-terminal on top of the stack, while running
    pub fn available_productions(&self) -> &'p [Production] {
        let parser: &'p PredictiveParser = self.parser;
        match self.stack.last() {
            Some(Symbol::NonTerminal(nt)) if !self.state.is_finished() => {
                parser.grammar.productions_of(nt).unwrap_or(&[])
            }
            _ => &[],
        }
    }

    /// The production the table selects for the next step, if any
    pub fn predicted(&self) -> Option<&'p Production> {
        let parser: &'p PredictiveParser = self.parser;
        match self.stack.last() {
            Some(Symbol::NonTerminal(nt)) if !self.state.is_finished() => {
                parser.table.entry(nt, self.lookahead())
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> PredictiveParser {
        PredictiveParser::standard().unwrap()
    }

    #[test]
    fn test_accept_ab() {
        let parser = parser();
        let mut analysis = parser.start("ab").unwrap();

        assert_eq!(analysis.trace().len(), 1);
        assert_eq!(analysis.trace()[0].action, Action::Initial);
        assert_eq!(analysis.trace()[0].stack_string(), "$ S");
        assert_eq!(analysis.trace()[0].remaining, "ab$");

        assert_eq!(analysis.run(), &ParseState::Accepted { steps: 4 });

        let rows: Vec<(usize, String, String, String)> = analysis
            .trace()
            .iter()
            .map(|s| (s.number, s.stack_string(), s.remaining.clone(), s.action.to_string()))
            .collect();
        let expected = vec![
            (0, "$ S", "ab$", "initial configuration"),
            (1, "$ b C a", "ab$", "applied S → aCb"),
            (2, "$ b C", "b$", "matched terminal 'a'"),
            (3, "$ b", "b$", "applied C → ε"),
            (4, "$", "$", "matched terminal 'b'"),
            (4, "$", "$", "accepted in 4 steps"),
        ];
        let expected: Vec<(usize, String, String, String)> = expected
            .into_iter()
            .map(|(n, st, rem, act)| (n, st.to_string(), rem.to_string(), act.to_string()))
            .collect();
        assert_eq!(rows, expected);
    }

    #[test]
    fn test_mismatch_aab() {
        let parser = parser();
        let analysis = parser.parse("aab").unwrap();

        assert_eq!(
            analysis.state(),
            &ParseState::RejectedMismatch {
                expected: 'b',
                found: '$'
            }
        );
        let last = analysis.trace().last().unwrap();
        assert_eq!(last.stack_string(), "$ b");
        assert_eq!(last.remaining, "$");
        assert!(matches!(
            analysis.state().rejection(),
            Some(TutorError::ParseMismatch { expected: 'b', found: '$' })
        ));
    }

    #[test]
    fn test_no_entry() {
        let parser = parser();
        // S has no entry for d
        let analysis = parser.parse("d").unwrap();
        assert_eq!(
            analysis.state(),
            &ParseState::RejectedNoEntry {
                nonterminal: "S".to_string(),
                lookahead: 'd'
            }
        );
        assert_eq!(analysis.steps_taken(), 1);
        assert_eq!(analysis.stack(), [Symbol::Terminal('$'), Symbol::nonterminal("S")]);
    }

    #[test]
    fn test_stack_emptied_early() {
        let parser = parser();
        // "b" alone is a sentence, the trailing c's are left over
        let analysis = parser.parse("bcc").unwrap();
        assert!(!analysis.state().is_accepted());
        assert!(parser.accepts("b"));
    }

    #[test]
    fn test_invalid_input() {
        let parser = parser();
        assert!(matches!(
            parser.start("x"),
            Err(TutorError::InvalidInputSymbol { symbol: 'x', position: 0 })
        ));
        assert!(matches!(
            parser.start("ab$"),
            Err(TutorError::InvalidInputSymbol { symbol: '$', position: 2 })
        ));
        assert!(matches!(parser.start("   "), Err(TutorError::EmptyInput)));
        assert!(parser.start("  ab ").is_ok());
    }

    #[test]
    fn test_step_after_finish_is_noop() {
        let parser = parser();
        for input in ["ab", "aab", "d"] {
            let mut analysis = parser.parse(input).unwrap();
            let state = analysis.state().clone();
            let trace = analysis.trace().to_vec();
            let stack = analysis.stack().to_vec();

            analysis.step();
            analysis.step();

            assert_eq!(analysis.state(), &state);
            assert_eq!(analysis.trace(), trace.as_slice());
            assert_eq!(analysis.stack(), stack.as_slice());
        }
    }

    #[test]
    fn test_restart_resets_run() {
        let parser = parser();
        let mut analysis = parser.parse("aab").unwrap();
        analysis.restart("ab").unwrap();

        assert_eq!(analysis.state(), &ParseState::Running);
        assert_eq!(analysis.trace().len(), 1);
        assert_eq!(analysis.steps_taken(), 0);
        assert_eq!(analysis.remaining(), "ab$");

        assert!(analysis.restart("q").is_err());
        assert_eq!(analysis.remaining(), "ab$");
    }

    #[test]
    fn test_available_productions() {
        let parser = parser();
        let mut analysis = parser.start("ab").unwrap();

        let names: Vec<String> = analysis
            .available_productions()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(names, vec!["S → aCb", "S → bA", "S → cBc"]);
        assert_eq!(analysis.predicted().unwrap().to_string(), "S → aCb");

        analysis.step();
        // terminal on top
        assert!(analysis.available_productions().is_empty());
        assert!(analysis.predicted().is_none());
    }

    #[test]
    fn test_longer_sentences() {
        let parser = parser();
        for sentence in ["cacc", "cbbc", "aadb", "baac", "acbb", "cbcbbc"] {
            assert!(parser.accepts(sentence), "{} should be accepted", sentence);
        }
        for sentence in ["c", "bb", "ca", "ad"] {
            assert!(!parser.accepts(sentence), "{} should be rejected", sentence);
        }
    }
}
