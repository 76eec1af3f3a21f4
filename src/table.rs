//! Hand-authored LL(1) parsing table.

use std::collections::BTreeMap;
use std::fmt;

use crate::grammar::{END_MARKER, Grammar, Production};
use crate::utils::{OptionExt, Result, TutorError};

/// Predictive parsing table mapping (non-terminal, lookahead) to a single
/// production. A cell may hold at most one production.
#[derive(Debug, Clone)]
pub struct ParsingTable {
    entries: BTreeMap<(usize, char), Production>,
    /// Non-terminal names, indexed by declaration order in the grammar
    nonterminals: Vec<String>,
}

impl ParsingTable {
    /// Build a table from `(non-terminal, lookahead, right-hand side)` triples,
    /// with the right-hand side written the way productions display
    /// (`"aCb"`, `"ε"`).
    pub fn from_entries(grammar: &Grammar, cells: &[(&str, char, &str)]) -> Result<Self> {
        let terminals = grammar.terminals();
        let mut table = ParsingTable {
            entries: BTreeMap::new(),
            nonterminals: grammar.nonterminals().to_vec(),
        };

        for &(nonterminal, lookahead, rhs) in cells {
            if lookahead != END_MARKER && !terminals.contains(&lookahead) {
                return Err(TutorError::InvalidGrammar(format!(
                    "lookahead '{}' for {} is not a terminal of the grammar",
                    lookahead, nonterminal
                )));
            }

            let production = grammar
                .productions_of(nonterminal)?
                .iter()
                .find(|p| p.rhs_string() == rhs)
                .ok_or_else(|| TutorError::TableMismatch {
                    nonterminal: nonterminal.to_string(),
                    production: rhs.to_string(),
                })?;

            table.insert(lookahead, production.clone())?;
        }

        Ok(table)
    }

    /// The table for `Grammar::standard`
    pub fn standard(grammar: &Grammar) -> Result<Self> {
        Self::from_entries(
            grammar,
            &[
                ("S", 'a', "aCb"),
                ("S", 'b', "bA"),
                ("S", 'c', "cBc"),
                ("A", 'a', "aB"),
                ("A", 'b', "ε"),
                ("A", 'c', "ε"),
                ("A", '$', "ε"),
                ("B", 'a', "aAc"),
                ("B", 'b', "bCb"),
                ("C", 'a', "aD"),
                ("C", 'b', "ε"),
                ("C", 'c', "cAb"),
                ("D", 'a', "aB"),
                ("D", 'b', "bA"),
                ("D", 'd', "dA"),
            ],
        )
    }

    fn insert(&mut self, lookahead: char, production: Production) -> Result<()> {
        let row = self
            .row_of(&production.lhs)
            .ok_or_grammar_err(|| format!("{} is not declared", production.lhs))?;

        if self.entries.contains_key(&(row, lookahead)) {
            return Err(TutorError::ConflictingEntry {
                nonterminal: production.lhs,
                lookahead,
            });
        }
        self.entries.insert((row, lookahead), production);
        Ok(())
    }

    fn row_of(&self, nonterminal: &str) -> Option<usize> {
        self.nonterminals.iter().position(|nt| nt == nonterminal)
    }

    /// The production to apply for `nonterminal` when `lookahead` is next
    pub fn entry(&self, nonterminal: &str, lookahead: char) -> Option<&Production> {
        let row = self.row_of(nonterminal)?;
        self.entries.get(&(row, lookahead))
    }

    /// All cells, row by row in declaration order
    pub fn entries(&self) -> impl Iterator<Item = (char, &Production)> {
        self.entries.iter().map(|(&(_, lookahead), p)| (lookahead, p))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Display for ParsingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (row, nt) in self.nonterminals.iter().enumerate() {
            let cells: Vec<String> = self
                .entries
                .range((row, char::MIN)..=(row, char::MAX))
                .map(|(&(_, lookahead), p)| format!("{}: {}", lookahead, p.rhs_string()))
                .collect();
            writeln!(f, "{:<3}{}", nt, cells.join("  "))?;
        }
        Ok(())
    }
}
