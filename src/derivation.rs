//! Leftmost derivations, and a session for building one rule by rule.

use std::fmt;

use log::debug;
use serde::Serialize;

use crate::grammar::{Grammar, Production, Symbol};
use crate::utils::{OptionExt, Result, TutorError};

/// One expansion: which production of which non-terminal was picked
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub nonterminal: String,
    pub production: usize,
}

impl Choice {
    pub fn new(nonterminal: &str, production: usize) -> Self {
        Choice {
            nonterminal: nonterminal.to_string(),
            production,
        }
    }
}

/// The sequence of choices made so far, applied to the leftmost
/// non-terminal one after another
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Derivation {
    choices: Vec<Choice>,
}

impl Derivation {
    pub fn new() -> Self {
        Derivation::default()
    }

    pub fn push(&mut self, choice: Choice) {
        self.choices.push(choice);
    }

    pub fn pop(&mut self) -> Option<Choice> {
        self.choices.pop()
    }

    pub fn clear(&mut self) {
        self.choices.clear();
    }

    pub fn choices(&self) -> &[Choice] {
        &self.choices
    }

    pub fn len(&self) -> usize {
        self.choices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.choices.is_empty()
    }

    /// Rebuild the sentential form from the start symbol by leftmost
    /// substitution of every recorded choice
    pub fn sentential_form(&self, grammar: &Grammar) -> Result<Vec<Symbol>> {
        let mut form = vec![Symbol::nonterminal(grammar.start_symbol())];
        for choice in &self.choices {
            expand_leftmost(grammar, &mut form, choice)?;
        }
        Ok(form)
    }

    /// The terminals derived so far; unexpanded non-terminals are skipped
    pub fn sentence(&self, grammar: &Grammar) -> Result<String> {
        Ok(terminal_projection(&self.sentential_form(grammar)?))
    }
}

/// Replace the leftmost non-terminal of `form` with the chosen right-hand side
fn expand_leftmost<'g>(
    grammar: &'g Grammar,
    form: &mut Vec<Symbol>,
    choice: &Choice,
) -> Result<&'g Production> {
    let position = leftmost_nonterminal(form)
        .filter(|&i| form[i].as_nonterminal() == Some(choice.nonterminal.as_str()))
        .ok_or_grammar_err(|| format!("{} is not the leftmost non-terminal", choice.nonterminal))?;

    let production = grammar
        .productions_of(&choice.nonterminal)?
        .get(choice.production)
        .ok_or_else(|| TutorError::InvalidChoice {
            nonterminal: choice.nonterminal.clone(),
            index: choice.production,
        })?;

    form.splice(position..=position, production.elements.iter().cloned());
    Ok(production)
}

/// Index of the leftmost non-terminal in a sentential form
pub fn leftmost_nonterminal(form: &[Symbol]) -> Option<usize> {
    form.iter().position(|s| matches!(s, Symbol::NonTerminal(_)))
}

/// Concatenate the terminals of a sentential form
pub fn terminal_projection(form: &[Symbol]) -> String {
    form.iter().filter_map(Symbol::as_terminal).collect()
}

pub fn terminal_length(form: &[Symbol]) -> usize {
    form.iter().filter(|s| matches!(s, Symbol::Terminal(_))).count()
}

/// Interactive derivation: the user picks one production at a time for
/// the current (leftmost) non-terminal until only terminals remain.
#[derive(Debug, Clone)]
pub struct DerivationSession<'g> {
    grammar: &'g Grammar,
    derivation: Derivation,
    form: Vec<Symbol>,
    /// Non-terminals that have been current, in first-visit order
    visited: Vec<String>,
}

impl<'g> DerivationSession<'g> {
    pub fn new(grammar: &'g Grammar) -> Self {
        DerivationSession {
            grammar,
            derivation: Derivation::new(),
            form: vec![Symbol::nonterminal(grammar.start_symbol())],
            visited: vec![grammar.start_symbol().to_string()],
        }
    }

    /// The non-terminal the next choice applies to
    pub fn current_nonterminal(&self) -> Option<&str> {
        leftmost_nonterminal(&self.form).and_then(|i| self.form[i].as_nonterminal())
    }

    /// Productions selectable right now; empty once the derivation is complete
    pub fn available_productions(&self) -> &'g [Production] {
        let grammar = self.grammar;
        match self.current_nonterminal() {
            Some(nt) => grammar.productions_of(nt).unwrap_or(&[]),
            None => &[],
        }
    }

    /// Apply production `index` of the current non-terminal
    pub fn apply(&mut self, index: usize) -> Result<&'g Production> {
        let nonterminal = self
            .current_nonterminal()
            .ok_or(TutorError::DerivationComplete)?
            .to_string();
        let choice = Choice::new(&nonterminal, index);

        let production = expand_leftmost(self.grammar, &mut self.form, &choice)?;
        self.derivation.push(choice);
        debug!("session applied {}", production);

        if let Some(next) = self.current_nonterminal() {
            if !self.visited.iter().any(|v| v == next) {
                let next = next.to_string();
                self.visited.push(next);
            }
        }

        Ok(production)
    }

    /// Take back the most recent choice
    pub fn undo(&mut self) -> Result<Option<Choice>> {
        let mut choices = self.derivation.clone();
        let undone = choices.pop();
        self.reset();
        for choice in choices.choices() {
            self.apply(choice.production)?;
        }
        Ok(undone)
    }

    /// Go back to the bare start symbol
    pub fn reset(&mut self) {
        *self = DerivationSession::new(self.grammar);
    }

    pub fn sentential_form(&self) -> &[Symbol] {
        &self.form
    }

    pub fn is_complete(&self) -> bool {
        self.current_nonterminal().is_none()
    }

    /// The derived sentence, once every non-terminal has been expanded
    pub fn sentence(&self) -> Option<String> {
        if self.is_complete() {
            Some(terminal_projection(&self.form))
        } else {
            None
        }
    }

    pub fn visited(&self) -> &[String] {
        &self.visited
    }

    pub fn derivation(&self) -> &Derivation {
        &self.derivation
    }

    pub fn steps(&self) -> usize {
        self.derivation.len()
    }
}

impl fmt::Display for DerivationSession<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.form.is_empty() {
            return write!(f, "ε");
        }
        for symbol in &self.form {
            write!(f, "{}", symbol)?;
        }
        Ok(())
    }
}
