use std::collections::{BTreeSet, HashMap};
use std::fmt;

use log::debug;
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::utils::{Result, TutorError};

/// Marker used to write the empty production
pub const EPSILON: &str = "ε";

/// Bottom-of-stack and end-of-input marker
pub const END_MARKER: char = '$';

/// A grammar symbol, either a terminal character or a named non-terminal
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// A terminal symbol (a single input character, or the end-marker)
    Terminal(char),
    /// A non-terminal symbol (reference to another rule)
    NonTerminal(String),
}

impl Symbol {
    pub fn nonterminal(name: &str) -> Self {
        Symbol::NonTerminal(name.to_string())
    }

    pub fn as_nonterminal(&self) -> Option<&str> {
        match self {
            Symbol::NonTerminal(name) => Some(name),
            Symbol::Terminal(_) => None,
        }
    }

    pub fn as_terminal(&self) -> Option<char> {
        match self {
            Symbol::Terminal(c) => Some(*c),
            Symbol::NonTerminal(_) => None,
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Terminal(c) => write!(f, "{}", c),
            Symbol::NonTerminal(name) => write!(f, "{}", name),
        }
    }
}

impl Serialize for Symbol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single rewrite rule owned by one non-terminal
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Production {
    /// The non-terminal this production rewrites
    pub lhs: String,
    /// The right-hand side; empty for the ε production
    pub elements: Vec<Symbol>,
}

impl Production {
    pub fn is_epsilon(&self) -> bool {
        self.elements.is_empty()
    }

    /// Non-terminals on the right-hand side, left to right
    pub fn next_states(&self) -> impl Iterator<Item = &str> {
        self.elements.iter().filter_map(Symbol::as_nonterminal)
    }

    /// The right-hand side as written in the table, e.g. `aCb` or `ε`
    pub fn rhs_string(&self) -> String {
        if self.is_epsilon() {
            return EPSILON.to_string();
        }
        self.elements.iter().map(Symbol::to_string).collect()
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} → {}", self.lhs, self.rhs_string())
    }
}

/// An immutable context-free grammar over single-character terminals
#[derive(Debug, Clone)]
pub struct Grammar {
    /// The rules mapping non-terminals to their ordered productions
    rules: HashMap<String, Vec<Production>>,
    /// Non-terminals in declaration order
    order: Vec<String>,
    /// The starting symbol for derivations
    start_symbol: String,
}

impl Grammar {
    /// Create a new empty grammar with a specified start symbol
    pub fn new(start_symbol: &str) -> Self {
        Grammar {
            rules: HashMap::new(),
            order: Vec::new(),
            start_symbol: start_symbol.to_string(),
        }
    }

    /// The grammar used throughout the tutor:
    ///
    /// ```text
    /// S → aCb | bA | cBc
    /// A → aB  | ε
    /// B → aAc | bCb
    /// C → aD  | cAb | ε
    /// D → aB  | bA  | dA
    /// ```
    pub fn standard() -> Self {
        let built = GrammarBuilder::new("S")
            .add_rule("S", &["a", "<C>", "b"])
            .add_rule("S", &["b", "<A>"])
            .add_rule("S", &["c", "<B>", "c"])
            .add_rule("A", &["a", "<B>"])
            .add_rule("A", &[EPSILON])
            .add_rule("B", &["a", "<A>", "c"])
            .add_rule("B", &["b", "<C>", "b"])
            .add_rule("C", &["a", "<D>"])
            .add_rule("C", &["c", "<A>", "b"])
            .add_rule("C", &[EPSILON])
            .add_rule("D", &["a", "<B>"])
            .add_rule("D", &["b", "<A>"])
            .add_rule("D", &["d", "<A>"])
            .build();

        match built {
            Ok(grammar) => grammar,
            Err(e) => unreachable!("standard grammar is well formed: {}", e),
        }
    }

    /// Add a rule to the grammar.
    ///
    /// Elements written as `<Name>` are non-terminals, `ε` is the empty
    /// string and anything else contributes one terminal per character.
    pub fn add_rule(&mut self, non_terminal: &str, elements: Vec<&str>) -> Result<&mut Self> {
        let production = Self::parse_elements(non_terminal, elements)?;
        debug!("adding production {}", production);

        match self.rules.get_mut(non_terminal) {
            Some(productions) => productions.push(production),
            None => {
                self.order.push(non_terminal.to_string());
                self.rules.insert(non_terminal.to_string(), vec![production]);
            }
        }

        Ok(self)
    }

    /// Parse a vector of strings into a Production
    fn parse_elements(non_terminal: &str, elements: Vec<&str>) -> Result<Production> {
        if elements.is_empty() {
            return Err(TutorError::EmptyProduction(non_terminal.to_string()));
        }

        let non_terminal_regex = Regex::new(r"^<([^>]+)>$")
            .map_err(|e| TutorError::InvalidGrammar(e.to_string()))?;

        let mut parsed_elements = Vec::new();
        for element in elements {
            if element == EPSILON {
                continue;
            }

            if let Some(captures) = non_terminal_regex.captures(element) {
                parsed_elements.push(Symbol::nonterminal(&captures[1]));
                continue;
            }

            for c in element.chars().filter(|c| !c.is_whitespace()) {
                if c == END_MARKER {
                    return Err(TutorError::InvalidGrammar(format!(
                        "the end-marker '{}' cannot appear in a production of {}",
                        END_MARKER, non_terminal
                    )));
                }
                parsed_elements.push(Symbol::Terminal(c));
            }
        }

        Ok(Production {
            lhs: non_terminal.to_string(),
            elements: parsed_elements,
        })
    }

    /// Check that the start symbol is defined and that every right-hand
    /// side only references declared non-terminals
    pub fn validate(&self) -> Result<()> {
        if !self.has_nonterminal(&self.start_symbol) {
            return Err(TutorError::UnknownSymbol(self.start_symbol.clone()));
        }

        for production in self.rules.values().flatten() {
            if let Some(missing) = production.next_states().find(|nt| !self.has_nonterminal(nt)) {
                return Err(TutorError::InvalidGrammar(format!(
                    "{} references undefined non-terminal {}",
                    production, missing
                )));
            }
        }

        Ok(())
    }

    /// Ordered productions of a non-terminal
    pub fn productions_of(&self, non_terminal: &str) -> Result<&[Production]> {
        self.rules
            .get(non_terminal)
            .map(Vec::as_slice)
            .ok_or_else(|| TutorError::UnknownSymbol(non_terminal.to_string()))
    }

    /// True iff the symbol is not a declared non-terminal
    pub fn is_terminal(&self, symbol: &Symbol) -> bool {
        match symbol {
            Symbol::Terminal(_) => true,
            Symbol::NonTerminal(name) => !self.has_nonterminal(name),
        }
    }

    /// Check if the grammar contains a specific non-terminal
    pub fn has_nonterminal(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    /// The terminal alphabet, derived from the right-hand sides
    pub fn terminals(&self) -> BTreeSet<char> {
        self.rules
            .values()
            .flatten()
            .flat_map(|p| p.elements.iter().filter_map(Symbol::as_terminal))
            .collect()
    }

    /// All ε productions, in declaration order
    pub fn epsilon_productions(&self) -> Vec<&Production> {
        self.productions()
            .filter(|p| p.is_epsilon())
            .collect()
    }

    /// Every production, grouped by non-terminal in declaration order
    pub fn productions(&self) -> impl Iterator<Item = &Production> {
        self.order
            .iter()
            .filter_map(|nt| self.rules.get(nt))
            .flatten()
    }

    /// Non-terminals in declaration order
    pub fn nonterminals(&self) -> &[String] {
        &self.order
    }

    /// Get the start symbol
    pub fn start_symbol(&self) -> &str {
        &self.start_symbol
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for nt in &self.order {
            let alternatives: Vec<String> = self.rules[nt].iter().map(Production::rhs_string).collect();
            writeln!(f, "{} → {}", nt, alternatives.join(" | "))?;
        }
        Ok(())
    }
}

/// Builder for constructing Grammar instances
pub struct GrammarBuilder {
    grammar: Grammar,
    error: Option<TutorError>,
}

impl GrammarBuilder {
    pub fn new(start_symbol: &str) -> Self {
        GrammarBuilder {
            grammar: Grammar::new(start_symbol),
            error: None,
        }
    }

    /// Add a rule to the grammar; the first failure is reported by `build`
    pub fn add_rule(mut self, non_terminal: &str, elements: &[&str]) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.grammar.add_rule(non_terminal, elements.to_vec()) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Build and validate the grammar
    pub fn build(self) -> Result<Grammar> {
        if let Some(e) = self.error {
            return Err(e);
        }
        self.grammar.validate()?;
        Ok(self.grammar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_elements() {
        let production = Grammar::parse_elements("S", vec!["a", "<C>", "b"]).unwrap();

        assert_eq!(production.lhs, "S");
        assert_eq!(
            production.elements,
            vec![
                Symbol::Terminal('a'),
                Symbol::nonterminal("C"),
                Symbol::Terminal('b'),
            ]
        );
        assert_eq!(production.to_string(), "S → aCb");
    }

    #[test]
    fn test_parse_multichar_terminal() {
        let production = Grammar::parse_elements("X", vec!["ab", "<Y>"]).unwrap();
        assert_eq!(production.elements.len(), 3);
        assert_eq!(production.rhs_string(), "abY");
    }

    #[test]
    fn test_epsilon_production() {
        let production = Grammar::parse_elements("A", vec![EPSILON]).unwrap();
        assert!(production.is_epsilon());
        assert_eq!(production.to_string(), "A → ε");

        let err = Grammar::parse_elements("A", vec![]).unwrap_err();
        assert!(matches!(err, TutorError::EmptyProduction(nt) if nt == "A"));
    }

    #[test]
    fn test_end_marker_rejected() {
        let err = Grammar::parse_elements("A", vec!["a$"]).unwrap_err();
        assert!(matches!(err, TutorError::InvalidGrammar(_)));
    }

    #[test]
    fn test_standard_grammar() {
        let grammar = Grammar::standard();

        assert_eq!(grammar.start_symbol(), "S");
        assert_eq!(grammar.nonterminals(), ["S", "A", "B", "C", "D"]);
        assert_eq!(grammar.terminals().into_iter().collect::<String>(), "abcd");
        assert_eq!(grammar.productions().count(), 13);

        let epsilons: Vec<String> = grammar
            .epsilon_productions()
            .iter()
            .map(|p| p.to_string())
            .collect();
        assert_eq!(epsilons, vec!["A → ε", "C → ε"]);

        let s: Vec<String> = grammar
            .productions_of("S")
            .unwrap()
            .iter()
            .map(Production::rhs_string)
            .collect();
        assert_eq!(s, vec!["aCb", "bA", "cBc"]);
    }

    #[test]
    fn test_unknown_symbol() {
        let grammar = Grammar::standard();
        let err = grammar.productions_of("Z").unwrap_err();
        assert!(matches!(err, TutorError::UnknownSymbol(nt) if nt == "Z"));
    }

    #[test]
    fn test_is_terminal() {
        let grammar = Grammar::standard();
        assert!(grammar.is_terminal(&Symbol::Terminal('a')));
        assert!(grammar.is_terminal(&Symbol::Terminal(END_MARKER)));
        assert!(!grammar.is_terminal(&Symbol::nonterminal("S")));
        assert!(grammar.is_terminal(&Symbol::nonterminal("Z")));
    }

    #[test]
    fn test_dangling_reference() {
        let result = GrammarBuilder::new("S")
            .add_rule("S", &["a", "<Missing>"])
            .build();
        assert!(matches!(result, Err(TutorError::InvalidGrammar(_))));

        let result = GrammarBuilder::new("Start").add_rule("S", &["a"]).build();
        assert!(matches!(result, Err(TutorError::UnknownSymbol(nt)) if nt == "Start"));
    }

    #[test]
    fn test_grammar_display() {
        let text = Grammar::standard().to_string();
        assert!(text.starts_with("S → aCb | bA | cBc\n"));
        assert!(text.contains("C → aD | cAb | ε\n"));
    }
}
