//! Bounded random sentence generation by backtracking over production choices.

use std::fs;
use std::path::Path;

use log::{debug, info, trace, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::derivation::{Choice, Derivation, leftmost_nonterminal, terminal_length};
use crate::grammar::{Grammar, Symbol};
use crate::utils::{Result, TutorError};

fn default_max_length() -> usize {
    15
}

fn default_max_depth() -> usize {
    64
}

/// Configuration options for sentence generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Longest sentence the search will accept
    #[serde(default = "default_max_length")]
    pub max_length: usize,
    /// Maximum number of nested expansions before a branch is abandoned
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Fixed seed for reproducible output
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            max_length: default_max_length(),
            max_depth: default_max_depth(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: GeneratorConfig = serde_json::from_str(json)?;
        Ok(config)
    }
}

/// A generated sentence with the derivation that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generated {
    pub sentence: String,
    pub derivation: Derivation,
    /// True when the search was exhausted and the fixed fallback was used
    pub fallback: bool,
}

pub struct Generator<'g> {
    grammar: &'g Grammar,
    config: GeneratorConfig,
    rng: StdRng,
    fallbacks: usize,
}

impl<'g> Generator<'g> {
    pub fn new(grammar: &'g Grammar, config: GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Generator {
            grammar,
            config,
            rng,
            fallbacks: 0,
        }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// How many `generate` calls fell back to the first start production
    pub fn fallbacks(&self) -> usize {
        self.fallbacks
    }

    /// Generate one sentence of at most `max_length` terminals.
    ///
    /// If no complete derivation fits, the first production of the start
    /// symbol is used instead and `fallback` is set on the result.
    pub fn generate(&mut self) -> Result<Generated> {
        let grammar = self.grammar;
        let mut derivation = Derivation::new();
        let form = derivation.sentential_form(grammar)?;

        let found = self.search(&mut derivation, &form, 0)?;
        if !found {
            warn!(
                "{}; using the first production of {}",
                TutorError::GeneratorExhausted {
                    max_length: self.config.max_length
                },
                grammar.start_symbol()
            );
            self.fallbacks += 1;
            derivation.clear();
            derivation.push(Choice::new(grammar.start_symbol(), 0));
        }

        let sentence = derivation.sentence(grammar)?;
        info!("generated {:?} in {} expansions", sentence, derivation.len());

        Ok(Generated {
            sentence,
            derivation,
            fallback: !found,
        })
    }

    /// Depth-first search from `form`. On success the derivation holds a
    /// complete derivation; on failure it is left as it was on entry.
    fn search(&mut self, derivation: &mut Derivation, form: &[Symbol], depth: usize) -> Result<bool> {
        let grammar = self.grammar;
        let Some(position) = leftmost_nonterminal(form) else {
            return Ok(terminal_length(form) <= self.config.max_length);
        };
        if depth >= self.config.max_depth {
            trace!("depth limit reached");
            return Ok(false);
        }

        let nonterminal = match &form[position] {
            Symbol::NonTerminal(name) => name.as_str(),
            Symbol::Terminal(_) => return Ok(false),
        };
        let productions = grammar.productions_of(nonterminal)?;

        let mut order: Vec<usize> = (0..productions.len()).collect();
        order.shuffle(&mut self.rng);

        for index in order {
            derivation.push(Choice::new(nonterminal, index));
            let next = derivation.sentential_form(grammar)?;

            if terminal_length(&next) > self.config.max_length {
                trace!("{} exceeds the length bound", productions[index]);
                derivation.pop();
                continue;
            }

            debug!("depth {}: trying {}", depth, productions[index]);
            if self.search(derivation, &next, depth + 1)? {
                return Ok(true);
            }
            derivation.pop();
        }

        Ok(false)
    }
}
