//! Propositional beliefs: literals, conditions and the belief base.
//!
//! Literal names are interned into a [`Vocabulary`] so that a [`BeliefBase`]
//! is a flat truth-value vector and cloning it for a simulation is cheap.

use std::{collections::HashMap, fmt};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Interned propositional literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Literal(u32);

impl Literal {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Bidirectional mapping between literal names and [`Literal`] handles.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    names: Vec<String>,
    index: HashMap<String, Literal>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle for `name`, registering it on first use.
    pub fn intern(&mut self, name: &str) -> Literal {
        if let Some(&literal) = self.index.get(name) {
            return literal;
        }
        let literal = Literal(self.names.len() as u32);
        self.names.push(name.to_string());
        self.index.insert(name.to_string(), literal);
        literal
    }

    pub fn lookup(&self, name: &str) -> Option<Literal> {
        self.index.get(name).copied()
    }

    pub fn name(&self, literal: Literal) -> &str {
        self.names
            .get(literal.index())
            .map(String::as_str)
            .unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn literals(&self) -> impl Iterator<Item = Literal> + '_ {
        (0..self.names.len()).map(|i| Literal(i as u32))
    }

    /// Parse a condition such as `A`, `!A` or `~A`, interning its literal.
    pub fn parse_condition(&mut self, text: &str) -> Result<Condition> {
        let trimmed = text.trim();
        let (positive, name) = match trimmed.strip_prefix(['!', '~']) {
            Some(rest) => (false, rest.trim()),
            None => (true, trimmed),
        };
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(Error::InvalidCondition {
                input: text.to_string(),
            });
        }
        Ok(Condition::new(self.intern(name), positive))
    }
}

/// A literal with a polarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Condition {
    literal: Literal,
    positive: bool,
}

impl Condition {
    pub fn new(literal: Literal, positive: bool) -> Self {
        Self { literal, positive }
    }

    pub fn positive(literal: Literal) -> Self {
        Self::new(literal, true)
    }

    pub fn negative(literal: Literal) -> Self {
        Self::new(literal, false)
    }

    pub fn literal(&self) -> Literal {
        self.literal
    }

    pub fn is_positive(&self) -> bool {
        self.positive
    }

    /// The same literal with flipped polarity.
    pub fn negated(&self) -> Self {
        Self::new(self.literal, !self.positive)
    }

    /// Same literal, opposite polarity.
    pub fn is_opposite(&self, other: &Condition) -> bool {
        self.literal == other.literal && self.positive != other.positive
    }

    /// Same literal, same polarity.
    pub fn is_same(&self, other: &Condition) -> bool {
        self == other
    }

    /// Render with literal names resolved through `vocabulary`.
    pub fn display<'a>(&self, vocabulary: &'a Vocabulary) -> ConditionDisplay<'a> {
        ConditionDisplay {
            condition: *self,
            vocabulary,
        }
    }
}

pub struct ConditionDisplay<'a> {
    condition: Condition,
    vocabulary: &'a Vocabulary,
}

impl fmt::Display for ConditionDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.condition.positive {
            f.write_str("!")?;
        }
        f.write_str(self.vocabulary.name(self.condition.literal))
    }
}

/// Closed-world truth assignment over a vocabulary.
///
/// Literals that were never assigned read as false.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BeliefBase {
    values: Vec<bool>,
}

impl BeliefBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// All literals of a vocabulary of size `len`, initially false.
    pub fn with_len(len: usize) -> Self {
        Self {
            values: vec![false; len],
        }
    }

    pub fn value(&self, literal: Literal) -> bool {
        self.values.get(literal.index()).copied().unwrap_or(false)
    }

    pub fn set(&mut self, literal: Literal, value: bool) {
        let index = literal.index();
        if index >= self.values.len() {
            self.values.resize(index + 1, false);
        }
        self.values[index] = value;
    }

    pub fn holds(&self, condition: &Condition) -> bool {
        self.value(condition.literal) == condition.positive
    }

    /// True when every condition holds. An empty conjunction holds.
    pub fn evaluate(&self, conditions: &[Condition]) -> bool {
        conditions.iter().all(|condition| self.holds(condition))
    }

    /// Make every condition true.
    pub fn apply(&mut self, conditions: &[Condition]) {
        for condition in conditions {
            self.set(condition.literal, condition.positive);
        }
    }

    /// Literals currently assigned true.
    pub fn true_literals(&self) -> impl Iterator<Item = Literal> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, value)| **value)
            .map(|(i, _)| Literal(i as u32))
    }

    /// One `name=value` entry per vocabulary literal, for debug output.
    pub fn describe(&self, vocabulary: &Vocabulary) -> String {
        vocabulary
            .literals()
            .map(|literal| format!("{}={}", vocabulary.name(literal), self.value(literal)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_condition_handles_both_negation_prefixes() {
        let mut vocabulary = Vocabulary::new();
        let a = vocabulary.parse_condition("A").unwrap();
        let not_a = vocabulary.parse_condition("!A").unwrap();
        let tilde_a = vocabulary.parse_condition(" ~A ").unwrap();

        assert!(a.is_positive());
        assert!(a.is_opposite(&not_a));
        assert!(not_a.is_same(&tilde_a));
        assert_eq!(vocabulary.len(), 1);
        assert_eq!(not_a.display(&vocabulary).to_string(), "!A");
    }

    #[test]
    fn parse_condition_rejects_empty_names() {
        let mut vocabulary = Vocabulary::new();
        assert!(vocabulary.parse_condition("!").is_err());
        assert!(vocabulary.parse_condition("A B").is_err());
    }

    #[test]
    fn unassigned_literals_read_false() {
        let mut vocabulary = Vocabulary::new();
        let a = vocabulary.intern("A");
        let beliefs = BeliefBase::new();

        assert!(!beliefs.value(a));
        assert!(beliefs.evaluate(&[Condition::negative(a)]));
        assert!(!beliefs.evaluate(&[Condition::positive(a)]));
        assert!(beliefs.evaluate(&[]));
    }

    #[test]
    fn apply_is_destructive_and_clone_is_independent() {
        let mut vocabulary = Vocabulary::new();
        let a = vocabulary.intern("A");
        let b = vocabulary.intern("B");
        let mut beliefs = BeliefBase::with_len(vocabulary.len());
        let snapshot = beliefs.clone();

        beliefs.apply(&[Condition::positive(a), Condition::negative(b)]);

        assert!(beliefs.value(a));
        assert!(!snapshot.value(a));
        assert_eq!(beliefs.true_literals().collect::<Vec<_>>(), vec![a]);
        assert_eq!(beliefs.describe(&vocabulary), "A=true, B=false");
    }
}
