//! Candidate name generators.
//!
//! A generator only guarantees that it never yields the same string twice
//! between resets. Whether a candidate is acceptable (reserved, already used,
//! equal to the original) is decided by the caller, which simply asks for the
//! next one.

use crate::config::{GeneratorConfig, NameGeneratorKind};
use std::collections::HashSet;

/// Stateful producer of unique candidate names.
pub trait NameGenerator {
    /// Return the next candidate in this generator's order.
    fn next_name(&mut self) -> String;

    /// Restart the sequence from the beginning.
    fn reset(&mut self);
}

/// Build the generator selected by the configuration.
#[must_use]
pub fn build_generator(config: &GeneratorConfig) -> Box<dyn NameGenerator> {
    match config.kind {
        NameGeneratorKind::Ordered => Box::new(OrderedNameGenerator::new(config.uppercase)),
        NameGeneratorKind::Hex => Box::new(HexNameGenerator::new(&config.prefix, config.hex_width)),
        NameGeneratorKind::Dictionary => Box::new(DictionaryNameGenerator::new(&config.dictionary)),
    }
}

// =============================================================================
// Ordered
// =============================================================================

const LOWER: &[u8] = b"abcdefghijklmnopqrstuvwxyz";
const LOWER_UPPER: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates `a, b, ..., z, a1, b1, ..., z1, a2, ...`.
#[derive(Debug, Clone)]
pub struct OrderedNameGenerator {
    alphabet: &'static [u8],
    counter: usize,
}

impl Default for OrderedNameGenerator {
    fn default() -> Self {
        Self::new(false)
    }
}

impl OrderedNameGenerator {
    #[must_use]
    pub fn new(uppercase: bool) -> Self {
        let alphabet = if uppercase { LOWER_UPPER } else { LOWER };
        Self {
            alphabet,
            counter: 0,
        }
    }
}

impl NameGenerator for OrderedNameGenerator {
    fn next_name(&mut self) -> String {
        let letter = self.alphabet[self.counter % self.alphabet.len()] as char;
        let round = self.counter / self.alphabet.len();
        self.counter += 1;
        if round == 0 {
            letter.to_string()
        } else {
            format!("{letter}{round}")
        }
    }

    fn reset(&mut self) {
        self.counter = 0;
    }
}

// =============================================================================
// Hex
// =============================================================================

/// Generates `<prefix>0, <prefix>1, ..., <prefix>a, ...` in lowercase hex.
#[derive(Debug, Clone)]
pub struct HexNameGenerator {
    prefix: String,
    width: usize,
    counter: u64,
}

impl HexNameGenerator {
    #[must_use]
    pub fn new(prefix: &str, width: usize) -> Self {
        // A hex digit may not start an identifier.
        let prefix = if prefix.is_empty() { "_" } else { prefix };
        Self {
            prefix: prefix.to_string(),
            width,
            counter: 0,
        }
    }
}

impl NameGenerator for HexNameGenerator {
    fn next_name(&mut self) -> String {
        let name = format!("{}{:0width$x}", self.prefix, self.counter, width = self.width);
        self.counter += 1;
        name
    }

    fn reset(&mut self) {
        self.counter = 0;
    }
}

// =============================================================================
// Dictionary
// =============================================================================

/// Yields dictionary words in order, then `word1, word2, ...` rounds.
///
/// An empty dictionary falls back to the lowercase alphabet.
#[derive(Debug, Clone)]
pub struct DictionaryNameGenerator {
    words: Vec<String>,
    index: usize,
    round: usize,
    emitted: HashSet<String>,
}

impl DictionaryNameGenerator {
    #[must_use]
    pub fn new(words: &[String]) -> Self {
        let mut seen = HashSet::new();
        let mut unique: Vec<String> = words
            .iter()
            .filter(|w| !w.is_empty() && seen.insert(w.as_str()))
            .cloned()
            .collect();
        if unique.is_empty() {
            unique = LOWER.iter().map(|&c| (c as char).to_string()).collect();
        }
        Self {
            words: unique,
            index: 0,
            round: 0,
            emitted: HashSet::new(),
        }
    }

    fn advance(&mut self) -> String {
        let word = &self.words[self.index];
        let name = if self.round == 0 {
            word.clone()
        } else {
            format!("{word}{}", self.round)
        };
        self.index += 1;
        if self.index == self.words.len() {
            self.index = 0;
            self.round += 1;
        }
        name
    }
}

impl NameGenerator for DictionaryNameGenerator {
    fn next_name(&mut self) -> String {
        // A suffixed word can coincide with another dictionary entry
        // (`a` + `1` vs `a1`); skip such repeats.
        loop {
            let name = self.advance();
            if self.emitted.insert(name.clone()) {
                return name;
            }
        }
    }

    fn reset(&mut self) {
        self.index = 0;
        self.round = 0;
        self.emitted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn take(gen: &mut dyn NameGenerator, n: usize) -> Vec<String> {
        (0..n).map(|_| gen.next_name()).collect()
    }

    #[test]
    fn test_ordered_sequence() {
        let mut gen = OrderedNameGenerator::default();
        let names = take(&mut gen, 28);
        assert_eq!(names[0], "a");
        assert_eq!(names[1], "b");
        assert_eq!(names[25], "z");
        assert_eq!(names[26], "a1");
        assert_eq!(names[27], "b1");
    }

    #[test]
    fn test_ordered_uppercase() {
        let mut gen = OrderedNameGenerator::new(true);
        let names = take(&mut gen, 53);
        assert_eq!(names[26], "A");
        assert_eq!(names[51], "Z");
        assert_eq!(names[52], "a1");
    }

    #[test]
    fn test_ordered_reset() {
        let mut gen = OrderedNameGenerator::default();
        take(&mut gen, 30);
        gen.reset();
        assert_eq!(gen.next_name(), "a");
    }

    #[test]
    fn test_ordered_unique() {
        let mut gen = OrderedNameGenerator::default();
        let names = take(&mut gen, 2000);
        let set: HashSet<_> = names.iter().collect();
        assert_eq!(set.len(), names.len());
    }

    #[test]
    fn test_hex_sequence() {
        let mut gen = HexNameGenerator::new("_0x", 0);
        let names = take(&mut gen, 17);
        assert_eq!(names[0], "_0x0");
        assert_eq!(names[10], "_0xa");
        assert_eq!(names[16], "_0x10");
    }

    #[test]
    fn test_hex_width_and_empty_prefix() {
        let mut gen = HexNameGenerator::new("", 4);
        assert_eq!(gen.next_name(), "_0000");
        assert_eq!(gen.next_name(), "_0001");
    }

    #[test]
    fn test_dictionary_rounds() {
        let words = vec!["alpha".to_string(), "beta".to_string(), "alpha".to_string()];
        let mut gen = DictionaryNameGenerator::new(&words);
        assert_eq!(take(&mut gen, 4), vec!["alpha", "beta", "alpha1", "beta1"]);
        gen.reset();
        assert_eq!(gen.next_name(), "alpha");
    }

    #[test]
    fn test_dictionary_skips_colliding_suffixes() {
        let words = vec!["a".to_string(), "a1".to_string()];
        let mut gen = DictionaryNameGenerator::new(&words);
        let names = take(&mut gen, 6);
        let set: HashSet<_> = names.iter().collect();
        assert_eq!(set.len(), names.len());
        assert_eq!(&names[..2], &["a", "a1"]);
    }

    #[test]
    fn test_dictionary_empty_falls_back() {
        let mut gen = DictionaryNameGenerator::new(&[]);
        assert_eq!(gen.next_name(), "a");
    }

    #[test]
    fn test_build_from_config() {
        let mut gen = build_generator(&GeneratorConfig::hex("$"));
        assert_eq!(gen.next_name(), "$0");
        let mut gen = build_generator(&GeneratorConfig::default());
        assert_eq!(gen.next_name(), "a");
    }
}
