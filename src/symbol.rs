use std::{
    collections::HashMap,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    sync::{Arc, PoisonError, RwLock},
};

use lazy_static::lazy_static;

lazy_static! {
    static ref INTERNED_SYMBOLS: RwLock<HashMap<String, Symbol>> = RwLock::new(HashMap::new());
}

/// An element symbol, interned and stored capitalised (`"se"` and `"Se"` are the same symbol).
#[allow(clippy::derived_hash_with_manual_eq, clippy::derive_ord_xor_partial_ord)]
#[derive(Clone, Hash, Eq, Ord)]
pub struct Symbol(Arc<str>);

impl Symbol {
    /// Intern an element symbol. The first letter is uppercased and the rest lowercased.
    pub fn new(symbol: &str) -> Self {
        let normalized = capitalize(symbol);
        if let Some(found) = INTERNED_SYMBOLS
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&normalized)
        {
            return found.clone();
        }

        let mut symbols = INTERNED_SYMBOLS
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        symbols
            .entry(normalized.clone())
            .or_insert_with(|| Symbol(Arc::from(normalized.as_str())))
            .clone()
    }

    pub fn hydrogen() -> Self {
        Symbol::new("H")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_hydrogen(&self) -> bool {
        self.as_str() == "H"
    }
}

fn capitalize(symbol: &str) -> String {
    let mut chars = symbol.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol::new(s)
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0 == other.0
    }
}

impl PartialEq<str> for Symbol {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Symbol {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

#[allow(clippy::non_canonical_partial_ord_impl)]
impl PartialOrd for Symbol {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        if Arc::ptr_eq(&self.0, &other.0) {
            return Some(std::cmp::Ordering::Equal);
        }
        self.0.partial_cmp(&other.0)
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl Display for Symbol {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_capitalized() {
        assert_eq!(Symbol::new("c"), "C");
        assert_eq!(Symbol::new("se"), "Se");
        assert_eq!(Symbol::new("CL"), "Cl");
    }

    #[test]
    fn interning_shares_storage() {
        let a = Symbol::new("Br");
        let b = Symbol::new("br");
        assert!(Arc::ptr_eq(&a.0, &b.0));
    }

    #[test]
    fn hydrogen_symbol() {
        assert!(Symbol::hydrogen().is_hydrogen());
        assert!(!Symbol::new("Hg").is_hydrogen());
    }
}
