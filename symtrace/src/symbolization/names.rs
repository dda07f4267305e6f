//! Packed result of a resolution pass
//!
//! All names live back to back in one string buffer with a table of
//! boundaries into it, so a whole backtrace is a single value to keep or
//! drop.

use std::fmt;

use crate::domain::ResolvedName;

/// `N` resolved names followed by an end-of-sequence sentinel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolNames {
    buffer: String,
    /// `N + 1` byte offsets into `buffer`; entry `i` spans `index[i]..index[i + 1]`
    index: Vec<usize>,
    /// Whether entry `i` came from a symbol source rather than the address fallback
    symbol: Vec<bool>,
}

impl Default for SymbolNames {
    fn default() -> Self {
        Self { buffer: String::new(), index: vec![0], symbol: Vec::new() }
    }
}

impl SymbolNames {
    /// Pack `names` with one allocation per table
    #[must_use]
    pub fn pack(names: &[ResolvedName]) -> Self {
        let total: usize = names.iter().map(|n| n.as_str().len()).sum();
        let mut packed = Self {
            buffer: String::with_capacity(total),
            index: Vec::with_capacity(names.len() + 1),
            symbol: Vec::with_capacity(names.len()),
        };
        packed.index.push(0);
        for name in names {
            packed.buffer.push_str(name.as_str());
            packed.index.push(packed.buffer.len());
            packed.symbol.push(name.is_symbol());
        }
        packed
    }

    /// Number of entries, not counting the sentinel
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbol.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbol.is_empty()
    }

    /// Entry `i`, or `None` at and past the sentinel
    #[must_use]
    pub fn get(&self, i: usize) -> Option<&str> {
        let start = *self.index.get(i)?;
        let end = *self.index.get(i + 1)?;
        Some(&self.buffer[start..end])
    }

    /// Entry `i` with its provenance
    #[must_use]
    pub fn resolved(&self, i: usize) -> Option<ResolvedName> {
        let name = self.get(i)?.to_string();
        Some(if self.symbol[i] {
            ResolvedName::Name(name)
        } else {
            ResolvedName::FormattedAddress(name)
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// The entries as `Some`, terminated by a single `None`
    pub fn with_sentinel(&self) -> impl Iterator<Item = Option<&str>> + '_ {
        self.iter().map(Some).chain(std::iter::once(None))
    }

    /// Number of entries a symbol source resolved
    #[must_use]
    pub fn symbol_count(&self) -> usize {
        self.symbol.iter().filter(|s| **s).count()
    }
}

impl fmt::Display for SymbolNames {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for name in self.iter() {
            writeln!(f, "{name}")?;
        }
        Ok(())
    }
}
