//! Address resolution over the live service and the static symbol index
//!
//! Each address is tried against the sources in order of accuracy:
//! 1. the live symbol service
//! 2. the static symbol index (range lookup)
//! 3. the formatted address itself
//!
//! so every input yields exactly one name, in input order.

use log::debug;
use std::cell::OnceCell;
use std::path::PathBuf;

use super::live::{acquire_or_degrade, platform_service, LiveSymbolService};
use super::names::SymbolNames;
use super::symbol_index::StaticSymbolIndex;
use crate::domain::{RawAddress, ResolvedName, SymbolIndexError};
use crate::fatal;

/// Where the resolver gets its static symbol index from
#[derive(Debug)]
pub enum IndexSource<'a> {
    /// The running executable, built once and kept for the life of the process
    CurrentExe,

    /// An object file on disk, at link-time addresses
    Image(PathBuf),

    /// An index the caller already built
    Provided(&'a StaticSymbolIndex),
}

/// Resolves batches of addresses to names
///
/// The static index is only built once some address misses the live
/// service, and is then kept for later batches.
pub struct AddressResolver<'a> {
    live: &'a dyn LiveSymbolService,
    source: IndexSource<'a>,
    loaded: OnceCell<StaticSymbolIndex>,
}

impl<'a> AddressResolver<'a> {
    pub fn new(live: &'a dyn LiveSymbolService, source: IndexSource<'a>) -> Self {
        Self { live, source, loaded: OnceCell::new() }
    }

    /// Resolve every address, in order
    ///
    /// An empty batch touches neither symbol source. The live service is
    /// held for the whole batch and released before returning, on every
    /// path. If it cannot be acquired the batch still completes using the
    /// static index.
    ///
    /// # Errors
    /// Returns an error if the static index has to be built and the image
    /// cannot be read or parsed
    pub fn try_resolve_all(&self, addresses: &[RawAddress]) -> Result<SymbolNames, SymbolIndexError> {
        if addresses.is_empty() {
            return Ok(SymbolNames::default());
        }

        let session = acquire_or_degrade(self.live);
        let mut static_index = None;
        let mut names = Vec::with_capacity(addresses.len());
        let (mut live_hits, mut static_hits) = (0usize, 0usize);

        for &addr in addresses {
            if let Some(symbol) = session.as_ref().and_then(|s| s.query(addr)) {
                debug!("{addr} -> {}+0x{:x} (live)", symbol.name, symbol.displacement);
                live_hits += 1;
                names.push(ResolvedName::Name(symbol.name));
                continue;
            }

            let index = if let Some(index) = static_index {
                index
            } else {
                let built = self.index()?;
                static_index = Some(built);
                built
            };
            match index.lookup(addr) {
                Some(record) => {
                    static_hits += 1;
                    names.push(ResolvedName::Name(record.name.clone()));
                }
                None => names.push(ResolvedName::FormattedAddress(addr.formatted())),
            }
        }
        drop(session);

        debug!(
            "Resolved {} addresses: {live_hits} live, {static_hits} static, {} unresolved",
            addresses.len(),
            addresses.len() - live_hits - static_hits
        );
        Ok(SymbolNames::pack(&names))
    }

    fn index(&self) -> Result<&StaticSymbolIndex, SymbolIndexError> {
        match &self.source {
            IndexSource::CurrentExe => StaticSymbolIndex::current_exe(),
            IndexSource::Provided(index) => Ok(*index),
            IndexSource::Image(path) => {
                if let Some(index) = self.loaded.get() {
                    return Ok(index);
                }
                let index = StaticSymbolIndex::load(path)?;
                Ok(self.loaded.get_or_init(|| index))
            }
        }
    }
}

/// Symbolize addresses captured in this process
///
/// Uses the platform's live service and the executable's own symbol table.
/// Failing to read the executable's symbol table aborts the process.
#[must_use]
pub fn resolve_symbols(addresses: &[RawAddress]) -> SymbolNames {
    let live = platform_service();
    let resolver = AddressResolver::new(live.as_ref(), IndexSource::CurrentExe);
    match resolver.try_resolve_all(addresses) {
        Ok(names) => names,
        Err(e) => fatal::abort(&e),
    }
}
