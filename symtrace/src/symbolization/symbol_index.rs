//! Static symbol index built from the executable's own symbol table
//!
//! The live symbol service only knows what the loader exported. The image's
//! static symbol table also covers local functions, so it is the second
//! source the resolver consults.

use log::{debug, info, warn};
use object::{Object, ObjectSection, ObjectSegment, ObjectSymbol, SectionKind, SymbolKind};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

use super::memory_maps::{load_bias, self_memory_range, ImagePlacement};
use crate::domain::{RawAddress, SymbolClass, SymbolIndexError, SymbolRecord};

/// Function symbols of one image, sorted ascending by value
///
/// Never mutated after construction, so a built index can be shared between
/// threads.
#[derive(Debug, Default)]
pub struct StaticSymbolIndex {
    symbols: Vec<SymbolRecord>,
    addresses: AddressSpace,
}

/// Which addresses `lookup` accepts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum AddressSpace {
    /// Link-time addresses, taken as they are
    #[default]
    LinkTime,

    /// Runtime addresses of an image whose mapping is known
    Mapped(ImagePlacement),

    /// Runtime addresses of an image whose mapping could not be found
    ///
    /// The slide is unknown, so every lookup misses.
    Unplaced,
}

/// Raw contents of an image's symbol table
struct ImageSymbols {
    records: Vec<SymbolRecord>,
    lowest_segment: Option<u64>,
}

static CURRENT_EXE_INDEX: OnceLock<StaticSymbolIndex> = OnceLock::new();
static CURRENT_EXE_BUILD: Mutex<()> = Mutex::new(());

impl StaticSymbolIndex {
    /// An index with no symbols; every lookup misses
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Keep the function-class records and sort them by value
    ///
    /// The sort is stable, so aliases keep their symbol-table order.
    /// Records without a name are dropped since they cannot name anything.
    pub fn from_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = SymbolRecord>,
    {
        let mut symbols: Vec<SymbolRecord> =
            records.into_iter().filter(|r| r.is_function() && !r.name.is_empty()).collect();
        symbols.sort_by_key(|r| r.value);
        Self { symbols, addresses: AddressSpace::LinkTime }
    }

    /// Build an index from an object file on disk, using link-time addresses
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, is not a recognized
    /// object file, or its symbol table cannot be decoded
    pub fn load(path: &Path) -> Result<Self, SymbolIndexError> {
        let image = read_image(path)?;
        let index = Self::from_records(image.records);
        index.report(path);
        Ok(index)
    }

    /// Build an index for an image mapped into this process
    ///
    /// Lookups then take runtime addresses: anything outside the image's
    /// mapping misses, the rest is shifted by the load bias. Without
    /// /proc/self/maps the bias is unknown and every lookup misses, leaving
    /// those addresses to the other sources.
    ///
    /// # Errors
    /// Same as [`StaticSymbolIndex::load`]
    pub fn load_mapped(path: &Path) -> Result<Self, SymbolIndexError> {
        let image = read_image(path)?;
        let mut index = Self::from_records(image.records);
        index.addresses = match self_memory_range(path) {
            Ok(range) => {
                let bias = load_bias(range, image.lowest_segment.unwrap_or(0));
                debug!("Load bias for {}: 0x{bias:x}", path.display());
                AddressSpace::Mapped(ImagePlacement { range, load_bias: bias })
            }
            Err(e) => {
                warn!("No mapping info for {}, static lookups disabled: {e:#}", path.display());
                AddressSpace::Unplaced
            }
        };
        index.report(path);
        Ok(index)
    }

    /// The index of the running executable, built once per process
    ///
    /// Concurrent first calls are serialized so the table is only parsed once.
    ///
    /// # Errors
    /// Same as [`StaticSymbolIndex::load`], plus failure to locate the executable
    pub fn current_exe() -> Result<&'static StaticSymbolIndex, SymbolIndexError> {
        if let Some(index) = CURRENT_EXE_INDEX.get() {
            return Ok(index);
        }

        let _guard = CURRENT_EXE_BUILD.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(index) = CURRENT_EXE_INDEX.get() {
            return Ok(index);
        }

        let path = std::env::current_exe().map_err(SymbolIndexError::CurrentExe)?;
        let index = Self::load_mapped(&path)?;
        Ok(CURRENT_EXE_INDEX.get_or_init(|| index))
    }

    /// Find the function containing a runtime address
    #[must_use]
    pub fn lookup(&self, addr: RawAddress) -> Option<&SymbolRecord> {
        let target = match self.addresses {
            AddressSpace::LinkTime => addr.0,
            AddressSpace::Mapped(placement) => {
                if !placement.range.contains(addr.0) {
                    return None;
                }
                addr.0.wrapping_sub(placement.load_bias)
            }
            AddressSpace::Unplaced => return None,
        };
        find_enclosing(&self.symbols, target).map(|i| &self.symbols[i])
    }

    #[must_use]
    pub fn symbols(&self) -> &[SymbolRecord] {
        &self.symbols
    }

    #[must_use]
    pub fn placement(&self) -> Option<ImagePlacement> {
        match self.addresses {
            AddressSpace::Mapped(placement) => Some(placement),
            AddressSpace::LinkTime | AddressSpace::Unplaced => None,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// True for stripped images; the resolver then relies on the other sources
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    fn report(&self, path: &Path) {
        if self.is_empty() {
            warn!("No function symbols in {}, static lookups disabled", path.display());
        } else {
            info!("Loaded {} function symbols from {}", self.len(), path.display());
        }
    }
}

/// Locate the symbol whose function encloses `target`
///
/// `symbols` must be sorted by value. Function extents are not known, so a
/// symbol is taken to run up to the start of the next one, inclusive. That
/// needs a bounding pair, so:
/// - fewer than two symbols never match
/// - targets before the first or after the last symbol do not match
/// - a target equal to the last symbol's value matches the last symbol
///
/// Otherwise the rightmost symbol with value <= target wins. Among aliases
/// sharing that value the earliest one in the slice is returned.
#[must_use]
pub fn find_enclosing(symbols: &[SymbolRecord], target: u64) -> Option<usize> {
    let [first, .., last] = symbols else {
        return None;
    };
    if target < first.value || target > last.value {
        return None;
    }

    // At least `first` satisfies the predicate, so upper >= 1
    let upper = symbols.partition_point(|s| s.value <= target);
    let value = symbols[upper - 1].value;
    Some(symbols[..upper].partition_point(|s| s.value < value))
}

/// Read and classify every entry of an image's static symbol table
fn read_image(path: &Path) -> Result<ImageSymbols, SymbolIndexError> {
    let path_buf = || PathBuf::from(path);

    let data = fs::read(path)
        .map_err(|source| SymbolIndexError::ImageUnreadable { path: path_buf(), source })?;
    let file = object::File::parse(&*data)
        .map_err(|source| SymbolIndexError::UnrecognizedFormat { path: path_buf(), source })?;

    let mut records = Vec::new();
    for symbol in file.symbols() {
        let name = symbol
            .name()
            .map_err(|source| SymbolIndexError::SymbolTable { path: path_buf(), source })?;

        let in_text = symbol
            .section_index()
            .and_then(|index| file.section_by_index(index).ok())
            .is_some_and(|section| section.kind() == SectionKind::Text);
        let marker = matches!(symbol.kind(), SymbolKind::Section | SymbolKind::File);
        let class = if !symbol.is_undefined() && in_text && !marker {
            SymbolClass::Function
        } else {
            SymbolClass::Other
        };

        records.push(SymbolRecord { name: name.to_string(), value: symbol.address(), class });
    }
    debug!("{} symbol table entries in {}", records.len(), path.display());

    let lowest_segment = file.segments().map(|segment| segment.address()).min();
    Ok(ImageSymbols { records, lowest_segment })
}
