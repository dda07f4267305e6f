//! # Symbol Resolution for Captured Backtraces
//!
//! This module turns raw instruction pointers captured from the call stack
//! into names. This process is called **symbolization**.
//!
//! ## Two Incomplete Sources
//!
//! Neither source alone covers every frame:
//!
//! - **Live symbol service**: asks the dynamic loader (`dladdr(3)`). It knows
//!   where everything was actually loaded, but only sees exported symbols.
//! - **Static symbol index**: the executable's own symbol table, read with
//!   the `object` crate. It also covers local (`t`) functions but knows
//!   nothing about where the image was loaded, so runtime addresses are
//!   translated by the load bias first.
//!
//! When both miss, the address is formatted as hex (`0x55f3a2b4c780`), which
//! keeps unresolved frames visually distinct from named ones.
//!
//! ## Address Translation
//!
//! ```text
//! 1. Capture raw addresses
//!    [0x55f3a2b4c780, 0x55f3a2b4d120, ...]
//!
//! 2. Ask the live service for each one
//!    0x55f3a2b4d120 -> "main"                       (exported, done)
//!    0x55f3a2b4c780 -> miss
//!
//! 3. Build the static index (once) and find the image in /proc/self/maps
//!    Image mapped at: 0x55f3a2b4c000 - 0x55f3a2b5f000
//!    Load bias:       0x55f3a2b4c000
//!
//! 4. Translate and range-match
//!    0x55f3a2b4c780 - 0x55f3a2b4c000 = 0x780
//!    symbols: [0x700 "helper", 0x900 "other"] -> "helper"
//! ```
//!
//! ## Limitations
//!
//! - **Function extents are inferred**: a symbol is assumed to run up to the
//!   next symbol's start, so padding and data between functions is attributed
//!   to the preceding function.
//! - **Main executable only**: shared libraries are left to the live service.
//! - **No demangling**: names are reported exactly as the sources give them.
//!
//! ## Module Structure
//!
//! - **`symbol_index`**: filtering, sorting and range lookup over the static table
//! - **`memory_maps`**: where the running image is mapped and its load bias
//! - **`live`**: the scoped live symbol service
//! - **`resolver`**: the per-address fallback chain over a batch
//! - **`names`**: the packed result of a batch

pub mod live;
pub mod memory_maps;
pub mod names;
pub mod resolver;
pub mod symbol_index;

pub use live::{platform_service, LiveSession, LiveSymbolService, UnavailableService};
#[cfg(unix)]
pub use live::DlAddrService;
pub use memory_maps::{find_memory_range, ImagePlacement, MemoryRange};
pub use names::SymbolNames;
pub use resolver::{resolve_symbols, AddressResolver, IndexSource};
pub use symbol_index::{find_enclosing, StaticSymbolIndex};
