//! # symtrace - Backtrace Symbolization
//!
//! symtrace captures the current call stack and names each frame, combining
//! two incomplete symbol sources so that every address ends up with the best
//! name available.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────┐  addresses  ┌──────────────────────────────────────┐
//! │   capture    │────────────▶│          AddressResolver             │
//! │ (backtrace)  │             │                                      │
//! └──────────────┘             │  1. live service (dladdr)            │
//!                              │  2. static symbol index (object)     │
//!                              │  3. formatted address                │
//!                              └──────────────────┬───────────────────┘
//!                                                 │ one name per address
//!                                                 ▼
//!                                         ┌──────────────┐
//!                                         │ SymbolNames  │
//!                                         └──────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`capture`]: raw instruction pointers of the current stack
//! - [`symbolization`]: symbol sources, the resolver and its packed output
//! - [`domain`]: core types (`RawAddress`, `SymbolRecord`, `ResolvedName`) and errors
//! - [`fatal`]: what happens when the executable cannot read its own symbols
//! - [`cli`]: command-line argument parsing for the `symtrace` binary
//!
//! ## Typical Usage
//!
//! ```rust,no_run
//! let frames = symtrace::capture_backtrace(32);
//! for name in symtrace::resolve_symbols(&frames).iter() {
//!     println!("{name}");
//! }
//! ```

pub mod capture;
pub mod cli;
pub mod domain;
pub mod fatal;
pub mod symbolization;

pub use capture::{capture_backtrace, capture_stack};
pub use domain::{RawAddress, ResolvedName};
pub use symbolization::{resolve_symbols, SymbolNames};
