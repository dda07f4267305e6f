//! Fatal error policy
//!
//! Symbolization usually runs while something else is already going wrong.
//! If the executable cannot read its own symbol table we stop right away
//! instead of handing back partial data.

use log::error;
use std::fmt::Display;

pub const EXIT_FATAL: i32 = 1;

/// Report `err` and terminate the process
pub fn abort(err: &dyn Display) -> ! {
    error!("symbolization failed: {err}");
    eprintln!("error: {err}");
    std::process::exit(EXIT_FATAL)
}
