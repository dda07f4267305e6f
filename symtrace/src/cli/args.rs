//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::domain::RawAddress;

#[derive(Parser, Debug)]
#[command(
    name = "symtrace",
    about = "Symbolize backtrace addresses",
    after_help = "\
EXAMPLES:
    symtrace                                  Print this process's own backtrace
    symtrace --binary ./myapp 0x4011d6 4012a0 Name addresses from another binary"
)]
pub struct Args {
    /// Hex addresses to symbolize (the 0x prefix is optional)
    #[arg(value_name = "ADDRESS", value_parser = parse_address)]
    pub addresses: Vec<RawAddress>,

    /// Maximum frames to capture when printing our own backtrace
    #[arg(long, default_value = "32")]
    pub max_frames: usize,

    /// Resolve against this binary's symbol table (link-time addresses)
    #[arg(short, long, value_name = "PATH")]
    pub binary: Option<PathBuf>,

    /// Skip the live symbol service
    #[arg(long)]
    pub no_live: bool,

    /// Print names only
    #[arg(short, long)]
    pub quiet: bool,
}

/// Parse a hex address such as `0x4011d6` or `4011D6`
///
/// # Errors
/// Returns a message if the text is not a hex number that fits in 64 bits
pub fn parse_address(text: &str) -> Result<RawAddress, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16)
        .map(RawAddress)
        .map_err(|e| format!("invalid address '{text}': {e}"))
}
