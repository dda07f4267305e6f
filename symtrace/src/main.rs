//! # symtrace - Main Entry Point
//!
//! A thin caller over the library:
//! - **Self backtrace** (no addresses): capture and name this process's stack
//! - **Addresses** (`symtrace 0x4011d6 ...`): name the given addresses, either
//!   in this process or against `--binary PATH`

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use std::io::Write;

use symtrace::cli::Args;
use symtrace::symbolization::{
    platform_service, AddressResolver, IndexSource, LiveSymbolService, UnavailableService,
};
use symtrace::{capture_backtrace, fatal, RawAddress};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            EXIT_ERROR
        }
    });
}

fn run() -> Result<()> {
    let args = Args::parse();

    let addresses = if args.addresses.is_empty() {
        let frames = capture_backtrace(args.max_frames);
        info!("Captured {} frames", frames.len());
        frames
    } else {
        args.addresses.clone()
    };

    // Another binary's link-time addresses mean nothing to our loader
    let live: Box<dyn LiveSymbolService> = if args.no_live || args.binary.is_some() {
        Box::new(UnavailableService::new("disabled from the command line"))
    } else {
        platform_service()
    };
    let source = match &args.binary {
        Some(path) => IndexSource::Image(path.clone()),
        None => IndexSource::CurrentExe,
    };

    let resolver = AddressResolver::new(live.as_ref(), source);
    let names = match resolver.try_resolve_all(&addresses) {
        Ok(names) => names,
        Err(e) => fatal::abort(&e),
    };

    let mut out = std::io::stdout().lock();
    for (i, (addr, name)) in addresses.iter().zip(names.iter()).enumerate() {
        writeln!(out, "{}", format_frame(i, *addr, name, args.quiet))
            .context("Failed to write symbolized frames")?;
    }
    Ok(())
}

fn format_frame(frame_num: usize, addr: RawAddress, name: &str, quiet: bool) -> String {
    if quiet {
        name.to_string()
    } else {
        format!("#{frame_num:<2} 0x{:016x} {name}", addr.0)
    }
}
