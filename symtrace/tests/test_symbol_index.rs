use std::path::Path;
use std::process::Command;

use symtrace::symbolization::StaticSymbolIndex;
use symtrace::RawAddress;

/// `(address, name)` of the global text symbols nm reports, if nm is installed
fn nm_text_symbols(binary_path: &str) -> Option<Vec<(u64, String)>> {
    let output = Command::new("nm").arg(binary_path).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let symbols = String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let addr = u64::from_str_radix(parts.next()?, 16).ok()?;
            (parts.next()? == "T").then_some(())?;
            Some((addr, parts.next()?.to_string()))
        })
        .collect();
    Some(symbols)
}

#[test]
fn test_index_loads_binary() {
    let binary_path = env!("CARGO_BIN_EXE_symtrace");

    let index = StaticSymbolIndex::load(Path::new(binary_path));
    assert!(index.is_ok(), "Failed to build index: {:?}", index.err());

    let index = index.unwrap();
    assert!(!index.is_empty(), "symtrace is built with its symbol table");
    assert!(index.placement().is_none(), "files on disk use link-time addresses");
}

#[test]
fn test_index_agrees_with_nm() {
    let binary_path = env!("CARGO_BIN_EXE_symtrace");
    let Some(symbols) = nm_text_symbols(binary_path) else {
        println!("nm not available, skipping");
        return;
    };
    let index = StaticSymbolIndex::load(Path::new(binary_path)).expect("Failed to build index");

    for (addr, name) in symbols.iter().take(50) {
        let found = index
            .lookup(RawAddress(*addr))
            .unwrap_or_else(|| panic!("0x{addr:x} ({name}) not found"));
        // Aliases resolve to whichever came first, but always at the same address
        assert_eq!(found.value, *addr, "0x{addr:x} ({name}) resolved to {}", found.name);
        assert!(index.symbols().iter().any(|s| s.value == *addr && s.name == *name));
    }
}

#[test]
fn test_index_interior_address_resolves_to_enclosing() {
    let binary_path = env!("CARGO_BIN_EXE_symtrace");
    let index = StaticSymbolIndex::load(Path::new(binary_path)).expect("Failed to build index");

    let symbols = index.symbols();
    let pair = symbols.windows(2).find(|w| w[1].value - w[0].value > 1).expect("two distinct symbols");
    let inside = RawAddress(pair[0].value + 1);
    assert_eq!(index.lookup(inside).map(|s| s.value), Some(pair[0].value));
}
