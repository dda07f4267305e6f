use std::process::Command;

use symtrace::symbolization::StaticSymbolIndex;

#[test]
fn test_cli_prints_own_backtrace() {
    let output = Command::new(env!("CARGO_BIN_EXE_symtrace"))
        .args(["--max-frames", "4"])
        .output()
        .expect("Failed to run symtrace");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert!(!lines.is_empty() && lines.len() <= 4, "unexpected output:\n{stdout}");
    assert!(lines[0].starts_with("#0 "));
}

#[test]
fn test_cli_resolves_against_binary() {
    let binary_path = env!("CARGO_BIN_EXE_symtrace");
    let index = StaticSymbolIndex::load(std::path::Path::new(binary_path)).unwrap();
    let symbols = index.symbols();
    let symbol = &symbols[symbols.len() / 2];
    // An alias may have been listed first at the same address
    let expected = &symbols[symtrace::symbolization::find_enclosing(symbols, symbol.value).unwrap()];

    let output = Command::new(binary_path)
        .args(["--quiet", "--binary", binary_path, &format!("{:#x}", symbol.value), "0x1"])
        .output()
        .expect("Failed to run symtrace");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, [expected.name.as_str(), "0x1"]);
}

#[test]
fn test_cli_fails_on_non_object_binary() {
    let file = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(file.path(), b"plain text").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_symtrace"))
        .args(["--binary", &file.path().to_string_lossy(), "0x10"])
        .output()
        .expect("Failed to run symtrace");
    assert_eq!(output.status.code(), Some(symtrace::fatal::EXIT_FATAL));
    assert!(output.stdout.is_empty(), "no partial output on a fatal index error");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.starts_with("error: "), "unexpected stderr: {stderr}");
    assert!(stderr.contains("not a recognized object file"));
}

#[test]
fn test_cli_fails_on_missing_binary() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone");

    let output = Command::new(env!("CARGO_BIN_EXE_symtrace"))
        .args(["--binary", &missing.to_string_lossy(), "0x10"])
        .output()
        .expect("Failed to run symtrace");
    assert_eq!(output.status.code(), Some(symtrace::fatal::EXIT_FATAL));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Failed to read image"));
}
