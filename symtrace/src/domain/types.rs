//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep runtime addresses, link-time symbol values and
//! resolved names from being mixed up in function signatures.

use std::fmt;

/// Instruction pointer captured from the call stack
///
/// Opaque to the resolver: it is only compared, offset by the image's load
/// bias, and formatted as a last resort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RawAddress(pub u64);

impl RawAddress {
    /// Textual fallback used when no symbol source knows the address
    #[must_use]
    pub fn formatted(self) -> String {
        format!("{:#x}", self.0)
    }

    /// The address as a pointer, for C symbol APIs
    #[must_use]
    pub fn as_ptr(self) -> *const std::ffi::c_void {
        self.0 as usize as *const std::ffi::c_void
    }
}

impl fmt::Display for RawAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for RawAddress {
    fn from(addr: u64) -> Self {
        RawAddress(addr)
    }
}

impl<T> From<*const T> for RawAddress {
    fn from(ptr: *const T) -> Self {
        RawAddress(ptr as usize as u64)
    }
}

impl<T> From<*mut T> for RawAddress {
    fn from(ptr: *mut T) -> Self {
        RawAddress(ptr as usize as u64)
    }
}

/// Coarse classification of a symbol-table entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolClass {
    /// Defined in an executable code section (`t`/`T` in `nm` terms)
    Function,

    /// Data, undefined, section markers, file names, ...
    Other,
}

/// One entry of an object file's symbol table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolRecord {
    pub name: String,

    /// Link-time address of the symbol
    pub value: u64,

    pub class: SymbolClass,
}

impl SymbolRecord {
    pub fn function(name: impl Into<String>, value: u64) -> Self {
        Self { name: name.into(), value, class: SymbolClass::Function }
    }

    pub fn other(name: impl Into<String>, value: u64) -> Self {
        Self { name: name.into(), value, class: SymbolClass::Other }
    }

    #[must_use]
    pub fn is_function(&self) -> bool {
        self.class == SymbolClass::Function
    }
}

/// Answer from the live symbol service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveSymbol {
    pub name: String,

    /// Distance from the symbol start to the queried address
    pub displacement: u64,
}

/// Outcome of symbolizing one address
///
/// Exactly one of these is produced per input address. Formatted addresses
/// stay visually distinct from names so callers can spot partial coverage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResolvedName {
    Name(String),
    FormattedAddress(String),
}

impl ResolvedName {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            ResolvedName::Name(s) | ResolvedName::FormattedAddress(s) => s,
        }
    }

    /// True if a symbol source produced the entry
    #[must_use]
    pub fn is_symbol(&self) -> bool {
        matches!(self, ResolvedName::Name(_))
    }
}

impl fmt::Display for ResolvedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_formatted_address_is_hex() {
        assert_eq!(RawAddress(0x100).formatted(), "0x100");
        assert_eq!(RawAddress(0).formatted(), "0x0");
        assert_eq!(RawAddress(0xdead_beef).to_string(), "0xdeadbeef");
    }

    #[test]
    fn test_pointer_round_trip() {
        let value = 42u8;
        let ptr: *const u8 = &value;
        let addr = RawAddress::from(ptr);
        assert_eq!(addr.as_ptr() as usize, ptr as usize);
    }

    #[test]
    fn test_resolved_name_kinds() {
        let name = ResolvedName::Name("alpha".to_string());
        let addr = ResolvedName::FormattedAddress("0x100".to_string());
        assert!(name.is_symbol());
        assert!(!addr.is_symbol());
        assert_eq!(addr.to_string(), "0x100");
    }
}
