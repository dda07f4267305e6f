//! Memory mapping utilities for the running image
//!
//! Symbol values in the executable are link-time addresses while captured
//! instruction pointers are runtime addresses. For position-independent
//! executables the two differ by the load bias, which we recover from
//! `/proc/self/maps`.

use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::Path;

/// Memory range of a loaded binary in a process's address space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Check if an address falls within this memory range
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// Where the image lives at runtime and how far it was moved from its link address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImagePlacement {
    pub range: MemoryRange,
    pub load_bias: u64,
}

const PAGE_SIZE: u64 = 4096;

/// Find the mapped range of `binary_path` in our own address space
///
/// # Errors
/// Returns an error if /proc/self/maps cannot be read or if the binary is not mapped
pub fn self_memory_range(binary_path: &Path) -> Result<MemoryRange> {
    let maps = fs::read_to_string("/proc/self/maps").context("Failed to read /proc/self/maps")?;
    let path = binary_path.to_string_lossy();
    find_memory_range(&maps, &path)
        .with_context(|| format!("Could not find memory range for {path}"))
}

/// Scan the text of a maps file for every mapping of `binary_path`
///
/// Returns the range from the minimum start address to the maximum end address.
#[must_use]
pub fn find_memory_range(maps: &str, binary_path: &str) -> Option<MemoryRange> {
    let mut start_addr = None;
    let mut end_addr = None;

    for line in maps.lines() {
        // "start-end perms offset dev inode pathname"
        let mut fields = line.split_whitespace();
        let Some(range) = fields.next() else {
            continue;
        };
        let pathname = fields.skip(4).collect::<Vec<_>>().join(" ");
        let pathname = pathname.strip_suffix(" (deleted)").unwrap_or(&pathname);
        if pathname != binary_path {
            continue;
        }

        let Some((start, end)) = range.split_once('-') else {
            continue;
        };
        let (Ok(start), Ok(end)) = (u64::from_str_radix(start, 16), u64::from_str_radix(end, 16))
        else {
            continue;
        };

        start_addr = Some(start_addr.map_or(start, |s: u64| s.min(start)));
        end_addr = Some(end_addr.map_or(end, |e: u64| e.max(end)));
    }

    match (start_addr, end_addr) {
        (Some(start), Some(end)) => {
            debug!(
                "Image memory range: 0x{:x} - 0x{:x} (size: {} KB)",
                start,
                end,
                (end - start) / 1024
            );
            Some(MemoryRange { start, end })
        }
        _ => None,
    }
}

/// Difference between where the image was mapped and where it was linked
///
/// `lowest_segment` is the smallest segment address recorded in the file.
/// The first mapping always starts on the page holding that segment.
#[must_use]
pub fn load_bias(range: MemoryRange, lowest_segment: u64) -> u64 {
    range.start.wrapping_sub(lowest_segment & !(PAGE_SIZE - 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAPS: &str = "\
55d0c0a00000-55d0c0a3c000 r--p 00000000 fd:01 1234                       /usr/bin/my app
55d0c0a3c000-55d0c0b10000 r-xp 0003c000 fd:01 1234                       /usr/bin/my app
55d0c0b10000-55d0c0b40000 r--p 00110000 fd:01 1234                       /usr/bin/my app
55d0c1e00000-55d0c1e21000 rw-p 00000000 00:00 0                          [heap]
7f1e2a000000-7f1e2a028000 r--p 00000000 fd:01 5678                       /usr/lib/libc.so.6
";

    #[test]
    fn test_memory_range_contains() {
        let range = MemoryRange { start: 0x1000, end: 0x2000 };

        assert!(range.contains(0x1000));
        assert!(range.contains(0x1500));
        assert!(range.contains(0x1FFF));
        assert!(!range.contains(0x0FFF));
        assert!(!range.contains(0x2000));
        assert!(!range.contains(0x2001));
    }

    #[test]
    fn test_find_memory_range_spans_all_mappings() {
        let range = find_memory_range(MAPS, "/usr/bin/my app").unwrap();
        assert_eq!(range, MemoryRange { start: 0x55d0_c0a0_0000, end: 0x55d0_c0b4_0000 });
    }

    #[test]
    fn test_find_memory_range_requires_exact_path() {
        assert!(find_memory_range(MAPS, "/usr/bin/my").is_none());
        assert!(find_memory_range(MAPS, "/usr/lib/libc.so").is_none());
        assert!(find_memory_range("", "/usr/bin/my app").is_none());
    }

    #[test]
    fn test_find_memory_range_deleted_image() {
        let maps = "400000-401000 r-xp 00000000 fd:01 1 /tmp/app (deleted)\n";
        let range = find_memory_range(maps, "/tmp/app").unwrap();
        assert_eq!(range.start, 0x40_0000);
    }

    #[test]
    fn test_load_bias_pie_and_fixed() {
        let pie = MemoryRange { start: 0x55d0_c0a0_0000, end: 0x55d0_c0b4_0000 };
        assert_eq!(load_bias(pie, 0), 0x55d0_c0a0_0000);

        let fixed = MemoryRange { start: 0x40_0000, end: 0x48_0000 };
        assert_eq!(load_bias(fixed, 0x40_0040), 0);
    }

    #[test]
    fn test_self_memory_range() {
        // Depends on /proc being mounted, so only check consistency
        let exe = std::env::current_exe().expect("Failed to get current exe");
        if let Ok(range) = self_memory_range(&exe) {
            let here = test_self_memory_range as usize as u64;
            assert!(range.contains(here));
        }
    }
}
