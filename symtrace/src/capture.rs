//! Capturing raw backtraces
//!
//! Thin wrapper over the `backtrace` crate's stack walker. Only instruction
//! pointers are collected here; naming them is the job of
//! [`crate::symbolization`].

use crate::domain::RawAddress;

/// Fill `buffer` with the instruction pointers of the calling stack
///
/// Frames of the walker and of `capture_stack` itself are never recorded;
/// `skip_frames` more frames above it are dropped as well. Returns the
/// number of entries written, at most `buffer.len()`.
#[inline(never)]
pub fn capture_stack(buffer: &mut [RawAddress], skip_frames: usize) -> usize {
    let own = capture_stack as usize;
    let capacity = buffer.len();
    let mut frames = Vec::new();
    let mut own_at = None;

    backtrace::trace(|frame| {
        // The outermost frame reports a null ip
        if frame.ip().is_null() {
            return false;
        }
        if own_at.is_none() && frame.symbol_address() as usize == own {
            own_at = Some(frames.len());
        }
        frames.push(RawAddress::from(frame.ip()));
        // Keep walking until enough frames above ours are collected
        own_at.map_or(true, |at: usize| {
            frames.len() <= at.saturating_add(1).saturating_add(skip_frames).saturating_add(capacity)
        })
    });

    // Without our own frame in sight, the walker frames cannot be told apart
    let start = own_at.map_or(0, |at| at + 1).saturating_add(skip_frames);
    let mut count = 0;
    for (slot, addr) in buffer.iter_mut().zip(frames.into_iter().skip(start)) {
        *slot = addr;
        count += 1;
    }
    count
}

/// Upper bound on the frames `capture_backtrace` collects
pub const MAX_CAPTURE_FRAMES: usize = 4096;

/// Capture up to `max_frames` addresses of the caller's stack
///
/// The first entry belongs to the function that called `capture_backtrace`.
/// Requests above [`MAX_CAPTURE_FRAMES`] are clamped to it.
#[inline(never)]
#[must_use]
pub fn capture_backtrace(max_frames: usize) -> Vec<RawAddress> {
    let mut buffer = vec![RawAddress(0); max_frames.min(MAX_CAPTURE_FRAMES)];
    let count = capture_stack(&mut buffer, 1);
    buffer.truncate(count);
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolization::resolve_symbols;

    #[test]
    fn test_capture_respects_limit() {
        let frames = capture_backtrace(4);
        assert!(!frames.is_empty());
        assert!(frames.len() <= 4);
        assert!(capture_backtrace(0).is_empty());
    }

    #[test]
    fn test_capture_stack_fills_prefix() {
        let mut buffer = [RawAddress(0); 64];
        let count = capture_stack(&mut buffer, 0);
        assert!(count > 0 && count <= buffer.len());
        assert!(buffer[..count].iter().all(|addr| addr.0 != 0));
    }

    #[test]
    fn test_oversized_skip_captures_nothing() {
        let mut buffer = [RawAddress(0); 4];
        assert_eq!(capture_stack(&mut buffer, usize::MAX), 0);
        assert_eq!(capture_stack(&mut buffer, usize::MAX - 1), 0);
    }

    #[test]
    fn test_huge_request_is_clamped() {
        let frames = capture_backtrace(usize::MAX);
        assert!(!frames.is_empty());
        assert!(frames.len() <= MAX_CAPTURE_FRAMES);
        assert!(frames.iter().all(|addr| addr.0 != 0));
    }

    #[test]
    fn test_skipping_drops_leading_frames() {
        let mut all = [RawAddress(0); 64];
        let mut skipped = [RawAddress(0); 64];
        let all_count = capture_stack(&mut all, 0);
        let skipped_count = capture_stack(&mut skipped, 1);
        assert!(skipped_count <= all_count);
    }

    #[test]
    #[inline(never)]
    fn test_capture_names_the_caller() {
        let frames = capture_backtrace(8);
        let names = resolve_symbols(&frames);
        assert_eq!(names.len(), frames.len());
        assert!(
            names.iter().any(|name| name.contains("test_capture_names_the_caller")),
            "no frame named after the test:\n{names}"
        );
    }
}
