//! Live symbol service
//!
//! The loader's own view of the process: it accounts for relocation and
//! knows every exported symbol of the loaded image. Access is a scoped
//! session. Acquiring one takes the process-wide service lock, dropping it
//! releases the lock, so release happens on every exit path.

#![allow(unsafe_code)] // dladdr() requires unsafe

use log::warn;

use crate::domain::{LiveServiceError, LiveSymbol, RawAddress};

/// A symbol service that must be acquired before use
pub trait LiveSymbolService {
    /// Begin a resolution pass
    ///
    /// # Errors
    /// Returns an error if the service cannot be initialized; callers are
    /// expected to carry on without it
    fn acquire(&self) -> Result<Box<dyn LiveSession + '_>, LiveServiceError>;
}

/// An acquired service. Dropping it ends the pass.
pub trait LiveSession {
    fn query(&self, addr: RawAddress) -> Option<LiveSymbol>;
}

/// Service that is never available
///
/// Used where the platform has no live resolver or the caller opted out.
#[derive(Debug, Clone)]
pub struct UnavailableService {
    reason: String,
}

impl UnavailableService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

impl LiveSymbolService for UnavailableService {
    fn acquire(&self) -> Result<Box<dyn LiveSession + '_>, LiveServiceError> {
        Err(LiveServiceError::Unavailable(self.reason.clone()))
    }
}

/// The live service for the current platform
#[cfg(unix)]
#[must_use]
pub fn platform_service() -> Box<dyn LiveSymbolService> {
    Box::new(DlAddrService)
}

#[cfg(not(unix))]
#[must_use]
pub fn platform_service() -> Box<dyn LiveSymbolService> {
    Box::new(UnavailableService::new("no live symbol service on this platform"))
}

#[cfg(unix)]
pub use self::dladdr::DlAddrService;

#[cfg(unix)]
mod dladdr {
    use super::{LiveSession, LiveSymbolService};
    use crate::domain::{LiveServiceError, LiveSymbol, RawAddress};
    use log::debug;
    use std::ffi::CStr;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    /// dladdr is not documented as reentrant, so passes are serialized
    static SERVICE_LOCK: Mutex<()> = Mutex::new(());

    /// Live symbols from the dynamic loader via `dladdr(3)`
    ///
    /// Only sees symbols in the dynamic symbol table, so local functions
    /// fall through to the static index.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct DlAddrService;

    struct DlAddrSession {
        _lock: MutexGuard<'static, ()>,
    }

    impl LiveSymbolService for DlAddrService {
        fn acquire(&self) -> Result<Box<dyn LiveSession + '_>, LiveServiceError> {
            // The lock guards no data, a panic in an earlier pass leaves nothing inconsistent
            let lock = SERVICE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
            debug!("dladdr session acquired");
            Ok(Box::new(DlAddrSession { _lock: lock }))
        }
    }

    impl LiveSession for DlAddrSession {
        fn query(&self, addr: RawAddress) -> Option<LiveSymbol> {
            // SAFETY: Dl_info is plain data and dladdr only inspects loader
            // tables, it never dereferences the queried address.
            let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
            let found = unsafe { libc::dladdr(addr.as_ptr(), &mut info) };
            if found == 0 || info.dli_sname.is_null() {
                return None;
            }

            // SAFETY: non-null dli_sname points into the loader's string table
            let name = unsafe { CStr::from_ptr(info.dli_sname) }.to_string_lossy().into_owned();
            if name.is_empty() {
                return None;
            }

            let displacement = addr.0.wrapping_sub(info.dli_saddr as usize as u64);
            Some(LiveSymbol { name, displacement })
        }
    }

    impl Drop for DlAddrSession {
        fn drop(&mut self) {
            debug!("dladdr session released");
        }
    }
}

/// Acquire `service`, logging instead of failing when it is unavailable
pub(crate) fn acquire_or_degrade(service: &dyn LiveSymbolService) -> Option<Box<dyn LiveSession + '_>> {
    match service.acquire() {
        Ok(session) => Some(session),
        Err(e) => {
            warn!("{e}; resolving from the static symbol table only");
            None
        }
    }
}
