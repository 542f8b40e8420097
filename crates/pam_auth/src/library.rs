//! Resolution of the native primitives.
//!
//! libpam and the C library are opened once with `libloading`, the six
//! functions the bridge needs are looked up, and the result is an immutable
//! [`PamFunctions`] bundle that is passed explicitly to every
//! [`Authenticator`](crate::Authenticator).

use libloading::Library;
use pam_auth_common::sys::{PamAuthenticateFn, PamEndFn, PamStartFn};
use tracing::{debug, info};

use crate::alloc::NativeAllocator;
use crate::config::LibraryConfig;
use crate::error::{Error, Result};

/// The resolved native primitives.
///
/// When obtained from a [`PamLibrary`] the pointers are only valid while that
/// library is alive; borrowing through [`PamLibrary::functions`] enforces this.
#[derive(Clone, Copy, Debug)]
pub struct PamFunctions {
    pub start: PamStartFn,
    pub authenticate: PamAuthenticateFn,
    pub end: PamEndFn,
    pub allocator: NativeAllocator,
}

struct LoadedLibrary {
    name: String,
    library: Library,
}

impl LoadedLibrary {
    /// Open the first candidate that loads.
    fn open_first(candidates: &[String]) -> Result<Self> {
        let mut last_error = None;
        for name in candidates {
            // SAFETY: Loading libpam or libc runs their initializers, which are
            //         trusted system code.
            match unsafe { Library::new(name) } {
                Ok(library) => {
                    debug!(library = %name, "loaded native library");
                    return Ok(LoadedLibrary { name: name.clone(), library });
                }
                Err(err) => {
                    debug!(library = %name, "could not load native library: {err}");
                    last_error = Some(err);
                }
            }
        }
        match last_error {
            Some(source) => Err(Error::LibraryLoad { library: candidates.join(", "), source }),
            None => Err(Error::InvalidArgument("no library candidates configured")),
        }
    }

    /// Look up `symbol` and copy out the function pointer.
    ///
    /// # Safety
    /// `T` must be the function pointer type matching the symbol's C signature.
    unsafe fn resolve<T: Copy>(&self, symbol: &'static str) -> Result<T> {
        // SAFETY: Upheld by the caller.
        unsafe { self.library.get::<T>(symbol.as_bytes()) }
            .map(|sym| *sym)
            .map_err(|_| Error::SymbolNotFound { library: self.name.clone(), symbol })
    }
}

/// libpam and libc, loaded and resolved.
pub struct PamLibrary {
    functions: PamFunctions,
    // Keep both libraries mapped for as long as `functions` can be reached.
    pam: LoadedLibrary,
    c_library: LoadedLibrary,
}

impl PamLibrary {
    pub fn load(config: &LibraryConfig) -> Result<Self> {
        let pam = LoadedLibrary::open_first(&config.pam_candidates())?;
        let c_library = LoadedLibrary::open_first(&config.libc_candidates())?;

        // SAFETY: The types below are the documented C signatures of these symbols.
        let functions = unsafe {
            PamFunctions {
                start: pam.resolve::<PamStartFn>("pam_start")?,
                authenticate: pam.resolve::<PamAuthenticateFn>("pam_authenticate")?,
                end: pam.resolve::<PamEndFn>("pam_end")?,
                allocator: NativeAllocator::new(
                    c_library.resolve("calloc")?,
                    c_library.resolve("strdup")?,
                    c_library.resolve("free")?,
                ),
            }
        };
        info!(pam = %pam.name, libc = %c_library.name, "resolved PAM primitives");

        Ok(PamLibrary { functions, pam, c_library })
    }

    pub fn functions(&self) -> &PamFunctions {
        &self.functions
    }
}

impl std::fmt::Debug for PamLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PamLibrary")
            .field("pam", &self.pam.name)
            .field("libc", &self.c_library.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_library_is_load_error() {
        let err = LoadedLibrary::open_first(&["libdefinitely-not-here.so.9".to_string()])
            .err()
            .expect("load should fail");
        assert!(matches!(err, Error::LibraryLoad { ref library, .. } if library == "libdefinitely-not-here.so.9"));
    }

    #[test]
    fn empty_candidate_list_is_rejected() {
        assert!(matches!(LoadedLibrary::open_first(&[]), Err(Error::InvalidArgument(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn missing_symbol_is_reported() {
        let c_library = LoadedLibrary::open_first(&["libc.so.6".to_string()]).expect("libc should load");
        let err = unsafe { c_library.resolve::<unsafe extern "C" fn()>("pam_no_such_symbol") }.unwrap_err();
        assert!(matches!(err, Error::SymbolNotFound { symbol: "pam_no_such_symbol", .. }));
    }
}
