//! Check a username and password against the system's PAM stack.
//!
//! The native library is loaded at runtime. [`PamLibrary::load`] resolves
//! `pam_start`, `pam_authenticate` and `pam_end` from libpam and the C
//! allocator from libc; an [`Authenticator`] then runs one
//! start/authenticate/end transaction per call, answering every hidden-input
//! prompt with the supplied password.
//!
//! ```no_run
//! use pam_auth::{Authenticator, PamLibrary, config::LibraryConfig};
//!
//! let library = PamLibrary::load(&LibraryConfig::default())?;
//! let auth = Authenticator::new(library.functions(), "login");
//! println!("{}", auth.authenticate("alice", "correct horse"));
//! # Ok::<(), pam_auth::Error>(())
//! ```
//!
//! # Safety
//! PAM calls back into this crate from inside `pam_authenticate`. The bridge
//! relies on a few properties of that contract:
//! - The conversation callback runs synchronously on the calling thread and
//!   never after `pam_end` has returned.
//! - Response arrays and strings are freed by PAM with `free`, so they are
//!   always allocated with the C library's `calloc`/`strdup`.
//! - A handle is never used by two threads at once. Each transaction owns its
//!   own handle, so separate calls may run concurrently.

pub mod alloc;
pub mod config;
pub mod conversation;
mod discover;
mod error;
pub mod library;
mod session;

pub use config::{Config, DEFAULT_SERVICE};
pub use conversation::ConversationPolicy;
pub use error::{Error, Result};
pub use library::{PamFunctions, PamLibrary};
pub use pam_auth_common::{MessageStyle, SessionResult, sys};
pub use session::Authenticator;

/// Load PAM with the default library names and authenticate once.
///
/// Fails only if the native library cannot be loaded.
pub fn authenticate(username: &str, password: &str, service: &str) -> Result<bool> {
    let library = PamLibrary::load(&config::LibraryConfig::default())?;
    Ok(Authenticator::new(library.functions(), service).authenticate(username, password))
}
