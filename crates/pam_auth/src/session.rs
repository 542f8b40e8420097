use std::ffi::CString;

use pam_auth_common::SessionResult;
use pam_auth_common::sys::{self, PamEndFn, PamHandle};
use tracing::{debug, warn};

use crate::conversation::{Conversation, ConversationPolicy};
use crate::error::{Error, Result};
use crate::library::PamFunctions;

/// Runs start/authenticate/end cycles against one PAM service.
///
/// Each call is an independent transaction with its own handle and its own
/// copy of the password, so an `Authenticator` can be shared between threads.
#[derive(Debug, Clone)]
pub struct Authenticator<'a> {
    functions: &'a PamFunctions,
    service: String,
    policy: ConversationPolicy,
}

impl<'a> Authenticator<'a> {
    pub fn new(functions: &'a PamFunctions, service: impl Into<String>) -> Self {
        Authenticator {
            functions,
            service: service.into(),
            policy: ConversationPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ConversationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns true if `username` and `password` authenticate for the service.
    ///
    /// Every failure, including arguments PAM cannot represent, reads as false.
    pub fn authenticate(&self, username: &str, password: &str) -> bool {
        match self.session(username, password) {
            Ok(result) => result.is_success(),
            Err(err) => {
                warn!(user = username, service = %self.service, "authentication not attempted: {err}");
                false
            }
        }
    }

    /// Run one transaction and return the raw status codes.
    ///
    /// Fails only if an argument cannot be passed to PAM; PAM failures are
    /// reported through the returned [`SessionResult`].
    pub fn session(&self, username: &str, password: &str) -> Result<SessionResult> {
        let service = CString::new(self.service.as_str())
            .map_err(|_| Error::InvalidArgument("service name contains a NUL byte"))?;
        let user = CString::new(username).map_err(|_| Error::InvalidArgument("username contains a NUL byte"))?;
        let conversation = Conversation::new(password, self.functions.allocator, self.policy)?;
        let descriptor = conversation.descriptor();

        let mut handle: *mut PamHandle = std::ptr::null_mut();
        // SAFETY: All pointers are valid for the call. `descriptor` and the
        //         conversation it points to outlive the transaction below.
        let start_status =
            unsafe { (self.functions.start)(service.as_ptr(), user.as_ptr(), &descriptor, &mut handle) };
        let transaction = Transaction::new(self.functions.end, handle);

        if start_status != sys::PAM_SUCCESS {
            let end_status = transaction.end(start_status);
            warn!(user = username, service = %self.service, start_status, end_status, "pam_start failed");
            return Ok(SessionResult { start_status, auth_status: None, end_status });
        }

        // SAFETY: `handle` was produced by a successful pam_start and has not been ended.
        let auth_status = unsafe { (self.functions.authenticate)(handle, 0) };
        let end_status = transaction.end(auth_status);

        let result = SessionResult { start_status, auth_status: Some(auth_status), end_status };
        if result.is_success() {
            debug!(user = username, service = %self.service, "authentication succeeded");
        } else {
            debug!(user = username, service = %self.service, auth_status, end_status, "authentication failed");
        }
        Ok(result)
    }
}

/// A started PAM transaction. `end` consumes it, so a handle is ended at
/// most once, and every return path of `session` goes through `end`.
#[must_use = "a started transaction must be ended"]
struct Transaction {
    end_fn: PamEndFn,
    handle: *mut PamHandle,
}

impl Transaction {
    fn new(end_fn: PamEndFn, handle: *mut PamHandle) -> Self {
        Transaction { end_fn, handle }
    }

    fn end(self, status: libc::c_int) -> libc::c_int {
        // SAFETY: The handle came from pam_start (possibly a failed one, which
        //         pam_end is still required to see) and `self` is consumed here.
        unsafe { (self.end_fn)(self.handle, status) }
    }
}
