//! The PAM conversation callback.
//!
//! PAM calls [`conv_fn`] synchronously from inside `pam_authenticate`, on the
//! same thread, with `appdata` pointing at the [`Conversation`] of the running
//! attempt. Every `PAM_PROMPT_ECHO_OFF` message is answered with the password;
//! every other message gets an empty response slot.

use std::ffi::CStr;
use std::fmt;

use pam_auth_common::MessageStyle;
use pam_auth_common::sys::{self, PamConv, PamMessage, PamResponse};
use serde::Deserialize;
use tracing::{debug, trace, warn};
use zeroize::Zeroizing;

use crate::alloc::NativeAllocator;
use crate::error::{Error, Result};

/// What the callback reports to PAM when the C allocator runs out of memory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationPolicy {
    /// Report success regardless. Slots whose password copy failed stay empty,
    /// and if the response array itself could not be allocated PAM receives a
    /// null array.
    #[default]
    Lenient,
    /// Release everything allocated so far and return `PAM_BUF_ERR`.
    Strict,
}

/// Per-attempt conversation state: the secret and the allocator its copies
/// are made with.
pub struct Conversation {
    // Always NUL-terminated, with no interior NUL.
    password: Zeroizing<Vec<u8>>,
    allocator: NativeAllocator,
    policy: ConversationPolicy,
}

impl Conversation {
    pub fn new(password: &str, allocator: NativeAllocator, policy: ConversationPolicy) -> Result<Self> {
        if password.as_bytes().contains(&0) {
            return Err(Error::InvalidArgument("password contains a NUL byte"));
        }
        let mut bytes = Zeroizing::new(Vec::with_capacity(password.len() + 1));
        bytes.extend_from_slice(password.as_bytes());
        bytes.push(0);
        Ok(Conversation { password: bytes, allocator, policy })
    }

    fn secret(&self) -> &CStr {
        // SAFETY: `new` appends exactly one NUL and rejects interior ones.
        unsafe { CStr::from_bytes_with_nul_unchecked(&self.password) }
    }

    /// Build the descriptor passed to `pam_start`.
    ///
    /// The descriptor borrows `self` through a raw pointer, so `self` must
    /// stay in place until `pam_end` has returned.
    pub fn descriptor(&self) -> PamConv {
        PamConv {
            conv: conv_fn,
            appdata_ptr: self as *const Conversation as *mut libc::c_void,
        }
    }

    /// Fill a freshly allocated response array for `messages`.
    ///
    /// On success the returned array, and every string in it, belongs to the
    /// caller (PAM).
    fn respond(&self, messages: &[*const PamMessage]) -> Result<*mut PamResponse> {
        let array = self
            .allocator
            .allocate_zeroed(messages.len(), std::mem::size_of::<PamResponse>())?
            .cast::<PamResponse>();
        // SAFETY: calloc returned room for at least `messages.len()` zeroed
        //         responses, and an all-zero PamResponse is valid.
        let responses = unsafe { std::slice::from_raw_parts_mut(array.as_ptr(), messages.len()) };

        for (index, &message) in messages.iter().enumerate() {
            // SAFETY: PAM passes valid message pointers for the duration of the call.
            let (style, text) = unsafe { read_message(message) };
            match style {
                MessageStyle::PromptEchoOff => match self.allocator.duplicate_string(self.secret()) {
                    Ok(copy) => {
                        responses[index].resp = copy.into_raw();
                        responses[index].resp_retcode = sys::PAM_SUCCESS;
                    }
                    Err(err) if self.policy == ConversationPolicy::Strict => {
                        // SAFETY: Nothing has been handed to PAM yet.
                        unsafe { self.discard(&mut responses[..index]) };
                        // SAFETY: The array came from this allocator and is not used again.
                        unsafe { self.allocator.release(array.as_ptr().cast()) };
                        return Err(err);
                    }
                    Err(err) => warn!(index, "leaving password prompt unanswered: {err}"),
                },
                MessageStyle::ErrorMessage => debug!(index, "PAM error message: {}", text.unwrap_or_default()),
                MessageStyle::TextInfo => debug!(index, "PAM info message: {}", text.unwrap_or_default()),
                other => trace!(index, style = ?other, "ignoring PAM message"),
            }
        }

        Ok(array.as_ptr())
    }

    /// Free every response string written so far.
    ///
    /// # Safety
    /// `responses` must not have been handed to PAM.
    unsafe fn discard(&self, responses: &mut [PamResponse]) {
        for slot in responses {
            // SAFETY: Each non-null string was produced by this allocator.
            unsafe { self.allocator.release(slot.resp.cast()) };
            slot.resp = std::ptr::null_mut();
        }
    }
}

impl fmt::Debug for Conversation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Conversation")
            .field("password", &"<redacted>")
            .field("policy", &self.policy)
            .finish()
    }
}

/// Read the style and (lossy) text of one message. Null pointers read as an
/// unknown, text-less message.
///
/// # Safety
/// `message` must be null or point to a valid `PamMessage` whose `msg` is null
/// or a NUL-terminated string.
unsafe fn read_message(message: *const PamMessage) -> (MessageStyle, Option<String>) {
    // SAFETY: Upheld by the caller.
    let Some(message) = (unsafe { message.as_ref() }) else {
        return (MessageStyle::Other(0), None);
    };
    let text = if message.msg.is_null() {
        None
    } else {
        // SAFETY: Upheld by the caller.
        Some(unsafe { CStr::from_ptr(message.msg) }.to_string_lossy().into_owned())
    };
    (MessageStyle::from(message.msg_style), text)
}

/// The callback registered with `pam_start`.
pub extern "C" fn conv_fn(
    num_msg: libc::c_int,
    pam_message: *const *const PamMessage,
    pam_response: *mut *mut PamResponse,
    appdata: *mut libc::c_void,
) -> libc::c_int {
    // SAFETY: PAM guarantees the pointers match the conversation contract;
    //         conv_impl checks the ones that may legitimately be null.
    unsafe { conv_impl(num_msg, pam_message, pam_response, appdata) }
}

unsafe fn conv_impl(
    num_msg: libc::c_int,
    pam_message: *const *const PamMessage,
    pam_response: *mut *mut PamResponse,
    appdata: *mut libc::c_void,
) -> libc::c_int {
    if pam_response.is_null() || appdata.is_null() {
        return sys::PAM_CONV_ERR;
    }
    let count = usize::try_from(num_msg).unwrap_or(0);
    if count > 0 && pam_message.is_null() {
        return sys::PAM_CONV_ERR;
    }

    // SAFETY: appdata was set to point to a Conversation in `descriptor`, and
    //         the session keeps it alive until pam_end returns.
    let conv = unsafe { &*(appdata as *const Conversation) };
    let messages: &[*const PamMessage] = if count == 0 {
        &[]
    } else {
        // SAFETY: According to the PAM documentation, pam_message is a valid
        //         pointer to an array of num_msg pointers.
        unsafe { std::slice::from_raw_parts(pam_message, count) }
    };
    trace!(count, "conversation invoked");

    match conv.respond(messages) {
        Ok(responses) => {
            // SAFETY: The caller guarantees pam_response is a valid pointer to write to.
            unsafe { pam_response.write(responses) };
            sys::PAM_SUCCESS
        }
        Err(err) => {
            // SAFETY: As above.
            unsafe { pam_response.write(std::ptr::null_mut()) };
            match conv.policy {
                ConversationPolicy::Lenient => {
                    warn!("conversation could not allocate responses: {err}");
                    sys::PAM_SUCCESS
                }
                ConversationPolicy::Strict => {
                    warn!("conversation failed: {err}");
                    sys::PAM_BUF_ERR
                }
            }
        }
    }
}
