//! Raw PAM ABI: the structures passed across the conversation boundary, the
//! status and style constants, and the signatures of the native primitives.

#[repr(C)]
pub struct PamHandle {
    _private: [u8; 0],
}

#[repr(C)]
pub struct PamMessage {
    pub msg_style: libc::c_int,
    pub msg: *const libc::c_char,
}

#[repr(C)]
pub struct PamResponse {
    pub resp: *mut libc::c_char,
    pub resp_retcode: libc::c_int,
}

pub type ConvFn = extern "C" fn(
    num_msg: libc::c_int,
    pam_message: *const *const PamMessage,
    pam_response: *mut *mut PamResponse,
    appdata: *mut libc::c_void,
) -> libc::c_int;

#[repr(C)]
pub struct PamConv {
    pub conv: ConvFn,
    pub appdata_ptr: *mut libc::c_void,
}

pub type PamStartFn = unsafe extern "C" fn(
    service_name: *const libc::c_char,
    user: *const libc::c_char,
    pam_conversation: *const PamConv,
    pamh: *mut *mut PamHandle,
) -> libc::c_int;
pub type PamAuthenticateFn = unsafe extern "C" fn(pamh: *mut PamHandle, flags: libc::c_int) -> libc::c_int;
pub type PamEndFn = unsafe extern "C" fn(pamh: *mut PamHandle, pam_status: libc::c_int) -> libc::c_int;

pub type CallocFn = unsafe extern "C" fn(nmemb: libc::size_t, size: libc::size_t) -> *mut libc::c_void;
pub type StrdupFn = unsafe extern "C" fn(s: *const libc::c_char) -> *mut libc::c_char;
pub type FreeFn = unsafe extern "C" fn(ptr: *mut libc::c_void);

pub const PAM_SUCCESS: libc::c_int = 0;
pub const PAM_SYSTEM_ERR: libc::c_int = 4;
pub const PAM_BUF_ERR: libc::c_int = 5;
pub const PAM_AUTH_ERR: libc::c_int = 7;
pub const PAM_CONV_ERR: libc::c_int = 19;

pub const PAM_PROMPT_ECHO_OFF: libc::c_int = 1;
pub const PAM_PROMPT_ECHO_ON: libc::c_int = 2;
pub const PAM_ERROR_MSG: libc::c_int = 3;
pub const PAM_TEXT_INFO: libc::c_int = 4;
