use crate::sys;

/// Style of a single message sent by PAM during a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageStyle {
    PromptEchoOff,
    PromptEchoOn,
    ErrorMessage,
    TextInfo,
    /// A style this crate does not know about (e.g. Linux-PAM's binary prompts).
    Other(libc::c_int),
}

impl MessageStyle {
    pub fn as_raw(self) -> libc::c_int {
        match self {
            MessageStyle::PromptEchoOff => sys::PAM_PROMPT_ECHO_OFF,
            MessageStyle::PromptEchoOn => sys::PAM_PROMPT_ECHO_ON,
            MessageStyle::ErrorMessage => sys::PAM_ERROR_MSG,
            MessageStyle::TextInfo => sys::PAM_TEXT_INFO,
            MessageStyle::Other(raw) => raw,
        }
    }

    /// Whether PAM expects the caller to supply a secret for this message.
    pub fn wants_secret(self) -> bool {
        self == MessageStyle::PromptEchoOff
    }
}

impl From<libc::c_int> for MessageStyle {
    fn from(raw: libc::c_int) -> Self {
        match raw {
            sys::PAM_PROMPT_ECHO_OFF => MessageStyle::PromptEchoOff,
            sys::PAM_PROMPT_ECHO_ON => MessageStyle::PromptEchoOn,
            sys::PAM_ERROR_MSG => MessageStyle::ErrorMessage,
            sys::PAM_TEXT_INFO => MessageStyle::TextInfo,
            other => MessageStyle::Other(other),
        }
    }
}

/// Raw status codes of one start/authenticate/end cycle.
///
/// `auth_status` is `None` when `pam_start` failed and authentication was
/// never attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResult {
    pub start_status: libc::c_int,
    pub auth_status: Option<libc::c_int>,
    pub end_status: libc::c_int,
}

impl SessionResult {
    /// Overall outcome: authentication passed and the transaction was
    /// released cleanly.
    pub fn is_success(&self) -> bool {
        self.auth_status == Some(sys::PAM_SUCCESS) && self.end_status == sys::PAM_SUCCESS
    }

    pub fn start_failed(&self) -> bool {
        self.start_status != sys::PAM_SUCCESS
    }

    pub fn auth_failed(&self) -> bool {
        matches!(self.auth_status, Some(status) if status != sys::PAM_SUCCESS)
    }

    pub fn end_failed(&self) -> bool {
        self.end_status != sys::PAM_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, MessageStyle::PromptEchoOff)]
    #[case(2, MessageStyle::PromptEchoOn)]
    #[case(3, MessageStyle::ErrorMessage)]
    #[case(4, MessageStyle::TextInfo)]
    #[case(7, MessageStyle::Other(7))]
    fn style_from_raw(#[case] raw: libc::c_int, #[case] style: MessageStyle) {
        assert_eq!(MessageStyle::from(raw), style);
        assert_eq!(style.as_raw(), raw);
    }

    #[test]
    fn only_echo_off_wants_secret() {
        assert!(MessageStyle::PromptEchoOff.wants_secret());
        assert!(!MessageStyle::PromptEchoOn.wants_secret());
        assert!(!MessageStyle::TextInfo.wants_secret());
        assert!(!MessageStyle::ErrorMessage.wants_secret());
    }

    #[rstest]
    #[case(0, Some(0), 0, true)]
    #[case(0, Some(sys::PAM_AUTH_ERR), 0, false)]
    #[case(0, Some(0), sys::PAM_SYSTEM_ERR, false)]
    #[case(0, Some(sys::PAM_AUTH_ERR), sys::PAM_SYSTEM_ERR, false)]
    #[case(sys::PAM_SYSTEM_ERR, None, 0, false)]
    fn overall_success(
        #[case] start_status: libc::c_int,
        #[case] auth_status: Option<libc::c_int>,
        #[case] end_status: libc::c_int,
        #[case] expected: bool,
    ) {
        let result = SessionResult { start_status, auth_status, end_status };
        assert_eq!(result.is_success(), expected);
    }

    #[test]
    fn failure_classification() {
        let result = SessionResult { start_status: sys::PAM_SYSTEM_ERR, auth_status: None, end_status: 0 };
        assert!(result.start_failed());
        assert!(!result.auth_failed());
        assert!(!result.end_failed());

        let result = SessionResult { start_status: 0, auth_status: Some(sys::PAM_AUTH_ERR), end_status: 0 };
        assert!(!result.start_failed());
        assert!(result.auth_failed());
    }
}
