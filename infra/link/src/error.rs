use fcs_domain::protocol::MspCode;
use std::borrow::Cow;

/// Transport failures. A failed call is never retried at this layer.
#[fcs_derive::fcs_error]
pub enum LinkError {
    /// No reply within the per-call deadline.
    #[error("{code} timed out after {timeout_ms} ms{}", format_context(.context))]
    Timeout { code: MspCode, timeout_ms: u64, context: Option<Cow<'static, str>> },

    /// The port is not open.
    #[error("Link closed{}: {message}", format_context(.context))]
    Closed { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The device answered with an error frame (unknown or unsupported message).
    #[error("{code} rejected by the device{}", format_context(.context))]
    Rejected { code: MspCode, context: Option<Cow<'static, str>> },

    /// The reply does not answer the request that was sent.
    #[error("Expected a reply to {expected}, got {received}{}", format_context(.context))]
    Mismatch { expected: MspCode, received: MspCode, context: Option<Cow<'static, str>> },

    #[error("Internal link error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

impl LinkError {
    /// Message the failure is attributed to, when known.
    #[must_use]
    pub const fn code(&self) -> Option<MspCode> {
        match self {
            Self::Timeout { code, .. } | Self::Rejected { code, .. } => Some(*code),
            Self::Mismatch { expected, .. } => Some(*expected),
            Self::Closed { .. } | Self::Internal { .. } => None,
        }
    }
}
