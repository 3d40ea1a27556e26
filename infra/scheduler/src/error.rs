use std::borrow::Cow;

#[fcs_derive::fcs_error]
pub enum SchedulerError {
    /// Cadences must be non-zero.
    #[error("Invalid cadence for '{task}'{}", format_context(.context))]
    InvalidCadence { task: String, context: Option<Cow<'static, str>> },

    /// Registration happened outside a Tokio runtime.
    #[error("No runtime{}: {source}", format_context(.context))]
    NoRuntime { source: tokio::runtime::TryCurrentError, context: Option<Cow<'static, str>> },
}
