use fcs_derive::fcs_error;
use std::borrow::Cow;

#[fcs_error]
pub enum StepError {
    #[error("Step '{step}' failed{}: {source}", format_context(.context))]
    Failed {
        step: Cow<'static, str>,
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },
}

// No `From<std::io::Error>` is generated for variants with identity fields,
// so this impl does not conflict.
impl From<std::io::Error> for StepError {
    fn from(source: std::io::Error) -> Self {
        Self::Failed { step: Cow::Borrowed("unknown"), source, context: None }
    }
}

fn main() {
    let err: StepError = std::io::Error::other("timeout").into();
    let err: Result<(), StepError> = Err(err);
    let err = err.context("status_ex").unwrap_err();
    assert!(err.to_string().contains("Step 'unknown' failed (status_ex)"));
}
