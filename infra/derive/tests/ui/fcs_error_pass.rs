use fcs_derive::fcs_error;
use std::borrow::Cow;

#[fcs_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read() -> Result<(), DemoError> {
    let io: Result<(), std::io::Error> = Err(std::io::Error::other("boom"));
    io.context("reading device")?;
    Ok(())
}

fn main() {
    let err = read().unwrap_err();
    assert!(err.to_string().contains("reading device"));

    let internal: DemoError = "broken invariant".into();
    assert!(matches!(internal, DemoError::Internal { .. }));
}
