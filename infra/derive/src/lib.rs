#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the workspace crates.
//!
//! * [`fcs_error`] turns a plain enum into a `thiserror` error with context support.
//! * [`main`] boots an `async fn main` on a runtime profile from `fcs-runtime`.
//!
//! The examples below are `ignore`d because a proc-macro crate cannot use its own macros.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, parse_macro_input};

/// Attribute macro that bootstraps the monitor runtime.
///
/// Transforms an `async fn main` into a synchronous `fn main` that builds the
/// runtime described by the selected profile and blocks on the body.
///
/// # Arguments
///
/// * `cooperative` - Single-threaded runtime; every device-facing task shares one control thread.
/// * `worker` - Multi-threaded runtime for tooling that is not bound to a device link.
/// * `default` - Same as `cooperative`.
///
/// # Examples
///
/// ```rust,ignore
/// #[fcs_runtime::main(cooperative)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Attribute macro for crate-level error enums.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to `Result<T, Error>` and to results of every wrapped source error.
/// * **Source Conversions**: Implements `From<Source>` for variants made of exactly a
///   `source` and a `context` field, enabling `?` on upstream errors. Variants with
///   additional identity fields (e.g. the name of a failed step) are left to explicit
///   construction.
/// * **Internal Fallback**: Provides `From<&'static str>` and `From<String>` when an
///   `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum** with named-field variants.
/// 2. Context-carrying variants use a `context: Option<Cow<'static, str>>` field.
/// 3. Variants with a `source` field (or a field tagged `#[source]`/`#[from]`) must
///    also declare `context`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[fcs_derive::fcs_error]
/// pub enum LinkError {
///     #[error("Transport I/O{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal link fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn fcs_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
