use proc_macro2::TokenStream;
use quote::quote;
use syn::{Error, Ident, ItemFn, ReturnType, Type};

/// Profiles accepted by `#[fcs_runtime::main(..)]` and the constructor each maps to.
const PROFILES: &[(&str, &str)] =
    &[("cooperative", "cooperative"), ("default", "cooperative"), ("worker", "worker")];

/// Expands the `#[fcs_runtime::main]` attribute macro.
#[must_use]
pub fn expand_main(args: TokenStream, input: ItemFn) -> TokenStream {
    let profile = match check_signature(&input).and_then(|()| profile_constructor(args)) {
        Ok(profile) => profile,
        Err(err) => return err.to_compile_error(),
    };

    let ItemFn { attrs, vis, sig, block } = input;
    let name = &sig.ident;
    let output = &sig.output;

    quote! {
        #(#attrs)*
        #vis fn #name() #output {
            let config = ::fcs_runtime::RuntimeConfig::#profile();
            let rt = ::fcs_runtime::build_runtime_with_config(&config)?;
            rt.block_on(async #block)
        }
    }
}

fn check_signature(input: &ItemFn) -> Result<(), Error> {
    if input.sig.asyncness.is_none() {
        return Err(Error::new_spanned(
            &input.sig.ident,
            "#[fcs_runtime::main] needs an async fn",
        ));
    }
    if !returns_result(&input.sig.output) {
        return Err(Error::new_spanned(
            &input.sig.output,
            "#[fcs_runtime::main] needs a fn returning Result, so runtime build errors can propagate",
        ));
    }
    Ok(())
}

fn profile_constructor(args: TokenStream) -> Result<Ident, Error> {
    if args.is_empty() {
        return Ok(Ident::new("cooperative", proc_macro2::Span::call_site()));
    }

    let ident: Ident = syn::parse2(args)?;
    let requested = ident.to_string();
    PROFILES
        .iter()
        .find(|(name, _)| *name == requested)
        .map(|(_, constructor)| Ident::new(constructor, ident.span()))
        .ok_or_else(|| {
            let known: Vec<_> = PROFILES.iter().map(|(name, _)| *name).collect();
            Error::new_spanned(&ident, format!("Unknown runtime profile. Use one of: {}", known.join(", ")))
        })
}

fn returns_result(output: &ReturnType) -> bool {
    let ReturnType::Type(_, ty) = output else {
        return false;
    };
    let Type::Path(path) = &**ty else {
        return false;
    };
    path.path.segments.last().is_some_and(|seg| seg.ident == "Result")
}
