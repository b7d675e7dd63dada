use proc_macro_crate::{FoundCrate, crate_name};
use proc_macro2::Span;

pub(crate) fn resolve_fieldmap_path() -> syn::Result<syn::Path> {
    match crate_name("fieldmap") {
        // Inside the fieldmap package itself `crate` would point at the test or
        // example crate, so go through the `extern crate self as fieldmap` alias.
        Ok(FoundCrate::Itself) => Ok(syn::parse_quote!(::fieldmap)),
        Ok(FoundCrate::Name(name)) => {
            let ident = syn::Ident::new(&name.replace('-', "_"), Span::call_site());
            Ok(syn::parse_quote!(::#ident))
        }
        Err(_) => Err(syn::Error::new(
            Span::call_site(),
            "could not resolve `fieldmap`; add it as a dependency (renamed dependencies are supported)",
        )),
    }
}
