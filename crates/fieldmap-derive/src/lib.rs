//! Derive macro for `fieldmap`.
//!
//! `#[derive(Reflect)]` generates the reflection tables the conversion engine
//! walks at runtime: a `Typed` descriptor, a `Reflect` impl and, for structs with
//! named fields, a `Record` impl that enumerates the visible fields together with
//! their `#[tag(...)]` annotations.
//!
//! # Container attributes
//!
//! - `#[reflect(display)]` - expose the type's `Display` impl to the `string` tag option
//! - `#[reflect(hooker)]` - route conversion through the type's `Hooker` impl
//! - `#[reflect(default)]` - use `Default` as the zero value, for `omitempty` and for `ptr2` on absent pointers
//! - `#[reflect(is_zero = "path")]` - custom zero check, `fn(&Self) -> bool`
//!
//! A record whose fields are all `pub` gets its zero value and zero check from
//! its fields. Private state is invisible to both, so a record with private
//! fields is never zero and has no zero value unless one of the attributes
//! above says otherwise.
//!
//! # Field attributes
//!
//! - `#[tag(key = "name,opt1,opt2")]` - annotation string under `key`, several keys allowed
//! - `#[reflect(embed)]` - splice the field's own visible fields into the parent

use proc_macro::TokenStream;
use quote::quote;
use syn::{
    Attribute, Data, DeriveInput, Expr, ExprLit, Fields, FieldsNamed, Generics, Lit, Meta, Path,
    Visibility, ext::IdentExt, parse_macro_input, parse_quote, spanned::Spanned,
};

mod runtime_path;

use runtime_path::resolve_fieldmap_path;

#[proc_macro_derive(Reflect, attributes(reflect, tag))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand_derive(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

#[derive(Default)]
struct ContainerAttrs {
    display: bool,
    hooker: bool,
    default: bool,
    is_zero: Option<Path>,
}

#[derive(Default)]
struct FieldAttrs {
    embed: bool,
    tags: Vec<(String, String)>,
}

fn expand_derive(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    if let Some(lifetime) = input.generics.lifetimes().next() {
        return Err(syn::Error::new_spanned(
            lifetime,
            "Reflect requires 'static types; hint: own the data instead of borrowing it",
        ));
    }

    let krate = resolve_fieldmap_path()?;
    let attrs = parse_container_attrs(&input.attrs)?;

    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => derive_record(input, &krate, &attrs, fields),
            other => {
                reject_field_attrs(other)?;
                derive_opaque(input, &krate, &attrs)
            }
        },
        Data::Enum(data) => {
            for variant in &data.variants {
                reject_field_attrs(&variant.fields)?;
            }
            derive_opaque(input, &krate, &attrs)
        }
        Data::Union(_) => Err(syn::Error::new_spanned(
            input,
            "Reflect does not support `union` items; hint: use a struct or enum instead",
        )),
    }
}

fn derive_record(
    input: &DeriveInput,
    krate: &Path,
    attrs: &ContainerAttrs,
    fields: &FieldsNamed,
) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let generics = add_trait_bounds(&input.generics, krate);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut field_descs = Vec::new();
    let mut visits = Vec::new();
    let mut zero_checks = Vec::new();
    let mut zero_inits = Vec::new();
    let mut has_private = false;

    for field in &fields.named {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let field_attrs = parse_field_attrs(&field.attrs)?;
        let ty = &field.ty;
        let is_pub = matches!(field.vis, Visibility::Public(_));
        if is_pub {
            zero_inits.push(quote! { #ident: <#ty as #krate::Typed>::zero()? });
        } else {
            has_private = true;
        }

        if field_attrs.embed {
            if !field_attrs.tags.is_empty() {
                return Err(syn::Error::new_spanned(
                    ident,
                    "#[reflect(embed)] splices the embedded record's own fields; hint: move the #[tag] annotations onto those fields",
                ));
            }
            visits.push(quote! {
                #krate::Record::visit_fields(&self.#ident, tag_key, visit);
            });
            zero_checks.push(quote! { #krate::Reflect::is_zero(&self.#ident) });
            continue;
        }

        // Only `pub` fields take part in conversion.
        if !is_pub {
            if !field_attrs.tags.is_empty() {
                return Err(syn::Error::new_spanned(
                    ident,
                    "#[tag] on a private field has no effect; hint: make the field `pub`",
                ));
            }
            continue;
        }

        let index = field_descs.len();
        let field_name = ident.unraw().to_string();
        let tags = field_attrs
            .tags
            .iter()
            .map(|(key, value)| quote! { (#key, #value) });
        field_descs.push(quote! {
            #krate::Field::new(#field_name, &[#(#tags),*])
        });
        visits.push(quote! {
            if #krate::reflect::is_visible(&FIELDS[#index], tag_key) {
                visit(#krate::FieldRef::new(&FIELDS[#index], &self.#ident));
            }
        });
        zero_checks.push(quote! { #krate::Reflect::is_zero(&self.#ident) });
    }

    let fields_const = if field_descs.is_empty() {
        quote! {}
    } else {
        quote! {
            const FIELDS: &[#krate::Field] = &[#(#field_descs),*];
        }
    };

    // Private state is invisible to the field checks, so such records are only
    // zero when the type says how to tell.
    let is_zero_body = match &attrs.is_zero {
        Some(path) => quote! { #path(self) },
        None if has_private && attrs.default => default_eq_tokens(),
        None if has_private => quote! { false },
        None if zero_checks.is_empty() => quote! { true },
        None => quote! { #(#zero_checks)&&* },
    };

    let zero_body = if attrs.default {
        Some(default_zero_tokens())
    } else if has_private {
        None
    } else {
        Some(quote! { ::std::option::Option::Some(Self { #(#zero_inits),* }) })
    };

    let typed_impl = typed_impl_tokens(input, krate, &generics, quote! { Record }, zero_body);
    let capability_fns = capability_tokens(krate, attrs);

    Ok(quote! {
        #typed_impl

        impl #impl_generics #krate::Reflect for #name #ty_generics #where_clause {
            fn type_desc(&self) -> #krate::TypeDesc {
                <Self as #krate::Typed>::type_desc()
            }

            fn shape(&self) -> #krate::Shape<'_> {
                #krate::Shape::Record(self)
            }

            fn is_zero(&self) -> bool {
                #is_zero_body
            }

            #capability_fns
        }

        impl #impl_generics #krate::Record for #name #ty_generics #where_clause {
            #[allow(unused_variables)]
            fn visit_fields<'__fm>(
                &'__fm self,
                tag_key: &str,
                visit: &mut dyn FnMut(#krate::FieldRef<'__fm>),
            ) {
                #fields_const
                #(#visits)*
            }
        }
    })
}

fn derive_opaque(
    input: &DeriveInput,
    krate: &Path,
    attrs: &ContainerAttrs,
) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let generics = add_trait_bounds(&input.generics, krate);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let is_zero_body = match &attrs.is_zero {
        Some(path) => quote! { #path(self) },
        None if attrs.default => default_eq_tokens(),
        None => quote! { false },
    };

    let zero_body = attrs.default.then(default_zero_tokens);
    let typed_impl = typed_impl_tokens(input, krate, &generics, quote! { Opaque }, zero_body);
    let capability_fns = capability_tokens(krate, attrs);

    Ok(quote! {
        #typed_impl

        impl #impl_generics #krate::Reflect for #name #ty_generics #where_clause {
            fn type_desc(&self) -> #krate::TypeDesc {
                <Self as #krate::Typed>::type_desc()
            }

            fn shape(&self) -> #krate::Shape<'_> {
                #krate::Shape::Leaf
            }

            fn is_zero(&self) -> bool {
                #is_zero_body
            }

            #capability_fns
        }
    })
}

fn default_eq_tokens() -> proc_macro2::TokenStream {
    quote! { *self == <Self as ::std::default::Default>::default() }
}

fn default_zero_tokens() -> proc_macro2::TokenStream {
    quote! { ::std::option::Option::Some(<Self as ::std::default::Default>::default()) }
}

fn typed_impl_tokens(
    input: &DeriveInput,
    krate: &Path,
    generics: &Generics,
    kind: proc_macro2::TokenStream,
    zero_body: Option<proc_macro2::TokenStream>,
) -> proc_macro2::TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();
    let zero_fn = zero_body.map(|body| {
        quote! {
            fn zero() -> ::std::option::Option<Self> {
                #body
            }
        }
    });

    quote! {
        impl #impl_generics #krate::Typed for #name #ty_generics #where_clause {
            fn type_desc() -> #krate::TypeDesc {
                #krate::TypeDesc::new(::std::any::type_name::<Self>(), #krate::Kind::#kind)
            }

            #zero_fn
        }
    }
}

fn capability_tokens(krate: &Path, attrs: &ContainerAttrs) -> proc_macro2::TokenStream {
    let display = attrs.display.then(|| {
        quote! {
            fn as_display(&self) -> ::std::option::Option<&dyn ::std::fmt::Display> {
                ::std::option::Option::Some(self)
            }
        }
    });
    let hooker = attrs.hooker.then(|| {
        quote! {
            fn as_hooker(&self) -> ::std::option::Option<&dyn #krate::Hooker> {
                ::std::option::Option::Some(self)
            }
        }
    });
    quote! {
        #display
        #hooker
    }
}

fn add_trait_bounds(generics: &Generics, krate: &Path) -> Generics {
    let mut generics = generics.clone();
    for param in generics.type_params_mut() {
        param.bounds.push(parse_quote!(#krate::Reflect));
        param.bounds.push(parse_quote!(#krate::Typed));
        param.bounds.push(parse_quote!(::std::clone::Clone));
        param.bounds.push(parse_quote!(::std::cmp::PartialEq));
    }
    generics
}

fn reject_field_attrs(fields: &Fields) -> syn::Result<()> {
    for field in fields {
        if let Some(attr) = field
            .attrs
            .iter()
            .find(|attr| attr.path().is_ident("tag") || attr.path().is_ident("reflect"))
        {
            return Err(syn::Error::new_spanned(
                attr,
                "field attributes are only supported on structs with named fields; hint: the whole value is passed through as an opaque leaf",
            ));
        }
    }
    Ok(())
}

fn parse_container_attrs(attrs: &[Attribute]) -> syn::Result<ContainerAttrs> {
    let mut out = ContainerAttrs::default();
    for attr in attrs {
        if attr.path().is_ident("tag") {
            return Err(syn::Error::new_spanned(
                attr,
                "#[tag(...)] belongs on fields; hint: use #[reflect(...)] on the type",
            ));
        }
        if !attr.path().is_ident("reflect") {
            continue;
        }
        for meta in parse_meta_list(attr)? {
            match meta {
                Meta::Path(path) if path.is_ident("display") => out.display = true,
                Meta::Path(path) if path.is_ident("hooker") => out.hooker = true,
                Meta::Path(path) if path.is_ident("default") => out.default = true,
                Meta::NameValue(meta) if meta.path.is_ident("is_zero") => {
                    let path_str = parse_string_expr(&meta.value, meta.span())?;
                    out.is_zero = Some(syn::parse_str::<Path>(&path_str)?);
                }
                other => {
                    return Err(syn::Error::new_spanned(
                        other,
                        "unsupported #[reflect(...)] attribute; hint: expected one of display, hooker, default, is_zero = \"path\"",
                    ));
                }
            }
        }
    }
    Ok(out)
}

fn parse_field_attrs(attrs: &[Attribute]) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in attrs {
        if attr.path().is_ident("reflect") {
            for meta in parse_meta_list(attr)? {
                match meta {
                    Meta::Path(path) if path.is_ident("embed") => out.embed = true,
                    other => {
                        return Err(syn::Error::new_spanned(
                            other,
                            "unsupported #[reflect(...)] field attribute; hint: only `embed` is accepted on fields",
                        ));
                    }
                }
            }
        }

        if attr.path().is_ident("tag") {
            for meta in parse_meta_list(attr)? {
                let Meta::NameValue(meta) = meta else {
                    return Err(syn::Error::new_spanned(
                        meta,
                        "expected `key = \"annotation\"` inside #[tag(...)]",
                    ));
                };
                let key = meta
                    .path
                    .get_ident()
                    .map(|ident| ident.unraw().to_string())
                    .ok_or_else(|| {
                        syn::Error::new_spanned(&meta.path, "tag keys must be plain identifiers")
                    })?;
                if out.tags.iter().any(|(existing, _)| *existing == key) {
                    return Err(syn::Error::new_spanned(
                        &meta.path,
                        format!("duplicate tag key `{key}`"),
                    ));
                }
                let value = parse_string_expr(&meta.value, meta.span())?;
                out.tags.push((key, value));
            }
        }
    }
    Ok(out)
}

fn parse_meta_list(attr: &Attribute) -> syn::Result<Vec<Meta>> {
    attr.parse_args_with(syn::punctuated::Punctuated::<Meta, syn::Token![,]>::parse_terminated)
        .map(|list| list.into_iter().collect())
}

fn parse_string_expr(expr: &Expr, span: proc_macro2::Span) -> syn::Result<String> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(value),
            ..
        }) => Ok(value.value()),
        _ => Err(syn::Error::new(span, "expected a string literal")),
    }
}
